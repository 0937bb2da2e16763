use chrono::Utc;
use hub_assist::prompts::{self, parse_win_analysis};
use hub_assist::{GeminiClient, TextGenerator};
use hub_config::AssistConfig;
use hub_storage::{RecordId, UserId, Win};
use tracing::warn;

fn assistant() -> GeminiClient {
    let config = AssistConfig::from_env();
    if config.api_key.is_empty() {
        warn!("HUB_ASSIST_API_KEY is not set; requests will likely be rejected");
    }
    GeminiClient::new(config)
}

pub async fn cmd_assist_agenda(topic: &str) -> Result<(), Box<dyn std::error::Error>> {
    if topic.trim().is_empty() {
        return Err("Topic must not be empty".into());
    }
    let agenda = assistant().generate(&prompts::meeting_agenda(topic)).await;
    println!("{}", agenda);
    Ok(())
}

pub async fn cmd_assist_analyze(
    description: &str,
    revenue: f64,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !revenue.is_finite() || revenue < 0.0 {
        return Err(format!("Revenue must be a non-negative amount, got {}", revenue).into());
    }
    let win = Win {
        id: RecordId::generate(),
        user_id: UserId::from("local"),
        user_name: name.to_string(),
        description: description.to_string(),
        revenue_amount: revenue,
        created_at: Utc::now(),
    };

    let text = assistant().generate(&prompts::win_analysis(&win)).await;
    let analysis = parse_win_analysis(&text);
    println!("🎉 {}", analysis.celebration);
    println!();
    println!("💡 {}", analysis.insight);
    Ok(())
}
