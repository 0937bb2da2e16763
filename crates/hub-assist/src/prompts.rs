//! Prompt builders and response parsing for the assistant flows.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use hub_storage::{Goal, Member, Message, MessageKind, RecordId, Trip, Win};
use regex::Regex;

pub const DEFAULT_CELEBRATION: &str = "Great job on the win!";
pub const DEFAULT_INSIGHT: &str = "Keep up the great work.";
pub const NOT_ENOUGH_ACTIVITY: &str = "Not enough activity this week to generate a summary.";

/// Number of days the weekly summary looks back.
pub const SUMMARY_WINDOW_DAYS: i64 = 7;

/// Newest goals quoted in an accountability check-in.
pub const CHECK_IN_GOALS: usize = 3;

pub fn meeting_agenda(topic: &str) -> String {
    format!(
        "Act as an expert meeting facilitator. Generate a structured meeting agenda for the topic: \"{topic}\". \
         Include sections for Introduction (5 mins), key talking points with estimated times, and a wrap-up \
         with action items (10 mins). Keep the total time to about 45-60 minutes. Format it as clean text."
    )
}

pub fn win_analysis(win: &Win) -> String {
    format!(
        "An entrepreneur, {}, just had a win: \"{}\" which generated ${}. Act as a business coach. \
         First, write a short, celebratory message (1-2 sentences). Then, provide one actionable insight \
         or next step they could take based on this win. Format it like this:\n\
         CELEBRATION: [Your celebratory message here]\n\
         INSIGHT: [Your actionable insight here]",
        win.user_name, win.description, win.revenue_amount
    )
}

/// Weekly wins prompt, or `None` when nothing happened in the window.
///
/// Announcements are excluded since they are usually the assistant's own
/// earlier summaries.
pub fn weekly_summary(goals: &[Goal], messages: &[Message], now: DateTime<Utc>) -> Option<String> {
    let cutoff = now - Duration::days(SUMMARY_WINDOW_DAYS);

    let recent_goals: Vec<String> = goals
        .iter()
        .filter(|g| g.created_at > cutoff)
        .map(|g| format!("- Goal set: {}", g.text))
        .collect();
    let recent_messages: Vec<String> = messages
        .iter()
        .filter(|m| m.created_at > cutoff && m.kind != MessageKind::Announcement)
        .map(|m| format!("- Message from {}: {}", m.author, m.text))
        .collect();

    if recent_goals.is_empty() && recent_messages.is_empty() {
        return None;
    }

    Some(format!(
        "You are the community manager for \"Hustle Hub\". Generate a \"Weekly Wins\" summary based on the \
         following activity from the last 7 days. Make it exciting, celebratory, and brief (3-4 sentences). \
         Mention a specific highlight if possible.\n\nRecent Activity:\n{}\n{}\n\nGenerate the summary now.",
        recent_goals.join("\n"),
        recent_messages.join("\n")
    ))
}

pub fn trip_itinerary(trip: &Trip, members: &[Member], goals: &[Goal]) -> String {
    let member_info = members
        .iter()
        .map(|m| format!("- {}, who runs a {} business.", m.name, m.business_model_label))
        .collect::<Vec<_>>()
        .join("\n");
    let goal_info = qualifying_goal_texts(&trip.qualifying_goal_ids, goals).join(", ");

    format!(
        "We are a group of entrepreneurs planning a trip. Trip Name: {}. Trip Date: {}. \
         Our group consists of:\n{}. The goals we want to celebrate are: {}. \
         Generate a fun but productive 3-day itinerary. Format the output as clean text, \
         using markdown for headers (e.g., ### Day 1).",
        trip.name, trip.date, member_info, goal_info
    )
}

/// Motivational message prompt. `goals` is expected newest first.
pub fn motivation(members: &[Member], goals: &[Goal]) -> String {
    let member_info = members
        .iter()
        .map(|m| format!("- {} is working on {}", m.name, m.business_model_label))
        .collect::<Vec<_>>()
        .join("\n");
    let goal_info = goals
        .iter()
        .take(5)
        .map(|g| format!("- {}", g.text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a motivational coach for a group of young entrepreneurs. Context:\nMembers:\n{member_info}\n\
         Goals:\n{goal_info}\nWrite a short, powerful message (2-3 sentences) for the group. \
         Be inspiring. Do not use hashtags."
    )
}

pub fn goal_breakdown(goal: &str) -> String {
    format!(
        "My entrepreneur group has a new goal: \"{goal}\". Break this goal into a list of 3-5 smaller, \
         actionable steps. The steps should be concise. Do not number them or use markdown. \
         Just provide a raw list of steps separated by a newline character."
    )
}

pub fn goal_analysis(goal: &str) -> String {
    format!(
        "Act as a business strategist. Our goal is: \"{goal}\". Identify 2 potential risks and 2 \
         unforeseen opportunities. Format your response like this:\n\
         RISKS:\n- Risk 1\n- Risk 2\n\
         OPPORTUNITIES:\n- Opportunity 1\n- Opportunity 2"
    )
}

/// Group-name suggestions from the roster's business models (blank ones skipped).
pub fn group_names(members: &[Member]) -> String {
    let business_models = members
        .iter()
        .map(|m| m.business_model_label.as_str())
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Our entrepreneur group focuses on these business models: {business_models}. \
         Suggest 5 creative, cool, and motivational names for our group. List them separated by newlines."
    )
}

/// Accountability check-in for one member. `goals` is expected newest first.
pub fn check_in(member: &Member, goals: &[Goal]) -> String {
    let goal_text = goals
        .iter()
        .take(CHECK_IN_GOALS)
        .map(|g| g.text.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Act as an accountability coach for an entrepreneur named {}. Their business model is: {}. \
         Their recent goals with their group are: {}. Write a single, personalized, probing question to \
         help them reflect on their weekly progress. Make it encouraging but direct.",
        member.name, member.business_model_label, goal_text
    )
}

// Dangling ids are skipped.
fn qualifying_goal_texts<'a>(ids: &[RecordId], goals: &'a [Goal]) -> Vec<&'a str> {
    ids.iter()
        .filter_map(|id| goals.iter().find(|g| &g.id == id))
        .map(|g| g.text.as_str())
        .collect()
}

/// Parsed win analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinAnalysis {
    pub celebration: String,
    pub insight: String,
}

impl WinAnalysis {
    /// Body of the motivation-board post for this analysis.
    pub fn board_text(&self, user_name: &str) -> String {
        format!(
            "{}\n\n**Actionable Insight for {}:** {}",
            self.celebration, user_name, self.insight
        )
    }
}

fn celebration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"CELEBRATION: (.*)").expect("valid regex"))
}

fn insight_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"INSIGHT: (.*)").expect("valid regex"))
}

/// Split a win-analysis response into its two labelled lines, falling back
/// to fixed text for a missing label.
pub fn parse_win_analysis(text: &str) -> WinAnalysis {
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };

    WinAnalysis {
        celebration: capture(celebration_re()).unwrap_or_else(|| DEFAULT_CELEBRATION.to_string()),
        insight: capture(insight_re()).unwrap_or_else(|| DEFAULT_INSIGHT.to_string()),
    }
}

/// Split a newline-separated list response into its non-blank lines.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Risks and opportunities of a goal, bullet markers stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalAnalysis {
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
}

fn risks_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"RISKS:\r?\n((?:- .+(?:\r?\n|$))+)").expect("valid regex"))
}

fn opportunities_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"OPPORTUNITIES:\r?\n((?:- .+(?:\r?\n|$))+)").expect("valid regex")
    })
}

/// Parse the `RISKS:` and `OPPORTUNITIES:` bullet blocks. A missing or
/// malformed block yields an empty list.
pub fn parse_goal_analysis(text: &str) -> GoalAnalysis {
    let bullets = |re: &Regex| -> Vec<String> {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|block| {
                block
                    .as_str()
                    .lines()
                    .filter_map(|line| line.trim().strip_prefix("- "))
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    };

    GoalAnalysis {
        risks: bullets(risks_re()),
        opportunities: bullets(opportunities_re()),
    }
}
