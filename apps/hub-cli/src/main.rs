use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{AssistCommand, Cli, Command, SelectionCommand};
use commands::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Demo { window_ms, goals } => {
            cmd_demo(window_ms, goals).await?;
        }
        Command::Assist { assist_cmd } => match assist_cmd {
            AssistCommand::Agenda { topic } => {
                cmd_assist_agenda(&topic).await?;
            }
            AssistCommand::Analyze {
                description,
                revenue,
                name,
            } => {
                cmd_assist_analyze(&description, revenue, &name).await?;
            }
        },
        Command::Selection { selection_cmd } => match selection_cmd {
            SelectionCommand::Show => {
                cmd_selection_show()?;
            }
            SelectionCommand::Clear => {
                cmd_selection_clear()?;
            }
        },
    }

    Ok(())
}
