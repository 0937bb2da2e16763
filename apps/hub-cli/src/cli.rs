use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hub")]
#[command(about = "Hustle Hub sync engine and assistant CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run two in-process clients against a shared store and show what syncs
    Demo {
        /// Initial-load window in milliseconds (overrides HUB_INITIAL_LOAD_WINDOW_MS)
        #[arg(long)]
        window_ms: Option<u64>,

        /// Goals the second member posts once live
        #[arg(long, default_value_t = 3)]
        goals: usize,
    },
    /// Assistant commands
    Assist {
        #[command(subcommand)]
        assist_cmd: AssistCommand,
    },
    /// Persisted workspace selection
    Selection {
        #[command(subcommand)]
        selection_cmd: SelectionCommand,
    },
}

#[derive(Subcommand)]
pub enum AssistCommand {
    /// Draft a meeting agenda
    Agenda {
        /// Meeting topic
        topic: String,
    },
    /// Celebrate a win and suggest a next step
    Analyze {
        /// What was achieved
        description: String,

        /// Revenue generated
        revenue: f64,

        /// Name of the member who logged the win
        #[arg(long, default_value = "You")]
        name: String,
    },
}

#[derive(Subcommand)]
pub enum SelectionCommand {
    /// Show the stored workspace id
    Show,
    /// Forget the stored workspace id
    Clear,
}
