pub mod assist;
pub mod demo;
pub mod selection;

pub use assist::{cmd_assist_agenda, cmd_assist_analyze};
pub use demo::cmd_demo;
pub use selection::{cmd_selection_clear, cmd_selection_show};
