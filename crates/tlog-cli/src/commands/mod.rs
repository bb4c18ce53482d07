//! Command implementations for the CLI.

mod cleanup;
mod export;
mod generate;
mod list;
mod show;
mod stats;

pub use cleanup::cmd_cleanup;
pub use export::{ExportArgs, cmd_export};
pub use generate::{GenerateArgs, cmd_generate};
pub use list::cmd_list;
pub use show::{ShowArgs, cmd_show};
pub use stats::cmd_stats;
