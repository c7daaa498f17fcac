//! CLI command handlers, one file per command.

mod run;
mod status;
mod verify;

pub use run::{run_download, RunArgs};
pub use status::run_status;
pub use verify::run_verify;
