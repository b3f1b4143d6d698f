//! Command handlers, one module per top-level subcommand.

pub mod check;
pub mod config_cmd;
pub mod serials;
pub mod state;
pub mod util;
