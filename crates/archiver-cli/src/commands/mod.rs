//! Command implementations for the CLI.

mod fetch;
mod plot;
mod print;
mod stats;

pub use fetch::{FetchArgs, cmd_fetch};
pub use plot::{PlotArgs, cmd_plot};
pub use print::{cmd_print, cmd_tail};
pub use stats::cmd_stats;
