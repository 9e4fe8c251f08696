//! Single-line widgets around the main pane.

mod header;
mod help_bar;
mod status_line;

pub use header::draw_header;
pub use help_bar::{describe_hints, draw_help_bar, log_hints};
pub use status_line::{draw_prompt, draw_status};
