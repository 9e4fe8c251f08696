// lib.rs
use std::backtrace::Backtrace;
use std::panic;

use tracing::error;

cfg_if::cfg_if! {
    if #[cfg(feature = "telemetry")] {
        pub use kubeview_telemetry as logging;
    } else {
        pub mod log;
        pub use log as logging;
    }
}

pub mod access;
pub mod cmd;
pub mod config;
pub mod decode;
pub mod diff;
pub mod filter;
pub mod keymap;
pub mod processors;
pub mod reconcile;
pub mod sort;
pub mod store;
pub mod streaming;
pub mod structs;
pub mod ui;
pub mod utils;

/// Logs every panic with a captured backtrace, runs `before` (terminal
/// restore), then hands over to the previous hook.
pub fn install_panic_hook(before: fn()) {
    let default = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let bt = Backtrace::force_capture();
        error!(target: "panic", "panic: {panic_info}\n\nBacktrace:\n{bt}");
        before();
        default(panic_info);
    }));
}
