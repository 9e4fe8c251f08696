//! Palette shared by every pane.

use ratatui::style::{Color, Modifier, Style};

use crate::structs::{Action, Severity};

pub const INFO: Color = Color::Rgb(0x60, 0x8B, 0x4E); // #608B4E - green
pub const WARNING: Color = Color::Rgb(0xD1, 0x9A, 0x66); // #D19A66 - orange
pub const ERROR: Color = Color::Rgb(0xD1, 0x69, 0x69); // #D16969 - red
pub const DEBUG: Color = Color::Rgb(0xDC, 0xDC, 0xAA); // #DCDCAA - yellow
pub const HEADER: Color = Color::Rgb(0x56, 0x9C, 0xD6); // #569CD6 - blue
pub const SUCCESS: Color = Color::Rgb(0x4E, 0xC9, 0xB0); // #4EC9B0 - cyan
pub const PENDING: Color = Color::Rgb(0xC5, 0x86, 0xC0); // #C586C0 - purple
pub const GRAY: Color = Color::Rgb(0x66, 0x66, 0x66); // #666666 - dark gray
pub const GRAY_BG: Color = Color::Rgb(0x3E, 0x44, 0x51); // #3E4451 - background gray

/// Base style of a row by its reconciliation action.
pub fn action_style(action: Action) -> Style {
    match action {
        Action::Added => Style::default().fg(SUCCESS).add_modifier(Modifier::BOLD),
        Action::New | Action::Unchanged | Action::Modified => Style::default(),
    }
}

/// Highlight of a single cell that changed in the last cycle.
pub fn delta_style() -> Style {
    Style::default().fg(DEBUG).add_modifier(Modifier::BOLD)
}

/// Colors a STATUS-like cell by its value.
pub fn status_style(value: &str) -> Style {
    let color = match value {
        "Running" | "Active" | "Completed" | "Succeeded" | "Bound" => INFO,
        "Pending" | "ContainerCreating" | "PodInitializing" | "Terminating" => PENDING,
        v if v.starts_with("Init:") => PENDING,
        "Failed" | "Error" | "CrashLoopBackOff" | "ImagePullBackOff" | "ErrImagePull"
        | "OOMKilled" | "Unknown" | "Evicted" => ERROR,
        _ => return Style::default(),
    };
    Style::default().fg(color)
}

pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => INFO,
        Severity::Warn => WARNING,
        Severity::Error => ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_style() {
        assert_eq!(status_style("Running").fg, Some(INFO));
        assert_eq!(status_style("Init:0/1").fg, Some(PENDING));
        assert_eq!(status_style("CrashLoopBackOff").fg, Some(ERROR));
        assert_eq!(status_style("whatever"), Style::default());
    }
}
