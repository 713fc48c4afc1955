//! Visual styling utilities for the CLI.
//!
//! This module provides consistent styling across all CLI output including:
//! - Color thresholds for sensor values
//! - Table formatting
//! - Status messages

use owo_colors::OwoColorize;

use archiver_types::Sensor;

use crate::cli::StyleMode;

// ============================================================================
// Color Thresholds
// ============================================================================

/// CO2 thresholds (ppm) based on indoor air quality guidelines.
pub mod co2 {
    pub const GOOD: i64 = 800; // Green: < 800 ppm
    pub const MODERATE: i64 = 1000; // Yellow: 800-1000 ppm
    pub const POOR: i64 = 1500; // Orange: 1000-1500 ppm
    // Red: > 1500 ppm
}

/// Humidity thresholds (percentage) for comfort.
pub mod humidity {
    pub const LOW: i64 = 30; // Yellow: < 30% (too dry)
    pub const HIGH: i64 = 70; // Yellow: > 70% (too humid)
}

/// Temperature thresholds (Celsius) for comfort.
pub mod temperature {
    pub const COLD: f64 = 18.0; // Blue: < 18°C
    pub const WARM: f64 = 26.0; // Orange: > 26°C
}

// ============================================================================
// Colored Value Formatting
// ============================================================================

/// Format CO2 value with appropriate color based on thresholds.
pub fn format_co2_colored(ppm: i64, no_color: bool) -> String {
    if no_color {
        return format!("{}", ppm);
    }

    if ppm < co2::GOOD {
        format!("{}", ppm.green())
    } else if ppm < co2::MODERATE {
        format!("{}", ppm.yellow())
    } else if ppm < co2::POOR {
        // Orange color (RGB: 255, 165, 0)
        format!("{}", ppm.truecolor(255, 165, 0))
    } else {
        format!("{}", ppm.red())
    }
}

/// Format humidity with color based on comfort levels.
pub fn format_humidity_colored(percent: i64, no_color: bool) -> String {
    if no_color {
        return format!("{}", percent);
    }

    if (humidity::LOW..=humidity::HIGH).contains(&percent) {
        format!("{}", percent.green())
    } else {
        format!("{}", percent.yellow())
    }
}

/// Format temperature with color based on comfort levels.
pub fn format_temp_colored(celsius: f64, no_color: bool) -> String {
    let text = format!("{:.1}", celsius);
    if no_color {
        return text;
    }

    if celsius < temperature::COLD {
        format!("{}", text.blue())
    } else if celsius > temperature::WARM {
        format!("{}", text.truecolor(255, 165, 0))
    } else {
        format!("{}", text.green())
    }
}

/// Color used for a sensor's chart line.
pub fn paint_sensor(sensor: Sensor, text: &str, no_color: bool) -> String {
    if no_color {
        return text.to_string();
    }

    match sensor {
        Sensor::Temperature => format!("{}", text.red()),
        Sensor::Humidity => format!("{}", text.blue()),
        Sensor::Pressure => format!("{}", text.magenta()),
        Sensor::Co2 => format!("{}", text.green()),
    }
}

// ============================================================================
// Status Messages
// ============================================================================

/// Format a success message.
pub fn format_success(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[OK] {}", message)
    } else {
        format!("{} {}", "[OK]".green(), message)
    }
}

/// Format a warning message.
pub fn format_warning(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[WARN] {}", message)
    } else {
        format!("{} {}", "[WARN]".yellow(), message)
    }
}

/// Dim secondary text.
pub fn dimmed(text: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("{}", text.dimmed())
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Terminal width in columns, or 80 when not attached to a terminal.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Apply the table style for the given mode.
pub fn apply_table_style(table: &mut tabled::Table, style: StyleMode) {
    use tabled::settings::Style;
    match style {
        StyleMode::Rich | StyleMode::Minimal => {
            table.with(Style::rounded());
        }
        StyleMode::Plain => {
            table.with(Style::blank());
        }
    }
}
