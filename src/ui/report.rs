use colored::*;

use super::formatters::{
    format_day_label, format_hours, format_percent, format_temperature, format_timestamp,
};
use crate::core::usage::{report::WindowStats, UsageReport, UsageWindow};

const BAR_WIDTH: usize = 20;

/// Print a usage report as colored tables
pub fn print_report(report: &UsageReport) {
    println!("\n{}", "GPU USAGE SUMMARY".bold().bright_cyan());
    println!("{}", "=".repeat(80));
    println!(
        "  Last updated: {}",
        format_timestamp(report.updated_at).dimmed()
    );

    if report.devices.is_empty() {
        println!();
        println!("{}", "No GPU usage has been recorded yet.".yellow());
        println!("{}", "Start the collector with:".white());
        println!("  {}", "gpu-usage collect".cyan().bold());
        return;
    }

    print_section_header("Overall");
    print_windows(&report.overall);

    for device in &report.devices {
        let title = if device.index.is_empty() {
            device.name.clone()
        } else {
            format!("GPU {} - {}", device.index, device.name)
        };
        print_section_header(&title);
        println!("  {} {}", "Id:".dimmed(), device.id.dimmed());
        if let Some(ts) = device.last_sample_ts {
            println!("  {} {}", "Last sample:".dimmed(), format_timestamp(ts).dimmed());
        }
        print_windows(&device.windows);
    }

    print_section_header("Daily average (UTC)");
    for point in &report.daily {
        let bar = match point.average {
            Some(avg) => create_usage_bar(avg, BAR_WIDTH),
            None => format!("[{}]", " ".repeat(BAR_WIDTH)),
        };
        println!(
            "  {:<8} {} {:>7}",
            format_day_label(point.day_start),
            bar,
            format_percent(point.average)
        );
    }
    println!();
}

fn print_section_header(title: &str) {
    println!("\n{}", title.bold().green());
    println!("{}", "-".repeat(title.chars().count()));
}

fn print_windows(windows: &WindowStats) {
    println!(
        "  {:<6} {:>8} {:>10} {:>10} {:>8} {:>7}",
        "".dimmed(),
        "Avg".bold(),
        "Weighted".bold(),
        "In use".bold(),
        "Memory".bold(),
        "Temp".bold()
    );

    for window in UsageWindow::ALL {
        let stats = windows.get(window);
        println!(
            "  {:<6} {:>8} {:>10} {:>10} {:>8} {:>7}",
            window.label(),
            colorize_percent(stats.average),
            format_percent(stats.in_use_percent),
            format_hours(stats.in_use_ms),
            format_percent(stats.memory_average),
            format_temperature(stats.temperature_average)
        );
    }
}

fn colorize_percent(value: Option<f64>) -> ColoredString {
    let text = format_percent(value);
    match value {
        Some(v) if v >= 85.0 => text.red(),
        Some(v) if v >= 50.0 => text.yellow(),
        Some(_) => text.green(),
        None => text.dimmed(),
    }
}

/// Create a usage bar with block characters
fn create_usage_bar(usage_percent: f64, width: usize) -> String {
    let clamped = usage_percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);

    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(empty));

    let colored_bar = if clamped >= 85.0 {
        bar.red()
    } else if clamped >= 50.0 {
        bar.yellow()
    } else {
        bar.green()
    };

    format!("[{}]", colored_bar)
}
