//! Rendering of summaries and predictions as text, JSON or tables.

use blocktime_core::{
    config::{OutputConfig, OutputFormat},
    types::{MultiBlockPrediction, Prediction, StatisticalSummary},
};
use chrono::{DateTime, SecondsFormat, Utc};
use prettytable::{row, Table};
use serde::Serialize;
use std::{collections::BTreeMap, fmt::Write as _, time::Duration};

use crate::commands::utils::CliResult;

const MAX_PROPOSER_WIDTH: usize = 38;

/// Human-readable duration: seconds below a minute, minutes below an hour, hours otherwise.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        return format!("{:.0} seconds", duration.as_secs_f64());
    }
    if secs < 3600 {
        let (mins, rem) = (secs / 60, secs % 60);
        return if rem > 0 { format!("{mins}m {rem}s") } else { format!("{mins} minutes") };
    }
    let (hours, mins) = (secs / 3600, (secs / 60) % 60);
    if mins > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{hours} hours")
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn json<T: Serialize>(value: &T, output: &OutputConfig) -> CliResult<String> {
    let rendered = if output.pretty_print {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}

fn short_proposer(proposer: &str) -> String {
    if proposer.len() > MAX_PROPOSER_WIDTH {
        format!("{}...", proposer.get(..35).unwrap_or(proposer))
    } else {
        proposer.to_string()
    }
}

pub fn summary(summary: &StatisticalSummary, output: &OutputConfig) -> CliResult<String> {
    let stats = &summary.stats;
    let range = &summary.estimated_range;

    match output.format {
        OutputFormat::Json => json(summary, output),
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(out, "Block Time Statistics")?;
            writeln!(out, "=====================")?;
            writeln!(out, "Sample Size: {} blocks", summary.sample_size)?;
            writeln!(out, "Height Range: {} - {}", summary.start_height, summary.end_height)?;
            writeln!(
                out,
                "Time Range: {} - {}",
                timestamp(&summary.start_time),
                timestamp(&summary.end_time)
            )?;
            writeln!(out, "\nStatistics (seconds):")?;
            writeln!(out, "  Mean: {:.2}", stats.mean)?;
            writeln!(out, "  Median: {:.2}", stats.median)?;
            writeln!(out, "  Std Dev: {:.2}", stats.std_dev)?;
            writeln!(out, "  Min: {:.2}", stats.min)?;
            writeln!(out, "  Max: {:.2}", stats.max)?;

            if output.verbose {
                writeln!(out, "\nPercentiles:")?;
                writeln!(out, "  P25: {:.2}", stats.p25)?;
                writeln!(out, "  P75: {:.2}", stats.p75)?;
                writeln!(out, "  P95: {:.2}", stats.p95)?;
                writeln!(out, "  P99: {:.2}", stats.p99)?;
                writeln!(out, "\nOutliers Removed: {}", summary.outlier_count)?;
            }

            writeln!(
                out,
                "\nEstimated Block Time Range ({:.0}% confidence):",
                summary.confidence_level * 100.0
            )?;
            writeln!(out, "  Lower Bound: {:.2} seconds", range.lower)?;
            writeln!(out, "  Upper Bound: {:.2} seconds", range.upper)?;
            write!(out, "  Typical: {:.2} seconds", range.typical)?;
            Ok(out)
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_titles(row!["Metric", "Value"]);
            table.add_row(row!["Sample Size", format!("{} blocks", summary.sample_size)]);
            table.add_row(row![
                "Height Range",
                format!("{} - {}", summary.start_height, summary.end_height)
            ]);
            table.add_row(row!["Mean", format!("{:.2} s", stats.mean)]);
            table.add_row(row!["Median", format!("{:.2} s", stats.median)]);
            table.add_row(row!["Std Dev", format!("{:.2} s", stats.std_dev)]);
            table.add_row(row!["Range", format!("{:.2} - {:.2} s", stats.min, stats.max)]);
            if output.verbose {
                table.add_row(row![
                    "P25 / P75",
                    format!("{:.2} / {:.2} s", stats.p25, stats.p75)
                ]);
                table.add_row(row![
                    "P95 / P99",
                    format!("{:.2} / {:.2} s", stats.p95, stats.p99)
                ]);
            }
            table.add_row(row!["Outliers Removed", summary.outlier_count]);
            table.add_row(row![
                "Estimated Range",
                format!("{:.2} - {:.2} s", range.lower, range.upper)
            ]);
            table.add_row(row!["Typical Block Time", format!("{:.2} s", range.typical)]);
            table.add_row(row![
                "Confidence Level",
                format!("{:.0}%", summary.confidence_level * 100.0)
            ]);
            Ok(table.to_string())
        }
    }
}

pub fn proposers(
    proposers: &BTreeMap<String, StatisticalSummary>,
    output: &OutputConfig,
) -> CliResult<String> {
    if proposers.is_empty() && output.format != OutputFormat::Json {
        return Ok("No proposer statistics available".to_string());
    }

    match output.format {
        OutputFormat::Json => json(proposers, output),
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(
                out,
                "{:<40} | {:>10} | {:>10} | {:>10} | {:>10}",
                "Proposer", "Blocks", "Mean (s)", "Median (s)", "Std Dev"
            )?;
            writeln!(out, "{0}|{1}|{1}|{1}|{1}", "-".repeat(41), "-".repeat(12))?;
            for (proposer, summary) in proposers {
                writeln!(
                    out,
                    "{:<40} | {:>10} | {:>10.2} | {:>10.2} | {:>10.2}",
                    short_proposer(proposer),
                    summary.sample_size,
                    summary.stats.mean,
                    summary.stats.median,
                    summary.stats.std_dev
                )?;
            }
            Ok(out.trim_end().to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_titles(row!["Proposer", "Blocks", "Mean (s)", "Median (s)", "Std Dev", "Outliers"]);
            for (proposer, summary) in proposers {
                table.add_row(row![
                    short_proposer(proposer),
                    r->summary.sample_size,
                    r->format!("{:.2}", summary.stats.mean),
                    r->format!("{:.2}", summary.stats.median),
                    r->format!("{:.2}", summary.stats.std_dev),
                    r->summary.outlier_count
                ]);
            }
            Ok(table.to_string())
        }
    }
}

pub fn prediction(prediction: &Prediction, output: &OutputConfig) -> CliResult<String> {
    if output.format == OutputFormat::Json {
        return json(prediction, output);
    }

    if prediction.is_complete {
        let mut out = String::new();
        writeln!(out, "Block {} already exists", prediction.target_height)?;
        if let Some(actual) = &prediction.actual_time {
            write!(out, "Created at: {}", timestamp(actual))?;
        }
        return Ok(out);
    }

    let (
        Some(current_time),
        Some(estimated),
        Some(optimistic),
        Some(pessimistic),
        Some(duration),
    ) = (
        prediction.current_time,
        prediction.estimated_time,
        prediction.optimistic_time,
        prediction.pessimistic_time,
        prediction.duration,
    )
    else {
        return Ok(format!("No estimate available for block {}", prediction.target_height));
    };

    if output.format == OutputFormat::Table {
        let mut table = Table::new();
        table.set_titles(row!["Metric", "Value"]);
        table.add_row(row!["Target Block", prediction.target_height]);
        table.add_row(row!["Current Block", prediction.current_height]);
        table.add_row(row!["Blocks Remaining", prediction.blocks_left]);
        table.add_row(row!["Estimated Time", estimated.format("%Y-%m-%d %H:%M:%S")]);
        table.add_row(row!["Time from Now", format_duration(duration.typical)]);
        table.add_row(row![
            "Range",
            format!("{} - {}", format_duration(duration.min), format_duration(duration.max))
        ]);
        return Ok(table.to_string());
    }

    let mut out = String::new();
    writeln!(out, "Block Time Prediction")?;
    writeln!(out, "=====================")?;
    writeln!(out, "Target Block: {}", prediction.target_height)?;
    writeln!(out, "Current Block: {}", prediction.current_height)?;
    writeln!(out, "Blocks Remaining: {}", prediction.blocks_left)?;
    writeln!(out, "Current Time: {}", timestamp(&current_time))?;
    if let Some(age) = prediction.current_block_age {
        writeln!(out, "Current Block Age: {}", format_duration(age))?;
    }

    writeln!(out, "\nEstimated Arrival Time:")?;
    writeln!(
        out,
        "  Typical: {} (in {})",
        timestamp(&estimated),
        format_duration(duration.typical)
    )?;
    writeln!(
        out,
        "  Optimistic: {} (in {})",
        timestamp(&optimistic),
        format_duration(duration.min)
    )?;
    write!(
        out,
        "  Pessimistic: {} (in {})",
        timestamp(&pessimistic),
        format_duration(duration.max)
    )?;

    if let (true, Some(summary)) = (output.verbose, &prediction.summary) {
        writeln!(out, "\n\nBlock Time Statistics:")?;
        writeln!(out, "  Mean: {:.2} seconds", summary.stats.mean)?;
        writeln!(out, "  Median: {:.2} seconds", summary.stats.median)?;
        write!(out, "  Confidence: {:.0}%", summary.confidence_level * 100.0)?;
    }
    Ok(out)
}

pub fn milestones(prediction: &MultiBlockPrediction, output: &OutputConfig) -> CliResult<String> {
    match output.format {
        OutputFormat::Json => json(prediction, output),
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(out, "Next Blocks Prediction")?;
            writeln!(out, "======================")?;
            writeln!(out, "Current Block: {}", prediction.current_height)?;
            writeln!(out, "Current Time: {}", timestamp(&prediction.current_time))?;
            writeln!(out, "\nUpcoming Blocks:")?;
            for milestone in &prediction.predictions {
                writeln!(
                    out,
                    "  Block {}: {} (in {})",
                    milestone.height,
                    milestone.estimated_time.format("%H:%M:%S"),
                    format_duration(milestone.duration)
                )?;
            }
            if output.verbose {
                writeln!(
                    out,
                    "\nBased on block time: {:.2}s (±{:.2}s)",
                    prediction.summary.stats.median, prediction.summary.stats.std_dev
                )?;
            }
            Ok(out.trim_end().to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_titles(row!["Block", "Estimated Time", "Duration"]);
            for milestone in &prediction.predictions {
                table.add_row(row![
                    milestone.height,
                    milestone.estimated_time.format("%Y-%m-%d %H:%M:%S"),
                    format_duration(milestone.duration)
                ]);
            }
            Ok(table.to_string())
        }
    }
}

/// Prints `rendered` to stdout and, if configured, writes it to `save_to_file`.
pub fn emit(rendered: &str, output: &OutputConfig) -> CliResult<()> {
    println!("{rendered}");

    if let Some(path) = &output.save_to_file {
        std::fs::write(path, format!("{rendered}\n"))?;
        tracing::info!(path = %path, "output saved");
    }
    Ok(())
}
