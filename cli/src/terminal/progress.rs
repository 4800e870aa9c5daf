//! Progress bar of a run, drawn by `tracing-indicatif` for the span returned
//! by [`run_span`].

use colored::*;
use indicatif::ProgressStyle;
use lift_common::models::TargetReport;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
    "▁▁▁▁▁",
];

fn style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg} [{bar:32.green/bright_black}] {pos}/{len} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(TICKS)
        .progress_chars("━╸─")
}

pub fn run_span(total: usize) -> Span {
    let span = info_span!("probing", indicatif.pb_show = true);
    span.pb_set_style(&style());
    span.pb_set_length(total as u64);
    span.pb_set_message(&format!("{}", "Press Ctrl-C to stop early".italic().white()));
    span
}

pub fn advance(span: &Span, report: &TargetReport) {
    span.pb_inc(1);
    if let Some(fingerprint) = report.fingerprint.as_ref().filter(|f| f.is_identified()) {
        span.pb_set_message(&format!("Last identified: {}", fingerprint.addr.to_string().green().bold()));
    }
}
