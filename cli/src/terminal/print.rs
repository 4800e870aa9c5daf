use colored::*;
use lift_common::models::{ProbeResult, ReflectionOutcome, ReflectionVerdict, TargetReport, TargetStatus};
use tracing::info;

use crate::terminal::colors;
use crate::terminal::logging::PRINT_TARGET;

pub const TOTAL_WIDTH: usize = 64;

#[macro_export]
macro_rules! lprint {
    () => {
        $crate::terminal::print::print("");
    };
    ($msg:expr) => {
        $crate::terminal::print::print($msg);
    };
}

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().color(colors::PRIMARY),
        "─".repeat(right)
    )
    .color(colors::SEPARATOR);

    print(&format!("{}", line));
}

pub fn fat_separator() {
    let sep: ColoredString = "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR);
    print(&format!("{}", sep));
}

pub fn centerln(msg: &str) {
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2);
    print(&format!("{}{}{}", space, msg, space));
}

/// One line per fingerprint worth reporting.
pub fn finding(result: &ProbeResult) {
    let addr: ColoredString = result.addr.to_string().color(colors::ACCENT);
    let method: ColoredString = format!("({})", result.method).color(colors::SEPARATOR);

    let what: ColoredString = match (&result.matched_label, &result.observation) {
        (Some(label), _) => label.as_str().color(colors::PRIMARY).bold(),
        (None, Some(observation)) => observation.to_string().color(colors::TEXT_DEFAULT),
        (None, None) => "unidentified".color(colors::SEPARATOR),
    };

    print(&format!("{addr}: {what} {method}"));
}

pub fn verdict(verdict: &ReflectionVerdict) {
    let line: ColoredString = match &verdict.outcome {
        ReflectionOutcome::Vulnerable => verdict.to_string().color(colors::FAILURE).bold(),
        ReflectionOutcome::NotVulnerable => verdict.to_string().color(colors::TEXT_DEFAULT),
        ReflectionOutcome::Error(_) => verdict.to_string().color(colors::WARNING),
    };

    let detail: ColoredString = match &verdict.outcome {
        ReflectionOutcome::Error(reason) => format!("[{reason}]").color(colors::SEPARATOR),
        _ if verdict.detail.is_empty() => "".normal(),
        _ => format!("[{}]", verdict.detail).color(colors::SEPARATOR),
    };

    print(format!("{line} {detail}").trim_end());
}

/// `"<entry> : <status>"` for every target, in input order.
pub fn status_list(reports: &[TargetReport]) {
    for report in reports {
        let line = report.status_line();
        let colored_line: ColoredString = match report.status {
            TargetStatus::Success => line.color(colors::TEXT_DEFAULT),
            TargetStatus::Failed(_) => line.color(colors::FAILURE),
            TargetStatus::Aborted => line.color(colors::WARNING),
        };
        print(&format!("{}", colored_line));
    }
}

const NO_RESULTS_0: &str = r#"
     _   _  ___    _____  _    ____   ____ _____ _____ ____
    | \ | |/ _ \  |_   _|/ \  |  _ \ / ___| ____|_   _/ ___|
    |  \| | | | |   | | / _ \ | |_) | |  _|  _|   | | \___ \
    | |\  | |_| |   | |/ ___ \|  _ <| |_| | |___  | |  ___) |
    |_| \_|\___/    |_/_/   \_\_| \_\\____|_____| |_| |____/
"#;

pub fn no_targets() {
    print(&format!("{}", NO_RESULTS_0.red().bold()));
}

pub fn end_of_program() {
    print(&format!("{}", "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR)));
}
