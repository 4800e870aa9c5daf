use std::sync::Arc;

use anyhow::{Context, bail};
use colored::*;
use lift_common::config::Config;
use lift_common::models::TargetReport;
use lift_common::network::target;
use lift_common::success;
use lift_core::{ProbeEngine, RunReport, Scanner, Shutdown, SignatureStore};
use tracing::{Instrument, info, warn};

use crate::commands::CommandLine;
use crate::lprint;
use crate::terminal::{colors, print, progress};

pub async fn run(commands: CommandLine) -> anyhow::Result<()> {
    let Some(source) = commands.source() else {
        bail!("one of --ip, --file, --subnet or --asn is required");
    };
    let mode = commands.mode();

    let config = Config {
        verbose: commands.verbose,
        workers: commands.workers,
        ..Config::default()
    };

    let store = SignatureStore::load_dir(&commands.signatures)
        .with_context(|| format!("cannot load signatures from {}", commands.signatures.display()))?;
    success!("{} signatures ready", store.len());

    let entries = target::enumerate(&source)?;
    if entries.is_empty() {
        print::no_targets();
        bail!("no targets to probe");
    }

    let engine = Arc::new(ProbeEngine::new(config, Arc::new(store))?);
    let (trigger, shutdown) = Shutdown::channel();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing up with the results collected so far");
            let _ = trigger.send(true);
        }
    });

    info!("Probing port {} in {mode:?} mode", commands.port);
    print::header("findings");

    let span = progress::run_span(entries.len());
    let run = {
        let bar = span.clone();
        let verbose = commands.verbose;
        let scanner = Scanner::new(engine).on_report(Box::new(move |report: &TargetReport| {
            progress::advance(&bar, report);
            report_findings(report, verbose);
        }));
        scanner.run(entries, commands.port, mode, shutdown).instrument(span).await
    };

    run_ends(&run);
    Ok(())
}

fn report_findings(report: &TargetReport, verbose: bool) {
    if let Some(fingerprint) = report.fingerprint.as_ref().filter(|f| f.is_reportable(verbose)) {
        print::finding(fingerprint);
    }
    for verdict in &report.verdicts {
        print::verdict(verdict);
    }
}

fn run_ends(run: &RunReport) {
    lprint!();
    print::header("target status");
    print::status_list(&run.reports);

    if run.interrupted {
        lprint!();
        warn!("{} targets were aborted, {} never started", run.aborted(), run.not_started);
    }

    print_summary(run);
    print::end_of_program();
}

fn print_summary(run: &RunReport) {
    let identified: ColoredString = format!("{} identified", run.identified()).bold().green();
    let vulnerable: ColoredString = format!("{} vulnerable", run.vulnerable()).bold().red();
    let completed = format!("{}/{}", run.succeeded(), run.reports.len() + run.not_started);
    let total_time: ColoredString =
        format!("{:.2}s", run.elapsed().num_milliseconds() as f64 / 1000.0).bold().yellow();

    let output: ColoredString =
        format!("{completed} done: {identified}, {vulnerable} in {total_time}").color(colors::TEXT_DEFAULT);

    print::fat_separator();
    print::centerln(&output.to_string());
}
