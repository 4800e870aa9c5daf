//! # Worker Pool
//!
//! Runs the probe engine over every entry of a run with a bounded number of
//! workers.
//!
//! **Architecture:**
//! * A feeder task pulls `(seq, entry)` pairs from the lazy [`Entries`] into a
//!   bounded queue, a few slots per worker.
//! * Each worker takes one entry at a time and runs its whole probe chain.
//! * Reports go through a channel to a single collector task, the only owner
//!   of the result list.
//! * An interrupt drops the in-flight chains (closing their sockets) and
//!   records those targets as aborted; the feeder stops and every entry that
//!   never reached a worker counts as not started.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lift_common::error::ProbeError;
use lift_common::models::{ScanMode, TargetReport, TargetStatus};
use lift_common::network::target::{Entries, to_probe_target};
use lift_common::success;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::ProbeEngine;

/// Called by the collector for every finished target, in completion order.
pub type ReportCallback = Box<dyn Fn(&TargetReport) + Send + Sync>;

type Queue = Arc<Mutex<mpsc::Receiver<(usize, String)>>>;

const QUEUE_SLOTS_PER_WORKER: usize = 4;

/// Receiving half of the run-wide interrupt.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// A trigger and its listener. Send `true` to interrupt.
    pub fn channel() -> (watch::Sender<bool>, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (tx, Self::new(rx))
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the interrupt fires. Never resolves if the trigger is
    /// dropped without firing.
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Everything a run produced, ordered like the input.
#[derive(Debug)]
pub struct RunReport {
    pub reports: Vec<TargetReport>,
    pub interrupted: bool,
    /// Entries no worker picked up before the run was interrupted.
    pub not_started: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    fn count(&self, status: fn(&TargetStatus) -> bool) -> usize {
        self.reports.iter().filter(|r| status(&r.status)).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| *s == TargetStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, TargetStatus::Failed(_)))
    }

    pub fn aborted(&self) -> usize {
        self.count(|s| *s == TargetStatus::Aborted)
    }

    pub fn identified(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.fingerprint.as_ref().is_some_and(|f| f.is_identified()))
            .count()
    }

    pub fn vulnerable(&self) -> usize {
        self.reports
            .iter()
            .flat_map(|r| &r.verdicts)
            .filter(|v| v.vulnerable())
            .count()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

pub struct Scanner {
    engine: Arc<ProbeEngine>,
    workers: usize,
    on_report: Option<Arc<ReportCallback>>,
}

impl Scanner {
    pub fn new(engine: Arc<ProbeEngine>) -> Self {
        let workers = engine.config().workers.max(1);
        Self {
            engine,
            workers,
            on_report: None,
        }
    }

    pub fn on_report(mut self, callback: ReportCallback) -> Self {
        self.on_report = Some(Arc::new(callback));
        self
    }

    /// Probes every entry on `port` in `mode` until done or interrupted.
    pub async fn run(
        &self,
        entries: impl Into<Entries>,
        port: u16,
        mode: ScanMode,
        shutdown: Shutdown,
    ) -> RunReport {
        let started_at = Utc::now();
        let entries: Entries = entries.into();
        let total = entries.len();

        let worker_count = self.workers.min(total).max(1);
        info!("Probing {total} targets with {worker_count} workers");

        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_SLOTS_PER_WORKER * worker_count);
        let feeder = tokio::spawn(feed(entries, queue_tx, shutdown.clone()));
        let queue: Queue = Arc::new(Mutex::new(queue_rx));

        let (report_tx, report_rx) = mpsc::unbounded_channel::<TargetReport>();
        let collector = tokio::spawn(collect(report_rx, self.on_report.clone()));

        let handles: Vec<JoinHandle<()>> = (0..worker_count)
            .map(|id| {
                let worker = Worker {
                    id,
                    engine: self.engine.clone(),
                    queue: queue.clone(),
                    reports: report_tx.clone(),
                    shutdown: shutdown.clone(),
                    port,
                    mode,
                };
                tokio::spawn(worker.run())
            })
            .collect();
        drop(report_tx);

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker stopped unexpectedly: {e}");
            }
        }

        // Closing the queue releases a feeder blocked on a full channel.
        drop(queue);
        if let Err(e) = feeder.await {
            error!("Entry feeder stopped unexpectedly: {e}");
        }

        let mut reports = match collector.await {
            Ok(reports) => reports,
            Err(e) => {
                error!("Result collector stopped unexpectedly: {e}");
                Vec::new()
            }
        };
        reports.sort_by_key(|report| report.seq);

        let not_started = total.saturating_sub(reports.len());

        let interrupted = shutdown.is_triggered();
        if interrupted {
            warn!("Run interrupted, {not_started} targets were never started");
        } else {
            success!("Finished probing {} targets", reports.len());
        }

        RunReport {
            reports,
            interrupted,
            not_started,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

async fn feed(entries: Entries, queue: mpsc::Sender<(usize, String)>, mut shutdown: Shutdown) {
    for (seq, entry) in entries.enumerate() {
        tokio::select! {
            biased;
            _ = shutdown.triggered() => break,
            sent = queue.send((seq, entry)) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
}

async fn collect(
    mut rx: mpsc::UnboundedReceiver<TargetReport>,
    on_report: Option<Arc<ReportCallback>>,
) -> Vec<TargetReport> {
    let mut reports = Vec::new();
    while let Some(report) = rx.recv().await {
        if let Some(callback) = &on_report {
            callback(&report);
        }
        reports.push(report);
    }
    reports
}

struct Worker {
    id: usize,
    engine: Arc<ProbeEngine>,
    queue: Queue,
    reports: mpsc::UnboundedSender<TargetReport>,
    shutdown: Shutdown,
    port: u16,
    mode: ScanMode,
}

impl Worker {
    async fn run(mut self) {
        loop {
            let queue = self.queue.clone();
            let next = tokio::select! {
                biased;
                _ = self.shutdown.triggered() => None,
                next = async move { queue.lock().await.recv().await } => next,
            };
            let Some((seq, entry)) = next else {
                break;
            };

            let report = match to_probe_target(seq, &entry, self.port, self.mode) {
                Ok(target) => {
                    tokio::select! {
                        biased;
                        _ = self.shutdown.triggered() => {
                            debug!("Worker {}: {} {}", self.id, target.addr, ProbeError::Interrupted);
                            TargetReport::aborted(&target)
                        }
                        report = self.engine.probe_target(&target) => report,
                    }
                }
                Err(e) => {
                    warn!("Skipping {e}");
                    TargetReport::failed(seq, entry, e.to_string())
                }
            };

            if self.reports.send(report).is_err() {
                break;
            }
        }

        debug!("Worker {} done", self.id);
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::udp::Exchange;
    use crate::reflection::tests::Scripted;
    use crate::signatures::SignatureStore;
    use lift_common::config::Config;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn scanner(workers: usize) -> Scanner {
        let config = Config {
            workers,
            ..Config::default()
        };
        let engine = ProbeEngine::new(config, Arc::new(SignatureStore::default()))
            .unwrap()
            .with_transport(Arc::new(Scripted::new(|_| Ok(Exchange::Silence))));
        Scanner::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn reports_follow_input_order() {
        let entries: Vec<String> = (1..=20).map(|n| format!("192.0.2.{n}")).collect();
        let (_tx, shutdown) = Shutdown::channel();

        let run = scanner(4).run(entries.clone(), 53, ScanMode::Recurse, shutdown).await;

        let seen: Vec<&str> = run.reports.iter().map(|r| r.entry.as_str()).collect();
        assert_eq!(seen, entries);
        assert_eq!(run.succeeded(), 20);
        assert!(!run.interrupted);
    }

    #[tokio::test]
    async fn invalid_entries_fail_without_stopping_the_run() {
        let entries = vec!["192.0.2.1".to_string(), "not-an-ip".to_string(), "192.0.2.3".to_string()];
        let (_tx, shutdown) = Shutdown::channel();

        let run = scanner(2).run(entries, 123, ScanMode::Recurse, shutdown).await;

        assert_eq!(run.succeeded(), 2);
        assert_eq!(run.failed(), 1);
        assert_eq!(run.reports[1].status_line(), "not-an-ip : fail");
    }

    #[tokio::test]
    async fn callback_sees_every_report() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let (_tx, shutdown) = Shutdown::channel();

        let entries: Vec<String> = (1..=5).map(|n| format!("192.0.2.{n}")).collect();
        scanner(3)
            .on_report(Box::new(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            }))
            .run(entries, 1900, ScanMode::Recurse, shutdown)
            .await;

        assert_eq!(seen.load(Ordering::Relaxed), 5);
    }

    #[tokio::test]
    async fn interrupt_before_start_probes_nothing() {
        let (tx, shutdown) = Shutdown::channel();
        tx.send(true).unwrap();

        let entries: Vec<String> = (1..=5).map(|n| format!("192.0.2.{n}")).collect();
        let run = scanner(2).run(entries, 53, ScanMode::Recurse, shutdown).await;

        assert!(run.interrupted);
        assert!(run.reports.is_empty());
        assert_eq!(run.not_started, 5);
    }

    #[tokio::test]
    async fn more_entries_than_queue_slots_all_complete() {
        // Two workers leave eight queue slots.
        let entries: Vec<String> = (0..50).map(|n| format!("192.0.2.{n}")).collect();
        let (_tx, shutdown) = Shutdown::channel();

        let run = scanner(2).run(entries, 53, ScanMode::Recurse, shutdown).await;

        assert_eq!(run.succeeded(), 50);
        assert_eq!(run.not_started, 0);
        assert_eq!(run.reports.last().map(|r| r.entry.as_str()), Some("192.0.2.49"));
    }

    #[tokio::test]
    async fn dropped_trigger_never_fires() {
        let (tx, mut shutdown) = Shutdown::channel();
        drop(tx);

        let fired = tokio::time::timeout(Duration::from_millis(100), shutdown.triggered()).await;
        assert!(fired.is_err());
        assert!(!shutdown.is_triggered());
    }
}
