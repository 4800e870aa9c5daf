/// Logs a positive outcome.
///
/// Emitted at `INFO` under the `lift::success` target so the terminal formatter
/// can render it differently from ordinary progress messages.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        tracing::info!(target: "lift::success", $($arg)*)
    };
}
