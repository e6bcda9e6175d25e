//! Process-wide logging setup shared by TradeTrack binaries.

/// Initialize tracing for the process.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filter and output format).
pub mod tracing;
