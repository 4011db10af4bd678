//! Process-wide logging setup for bizdesk client hosts.

/// Initialize tracing/logging for the process.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::Json);
}

/// Same as [`init`], but with human-readable output for terminals.
pub fn init_pretty() {
    tracing::init(tracing::LogFormat::Pretty);
}

/// Subscriber configuration (filters, output format).
pub mod tracing;
