/// Errors raised while building the in-process channel primitives.
///
/// Steady-state operations (`publish`, `try_get_latest`, `debug_snapshot`) are
/// total; the only failure is rejecting a configuration at construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IccError {
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: &'static str },
}
