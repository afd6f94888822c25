use std::time::Duration;

/// Failures reported by [`PhaseBarrier`](crate::PhaseBarrier).
///
/// Apart from `InvalidConfiguration`, every variant is a contract violation by
/// the calling participant (wrong identity, wrong phase, or a peer that never
/// reported completion). They are not transient: retrying cannot help, the
/// participant's call sequence or the phase layout has to be fixed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError<I> {
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: &'static str },

    #[error("{id:?} timed out after {waited:?} waiting for its turn (phase={phase})")]
    Timeout { id: I, phase: usize, waited: Duration },

    #[error("{id:?} called done() out of phase (phase={phase})")]
    OutOfPhase { id: I, phase: usize },

    #[error("{id:?} called done() twice in the same phase (phase={phase})")]
    DuplicateCompletion { id: I, phase: usize },
}

impl<I> PhaseError<I> {
    /// True for the runtime protocol violations, false for construction errors.
    pub fn is_contract_violation(&self) -> bool {
        !matches!(self, Self::InvalidConfiguration { .. })
    }

    /// Phase index at the time of failure, if the error happened at runtime.
    pub fn phase(&self) -> Option<usize> {
        match self {
            Self::InvalidConfiguration { .. } => None,
            Self::Timeout { phase, .. }
            | Self::OutOfPhase { phase, .. }
            | Self::DuplicateCompletion { phase, .. } => Some(*phase),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Identity with no `Debug`: the error type itself must not require one.
    #[derive(Clone, Copy, PartialEq, Eq)]
    struct Token;

    #[test]
    fn helpers_do_not_need_debug_identities() {
        let err = PhaseError::OutOfPhase { id: Token, phase: 2 };
        assert!(err.is_contract_violation());
        assert_eq!(err.phase(), Some(2));

        let err: PhaseError<Token> = PhaseError::InvalidConfiguration { reason: "empty" };
        assert!(!err.is_contract_violation());
        assert_eq!(err.phase(), None);
        assert!(err == PhaseError::InvalidConfiguration { reason: "empty" });
    }
}
