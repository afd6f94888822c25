use cadence_config::{ConfigError, Role};
use tandem_icc::IccError;
use tandem_phase::PhaseError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid engine configuration")]
    Config(#[from] ConfigError),

    #[error("failed to build hub")]
    Hub(#[from] IccError),

    #[error("phase protocol violated")]
    Phase(#[from] PhaseError<Role>),

    #[error("worker {role} panicked")]
    WorkerPanicked { role: Role },
}
