use thiserror::Error;

/// Errors raised while building, training or snapshotting a network.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Unknown network kind '{0}', expected 'flat' or 'conv'")]
    UnknownKind(String),

    #[error("Invalid network config: {0}")]
    InvalidConfig(String),

    #[error("Training batch is empty")]
    EmptyBatch,

    #[error("Loss is not finite ({0})")]
    NonFiniteLoss(f32),

    #[error("Parameter store lock poisoned")]
    Poisoned,
}
