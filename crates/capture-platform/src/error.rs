use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The request was rejected before touching the OS
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An OS capture primitive failed
    #[error("capture failed at {stage}: {reason}")]
    CaptureFailed { stage: &'static str, reason: String },
}

impl CaptureError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn failed(stage: &'static str, reason: impl ToString) -> Self {
        Self::CaptureFailed {
            stage,
            reason: reason.to_string(),
        }
    }

    /// Stable code reported to the host
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::CaptureFailed { .. } => "CAPTURE_FAILED",
        }
    }
}
