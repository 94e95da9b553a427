use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    /// The engine could not be loaded or configured. Fatal for the run.
    #[error("engine initialization failed: {0}")]
    Initialization(String),
    /// A single detection call failed. Scoped to the image being processed.
    #[error("processing failed: {0}")]
    Processing(String),
    /// The engine answered with a payload that could not be interpreted.
    #[error("malformed detection payload: {0}")]
    Payload(String),
    /// The engine refused to deinitialize.
    #[error("engine shutdown failed: {0}")]
    Shutdown(String),
}

impl DetectionError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DetectionError::Initialization(_))
    }
}
