use crate::shared::frame::Frame;

use super::detection_error::DetectionError;
use super::detection_result::DetectionResult;

/// Domain interface for license plate detection.
///
/// Implementations usually wrap a process-wide engine and are not assumed
/// to be reentrant, hence `&mut self`.
pub trait PlateDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, DetectionError>;
}
