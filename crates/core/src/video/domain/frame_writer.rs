use crate::shared::frame::Frame;

/// Sink for anonymized frames.
pub trait FrameWriter: Send {
    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes anything still buffered.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
