use crate::shared::frame::Frame;

/// Sequential source of frames, such as a capture device or a pipe.
///
/// Implementations handle transport details while the pipeline works with
/// the abstract `Frame` type.
pub trait FrameReader: Send {
    /// Returns an iterator over frames in arrival order. The iterator ends
    /// when the source is exhausted.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;
}
