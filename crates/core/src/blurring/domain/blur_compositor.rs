use thiserror::Error;

use crate::shared::frame::Frame;

use super::occlusion_mask::OcclusionMask;

#[derive(Error, Debug, PartialEq)]
pub enum BlurError {
    #[error("mask is {mask_width}x{mask_height} but frame is {frame_width}x{frame_height}")]
    SizeMismatch {
        mask_width: u32,
        mask_height: u32,
        frame_width: u32,
        frame_height: u32,
    },
}

/// Domain interface for blurring the masked part of a frame.
///
/// Implementations are pure: the input frame is left untouched and a new
/// frame is returned. Radius validity is checked once when configuration
/// is loaded, not on every call.
pub trait BlurCompositor: Send + Sync {
    fn apply_blur(
        &self,
        frame: &Frame,
        mask: &OcclusionMask,
        radius: f32,
    ) -> Result<Frame, BlurError>;
}

pub fn check_mask_size(frame: &Frame, mask: &OcclusionMask) -> Result<(), BlurError> {
    if frame.width() != mask.width() || frame.height() != mask.height() {
        return Err(BlurError::SizeMismatch {
            mask_width: mask.width(),
            mask_height: mask.height(),
            frame_width: frame.width(),
            frame_height: frame.height(),
        });
    }
    Ok(())
}
