use ndarray::s;
use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("no orientation tag present")]
    Missing,
    #[error("unreadable image metadata: {0}")]
    Unreadable(String),
    #[error("orientation value {0} is outside 1..=8")]
    InvalidOrientation(u32),
}

/// The eight EXIF orientations, named by the transform that brings the
/// stored pixels upright.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Normal,
    MirrorHorizontal,
    Rotate180,
    MirrorVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    pub fn from_exif(value: u32) -> Result<Self, MetadataError> {
        match value {
            1 => Ok(Orientation::Normal),
            2 => Ok(Orientation::MirrorHorizontal),
            3 => Ok(Orientation::Rotate180),
            4 => Ok(Orientation::MirrorVertical),
            5 => Ok(Orientation::Transpose),
            6 => Ok(Orientation::Rotate90),
            7 => Ok(Orientation::Transverse),
            8 => Ok(Orientation::Rotate270),
            other => Err(MetadataError::InvalidOrientation(other)),
        }
    }

    /// True for the orientations that swap width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90
                | Orientation::Transverse
                | Orientation::Rotate270
        )
    }

    /// Returns an upright copy of `frame`. Rotations are clockwise.
    pub fn normalize(self, frame: &Frame) -> Frame {
        let view = frame.as_ndarray();
        let upright = match self {
            Orientation::Normal => return frame.clone(),
            Orientation::MirrorHorizontal => view.slice_move(s![.., ..;-1, ..]),
            Orientation::Rotate180 => view.slice_move(s![..;-1, ..;-1, ..]),
            Orientation::MirrorVertical => view.slice_move(s![..;-1, .., ..]),
            Orientation::Transpose => view.permuted_axes([1, 0, 2]),
            Orientation::Rotate90 => view.permuted_axes([1, 0, 2]).slice_move(s![.., ..;-1, ..]),
            Orientation::Transverse => view
                .permuted_axes([1, 0, 2])
                .slice_move(s![..;-1, ..;-1, ..]),
            Orientation::Rotate270 => view.permuted_axes([1, 0, 2]).slice_move(s![..;-1, .., ..]),
        };
        let (height, width, _) = upright.dim();
        Frame::new(
            upright.iter().copied().collect(),
            width as u32,
            height as u32,
            frame.format(),
            frame.index(),
        )
    }
}
