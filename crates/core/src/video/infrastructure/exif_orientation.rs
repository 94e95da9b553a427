use std::io::Cursor;

use crate::video::domain::orientation::{MetadataError, Orientation};

/// Reads the primary-image orientation tag from an encoded image.
pub fn read_orientation(bytes: &[u8]) -> Result<Orientation, MetadataError> {
    let mut cursor = Cursor::new(bytes);
    let exif = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Err(MetadataError::Missing),
        Err(e) => return Err(MetadataError::Unreadable(e.to_string())),
    };
    let field = exif
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .ok_or(MetadataError::Missing)?;
    let value = field
        .value
        .get_uint(0)
        .ok_or_else(|| MetadataError::Unreadable(format!("orientation value {:?}", field.value)))?;
    Orientation::from_exif(value)
}

/// Like [`read_orientation`], but never fails: images without usable
/// metadata are treated as upright.
pub fn orientation_or_normal(bytes: &[u8]) -> Orientation {
    match read_orientation(bytes) {
        Ok(orientation) => orientation,
        Err(MetadataError::Missing) => Orientation::Normal,
        Err(e) => {
            log::warn!("Ignoring image orientation: {e}");
            Orientation::Normal
        }
    }
}
