pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const CONFIG_DIR_NAME: &str = "plateblur";
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_BLUR_RADIUS: f32 = 5.0;
pub const DEFAULT_BLUR_RADIUS_INCREMENT: f32 = 5.0;
pub const DEFAULT_MAX_ITER: u32 = 10;

/// Outline colour for `add_outline` (yellow).
pub const OUTLINE_COLOR: [u8; 3] = [255, 255, 0];
pub const OUTLINE_STROKE_WIDTH: u32 = 4;
