use serde::{Deserialize, Serialize};

use crate::shared::frame::PixelFormat;

/// Pixel layout tag understood by the recognition engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlprImageType {
    Rgb24,
    Rgba32,
    /// Single luma plane.
    Y,
}

impl From<PixelFormat> for AlprImageType {
    fn from(format: PixelFormat) -> Self {
        match format {
            PixelFormat::Rgb24 => AlprImageType::Rgb24,
            PixelFormat::Rgba32 => AlprImageType::Rgba32,
            PixelFormat::Gray8 => AlprImageType::Y,
        }
    }
}

/// One call into the engine's `process` entry point.
#[derive(Clone, Copy, Debug)]
pub struct ProcessRequest<'a> {
    pub image_type: AlprImageType,
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Row stride hint in pixels. 0 means contiguous rows.
    pub stride: u32,
    /// EXIF orientation of `data`. Frames are normalized upstream, so 1.
    pub exif_orientation: u8,
}

/// Status object returned by every engine call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineResult {
    pub ok: bool,
    #[serde(default)]
    pub phrase: String,
    #[serde(default)]
    pub num_plates: usize,
    #[serde(default)]
    pub json: String,
}

impl EngineResult {
    pub fn success(num_plates: usize, json: impl Into<String>) -> Self {
        Self {
            ok: true,
            phrase: "OK".to_string(),
            num_plates,
            json: json.into(),
        }
    }

    pub fn failure(phrase: impl Into<String>) -> Self {
        Self {
            ok: false,
            phrase: phrase.into(),
            num_plates: 0,
            json: String::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }
}

/// Raw lifecycle surface of an external plate recognition engine.
///
/// Mirrors the vendor SDK shape: every call reports through an
/// [`EngineResult`] instead of failing. Lifecycle ordering (init once,
/// deinit once) is enforced by [`super::alpr_plate_detector::AlprPlateDetector`],
/// not by implementations.
pub trait AlprEngine: Send {
    fn init(&mut self, settings_json: &str) -> EngineResult;

    fn warm_up(&mut self) -> EngineResult;

    fn process(&mut self, request: &ProcessRequest<'_>) -> EngineResult;

    fn deinit(&mut self) -> EngineResult;
}

/// Logs an engine call the way the SDK samples do: `"<op>: OK -> <json>"`.
pub fn log_operation(operation: &str, result: &EngineResult) {
    if result.is_ok() {
        log::info!("{operation}: OK -> {}", result.json);
    } else {
        log::warn!("{operation}: failed -> {}", result.phrase);
    }
}
