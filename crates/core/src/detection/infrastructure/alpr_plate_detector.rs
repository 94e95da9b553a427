use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::plate_detector::PlateDetector;
use crate::shared::frame::Frame;

use super::alpr_engine::{log_operation, AlprEngine, ProcessRequest};
use super::alpr_payload::parse_plate_regions;

/// Owned handle on a live recognition engine.
///
/// Construction initializes the engine and runs a warm-up pass; the engine
/// is deinitialized exactly once, either by [`AlprPlateDetector::shutdown`]
/// or when the handle is dropped (including during unwinding).
pub struct AlprPlateDetector<E: AlprEngine> {
    engine: E,
    live: bool,
}

impl<E: AlprEngine> AlprPlateDetector<E> {
    /// Initializes `engine` with the pass-through engine settings.
    pub fn new(mut engine: E, settings_json: &str) -> Result<Self, DetectionError> {
        let result = engine.init(settings_json);
        log_operation("Init", &result);
        if !result.is_ok() {
            return Err(DetectionError::Initialization(result.phrase));
        }

        let mut detector = Self { engine, live: true };
        detector.warm_up();
        Ok(detector)
    }

    /// Primes the engine to cut first-call latency. Failure is only logged.
    fn warm_up(&mut self) {
        let result = self.engine.warm_up();
        log_operation("Warmup", &result);
    }

    /// Releases the engine now and reports whether deinit succeeded.
    pub fn shutdown(mut self) -> Result<(), DetectionError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), DetectionError> {
        if !self.live {
            return Ok(());
        }
        self.live = false;
        let result = self.engine.deinit();
        log_operation("Deinit", &result);
        if result.is_ok() {
            Ok(())
        } else {
            Err(DetectionError::Shutdown(result.phrase))
        }
    }
}

impl<E: AlprEngine> Drop for AlprPlateDetector<E> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

impl<E: AlprEngine> PlateDetector for AlprPlateDetector<E> {
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, DetectionError> {
        let request = ProcessRequest {
            image_type: frame.format().into(),
            data: frame.data(),
            width: frame.width(),
            height: frame.height(),
            stride: 0,
            exif_orientation: 1,
        };

        let result = self.engine.process(&request);
        if !result.is_ok() {
            return Err(DetectionError::Processing(result.phrase));
        }
        if result.num_plates == 0 {
            return Ok(DetectionResult::none());
        }

        let regions = parse_plate_regions(&result.json)?;
        if regions.is_empty() {
            // A reported plate we cannot locate must not read as a clean frame.
            return Err(DetectionError::Payload(format!(
                "engine reported {} plates but no usable warpedBox",
                result.num_plates
            )));
        }
        if regions.len() != result.num_plates {
            log::warn!(
                "Engine reported {} plates, payload holds {} usable boxes",
                result.num_plates,
                regions.len()
            );
        }
        Ok(DetectionResult::new(regions))
    }
}
