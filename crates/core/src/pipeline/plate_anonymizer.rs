use std::time::Instant;

use thiserror::Error;

use crate::blurring::domain::blur_compositor::{BlurCompositor, BlurError};
use crate::blurring::domain::occlusion_mask::OcclusionMask;
use crate::blurring::infrastructure::outline::draw_outline;
use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::plate_detector::PlateDetector;
use crate::shared::config::BlurConfig;
use crate::shared::constants::{OUTLINE_COLOR, OUTLINE_STROKE_WIDTH};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum AnonymizeError {
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Blur(#[from] BlurError),
}

impl AnonymizeError {
    /// Fatal errors end the whole run, not just the current image.
    pub fn is_fatal(&self) -> bool {
        match self {
            AnonymizeError::Detection(e) => e.is_fatal(),
            AnonymizeError::Blur(_) => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// A detection round found nothing.
    Converged,
    /// The iteration cap was reached with plates still detectable.
    ForcedStop,
}

/// What one run of the convergence loop did to an image.
#[derive(Clone, Debug, PartialEq)]
pub struct AnonymizeReport {
    pub detection_calls: u32,
    pub blur_passes: u32,
    /// Radius of each blur pass, in order.
    pub radii: Vec<f32>,
    /// Plates seen by the last detection round.
    pub remaining_regions: usize,
    /// Plates seen by the first detection round.
    pub initial_regions: usize,
    pub stop: StopReason,
    pub detect_ms: f64,
    pub blur_ms: f64,
}

impl AnonymizeReport {
    fn new() -> Self {
        Self {
            detection_calls: 0,
            blur_passes: 0,
            radii: Vec::new(),
            remaining_regions: 0,
            initial_regions: 0,
            stop: StopReason::Converged,
            detect_ms: 0.0,
            blur_ms: 0.0,
        }
    }

    /// Number of detect-and-blur rounds.
    pub fn iterations(&self) -> u32 {
        self.blur_passes
    }

    pub fn converged(&self) -> bool {
        self.stop == StopReason::Converged
    }

    pub fn final_radius(&self) -> Option<f32> {
        self.radii.last().copied()
    }
}

/// Detect, mask, blur, re-detect: blurs plates with a growing radius until
/// the detector no longer finds any, or the iteration budget runs out.
///
/// Iteration `k` (0-indexed) blurs at `blur_radius + k * blur_radius_increment`.
/// Iterations run from 0 to `max_iter` inclusive, so a run makes at most
/// `max_iter + 1` detection calls and as many blur passes. Each round's mask
/// comes from that round's detections only.
pub struct PlateAnonymizer {
    detector: Box<dyn PlateDetector>,
    compositor: Box<dyn BlurCompositor>,
    config: BlurConfig,
}

impl PlateAnonymizer {
    pub fn new(
        detector: Box<dyn PlateDetector>,
        compositor: Box<dyn BlurCompositor>,
        config: BlurConfig,
    ) -> Self {
        Self {
            detector,
            compositor,
            config,
        }
    }

    pub fn config(&self) -> &BlurConfig {
        &self.config
    }

    /// Anonymizes `frame` in place.
    ///
    /// Dimensions and pixel format never change. On error the frame holds
    /// whatever blur passes completed before the failure.
    pub fn anonymize(&mut self, frame: &mut Frame) -> Result<AnonymizeReport, AnonymizeError> {
        let mut report = AnonymizeReport::new();

        for iteration in 0..=self.config.max_iter {
            let started = Instant::now();
            let detection = self.detector.detect(frame)?;
            report.detect_ms += started.elapsed().as_secs_f64() * 1000.0;
            report.detection_calls += 1;
            report.remaining_regions = detection.len();
            if iteration == 0 {
                report.initial_regions = detection.len();
            }

            if !detection.any_found() {
                log::debug!(
                    "Frame {}: no plates after {} blur passes",
                    frame.index(),
                    report.blur_passes
                );
                return Ok(report);
            }

            let radius = self.config.radius_at(iteration);
            log::debug!(
                "Frame {}: {} plates at iteration {iteration}, blurring with radius {radius}",
                frame.index(),
                detection.len()
            );

            let started = Instant::now();
            let mask = OcclusionMask::from_regions(frame.width(), frame.height(), &detection.regions);
            *frame = self.compositor.apply_blur(frame, &mask, radius)?;
            if self.config.add_outline {
                draw_outline(frame, &detection.regions, OUTLINE_COLOR, OUTLINE_STROKE_WIDTH);
            }
            report.blur_ms += started.elapsed().as_secs_f64() * 1000.0;
            report.blur_passes += 1;
            report.radii.push(radius);
        }

        report.stop = StopReason::ForcedStop;
        log::warn!(
            "Frame {}: {} plates still detectable after {} blur passes (final radius {})",
            frame.index(),
            report.remaining_regions,
            report.blur_passes,
            report.final_radius().unwrap_or(self.config.blur_radius)
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blurring::domain::occlusion_mask::MASK_CLEAR;
    use crate::blurring::infrastructure::cpu_gaussian_compositor::CpuGaussianCompositor;
    use crate::detection::domain::detection_result::DetectionResult;
    use crate::shared::frame::PixelFormat;
    use crate::shared::plate_region::PlateRegion;
    use approx::assert_relative_eq;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Replays scripted detections, then reports nothing.
    struct ScriptedDetector {
        script: VecDeque<Vec<PlateRegion>>,
        calls: Arc<Mutex<Vec<Frame>>>,
    }

    impl ScriptedDetector {
        fn new(script: Vec<Vec<PlateRegion>>) -> Self {
            Self {
                script: script.into(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl PlateDetector for ScriptedDetector {
        fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, DetectionError> {
            self.calls.lock().unwrap().push(frame.clone());
            Ok(DetectionResult::new(self.script.pop_front().unwrap_or_default()))
        }
    }

    /// Finds the same plate forever.
    struct StubbornDetector {
        region: PlateRegion,
        calls: Arc<Mutex<usize>>,
    }

    impl PlateDetector for StubbornDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<DetectionResult, DetectionError> {
            *self.calls.lock().unwrap() += 1;
            Ok(DetectionResult::new(vec![self.region.clone()]))
        }
    }

    struct FailingDetector(fn() -> DetectionError);

    impl PlateDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<DetectionResult, DetectionError> {
            Err((self.0)())
        }
    }

    /// Records radii and masks, delegating the pixels to the real compositor.
    struct RecordingCompositor {
        radii: Arc<Mutex<Vec<f32>>>,
        masks: Arc<Mutex<Vec<OcclusionMask>>>,
    }

    impl RecordingCompositor {
        fn new() -> Self {
            Self {
                radii: Arc::new(Mutex::new(Vec::new())),
                masks: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl BlurCompositor for RecordingCompositor {
        fn apply_blur(
            &self,
            frame: &Frame,
            mask: &OcclusionMask,
            radius: f32,
        ) -> Result<Frame, BlurError> {
            self.radii.lock().unwrap().push(radius);
            self.masks.lock().unwrap().push(mask.clone());
            CpuGaussianCompositor::new().apply_blur(frame, mask, radius)
        }
    }

    // --- Helpers ---

    fn config(blur_radius: f32, increment: f32, max_iter: u32) -> BlurConfig {
        BlurConfig {
            blur_radius,
            blur_radius_increment: increment,
            max_iter,
            add_outline: false,
        }
    }

    fn textured_gray(width: u32, height: u32) -> Frame {
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| if (x / 2 + y / 2) % 2 == 0 { 220 } else { 30 }))
            .collect();
        Frame::new(data, width, height, PixelFormat::Gray8, 0)
    }

    fn plate() -> PlateRegion {
        PlateRegion::from_flat(&[30.0, 40.0, 70.0, 38.0, 72.0, 55.0, 28.0, 57.0]).unwrap()
    }

    // --- Tests ---

    #[test]
    fn test_no_plates_means_one_call_and_untouched_frame() {
        let detector = ScriptedDetector::new(vec![]);
        let calls = detector.calls.clone();
        let compositor = RecordingCompositor::new();
        let radii = compositor.radii.clone();
        let mut anonymizer =
            PlateAnonymizer::new(Box::new(detector), Box::new(compositor), config(2.0, 3.0, 5));

        let original = textured_gray(50, 50);
        let mut frame = original.clone();
        let report = anonymizer.anonymize(&mut frame).unwrap();

        assert_eq!(calls.lock().unwrap().len(), 1);
        assert!(radii.lock().unwrap().is_empty());
        assert_eq!(frame, original);
        assert_eq!(report.detection_calls, 1);
        assert_eq!(report.blur_passes, 0);
        assert_eq!(report.stop, StopReason::Converged);
        assert_eq!(report.final_radius(), None);
    }

    #[test]
    fn test_single_detection_then_clean() {
        let detector = ScriptedDetector::new(vec![vec![plate()]]);
        let calls = detector.calls.clone();
        let compositor = RecordingCompositor::new();
        let radii = compositor.radii.clone();
        let masks = compositor.masks.clone();
        let mut anonymizer =
            PlateAnonymizer::new(Box::new(detector), Box::new(compositor), config(2.0, 3.0, 5));

        let original = textured_gray(100, 100);
        let mut frame = original.clone();
        let report = anonymizer.anonymize(&mut frame).unwrap();

        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(*radii.lock().unwrap(), vec![2.0]);
        assert_eq!(report.detection_calls, 2);
        assert_eq!(report.blur_passes, 1);
        assert_eq!(report.initial_regions, 1);
        assert_eq!(report.remaining_regions, 0);
        assert!(report.converged());

        let masks = masks.lock().unwrap();
        let mask = &masks[0];
        let mut changed_inside = 0;
        for y in 0..100u32 {
            for x in 0..100u32 {
                let i = (y * 100 + x) as usize;
                if mask.get(x, y) == MASK_CLEAR {
                    assert_eq!(frame.data()[i], original.data()[i], "pixel ({x}, {y})");
                } else if frame.data()[i] != original.data()[i] {
                    changed_inside += 1;
                }
            }
        }
        assert!(changed_inside > 0);
    }

    #[test]
    fn test_second_detection_sees_blurred_frame() {
        let detector = ScriptedDetector::new(vec![vec![plate()]]);
        let calls = detector.calls.clone();
        let mut anonymizer = PlateAnonymizer::new(
            Box::new(detector),
            Box::new(CpuGaussianCompositor::new()),
            config(2.0, 3.0, 5),
        );

        let original = textured_gray(100, 100);
        let mut frame = original.clone();
        anonymizer.anonymize(&mut frame).unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], original);
        assert_eq!(calls[1], frame);
    }

    #[test]
    fn test_persistent_plate_forces_stop_after_cap() {
        let calls = Arc::new(Mutex::new(0));
        let detector = StubbornDetector {
            region: plate(),
            calls: calls.clone(),
        };
        let compositor = RecordingCompositor::new();
        let radii = compositor.radii.clone();
        let mut anonymizer =
            PlateAnonymizer::new(Box::new(detector), Box::new(compositor), config(2.0, 3.0, 3));

        let mut frame = textured_gray(100, 100);
        let report = anonymizer.anonymize(&mut frame).unwrap();

        assert_eq!(*calls.lock().unwrap(), 4);
        assert_eq!(radii.lock().unwrap().len(), 4);
        assert_eq!(report.detection_calls, 4);
        assert_eq!(report.blur_passes, 4);
        assert_eq!(report.stop, StopReason::ForcedStop);
        assert_eq!(report.remaining_regions, 1);
    }

    #[test]
    fn test_radius_grows_linearly() {
        let detector = StubbornDetector {
            region: plate(),
            calls: Arc::new(Mutex::new(0)),
        };
        let mut anonymizer = PlateAnonymizer::new(
            Box::new(detector),
            Box::new(CpuGaussianCompositor::new()),
            config(1.5, 2.0, 4),
        );

        let report = anonymizer.anonymize(&mut textured_gray(100, 100)).unwrap();

        let expected = [1.5, 3.5, 5.5, 7.5, 9.5];
        assert_eq!(report.radii.len(), expected.len());
        for (got, want) in report.radii.iter().zip(expected) {
            assert_relative_eq!(*got, want);
        }
        assert!(report.radii.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_zero_increment_keeps_radius_constant() {
        let detector = StubbornDetector {
            region: plate(),
            calls: Arc::new(Mutex::new(0)),
        };
        let mut anonymizer = PlateAnonymizer::new(
            Box::new(detector),
            Box::new(CpuGaussianCompositor::new()),
            config(3.0, 0.0, 2),
        );

        let report = anonymizer.anonymize(&mut textured_gray(100, 100)).unwrap();
        assert_eq!(report.radii, vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_max_iter_zero_allows_one_pass() {
        let calls = Arc::new(Mutex::new(0));
        let detector = StubbornDetector {
            region: plate(),
            calls: calls.clone(),
        };
        let mut anonymizer = PlateAnonymizer::new(
            Box::new(detector),
            Box::new(CpuGaussianCompositor::new()),
            config(2.0, 3.0, 0),
        );

        let report = anonymizer.anonymize(&mut textured_gray(100, 100)).unwrap();
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(report.blur_passes, 1);
        assert_eq!(report.stop, StopReason::ForcedStop);
    }

    #[test]
    fn test_masks_are_not_cumulative() {
        let first = PlateRegion::from_flat(&[5.0, 5.0, 20.0, 5.0, 20.0, 15.0, 5.0, 15.0]).unwrap();
        let second =
            PlateRegion::from_flat(&[60.0, 60.0, 90.0, 60.0, 90.0, 80.0, 60.0, 80.0]).unwrap();
        let detector = ScriptedDetector::new(vec![vec![first], vec![second]]);
        let compositor = RecordingCompositor::new();
        let masks = compositor.masks.clone();
        let mut anonymizer =
            PlateAnonymizer::new(Box::new(detector), Box::new(compositor), config(2.0, 3.0, 5));

        anonymizer.anonymize(&mut textured_gray(100, 100)).unwrap();

        let masks = masks.lock().unwrap();
        assert_eq!(masks.len(), 2);
        assert_eq!(masks[1].get(10, 10), MASK_CLEAR);
        assert_eq!(masks[1].coverage(), 30 * 20);
    }

    #[test]
    fn test_converged_frame_is_left_alone_on_rerun() {
        let mut frame = textured_gray(100, 100);
        let mut first = PlateAnonymizer::new(
            Box::new(ScriptedDetector::new(vec![vec![plate()]])),
            Box::new(CpuGaussianCompositor::new()),
            config(2.0, 3.0, 5),
        );
        first.anonymize(&mut frame).unwrap();
        let converged = frame.clone();

        let mut second = PlateAnonymizer::new(
            Box::new(ScriptedDetector::new(vec![])),
            Box::new(CpuGaussianCompositor::new()),
            config(2.0, 3.0, 5),
        );
        let report = second.anonymize(&mut frame).unwrap();

        assert_eq!(report.detection_calls, 1);
        assert_eq!(frame, converged);
    }

    #[test]
    fn test_dimensions_and_format_are_preserved() {
        let mut frame = Frame::new(vec![120; 64 * 48 * 4], 64, 48, PixelFormat::Rgba32, 9);
        let mut anonymizer = PlateAnonymizer::new(
            Box::new(StubbornDetector {
                region: plate(),
                calls: Arc::new(Mutex::new(0)),
            }),
            Box::new(CpuGaussianCompositor::new()),
            config(2.0, 3.0, 2),
        );
        anonymizer.anonymize(&mut frame).unwrap();
        assert_eq!((frame.width(), frame.height()), (64, 48));
        assert_eq!(frame.format(), PixelFormat::Rgba32);
        assert_eq!(frame.index(), 9);
    }

    #[test]
    fn test_outline_is_drawn_when_enabled() {
        let mut frame = Frame::new(vec![0; 100 * 100 * 3], 100, 100, PixelFormat::Rgb24, 0);
        let mut anonymizer = PlateAnonymizer::new(
            Box::new(ScriptedDetector::new(vec![vec![plate()]])),
            Box::new(CpuGaussianCompositor::new()),
            BlurConfig {
                add_outline: true,
                ..config(2.0, 3.0, 5)
            },
        );
        anonymizer.anonymize(&mut frame).unwrap();
        assert!(frame.data().chunks_exact(3).any(|p| p == OUTLINE_COLOR));
    }

    #[test]
    fn test_processing_error_is_not_fatal() {
        let mut anonymizer = PlateAnonymizer::new(
            Box::new(FailingDetector(|| DetectionError::Processing("bad frame".into()))),
            Box::new(CpuGaussianCompositor::new()),
            config(2.0, 3.0, 5),
        );
        let err = anonymizer.anonymize(&mut textured_gray(10, 10)).unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_initialization_error_is_fatal() {
        let mut anonymizer = PlateAnonymizer::new(
            Box::new(FailingDetector(|| DetectionError::Initialization("gone".into()))),
            Box::new(CpuGaussianCompositor::new()),
            config(2.0, 3.0, 5),
        );
        let err = anonymizer.anonymize(&mut textured_gray(10, 10)).unwrap_err();
        assert!(err.is_fatal());
    }
}
