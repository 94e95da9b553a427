use std::time::Instant;

use crate::video::domain::frame_reader::FrameReader;
use crate::video::domain::frame_writer::FrameWriter;

use super::blur_image_use_case::elapsed_ms;
use super::pipeline_logger::PipelineLogger;
use super::plate_anonymizer::{AnonymizeError, PlateAnonymizer};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamReport {
    pub frames: usize,
    /// Frames dropped because detection failed on them.
    pub dropped: usize,
    pub forced_stops: usize,
}

/// Live pipeline: pulls frames until the source ends, anonymizes each one
/// and pushes it to the sink.
///
/// A frame whose detection fails is dropped rather than passed through
/// unblurred.
pub struct BlurStreamUseCase {
    reader: Box<dyn FrameReader>,
    writer: Box<dyn FrameWriter>,
    anonymizer: PlateAnonymizer,
    logger: Box<dyn PipelineLogger>,
}

impl BlurStreamUseCase {
    pub fn new(
        reader: Box<dyn FrameReader>,
        writer: Box<dyn FrameWriter>,
        anonymizer: PlateAnonymizer,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            writer,
            anonymizer,
            logger,
        }
    }

    pub fn execute(&mut self) -> Result<StreamReport, Box<dyn std::error::Error>> {
        let mut report = StreamReport::default();

        for item in self.reader.frames() {
            let mut frame = item?;
            match self.anonymizer.anonymize(&mut frame) {
                Ok(outcome) => {
                    self.logger.timing("detect", outcome.detect_ms);
                    self.logger.timing("blur", outcome.blur_ms);
                    self.logger.metric("iterations", outcome.iterations() as f64);
                    if !outcome.converged() {
                        report.forced_stops += 1;
                    }
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(AnonymizeError::Detection(e)) => {
                    log::error!("Frame {}: {e}, dropping it", frame.index());
                    report.dropped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            let started = Instant::now();
            self.writer.write(&frame)?;
            self.logger.timing("write", elapsed_ms(started));
            report.frames += 1;
            self.logger.progress(report.frames, 0);
        }

        self.writer.close()?;
        self.logger.info(&format!(
            "Stream ended: {} frames written, {} dropped, {} forced stops",
            report.frames, report.dropped, report.forced_stops
        ));
        self.logger.summary();
        Ok(report)
    }
}
