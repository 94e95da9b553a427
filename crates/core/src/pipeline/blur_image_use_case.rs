use std::path::Path;
use std::time::Instant;

use crate::video::domain::image_reader::ImageReader;
use crate::video::domain::image_writer::ImageWriter;

use super::pipeline_logger::PipelineLogger;
use super::plate_anonymizer::{AnonymizeReport, PlateAnonymizer};

/// Single-image pipeline: read → anonymize → write.
///
/// The reader hands over upright pixels, so the written image is always
/// stored in display orientation.
pub struct BlurImageUseCase {
    reader: Box<dyn ImageReader>,
    writer: Box<dyn ImageWriter>,
    anonymizer: PlateAnonymizer,
    logger: Box<dyn PipelineLogger>,
}

impl BlurImageUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        writer: Box<dyn ImageWriter>,
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

    pub fn logger(&self) -> &dyn PipelineLogger {
        self.logger.as_ref()
    }

    pub fn logger_mut(&mut self) -> &mut dyn PipelineLogger {
        self.logger.as_mut()
    }

    /// Anonymizes `input_path`, writing the result to `output_path` when
    /// one is given.
    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: Option<&Path>,
    ) -> Result<AnonymizeReport, Box<dyn std::error::Error>> {
        let started = Instant::now();
        let mut frame = self.reader.read(input_path)?;
        self.logger.timing("read", elapsed_ms(started));

        let report = self.anonymizer.anonymize(&mut frame)?;
        self.logger.timing("detect", report.detect_ms);
        self.logger.timing("blur", report.blur_ms);
        self.logger.metric("iterations", report.iterations() as f64);
        self.logger.metric("plates", report.initial_regions as f64);

        if let Some(output_path) = output_path {
            let started = Instant::now();
            self.writer.write(output_path, &frame)?;
            self.logger.timing("write", elapsed_ms(started));
        }

        Ok(report)
    }
}

pub(crate) fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
