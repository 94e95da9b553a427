use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::shared::constants::IMAGE_EXTENSIONS;

use super::blur_image_use_case::BlurImageUseCase;
use super::plate_anonymizer::AnonymizeError;

/// Outcome of a folder run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FolderReport {
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Images where plates were still detectable when the loop gave up.
    pub forced_stops: usize,
    pub duration: Duration,
}

impl FolderReport {
    pub fn files_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Anonymizes every image directly inside a folder, one at a time.
///
/// Entries are visited in name order. Non-image files are skipped. A
/// failure on one image is logged and counted, and the run moves on;
/// only fatal engine errors end it early.
pub struct BlurFolderUseCase {
    image: BlurImageUseCase,
}

impl BlurFolderUseCase {
    pub fn new(image: BlurImageUseCase) -> Self {
        Self { image }
    }

    pub fn execute(
        &mut self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<FolderReport, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(output_dir)?;

        let mut entries: Vec<PathBuf> = std::fs::read_dir(input_dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()?;
        entries.sort();

        let images: Vec<&PathBuf> = entries
            .iter()
            .filter(|p| p.is_file() && is_image(p))
            .collect();
        let mut report = FolderReport {
            skipped: entries.len() - images.len(),
            ..FolderReport::default()
        };

        let started = Instant::now();
        let total = images.len();
        for (i, input) in images.into_iter().enumerate() {
            let Some(name) = input.file_name() else {
                report.skipped += 1;
                continue;
            };
            let output = output_dir.join(name);

            match self.image.execute(input, Some(&output)) {
                Ok(outcome) => {
                    report.processed += 1;
                    if !outcome.converged() {
                        report.forced_stops += 1;
                    }
                }
                Err(e) => {
                    if e.downcast_ref::<AnonymizeError>()
                        .is_some_and(AnonymizeError::is_fatal)
                    {
                        return Err(e);
                    }
                    log::error!("{}: {e}", input.display());
                    report.failed += 1;
                }
            }
            self.image.logger_mut().progress(i + 1, total);
        }
        report.duration = started.elapsed();

        self.image.logger_mut().info(&format!(
            "Processed {} images ({} failed, {} skipped) in {:.2}s, {:.2} files/s",
            report.processed,
            report.failed,
            report.skipped,
            report.duration.as_secs_f64(),
            report.files_per_second()
        ));
        self.image.logger().summary();
        Ok(report)
    }
}
