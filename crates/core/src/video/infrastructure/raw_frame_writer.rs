use std::io::Write;

use crate::shared::frame::Frame;
use crate::video::domain::frame_writer::FrameWriter;

/// Writes frames as headerless raw video, the counterpart of
/// [`RawFrameReader`](super::raw_frame_reader::RawFrameReader).
pub struct RawFrameWriter<W: Write + Send> {
    writer: W,
    frames_written: usize,
}

impl<W: Write + Send> RawFrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> FrameWriter for RawFrameWriter<W> {
    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.writer.write_all(frame.data())?;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.writer.flush()?;
        Ok(())
    }
}
