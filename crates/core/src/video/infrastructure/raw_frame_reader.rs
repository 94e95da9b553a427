use std::io::{ErrorKind, Read};

use crate::shared::frame::{Frame, PixelFormat};
use crate::video::domain::frame_reader::FrameReader;

/// Reads headerless raw video: back-to-back frames of fixed size and
/// pixel layout, as produced by `ffmpeg -f rawvideo` or a capture pipe.
pub struct RawFrameReader<R: Read + Send> {
    reader: R,
    width: u32,
    height: u32,
    format: PixelFormat,
    next_index: usize,
}

impl<R: Read + Send> RawFrameReader<R> {
    pub fn new(reader: R, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            reader,
            width,
            height,
            format,
            next_index: 0,
        }
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.channels()
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut data = vec![0u8; self.frame_len()];
        let filled = fill(&mut self.reader, &mut data)?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < data.len() {
            return Err(format!(
                "truncated frame {}: got {filled} of {} bytes for {}x{} {}",
                self.next_index,
                data.len(),
                self.width,
                self.height,
                self.format
            )
            .into());
        }
        let frame = Frame::new(data, self.width, self.height, self.format, self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

/// Reads until `buf` is full or the stream ends; returns the byte count.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl<R: Read + Send> FrameReader for RawFrameReader<R> {
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.frame_len() == 0 {
            return Box::new(std::iter::once(Err("frame size must be non-zero".into())));
        }
        let mut done = false;
        Box::new(std::iter::from_fn(move || {
            if done {
                return None;
            }
            match self.read_frame() {
                Ok(Some(frame)) => Some(Ok(frame)),
                Ok(None) => {
                    done = true;
                    None
                }
                Err(e) => {
                    done = true;
                    Some(Err(e))
                }
            }
        }))
    }
}
