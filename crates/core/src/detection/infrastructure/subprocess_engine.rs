//! Engine bridge to a sidecar process hosting the vendor recognition SDK.
//!
//! The protocol is line-delimited JSON over the child's stdin/stdout. Each
//! request is one JSON object with an `op` field; `process` requests are
//! followed immediately by `length` raw pixel bytes. Every request is
//! answered by exactly one [`EngineResult`] line.
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::Serialize;
use thiserror::Error;

use super::alpr_engine::{AlprEngine, AlprImageType, EngineResult, ProcessRequest};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to spawn engine process {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine process I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid engine settings: {0}")]
    Settings(#[source] serde_json::Error),
    #[error("failed to encode engine request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("unreadable engine response: {0}")]
    Response(#[source] serde_json::Error),
    #[error("engine process closed its output")]
    Closed,
}

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    Init {
        settings: serde_json::Value,
    },
    WarmUp,
    Process {
        format: AlprImageType,
        width: u32,
        height: u32,
        stride: u32,
        exif_orientation: u8,
        length: usize,
    },
    Deinit,
}

/// [`AlprEngine`] that forwards every call to a sidecar process.
pub struct SubprocessEngine<W: Write + Send, R: BufRead + Send> {
    writer: Option<W>,
    reader: R,
    child: Option<Child>,
}

impl SubprocessEngine<ChildStdin, BufReader<ChildStdout>> {
    /// Starts `program` with piped stdin/stdout. Stderr is inherited so the
    /// sidecar's own diagnostics reach the terminal.
    pub fn spawn(program: &Path, args: &[String]) -> Result<Self, EngineError> {
        let spawn_error = |source| EngineError::Spawn {
            program: program.display().to_string(),
            source,
        };
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_error)?;

        let stdin = child.stdin.take().ok_or(EngineError::Closed)?;
        let stdout = child.stdout.take().ok_or(EngineError::Closed)?;
        log::info!("Started engine process {} (pid {})", program.display(), child.id());

        Ok(Self {
            writer: Some(stdin),
            reader: BufReader::new(stdout),
            child: Some(child),
        })
    }
}

impl<W: Write + Send, R: BufRead + Send> SubprocessEngine<W, R> {
    /// Wires the engine to arbitrary streams instead of a child process.
    pub fn from_streams(writer: W, reader: R) -> Self {
        Self {
            writer: Some(writer),
            reader,
            child: None,
        }
    }

    fn request(&mut self, request: &Request, payload: &[u8]) -> Result<EngineResult, EngineError> {
        let writer = self.writer.as_mut().ok_or(EngineError::Closed)?;
        let mut line = serde_json::to_vec(request).map_err(EngineError::Encode)?;
        line.push(b'\n');
        writer.write_all(&line)?;
        writer.write_all(payload)?;
        writer.flush()?;

        let mut response = String::new();
        if self.reader.read_line(&mut response)? == 0 {
            return Err(EngineError::Closed);
        }
        serde_json::from_str(response.trim_end()).map_err(EngineError::Response)
    }

    fn call(&mut self, request: &Request, payload: &[u8]) -> EngineResult {
        self.request(request, payload)
            .unwrap_or_else(|e| EngineResult::failure(e.to_string()))
    }
}

impl<W: Write + Send, R: BufRead + Send> AlprEngine for SubprocessEngine<W, R> {
    fn init(&mut self, settings_json: &str) -> EngineResult {
        match serde_json::from_str(settings_json) {
            Ok(settings) => self.call(&Request::Init { settings }, &[]),
            Err(e) => EngineResult::failure(EngineError::Settings(e).to_string()),
        }
    }

    fn warm_up(&mut self) -> EngineResult {
        self.call(&Request::WarmUp, &[])
    }

    fn process(&mut self, request: &ProcessRequest<'_>) -> EngineResult {
        let header = Request::Process {
            format: request.image_type,
            width: request.width,
            height: request.height,
            stride: request.stride,
            exif_orientation: request.exif_orientation,
            length: request.data.len(),
        };
        self.call(&header, request.data)
    }

    fn deinit(&mut self) -> EngineResult {
        self.call(&Request::Deinit, &[])
    }
}

impl<W: Write + Send, R: BufRead + Send> Drop for SubprocessEngine<W, R> {
    fn drop(&mut self) {
        // Closing stdin is the sidecar's signal to exit.
        self.writer = None;
        if let Some(mut child) = self.child.take() {
            match child.wait() {
                Ok(status) if !status.success() => {
                    log::warn!("Engine process exited with {status}");
                }
                Ok(_) => {}
                Err(e) => log::warn!("Failed to wait for engine process: {e}"),
            }
        }
    }
}
