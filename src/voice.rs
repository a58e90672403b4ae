//! Audio capture for voice turns
//!
//! A capture device is a held resource: once started, its tracks must be
//! stopped on every exit path. [`Recorder::start`] hands out an
//! [`ActiveRecording`] guard that stops the tracks either in
//! [`ActiveRecording::stop`] or when the guard is dropped, whichever comes
//! first, and never twice.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use base64::Engine as _;

use crate::error::{DomassistError, Result};

const CHUNK_SIZE: usize = 16 * 1024;

/// Source of recorded audio
pub trait CaptureDevice: Send + std::fmt::Debug {
    /// Acquire the device and begin capturing
    fn start_tracks(&mut self) -> Result<()>;

    /// Next chunk of audio, `None` once the source is exhausted
    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>>;

    /// Release the device
    fn stop_tracks(&mut self);
}

/// Starts recordings on a capture device
#[derive(Debug, Default, Clone, Copy)]
pub struct Recorder;

impl Recorder {
    /// Start capturing from `device`
    ///
    /// If the device fails to start its tracks are stopped before the error
    /// is returned.
    pub fn start(mut device: Box<dyn CaptureDevice>) -> Result<ActiveRecording> {
        if let Err(e) = device.start_tracks() {
            device.stop_tracks();
            return Err(e);
        }
        tracing::debug!(?device, "Recording started");
        Ok(ActiveRecording {
            device: Some(device),
            buffer: Vec::new(),
        })
    }
}

/// A running recording; releases its device when stopped or dropped
#[derive(Debug)]
pub struct ActiveRecording {
    device: Option<Box<dyn CaptureDevice>>,
    buffer: Vec<u8>,
}

impl ActiveRecording {
    /// Pull one chunk into the buffer; returns false once the source is done
    pub fn capture_chunk(&mut self) -> Result<bool> {
        let device = self
            .device
            .as_mut()
            .ok_or_else(|| DomassistError::Audio("recording already stopped".into()))?;
        match device.read_chunk()? {
            Some(chunk) => {
                self.buffer.extend_from_slice(&chunk);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Capture until the source is exhausted
    pub fn capture_all(&mut self) -> Result<()> {
        while self.capture_chunk()? {}
        Ok(())
    }

    /// Bytes captured so far
    pub fn captured(&self) -> usize {
        self.buffer.len()
    }

    /// Stop the recording and return the captured audio
    ///
    /// # Errors
    ///
    /// Returns `DomassistError::Audio` when nothing was captured. The device
    /// is released either way.
    pub fn stop(mut self) -> Result<Vec<u8>> {
        self.release();
        let audio = std::mem::take(&mut self.buffer);
        if audio.is_empty() {
            return Err(DomassistError::Audio("no audio captured".into()).into());
        }
        tracing::debug!(bytes = audio.len(), "Recording stopped");
        Ok(audio)
    }

    fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.stop_tracks();
        }
    }
}

impl Drop for ActiveRecording {
    fn drop(&mut self) {
        if self.device.is_some() {
            tracing::debug!("Recording dropped before stop, releasing device");
        }
        self.release();
    }
}

/// Capture device replaying a recorded audio file
#[derive(Debug)]
pub struct FileCapture {
    path: PathBuf,
    file: Option<File>,
}

impl FileCapture {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
        }
    }
}

impl CaptureDevice for FileCapture {
    fn start_tracks(&mut self) -> Result<()> {
        let file = File::open(&self.path).map_err(|e| {
            DomassistError::Audio(format!("cannot open {}: {}", self.path.display(), e))
        })?;
        self.file = Some(file);
        Ok(())
    }

    fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| DomassistError::Audio("device not started".into()))?;
        let mut chunk = vec![0u8; CHUNK_SIZE];
        let n = file.read(&mut chunk).map_err(DomassistError::from)?;
        if n == 0 {
            return Ok(None);
        }
        chunk.truncate(n);
        Ok(Some(chunk))
    }

    fn stop_tracks(&mut self) {
        self.file = None;
    }
}

/// Record everything `device` yields
pub fn record(device: Box<dyn CaptureDevice>) -> Result<Vec<u8>> {
    let mut recording = Recorder::start(device)?;
    recording.capture_all()?;
    recording.stop()
}

/// Base64 form used in `audioData`
pub fn encode_audio(audio: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct ScriptedDevice {
        chunks: Vec<Result<Vec<u8>>>,
        fail_start: bool,
        stops: Arc<AtomicUsize>,
    }

    impl ScriptedDevice {
        fn boxed(chunks: Vec<Result<Vec<u8>>>, stops: &Arc<AtomicUsize>) -> Box<Self> {
            Box::new(Self {
                chunks,
                fail_start: false,
                stops: Arc::clone(stops),
            })
        }
    }

    impl CaptureDevice for ScriptedDevice {
        fn start_tracks(&mut self) -> Result<()> {
            if self.fail_start {
                return Err(DomassistError::Audio("permission denied".into()).into());
            }
            self.chunks.reverse();
            Ok(())
        }

        fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
            self.chunks.pop().transpose()
        }

        fn stop_tracks(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_stop_returns_audio_and_releases_once() {
        let stops = Arc::new(AtomicUsize::new(0));
        let device = ScriptedDevice::boxed(vec![Ok(vec![1, 2]), Ok(vec![3])], &stops);

        let audio = record(device).unwrap();
        assert_eq!(audio, vec![1, 2, 3]);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_read_error_releases_device() {
        let stops = Arc::new(AtomicUsize::new(0));
        let device = ScriptedDevice::boxed(
            vec![
                Ok(vec![1]),
                Err(DomassistError::Audio("device lost".into()).into()),
            ],
            &stops,
        );

        let err = record(device).unwrap_err();
        assert!(err.to_string().contains("device lost"));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_start_releases_device() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mut device = ScriptedDevice::boxed(Vec::new(), &stops);
        device.fail_start = true;

        assert!(Recorder::start(device).is_err());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_recording_is_error() {
        let stops = Arc::new(AtomicUsize::new(0));
        let err = record(ScriptedDevice::boxed(Vec::new(), &stops)).unwrap_err();
        assert!(err.to_string().contains("no audio captured"));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_file_capture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.webm");
        std::fs::write(&path, vec![7u8; CHUNK_SIZE + 10]).unwrap();

        let audio = record(Box::new(FileCapture::new(&path))).unwrap();
        assert_eq!(audio.len(), CHUNK_SIZE + 10);
        assert_eq!(encode_audio(&[0xff, 0x00]), "/wA=");
    }

    #[test]
    fn test_missing_file_fails_to_start() {
        let err = record(Box::new(FileCapture::new("/nonexistent/voice.webm"))).unwrap_err();
        assert!(err.to_string().contains("Audio error"));
    }
}
