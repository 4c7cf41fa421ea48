//! Camera session management for one slot.
//!
//! Lifecycle per slot: `Closed → Requesting → Open → Closed`. A session is
//! created when the slot switches to camera mode, recreated on flip, and
//! destroyed when the slot switches away, a still is captured, or the window
//! closes.

use std::fmt;
use std::sync::Arc;

use tokio::task;

use crate::capture::backend::{CameraBackend, VideoStream};
use crate::capture::normalize::{encode_bounded, EncodedImage};
use crate::errors::{AppError, CameraError, Result};

/// JPEG quality used for the full-resolution still before normalization.
const STILL_QUALITY: u8 = 95;

/// Which physical camera a capture session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    Front,
    #[default]
    Back,
}

impl FacingMode {
    pub fn opposite(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Back,
            FacingMode::Back => FacingMode::Front,
        }
    }
}

/// A stream shared between the update loop and background grab tasks.
/// No lock sits in front: streams serialize device access internally, so
/// session teardown never waits on an in-flight grab.
pub type SharedStream = Arc<dyn VideoStream>;

/// A successfully opened stream plus whether a flip control makes sense.
#[derive(Clone)]
pub struct OpenCamera {
    pub stream: SharedStream,
    pub flip_available: bool,
}

impl fmt::Debug for OpenCamera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenCamera")
            .field("flip_available", &self.flip_available)
            .finish()
    }
}

#[derive(Default)]
enum SessionState {
    #[default]
    Closed,
    Requesting,
    Open(SharedStream),
}

/// Per-slot camera session.
#[derive(Default)]
pub struct CameraSession {
    state: SessionState,
    facing: FacingMode,
    flip_available: bool,
}

impl CameraSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transition to `Requesting` before launching the open task.
    /// Any previous stream is released first.
    pub fn begin_request(&mut self) {
        self.stop();
        self.state = SessionState::Requesting;
    }

    /// Complete a successful open. Ignored (and the stream released) if the
    /// session was closed while the request was in flight.
    pub fn complete_request(&mut self, opened: OpenCamera) {
        match self.state {
            SessionState::Requesting => {
                self.flip_available = opened.flip_available;
                self.state = SessionState::Open(opened.stream);
            }
            _ => opened.stream.stop(),
        }
    }

    /// Record a failed open: back to `Closed`, flip control hidden.
    pub fn fail_request(&mut self) {
        self.state = SessionState::Closed;
        self.flip_available = false;
    }

    /// Stop the stream and clear session state. Idempotent, and returns
    /// immediately even while a background grab is in flight.
    pub fn stop(&mut self) {
        if let SessionState::Open(stream) = std::mem::take(&mut self.state) {
            stream.stop();
        }
        self.state = SessionState::Closed;
        self.flip_available = false;
    }

    /// Toggle facing and release the current stream. The caller restarts the
    /// session with the returned facing; a failed restart leaves the slot
    /// without a stream.
    pub fn flip(&mut self) -> FacingMode {
        self.facing = self.facing.opposite();
        self.stop();
        self.facing
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn flip_available(&self) -> bool {
        self.flip_available
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open(_))
    }

    pub fn is_requesting(&self) -> bool {
        matches!(self.state, SessionState::Requesting)
    }

    pub fn stream(&self) -> Option<SharedStream> {
        match &self.state {
            SessionState::Open(stream) => Some(stream.clone()),
            _ => None,
        }
    }
}

/// Enumerate devices and open a stream with the requested facing mode and a
/// preferred (not mandatory) resolution.
pub async fn open_stream(
    backend: Arc<dyn CameraBackend>,
    facing: FacingMode,
    width: u32,
    height: u32,
) -> std::result::Result<OpenCamera, CameraError> {
    task::spawn_blocking(move || {
        let device_count = backend.device_count()?;
        if device_count == 0 {
            return Err(CameraError::NoDevice);
        }

        let stream = backend.open(facing, width, height)?;

        Ok(OpenCamera {
            stream: Arc::from(stream),
            flip_available: device_count > 1,
        })
    })
    .await
    .map_err(|e| CameraError::Backend(format!("camera task failed: {e}")))?
}

/// One preview frame, RGBA for direct display.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Grab the current frame for the live preview.
pub async fn grab_frame(stream: SharedStream) -> std::result::Result<VideoFrame, CameraError> {
    task::spawn_blocking(move || {
        let frame = stream.grab()?;

        let mut rgba = Vec::with_capacity(frame.rgb.len() / 3 * 4);
        for px in frame.rgb.chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 0xFF]);
        }

        Ok(VideoFrame {
            width: frame.width,
            height: frame.height,
            rgba,
        })
    })
    .await
    .map_err(|e| CameraError::Backend(format!("camera task failed: {e}")))?
}

/// Capture the current frame as a still: native resolution, encoded at high
/// quality, then run through the normalizer like any other acquisition.
pub async fn capture_still(
    stream: SharedStream,
    max_width: u32,
    quality: u8,
) -> Result<EncodedImage> {
    task::spawn_blocking(move || {
        let frame = stream.grab().map_err(AppError::Camera)?;

        let buffer = image::RgbImage::from_raw(frame.width, frame.height, frame.rgb)
            .ok_or_else(|| AppError::Capture("camera returned a truncated frame".to_string()))?;
        let decoded = image::DynamicImage::ImageRgb8(buffer);

        // High-quality intermediate, then the standard bound + recompress
        let still = encode_bounded(&decoded, u32::MAX, STILL_QUALITY)?;
        crate::capture::normalize::normalize(&still.jpeg, max_width, quality)
    })
    .await
    .map_err(|e| AppError::Capture(format!("capture task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::backend::RawFrame;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};

    struct FakeStream {
        width: u32,
        height: u32,
        stops: Arc<AtomicUsize>,
    }

    impl VideoStream for FakeStream {
        fn grab(&self) -> std::result::Result<RawFrame, CameraError> {
            Ok(RawFrame {
                width: self.width,
                height: self.height,
                rgb: vec![0x7F; (self.width * self.height * 3) as usize],
            })
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// A stream whose grab parks until the test releases it, standing in for
    /// a device that is slow (or wedged) inside a frame read.
    struct BlockingStream {
        started: mpsc::Sender<()>,
        release: Mutex<mpsc::Receiver<()>>,
        stops: Arc<AtomicUsize>,
    }

    impl VideoStream for BlockingStream {
        fn grab(&self) -> std::result::Result<RawFrame, CameraError> {
            let _ = self.started.send(());
            let release = self.release.lock().unwrap();
            release
                .recv()
                .map_err(|_| CameraError::Backend("released".to_string()))?;
            Ok(RawFrame {
                width: 2,
                height: 2,
                rgb: vec![0x7F; 12],
            })
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeBackend {
        devices: usize,
        error: Option<CameraError>,
        stops: Arc<AtomicUsize>,
    }

    impl FakeBackend {
        fn with_devices(devices: usize) -> Self {
            Self {
                devices,
                error: None,
                stops: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(error: CameraError) -> Self {
            Self {
                devices: 1,
                error: Some(error),
                stops: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl CameraBackend for FakeBackend {
        fn device_count(&self) -> std::result::Result<usize, CameraError> {
            Ok(self.devices)
        }

        fn open(
            &self,
            _facing: FacingMode,
            width: u32,
            height: u32,
        ) -> std::result::Result<Box<dyn VideoStream>, CameraError> {
            if let Some(error) = &self.error {
                return Err(error.clone());
            }
            Ok(Box::new(FakeStream {
                width,
                height,
                stops: self.stops.clone(),
            }))
        }
    }

    #[tokio::test]
    async fn test_open_stream_reports_flip_on_multi_camera_devices() {
        let single = Arc::new(FakeBackend::with_devices(1));
        let opened = open_stream(single, FacingMode::Back, 1920, 1080)
            .await
            .unwrap();
        assert!(!opened.flip_available);

        let dual = Arc::new(FakeBackend::with_devices(2));
        let opened = open_stream(dual, FacingMode::Back, 1920, 1080)
            .await
            .unwrap();
        assert!(opened.flip_available);
    }

    #[tokio::test]
    async fn test_open_stream_with_no_devices() {
        let backend = Arc::new(FakeBackend::with_devices(0));
        let result = open_stream(backend, FacingMode::Back, 1920, 1080).await;
        assert_eq!(result.unwrap_err(), CameraError::NoDevice);
    }

    #[tokio::test]
    async fn test_permission_error_propagates() {
        let backend = Arc::new(FakeBackend::failing(CameraError::PermissionDenied));
        let result = open_stream(backend, FacingMode::Back, 1920, 1080).await;
        assert_eq!(result.unwrap_err(), CameraError::PermissionDenied);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let backend = Arc::new(FakeBackend::with_devices(1));
        let stops = backend.stops.clone();
        let opened = open_stream(backend, FacingMode::Back, 1920, 1080)
            .await
            .unwrap();

        let mut session = CameraSession::new();
        session.begin_request();
        session.complete_request(opened);
        assert!(session.is_open());

        session.stop();
        session.stop();

        assert!(!session.is_open());
        assert!(!session.flip_available());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_does_not_wait_for_an_in_flight_grab() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let stops = Arc::new(AtomicUsize::new(0));
        let stream: SharedStream = Arc::new(BlockingStream {
            started: started_tx,
            release: Mutex::new(release_rx),
            stops: stops.clone(),
        });

        let mut session = CameraSession::new();
        session.begin_request();
        session.complete_request(OpenCamera {
            stream: stream.clone(),
            flip_available: false,
        });

        let grabbed = task::spawn_blocking({
            let stream = stream.clone();
            move || stream.grab()
        });
        // The grab is now parked inside the device read
        started_rx.recv().unwrap();

        // Switching the slot away must not wait for the grab to finish
        session.stop();
        assert!(!session.is_open());
        assert_eq!(stops.load(Ordering::SeqCst), 1);

        release_tx.send(()).unwrap();
        assert!(grabbed.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_begin_request_releases_the_previous_stream() {
        let backend = Arc::new(FakeBackend::with_devices(1));
        let stops = backend.stops.clone();
        let opened = open_stream(backend, FacingMode::Back, 1920, 1080)
            .await
            .unwrap();

        let mut session = CameraSession::new();
        session.begin_request();
        session.complete_request(opened);
        assert!(session.is_open());

        // A second request never leaves two streams open for one slot
        session.begin_request();
        assert!(session.is_requesting());
        assert!(!session.is_open());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_flip_toggles_facing_and_releases_stream() {
        let mut session = CameraSession::new();
        assert_eq!(session.facing(), FacingMode::Back);

        assert_eq!(session.flip(), FacingMode::Front);
        assert_eq!(session.flip(), FacingMode::Back);
        assert!(!session.is_open());
    }

    #[test]
    fn test_failed_request_closes_the_session() {
        let mut session = CameraSession::new();
        session.begin_request();
        assert!(session.is_requesting());

        session.fail_request();
        assert!(!session.is_open());
        assert!(!session.is_requesting());
        assert!(!session.flip_available());
    }

    #[tokio::test]
    async fn test_stale_open_is_released_when_session_already_closed() {
        let backend = Arc::new(FakeBackend::with_devices(1));
        let stops = backend.stops.clone();
        let opened = open_stream(backend, FacingMode::Back, 1920, 1080)
            .await
            .unwrap();

        // Session was switched away before the open finished
        let mut session = CameraSession::new();
        session.complete_request(opened);

        assert!(!session.is_open());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_capture_still_is_normalized() {
        let backend = Arc::new(FakeBackend::with_devices(1));
        let opened = open_stream(backend, FacingMode::Back, 2560, 1440)
            .await
            .unwrap();

        let still = capture_still(opened.stream.clone(), 1920, 80).await.unwrap();
        assert_eq!((still.width, still.height), (1920, 1080));
    }

    #[tokio::test]
    async fn test_grab_frame_produces_rgba() {
        let backend = Arc::new(FakeBackend::with_devices(1));
        let opened = open_stream(backend, FacingMode::Back, 320, 240)
            .await
            .unwrap();

        let frame = grab_frame(opened.stream.clone()).await.unwrap();
        assert_eq!((frame.width, frame.height), (320, 240));
        assert_eq!(frame.rgba.len(), 320 * 240 * 4);
        assert_eq!(frame.rgba[3], 0xFF);
    }
}
