//! The camera capability seam.
//!
//! Device enumeration and stream acquisition are external capabilities the
//! session manager depends on, not something this crate reimplements. The
//! traits below are that boundary; `NokhwaBackend` is the production
//! implementation, tests script their own.

use std::sync::mpsc;
use std::thread;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::{query, Camera};

use crate::capture::camera::FacingMode;
use crate::errors::CameraError;

/// One grabbed frame, as tightly-packed RGB bytes.
/// Kept toolkit-agnostic so backends can ship their own image stack.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// An open device stream. Stopped when the session closes.
///
/// Implementations serialize device access internally: `grab` and `stop` may
/// be called concurrently from the update loop and from background tasks,
/// and `stop` must return without waiting for an in-flight grab.
pub trait VideoStream: Send + Sync {
    /// Grab the current frame at the stream's native resolution.
    fn grab(&self) -> Result<RawFrame, CameraError>;

    /// Release the device. Must be safe to call more than once.
    fn stop(&self);
}

/// Access to the host's video input devices.
pub trait CameraBackend: Send + Sync {
    /// Number of video input devices currently available.
    fn device_count(&self) -> Result<usize, CameraError>;

    /// Open a stream on the device matching `facing`, preferring (but not
    /// requiring) the given resolution.
    fn open(
        &self,
        facing: FacingMode,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn VideoStream>, CameraError>;
}

/// Production backend on top of nokhwa.
///
/// The device handle is not movable across threads, so each open stream is
/// owned by a dedicated capture thread and driven over a command channel.
pub struct NokhwaBackend;

enum Command {
    Grab(mpsc::SyncSender<Result<RawFrame, CameraError>>),
    Stop,
}

impl CameraBackend for NokhwaBackend {
    fn device_count(&self) -> Result<usize, CameraError> {
        let devices = query(ApiBackend::Auto).map_err(classify)?;
        Ok(devices.len())
    }

    fn open(
        &self,
        facing: FacingMode,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn VideoStream>, CameraError> {
        let devices = query(ApiBackend::Auto).map_err(classify)?;
        if devices.is_empty() {
            return Err(CameraError::NoDevice);
        }

        // Desktop hardware does not report facing, so map it onto device
        // order: back = primary device, front = secondary when present.
        let index = match facing {
            FacingMode::Back => 0,
            FacingMode::Front => (devices.len() - 1).min(1),
        } as u32;

        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        thread::Builder::new()
            .name(format!("camera-{index}"))
            .spawn(move || capture_loop(index, width, height, command_rx, ready_tx))
            .map_err(|e| CameraError::Backend(format!("failed to spawn capture thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::info!("camera {index} opened ({facing:?})");
                Ok(Box::new(NokhwaStream {
                    commands: command_tx,
                }))
            }
            Ok(Err(error)) => Err(error),
            Err(_) => Err(CameraError::Backend(
                "capture thread exited during startup".to_string(),
            )),
        }
    }
}

fn capture_loop(
    index: u32,
    width: u32,
    height: u32,
    commands: mpsc::Receiver<Command>,
    ready: mpsc::SyncSender<Result<(), CameraError>>,
) {
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
        CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, 30),
    ));

    let opened = Camera::new(CameraIndex::Index(index), requested)
        .and_then(|mut camera| camera.open_stream().map(|()| camera));

    let mut camera = match opened {
        Ok(camera) => {
            let _ = ready.send(Ok(()));
            camera
        }
        Err(error) => {
            let _ = ready.send(Err(classify(error)));
            return;
        }
    };

    while let Ok(command) = commands.recv() {
        match command {
            Command::Grab(reply) => {
                let frame = camera
                    .frame()
                    .and_then(|buffer| buffer.decode_image::<RgbFormat>())
                    .map(|decoded| RawFrame {
                        width: decoded.width(),
                        height: decoded.height(),
                        rgb: decoded.into_raw(),
                    })
                    .map_err(classify);
                let _ = reply.send(frame);
            }
            Command::Stop => break,
        }
    }

    if let Err(error) = camera.stop_stream() {
        log::warn!("failed to stop camera {index}: {error}");
    }
}

struct NokhwaStream {
    commands: mpsc::Sender<Command>,
}

impl VideoStream for NokhwaStream {
    fn grab(&self) -> Result<RawFrame, CameraError> {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        self.commands
            .send(Command::Grab(reply_tx))
            .map_err(|_| CameraError::Backend("capture thread stopped".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| CameraError::Backend("capture thread stopped".to_string()))?
    }

    fn stop(&self) {
        let _ = self.commands.send(Command::Stop);
    }
}

/// Sort backend failures into the categories the UI distinguishes.
fn classify(error: nokhwa::NokhwaError) -> CameraError {
    let message = error.to_string();
    let lowered = message.to_lowercase();

    if lowered.contains("permission") || lowered.contains("access denied") {
        CameraError::PermissionDenied
    } else if lowered.contains("not found") || lowered.contains("no device") {
        CameraError::NoDevice
    } else {
        CameraError::Backend(message)
    }
}
