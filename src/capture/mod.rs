//! The image-capture pipeline: acquisition, normalization, and camera
//! session management.

pub mod acquire;
pub mod backend;
pub mod camera;
pub mod normalize;

pub use backend::{CameraBackend, NokhwaBackend, RawFrame, VideoStream};
pub use camera::{CameraSession, FacingMode, OpenCamera, VideoFrame};
pub use normalize::EncodedImage;
