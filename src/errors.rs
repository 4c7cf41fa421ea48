use thiserror::Error;

/// Camera failures, classified into the three categories the UI
/// distinguishes. `Display` is the user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Please allow camera access in your system settings.")]
    PermissionDenied,

    #[error("No camera found on this device.")]
    NoDevice,

    #[error("{0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Grading failed with status {status}: {message}")]
    Server { status: u16, message: String },

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error("{0}")]
    Capture(String),
}

impl AppError {
    /// The text shown to the user. Server errors are surfaced verbatim,
    /// everything else uses the `Display` form.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
