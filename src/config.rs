use std::env;

/// Runtime configuration, loaded from environment variables with defaults.
/// A `.env` file next to the binary is honored (loaded in `main`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the grading server. The client posts to `{server_url}/grade`.
    pub server_url: String,
    /// Images wider than this are scaled down before transmission.
    pub max_width: u32,
    /// JPEG quality (0-100) used when normalizing images.
    pub jpeg_quality: u8,
    /// When set, answer-sheet mode refuses to submit without a reference
    /// image. Off by default; the server tolerates a missing reference.
    pub require_reference_for_answer_sheet: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            max_width: 1920,
            jpeg_quality: 80,
            require_reference_for_answer_sheet: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let server_url = env::var("SNAPGRADE_ENDPOINT")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.server_url);

        let max_width = env::var("SNAPGRADE_MAX_WIDTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_width);

        let jpeg_quality = env::var("SNAPGRADE_JPEG_QUALITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.jpeg_quality);

        let require_reference_for_answer_sheet =
            env::var("SNAPGRADE_REQUIRE_REFERENCE_FOR_ANSWER_SHEET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.require_reference_for_answer_sheet);

        Self {
            server_url,
            max_width,
            jpeg_quality,
            require_reference_for_answer_sheet,
        }
    }

    /// Full URL of the grading endpoint.
    pub fn grade_url(&self) -> String {
        format!("{}/grade", self.server_url)
    }
}
