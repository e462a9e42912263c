//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so the workflow can start with zero
//! configuration against a local development server.

use std::path::PathBuf;

/// Workflow configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the attendance API, read once at startup.
    /// Env: `ABSENSI_API_BASE`
    /// Default: `http://localhost:3000`
    pub api_base: String,

    /// Path to the SeetaFace frontal detection model.
    /// Env: `ABSENSI_FACE_MODEL`
    /// Default: `./models/seeta_fd_frontal_v1.0.bin`
    pub face_model_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:3000".to_string(),
            face_model_path: PathBuf::from("./models/seeta_fd_frontal_v1.0.bin"),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base) = std::env::var("ABSENSI_API_BASE") {
            if !base.is_empty() {
                config.api_base = base;
            }
        }

        if let Ok(path) = std::env::var("ABSENSI_FACE_MODEL") {
            if !path.is_empty() {
                config.face_model_path = PathBuf::from(path);
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
