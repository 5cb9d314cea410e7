use std::path::PathBuf;

use crate::engine::DEFAULT_MATCH_THRESHOLD;

/// Engine configuration, loaded from environment variables.
pub struct Config {
    /// Root data directory; template records live in `face_data/` below it.
    pub data_dir: PathBuf,
    /// Path to the SeetaFace cascade model file.
    pub model_path: PathBuf,
    /// Correlation threshold for a positive match.
    pub match_threshold: f32,
}

impl Config {
    /// Load configuration from `FACEGATE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("FACEGATE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                std::env::var("XDG_DATA_HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| {
                        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                        PathBuf::from(home).join(".local/share")
                    })
                    .join("facegate")
            });

        let model_path = std::env::var("FACEGATE_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("seeta_fd_frontal_v1.0.bin"));

        Self {
            data_dir,
            model_path,
            match_threshold: env_f32("FACEGATE_MATCH_THRESHOLD", DEFAULT_MATCH_THRESHOLD),
        }
    }

    /// Directory holding one record per enrolled identifier.
    pub fn registry_dir(&self) -> PathBuf {
        self.data_dir.join("face_data")
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
