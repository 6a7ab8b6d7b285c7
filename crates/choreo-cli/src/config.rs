//! Aggregated configuration for the `choreo` binary.

use serde::{Deserialize, Serialize};
use std::path::Path;

use choreo_analytics::AnalyticsConfig;
use choreo_client::BackendConfig;
use choreo_overlay::OverlayConfig;
use choreo_session::SessionConfig;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreoConfig {
    /// Pose server connection
    pub backend: BackendConfig,

    /// Countdown, polling and default video
    pub session: SessionConfig,

    /// Canvas, markers and frame indexing
    pub overlay: OverlayConfig,

    /// Post-session report
    pub analytics: AnalyticsConfig,
}

impl ChoreoConfig {
    /// Load from an optional file, then `CHOREO_*` environment variables
    /// (`__` separates nested keys, e.g. `CHOREO_BACKEND__BASE_URL`).
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("CHOREO")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_overlay::FrameIndexing;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ChoreoConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:5001");
        assert_eq!(config.session.default_video_id, "hot_to_go");
        assert_eq!(config.overlay.tick_ms, 16);
        assert!(config.analytics.humanize);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[backend]
base_url = "http://pose.local:6000"

[session]
go_hold_ms = 500

[overlay.indexing]
kind = "fixed_rate"
fps = 24.0
"#
        )
        .unwrap();

        let config = ChoreoConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.backend.base_url, "http://pose.local:6000");
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.session.go_hold_ms, 500);
        assert_eq!(config.session.countdown_step_ms, 1000);
        assert_eq!(config.overlay.indexing, FrameIndexing::FixedRate { fps: 24.0 });
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("CHOREO_SESSION__POLL_INTERVAL_MS", "250");
        let config = ChoreoConfig::load(None).unwrap();
        std::env::remove_var("CHOREO_SESSION__POLL_INTERVAL_MS");

        assert_eq!(config.session.poll_interval_ms, 250);
        assert_eq!(config.session.placeholder, "Waiting for connection...");
    }

    #[test]
    fn test_missing_file() {
        assert!(ChoreoConfig::load(Some(Path::new("/nonexistent/choreo.toml"))).is_err());
    }
}
