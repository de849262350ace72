use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::APP_NAME;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("min_faces_for_alert must be >= 1, got {0}")]
    MinFaces(u32),
    #[error("alert_cooldown_seconds must be a finite value >= 0, got {0}")]
    Cooldown(f64),
    #[error("stability.window must be >= 1, got {0}")]
    StabilityWindow(usize),
    #[error("stability.required must be between 1 and window ({window}), got {required}")]
    StabilityRequired { required: usize, window: usize },
    #[error("camera.poll_interval_ms must be > 0")]
    PollInterval,
    #[error("camera.min_confidence must be within [0, 1], got {0}")]
    Confidence(f32),
    #[error("camera area ratios must satisfy 0 <= min < max <= 1, got [{min}, {max}]")]
    AreaRatio { min: f64, max: f64 },
    #[error("camera.low_light_threshold must be within [0, 255], got {0}")]
    LowLightThreshold(f32),
    #[error("degraded.after_failures must be >= 1")]
    DegradedAfter,
    #[error("work_app.active names unknown target {0:?}")]
    UnknownWorkAppTarget(String),
}

/// Frame acquisition and detector filtering parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraConfig {
    pub index: u32,
    /// Requested capture size; 0 leaves the driver default.
    pub frame_width: u32,
    pub frame_height: u32,
    pub poll_interval_ms: u64,
    pub frame_timeout_ms: u64,
    pub min_confidence: f32,
    pub min_area_ratio: f64,
    pub max_area_ratio: f64,
    /// Mean frame brightness (0-255) below which detections are
    /// discarded as low-light noise; 0 disables the gate.
    pub low_light_threshold: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            frame_width: 0,
            frame_height: 0,
            poll_interval_ms: 100,
            frame_timeout_ms: 500,
            min_confidence: 0.7,
            min_area_ratio: 0.01,
            max_area_ratio: 0.6,
            low_light_threshold: 0.0,
        }
    }
}

/// Majority-of-N debounce parameters for the stability evaluator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// Ring buffer size N.
    pub window: usize,
    /// How many of the last N observations must trigger (K).
    pub required: usize,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            window: 5,
            required: 3,
        }
    }
}

/// Persistent-failure handling for the detection loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DegradedConfig {
    /// Consecutive failed ticks before the UI is notified once.
    pub after_failures: u32,
    /// Reduced polling rate while degraded.
    pub retry_interval_ms: u64,
}

impl Default for DegradedConfig {
    fn default() -> Self {
        Self {
            after_failures: 5,
            retry_interval_ms: 1000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub enabled: bool,
    /// Target directory; None disables snapshots entirely.
    pub directory: Option<PathBuf>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}

/// One switchable work application with per-OS launch commands.
///
/// Also used verbatim inside overlays, so unknown keys are rejected
/// here too; a typo in a target field must not silently misconfigure
/// activation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkAppTarget {
    pub windows_command: Option<String>,
    pub macos_command: Option<String>,
    pub linux_command: Option<String>,
    /// Window title fragments used to activate an already-running app.
    #[serde(default)]
    pub window_keywords: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorkAppConfig {
    /// Key into `targets`; None disables app switching.
    pub active: Option<String>,
    #[serde(default)]
    pub targets: BTreeMap<String, WorkAppTarget>,
}

/// Process-lifetime monitor configuration.
///
/// Built from code defaults, then an optional JSON overlay merged
/// field-by-field; immutable once validated (no hot reload).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub min_faces_for_alert: u32,
    pub alert_cooldown_seconds: f64,
    pub camera: CameraConfig,
    pub stability: StabilityConfig,
    pub degraded: DegradedConfig,
    pub snapshot: SnapshotConfig,
    pub work_app: WorkAppConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            min_faces_for_alert: 2,
            alert_cooldown_seconds: 15.0,
            camera: CameraConfig::default(),
            stability: StabilityConfig::default(),
            degraded: DegradedConfig::default(),
            snapshot: SnapshotConfig::default(),
            work_app: WorkAppConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Default overlay location: `<config_dir>/peekwatch/config.json`.
    pub fn default_overlay_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME).join("config.json"))
    }

    /// Loads defaults, applies the overlay at `path` (or the default
    /// location when `path` is None and the file exists), validates.
    ///
    /// An explicitly named overlay must exist and parse; a missing
    /// file at the default location is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let overlay_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_overlay_path().filter(|p| p.exists()),
        };

        if let Some(p) = overlay_path {
            let text = fs::read_to_string(&p).map_err(|source| ConfigError::Read {
                path: p.clone(),
                source,
            })?;
            let overlay: ConfigOverlay =
                serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                    path: p.clone(),
                    source,
                })?;
            config.apply(overlay);
            log::info!("applied config overlay from {}", p.display());
        }

        config.validate()?;
        Ok(config)
    }

    /// Merges an overlay field-by-field; unset overlay fields keep the
    /// current value.
    pub fn apply(&mut self, overlay: ConfigOverlay) {
        if let Some(v) = overlay.min_faces_for_alert {
            self.min_faces_for_alert = v;
        }
        if let Some(v) = overlay.alert_cooldown_seconds {
            self.alert_cooldown_seconds = v;
        }
        if let Some(camera) = overlay.camera {
            if let Some(v) = camera.index {
                self.camera.index = v;
            }
            if let Some(v) = camera.frame_width {
                self.camera.frame_width = v;
            }
            if let Some(v) = camera.frame_height {
                self.camera.frame_height = v;
            }
            if let Some(v) = camera.poll_interval_ms {
                self.camera.poll_interval_ms = v;
            }
            if let Some(v) = camera.frame_timeout_ms {
                self.camera.frame_timeout_ms = v;
            }
            if let Some(v) = camera.min_confidence {
                self.camera.min_confidence = v;
            }
            if let Some(v) = camera.min_area_ratio {
                self.camera.min_area_ratio = v;
            }
            if let Some(v) = camera.max_area_ratio {
                self.camera.max_area_ratio = v;
            }
            if let Some(v) = camera.low_light_threshold {
                self.camera.low_light_threshold = v;
            }
        }
        if let Some(stability) = overlay.stability {
            if let Some(v) = stability.window {
                self.stability.window = v;
            }
            if let Some(v) = stability.required {
                self.stability.required = v;
            }
        }
        if let Some(degraded) = overlay.degraded {
            if let Some(v) = degraded.after_failures {
                self.degraded.after_failures = v;
            }
            if let Some(v) = degraded.retry_interval_ms {
                self.degraded.retry_interval_ms = v;
            }
        }
        if let Some(snapshot) = overlay.snapshot {
            if let Some(v) = snapshot.enabled {
                self.snapshot.enabled = v;
            }
            if let Some(v) = snapshot.directory {
                self.snapshot.directory = Some(v);
            }
        }
        if let Some(work_app) = overlay.work_app {
            if let Some(v) = work_app.active {
                self.work_app.active = Some(v);
            }
            // Targets replace by key rather than merging inner fields;
            // a target definition is an atomic unit.
            for (key, target) in work_app.targets {
                self.work_app.targets.insert(key, target);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_faces_for_alert < 1 {
            return Err(ConfigError::MinFaces(self.min_faces_for_alert));
        }
        if !self.alert_cooldown_seconds.is_finite() || self.alert_cooldown_seconds < 0.0 {
            return Err(ConfigError::Cooldown(self.alert_cooldown_seconds));
        }
        if self.stability.window < 1 {
            return Err(ConfigError::StabilityWindow(self.stability.window));
        }
        if self.stability.required < 1 || self.stability.required > self.stability.window {
            return Err(ConfigError::StabilityRequired {
                required: self.stability.required,
                window: self.stability.window,
            });
        }
        if self.camera.poll_interval_ms == 0 {
            return Err(ConfigError::PollInterval);
        }
        if !(0.0..=1.0).contains(&self.camera.min_confidence) {
            return Err(ConfigError::Confidence(self.camera.min_confidence));
        }
        let (min, max) = (self.camera.min_area_ratio, self.camera.max_area_ratio);
        if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min >= max {
            return Err(ConfigError::AreaRatio { min, max });
        }
        if !(0.0..=255.0).contains(&self.camera.low_light_threshold) {
            return Err(ConfigError::LowLightThreshold(
                self.camera.low_light_threshold,
            ));
        }
        if self.degraded.after_failures < 1 {
            return Err(ConfigError::DegradedAfter);
        }
        if let Some(active) = &self.work_app.active {
            if !self.work_app.targets.contains_key(active) {
                return Err(ConfigError::UnknownWorkAppTarget(active.clone()));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.camera.poll_interval_ms)
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.camera.frame_timeout_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.alert_cooldown_seconds)
    }

    pub fn degraded_interval(&self) -> Duration {
        Duration::from_millis(self.degraded.retry_interval_ms)
    }
}

/// Statically typed overlay: every field optional, unknown keys
/// rejected at parse time instead of silently accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverlay {
    pub min_faces_for_alert: Option<u32>,
    pub alert_cooldown_seconds: Option<f64>,
    pub camera: Option<CameraOverlay>,
    pub stability: Option<StabilityOverlay>,
    pub degraded: Option<DegradedOverlay>,
    pub snapshot: Option<SnapshotOverlay>,
    pub work_app: Option<WorkAppOverlay>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraOverlay {
    pub index: Option<u32>,
    pub frame_width: Option<u32>,
    pub frame_height: Option<u32>,
    pub poll_interval_ms: Option<u64>,
    pub frame_timeout_ms: Option<u64>,
    pub min_confidence: Option<f32>,
    pub min_area_ratio: Option<f64>,
    pub max_area_ratio: Option<f64>,
    pub low_light_threshold: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StabilityOverlay {
    pub window: Option<usize>,
    pub required: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DegradedOverlay {
    pub after_failures: Option<u32>,
    pub retry_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotOverlay {
    pub enabled: Option<bool>,
    /// An overlay can set a directory but not clear one back to None;
    /// `enabled: false` is the way to turn snapshots off.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkAppOverlay {
    pub active: Option<String>,
    #[serde(default)]
    pub targets: BTreeMap<String, WorkAppTarget>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        MonitorConfig::default().validate().unwrap();
    }

    #[test]
    fn test_overlay_merges_field_by_field() {
        let mut config = MonitorConfig::default();
        let overlay: ConfigOverlay = serde_json::from_str(
            r#"{
                "min_faces_for_alert": 3,
                "camera": { "poll_interval_ms": 50 }
            }"#,
        )
        .unwrap();
        config.apply(overlay);

        assert_eq!(config.min_faces_for_alert, 3);
        assert_eq!(config.camera.poll_interval_ms, 50);
        // Untouched fields keep their defaults.
        assert_eq!(config.alert_cooldown_seconds, 15.0);
        assert_eq!(config.camera.frame_timeout_ms, 500);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<ConfigOverlay, _> =
            serde_json::from_str(r#"{ "min_faces": 3 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_nested_key_rejected() {
        let result: Result<ConfigOverlay, _> =
            serde_json::from_str(r#"{ "camera": { "fps": 30 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_key_in_work_app_target_rejected() {
        // "window_keyword" (singular) is a typo for "window_keywords".
        let result: Result<ConfigOverlay, _> = serde_json::from_str(
            r#"{ "work_app": { "targets": { "x": { "window_keyword": ["typo"] } } } }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_min_faces_zero_rejected() {
        let mut config = MonitorConfig::default();
        config.min_faces_for_alert = 0;
        assert!(matches!(config.validate(), Err(ConfigError::MinFaces(0))));
    }

    #[test]
    fn test_negative_cooldown_rejected() {
        let mut config = MonitorConfig::default();
        config.alert_cooldown_seconds = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Cooldown(_))));
    }

    #[test]
    fn test_nan_cooldown_rejected() {
        let mut config = MonitorConfig::default();
        config.alert_cooldown_seconds = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Cooldown(_))));
    }

    #[test]
    fn test_zero_cooldown_allowed() {
        let mut config = MonitorConfig::default();
        config.alert_cooldown_seconds = 0.0;
        config.validate().unwrap();
    }

    #[test]
    fn test_required_above_window_rejected() {
        let mut config = MonitorConfig::default();
        config.stability.window = 3;
        config.stability.required = 4;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StabilityRequired { .. })
        ));
    }

    #[test]
    fn test_inverted_area_ratios_rejected() {
        let mut config = MonitorConfig::default();
        config.camera.min_area_ratio = 0.5;
        config.camera.max_area_ratio = 0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AreaRatio { .. })
        ));
    }

    #[test]
    fn test_out_of_range_low_light_threshold_rejected() {
        let mut config = MonitorConfig::default();
        config.camera.low_light_threshold = 300.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LowLightThreshold(_))
        ));
    }

    #[test]
    fn test_active_work_app_must_exist() {
        let mut config = MonitorConfig::default();
        config.work_app.active = Some("vscode".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownWorkAppTarget(_))
        ));

        config.work_app.targets.insert(
            "vscode".into(),
            WorkAppTarget {
                macos_command: Some("open -a \"Visual Studio Code\"".into()),
                ..WorkAppTarget::default()
            },
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "alert_cooldown_seconds": 5.0, "stability": { "window": 3, "required": 2 } }"#,
        )
        .unwrap();

        let config = MonitorConfig::load(Some(&path)).unwrap();
        assert_eq!(config.alert_cooldown_seconds, 5.0);
        assert_eq!(config.stability.window, 3);
        assert_eq!(config.stability.required, 2);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert!(matches!(
            MonitorConfig::load(Some(&path)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_load_invalid_overlay_value_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "min_faces_for_alert": 0 }"#).unwrap();
        assert!(matches!(
            MonitorConfig::load(Some(&path)),
            Err(ConfigError::MinFaces(0))
        ));
    }

    #[test]
    fn test_work_app_target_replaced_atomically() {
        let mut config = MonitorConfig::default();
        config.work_app.targets.insert(
            "idea".into(),
            WorkAppTarget {
                windows_command: Some("idea64.exe".into()),
                window_keywords: vec!["intellij idea".into()],
                ..WorkAppTarget::default()
            },
        );

        let overlay: ConfigOverlay = serde_json::from_str(
            r#"{ "work_app": { "targets": { "idea": { "macos_command": "open -a \"IntelliJ IDEA\"" } } } }"#,
        )
        .unwrap();
        config.apply(overlay);

        let target = &config.work_app.targets["idea"];
        assert_eq!(
            target.macos_command.as_deref(),
            Some("open -a \"IntelliJ IDEA\"")
        );
        // Replaced wholesale, not merged.
        assert!(target.windows_command.is_none());
        assert!(target.window_keywords.is_empty());
    }
}
