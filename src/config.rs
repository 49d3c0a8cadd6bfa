//! Configuration for a lab session.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    animation::DEFAULT_FRAMES_PER_SECOND,
    model::{Parameters, DEFAULT_TRACK_LENGTH_PX, DEFAULT_VIEWPORT_BUFFER},
    particles::MAX_MARKERS,
};

fn default_seed() -> u64 {
    7
}

fn default_viewport_buffer() -> f64 {
    DEFAULT_VIEWPORT_BUFFER
}

fn default_canvas_width() -> f64 {
    400.0
}

fn default_canvas_height() -> f64 {
    300.0
}

fn default_track_length() -> f64 {
    DEFAULT_TRACK_LENGTH_PX
}

fn default_max_markers() -> usize {
    MAX_MARKERS
}

fn default_frames_per_second() -> u32 {
    DEFAULT_FRAMES_PER_SECOND
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabConfig {
    pub name: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub slider: SliderConfig,
    #[serde(default)]
    pub particles: ParticleConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default = "default_viewport_buffer")]
    pub viewport_buffer: f64,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_canvas_width")]
    pub width: f64,
    #[serde(default = "default_canvas_height")]
    pub height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliderConfig {
    #[serde(default = "default_track_length")]
    pub track_length_px: f64,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            track_length_px: default_track_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleConfig {
    #[serde(default = "default_max_markers")]
    pub max_markers: usize,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_markers: default_max_markers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_frames_per_second")]
    pub frames_per_second: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frames_per_second: default_frames_per_second(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for LabConfig {
    fn default() -> Self {
        Self::classroom()
    }
}

impl LabConfig {
    /// The stock lesson: N₀ = 100, r = 0.6, k = 1000 over ten time units.
    pub fn classroom() -> Self {
        Self {
            name: "classroom".to_string(),
            seed: default_seed(),
            parameters: Parameters::default(),
            canvas: CanvasConfig::default(),
            slider: SliderConfig::default(),
            particles: ParticleConfig::default(),
            animation: AnimationConfig::default(),
            viewport_buffer: default_viewport_buffer(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml_str(data: &str) -> Result<Self> {
        let config: LabConfig = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would stall the lab: a track with no pixels
    /// gives every slider a zero step, so playback could never advance.
    pub fn validate(&self) -> Result<()> {
        let track = self.slider.track_length_px;
        ensure!(
            track.is_finite() && track > 0.0,
            "slider.track_length_px must be a positive number of pixels, got {track}"
        );
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_yaml()?)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classroom_config() {
        let config = LabConfig::classroom();
        assert_eq!(config.name, "classroom");
        assert_eq!(config.parameters.initial_population, 100.0);
        assert_eq!(config.parameters.max_capacity, 1500.0);
        assert_eq!(config.particles.max_markers, 5000);
        assert_eq!(config.animation.frames_per_second, 60);
    }

    #[test]
    fn test_zero_track_length_is_rejected() {
        for track in ["0", "-150"] {
            let yaml = format!("name: flat\nslider:\n  track_length_px: {track}\n");
            let err = LabConfig::from_yaml_str(&yaml).unwrap_err();
            assert!(err.to_string().contains("track_length_px"));
        }
        assert!(LabConfig::classroom().validate().is_ok());
    }

    #[test]
    fn test_sections_default_when_absent() {
        let config = LabConfig::from_yaml_str("name: bare\n").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.slider.track_length_px, 150.0);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.parameters, Parameters::default());
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab.yaml");
        let mut config = LabConfig::classroom();
        config.parameters.rate = 1.25;
        config.save(&path).unwrap();

        let loaded = LabConfig::load(&path).unwrap();
        assert_eq!(loaded.parameters, config.parameters);
        assert_eq!(loaded.name, config.name);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = LabConfig::load("does/not/exist.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
