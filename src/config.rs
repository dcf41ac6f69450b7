use std::{path::Path, time::Duration};

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;

use crate::error::AppError;

const ENV_PREFIX: &str = "PIXELSCOPE";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Per-call inference timeout; 0 disables it.
    pub inference_timeout_ms: u64,
    pub profiler: ProfilerConfig,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Longest side of the raster examined by the profiler.
    pub max_dimension: u32,
    pub quantization_step: u8,
    pub palette_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub line_width: u32,
    pub label_height: u32,
    pub label_alpha: f32,
    pub text_inset: u32,
    pub text_baseline: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            inference_timeout_ms: 30_000,
            profiler: ProfilerConfig::default(),
            overlay: OverlayConfig::default(),
        }
    }
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            max_dimension: 100,
            quantization_step: 16,
            palette_size: 5,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            line_width: 3,
            label_height: 25,
            label_alpha: 0.7,
            text_inset: 5,
            text_baseline: 7,
        }
    }
}

impl Configuration {
    /// Loads the configuration from an optional TOML file, then from
    /// `PIXELSCOPE_*` environment variables (`__` separates nested keys).
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        Self::finish(builder)
    }

    pub fn from_toml(document: &str) -> Result<Self, AppError> {
        Self::finish(Config::builder().add_source(File::from_str(document, FileFormat::Toml)))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let configuration: Configuration = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.profiler.max_dimension == 0 {
            return Err(invalid("profiler.max_dimension must be positive"));
        }
        if self.profiler.quantization_step == 0 {
            return Err(invalid("profiler.quantization_step must be positive"));
        }
        if self.profiler.palette_size == 0 {
            return Err(invalid("profiler.palette_size must be positive"));
        }
        if !(0.0..=1.0).contains(&self.overlay.label_alpha) {
            return Err(invalid("overlay.label_alpha must be within [0, 1]"));
        }
        Ok(())
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        match self.inference_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}
