use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Blocks at least this long are treated as large objects (8/10 of a 4 KiB block).
pub const DEFAULT_LARGE_OBJECT_THRESHOLD: usize = 4096 * 8 / 10;

const ALLOWED_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoreConfig {
	pub log_level: String,
	#[serde(default = "default_large_object_threshold")]
	pub large_object_threshold: usize,
}

fn default_large_object_threshold() -> usize { DEFAULT_LARGE_OBJECT_THRESHOLD }

impl Default for CoreConfig {
	fn default() -> Self {
		Self { log_level: "info".into(), large_object_threshold: DEFAULT_LARGE_OBJECT_THRESHOLD }
	}
}

impl CoreConfig {
	pub fn builder() -> CoreConfigBuilder { CoreConfigBuilder::default() }

	pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
		let data = fs::read_to_string(path)?;
		let cfg: Self = toml::from_str(&data).map_err(|e| Error::config(format!("toml parse error: {e}")))?;
		cfg.validate()?;
		Ok(cfg)
	}

	pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
		let data = toml::to_string_pretty(self).map_err(|e| Error::config(format!("toml encode error: {e}")))?;
		fs::write(path, data)?;
		Ok(())
	}

	pub fn from_env() -> Result<Self> {
		let mut cfg = Self::default();
		if let Ok(v) = std::env::var("PINBUF_LOG_LEVEL") { cfg.log_level = v; }
		if let Ok(v) = std::env::var("PINBUF_LARGE_OBJECT_THRESHOLD") {
			cfg.large_object_threshold = v
				.parse()
				.map_err(|e| Error::config(format!("invalid PINBUF_LARGE_OBJECT_THRESHOLD {v:?}: {e}")))?;
		}
		cfg.validate()?;
		Ok(cfg)
	}

	pub fn validate(&self) -> Result<()> {
		if !ALLOWED_LEVELS.contains(&self.log_level.as_str()) {
			return Err(Error::config(format!("invalid log_level: {}", self.log_level)));
		}
		if self.large_object_threshold == 0 {
			return Err(Error::config("large_object_threshold must be non-zero"));
		}
		Ok(())
	}
}

/// Fluent construction of a validated [`CoreConfig`].
#[derive(Debug, Default)]
pub struct CoreConfigBuilder {
	log_level: Option<String>,
	large_object_threshold: Option<usize>,
}

impl CoreConfigBuilder {
	pub fn log_level(mut self, level: impl Into<String>) -> Self {
		self.log_level = Some(level.into());
		self
	}

	pub fn large_object_threshold(mut self, bytes: usize) -> Self {
		self.large_object_threshold = Some(bytes);
		self
	}

	pub fn build(self) -> Result<CoreConfig> {
		let defaults = CoreConfig::default();
		let cfg = CoreConfig {
			log_level: self.log_level.unwrap_or(defaults.log_level),
			large_object_threshold: self.large_object_threshold.unwrap_or(defaults.large_object_threshold),
		};
		cfg.validate()?;
		Ok(cfg)
	}
}
