//! Application configuration.
//!
//! ```json
//! {
//!   "title": "Orbit",
//!   "width": 1600,
//!   "height": 900,
//!   "vsync": false,
//!   "clear_color": { "r": 0.02, "g": 0.02, "b": 0.05 },
//!   "log": { "level": "DEBUG", "file": "orbit.log" }
//! }
//! ```
//!
//! Every field is optional; missing ones take their [`Default`] values.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::logging::LogConfig;
use crate::math::Color;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub clear_color: Color,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "strata".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            clear_color: Color::MIDNIGHT,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
