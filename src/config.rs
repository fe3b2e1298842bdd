//! Configuration for the Area theme engine
//!
//! Loads configuration from TOML file at `~/.config/area/theme.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::theme::{ButtonLayout, FrameInfo, THEME_FORMAT_VERSION};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: ThemeConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Same as `load` with an explicit file location
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("area");

        Ok(config_dir.join("theme.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string).context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Which theme to load and which format it may use
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Theme description file
    pub path: Option<PathBuf>,
    /// Highest theme format version accepted
    pub format_version: u32,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            path: None,
            format_version: THEME_FORMAT_VERSION,
        }
    }
}

/// Frame rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Integer window scale (HiDPI)
    pub scale: i32,
    /// Width in pixels of the fade applied to overlong titles
    pub title_fade_margin: f64,
    /// Font family for titles; common sans families are tried when unset
    pub title_font: Option<String>,
    /// Title font size in pixels before the theme's title_scale
    pub title_font_size: f64,
    /// Titlebar buttons, e.g. "menu:minimize,maximize,close"
    pub button_layout: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 1,
            title_fade_margin: 30.0,
            title_font: None,
            title_font_size: 14.0,
            button_layout: "menu:minimize,maximize,close".to_string(),
        }
    }
}

impl RenderConfig {
    pub fn button_layout(&self) -> ButtonLayout {
        ButtonLayout::parse(&self.button_layout)
    }

    /// Frame info with the configured scale and fade; the caller fills in
    /// title and icons
    pub fn frame_info<'a>(&self) -> FrameInfo<'a> {
        FrameInfo {
            scale: self.scale.max(1),
            title_fade_margin: self.title_fade_margin,
            ..FrameInfo::default()
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "area_theme=debug,info".to_string(),
        }
    }
}
