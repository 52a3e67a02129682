//! Configuration file support for diffrow
//!
//! Config file location: `~/.config/diffrow/config.toml` (XDG_CONFIG_HOME)
//!
//! Example config:
//! ```toml
//! [render]
//! tab_width = 8
//! word_diff = true
//! word_diff_limit = 1000
//! tick_step = 0.01
//!
//! [output]
//! template = "/path/to/file-template.html"
//! ```

use diffrow_core::RenderSettings;
use serde::Deserialize;
use std::path::PathBuf;

/// Render knobs, mirrored onto [`RenderSettings`]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub tab_width: u32,
    pub word_diff: bool,
    pub word_diff_limit: usize,
    pub tick_step: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let defaults = RenderSettings::default();
        Self {
            tab_width: defaults.tab_width,
            word_diff: defaults.word_diff,
            word_diff_limit: defaults.word_diff_limit,
            tick_step: defaults.tick_step,
        }
    }
}

/// Output options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to a custom per-file HTML template
    pub template: Option<PathBuf>,
}

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Get all possible config file paths in priority order
    fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG_CONFIG_HOME (if set)
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("diffrow").join("config.toml"));
        }

        // 2. ~/.config/diffrow/config.toml (XDG default, works on all platforms)
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("diffrow").join("config.toml"));
        }

        // 3. Platform-specific config dir (~/Library/Application Support on macOS)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("diffrow").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        paths
    }

    /// Get the first existing config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_paths().into_iter().find(|p| p.exists())
    }

    /// Load config from XDG config path
    /// Returns default config if file doesn't exist or can't be parsed
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| std::fs::read_to_string(&path).ok())
            .and_then(|content| {
                toml::from_str(&content)
                    .map_err(|e| {
                        eprintln!("Warning: Failed to parse config: {}", e);
                        e
                    })
                    .ok()
            })
            .unwrap_or_default()
    }

    /// Base render settings from the config file, before CLI overrides
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            tab_width: self.render.tab_width,
            word_diff: self.render.word_diff,
            word_diff_limit: self.render.word_diff_limit,
            tick_step: self.render.tick_step,
            ..RenderSettings::default()
        }
    }
}
