//! Startup configuration.
//!
//! Built-in defaults are overridden by an optional TOML file, which is in turn
//! overridden by command line flags:
//!
//! ```toml
//! client_width = 1280
//! client_height = 720
//! title = "Engine"
//! debug_layer_enabled = true
//! gpu_validation_enabled = false
//! vsync_enabled = true
//! max_srv_count = 512
//! target_fps = 60
//! log_level = "info"
//! asset_dir = "assets"
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    client_width: u32,
    client_height: u32,
    title: String,

    debug_layer_enabled: bool,
    gpu_validation_enabled: bool,
    vsync_enabled: bool,

    max_srv_count: u32,
    target_fps: u32,

    log_level: String,
    asset_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_width: 1280,
            client_height: 720,
            title: "Engine".into(),
            debug_layer_enabled: cfg!(debug_assertions),
            gpu_validation_enabled: false,
            vsync_enabled: true,
            max_srv_count: 512,
            target_fps: 60,
            log_level: "info".into(),
            asset_dir: "assets".into(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn client_width(&self) -> u32 {
        self.client_width
    }

    pub fn client_height(&self) -> u32 {
        self.client_height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.client_width as f32 / self.client_height as f32
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn debug_layer_enabled(&self) -> bool {
        self.debug_layer_enabled || self.gpu_validation_enabled
    }

    pub fn gpu_validation_enabled(&self) -> bool {
        self.gpu_validation_enabled
    }

    pub fn vsync_enabled(&self) -> bool {
        self.vsync_enabled
    }

    pub fn max_srv_count(&self) -> u32 {
        self.max_srv_count
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    fn validate(&self) -> Result<()> {
        if self.client_width == 0 || self.client_height == 0 {
            return Err(Error::ZeroSize);
        }
        if self.max_srv_count < 2 {
            return Err(Error::Argument(format!(
                "max_srv_count must be at least 2, got {}",
                self.max_srv_count
            )));
        }
        Ok(())
    }
}

/// Command line flags, applied on top of the config file.
#[derive(Parser, Debug, Default)]
#[command(name = "engine")]
#[command(about = "Direct3D 12 sprite and model framework")]
pub struct CliArgs {
    /// TOML file read before the other flags are applied
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// 0 disables frame pacing
    #[arg(long)]
    pub fps: Option<u32>,

    #[arg(long)]
    pub no_vsync: bool,

    /// Disables both the debug layer and GPU-based validation
    #[arg(long)]
    pub no_debug: bool,

    #[arg(long)]
    pub gpu_validation: bool,
}

impl CliArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(width) = self.width {
            config.client_width = width;
        }
        if let Some(height) = self.height {
            config.client_height = height;
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        if self.no_vsync {
            config.vsync_enabled = false;
        }
        if self.no_debug {
            config.debug_layer_enabled = false;
            config.gpu_validation_enabled = false;
        }
        if self.gpu_validation {
            config.gpu_validation_enabled = true;
        }
    }
}

/// `args` includes the program name, as `std::env::args` does.
pub fn parse_args(args: impl Iterator<Item = String>) -> Result<Config> {
    let cli = CliArgs::try_parse_from(args)?;

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    cli.apply(&mut config);

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &[&str]) -> impl Iterator<Item = String> {
        std::iter::once("engine".to_string())
            .chain(s.iter().map(|a| a.to_string()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn defaults_without_arguments() {
        let config = parse_args(args(&[])).unwrap();
        assert_eq!(config.client_width(), 1280);
        assert_eq!(config.client_height(), 720);
        assert_eq!(config.max_srv_count(), 512);
        assert_eq!(config.target_fps(), 60);
        assert!(config.vsync_enabled());
    }

    #[test]
    fn flags_override_defaults() {
        let config =
            parse_args(args(&["--width", "640", "--height", "480", "--no-vsync", "--no-debug"]))
                .unwrap();
        assert_eq!(config.client_width(), 640);
        assert_eq!(config.client_height(), 480);
        assert!(!config.vsync_enabled());
        assert!(!config.debug_layer_enabled());
    }

    #[test]
    fn gpu_validation_implies_debug_layer() {
        let config = parse_args(args(&["--no-debug", "--gpu-validation"])).unwrap();
        assert!(config.gpu_validation_enabled());
        assert!(config.debug_layer_enabled());
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(matches!(parse_args(args(&["--width"])), Err(Error::Cli(_))));
        assert!(matches!(parse_args(args(&["--width", "wide"])), Err(Error::Cli(_))));
        assert!(matches!(parse_args(args(&["--bogus"])), Err(Error::Cli(_))));
        assert!(matches!(parse_args(args(&["--width", "0"])), Err(Error::ZeroSize)));
    }

    #[test]
    fn config_flag_without_a_path_is_rejected() {
        assert!(matches!(parse_args(args(&["--config"])), Err(Error::Cli(_))));
        assert!(matches!(
            parse_args(args(&["--no-vsync", "--config"])),
            Err(Error::Cli(_))
        ));
    }

    #[test]
    fn flags_leave_unset_values_alone() {
        let mut config = Config::from_toml_str("client_width = 800\ntarget_fps = 30\n").unwrap();
        let cli = CliArgs::try_parse_from(["engine", "--height", "600"]).unwrap();
        cli.apply(&mut config);

        assert_eq!(config.client_width(), 800);
        assert_eq!(config.client_height(), 600);
        assert_eq!(config.target_fps(), 30);
        assert!(config.vsync_enabled());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("client_width = 800\ntitle = \"Demo\"\n").unwrap();
        assert_eq!(config.client_width(), 800);
        assert_eq!(config.client_height(), 720);
        assert_eq!(config.title(), "Demo");
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            Config::from_toml_str("client_width = \"wide\""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("max_srv_count = 1"),
            Err(Error::Argument(_))
        ));
    }
}
