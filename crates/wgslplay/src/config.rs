//! Startup settings: an optional TOML file overlaid by command-line flags.
//!
//! ```toml
//! shader_dir = "shaders"     # relative to this file
//! root = "main"
//! paused = false
//! draw_on_start = true
//! debug_surface = true
//! size = "1280x720"
//! start_frame = 0
//! print_source = true
//! power = "high"
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use renderer::gpu::PowerPreference;
use renderer::{LoopOptions, LoopState};
use serde::Deserialize;

use crate::cli::{parse_power, parse_size, Cli};

pub const DEFAULT_ROOT: &str = "main";
pub const DEFAULT_SIZE: (u32, u32) = (960, 540);

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub shader_dir: Option<PathBuf>,
    pub root: Option<String>,
    pub paused: Option<bool>,
    pub draw_on_start: Option<bool>,
    pub debug_surface: Option<bool>,
    pub size: Option<String>,
    pub start_frame: Option<u32>,
    pub print_source: Option<bool>,
    pub power: Option<String>,
}

impl FileConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).context("failed to parse wgslplay config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file at {}", path.display()))?;
        if let (Some(dir), Some(base)) = (config.shader_dir.as_mut(), path.parent()) {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        Ok(config)
    }
}

/// Where shader modules come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderOrigin {
    Builtin,
    Directory(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub origin: ShaderOrigin,
    pub root: String,
    pub loop_options: LoopOptions,
    pub debug_surface: bool,
    pub size: (u32, u32),
    pub start_frame: u32,
    pub print_source: bool,
    pub power: PowerPreference,
}

impl Settings {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    /// Flags win over file values; defaults fill whatever neither sets.
    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self> {
        let origin = match cli.shader_dir.clone().or(file.shader_dir) {
            Some(dir) => ShaderOrigin::Directory(dir),
            None => ShaderOrigin::Builtin,
        };

        let paused = if cli.paused {
            true
        } else if cli.playing {
            false
        } else {
            file.paused.unwrap_or(true)
        };

        let size = match (cli.size, file.size.as_deref()) {
            (Some(size), _) => size,
            (None, Some(raw)) => {
                parse_size(raw).map_err(|err| anyhow!("invalid size in config: {err}"))?
            }
            (None, None) => DEFAULT_SIZE,
        };

        let power = match (cli.power, file.power.as_deref()) {
            (Some(power), _) => power,
            (None, Some(raw)) => {
                parse_power(raw).map_err(|err| anyhow!("invalid power in config: {err}"))?
            }
            (None, None) => PowerPreference::default(),
        };

        Ok(Self {
            origin,
            root: cli
                .root
                .clone()
                .or(file.root)
                .unwrap_or_else(|| DEFAULT_ROOT.to_string()),
            loop_options: LoopOptions {
                initial: if paused {
                    LoopState::Stopped
                } else {
                    LoopState::Running
                },
                draw_on_start: cli.draw_on_start.or(file.draw_on_start).unwrap_or(true),
            },
            debug_surface: cli.debug_surface.or(file.debug_surface).unwrap_or(true),
            size,
            start_frame: cli.start_frame.or(file.start_frame).unwrap_or(0),
            print_source: cli.print_source || file.print_source.unwrap_or(false),
            power,
        })
    }
}
