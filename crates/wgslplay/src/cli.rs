use std::path::PathBuf;

use clap::Parser;
use renderer::gpu::PowerPreference;

#[derive(Parser, Debug, Default)]
#[command(
    name = "wgslplay",
    author,
    version,
    about = "Plays a linked WGSL shader with a play/pause render loop"
)]
pub struct Cli {
    /// TOML file supplying defaults for any flag below.
    #[arg(long, value_name = "FILE", env = "WGSLPLAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory of `.wgsl` modules; the built-in demo shaders are used when omitted.
    #[arg(long, value_name = "DIR")]
    pub shader_dir: Option<PathBuf>,

    /// Root module to link (e.g. `main` for `<shader-dir>/main.wgsl`).
    #[arg(long, value_name = "MODULE")]
    pub root: Option<String>,

    /// Start with the loop paused.
    #[arg(long, conflicts_with = "playing")]
    pub paused: bool,

    /// Start with the loop running.
    #[arg(long)]
    pub playing: bool,

    /// Draw one frame at startup even while paused (`true` by default).
    #[arg(long, value_name = "BOOL")]
    pub draw_on_start: Option<bool>,

    /// Add copy-source usage to the surface so frames can be read back
    /// (`true` by default).
    #[arg(long, value_name = "BOOL")]
    pub debug_surface: Option<bool>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Frame number uploaded by the first draw.
    #[arg(long, value_name = "FRAME")]
    pub start_frame: Option<u32>,

    /// Print every module source and the linked result before opening the window.
    #[arg(long)]
    pub print_source: bool,

    /// GPU adapter preference: `low` or `high`.
    #[arg(long, value_name = "low|high", value_parser = parse_power)]
    pub power: Option<PowerPreference>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_power(value: &str) -> Result<PowerPreference, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("power preference must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "low" | "low-power" | "integrated" => Ok(PowerPreference::Low),
        "high" | "high-performance" | "discrete" => Ok(PowerPreference::High),
        other => Err(format!(
            "unknown power preference '{other}'; expected low or high"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_size(" 640X480 ").unwrap(), (640, 480));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("0x720").is_err());
        assert!(parse_size("wide x tall").is_err());
    }

    #[test]
    fn parses_power_preferences() {
        assert_eq!(parse_power("LOW").unwrap(), PowerPreference::Low);
        assert_eq!(parse_power("discrete").unwrap(), PowerPreference::High);
        assert!(parse_power("").is_err());
        assert!(parse_power("medium").is_err());
    }

    #[test]
    fn flags_map_onto_fields() {
        let cli = Cli::try_parse_from([
            "wgslplay",
            "--shader-dir",
            "shaders",
            "--root",
            "scene",
            "--paused",
            "--draw-on-start",
            "false",
            "--debug-surface",
            "false",
            "--size",
            "320x200",
            "--start-frame",
            "7",
            "--power",
            "low",
        ])
        .unwrap();

        assert_eq!(cli.shader_dir, Some(PathBuf::from("shaders")));
        assert_eq!(cli.root.as_deref(), Some("scene"));
        assert!(cli.paused);
        assert_eq!(cli.draw_on_start, Some(false));
        assert_eq!(cli.debug_surface, Some(false));
        assert_eq!(cli.size, Some((320, 200)));
        assert_eq!(cli.start_frame, Some(7));
        assert_eq!(cli.power, Some(PowerPreference::Low));
    }

    #[test]
    fn paused_and_playing_conflict() {
        assert!(Cli::try_parse_from(["wgslplay", "--paused", "--playing"]).is_err());
    }
}
