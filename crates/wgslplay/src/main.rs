mod cli;
mod config;
mod panel;
mod run;
mod shaders;

use anyhow::Result;
use config::Settings;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let settings = Settings::resolve(&cli)?;
    tracing::debug!(?settings, "resolved wgslplay settings");
    run::run(settings)
}
