mod cli;
mod logging;
mod repl;
mod slash_command;

use anyhow::Result;
use uiforge_core::Config;
use uiforge_core::ConfigKey;
use uiforge_core::SessionSettings;

#[tokio::main]
async fn main() -> Result<()> {
    better_panic::install();

    let matches = cli::build().get_matches();
    Config::load(cli::build(), vec![&matches]).await?;

    if let Some(("config", config_matches)) = matches.subcommand() {
        match config_matches.subcommand_name() {
            Some("default") => println!("{}", Config::serialize_default(cli::build())),
            Some("path") => println!("{}", Config::get(ConfigKey::ConfigFile)),
            _ => {}
        }
        return Ok(());
    }

    let _guard = logging::init()?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting uiforge");

    let settings = SessionSettings::from_config()?;
    return repl::start(settings).await;
}
