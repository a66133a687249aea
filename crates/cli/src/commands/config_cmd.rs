//! `gena config`: print the effective configuration.

use gena_config::GenaConfig;

pub fn run(default: bool) -> anyhow::Result<()> {
    if default {
        print!("{}", GenaConfig::default_toml());
        return Ok(());
    }

    let path = GenaConfig::config_dir().join("config.toml");
    let config = GenaConfig::load()?;

    println!("# {}", path.display());
    println!("{config:#?}");
    if !config.has_api_key() {
        eprintln!("warning: no API key set (GENA_API_KEY, OPENAI_API_KEY or OPENAI_KEY)");
    }
    Ok(())
}
