use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Tenant the settings record belongs to
    #[arg(long, default_value = "root")]
    pub tenant: String,

    /// Locale the settings record belongs to
    #[arg(short, long, default_value = "en-US")]
    pub locale: String,

    /// Maximum undo levels kept by the editor (0 = unlimited)
    #[arg(long, default_value_t = 100)]
    pub max_levels: usize,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!(
        "{}",
        "📝 Initializing page builder project...".bright_blue().bold()
    );

    let mut config = Config::default();
    config.settings.tenant = args.tenant;
    config.settings.locale = args.locale;
    config.editor.history.max_levels = args.max_levels;

    let store_path = config.get_settings_store(cwd);
    if let Some(parent) = store_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            println!("  {} Created {}", "✓".green(), parent.display());
        }
    }

    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    println!();
    println!(
        "{} Settings key: {}",
        "✅".green(),
        config.settings.key().partition_key().bright_white()
    );

    Ok(())
}
