use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use pagebuilder_settings::{
    JsonFileSettingsStore, Prerendering, PrerenderingApp, Settings, SettingsResponse,
    SettingsService,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the settings record
    Get,

    /// Update fields of the settings record
    Set(SetArgs),
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Site name
    #[arg(long)]
    pub name: Option<String>,

    /// Public website URL
    #[arg(long)]
    pub website_url: Option<String>,

    /// Preview website URL
    #[arg(long)]
    pub website_preview_url: Option<String>,

    /// Prerendering app URL
    #[arg(long)]
    pub prerendering_url: Option<String>,

    /// JSON file with a full settings patch (merged before the flags above)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl SetArgs {
    fn into_patch(self) -> Result<Settings> {
        let mut patch = match &self.file {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => Settings::default(),
        };

        let flags = Settings {
            name: self.name,
            website_url: self.website_url,
            website_preview_url: self.website_preview_url,
            prerendering: self.prerendering_url.map(|url| Prerendering {
                app: Some(PrerenderingApp { url: Some(url) }),
                storage: None,
            }),
            ..Default::default()
        };
        patch = patch.merge(flags);

        if patch == Settings::default() {
            return Err(anyhow!("Nothing to update. Pass a field flag or --file"));
        }
        Ok(patch)
    }
}

pub async fn settings(command: SettingsCommand, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let store = JsonFileSettingsStore::new(config.get_settings_store(cwd));
    let service = SettingsService::new(Arc::new(store), config.settings.clone());
    let ctx = service.begin_request();

    let response = match command {
        SettingsCommand::Get => service.get_settings(&ctx).await,
        SettingsCommand::Set(args) => service.update_settings(&ctx, args.into_patch()?).await,
    };

    print_response(&response)
}

fn print_response(response: &SettingsResponse) -> Result<()> {
    println!("{} {}", "⚙️".bright_blue(), response.id.bright_white().bold());

    if let Some(error) = &response.error {
        return Err(anyhow!("{} ({})", error.message, error.code));
    }

    match &response.data {
        Some(data) => println!("{}", serde_json::to_string_pretty(data)?),
        None => println!("{}", "(settings have not been saved yet)".dimmed()),
    }
    Ok(())
}
