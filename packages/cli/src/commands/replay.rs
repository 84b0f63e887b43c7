use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use pagebuilder_editor::{ActionEvent, Document, Editor, PluginRegistry};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Page JSON file to edit
    pub page: PathBuf,

    /// JSON array of action events to apply in order
    pub actions: PathBuf,

    /// Undo this many steps after replaying
    #[arg(long, default_value_t = 0)]
    pub undo: usize,

    /// Stop at the first rejected event
    #[arg(long)]
    pub strict: bool,

    /// Do not write the page back
    #[arg(long)]
    pub dry_run: bool,

    /// Print the resulting page to stdout
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Debug, Default, PartialEq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
    pub undone: usize,
}

pub fn replay(args: ReplayArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let events = read_events(&args.actions)?;

    println!(
        "{} {} events against {}",
        "▶".bright_blue().bold(),
        events.len(),
        args.page.display()
    );

    let document = Document::load(args.page.clone())
        .with_context(|| format!("Failed to load page {}", args.page.display()))?;
    let mut editor =
        Editor::mount_document(document, Arc::new(PluginRegistry::new()), &config.editor)?;

    let summary = apply_events(&mut editor, events, args.undo, args.strict)?;
    let mut document = editor.unmount()?;

    if args.stdout {
        println!("{}", serde_json::to_string_pretty(&document.to_page())?);
    }

    if !args.dry_run && document.is_dirty() {
        document.save()?;
        println!("  {} Saved {}", "✓".green(), args.page.display());
    }

    println!();
    let line = format!(
        "Applied {} events, {} rejected, {} undone",
        summary.applied, summary.rejected, summary.undone
    );
    if summary.rejected == 0 {
        println!("{} {}", "✅".green(), line);
    } else {
        println!("{} {}", "⚠️".yellow(), line);
    }

    Ok(())
}

fn read_events(path: &Path) -> Result<Vec<ActionEvent>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read actions {}", path.display()))?;
    let events: Vec<ActionEvent> = serde_json::from_str(&source)?;
    Ok(events)
}

fn apply_events(
    editor: &mut Editor,
    events: Vec<ActionEvent>,
    undo: usize,
    strict: bool,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (index, event) in events.into_iter().enumerate() {
        let kind = event.kind();
        match editor.trigger(event) {
            Ok(outcome) => {
                summary.applied += 1;
                println!(
                    "  {} #{} {:?} ({:?})",
                    "✓".green(),
                    index,
                    kind,
                    outcome.recorded
                );
            }
            Err(e) => {
                summary.rejected += 1;
                eprintln!("  {} #{} {:?} - {}", "✗".red(), index, kind, e.to_string().red());
                if strict {
                    return Err(anyhow!("Event #{} rejected: {}", index, e));
                }
            }
        }
    }

    for _ in 0..undo {
        if !editor.undo()? {
            break;
        }
        summary.undone += 1;
    }

    Ok(summary)
}
