use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pagebuilder_editor::{Document, ElementId, ElementStore, ListParams};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Page JSON file to inspect
    pub page: PathBuf,

    /// Elements per page of output
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Cursor printed by the previous invocation
    #[arg(short, long)]
    pub after: Option<String>,

    /// Print the element tree instead of a flat list
    #[arg(long)]
    pub tree: bool,
}

pub fn inspect(args: InspectArgs, _cwd: &str) -> Result<()> {
    let document = Document::load(args.page.clone())
        .with_context(|| format!("Failed to load page {}", args.page.display()))?;
    let state = document.state();

    println!(
        "{} {} {}",
        "📄".bright_blue(),
        state.page.id.bright_white().bold(),
        format!("\"{}\" {}", state.page.title, state.page.url).dimmed()
    );

    if args.tree {
        if let Some(root) = state.elements.root() {
            for line in tree_lines(&state.elements, root) {
                println!("{}", line);
            }
        } else {
            println!("{}", "(no content)".dimmed());
        }
        return Ok(());
    }

    let page = state.elements.list(&ListParams {
        limit: args.limit,
        after: args.after,
    })?;

    for element in &page.items {
        println!(
            "  {} {} ({} children)",
            element.id.as_str().bright_white(),
            element.element_type.cyan(),
            element.elements.len()
        );
    }

    println!();
    println!(
        "Showing {} of {} elements",
        page.items.len(),
        page.meta.total_count
    );
    if let Some(cursor) = page.meta.cursor {
        println!("Next page: --after {}", cursor.bright_white());
    }

    Ok(())
}

fn tree_lines(store: &ElementStore, root: &ElementId) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack = vec![(root.clone(), 0usize)];

    while let Some((id, depth)) = stack.pop() {
        let Some(element) = store.get(&id) else {
            continue;
        };
        lines.push(format!(
            "{}{} [{}]",
            "  ".repeat(depth + 1),
            element.id,
            element.element_type
        ));
        for child in element.elements.iter().rev() {
            stack.push((child.clone(), depth + 1));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagebuilder_editor::{Page, PageState};
    use serde_json::json;

    #[test]
    fn test_tree_lines() {
        let page: Page = serde_json::from_value(json!({
            "id": "p",
            "content": {
                "id": "doc",
                "type": "document",
                "elements": [
                    { "id": "a", "type": "block", "elements": [{ "id": "b", "type": "text" }] },
                    { "id": "c", "type": "text" }
                ]
            }
        }))
        .unwrap();
        let state = PageState::from_page(page).unwrap();

        let lines = tree_lines(&state.elements, state.elements.root().unwrap());
        assert_eq!(
            lines,
            vec![
                "  doc [document]",
                "    a [block]",
                "      b [text]",
                "    c [text]"
            ]
        );
    }
}
