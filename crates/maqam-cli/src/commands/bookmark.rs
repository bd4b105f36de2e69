//! Bookmark command handlers

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use maqam_core::{Config, ReadingDocument, Store};

use crate::output::Output;

/// Create a new bookmark
pub fn create(
    store: &mut Store,
    config: &Config,
    page: u32,
    details: String,
    output: &Output,
) -> Result<()> {
    let total = total_pages(config);
    if page == 0 || page > total {
        bail!("Page {} is out of range (1-{})", page, total);
    }

    let bookmark = store
        .create(page, &details)
        .context("Failed to create bookmark")?;

    output.success(&format!("Bookmarked page {}: {}", page, bookmark.id));
    output.print_bookmark(&bookmark);

    Ok(())
}

/// List all bookmarks, newest first, optionally filtered by page
pub fn list(store: &Store, page: Option<u32>, output: &Output) -> Result<()> {
    let mut bookmarks = store.all()?;
    if let Some(page) = page {
        bookmarks.retain(|b| b.page_number == page);
    }

    output.print_bookmarks(&bookmarks);
    Ok(())
}

/// Show a single bookmark
pub fn show(store: &Store, id: String, output: &Output) -> Result<()> {
    let uuid = parse_bookmark_id(&id, store)?;

    let bookmark = store
        .get(uuid)?
        .ok_or_else(|| anyhow::anyhow!("Bookmark not found: {}", id))?;

    output.print_bookmark(&bookmark);
    Ok(())
}

/// Delete a bookmark
pub fn delete(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let uuid = parse_bookmark_id(&id, store)?;

    let bookmark = store
        .get(uuid)?
        .ok_or_else(|| anyhow::anyhow!("Bookmark not found: {}", id))?;

    // Confirm deletion
    if output.should_prompt() {
        println!(
            "Delete bookmark: {} - page {}",
            &bookmark.id.to_string()[..8],
            bookmark.page_number
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete(uuid).context("Failed to delete bookmark")?;

    output.success(&format!("Deleted bookmark: {}", uuid));

    Ok(())
}

/// Resolve the document page count, falling back to the configured total
fn total_pages(config: &Config) -> u32 {
    config
        .document
        .as_deref()
        .and_then(|path| ReadingDocument::open(path).ok())
        .map(|doc| doc.page_count())
        .unwrap_or(config.page_count)
}

/// Parse a bookmark ID (supports full UUID or prefix)
fn parse_bookmark_id(id: &str, store: &Store) -> Result<Uuid> {
    // Try full UUID first
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(uuid);
    }

    // Try prefix match
    let bookmarks = store.all()?;
    let matches: Vec<_> = bookmarks
        .iter()
        .filter(|b| b.id.to_string().starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No bookmark found matching: {}", id),
        1 => Ok(matches[0].id),
        _ => {
            eprintln!("Multiple bookmarks match '{}':", id);
            for bookmark in &matches {
                eprintln!("  {} - page {}", bookmark.id, bookmark.page_number);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// Ask a yes/no question on stdin
fn confirm(prompt: &str) -> Result<bool> {
    use std::io::{self, Write};

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim(), "y" | "Y" | "yes"))
}
