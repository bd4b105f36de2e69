//! Status command handler

use anyhow::Result;

use maqam_core::{Config, ReadingDocument, Store};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(store: &Store, config: &Config, output: &Output) -> Result<()> {
    let db_path = config.sqlite_path();
    let db_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);
    let bookmark_count = store.count().unwrap_or(0);

    // Resolve the document if configured; failure is status, not an error
    let document_pages = config
        .document
        .as_deref()
        .map(|path| ReadingDocument::open(path).map(|doc| doc.page_count()));

    match output.format {
        OutputFormat::Json => {
            let document = match (&config.document, &document_pages) {
                (Some(path), Some(Ok(pages))) => serde_json::json!({
                    "path": path,
                    "resolved": true,
                    "page_count": pages,
                }),
                (Some(path), Some(Err(e))) => serde_json::json!({
                    "path": path,
                    "resolved": false,
                    "error": e.to_string(),
                }),
                _ => serde_json::json!(null),
            };

            println!(
                "{}",
                serde_json::json!({
                    "document": document,
                    "fallback_page_count": config.page_count,
                    "storage": {
                        "database_path": db_path,
                        "database_size": db_size,
                    },
                    "counts": {
                        "bookmarks": bookmark_count,
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", bookmark_count);
        }
        OutputFormat::Human => {
            println!("Maqam Status");
            println!("============");
            println!();
            println!("Document:");
            match (&config.document, &document_pages) {
                (Some(path), Some(Ok(pages))) => {
                    println!("  Path:  {}", path.display());
                    println!("  Pages: {}", pages);
                }
                (Some(path), Some(Err(e))) => {
                    println!("  Path:  {}", path.display());
                    println!("  Error: {}", e);
                }
                _ => {
                    println!("  (not configured)");
                    println!("  Fallback page count: {}", config.page_count);
                }
            }
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Size:     {}", human_size(db_size));
            println!();
            println!("Contents:");
            println!("  Bookmarks: {}", bookmark_count);
        }
    }

    Ok(())
}

/// Format a byte count for humans
fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
