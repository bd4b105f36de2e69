//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use maqam_core::Bookmark;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single bookmark
    pub fn print_bookmark(&self, bookmark: &Bookmark) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", bookmark.id);
                println!("Page:    {}", bookmark.page_number);
                if !bookmark.details.is_empty() {
                    println!("Details: {}", bookmark.details);
                }
                println!(
                    "Created: {}",
                    bookmark.created_at.format("%Y-%m-%d %H:%M")
                );
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(bookmark).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", bookmark.id);
            }
        }
    }

    /// Print a list of bookmarks
    pub fn print_bookmarks(&self, bookmarks: &[Bookmark]) {
        match self.format {
            OutputFormat::Human => {
                if bookmarks.is_empty() {
                    println!("No bookmarks yet.");
                    return;
                }
                for bookmark in bookmarks {
                    println!(
                        "{} | page {:>4} | {} | {}",
                        &bookmark.id.to_string()[..8],
                        bookmark.page_number,
                        bookmark.created_at.format("%Y-%m-%d"),
                        truncate_line(&bookmark.details, 50)
                    );
                }
                println!("\n{} bookmark(s)", bookmarks.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(bookmarks).unwrap());
            }
            OutputFormat::Quiet => {
                for bookmark in bookmarks {
                    println!("{}", bookmark.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
