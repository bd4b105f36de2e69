//! Application state and logic

use maqam_core::{Bookmark, ReadingDocument, Store, ViewerScreen};
use tracing::error;
use uuid::Uuid;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Bookmark editor modal is open
    Editor,
    /// Delete confirmation is showing
    ConfirmDelete,
}

/// Which top-level screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveScreen {
    /// The document reader
    Reader,
    /// The saved bookmarks list
    Bookmarks,
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_quit: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Which screen is showing
    pub active_screen: ActiveScreen,
    /// Reader lifecycle and current-page tracker
    pub viewer: ViewerScreen,
    /// The resolved document, present while the reader is mounted Ready
    pub document: Option<ReadingDocument>,
    /// Whether the reader's current page has at least one bookmark
    pub current_page_bookmarked: bool,
    /// Bookmark list cache, newest first
    pub bookmarks: Vec<Bookmark>,
    /// Currently selected bookmark index
    pub bookmark_index: usize,
    /// Id of the item whose contextual actions are disclosed, if any
    pub disclosed: Option<Uuid>,
    /// Editor modal: page fixed at open time
    pub editor_page: u32,
    /// Editor modal: note text buffer
    pub editor_buffer: String,
    /// Bookmark pending delete confirmation
    pub confirm_target: Option<Uuid>,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<std::time::Instant>,
    /// Whether help overlay is visible
    pub show_help: bool,
}

impl App {
    /// Create a new app with data from store
    pub fn new(store: &Store) -> anyhow::Result<Self> {
        let bookmarks = store.all()?;

        Ok(Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            active_screen: ActiveScreen::Reader,
            viewer: ViewerScreen::new(),
            document: None,
            current_page_bookmarked: false,
            bookmarks,
            bookmark_index: 0,
            disclosed: None,
            editor_page: 1,
            editor_buffer: String::new(),
            confirm_target: None,
            status_message: None,
            status_message_time: None,
            show_help: false,
        })
    }

    /// Set a status message (will auto-dismiss after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(std::time::Instant::now());
    }

    /// Check and clear expired status message
    pub fn check_status_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > std::time::Duration::from_secs(3) {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Reload the bookmark list and indicator from the store
    ///
    /// Called when the store reports a committed mutation; the list never
    /// polls on its own.
    pub fn refresh(&mut self, store: &Store) -> anyhow::Result<()> {
        self.bookmarks = store.all()?;

        // Collapse a disclosure whose record disappeared
        if let Some(id) = self.disclosed {
            if !self.bookmarks.iter().any(|b| b.id == id) {
                self.disclosed = None;
            }
        }

        // Clamp selection to new list bounds
        if self.bookmarks.is_empty() {
            self.bookmark_index = 0;
        } else {
            self.bookmark_index = self.bookmark_index.min(self.bookmarks.len() - 1);
        }

        self.refresh_page_indicator(store);
        Ok(())
    }

    /// Re-evaluate the "current page is bookmarked" indicator
    pub fn refresh_page_indicator(&mut self, store: &Store) {
        self.current_page_bookmarked = store
            .is_page_bookmarked(self.viewer.current_page())
            .unwrap_or(false);
    }

    // ==================== Reader screen ====================

    /// Switch to the reader screen, mounting the viewer afresh
    ///
    /// `goto_page` comes from a list selection; without one the reader
    /// re-opens at its last tracked page.
    pub fn switch_to_reader(&mut self, goto_page: Option<u32>) -> maqam_core::MountToken {
        self.active_screen = ActiveScreen::Reader;
        self.document = None;
        let page = goto_page.unwrap_or_else(|| self.viewer.current_page());
        self.viewer.enter(Some(page))
    }

    /// Switch to the bookmarks screen, unmounting the reader
    pub fn switch_to_bookmarks(&mut self, store: &Store) -> anyhow::Result<()> {
        self.viewer.leave();
        self.document = None;
        self.active_screen = ActiveScreen::Bookmarks;
        self.disclosed = None;
        self.refresh(store)
    }

    /// Turn to the next page
    pub fn next_page(&mut self, store: &Store) {
        if self.viewer.is_ready() {
            self.viewer.page_changed(self.viewer.current_page().saturating_add(1));
            self.refresh_page_indicator(store);
        }
    }

    /// Turn to the previous page
    pub fn prev_page(&mut self, store: &Store) {
        if self.viewer.is_ready() {
            self.viewer.page_changed(self.viewer.current_page().saturating_sub(1).max(1));
            self.refresh_page_indicator(store);
        }
    }

    /// Extracted text of the page currently shown, if the reader is Ready
    pub fn current_page_text(&self) -> Option<String> {
        if !self.viewer.is_ready() {
            return None;
        }
        let doc = self.document.as_ref()?;
        match doc.page_text(self.viewer.current_page()) {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Failed to extract page text: {}", e);
                None
            }
        }
    }

    // ==================== Bookmark editor modal ====================

    /// Open the editor for the page showing right now
    ///
    /// The page is fixed as of open time and does not track page changes
    /// while the editor is open.
    pub fn open_editor(&mut self) {
        if !self.viewer.is_ready() {
            return;
        }
        self.editor_page = self.viewer.current_page();
        self.editor_buffer.clear();
        self.input_mode = InputMode::Editor;
    }

    /// Cancel the editor (or backdrop-dismiss): clear the buffer, persist
    /// nothing
    pub fn cancel_editor(&mut self) {
        self.editor_buffer.clear();
        self.input_mode = InputMode::Normal;
    }

    /// Append a character to the note buffer
    pub fn editor_insert_char(&mut self, c: char) {
        self.editor_buffer.push(c);
    }

    /// Delete the last character of the note buffer
    pub fn editor_delete_char(&mut self) {
        self.editor_buffer.pop();
    }

    /// Save the note for the editor's page
    ///
    /// The buffer is cleared and the modal closed whether or not the
    /// store accepted the write; a failed save is logged only.
    pub fn save_editor(&mut self, store: &mut Store) {
        match store.create(self.editor_page, &self.editor_buffer) {
            Ok(bookmark) => {
                self.set_status(format!("Saved maqam for page {}", bookmark.page_number));
            }
            Err(e) => {
                error!("Failed to save bookmark: {}", e);
            }
        }
        self.editor_buffer.clear();
        self.input_mode = InputMode::Normal;
    }

    // ==================== Bookmarks screen ====================

    /// Get the currently selected bookmark
    pub fn selected_bookmark(&self) -> Option<&Bookmark> {
        self.bookmarks.get(self.bookmark_index)
    }

    /// Move selection up
    pub fn move_up(&mut self) {
        if self.bookmark_index > 0 {
            self.bookmark_index -= 1;
        }
    }

    /// Move selection down
    pub fn move_down(&mut self) {
        if self.bookmark_index < self.bookmarks.len().saturating_sub(1) {
            self.bookmark_index += 1;
        }
    }

    /// Toggle the selected item's contextual actions
    ///
    /// At most one item's actions are disclosed at a time: disclosing B
    /// while A is disclosed leaves only B disclosed.
    pub fn toggle_disclosure(&mut self) {
        let Some(selected) = self.selected_bookmark() else {
            return;
        };
        let id = selected.id;
        self.disclosed = if self.disclosed == Some(id) {
            None
        } else {
            Some(id)
        };
    }

    /// Activate the selected item
    ///
    /// Navigation (the returned page) only fires when the activated item
    /// has no disclosed actions and nothing else is disclosed; otherwise
    /// the disclosure collapses first.
    pub fn activate_selected(&mut self) -> Option<u32> {
        let selected = self.selected_bookmark()?;
        let page = selected.page_number;

        // Collapse first, whether the disclosed item is this one or another
        if self.disclosed.is_some() {
            self.disclosed = None;
            return None;
        }

        Some(page)
    }

    /// Ask for confirmation before deleting the disclosed item
    ///
    /// Delete is a disclosed action: ignored unless the selected item's
    /// actions are showing.
    pub fn request_delete(&mut self) {
        let Some(selected) = self.selected_bookmark() else {
            return;
        };
        if self.disclosed != Some(selected.id) {
            return;
        }
        self.confirm_target = Some(selected.id);
        self.input_mode = InputMode::ConfirmDelete;
    }

    /// The edit affordance: present but not functional
    pub fn request_edit(&mut self) {
        let Some(selected) = self.selected_bookmark() else {
            return;
        };
        if self.disclosed != Some(selected.id) {
            return;
        }
        self.set_status("Edit is not implemented");
    }

    /// Resolve the delete confirmation
    ///
    /// Cancel leaves everything unchanged (the disclosure stays open);
    /// accept deletes and collapses the disclosure. A failed delete is
    /// logged only.
    pub fn confirm_delete(&mut self, store: &mut Store, accept: bool) {
        let target = self.confirm_target.take();
        self.input_mode = InputMode::Normal;

        if !accept {
            return;
        }

        if let Some(id) = target {
            match store.delete(id) {
                Ok(true) => self.set_status("Maqam deleted"),
                Ok(false) => {}
                Err(e) => error!("Failed to delete bookmark: {}", e),
            }
            self.disclosed = None;
        }
    }
}
