//! Reader screen state machine
//!
//! Tracks the page currently displayed by the reader and accepts
//! externally-requested page jumps. Lifecycle transitions are driven by
//! explicit enter/leave signals from the hosting UI; document resolution
//! completes asynchronously and is guarded by a mount token so results
//! arriving after the screen was left (or re-entered) are discarded.
//!
//! ```text
//! Unmounted --enter--> Loading --resolve_ready--> Ready
//!                         |                         |
//!                         +--resolve_error--> Error +--render_failed--> Error
//! ```
//!
//! Error is terminal for the mount: recovery is leaving and re-entering
//! the screen, which starts a fresh Loading pass. There is no automatic
//! retry and no resolution timeout.

use tracing::debug;

/// Lifecycle state of the reader screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerState {
    /// Screen is not focused; viewer resources are released
    Unmounted,
    /// Document asset is being resolved; a busy indicator is shown
    Loading,
    /// Document resolved; the viewer is rendered
    Ready,
    /// Resolution or rendering failed; terminal for this mount
    Error(String),
}

/// Guard token tying an asynchronous resolution to one mount
///
/// Tokens from a previous mount no longer match and their results are
/// dropped on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountToken(u64);

/// In-memory tracker for the reader's current page and mount lifecycle
#[derive(Debug)]
pub struct ViewerScreen {
    state: ViewerState,
    generation: u64,
    initial_page: u32,
    current_page: u32,
    page_count: Option<u32>,
}

impl ViewerScreen {
    pub fn new() -> Self {
        Self {
            state: ViewerState::Unmounted,
            generation: 0,
            initial_page: 1,
            current_page: 1,
            page_count: None,
        }
    }

    /// Mount the screen, starting document resolution
    ///
    /// `goto_page` is the navigation parameter (default 1): the page the
    /// viewer opens at once Ready. Cross-screen jumps always come through
    /// here as a fresh mount; an already-mounted instance is never
    /// scrolled from outside.
    pub fn enter(&mut self, goto_page: Option<u32>) -> MountToken {
        self.generation += 1;
        self.state = ViewerState::Loading;
        self.initial_page = goto_page.unwrap_or(1).max(1);
        self.current_page = self.initial_page;
        self.page_count = None;
        MountToken(self.generation)
    }

    /// Unmount the screen, releasing viewer resources
    ///
    /// Any in-flight resolution result becomes stale.
    pub fn leave(&mut self) {
        self.generation += 1;
        self.state = ViewerState::Unmounted;
        self.page_count = None;
    }

    /// Document resolved; enter Ready at the initial page
    ///
    /// Returns false (and changes nothing) when the token is stale or the
    /// screen is not waiting on a resolution.
    pub fn resolve_ready(&mut self, token: MountToken, page_count: u32) -> bool {
        if !self.accepts(token) {
            debug!(token = token.0, "discarding stale document resolution");
            return false;
        }
        self.page_count = Some(page_count);
        self.initial_page = self.initial_page.clamp(1, page_count.max(1));
        self.current_page = self.initial_page;
        self.state = ViewerState::Ready;
        true
    }

    /// Document resolution failed; enter Error
    pub fn resolve_error(&mut self, token: MountToken, message: impl Into<String>) -> bool {
        if !self.accepts(token) {
            debug!(token = token.0, "discarding stale resolution error");
            return false;
        }
        self.state = ViewerState::Error(message.into());
        true
    }

    fn accepts(&self, token: MountToken) -> bool {
        token.0 == self.generation && self.state == ViewerState::Loading
    }

    /// Page-change notification from the rendered viewer
    ///
    /// Ignored outside Ready; clamped into the document's range.
    pub fn page_changed(&mut self, page: u32) {
        if self.state != ViewerState::Ready {
            return;
        }
        let max = self.page_count.unwrap_or(1).max(1);
        self.current_page = page.clamp(1, max);
    }

    /// Viewer-internal rendering failure; terminal for this mount
    pub fn render_failed(&mut self, message: impl Into<String>) {
        if self.state == ViewerState::Ready {
            self.state = ViewerState::Error(message.into());
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ViewerState::Ready
    }

    /// The page currently displayed (meaningful in Ready; otherwise the
    /// page the next Ready will open at)
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_count(&self) -> Option<u32> {
        self.page_count
    }
}

impl Default for ViewerScreen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unmounted() {
        let screen = ViewerScreen::new();
        assert_eq!(*screen.state(), ViewerState::Unmounted);
        assert_eq!(screen.current_page(), 1);
    }

    #[test]
    fn test_enter_defaults_to_page_one() {
        let mut screen = ViewerScreen::new();
        let token = screen.enter(None);
        assert_eq!(*screen.state(), ViewerState::Loading);

        assert!(screen.resolve_ready(token, 614));
        assert!(screen.is_ready());
        assert_eq!(screen.current_page(), 1);
        assert_eq!(screen.page_count(), Some(614));
    }

    #[test]
    fn test_enter_with_goto_page() {
        let mut screen = ViewerScreen::new();
        let token = screen.enter(Some(42));
        screen.resolve_ready(token, 614);
        assert_eq!(screen.current_page(), 42);
    }

    #[test]
    fn test_goto_page_clamped_to_document() {
        let mut screen = ViewerScreen::new();
        let token = screen.enter(Some(700));
        screen.resolve_ready(token, 614);
        assert_eq!(screen.current_page(), 614);

        let token = screen.enter(Some(0));
        screen.resolve_ready(token, 614);
        assert_eq!(screen.current_page(), 1);
    }

    #[test]
    fn test_stale_token_after_leave_is_discarded() {
        let mut screen = ViewerScreen::new();
        let token = screen.enter(None);
        screen.leave();

        assert!(!screen.resolve_ready(token, 614));
        assert_eq!(*screen.state(), ViewerState::Unmounted);

        assert!(!screen.resolve_error(token, "too late"));
        assert_eq!(*screen.state(), ViewerState::Unmounted);
    }

    #[test]
    fn test_stale_token_after_reenter_is_discarded() {
        let mut screen = ViewerScreen::new();
        let first = screen.enter(Some(10));
        screen.leave();
        let second = screen.enter(Some(42));

        // The first mount's resolution arrives late
        assert!(!screen.resolve_ready(first, 614));
        assert_eq!(*screen.state(), ViewerState::Loading);

        assert!(screen.resolve_ready(second, 614));
        assert_eq!(screen.current_page(), 42);
    }

    #[test]
    fn test_resolution_error_is_terminal_for_mount() {
        let mut screen = ViewerScreen::new();
        let token = screen.enter(None);

        assert!(screen.resolve_error(token, "asset missing"));
        assert_eq!(
            *screen.state(),
            ViewerState::Error("asset missing".to_string())
        );

        // No recovery within the mount, even with the same token
        assert!(!screen.resolve_ready(token, 614));
        assert!(matches!(screen.state(), ViewerState::Error(_)));

        // Re-entering starts a fresh Loading pass
        let token = screen.enter(None);
        assert_eq!(*screen.state(), ViewerState::Loading);
        assert!(screen.resolve_ready(token, 614));
    }

    #[test]
    fn test_page_changed_tracks_and_clamps() {
        let mut screen = ViewerScreen::new();
        let token = screen.enter(None);
        screen.resolve_ready(token, 10);

        screen.page_changed(7);
        assert_eq!(screen.current_page(), 7);

        screen.page_changed(99);
        assert_eq!(screen.current_page(), 10);

        screen.page_changed(0);
        assert_eq!(screen.current_page(), 1);
    }

    #[test]
    fn test_page_changed_ignored_while_loading() {
        let mut screen = ViewerScreen::new();
        screen.enter(Some(5));
        screen.page_changed(9);
        assert_eq!(screen.current_page(), 5);
    }

    #[test]
    fn test_render_failed_only_from_ready() {
        let mut screen = ViewerScreen::new();

        screen.render_failed("no effect while unmounted");
        assert_eq!(*screen.state(), ViewerState::Unmounted);

        let token = screen.enter(None);
        screen.resolve_ready(token, 10);
        screen.render_failed("renderer exploded");
        assert_eq!(
            *screen.state(),
            ViewerState::Error("renderer exploded".to_string())
        );
    }
}
