//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Which keys do what depends
//! on the active screen, and on the feed screen, on whether the search box
//! is open.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist).
//! 2. Add a `KeyCode` match arm in the handler for its screen.
//! 3. Update the help text in [`crate::ui`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Screen};

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit = true;
        return;
    }

    match app.screen {
        Screen::Login(_) => handle_login_key(app, key),
        Screen::Feed if app.search.active => handle_search_key(app, key),
        Screen::Feed => handle_feed_key(app, key),
        Screen::Detail(_) => handle_detail_key(app, key),
    }
}

fn handle_login_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.quit = true,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.login_toggle_field();
        }
        KeyCode::Enter => app.submit_login(),
        KeyCode::Backspace => app.login_backspace(),
        KeyCode::Char(c) => app.login_input(c),
        _ => {}
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.submit_search(),
        KeyCode::Backspace => app.search_backspace(),
        KeyCode::Char(c) => app.search_input(c),
        _ => {}
    }
}

fn handle_feed_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('r') | KeyCode::F(5) => app.refresh(),
        KeyCode::Char('/') => app.begin_search(),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Char('L') => app.logout(),
        _ => {}
    }
}

fn handle_detail_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit = true,
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => {
            app.close_detail();
        }
        KeyCode::Down | KeyCode::Char('j') => app.scroll_detail(true),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_detail(false),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use crossterm::event::KeyEventState;
    use tokio::runtime::Handle;

    use super::*;
    use crate::app::{LoginField, Services};
    use crate::auth::TokenStore;
    use crate::source::{
        Authenticator, DishDetail, DishDetailSource, DishListSource, FetchError, LoginRequest,
        LoginResponse, PageRequest, PageResult,
    };

    /// Never answers anything useful; input tests don't wait for results.
    struct Offline;

    #[async_trait]
    impl DishListSource for Offline {
        async fn fetch_page(&self, _: &PageRequest) -> Result<PageResult, FetchError> {
            Err(FetchError::Network("offline".into()))
        }
    }

    #[async_trait]
    impl DishDetailSource for Offline {
        async fn fetch_detail(&self, _: i64) -> Result<DishDetail, FetchError> {
            Err(FetchError::Network("offline".into()))
        }
    }

    #[async_trait]
    impl Authenticator for Offline {
        async fn login(&self, _: &LoginRequest) -> Result<LoginResponse, FetchError> {
            Err(FetchError::Network("offline".into()))
        }
    }

    fn app(dir: &tempfile::TempDir) -> App {
        let tokens = TokenStore::new(dir.path().join("session.json"));
        App::new(
            Services::from_shared(Arc::new(Offline)),
            tokens,
            Handle::current(),
            10,
        )
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn release_events_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        let mut key = press(KeyCode::Esc);
        key.kind = KeyEventKind::Release;
        key.state = KeyEventState::NONE;

        handle_key_event(&mut app, key);
        assert!(!app.quit);
    }

    #[tokio::test]
    async fn ctrl_c_quits_from_any_screen() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.quit);
    }

    #[tokio::test]
    async fn login_keys_fill_the_focused_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);

        handle_key_event(&mut app, press(KeyCode::Char('q')));
        handle_key_event(&mut app, press(KeyCode::Tab));
        handle_key_event(&mut app, press(KeyCode::Char('p')));

        let Screen::Login(form) = &app.screen else {
            panic!("expected login");
        };
        assert!(!app.quit, "q is text on the login screen");
        assert_eq!(form.username, "q");
        assert_eq!(form.password, "p");
        assert_eq!(form.focus, LoginField::Password);
    }

    #[tokio::test]
    async fn slash_opens_search_and_typing_goes_to_the_box() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.screen = Screen::Feed;

        handle_key_event(&mut app, press(KeyCode::Char('/')));
        assert!(app.search.active);
        handle_key_event(&mut app, press(KeyCode::Char('q')));
        assert_eq!(app.search.input, "q");
        assert!(!app.quit);

        handle_key_event(&mut app, press(KeyCode::Esc));
        assert!(!app.search.active);
        handle_key_event(&mut app, press(KeyCode::Char('q')));
        assert!(app.quit);
    }

    #[tokio::test]
    async fn logout_key_returns_to_login() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.screen = Screen::Feed;

        handle_key_event(&mut app, press(KeyCode::Char('L')));
        assert!(matches!(app.screen, Screen::Login(_)));
    }
}
