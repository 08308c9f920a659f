use std::sync::Arc;

use chrono::{DateTime, Local};
use ratatui::widgets::ListState;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::{Session, TokenStore};
use crate::feed::{FeedController, FeedSignals};
use crate::source::{
    Authenticator, DishDetail, DishDetailSource, DishListSource, FetchError, LoginRequest,
    LoginResponse,
};

/// The collaborators the app talks to.
#[derive(Clone)]
pub struct Services {
    pub dishes: Arc<dyn DishListSource>,
    pub details: Arc<dyn DishDetailSource>,
    pub auth: Arc<dyn Authenticator>,
}

impl Services {
    /// Use one backend for everything.
    pub fn from_shared<T>(backend: Arc<T>) -> Self
    where
        T: DishListSource + DishDetailSource + Authenticator + 'static,
    {
        Self {
            dishes: backend.clone(),
            details: backend.clone(),
            auth: backend,
        }
    }
}

/// Results of background work other than feed pages.
#[derive(Debug)]
pub enum AppEvent {
    LoggedIn(Result<LoginResponse, FetchError>),
    DetailLoaded {
        dish_id: i64,
        outcome: Result<DishDetail, FetchError>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub focus: LoginField,
    pub submitting: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct DetailView {
    pub dish_id: i64,
    /// Name from the list, shown until the detail arrives.
    pub title: String,
    pub loading: bool,
    pub detail: Option<DishDetail>,
    pub error: Option<String>,
    pub scroll: u16,
}

#[derive(Debug)]
pub enum Screen {
    Login(LoginForm),
    Feed,
    Detail(DetailView),
}

#[derive(Debug, Default)]
pub struct SearchBox {
    pub active: bool,
    pub input: String,
}

pub struct App {
    pub screen: Screen,
    pub feed: FeedController,
    /// Published feed state; rendering reads only from here.
    pub signals: FeedSignals,
    /// List selection state for scrolling.
    pub list_state: ListState,
    pub search: SearchBox,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last notable event, shown in the status bar.
    pub status: String,
    /// When the item list last changed.
    pub last_updated: Option<DateTime<Local>>,
    /// A search arrived while a page was in flight; reload once it lands.
    refresh_pending: bool,
    page_size: u32,
    services: Services,
    tokens: TokenStore,
    runtime: Handle,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    /// Start on the feed if a session is stored, otherwise on login.
    pub fn new(services: Services, tokens: TokenStore, runtime: Handle, page_size: u32) -> Self {
        let feed = FeedController::new(services.dishes.clone(), runtime.clone(), page_size);
        let signals = feed.signals();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let logged_in = tokens.has_token();

        let mut app = Self {
            screen: if logged_in {
                Screen::Feed
            } else {
                Screen::Login(LoginForm::default())
            },
            feed,
            signals,
            list_state: ListState::default(),
            search: SearchBox::default(),
            quit: false,
            status: "Starting…".into(),
            last_updated: None,
            refresh_pending: false,
            page_size,
            services,
            tokens,
            runtime,
            events_tx,
            events_rx,
        };
        if logged_in {
            app.refresh();
        }
        app
    }

    /// Apply everything background work has produced since the last tick.
    ///
    /// Called once per frame by the event loop.
    pub fn tick(&mut self) {
        self.feed.poll_completions();
        if self.refresh_pending && !self.feed.is_loading() {
            self.refresh_pending = false;
            self.feed.request_load(true);
        }

        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }

        if self.signals.items.has_changed().unwrap_or(false) {
            let count = self.signals.items.borrow_and_update().len();
            debug!(
                count,
                next_page = self.feed.current_page(),
                last_page = self.feed.is_last_page(),
                "feed updated"
            );
            self.last_updated = Some(Local::now());
            self.status = format!("Loaded {count} dishes");
            self.clamp_selection(count);
        }
        if self.signals.error.has_changed().unwrap_or(false) {
            if let Some(err) = self.signals.error.borrow_and_update().clone() {
                self.status = err;
            }
        }
    }

    pub fn item_count(&self) -> usize {
        self.signals.items.borrow().len()
    }

    pub fn is_loading(&self) -> bool {
        *self.signals.loading.borrow()
    }

    fn clamp_selection(&mut self, count: usize) {
        match self.list_state.selected() {
            _ if count == 0 => self.list_state.select(None),
            Some(i) if i >= count => self.list_state.select(Some(count - 1)),
            None => self.list_state.select(Some(0)),
            Some(_) => {}
        }
    }

    // -- feed triggers -------------------------------------------------------

    /// Pull-to-refresh.
    pub fn refresh(&mut self) {
        self.feed.request_load(true);
    }

    fn load_more(&mut self) {
        self.feed.request_load(false);
    }

    // -- navigation ----------------------------------------------------------

    /// Move down one row.  Trying to move past the bottom loads the next page.
    pub fn select_next(&mut self) {
        let len = self.item_count();
        if len == 0 {
            self.load_more();
            return;
        }
        match self.list_state.selected() {
            Some(i) if i + 1 >= len => self.load_more(),
            Some(i) => self.list_state.select(Some(i + 1)),
            None => self.list_state.select(Some(0)),
        }
    }

    pub fn select_previous(&mut self) {
        if self.item_count() == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if self.item_count() > 0 {
            self.list_state.select(Some(0));
        }
    }

    /// Jump to the bottom, which also asks for the next page.
    pub fn select_last(&mut self) {
        let len = self.item_count();
        if len > 0 {
            self.list_state.select(Some(len - 1));
        }
        self.load_more();
    }

    // -- search --------------------------------------------------------------

    pub fn begin_search(&mut self) {
        self.search.active = true;
    }

    pub fn cancel_search(&mut self) {
        self.search.active = false;
    }

    pub fn search_input(&mut self, c: char) {
        self.search.input.push(c);
    }

    /// Erasing the last character clears the filter straight away.
    pub fn search_backspace(&mut self) {
        if self.search.input.pop().is_some() && self.search.input.is_empty() {
            self.apply_search(None);
        }
    }

    pub fn submit_search(&mut self) {
        self.search.active = false;
        let query = self.search.input.clone();
        self.apply_search(Some(&query));
    }

    fn apply_search(&mut self, query: Option<&str>) {
        if !self.feed.search(query) {
            debug!(?query, "search stored while a page is in flight; reload deferred");
            self.refresh_pending = true;
        }
        self.list_state.select(None);
    }

    // -- detail --------------------------------------------------------------

    /// Open the selected dish and start fetching its detail.
    pub fn open_selected(&mut self) {
        let Some(index) = self.list_state.selected() else {
            return;
        };
        let Some(dish) = self.signals.items.borrow().get(index).cloned() else {
            return;
        };

        let dish_id = dish.id;
        self.screen = Screen::Detail(DetailView {
            dish_id,
            title: dish.name,
            loading: true,
            detail: None,
            error: None,
            scroll: 0,
        });

        let details = Arc::clone(&self.services.details);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let outcome = details.fetch_detail(dish_id).await;
            if tx.send(AppEvent::DetailLoaded { dish_id, outcome }).is_err() {
                debug!(dish_id, "app dropped; detail discarded");
            }
        });
    }

    pub fn close_detail(&mut self) {
        if matches!(self.screen, Screen::Detail(_)) {
            self.screen = Screen::Feed;
        }
    }

    pub fn scroll_detail(&mut self, down: bool) {
        if let Screen::Detail(view) = &mut self.screen {
            view.scroll = if down {
                view.scroll.saturating_add(1)
            } else {
                view.scroll.saturating_sub(1)
            };
        }
    }

    // -- login / logout ------------------------------------------------------

    pub fn login_input(&mut self, c: char) {
        if let Screen::Login(form) = &mut self.screen {
            match form.focus {
                LoginField::Username => form.username.push(c),
                LoginField::Password => form.password.push(c),
            }
        }
    }

    pub fn login_backspace(&mut self) {
        if let Screen::Login(form) = &mut self.screen {
            match form.focus {
                LoginField::Username => form.username.pop(),
                LoginField::Password => form.password.pop(),
            };
        }
    }

    pub fn login_toggle_field(&mut self) {
        if let Screen::Login(form) = &mut self.screen {
            form.focus = match form.focus {
                LoginField::Username => LoginField::Password,
                LoginField::Password => LoginField::Username,
            };
        }
    }

    pub fn submit_login(&mut self) {
        let Screen::Login(form) = &mut self.screen else {
            return;
        };
        if form.submitting {
            return;
        }
        if form.username.trim().is_empty() || form.password.is_empty() {
            form.error = Some("Enter login and password".into());
            return;
        }
        form.submitting = true;
        form.error = None;

        let request = LoginRequest {
            login: form.username.trim().to_string(),
            password: form.password.clone(),
        };
        let auth = Arc::clone(&self.services.auth);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let outcome = auth.login(&request).await;
            if tx.send(AppEvent::LoggedIn(outcome)).is_err() {
                debug!("app dropped; login result discarded");
            }
        });
    }

    /// End the session.  The feed is rebuilt, so nothing from this session
    /// (items, cursor, search term, or a page still in flight) reaches the next.
    pub fn logout(&mut self) {
        if let Err(err) = self.tokens.clear() {
            warn!(%err, "failed to clear session");
        }
        info!("logged out");
        self.feed = FeedController::new(
            Arc::clone(&self.services.dishes),
            self.runtime.clone(),
            self.page_size,
        );
        self.signals = self.feed.signals();
        self.list_state = ListState::default();
        self.last_updated = None;
        self.search = SearchBox::default();
        self.refresh_pending = false;
        self.screen = Screen::Login(LoginForm::default());
        self.status = "Logged out".into();
    }

    // -- background results --------------------------------------------------

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::LoggedIn(outcome) => self.handle_login(outcome),
            AppEvent::DetailLoaded { dish_id, outcome } => match &mut self.screen {
                Screen::Detail(view) if view.dish_id == dish_id => {
                    view.loading = false;
                    match outcome {
                        Ok(detail) => view.detail = Some(detail),
                        Err(err) => {
                            warn!(dish_id, %err, "detail fetch failed");
                            view.error = Some(err.describe("Failed to load dish details"));
                        }
                    }
                }
                _ => debug!(dish_id, "detail screen closed; result discarded"),
            },
        }
    }

    fn handle_login(&mut self, outcome: Result<LoginResponse, FetchError>) {
        let Screen::Login(form) = &mut self.screen else {
            debug!("login screen closed; result discarded");
            return;
        };
        form.submitting = false;

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "login failed");
                form.error = Some(err.describe("Invalid credentials"));
                return;
            }
        };

        let login = response.login.clone();
        if let Err(err) = self.tokens.save(&Session::from(response)) {
            form.error = Some(format!("Failed to save session: {err}"));
            return;
        }

        info!(%login, "logged in");
        self.status = format!("Signed in as {login}");
        self.screen = Screen::Feed;
        if !self.feed.request_load(true) {
            self.refresh_pending = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
