//! Application orchestration layer for the admin shell.

use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use adminshell_core::{Location, Route, ShellConfig, menu};
use adminshell_gateway::{Authenticator, Credentials, LoginWorker};
use adminshell_storage::KvStore;

pub mod auth;
pub mod guard;
pub mod notify;
pub mod tabs;
pub mod theme;

pub use auth::{AuthGate, AuthState, LoginCompletion, LoginRequest};
pub use guard::{GuardDecision, Navigator, RouteGuard};
pub use notify::{Notifier, ShellEvent};
pub use tabs::TabManager;
pub use theme::ThemeManager;

/// Owns every piece of shell state and is the only way to change it.
#[derive(Debug)]
pub struct Shell {
    notifier: Notifier,
    tabs: TabManager,
    theme: ThemeManager,
    auth: AuthGate,
    navigator: Navigator,
    worker: LoginWorker,
}

impl Shell {
    pub fn new(
        config: ShellConfig,
        durable: KvStore,
        ephemeral: KvStore,
        authenticator: Arc<dyn Authenticator>,
        start: Location,
    ) -> Self {
        let durable = Rc::new(durable);
        let ephemeral = Rc::new(ephemeral);
        let notifier = Notifier::new();

        let tabs = TabManager::load(
            Rc::clone(&durable),
            notifier.clone(),
            config.home_tab_policy,
        );
        let theme = ThemeManager::load(Rc::clone(&durable), notifier.clone());
        let auth = AuthGate::restore(durable, ephemeral, notifier.clone());

        Self {
            notifier,
            tabs,
            theme,
            auth,
            navigator: Navigator::new(start),
            worker: LoginWorker::new(authenticator),
        }
    }

    pub fn subscribe(&self) -> Receiver<ShellEvent> {
        self.notifier.subscribe()
    }

    pub fn tabs(&self) -> &TabManager {
        &self.tabs
    }

    pub fn theme(&self) -> &ThemeManager {
        &self.theme
    }

    pub fn auth(&self) -> &AuthGate {
        &self.auth
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Guards the current location and returns what to render. A fresh
    /// arrival at a protected path naming a menu entry opens that tab.
    pub fn route(&mut self) -> Route {
        let route = self.navigator.resolve(&self.auth);
        if self.navigator.take_arrival() {
            let location = self.navigator.location().clone();
            if let Route::Protected(_) = route
                && let Some(key) = location.tab_key()
            {
                self.tabs.open(key);
            }
            self.notifier.publish(ShellEvent::Navigated(location));
        }
        route
    }

    pub fn navigate(&mut self, location: Location) {
        self.navigator.navigate(location);
    }

    /// Opens the tab for a menu entry. Group headers are not tabs.
    pub fn menu_select(&mut self, key: &str) -> bool {
        if menu::find(key).is_some_and(|node| node.is_group()) {
            return false;
        }
        self.tabs.open(key);
        true
    }

    pub fn switch_tab(&mut self, key: &str) {
        self.tabs.switch_to(key);
    }

    pub fn close_tab(&mut self, key: &str) -> bool {
        self.tabs.close(key)
    }

    pub fn cycle_tab(&mut self, forward: bool) {
        self.tabs.cycle(forward);
    }

    pub fn toggle_sidebar(&mut self) {
        self.tabs.toggle_collapsed();
    }

    pub fn toggle_theme(&mut self) {
        self.theme.toggle();
    }

    /// Starts a login in the background. Returns `false` if one is already
    /// running.
    pub fn submit_login(&mut self, username: &str, password: &str, remember: bool) -> bool {
        let Some(ticket) = self.auth.begin_login(username, remember) else {
            return false;
        };
        self.worker
            .submit(ticket, Credentials::new(username, password));
        true
    }

    pub fn cancel_login(&mut self) -> bool {
        self.auth.cancel_login()
    }

    /// Applies the next finished login, skipping stale ones.
    pub fn poll_login(&mut self) -> Option<LoginCompletion> {
        while let Some(outcome) = self.worker.try_recv() {
            if let Some(completion) = self.apply_login(outcome) {
                return Some(completion);
            }
        }
        None
    }

    /// Blocks up to `timeout` for the pending login to finish.
    pub fn wait_login(&mut self, timeout: Duration) -> Option<LoginCompletion> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let outcome = self.worker.recv_timeout(remaining)?;
            if let Some(completion) = self.apply_login(outcome) {
                return Some(completion);
            }
        }
    }

    fn apply_login(&mut self, outcome: adminshell_gateway::LoginOutcome) -> Option<LoginCompletion> {
        match self.auth.complete_login(outcome.ticket, outcome.result) {
            LoginCompletion::Stale => None,
            completion => {
                if let LoginCompletion::Authenticated(_) = completion {
                    let target = self.navigator.finish_login();
                    tracing::debug!(%target, "returning after login");
                }
                Some(completion)
            }
        }
    }

    /// Signs out and parks the navigator at the root, so the next login
    /// does not replay the location the session started from.
    pub fn logout(&mut self) {
        self.auth.logout();
        self.navigator.navigate(Location::root());
    }
}
