//! Test helpers and fixtures.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use adminshell_application::Shell;
use adminshell_core::{Location, SessionUser, ShellConfig};
use adminshell_gateway::{Authenticator, Credentials, LoginError};
use adminshell_storage::KvStore;

/// Accepts a fixed set of username/password pairs.
#[derive(Debug, Default)]
pub struct ScriptedAuthenticator {
    accounts: HashMap<String, String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, username: &str, password: &str) -> Self {
        self.accounts
            .insert(username.to_string(), password.to_string());
        self
    }

    /// Sleeps before answering, like a slow server.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Authenticator for ScriptedAuthenticator {
    fn login(&self, credentials: &Credentials) -> Result<SessionUser, LoginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match self.accounts.get(&credentials.username) {
            Some(password) if *password == credentials.password => {
                Ok(SessionUser::new(credentials.username.clone()))
            }
            _ => Err(LoginError::Rejected { status: 401 }),
        }
    }
}

pub fn admin_authenticator() -> Arc<ScriptedAuthenticator> {
    Arc::new(ScriptedAuthenticator::new().with_account("admin", "admin123"))
}

pub fn memory_store() -> KvStore {
    KvStore::ephemeral().expect("in-memory store")
}

pub fn file_store(path: &Path) -> KvStore {
    KvStore::open(path).expect("file store")
}

pub fn make_shell(
    durable: KvStore,
    ephemeral: KvStore,
    authenticator: Arc<dyn Authenticator>,
    start: &str,
) -> Shell {
    Shell::new(
        ShellConfig::default(),
        durable,
        ephemeral,
        authenticator,
        Location::new(start),
    )
}

/// A shell over fresh in-memory stores that accepts `admin`/`admin123`.
pub fn fresh_shell(start: &str) -> Shell {
    make_shell(
        memory_store(),
        memory_store(),
        admin_authenticator(),
        start,
    )
}

#[cfg(test)]
mod tests {
    use adminshell_application::{LoginCompletion, LoginRequest, ShellEvent};
    use adminshell_core::{Route, TabDescriptor};
    use adminshell_storage::keys;

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn fresh_load_has_defaults() {
        let mut shell = fresh_shell("/");
        assert_eq!(shell.route(), Route::Login);
        assert_eq!(shell.tabs().active_key(), "dashboard");
        assert_eq!(shell.tabs().tabs(), &[TabDescriptor::new("dashboard", "仪表盘")]);
        assert!(!shell.tabs().collapsed());
        assert!(!shell.theme().is_dark());
    }

    #[test]
    fn opening_same_entry_twice_keeps_one_tab() {
        let mut shell = fresh_shell("/");
        shell.menu_select("user-list");
        shell.menu_select("user-list");
        let tabs = shell.tabs().tabs();
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[1], TabDescriptor::new("user-list", "用户列表"));
        assert_eq!(shell.tabs().active_key(), "user-list");
    }

    #[test]
    fn wrong_credentials_write_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("adminshell.db");
        let auth = admin_authenticator();
        let mut shell = make_shell(file_store(&db), memory_store(), auth.clone(), "/");
        shell.route();

        assert!(shell.submit_login("admin", "nope", true));
        assert_eq!(
            shell.wait_login(WAIT),
            Some(LoginCompletion::Failed("登录失败".to_string()))
        );
        assert_eq!(shell.auth().request(), &LoginRequest::Failed("登录失败".to_string()));
        assert!(!shell.auth().is_authenticated());
        assert_eq!(shell.route(), Route::Login);
        assert_eq!(auth.calls(), 1);

        drop(shell);
        assert!(!file_store(&db).contains(keys::USER));
    }

    #[test]
    fn session_only_login_ends_with_tab_context() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("adminshell.db");

        let mut shell = make_shell(file_store(&db), memory_store(), admin_authenticator(), "/");
        shell.route();
        assert!(shell.submit_login("admin", "admin123", false));
        assert!(matches!(
            shell.wait_login(WAIT),
            Some(LoginCompletion::Authenticated(_))
        ));
        assert!(shell.auth().is_authenticated());
        drop(shell);

        assert!(!file_store(&db).contains(keys::USER));

        let mut reopened = make_shell(file_store(&db), memory_store(), admin_authenticator(), "/");
        assert!(!reopened.auth().is_authenticated());
        assert_eq!(reopened.route(), Route::Login);
    }

    #[test]
    fn remembered_login_survives_restart() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("adminshell.db");

        let mut shell = make_shell(file_store(&db), memory_store(), admin_authenticator(), "/");
        shell.route();
        shell.submit_login("admin", "admin123", true);
        shell.wait_login(WAIT);
        shell.menu_select("permission");
        shell.toggle_theme();
        shell.toggle_sidebar();
        drop(shell);

        let mut reopened = make_shell(file_store(&db), memory_store(), admin_authenticator(), "/");
        assert_eq!(reopened.auth().user(), Some(&SessionUser::new("admin")));
        assert!(matches!(reopened.route(), Route::Protected(_)));
        assert_eq!(reopened.tabs().active_key(), "permission");
        assert_eq!(reopened.tabs().breadcrumb(), vec!["系统设置", "权限管理"]);
        assert!(reopened.theme().is_dark());
        assert!(reopened.tabs().collapsed());
    }

    #[test]
    fn superseded_attempt_is_ignored() {
        let auth = Arc::new(
            ScriptedAuthenticator::new()
                .with_account("admin", "admin123")
                .with_account("ops", "ops123")
                .with_delay(Duration::from_millis(50)),
        );
        let mut shell = make_shell(memory_store(), memory_store(), auth.clone(), "/");
        shell.route();

        assert!(shell.submit_login("admin", "admin123", false));
        assert!(shell.cancel_login());
        assert!(shell.submit_login("ops", "ops123", false));

        assert_eq!(
            shell.wait_login(WAIT),
            Some(LoginCompletion::Authenticated(SessionUser::new("ops")))
        );
        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(shell.poll_login(), None);
        assert_eq!(shell.auth().user(), Some(&SessionUser::new("ops")));
        assert_eq!(auth.calls(), 2);
    }

    #[test]
    fn protected_location_redirects_and_returns() {
        let mut shell = fresh_shell("/user-list");
        let events = shell.subscribe();

        assert_eq!(shell.route(), Route::Login);
        assert_eq!(shell.navigator().from(), Some(&Location::new("/user-list")));

        shell.submit_login("admin", "admin123", false);
        shell.wait_login(WAIT);
        assert_eq!(shell.route(), Route::Protected("/user-list".to_string()));
        assert_eq!(shell.tabs().active_key(), "user-list");

        let navigated: Vec<Location> = events
            .try_iter()
            .filter_map(|event| match event {
                ShellEvent::Navigated(location) => Some(location),
                _ => None,
            })
            .collect();
        assert_eq!(navigated.last(), Some(&Location::new("/user-list")));
    }

    #[test]
    fn relogin_keeps_tabs_closed_before_logout() {
        let mut shell = fresh_shell("/user-list");
        shell.route();
        shell.submit_login("admin", "admin123", false);
        shell.wait_login(WAIT);
        assert!(matches!(shell.route(), Route::Protected(_)));
        assert_eq!(shell.tabs().active_key(), "user-list");

        shell.menu_select("system");
        assert!(shell.close_tab("user-list"));
        shell.logout();
        assert_eq!(shell.route(), Route::Login);
        assert_eq!(shell.navigator().from(), Some(&Location::root()));

        shell.submit_login("admin", "admin123", false);
        shell.wait_login(WAIT);
        assert_eq!(shell.route(), Route::Protected("/".to_string()));

        let keys: Vec<&str> = shell.tabs().tabs().iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["dashboard", "system"]);
        assert_eq!(shell.tabs().active_key(), "system");
    }

    #[test]
    fn closing_tabs_never_drops_dashboard() {
        let mut shell = fresh_shell("/");
        for key in ["user-list", "system", "user-group"] {
            shell.menu_select(key);
        }
        assert!(!shell.close_tab("dashboard"));
        assert!(shell.close_tab("user-group"));
        assert_eq!(shell.tabs().active_key(), "system");
        assert!(shell.close_tab("system"));
        assert!(shell.close_tab("user-list"));
        assert_eq!(shell.tabs().tabs(), &[TabDescriptor::home()]);
        assert_eq!(shell.tabs().active_key(), "dashboard");
    }
}
