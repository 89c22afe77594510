//! Core domain types for the admin shell.

use serde::{Deserialize, Serialize};

pub mod menu;
pub mod route;

pub use menu::{MENU, MenuNode};
pub use route::{Location, Route};

/// Key of the home tab. It is always open and never closable.
pub const HOME_TAB_KEY: &str = "dashboard";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabDescriptor {
    pub key: String,
    pub label: String,
}

impl TabDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    pub fn home() -> Self {
        Self::new(HOME_TAB_KEY, menu::resolve_label(HOME_TAB_KEY))
    }

    pub fn is_home(&self) -> bool {
        self.key == HOME_TAB_KEY
    }

    pub fn content(&self) -> TabContent {
        TabContent::for_key(&self.key)
    }
}

/// The default open-tab list on first run.
pub fn default_tabs() -> Vec<TabDescriptor> {
    vec![TabDescriptor::home()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
}

impl SessionUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// What the content pane shows for a tab. Keys without a dedicated view
/// fall back to `Placeholder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabContent {
    Dashboard,
    UserList,
    UserGroup,
    SystemConfig,
    Permission,
    Placeholder(String),
}

impl TabContent {
    pub fn for_key(key: &str) -> Self {
        match key {
            HOME_TAB_KEY => TabContent::Dashboard,
            "user-list" => TabContent::UserList,
            "user-group" => TabContent::UserGroup,
            "system" => TabContent::SystemConfig,
            "permission" => TabContent::Permission,
            other => TabContent::Placeholder(other.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            TabContent::Dashboard => HOME_TAB_KEY,
            TabContent::UserList => "user-list",
            TabContent::UserGroup => "user-group",
            TabContent::SystemConfig => "system",
            TabContent::Permission => "permission",
            TabContent::Placeholder(key) => key,
        }
    }

    pub fn body(&self) -> String {
        match self {
            TabContent::Dashboard => "仪表盘内容".to_string(),
            other => format!("{} 内容", other.key()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeClass {
    Dark,
    Light,
}

impl ThemeClass {
    pub fn from_dark(dark: bool) -> Self {
        if dark { ThemeClass::Dark } else { ThemeClass::Light }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, ThemeClass::Dark)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeClass::Dark => "dark",
            ThemeClass::Light => "light",
        }
    }
}

impl std::fmt::Display for ThemeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThemeClass {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(ThemeClass::Dark),
            "light" => Ok(ThemeClass::Light),
            _ => Err("unknown theme class"),
        }
    }
}

/// Who is responsible for keeping the home tab open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HomeTabPolicy {
    /// The tab manager refuses to close the home tab.
    Pinned,
    /// Only the presentation hides the home close control.
    PresentationOnly,
}

impl HomeTabPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeTabPolicy::Pinned => "pinned",
            HomeTabPolicy::PresentationOnly => "presentation-only",
        }
    }
}

impl std::fmt::Display for HomeTabPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HomeTabPolicy {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pinned" => Ok(HomeTabPolicy::Pinned),
            "presentation-only" | "presentation" => Ok(HomeTabPolicy::PresentationOnly),
            _ => Err("unknown home tab policy"),
        }
    }
}

pub const DEFAULT_LOGIN_URL: &str = "http://127.0.0.1:8080/api/login";
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub login_url: String,
    pub login_timeout_secs: u64,
    pub home_tab_policy: HomeTabPolicy,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            login_timeout_secs: DEFAULT_LOGIN_TIMEOUT_SECS,
            home_tab_policy: HomeTabPolicy::Pinned,
        }
    }
}

impl ShellConfig {
    pub fn normalize(&mut self) {
        self.login_timeout_secs = self.login_timeout_secs.clamp(1, 300);
        self.login_url = self.login_url.trim().to_string();
        if self.login_url.is_empty() {
            self.login_url = DEFAULT_LOGIN_URL.to_string();
        }
    }

    pub fn login_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.login_timeout_secs)
    }
}
