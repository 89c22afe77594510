//! Route surface: one public login screen, everything else protected.

use crate::menu;

pub const LOGIN_PATH: &str = "/login";
pub const ROOT_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
}

impl Location {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
        }
    }

    pub fn root() -> Self {
        Self::new(ROOT_PATH)
    }

    pub fn login() -> Self {
        Self::new(LOGIN_PATH)
    }

    pub fn route(&self) -> Route {
        Route::parse(&self.path)
    }

    /// Menu key named by the first path segment, if the menu knows it.
    pub fn tab_key(&self) -> Option<&'static str> {
        let segment = self
            .path
            .trim_start_matches('/')
            .split('/')
            .next()
            .filter(|s| !s.is_empty())?;
        menu::find(segment).filter(|node| !node.is_group()).map(|node| node.key)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Protected(String),
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let path = normalize_path(path);
        if path == LOGIN_PATH {
            Route::Login
        } else {
            Route::Protected(path)
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login)
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return ROOT_PATH.to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
