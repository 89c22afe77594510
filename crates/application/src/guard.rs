use adminshell_core::{Location, Route};

use crate::auth::AuthGate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    Redirect { to: Location, from: Location },
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn check(auth: &AuthGate, location: &Location) -> GuardDecision {
        let route = location.route();
        if route.is_public() || auth.is_authenticated() {
            GuardDecision::Render(route)
        } else {
            GuardDecision::Redirect {
                to: Location::login(),
                from: location.clone(),
            }
        }
    }
}

/// Current location plus the destination captured by the last redirect.
#[derive(Debug, Clone)]
pub struct Navigator {
    location: Location,
    from: Option<Location>,
    arrived: bool,
}

impl Navigator {
    pub fn new(start: Location) -> Self {
        Self {
            location: start,
            from: None,
            arrived: true,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn from(&self) -> Option<&Location> {
        self.from.as_ref()
    }

    pub fn navigate(&mut self, location: Location) {
        self.location = location;
        self.arrived = true;
    }

    /// Runs the guard for the current location, following a redirect if
    /// one is required, and returns the route to render.
    pub fn resolve(&mut self, auth: &AuthGate) -> Route {
        match RouteGuard::check(auth, &self.location) {
            GuardDecision::Render(route) => route,
            GuardDecision::Redirect { to, from } => {
                tracing::debug!(%from, %to, "redirect");
                self.from = Some(from);
                self.navigate(to);
                Route::Login
            }
        }
    }

    /// Returns to the location captured before the login redirect, or the
    /// root when there was none.
    pub fn finish_login(&mut self) -> Location {
        let target = self.from.take().unwrap_or_else(Location::root);
        self.navigate(target.clone());
        target
    }

    /// True once per navigation; used to apply a location's side effects
    /// (such as opening its tab) a single time.
    pub fn take_arrival(&mut self) -> bool {
        std::mem::take(&mut self.arrived)
    }
}
