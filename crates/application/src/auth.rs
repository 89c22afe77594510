//! Authentication gate.
//!
//! The gate owns the session user and the state of the single in-flight
//! login attempt. The network call itself happens elsewhere; the gate only
//! hands out tickets and applies outcomes that match the pending one.

use std::rc::Rc;

use adminshell_core::SessionUser;
use adminshell_gateway::{LoginError, LoginTicket};
use adminshell_storage::{KvStore, keys};

use crate::notify::{Notifier, ShellEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated(SessionUser),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginRequest {
    Idle,
    Pending {
        ticket: LoginTicket,
        username: String,
        remember: bool,
    },
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginCompletion {
    Authenticated(SessionUser),
    Failed(String),
    /// The outcome belonged to an abandoned or superseded attempt.
    Stale,
}

#[derive(Debug)]
pub struct AuthGate {
    durable: Rc<KvStore>,
    ephemeral: Rc<KvStore>,
    notifier: Notifier,
    state: AuthState,
    request: LoginRequest,
    next_ticket: u64,
}

impl AuthGate {
    /// Restores a previously saved user, durable storage first.
    pub fn restore(durable: Rc<KvStore>, ephemeral: Rc<KvStore>, notifier: Notifier) -> Self {
        let saved: Option<SessionUser> = durable
            .read(keys::USER, None)
            .or_else(|| ephemeral.read(keys::USER, None));

        let state = match saved {
            Some(user) => {
                tracing::info!(username = %user.username, "restored session");
                AuthState::Authenticated(user)
            }
            None => AuthState::Anonymous,
        };

        Self {
            durable,
            ephemeral,
            notifier,
            state,
            request: LoginRequest::Idle,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match &self.state {
            AuthState::Authenticated(user) => Some(user),
            AuthState::Anonymous => None,
        }
    }

    pub fn request(&self) -> &LoginRequest {
        &self.request
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.request, LoginRequest::Pending { .. })
    }

    /// Starts a login attempt. Returns `None` while another one is pending.
    pub fn begin_login(&mut self, username: &str, remember: bool) -> Option<LoginTicket> {
        if self.is_pending() {
            tracing::debug!("login already in flight");
            return None;
        }
        let ticket = LoginTicket(self.next_ticket);
        self.next_ticket += 1;
        self.request = LoginRequest::Pending {
            ticket,
            username: username.to_string(),
            remember,
        };
        tracing::debug!(ticket = ticket.0, username, remember, "login pending");
        Some(ticket)
    }

    /// Abandons the pending attempt; its outcome will be treated as stale.
    pub fn cancel_login(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        tracing::debug!("login cancelled");
        self.request = LoginRequest::Idle;
        true
    }

    pub fn complete_login(
        &mut self,
        ticket: LoginTicket,
        result: Result<SessionUser, LoginError>,
    ) -> LoginCompletion {
        let remember = match &self.request {
            LoginRequest::Pending {
                ticket: pending,
                remember,
                ..
            } if *pending == ticket => *remember,
            _ => {
                tracing::debug!(ticket = ticket.0, "dropping stale login outcome");
                return LoginCompletion::Stale;
            }
        };

        match result {
            Ok(user) => {
                let store = if remember {
                    &self.durable
                } else {
                    &self.ephemeral
                };
                store.write(keys::USER, &user);
                tracing::info!(username = %user.username, scope = %store.scope(), "logged in");

                self.state = AuthState::Authenticated(user.clone());
                self.request = LoginRequest::Succeeded;
                self.notifier
                    .publish(ShellEvent::AuthChanged(Some(user.clone())));
                LoginCompletion::Authenticated(user)
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(ticket = ticket.0, ?err, "login failed");
                self.request = LoginRequest::Failed(message.clone());
                self.notifier.publish(ShellEvent::LoginFailed(message.clone()));
                LoginCompletion::Failed(message)
            }
        }
    }

    pub fn logout(&mut self) {
        self.durable.remove(keys::USER);
        self.ephemeral.remove(keys::USER);
        if let Some(user) = self.user() {
            tracing::info!(username = %user.username, "logged out");
        }
        self.state = AuthState::Anonymous;
        self.request = LoginRequest::Idle;
        self.notifier.publish(ShellEvent::AuthChanged(None));
    }
}
