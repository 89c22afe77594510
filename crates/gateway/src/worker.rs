use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use adminshell_core::SessionUser;

use crate::{Authenticator, Credentials, LoginError, LoginTicket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub ticket: LoginTicket,
    pub result: Result<SessionUser, LoginError>,
}

/// Runs login attempts off the UI thread. Each submission gets its own
/// thread; outcomes come back in completion order.
pub struct LoginWorker {
    authenticator: Arc<dyn Authenticator>,
    tx: Sender<LoginOutcome>,
    rx: Receiver<LoginOutcome>,
}

impl LoginWorker {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            authenticator,
            tx,
            rx,
        }
    }

    pub fn submit(&self, ticket: LoginTicket, credentials: Credentials) {
        let authenticator = Arc::clone(&self.authenticator);
        let tx = self.tx.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("login-{}", ticket.0))
            .spawn(move || {
                let result = authenticator.login(&credentials);
                // The receiver is gone only when the worker was dropped.
                let _ = tx.send(LoginOutcome { ticket, result });
            });

        if let Err(err) = spawned {
            tracing::warn!(ticket = ticket.0, "failed to spawn login thread: {err}");
            let _ = self.tx.send(LoginOutcome {
                ticket,
                result: Err(LoginError::Interrupted),
            });
        }
    }

    pub fn try_recv(&self) -> Option<LoginOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<LoginOutcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl std::fmt::Debug for LoginWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginWorker").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoAuthenticator;

    impl Authenticator for EchoAuthenticator {
        fn login(&self, credentials: &Credentials) -> Result<SessionUser, LoginError> {
            if credentials.password == "secret" {
                Ok(SessionUser::new(credentials.username.clone()))
            } else {
                Err(LoginError::Rejected { status: 401 })
            }
        }
    }

    #[test]
    fn delivers_outcome_with_ticket() {
        let worker = LoginWorker::new(Arc::new(EchoAuthenticator));
        worker.submit(LoginTicket(7), Credentials::new("admin", "secret"));
        let outcome = worker
            .recv_timeout(Duration::from_secs(5))
            .expect("outcome");
        assert_eq!(outcome.ticket, LoginTicket(7));
        assert_eq!(outcome.result, Ok(SessionUser::new("admin")));
    }

    #[test]
    fn empty_queue_returns_none() {
        let worker = LoginWorker::new(Arc::new(EchoAuthenticator));
        assert!(worker.try_recv().is_none());
    }

    #[test]
    fn failures_are_delivered_too() {
        let worker = LoginWorker::new(Arc::new(EchoAuthenticator));
        worker.submit(LoginTicket(1), Credentials::new("admin", "nope"));
        let outcome = worker
            .recv_timeout(Duration::from_secs(5))
            .expect("outcome");
        assert_eq!(outcome.result, Err(LoginError::Rejected { status: 401 }));
    }
}
