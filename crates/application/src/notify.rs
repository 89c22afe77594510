use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use adminshell_core::{Location, SessionUser, ThemeClass};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    TabsChanged,
    ActiveTabChanged(String),
    SidebarChanged(bool),
    ThemeApplied(ThemeClass),
    AuthChanged(Option<SessionUser>),
    LoginFailed(String),
    Navigated(Location),
}

/// Fan-out of shell events to any number of subscribers. Clones share the
/// same subscriber list; dropped receivers are pruned on the next publish.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    subscribers: Rc<RefCell<Vec<Sender<ShellEvent>>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<ShellEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    pub fn publish(&self, event: ShellEvent) {
        tracing::trace!(?event, "publish");
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_sees_events() {
        let notifier = Notifier::new();
        let a = notifier.subscribe();
        let b = notifier.clone().subscribe();
        notifier.publish(ShellEvent::SidebarChanged(true));
        assert_eq!(a.try_recv(), Ok(ShellEvent::SidebarChanged(true)));
        assert_eq!(b.try_recv(), Ok(ShellEvent::SidebarChanged(true)));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let notifier = Notifier::new();
        let kept = notifier.subscribe();
        drop(notifier.subscribe());
        assert_eq!(notifier.subscriber_count(), 2);
        notifier.publish(ShellEvent::TabsChanged);
        assert_eq!(notifier.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(ShellEvent::TabsChanged));
    }
}
