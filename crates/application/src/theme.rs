use std::rc::Rc;

use adminshell_core::ThemeClass;
use adminshell_storage::{KvStore, keys};

use crate::notify::{Notifier, ShellEvent};

/// Dark/light flag. Every change, including the initial load, is published
/// as the style class the whole frame should use.
#[derive(Debug)]
pub struct ThemeManager {
    store: Rc<KvStore>,
    notifier: Notifier,
    dark: bool,
}

impl ThemeManager {
    pub fn load(store: Rc<KvStore>, notifier: Notifier) -> Self {
        let dark = store.read(keys::THEME, false);
        let manager = Self {
            store,
            notifier,
            dark,
        };
        manager.apply();
        manager
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }

    pub fn class(&self) -> ThemeClass {
        ThemeClass::from_dark(self.dark)
    }

    pub fn toggle(&mut self) {
        self.set_dark(!self.dark);
    }

    pub fn set_dark(&mut self, dark: bool) {
        if self.dark == dark {
            return;
        }
        self.dark = dark;
        self.store.write(keys::THEME, &dark);
        self.apply();
    }

    fn apply(&self) {
        tracing::debug!(class = %self.class(), "apply theme");
        self.notifier.publish(ShellEvent::ThemeApplied(self.class()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_applies_stored_class() {
        let store = Rc::new(KvStore::ephemeral().expect("in-memory store"));
        store.write(keys::THEME, &true);
        let notifier = Notifier::new();
        let rx = notifier.subscribe();
        let manager = ThemeManager::load(store, notifier);
        assert!(manager.is_dark());
        assert_eq!(rx.try_recv(), Ok(ShellEvent::ThemeApplied(ThemeClass::Dark)));
    }

    #[test]
    fn toggle_flips_and_persists() {
        let store = Rc::new(KvStore::ephemeral().expect("in-memory store"));
        let notifier = Notifier::new();
        let mut manager = ThemeManager::load(Rc::clone(&store), notifier.clone());
        assert_eq!(manager.class(), ThemeClass::Light);

        let rx = notifier.subscribe();
        manager.toggle();
        assert_eq!(manager.class(), ThemeClass::Dark);
        assert!(store.read(keys::THEME, false));
        assert_eq!(rx.try_recv(), Ok(ShellEvent::ThemeApplied(ThemeClass::Dark)));

        manager.toggle();
        assert!(!store.read(keys::THEME, true));
    }

    #[test]
    fn setting_same_value_is_silent() {
        let store = Rc::new(KvStore::ephemeral().expect("in-memory store"));
        let notifier = Notifier::new();
        let mut manager = ThemeManager::load(store, notifier.clone());
        let rx = notifier.subscribe();
        manager.set_dark(false);
        assert!(rx.try_recv().is_err());
    }
}
