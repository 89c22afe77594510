//! Open tabs, the active tab and the sidebar flag.

use std::rc::Rc;

use adminshell_core::{
    HOME_TAB_KEY, HomeTabPolicy, TabContent, TabDescriptor, default_tabs, menu,
};
use adminshell_storage::{KvStore, keys};

use crate::notify::{Notifier, ShellEvent};

#[derive(Debug)]
pub struct TabManager {
    store: Rc<KvStore>,
    notifier: Notifier,
    policy: HomeTabPolicy,
    tabs: Vec<TabDescriptor>,
    active: String,
    collapsed: bool,
}

impl TabManager {
    pub fn load(store: Rc<KvStore>, notifier: Notifier, policy: HomeTabPolicy) -> Self {
        let stored: Vec<TabDescriptor> = store.read(keys::OPEN_TABS, default_tabs());
        let active: String = store.read(keys::ACTIVE_TAB, HOME_TAB_KEY.to_string());
        let collapsed: bool = store.read(keys::SIDER_COLLAPSED, false);

        let tabs = normalize_tabs(&stored, policy);
        let mut manager = Self {
            store,
            notifier,
            policy,
            tabs,
            active,
            collapsed,
        };
        if manager.tabs != stored {
            tracing::debug!(
                before = stored.len(),
                after = manager.tabs.len(),
                "normalized stored tabs"
            );
            manager.persist_tabs();
        }
        manager
    }

    pub fn tabs(&self) -> &[TabDescriptor] {
        &self.tabs
    }

    pub fn active_key(&self) -> &str {
        &self.active
    }

    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tabs.iter().any(|tab| tab.key == key)
    }

    /// Opens `key`, creating its descriptor on first use, and makes it active.
    pub fn open(&mut self, key: &str) {
        if !self.contains(key) {
            let label = menu::resolve_label(key);
            tracing::debug!(key, %label, "open tab");
            self.tabs.push(TabDescriptor::new(key, label));
            self.persist_tabs();
            self.notifier.publish(ShellEvent::TabsChanged);
        }
        self.set_active(key);
    }

    /// Makes `key` active without checking that a descriptor exists.
    pub fn switch_to(&mut self, key: &str) {
        self.set_active(key);
    }

    /// Closes `key`. Returns whether a descriptor was removed.
    pub fn close(&mut self, key: &str) -> bool {
        if self.policy == HomeTabPolicy::Pinned && key == HOME_TAB_KEY {
            tracing::debug!("refusing to close home tab");
            return false;
        }

        let Some(pos) = self.tabs.iter().position(|tab| tab.key == key) else {
            return false;
        };
        self.tabs.remove(pos);
        self.persist_tabs();
        self.notifier.publish(ShellEvent::TabsChanged);

        if self.active == key {
            let next = self
                .tabs
                .last()
                .map(|tab| tab.key.clone())
                .unwrap_or_default();
            self.set_active(&next);
        }
        true
    }

    /// Whether the presentation should offer a close control for `key`.
    pub fn closable(&self, key: &str) -> bool {
        key != HOME_TAB_KEY
    }

    /// Activates the next (or previous) open tab, wrapping around.
    pub fn cycle(&mut self, forward: bool) {
        if self.tabs.is_empty() {
            return;
        }
        let len = self.tabs.len();
        let next = match self.tabs.iter().position(|tab| tab.key == self.active) {
            Some(pos) if forward => (pos + 1) % len,
            Some(pos) => (pos + len - 1) % len,
            None => 0,
        };
        let key = self.tabs[next].key.clone();
        self.set_active(&key);
    }

    pub fn toggle_collapsed(&mut self) {
        self.set_collapsed(!self.collapsed);
    }

    pub fn set_collapsed(&mut self, collapsed: bool) {
        if self.collapsed == collapsed {
            return;
        }
        self.collapsed = collapsed;
        self.store.write(keys::SIDER_COLLAPSED, &collapsed);
        self.notifier.publish(ShellEvent::SidebarChanged(collapsed));
    }

    pub fn active_descriptor(&self) -> Option<&TabDescriptor> {
        self.tabs.iter().find(|tab| tab.key == self.active)
    }

    /// Content for the active tab, or `None` when the active key has no
    /// descriptor.
    pub fn active_content(&self) -> Option<TabContent> {
        self.active_descriptor().map(TabDescriptor::content)
    }

    pub fn breadcrumb(&self) -> Vec<String> {
        match self.active_descriptor() {
            Some(tab) => menu::breadcrumb(&tab.key, &tab.label),
            None => Vec::new(),
        }
    }

    fn set_active(&mut self, key: &str) {
        if self.active == key {
            return;
        }
        self.active = key.to_string();
        self.store.write(keys::ACTIVE_TAB, &self.active);
        self.notifier
            .publish(ShellEvent::ActiveTabChanged(self.active.clone()));
    }

    fn persist_tabs(&self) {
        self.store.write(keys::OPEN_TABS, &self.tabs);
    }
}

/// Drops duplicate keys (first wins) and, when the home tab is pinned,
/// makes sure it is present and first.
fn normalize_tabs(stored: &[TabDescriptor], policy: HomeTabPolicy) -> Vec<TabDescriptor> {
    let mut tabs: Vec<TabDescriptor> = Vec::with_capacity(stored.len() + 1);
    for tab in stored {
        if !tabs.iter().any(|t| t.key == tab.key) {
            tabs.push(tab.clone());
        }
    }

    if policy == HomeTabPolicy::Pinned {
        match tabs.iter().position(TabDescriptor::is_home) {
            Some(0) => {}
            Some(pos) => {
                let home = tabs.remove(pos);
                tabs.insert(0, home);
            }
            None => tabs.insert(0, TabDescriptor::home()),
        }
    }
    tabs
}
