//! Per-version registry of open editor tabs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fixed set of studio view kinds a tab can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabKind {
    Dashboard,
    Database,
    Model,
    Endpoint,
    Queue,
    Task,
    Middleware,
    Function,
    Cache,
    Storage,
    Settings,
    Notifications,
}

impl TabKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Database => "database",
            Self::Model => "model",
            Self::Endpoint => "endpoint",
            Self::Queue => "queue",
            Self::Task => "task",
            Self::Middleware => "middleware",
            Self::Function => "function",
            Self::Cache => "cache",
            Self::Storage => "storage",
            Self::Settings => "settings",
            Self::Notifications => "notifications",
        }
    }
}

/// One open view within a version's editing scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab {
    pub id: Uuid,
    pub title: String,
    pub path: String,
    pub kind: TabKind,
    pub is_active: bool,
    pub is_dashboard: bool,
}

/// What a caller provides when opening a tab; ids and activation state are
/// the manager's business.
#[derive(Debug, Clone)]
pub struct TabDescriptor {
    pub title: String,
    pub path: String,
    pub kind: TabKind,
}

impl TabDescriptor {
    pub fn new(title: impl Into<String>, path: impl Into<String>, kind: TabKind) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            kind,
        }
    }
}

/// Ordered tab registry per version scope.
///
/// Invariant: whenever a version has any tabs, exactly one of them is active.
/// Every mutation below re-establishes that invariant before returning, so no
/// reader can observe zero or multiple active tabs.
#[derive(Debug, Default)]
pub struct TabSessionManager {
    versions: HashMap<String, Vec<Tab>>,
}

impl TabSessionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a view. If a tab with the same path already exists it is
    /// re-activated instead of duplicated; otherwise a new tab is appended
    /// and activated.
    pub fn open(&mut self, version_id: &str, descriptor: TabDescriptor) -> Uuid {
        let tabs = self.versions.entry(version_id.to_string()).or_default();

        if let Some(existing_id) = tabs
            .iter()
            .find(|tab| tab.path == descriptor.path)
            .map(|tab| tab.id)
        {
            for tab in tabs.iter_mut() {
                tab.is_active = tab.id == existing_id;
            }
            return existing_id;
        }

        let id = Uuid::new_v4();
        for tab in tabs.iter_mut() {
            tab.is_active = false;
        }
        tabs.push(Tab {
            id,
            title: descriptor.title,
            path: descriptor.path,
            is_dashboard: descriptor.kind == TabKind::Dashboard,
            kind: descriptor.kind,
            is_active: true,
        });
        id
    }

    /// Make the target tab the active one. Unknown ids are ignored; the tab
    /// may already have been closed by a teardown race.
    pub fn activate(&mut self, version_id: &str, tab_id: Uuid) {
        let Some(tabs) = self.versions.get_mut(version_id) else {
            return;
        };
        if !tabs.iter().any(|tab| tab.id == tab_id) {
            return;
        }
        for tab in tabs.iter_mut() {
            tab.is_active = tab.id == tab_id;
        }
    }

    /// Remove a tab. Closing the active tab hands activation to the tab
    /// immediately preceding it in insertion order, or the first remaining
    /// tab when the closed one was first.
    pub fn close(&mut self, version_id: &str, tab_id: Uuid) {
        let Some(tabs) = self.versions.get_mut(version_id) else {
            return;
        };
        let Some(index) = tabs.iter().position(|tab| tab.id == tab_id) else {
            return;
        };

        let was_active = tabs[index].is_active;
        tabs.remove(index);

        if tabs.is_empty() {
            self.versions.remove(version_id);
            return;
        }

        if was_active {
            let fallback = index.saturating_sub(1);
            for (position, tab) in tabs.iter_mut().enumerate() {
                tab.is_active = position == fallback;
            }
        }
    }

    /// Close every tab except the pinned dashboard ones. This is the studio
    /// "close all" action; the dashboard stays put and becomes active.
    pub fn close_all(&mut self, version_id: &str) {
        let Some(tabs) = self.versions.get_mut(version_id) else {
            return;
        };
        tabs.retain(|tab| tab.is_dashboard);
        if tabs.is_empty() {
            self.versions.remove(version_id);
            return;
        }
        if !tabs.iter().any(|tab| tab.is_active) {
            for (position, tab) in tabs.iter_mut().enumerate() {
                tab.is_active = position == 0;
            }
        }
    }

    /// Close every tab except the dashboard ones and the currently active
    /// tab.
    pub fn close_others(&mut self, version_id: &str) {
        let Some(tabs) = self.versions.get_mut(version_id) else {
            return;
        };
        tabs.retain(|tab| tab.is_dashboard || tab.is_active);
        if !tabs.iter().any(|tab| tab.is_active)
            && let Some(first) = tabs.first_mut()
        {
            first.is_active = true;
        }
    }

    /// Replace the active tab's title/path/kind in place, keeping its id and
    /// activation. Used when an open view navigates within itself.
    pub fn update_active(&mut self, version_id: &str, descriptor: TabDescriptor) {
        let Some(tabs) = self.versions.get_mut(version_id) else {
            return;
        };
        let Some(tab) = tabs.iter_mut().find(|tab| tab.is_active) else {
            return;
        };
        tab.title = descriptor.title;
        tab.path = descriptor.path;
        tab.is_dashboard = descriptor.kind == TabKind::Dashboard;
        tab.kind = descriptor.kind;
    }

    /// Scope teardown: drop every tab for the version unconditionally,
    /// dashboard included. Fired when the version context is left entirely.
    pub fn clear_version(&mut self, version_id: &str) {
        self.versions.remove(version_id);
    }

    #[must_use]
    pub fn tabs(&self, version_id: &str) -> &[Tab] {
        self.versions
            .get(version_id)
            .map_or(&[], |tabs| tabs.as_slice())
    }

    #[must_use]
    pub fn active_tab(&self, version_id: &str) -> Option<&Tab> {
        self.tabs(version_id).iter().find(|tab| tab.is_active)
    }

    #[must_use]
    pub fn tab_by_path(&self, version_id: &str, path: &str) -> Option<&Tab> {
        self.tabs(version_id).iter().find(|tab| tab.path == path)
    }

    #[must_use]
    pub fn tab_by_id(&self, version_id: &str, tab_id: Uuid) -> Option<&Tab> {
        self.tabs(version_id).iter().find(|tab| tab.id == tab_id)
    }

    /// The tab immediately preceding `tab_id` in insertion order, if any.
    #[must_use]
    pub fn previous_tab(&self, version_id: &str, tab_id: Uuid) -> Option<&Tab> {
        let tabs = self.tabs(version_id);
        let index = tabs.iter().position(|tab| tab.id == tab_id)?;
        index.checked_sub(1).and_then(|previous| tabs.get(previous))
    }

    #[must_use]
    pub fn is_empty(&self, version_id: &str) -> bool {
        self.tabs(version_id).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{TabDescriptor, TabKind, TabSessionManager};

    const VERSION: &str = "version-1";

    fn descriptor(path: &str, kind: TabKind) -> TabDescriptor {
        TabDescriptor::new(path.to_uppercase(), path, kind)
    }

    fn active_count(manager: &TabSessionManager, version_id: &str) -> usize {
        manager
            .tabs(version_id)
            .iter()
            .filter(|tab| tab.is_active)
            .count()
    }

    #[test]
    fn open_appends_and_activates_exclusively() {
        let mut manager = TabSessionManager::new();

        manager.open(VERSION, descriptor("/endpoints", TabKind::Endpoint));
        manager.open(VERSION, descriptor("/queues", TabKind::Queue));
        let task = manager.open(VERSION, descriptor("/tasks", TabKind::Task));

        assert_eq!(manager.tabs(VERSION).len(), 3);
        assert_eq!(active_count(&manager, VERSION), 1);
        assert_eq!(manager.active_tab(VERSION).map(|tab| tab.id), Some(task));
    }

    #[test]
    fn open_same_path_twice_reactivates_instead_of_duplicating() {
        let mut manager = TabSessionManager::new();

        let first = manager.open(VERSION, descriptor("/endpoints", TabKind::Endpoint));
        manager.open(VERSION, descriptor("/queues", TabKind::Queue));
        let again = manager.open(VERSION, descriptor("/endpoints", TabKind::Endpoint));

        assert_eq!(first, again);
        assert_eq!(manager.tabs(VERSION).len(), 2);
        assert_eq!(manager.active_tab(VERSION).map(|tab| tab.id), Some(first));
        assert_eq!(active_count(&manager, VERSION), 1);
    }

    #[test]
    fn activate_unknown_tab_is_a_noop() {
        let mut manager = TabSessionManager::new();
        let endpoint = manager.open(VERSION, descriptor("/endpoints", TabKind::Endpoint));

        manager.activate(VERSION, uuid::Uuid::new_v4());

        assert_eq!(manager.active_tab(VERSION).map(|tab| tab.id), Some(endpoint));
        assert_eq!(active_count(&manager, VERSION), 1);
    }

    #[test]
    fn closing_active_tab_activates_preceding_tab() {
        let mut manager = TabSessionManager::new();

        let a = manager.open(VERSION, descriptor("/a", TabKind::Endpoint));
        let b = manager.open(VERSION, descriptor("/b", TabKind::Queue));
        let c = manager.open(VERSION, descriptor("/c", TabKind::Task));
        manager.activate(VERSION, b);

        manager.close(VERSION, b);

        assert_eq!(manager.active_tab(VERSION).map(|tab| tab.id), Some(a));
        assert!(manager.tab_by_id(VERSION, c).is_some());
        assert_eq!(active_count(&manager, VERSION), 1);
    }

    #[test]
    fn closing_active_first_tab_activates_new_first_tab() {
        let mut manager = TabSessionManager::new();

        let a = manager.open(VERSION, descriptor("/a", TabKind::Endpoint));
        let b = manager.open(VERSION, descriptor("/b", TabKind::Queue));
        manager.open(VERSION, descriptor("/c", TabKind::Task));
        manager.activate(VERSION, a);

        manager.close(VERSION, a);

        assert_eq!(manager.active_tab(VERSION).map(|tab| tab.id), Some(b));
        assert_eq!(active_count(&manager, VERSION), 1);
    }

    #[test]
    fn closing_inactive_tab_keeps_current_activation() {
        let mut manager = TabSessionManager::new();

        let a = manager.open(VERSION, descriptor("/a", TabKind::Endpoint));
        let b = manager.open(VERSION, descriptor("/b", TabKind::Queue));
        manager.activate(VERSION, b);

        manager.close(VERSION, a);

        assert_eq!(manager.active_tab(VERSION).map(|tab| tab.id), Some(b));
    }

    #[test]
    fn closing_last_tab_empties_the_version_scope() {
        let mut manager = TabSessionManager::new();
        let only = manager.open(VERSION, descriptor("/only", TabKind::Endpoint));

        manager.close(VERSION, only);

        assert!(manager.is_empty(VERSION));
        assert!(manager.active_tab(VERSION).is_none());
    }

    #[test]
    fn close_all_keeps_dashboard_and_activates_it() {
        let mut manager = TabSessionManager::new();

        let dashboard = manager.open(VERSION, descriptor("/", TabKind::Dashboard));
        manager.open(VERSION, descriptor("/a", TabKind::Endpoint));
        manager.open(VERSION, descriptor("/b", TabKind::Queue));

        manager.close_all(VERSION);

        assert_eq!(manager.tabs(VERSION).len(), 1);
        assert_eq!(
            manager.active_tab(VERSION).map(|tab| tab.id),
            Some(dashboard)
        );
    }

    #[test]
    fn close_others_keeps_dashboard_and_active() {
        let mut manager = TabSessionManager::new();

        manager.open(VERSION, descriptor("/", TabKind::Dashboard));
        manager.open(VERSION, descriptor("/a", TabKind::Endpoint));
        let b = manager.open(VERSION, descriptor("/b", TabKind::Queue));

        manager.close_others(VERSION);

        assert_eq!(manager.tabs(VERSION).len(), 2);
        assert_eq!(manager.active_tab(VERSION).map(|tab| tab.id), Some(b));
    }

    #[test]
    fn update_active_replaces_view_in_place() {
        let mut manager = TabSessionManager::new();

        let id = manager.open(VERSION, descriptor("/models", TabKind::Model));
        manager.update_active(
            VERSION,
            TabDescriptor::new("Users", "/models/users", TabKind::Model),
        );

        let tab = manager.active_tab(VERSION).unwrap();
        assert_eq!(tab.id, id);
        assert_eq!(tab.path, "/models/users");
        assert_eq!(tab.title, "Users");
    }

    #[test]
    fn clear_version_wipes_everything_including_dashboard() {
        let mut manager = TabSessionManager::new();

        manager.open(VERSION, descriptor("/", TabKind::Dashboard));
        manager.open(VERSION, descriptor("/a", TabKind::Endpoint));

        manager.clear_version(VERSION);

        assert!(manager.is_empty(VERSION));
    }

    #[test]
    fn version_scopes_are_independent() {
        let mut manager = TabSessionManager::new();

        let first = manager.open("version-1", descriptor("/a", TabKind::Endpoint));
        let second = manager.open("version-2", descriptor("/a", TabKind::Endpoint));

        assert_ne!(first, second);
        manager.clear_version("version-1");
        assert!(manager.is_empty("version-1"));
        assert_eq!(manager.tabs("version-2").len(), 1);
    }

    #[test]
    fn previous_tab_follows_insertion_order() {
        let mut manager = TabSessionManager::new();

        let a = manager.open(VERSION, descriptor("/a", TabKind::Endpoint));
        let b = manager.open(VERSION, descriptor("/b", TabKind::Queue));

        assert_eq!(
            manager.previous_tab(VERSION, b).map(|tab| tab.id),
            Some(a)
        );
        assert!(manager.previous_tab(VERSION, a).is_none());
    }
}
