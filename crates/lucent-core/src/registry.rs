//! Live view of trackable windows, refreshed by polling the OS.
//!
//! A refresh is split in two halves so the OS query can run on a worker
//! thread: [`WindowRegistry::poll`] builds a full snapshot without
//! touching the registry, and [`WindowRegistry::reconcile`] folds that
//! snapshot in on the owning thread.

use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::window::{WindowApi, WindowRecord};
use crate::{Rect, Result};

/// Change notification for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    Added(usize),
    Updated(usize),
    Removed(usize),
}

/// What a single reconciliation pass changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub added: Vec<usize>,
    pub updated: Vec<usize>,
    pub removed: Vec<usize>,
}

impl RefreshSummary {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Ordered collection of tracked windows, keyed by handle.
#[derive(Default)]
pub struct WindowRegistry {
    windows: Vec<WindowRecord>,
    subscribers: Vec<Sender<RegistryEvent>>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries the OS for the current window list and each window's state.
    ///
    /// Windows that fail a property query (typically because they closed
    /// mid-enumeration) are left out of the snapshot.
    pub fn poll(api: &dyn WindowApi) -> Result<Vec<WindowRecord>> {
        let foreground = api.foreground();
        let mut snapshot = Vec::new();

        for info in api.enumerate()? {
            let hwnd = info.hwnd;
            match WindowRecord::observe(api, info) {
                Ok(mut record) => {
                    record.active = foreground == Some(hwnd);
                    snapshot.push(record);
                }
                Err(e) if e.is_transient() => {
                    log::debug!("Skipping 0x{hwnd:X} this cycle: {e}");
                }
                Err(e) => {
                    log::warn!("Failed to query 0x{hwnd:X}: {e}");
                }
            }
        }

        Ok(snapshot)
    }

    /// Polls and reconciles in one step on the calling thread.
    pub fn refresh(&mut self, api: &dyn WindowApi) -> Result<RefreshSummary> {
        let snapshot = Self::poll(api)?;
        Ok(self.reconcile(snapshot))
    }

    /// Folds a polled snapshot into the registry.
    ///
    /// Known handles are updated in place (group membership and the
    /// linked-drag flag are kept), unseen handles are inserted, and
    /// handles missing from the snapshot are dropped.
    pub fn reconcile(&mut self, snapshot: Vec<WindowRecord>) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        let seen: HashSet<usize> = snapshot.iter().map(|w| w.hwnd).collect();

        for fresh in snapshot {
            match self.get_mut(fresh.hwnd) {
                Some(existing) => {
                    if merge_observed(existing, fresh) {
                        summary.updated.push(existing.hwnd);
                    }
                }
                None => {
                    summary.added.push(fresh.hwnd);
                    self.windows.push(fresh);
                }
            }
        }

        self.windows.retain(|w| {
            let keep = seen.contains(&w.hwnd);
            if !keep {
                summary.removed.push(w.hwnd);
            }
            keep
        });

        self.notify(&summary);
        summary
    }

    /// Registers a listener for add/update/remove notifications.
    ///
    /// Library entry point for embedders; the daemon reacts to the
    /// [`RefreshSummary`] returned by [`reconcile`](Self::reconcile) instead.
    pub fn subscribe(&mut self) -> Receiver<RegistryEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn get(&self, hwnd: usize) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.hwnd == hwnd)
    }

    pub fn get_mut(&mut self, hwnd: usize) -> Option<&mut WindowRecord> {
        self.windows.iter_mut().find(|w| w.hwnd == hwnd)
    }

    pub fn contains(&self, hwnd: usize) -> bool {
        self.get(hwnd).is_some()
    }

    pub fn windows(&self) -> &[WindowRecord] {
        &self.windows
    }

    pub fn windows_mut(&mut self) -> &mut [WindowRecord] {
        &mut self.windows
    }

    pub fn handles(&self) -> impl Iterator<Item = usize> + '_ {
        self.windows.iter().map(|w| w.hwnd)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Mirrors a position change made outside the poll (e.g. linked drag).
    pub fn mirror_rect(&mut self, hwnd: usize, rect: Rect) {
        if let Some(record) = self.get_mut(hwnd)
            && record.rect != rect
        {
            record.rect = rect;
            self.emit(RegistryEvent::Updated(hwnd));
        }
    }

    /// Applies a local change to a tracked record and notifies subscribers.
    ///
    /// Returns `false` if the window is not tracked.
    pub fn modify(&mut self, hwnd: usize, change: impl FnOnce(&mut WindowRecord)) -> bool {
        let Some(record) = self.get_mut(hwnd) else {
            return false;
        };
        change(record);
        self.emit(RegistryEvent::Updated(hwnd));
        true
    }

    fn notify(&mut self, summary: &RefreshSummary) {
        let events = summary
            .added
            .iter()
            .map(|&h| RegistryEvent::Added(h))
            .chain(summary.updated.iter().map(|&h| RegistryEvent::Updated(h)))
            .chain(summary.removed.iter().map(|&h| RegistryEvent::Removed(h)));
        for event in events {
            self.emit(event);
        }
    }

    fn emit(&mut self, event: RegistryEvent) {
        // Receivers that hung up are dropped on the first failed send.
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

/// Copies observable fields from a fresh observation, returning whether
/// anything changed.
fn merge_observed(existing: &mut WindowRecord, fresh: WindowRecord) -> bool {
    let mut changed = false;

    macro_rules! refresh {
        ($field:ident) => {
            if existing.$field != fresh.$field {
                existing.$field = fresh.$field;
                changed = true;
            }
        };
    }

    refresh!(title);
    refresh!(topmost);
    refresh!(click_through);
    refresh!(opacity);
    refresh!(active);
    refresh!(rect);
    refresh!(monitor_id);

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeWindowApi;

    fn api_with(windows: &[(usize, &str, &str)]) -> FakeWindowApi {
        let api = FakeWindowApi::new();
        for &(hwnd, title, process) in windows {
            api.add(hwnd, title, process, Rect::new(0, 0, 640, 480));
        }
        api
    }

    #[test]
    fn refresh_inserts_new_windows_with_os_state() {
        // Arrange
        let api = api_with(&[(1, "Untitled - Notepad", "Notepad")]);
        api.set_opacity(1, 40).unwrap();
        api.set_topmost(1, true).unwrap();
        let mut registry = WindowRegistry::new();

        // Act
        let summary = registry.refresh(&api).unwrap();

        // Assert
        assert_eq!(summary.added, vec![1]);
        let record = registry.get(1).unwrap();
        assert_eq!(record.opacity, 40);
        assert!(record.topmost);
        assert!(record.include_in_linked_drag);
    }

    #[test]
    fn no_stale_entries_survive_one_cycle() {
        // Arrange
        let api = api_with(&[(1, "a", "A"), (2, "b", "B"), (3, "c", "C")]);
        let mut registry = WindowRegistry::new();
        registry.refresh(&api).unwrap();

        // Act
        api.close(2);
        let summary = registry.refresh(&api).unwrap();

        // Assert
        assert_eq!(summary.removed, vec![2]);
        let live: HashSet<usize> = api.enumerate().unwrap().iter().map(|w| w.hwnd).collect();
        assert!(registry.handles().all(|h| live.contains(&h)));
    }

    #[test]
    fn unchanged_windows_are_not_reported_as_updated() {
        // Arrange
        let api = api_with(&[(1, "a", "A")]);
        let mut registry = WindowRegistry::new();
        registry.refresh(&api).unwrap();

        // Act
        let summary = registry.refresh(&api).unwrap();

        // Assert
        assert!(summary.is_empty());
    }

    #[test]
    fn title_change_updates_in_place_and_keeps_identity_fields() {
        // Arrange
        let api = api_with(&[(1, "draft.txt - Notepad", "Notepad")]);
        let mut registry = WindowRegistry::new();
        registry.refresh(&api).unwrap();
        registry.get_mut(1).unwrap().include_in_linked_drag = false;

        // Act
        api.set_title(1, "final.txt - Notepad");
        let summary = registry.refresh(&api).unwrap();

        // Assert
        assert_eq!(summary.updated, vec![1]);
        let record = registry.get(1).unwrap();
        assert_eq!(record.title, "final.txt - Notepad");
        assert!(!record.include_in_linked_drag);
    }

    #[test]
    fn window_vanishing_mid_query_is_dropped_silently() {
        // Arrange
        let api = api_with(&[(1, "a", "A"), (2, "b", "B")]);
        let mut registry = WindowRegistry::new();
        registry.refresh(&api).unwrap();

        // Act
        api.vanish_during_query(2);
        let summary = registry.refresh(&api).unwrap();

        // Assert
        assert_eq!(summary.removed, vec![2]);
        assert!(registry.contains(1));
        assert!(!registry.contains(2));
    }

    #[test]
    fn foreground_window_is_marked_active() {
        // Arrange
        let api = api_with(&[(1, "a", "A"), (2, "b", "B")]);
        api.set_foreground(Some(2));
        let mut registry = WindowRegistry::new();

        // Act
        registry.refresh(&api).unwrap();

        // Assert
        assert!(!registry.get(1).unwrap().active);
        assert!(registry.get(2).unwrap().active);
    }

    #[test]
    fn subscribers_receive_change_events() {
        // Arrange
        let api = api_with(&[(1, "a", "A")]);
        let mut registry = WindowRegistry::new();
        let rx = registry.subscribe();

        // Act
        registry.refresh(&api).unwrap();
        api.close(1);
        registry.refresh(&api).unwrap();

        // Assert
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![RegistryEvent::Added(1), RegistryEvent::Removed(1)]
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        // Arrange
        let api = api_with(&[(1, "a", "A")]);
        let mut registry = WindowRegistry::new();
        drop(registry.subscribe());

        // Act
        registry.refresh(&api).unwrap();

        // Assert
        assert!(registry.subscribers.is_empty());
    }
}
