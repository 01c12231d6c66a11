//! Partitioning of tracked windows into groups.
//!
//! By default every owning process gets an automatic group. Users can
//! overlay manual groups; a window claimed by a manual group is never
//! touched by automatic re-partitioning.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::linked_drag::{LinkPeer, LinkTopology};
use crate::window::WindowRecord;
use crate::{Error, Rect, Result};

/// Unique identifier for a window group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(Uuid);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GroupId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| Error::UnknownGroup(s.to_string()))
    }
}

/// How a group came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// One group per owning process, maintained automatically.
    AutoByProcess,
    /// Created and deleted only by the user.
    Manual,
}

/// A named, ordered collection of window handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowGroup {
    pub id: GroupId,
    pub name: String,
    pub kind: GroupKind,
    /// Process name this group collects. Only set for automatic groups.
    pub process_name_filter: Option<String>,
    pub members: Vec<usize>,
    pub linked_drag_enabled: bool,
    /// The member whose icon represents the group.
    pub icon: Option<usize>,
}

impl WindowGroup {
    fn auto(id: GroupId, process_name: &str) -> Self {
        Self {
            id,
            name: process_name.to_string(),
            kind: GroupKind::AutoByProcess,
            process_name_filter: Some(process_name.to_string()),
            members: Vec::new(),
            linked_drag_enabled: false,
            icon: None,
        }
    }

    fn manual(id: GroupId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: GroupKind::Manual,
            process_name_filter: None,
            members: Vec::new(),
            linked_drag_enabled: false,
            icon: None,
        }
    }

    pub fn is_manual(&self) -> bool {
        self.kind == GroupKind::Manual
    }

    pub fn contains(&self, hwnd: usize) -> bool {
        self.members.contains(&hwnd)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Header text shown next to the group, e.g. `Notepad (3 windows)`.
    pub fn display_header(&self) -> String {
        format!("{} ({} windows)", self.name, self.members.len())
    }

    fn push(&mut self, hwnd: usize) {
        if !self.members.contains(&hwnd) {
            self.members.push(hwnd);
        }
        if self.icon.is_none() {
            self.icon = Some(hwnd);
        }
    }

    fn remove(&mut self, hwnd: usize) -> bool {
        let before = self.members.len();
        self.members.retain(|&h| h != hwnd);
        if self.icon == Some(hwnd) {
            self.icon = self.members.first().copied();
        }
        self.members.len() != before
    }
}

/// Persisted description of a manual group.
///
/// Window handles do not survive a restart, so membership is remembered
/// by the distinct process names of the members.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ManualGroupData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub process_names: Vec<String>,
}

/// Owns the group collection. Manual groups are kept ahead of automatic ones.
#[derive(Debug, Default)]
pub struct GroupingEngine {
    groups: Vec<WindowGroup>,
}

impl GroupingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[WindowGroup] {
        &self.groups
    }

    pub fn get(&self, id: &GroupId) -> Option<&WindowGroup> {
        self.groups.iter().find(|g| g.id == *id)
    }

    fn get_mut(&mut self, id: &GroupId) -> Option<&mut WindowGroup> {
        self.groups.iter_mut().find(|g| g.id == *id)
    }

    /// Returns the automatic group collecting `process_name`, if any.
    pub fn by_process_name(&self, process_name: &str) -> Option<&WindowGroup> {
        self.groups.iter().find(|g| {
            g.kind == GroupKind::AutoByProcess
                && g.process_name_filter.as_deref() == Some(process_name)
        })
    }

    /// Returns the group holding `hwnd`, if any.
    pub fn group_of(&self, hwnd: usize) -> Option<&WindowGroup> {
        self.groups.iter().find(|g| g.contains(hwnd))
    }

    fn in_manual_group(&self, hwnd: usize) -> bool {
        self.groups.iter().any(|g| g.is_manual() && g.contains(hwnd))
    }

    /// Rebuilds every automatic group from scratch.
    ///
    /// Windows already claimed by a manual group are skipped. Groups are
    /// ordered by process name and empty results are not created. An
    /// automatic group that existed before for the same process keeps its
    /// id and linked-drag setting, so repeated calls are stable.
    pub fn group_by_process(&mut self, windows: &mut [WindowRecord]) {
        let previous: HashMap<String, (GroupId, bool)> = self
            .groups
            .iter()
            .filter(|g| g.kind == GroupKind::AutoByProcess)
            .filter_map(|g| {
                g.process_name_filter
                    .clone()
                    .map(|p| (p, (g.id, g.linked_drag_enabled)))
            })
            .collect();
        self.groups.retain(WindowGroup::is_manual);

        let mut by_process: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, window) in windows.iter().enumerate() {
            if !self.in_manual_group(window.hwnd) {
                by_process
                    .entry(window.process_name.clone())
                    .or_default()
                    .push(index);
            }
        }

        for (process_name, indices) in by_process {
            if indices.is_empty() {
                continue;
            }
            let (id, linked) = previous
                .get(&process_name)
                .copied()
                .unwrap_or_else(|| (GroupId::new(), false));
            let mut group = WindowGroup::auto(id, &process_name);
            group.linked_drag_enabled = linked;
            for index in indices {
                let window = &mut windows[index];
                window.group_id = Some(id);
                group.push(window.hwnd);
            }
            self.groups.push(group);
        }
    }

    /// Incrementally reconciles groups against a fresh window list.
    ///
    /// Closed windows leave their group (emptied automatic groups are
    /// deleted), unseen windows join the first automatic group for their
    /// process or a new one, and every record's `group_id` is re-synced.
    /// Manual membership is never altered here.
    pub fn update_groups(&mut self, windows: &mut [WindowRecord]) {
        let live: HashSet<usize> = windows.iter().map(|w| w.hwnd).collect();

        for group in &mut self.groups {
            group.members.retain(|h| live.contains(h));
            if group.icon.is_some_and(|h| !live.contains(&h)) {
                group.icon = group.members.first().copied();
            }
        }
        self.groups
            .retain(|g| g.is_manual() || !g.members.is_empty());

        let grouped: HashSet<usize> = self
            .groups
            .iter()
            .flat_map(|g| g.members.iter().copied())
            .collect();

        for window in windows.iter().filter(|w| !grouped.contains(&w.hwnd)) {
            let existing = self.groups.iter_mut().find(|g| {
                g.kind == GroupKind::AutoByProcess
                    && g.process_name_filter.as_deref() == Some(window.process_name.as_str())
            });
            match existing {
                Some(group) => group.push(window.hwnd),
                None => {
                    let mut group = WindowGroup::auto(GroupId::new(), &window.process_name);
                    group.push(window.hwnd);
                    log::debug!("Created group for process {}", window.process_name);
                    self.groups.push(group);
                }
            }
        }

        for window in windows.iter_mut() {
            window.group_id = self.group_of(window.hwnd).map(|g| g.id);
        }
    }

    /// Creates a manual group, optionally seeded with windows.
    pub fn create_manual_group(&mut self, name: &str, members: &mut [&mut WindowRecord]) -> GroupId {
        self.insert_manual(GroupId::new(), name, members)
    }

    fn insert_manual(
        &mut self,
        id: GroupId,
        name: &str,
        members: &mut [&mut WindowRecord],
    ) -> GroupId {
        self.groups.insert(0, WindowGroup::manual(id, name));
        for window in members.iter_mut() {
            self.attach(id, window);
        }
        log::info!("Created manual group '{name}' with {} windows", members.len());
        id
    }

    /// Moves a window into `id`, removing it from any previous group first.
    pub fn add_to_group(&mut self, id: &GroupId, window: &mut WindowRecord) -> Result<()> {
        if self.get(id).is_none() {
            return Err(Error::UnknownGroup(id.to_string()));
        }
        self.attach(*id, window);
        Ok(())
    }

    fn attach(&mut self, id: GroupId, window: &mut WindowRecord) {
        for group in self.groups.iter_mut().filter(|g| g.id != id) {
            group.remove(window.hwnd);
        }
        self.groups
            .retain(|g| g.id == id || g.is_manual() || !g.members.is_empty());

        if let Some(group) = self.get_mut(&id) {
            group.push(window.hwnd);
            window.group_id = Some(id);
        }
    }

    /// Removes a window from a group. An emptied manual group is kept.
    pub fn remove_from_group(&mut self, id: &GroupId, window: &mut WindowRecord) -> Result<()> {
        let group = self
            .get_mut(id)
            .ok_or_else(|| Error::UnknownGroup(id.to_string()))?;
        group.remove(window.hwnd);
        let drop_group = !group.is_manual() && group.is_empty();
        window.group_id = None;

        if drop_group {
            self.groups.retain(|g| g.id != *id);
        }
        Ok(())
    }

    /// Deletes a group and clears its members' group references.
    pub fn delete_group(&mut self, id: &GroupId, windows: &mut [WindowRecord]) -> Result<()> {
        let index = self
            .groups
            .iter()
            .position(|g| g.id == *id)
            .ok_or_else(|| Error::UnknownGroup(id.to_string()))?;
        let group = self.groups.remove(index);

        for window in windows.iter_mut().filter(|w| group.contains(w.hwnd)) {
            window.group_id = None;
        }
        log::info!("Deleted group '{}'", group.name);
        Ok(())
    }

    pub fn set_linked_drag(&mut self, id: &GroupId, enabled: bool) -> Result<()> {
        let group = self
            .get_mut(id)
            .ok_or_else(|| Error::UnknownGroup(id.to_string()))?;
        group.linked_drag_enabled = enabled;
        Ok(())
    }

    /// Drops every group and clears all group references.
    pub fn clear(&mut self, windows: &mut [WindowRecord]) {
        for window in windows.iter_mut() {
            window.group_id = None;
        }
        self.groups.clear();
    }

    /// Describes manual groups for persistence.
    pub fn manual_group_data(&self, windows: &[WindowRecord]) -> Vec<ManualGroupData> {
        self.groups
            .iter()
            .filter(|g| g.is_manual())
            .map(|g| {
                let mut process_names: Vec<String> = Vec::new();
                for window in windows.iter().filter(|w| g.contains(w.hwnd)) {
                    if !process_names.contains(&window.process_name) {
                        process_names.push(window.process_name.clone());
                    }
                }
                ManualGroupData {
                    id: g.id.to_string(),
                    name: g.name.clone(),
                    process_names,
                }
            })
            .collect()
    }

    /// Recreates saved manual groups and claims windows of their processes.
    ///
    /// Membership goes through the same path as [`Self::add_to_group`].
    pub fn restore_manual_groups(&mut self, saved: &[ManualGroupData], windows: &mut [WindowRecord]) {
        let mut inserted = 0;
        for data in saved {
            let id = data.id.parse().unwrap_or_default();
            if self.get(&id).is_some() {
                continue;
            }
            inserted += 1;
            let mut members: Vec<&mut WindowRecord> = windows
                .iter_mut()
                .filter(|w| data.process_names.contains(&w.process_name))
                .collect();
            self.insert_manual(id, &data.name, &mut members);
        }
        // Each insert went to the front; put them back in saved order.
        self.groups[..inserted].reverse();
    }

    /// Snapshot of linked-drag membership for the coordinator.
    ///
    /// Only groups with linked drag enabled and more than one member
    /// take part.
    pub fn link_topology(&self, windows: &[WindowRecord]) -> LinkTopology {
        let known: HashMap<usize, (bool, Rect)> = windows
            .iter()
            .map(|w| (w.hwnd, (w.include_in_linked_drag, w.rect)))
            .collect();

        let mut topology = LinkTopology::default();
        for group in self
            .groups
            .iter()
            .filter(|g| g.linked_drag_enabled && g.members.len() > 1)
        {
            let peers: Vec<LinkPeer> = group
                .members
                .iter()
                .filter_map(|&hwnd| {
                    let &(included, rect) = known.get(&hwnd)?;
                    Some(LinkPeer {
                        hwnd,
                        included,
                        rect,
                    })
                })
                .collect();
            if peers.len() < 2 {
                continue;
            }
            topology.insert_group(peers);
        }
        topology
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn win(hwnd: usize, process: &str) -> WindowRecord {
        WindowRecord::new(hwnd, format!("window {hwnd}"), process)
    }

    fn partition(engine: &GroupingEngine) -> Vec<(GroupId, Vec<usize>)> {
        engine
            .groups()
            .iter()
            .map(|g| (g.id, g.members.clone()))
            .collect()
    }

    #[test]
    fn group_by_process_creates_one_group_per_process() {
        // Arrange
        let mut windows = vec![win(1, "Notepad"), win(2, "Code"), win(3, "Notepad")];
        let mut engine = GroupingEngine::new();

        // Act
        engine.group_by_process(&mut windows);

        // Assert
        assert_eq!(engine.groups().len(), 2);
        assert_eq!(engine.groups()[0].name, "Code");
        assert_eq!(engine.groups()[1].members, vec![1, 3]);
        assert_eq!(windows[0].group_id, Some(engine.groups()[1].id));
    }

    #[test]
    fn group_by_process_is_idempotent() {
        // Arrange
        let mut windows = vec![win(1, "Notepad"), win(2, "Code"), win(3, "Notepad")];
        let mut engine = GroupingEngine::new();
        engine.group_by_process(&mut windows);
        let first = partition(&engine);

        // Act
        engine.group_by_process(&mut windows);

        // Assert
        assert_eq!(partition(&engine), first);
    }

    #[test]
    fn group_by_process_leaves_manual_members_alone() {
        // Arrange
        let mut windows = vec![win(1, "Notepad"), win(2, "Notepad")];
        let mut engine = GroupingEngine::new();
        let manual = {
            let (first, _) = windows.split_at_mut(1);
            engine.create_manual_group("Writing", &mut [&mut first[0]])
        };

        // Act
        engine.group_by_process(&mut windows);

        // Assert
        assert_eq!(engine.get(&manual).unwrap().members, vec![1]);
        assert_eq!(engine.by_process_name("Notepad").unwrap().members, vec![2]);
        assert_eq!(windows[0].group_id, Some(manual));
    }

    #[test]
    fn update_groups_assigns_new_windows_and_drops_closed_ones() {
        // Arrange
        let mut windows = vec![win(1, "Notepad"), win(2, "Code")];
        let mut engine = GroupingEngine::new();
        engine.update_groups(&mut windows);

        // Act
        let mut next = vec![win(1, "Notepad"), win(3, "Notepad")];
        engine.update_groups(&mut next);

        // Assert
        assert_eq!(engine.groups().len(), 1);
        assert_eq!(engine.groups()[0].members, vec![1, 3]);
        assert!(engine.by_process_name("Code").is_none());
        assert_eq!(next[1].group_id, Some(engine.groups()[0].id));
    }

    #[test]
    fn update_groups_never_assigns_manual_groups() {
        // Arrange
        let mut windows = vec![win(1, "Notepad")];
        let mut engine = GroupingEngine::new();
        let manual = engine.create_manual_group("Empty", &mut []);

        // Act
        windows.push(win(2, "Notepad"));
        engine.update_groups(&mut windows);

        // Assert
        assert!(engine.get(&manual).unwrap().is_empty());
        for w in &windows {
            assert_ne!(w.group_id, Some(manual));
        }
    }

    #[test]
    fn empty_manual_group_survives_update() {
        // Arrange
        let mut windows = vec![win(1, "Notepad")];
        let mut engine = GroupingEngine::new();
        let manual = engine.create_manual_group("Pinned", &mut [&mut windows[0]]);

        // Act
        windows.clear();
        engine.update_groups(&mut windows);

        // Assert
        assert!(engine.get(&manual).is_some());
    }

    #[test]
    fn add_to_group_is_exclusive() {
        // Arrange
        let mut windows = vec![win(1, "Notepad"), win(2, "Notepad")];
        let mut engine = GroupingEngine::new();
        engine.update_groups(&mut windows);
        let auto = engine.by_process_name("Notepad").unwrap().id;
        let manual = engine.create_manual_group("Mine", &mut []);

        // Act
        engine.add_to_group(&manual, &mut windows[0]).unwrap();

        // Assert
        assert_eq!(engine.get(&manual).unwrap().members, vec![1]);
        assert_eq!(engine.get(&auto).unwrap().members, vec![2]);
        assert_eq!(windows[0].group_id, Some(manual));
        let holders = engine.groups().iter().filter(|g| g.contains(1)).count();
        assert_eq!(holders, 1);
    }

    #[test]
    fn moving_last_member_out_deletes_auto_group() {
        // Arrange
        let mut windows = vec![win(1, "Calc")];
        let mut engine = GroupingEngine::new();
        engine.update_groups(&mut windows);
        let manual = engine.create_manual_group("Tools", &mut []);

        // Act
        engine.add_to_group(&manual, &mut windows[0]).unwrap();

        // Assert
        assert!(engine.by_process_name("Calc").is_none());
        assert_eq!(engine.groups().len(), 1);
    }

    #[test]
    fn remove_from_manual_group_keeps_the_group() {
        // Arrange
        let mut windows = vec![win(1, "Notepad")];
        let mut engine = GroupingEngine::new();
        let manual = engine.create_manual_group("Mine", &mut [&mut windows[0]]);

        // Act
        engine.remove_from_group(&manual, &mut windows[0]).unwrap();

        // Assert
        assert!(engine.get(&manual).unwrap().is_empty());
        assert_eq!(windows[0].group_id, None);
    }

    #[test]
    fn removed_window_returns_to_auto_group_on_next_update() {
        // Arrange
        let mut windows = vec![win(1, "Notepad")];
        let mut engine = GroupingEngine::new();
        let manual = engine.create_manual_group("Mine", &mut [&mut windows[0]]);
        engine.remove_from_group(&manual, &mut windows[0]).unwrap();

        // Act
        engine.update_groups(&mut windows);

        // Assert
        let auto = engine.by_process_name("Notepad").unwrap();
        assert_eq!(windows[0].group_id, Some(auto.id));
    }

    #[test]
    fn delete_group_clears_member_references() {
        // Arrange
        let mut windows = vec![win(1, "Notepad"), win(2, "Code")];
        let mut engine = GroupingEngine::new();
        let manual = {
            let (a, b) = windows.split_at_mut(1);
            engine.create_manual_group("Pair", &mut [&mut a[0], &mut b[0]])
        };

        // Act
        engine.delete_group(&manual, &mut windows).unwrap();

        // Assert
        assert!(engine.get(&manual).is_none());
        assert!(windows.iter().all(|w| w.group_id.is_none()));
    }

    #[test]
    fn unknown_group_is_an_error() {
        // Arrange
        let mut engine = GroupingEngine::new();
        let mut window = win(1, "Notepad");

        // Act
        let result = engine.add_to_group(&GroupId::new(), &mut window);

        // Assert
        assert!(matches!(result, Err(Error::UnknownGroup(_))));
    }

    #[test]
    fn manual_groups_are_listed_first() {
        // Arrange
        let mut windows = vec![win(1, "Notepad")];
        let mut engine = GroupingEngine::new();
        engine.update_groups(&mut windows);

        // Act
        let manual = engine.create_manual_group("Mine", &mut []);

        // Assert
        assert_eq!(engine.groups()[0].id, manual);
    }

    #[test]
    fn manual_groups_round_trip_through_process_names() {
        // Arrange
        let mut windows = vec![win(1, "Notepad"), win(2, "Code"), win(3, "Paint")];
        let mut engine = GroupingEngine::new();
        let id = {
            let (a, b) = windows.split_at_mut(1);
            engine.create_manual_group("Editors", &mut [&mut a[0], &mut b[0]])
        };
        let saved = engine.manual_group_data(&windows);

        // Act
        let mut fresh_windows = vec![win(10, "Notepad"), win(11, "Code"), win(12, "Paint")];
        let mut restored = GroupingEngine::new();
        restored.restore_manual_groups(&saved, &mut fresh_windows);
        restored.update_groups(&mut fresh_windows);

        // Assert
        let group = restored.get(&id).unwrap();
        assert_eq!(group.name, "Editors");
        assert_eq!(group.members, vec![10, 11]);
        assert_eq!(fresh_windows[2].group_id, Some(restored.by_process_name("Paint").unwrap().id));
    }

    #[test]
    fn topology_only_includes_enabled_multi_member_groups() {
        // Arrange
        let mut windows = vec![win(1, "Notepad"), win(2, "Notepad"), win(3, "Code")];
        let mut engine = GroupingEngine::new();
        engine.update_groups(&mut windows);
        let notepad = engine.by_process_name("Notepad").unwrap().id;
        let code = engine.by_process_name("Code").unwrap().id;
        engine.set_linked_drag(&notepad, true).unwrap();
        engine.set_linked_drag(&code, true).unwrap();

        // Act
        let topology = engine.link_topology(&windows);

        // Assert
        assert!(topology.peers_of(1).is_some());
        assert!(topology.peers_of(3).is_none());
    }

    #[test]
    fn topology_peers_carry_record_rect_and_inclusion() {
        // Arrange
        let mut windows = vec![win(1, "Notepad"), win(2, "Notepad")];
        windows[0].rect = Rect::new(900, 700, 400, 300);
        windows[1].rect = Rect::new(1500, 700, 400, 300);
        windows[1].include_in_linked_drag = false;
        let mut engine = GroupingEngine::new();
        engine.update_groups(&mut windows);
        let notepad = engine.by_process_name("Notepad").unwrap().id;
        engine.set_linked_drag(&notepad, true).unwrap();

        // Act
        let topology = engine.link_topology(&windows);

        // Assert
        let peers = topology.peers_of(1).unwrap();
        assert_eq!(
            peers,
            &[
                LinkPeer { hwnd: 1, included: true, rect: Rect::new(900, 700, 400, 300) },
                LinkPeer { hwnd: 2, included: false, rect: Rect::new(1500, 700, 400, 300) },
            ]
        );
    }

    #[test]
    fn display_header_counts_members() {
        // Arrange
        let mut windows = vec![win(1, "Notepad"), win(2, "Notepad")];
        let mut engine = GroupingEngine::new();

        // Act
        engine.group_by_process(&mut windows);

        // Assert
        assert_eq!(engine.groups()[0].display_header(), "Notepad (2 windows)");
    }
}
