//! Saved window layouts: absolute positions, sizes, opacity and topmost
//! for a set of windows, matched back to live windows on restore.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::window::WindowRecord;
use crate::{Error, Rect, Result};

/// One captured window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub process_name: String,
    /// Title at capture time, used to tell windows of one process apart.
    #[serde(default)]
    pub title_pattern: Option<String>,
    #[serde(flatten)]
    pub rect: Rect,
    #[serde(default)]
    pub opacity: Option<u8>,
    #[serde(default)]
    pub topmost: Option<bool>,
    #[serde(default)]
    pub monitor_id: String,
}

impl LayoutEntry {
    pub fn capture(window: &WindowRecord) -> Self {
        Self {
            process_name: window.process_name.clone(),
            title_pattern: Some(window.title.clone()),
            rect: window.rect,
            opacity: Some(window.opacity),
            topmost: Some(window.topmost),
            monitor_id: window.monitor_id.clone(),
        }
    }

    /// Picks the live window this entry should be restored onto.
    ///
    /// Tries process + exact title, then process + title containing the
    /// pattern, then process alone. All comparisons ignore case. Windows
    /// in `claimed` were already taken by an earlier entry and are skipped.
    pub fn find_match(&self, windows: &[WindowRecord], claimed: &HashSet<usize>) -> Option<usize> {
        let process = self.process_name.to_lowercase();
        let pattern = self
            .title_pattern
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();

        let candidates: Vec<(usize, String)> = windows
            .iter()
            .enumerate()
            .filter(|(_, w)| !claimed.contains(&w.hwnd))
            .filter(|(_, w)| w.process_name.to_lowercase() == process)
            .map(|(i, w)| (i, w.title.to_lowercase()))
            .collect();

        let exact = candidates.iter().find(|(_, title)| *title == pattern);
        let partial = || {
            if pattern.trim().is_empty() {
                None
            } else {
                candidates.iter().find(|(_, title)| title.contains(&pattern))
            }
        };

        exact
            .or_else(partial)
            .or_else(|| candidates.first())
            .map(|(i, _)| *i)
    }
}

/// A named snapshot of window placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowLayout {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub entries: Vec<LayoutEntry>,
}

impl WindowLayout {
    /// Captures every window in `windows`.
    pub fn capture(name: &str, windows: &[WindowRecord]) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            created_at: now,
            modified_at: now,
            entries: windows.iter().map(LayoutEntry::capture).collect(),
        }
    }
}

/// The layout collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutStore {
    layouts: Vec<WindowLayout>,
}

impl LayoutStore {
    pub fn new(layouts: Vec<WindowLayout>) -> Self {
        Self { layouts }
    }

    pub fn layouts(&self) -> &[WindowLayout] {
        &self.layouts
    }

    /// Looks a layout up by id, then by case-insensitive name.
    pub fn find(&self, key: &str) -> Result<&WindowLayout> {
        self.layouts
            .iter()
            .find(|l| l.id.to_string() == key)
            .or_else(|| self.layouts.iter().find(|l| l.name.eq_ignore_ascii_case(key)))
            .ok_or_else(|| Error::UnknownLayout(key.to_string()))
    }

    fn position(&self, key: &str) -> Result<usize> {
        let id = self.find(key)?.id;
        self.layouts
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| Error::UnknownLayout(key.to_string()))
    }

    pub fn capture(&mut self, name: &str, windows: &[WindowRecord]) -> &WindowLayout {
        let layout = WindowLayout::capture(name, windows);
        log::info!("Captured layout '{name}' with {} windows", layout.entries.len());
        self.layouts.push(layout);
        &self.layouts[self.layouts.len() - 1]
    }

    /// Re-captures an existing layout in place, keeping its id and name.
    pub fn update(&mut self, key: &str, windows: &[WindowRecord]) -> Result<&WindowLayout> {
        let index = self.position(key)?;
        let layout = &mut self.layouts[index];
        layout.entries = windows.iter().map(LayoutEntry::capture).collect();
        layout.modified_at = Utc::now();
        log::info!("Updated layout '{}' with {} windows", layout.name, layout.entries.len());
        Ok(&*layout)
    }

    pub fn delete(&mut self, key: &str) -> Result<WindowLayout> {
        let index = self.position(key)?;
        let removed = self.layouts.remove(index);
        log::info!("Deleted layout '{}'", removed.name);
        Ok(removed)
    }
}
