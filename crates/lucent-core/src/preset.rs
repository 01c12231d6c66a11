//! Window presets: reusable target sizes, opacity, topmost and cascade
//! placement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grouping::WindowGroup;
use crate::window::WindowRecord;
use crate::{Error, Result};

/// Direction in which successive cascaded windows are offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeDirection {
    #[default]
    BottomRight,
    TopRight,
    BottomLeft,
    TopLeft,
    Right,
    Left,
    Down,
    Up,
}

impl CascadeDirection {
    /// Signed advance for one cascade step given unsigned offsets.
    pub fn step(self, offset_x: i32, offset_y: i32) -> (i32, i32) {
        let (sx, sy) = match self {
            Self::BottomRight => (1, 1),
            Self::TopRight => (1, -1),
            Self::BottomLeft => (-1, 1),
            Self::TopLeft => (-1, -1),
            Self::Right => (1, 0),
            Self::Left => (-1, 0),
            Self::Down => (0, 1),
            Self::Up => (0, -1),
        };
        (sx * offset_x, sy * offset_y)
    }
}

/// Cascade placement parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cascade {
    pub enabled: bool,
    pub offset_x: i32,
    pub offset_y: i32,
    pub direction: CascadeDirection,
    /// Starting position; defaults to the first member's position.
    pub start_x: Option<i32>,
    pub start_y: Option<i32>,
}

impl Default for Cascade {
    fn default() -> Self {
        Self {
            enabled: false,
            offset_x: 30,
            offset_y: 30,
            direction: CascadeDirection::BottomRight,
            start_x: None,
            start_y: None,
        }
    }
}

/// One attribute a preset sets. Absent preset fields produce no override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    Opacity(u8),
    Topmost(bool),
    /// Either dimension may be missing; the window keeps its own.
    Size { width: Option<i32>, height: Option<i32> },
}

/// A named set of target window attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowPreset {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_process_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_group_id: Option<String>,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default)]
    pub opacity: Option<u8>,
    #[serde(default)]
    pub topmost: Option<bool>,
    #[serde(default)]
    pub cascade: Cascade,
}

impl WindowPreset {
    /// An empty preset that changes nothing.
    pub fn named(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            created_at: now,
            modified_at: now,
            target_process_name: None,
            target_group_id: None,
            width: None,
            height: None,
            opacity: None,
            topmost: None,
            cascade: Cascade::default(),
        }
    }

    /// The attributes this preset sets, in application order.
    pub fn overrides(&self) -> Vec<Override> {
        let mut out = Vec::new();
        if let Some(opacity) = self.opacity {
            out.push(Override::Opacity(opacity.min(100)));
        }
        if let Some(topmost) = self.topmost {
            out.push(Override::Topmost(topmost));
        }
        if self.width.is_some() || self.height.is_some() {
            out.push(Override::Size {
                width: self.width,
                height: self.height,
            });
        }
        out
    }

    fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

/// The preset collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetStore {
    presets: Vec<WindowPreset>,
}

impl PresetStore {
    pub fn new(presets: Vec<WindowPreset>) -> Self {
        Self { presets }
    }

    pub fn presets(&self) -> &[WindowPreset] {
        &self.presets
    }

    pub fn get(&self, index: usize) -> Option<&WindowPreset> {
        self.presets.get(index)
    }

    /// Looks a preset up by id, then by case-insensitive name.
    pub fn find(&self, key: &str) -> Result<&WindowPreset> {
        self.presets
            .iter()
            .find(|p| p.id.to_string() == key)
            .or_else(|| {
                self.presets
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| Error::UnknownPreset(key.to_string()))
    }

    fn position(&self, key: &str) -> Result<usize> {
        let id = self.find(key)?.id;
        self.presets
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::UnknownPreset(key.to_string()))
    }

    fn push(&mut self, preset: WindowPreset) -> &WindowPreset {
        log::info!("Added preset '{}'", preset.name);
        self.presets.push(preset);
        &self.presets[self.presets.len() - 1]
    }

    /// Creates a preset with the stock values: 800x600, fully opaque,
    /// not topmost.
    pub fn create(&mut self, name: &str) -> &WindowPreset {
        let mut preset = WindowPreset::named(name);
        preset.width = Some(800);
        preset.height = Some(600);
        preset.opacity = Some(100);
        preset.topmost = Some(false);
        self.push(preset)
    }

    /// Captures a window's size, opacity and topmost flag.
    pub fn create_from_window(&mut self, name: &str, window: &WindowRecord) -> &WindowPreset {
        let mut preset = WindowPreset::named(name);
        preset.target_process_name = Some(window.process_name.clone());
        preset.width = Some(window.rect.width);
        preset.height = Some(window.rect.height);
        preset.opacity = Some(window.opacity);
        preset.topmost = Some(window.topmost);
        self.push(preset)
    }

    /// Captures a group's first member and turns cascading on.
    pub fn create_from_group(
        &mut self,
        name: &str,
        group: &WindowGroup,
        first: Option<&WindowRecord>,
    ) -> &WindowPreset {
        let mut preset = WindowPreset::named(name);
        preset.target_process_name = group.process_name_filter.clone();
        preset.target_group_id = Some(group.id.to_string());
        if let Some(window) = first {
            preset.width = Some(window.rect.width);
            preset.height = Some(window.rect.height);
            preset.opacity = Some(window.opacity);
            preset.topmost = Some(window.topmost);
        }
        preset.cascade = Cascade {
            enabled: true,
            ..Cascade::default()
        };
        self.push(preset)
    }

    /// Copies a preset under a new id, appending " (Copy)" to the name.
    pub fn duplicate(&mut self, key: &str) -> Result<&WindowPreset> {
        let mut copy = self.find(key)?.clone();
        let now = Utc::now();
        copy.id = Uuid::new_v4();
        copy.name = format!("{} (Copy)", copy.name);
        copy.created_at = now;
        copy.modified_at = now;
        Ok(self.push(copy))
    }

    /// Replaces the preset with the same id and bumps its modified time.
    pub fn update(&mut self, mut preset: WindowPreset) -> Result<()> {
        let index = self.position(&preset.id.to_string())?;
        preset.touch();
        self.presets[index] = preset;
        Ok(())
    }

    pub fn delete(&mut self, key: &str) -> Result<WindowPreset> {
        let index = self.position(key)?;
        let removed = self.presets.remove(index);
        log::info!("Deleted preset '{}'", removed.name);
        Ok(removed)
    }
}
