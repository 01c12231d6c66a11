//! Applying presets and layouts to live windows.
//!
//! Every change is written through the [`WindowApi`] and mirrored into
//! the in-memory record so the registry does not have to wait for the
//! next poll.

use std::collections::HashSet;

use crate::layout::WindowLayout;
use crate::preset::{Override, WindowPreset};
use crate::window::{WindowApi, WindowRecord};
use crate::{Rect, Result};

/// Outcome of a best-effort bulk operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub total: usize,
}

fn apply_override(api: &dyn WindowApi, window: &mut WindowRecord, change: Override) -> Result<()> {
    let hwnd = window.hwnd;
    match change {
        Override::Opacity(percent) => {
            api.set_opacity(hwnd, percent)?;
            window.opacity = percent;
        }
        Override::Topmost(topmost) => {
            if window.topmost != topmost {
                api.set_topmost(hwnd, topmost)?;
                window.topmost = topmost;
            }
        }
        Override::Size { width, height } => {
            let width = width.unwrap_or(window.rect.width);
            let height = height.unwrap_or(window.rect.height);
            api.set_size(hwnd, width, height)?;
            window.rect.width = width;
            window.rect.height = height;
        }
    }
    Ok(())
}

/// Applies every field the preset sets to one window.
///
/// Cascade settings are ignored for a single window.
pub fn apply_to_window(api: &dyn WindowApi, preset: &WindowPreset, window: &mut WindowRecord) -> Result<()> {
    for change in preset.overrides() {
        apply_override(api, window, change)?;
    }
    Ok(())
}

/// Applies a preset to each member of a group, in member order.
///
/// With cascading enabled each window is placed at a running cursor that
/// starts at the preset's start point (or the first member's position)
/// and advances one step per member. A member that fails is logged and
/// skipped.
pub fn apply_to_group(
    api: &dyn WindowApi,
    preset: &WindowPreset,
    members: &mut [&mut WindowRecord],
) -> ApplyReport {
    let mut report = ApplyReport {
        applied: 0,
        total: members.len(),
    };
    let Some(first) = members.first() else {
        return report;
    };

    let cascade = &preset.cascade;
    let mut cursor = (
        cascade.start_x.unwrap_or(first.rect.x),
        cascade.start_y.unwrap_or(first.rect.y),
    );
    let (step_x, step_y) = cascade
        .direction
        .step(cascade.offset_x, cascade.offset_y);

    for window in members.iter_mut() {
        let result = if cascade.enabled {
            apply_cascaded(api, preset, window, cursor)
        } else {
            apply_to_window(api, preset, window)
        };
        match result {
            Ok(()) => report.applied += 1,
            Err(e) => log::warn!("Preset '{}' skipped 0x{:X}: {e}", preset.name, window.hwnd),
        }
        if cascade.enabled {
            cursor = (cursor.0 + step_x, cursor.1 + step_y);
        }
    }
    log::info!(
        "Applied preset '{}' to {} of {} windows",
        preset.name,
        report.applied,
        report.total
    );
    report
}

fn apply_cascaded(
    api: &dyn WindowApi,
    preset: &WindowPreset,
    window: &mut WindowRecord,
    (x, y): (i32, i32),
) -> Result<()> {
    for change in preset.overrides() {
        if !matches!(change, Override::Size { .. }) {
            apply_override(api, window, change)?;
        }
    }
    let target = Rect::new(
        x,
        y,
        preset.width.unwrap_or(window.rect.width),
        preset.height.unwrap_or(window.rect.height),
    );
    api.set_rect(window.hwnd, &target)?;
    window.rect = target;
    Ok(())
}

/// Restores a saved layout onto the current windows.
///
/// Each entry is matched to at most one window and each window receives
/// at most one entry. Unmatched entries are skipped silently. The rect is
/// always applied; opacity and topmost only when the entry has them.
pub fn restore_layout(api: &dyn WindowApi, layout: &WindowLayout, windows: &mut [WindowRecord]) -> ApplyReport {
    let mut report = ApplyReport {
        applied: 0,
        total: layout.entries.len(),
    };
    let mut claimed = HashSet::new();

    for entry in &layout.entries {
        let Some(index) = entry.find_match(windows, &claimed) else {
            continue;
        };
        let window = &mut windows[index];
        claimed.insert(window.hwnd);

        let mut changes = Vec::new();
        if let Some(opacity) = entry.opacity {
            changes.push(Override::Opacity(opacity));
        }
        if let Some(topmost) = entry.topmost {
            changes.push(Override::Topmost(topmost));
        }

        let result = api.set_rect(window.hwnd, &entry.rect).and_then(|()| {
            window.rect = entry.rect;
            changes
                .into_iter()
                .try_for_each(|change| apply_override(api, window, change))
        });
        match result {
            Ok(()) => report.applied += 1,
            Err(e) => log::warn!("Layout '{}' skipped 0x{:X}: {e}", layout.name, window.hwnd),
        }
    }
    log::info!(
        "Restored {} of {} windows from layout '{}'",
        report.applied,
        report.total,
        layout.name
    );
    report
}

/// A bulk opacity change, prepared on the main thread and run elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOpacity {
    pub handles: Vec<usize>,
    pub percent: u8,
}

/// Handles that were actually changed by a [`BulkOpacity`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOpacityDone {
    pub applied: Vec<usize>,
    pub percent: u8,
}

impl BulkOpacity {
    /// Sets the opacity of every handle, skipping windows that fail.
    pub fn run(&self, api: &dyn WindowApi) -> BulkOpacityDone {
        let applied = self
            .handles
            .iter()
            .copied()
            .filter(|&hwnd| match api.set_opacity(hwnd, self.percent) {
                Ok(()) => true,
                Err(e) => {
                    log::debug!("Bulk opacity skipped 0x{hwnd:X}: {e}");
                    false
                }
            })
            .collect();
        BulkOpacityDone {
            applied,
            percent: self.percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeWindowApi;
    use crate::layout::LayoutEntry;
    use crate::preset::{Cascade, CascadeDirection};
    use crate::registry::WindowRegistry;

    fn registry_of(api: &FakeWindowApi) -> WindowRegistry {
        let mut registry = WindowRegistry::new();
        registry.refresh(api).unwrap();
        registry
    }

    #[test]
    fn absent_fields_leave_window_untouched() {
        // Arrange
        let api = FakeWindowApi::new();
        api.add(1, "Doc", "Notepad", Rect::new(10, 20, 300, 200));
        let mut registry = registry_of(&api);
        let mut preset = WindowPreset::named("Dim");
        preset.opacity = Some(40);

        // Act
        apply_to_window(&api, &preset, registry.get_mut(1).unwrap()).unwrap();

        // Assert
        let window = registry.get(1).unwrap();
        assert_eq!(window.opacity, 40);
        assert_eq!(window.rect, Rect::new(10, 20, 300, 200));
        assert!(api.moves().is_empty());
        assert_eq!(api.opacity(1).unwrap(), 40);
    }

    #[test]
    fn partial_size_keeps_other_dimension() {
        // Arrange
        let api = FakeWindowApi::new();
        api.add(1, "Doc", "Notepad", Rect::new(10, 20, 300, 200));
        let mut registry = registry_of(&api);
        let mut preset = WindowPreset::named("Wide");
        preset.width = Some(900);

        // Act
        apply_to_window(&api, &preset, registry.get_mut(1).unwrap()).unwrap();

        // Assert
        assert_eq!(api.window(1).rect, Rect::new(10, 20, 900, 200));
        assert_eq!(registry.get(1).unwrap().rect.width, 900);
    }

    #[test]
    fn topmost_only_changes_when_different() {
        // Arrange
        let api = FakeWindowApi::new();
        api.add(1, "Doc", "Notepad", Rect::new(0, 0, 300, 200));
        let mut registry = registry_of(&api);
        let mut preset = WindowPreset::named("Pin");
        preset.topmost = Some(true);

        // Act
        apply_to_window(&api, &preset, registry.get_mut(1).unwrap()).unwrap();

        // Assert
        assert!(api.window(1).topmost);
        assert!(registry.get(1).unwrap().topmost);
    }

    #[test]
    fn cascade_places_members_at_running_offsets() {
        // Arrange
        let api = FakeWindowApi::new();
        api.add(1, "One", "Code", Rect::new(100, 100, 800, 600));
        api.add(2, "Two", "Code", Rect::new(500, 500, 800, 600));
        api.add(3, "Three", "Code", Rect::new(0, 0, 800, 600));
        let mut registry = registry_of(&api);
        let mut preset = WindowPreset::named("Stack");
        preset.cascade = Cascade {
            enabled: true,
            offset_x: 30,
            offset_y: 30,
            direction: CascadeDirection::BottomRight,
            start_x: None,
            start_y: None,
        };

        // Act
        let mut members: Vec<&mut WindowRecord> = registry.windows_mut().iter_mut().collect();
        let report = apply_to_group(&api, &preset, &mut members);

        // Assert
        assert_eq!(report, ApplyReport { applied: 3, total: 3 });
        let positions: Vec<(i32, i32)> = api.moves().iter().map(|(_, r)| r.position()).collect();
        assert_eq!(positions, vec![(100, 100), (130, 130), (160, 160)]);
    }

    #[test]
    fn cascade_honours_explicit_start_and_size() {
        // Arrange
        let api = FakeWindowApi::new();
        api.add(1, "One", "Code", Rect::new(100, 100, 800, 600));
        api.add(2, "Two", "Code", Rect::new(500, 500, 800, 600));
        let mut registry = registry_of(&api);
        let mut preset = WindowPreset::named("Column");
        preset.width = Some(640);
        preset.cascade = Cascade {
            enabled: true,
            offset_y: 50,
            direction: CascadeDirection::Down,
            start_x: Some(0),
            start_y: Some(10),
            ..Cascade::default()
        };

        // Act
        let mut members: Vec<&mut WindowRecord> = registry.windows_mut().iter_mut().collect();
        apply_to_group(&api, &preset, &mut members);

        // Assert
        assert_eq!(api.window(1).rect, Rect::new(0, 10, 640, 600));
        assert_eq!(api.window(2).rect, Rect::new(0, 60, 640, 600));
        assert_eq!(registry.get(2).unwrap().rect, Rect::new(0, 60, 640, 600));
    }

    #[test]
    fn group_apply_skips_failing_member() {
        // Arrange
        let api = FakeWindowApi::new();
        api.add(1, "One", "Code", Rect::new(0, 0, 800, 600));
        api.add(2, "Two", "Code", Rect::new(0, 0, 800, 600));
        let mut registry = registry_of(&api);
        api.close(1);
        let mut preset = WindowPreset::named("Dim");
        preset.opacity = Some(50);

        // Act
        let mut members: Vec<&mut WindowRecord> = registry.windows_mut().iter_mut().collect();
        let report = apply_to_group(&api, &preset, &mut members);

        // Assert
        assert_eq!(report, ApplyReport { applied: 1, total: 2 });
        assert_eq!(registry.get(2).unwrap().opacity, 50);
    }

    #[test]
    fn restore_prefers_exact_title_match() {
        // Arrange
        let api = FakeWindowApi::new();
        api.add(1, "notes.txt - Notepad", "Notepad", Rect::new(0, 0, 300, 300));
        api.add(2, "Untitled - Notepad", "Notepad", Rect::new(0, 0, 300, 300));
        let mut registry = registry_of(&api);
        let layout = WindowLayout {
            entries: vec![LayoutEntry {
                process_name: "Notepad".into(),
                title_pattern: Some("Untitled - Notepad".into()),
                rect: Rect::new(50, 60, 700, 500),
                opacity: Some(80),
                topmost: None,
                monitor_id: String::new(),
            }],
            ..WindowLayout::capture("Desk", &[])
        };

        // Act
        let report = restore_layout(&api, &layout, registry.windows_mut());

        // Assert
        assert_eq!(report, ApplyReport { applied: 1, total: 1 });
        assert_eq!(api.window(2).rect, Rect::new(50, 60, 700, 500));
        assert_eq!(api.window(1).rect, Rect::new(0, 0, 300, 300));
        assert_eq!(registry.get(2).unwrap().opacity, 80);
    }

    #[test]
    fn restore_spreads_entries_across_windows_of_one_process() {
        // Arrange
        let api = FakeWindowApi::new();
        api.add(1, "A", "Code", Rect::new(0, 0, 300, 300));
        api.add(2, "B", "Code", Rect::new(0, 0, 300, 300));
        let mut registry = registry_of(&api);
        let mut layout = WindowLayout::capture("Twin", registry.windows());
        layout.entries[0].rect = Rect::new(0, 0, 500, 500);
        layout.entries[1].rect = Rect::new(500, 0, 500, 500);
        layout.entries[1].title_pattern = Some("renamed".into());

        // Act
        let report = restore_layout(&api, &layout, registry.windows_mut());

        // Assert
        assert_eq!(report.applied, 2);
        assert_eq!(api.window(1).rect, Rect::new(0, 0, 500, 500));
        assert_eq!(api.window(2).rect, Rect::new(500, 0, 500, 500));
    }

    #[test]
    fn bulk_opacity_reports_only_successes() {
        // Arrange
        let api = FakeWindowApi::new();
        api.add(1, "A", "Code", Rect::new(0, 0, 300, 300));
        api.add(2, "B", "Code", Rect::new(0, 0, 300, 300));
        let bulk = BulkOpacity {
            handles: vec![1, 2, 3],
            percent: 70,
        };

        // Act
        let done = bulk.run(&api);

        // Assert
        assert_eq!(done.applied, vec![1, 2]);
        assert_eq!(api.opacity(2).unwrap(), 70);
    }

    #[test]
    fn restore_counts_unmatched_entries_in_total_only() {
        // Arrange
        let api = FakeWindowApi::new();
        api.add(1, "A", "Code", Rect::new(0, 0, 300, 300));
        let mut registry = registry_of(&api);
        let mut layout = WindowLayout::capture("Mixed", registry.windows());
        let mut ghost = layout.entries[0].clone();
        ghost.process_name = "Paint".into();
        layout.entries.push(ghost);

        // Act
        let report = restore_layout(&api, &layout, registry.windows_mut());

        // Assert
        assert_eq!(report, ApplyReport { applied: 1, total: 2 });
    }
}
