//! The session ties the engine together for one daemon run.
//!
//! It owns the registry, groups, presets, layouts and settings, and is
//! only ever touched from the daemon's main thread. Work that must run
//! elsewhere (the OS poll, bulk opacity) is prepared here, executed by
//! the caller and folded back in.

use std::sync::Arc;

use crate::apply::{self, BulkOpacity, BulkOpacityDone};
use crate::config::{self, Settings};
use crate::grouping::{GroupId, GroupingEngine, ManualGroupData};
use crate::hotkey::{HotkeyAction, HotkeyCommand};
use crate::ipc::{Command, PresetTarget, Response};
use crate::layout::LayoutStore;
use crate::linked_drag::{LinkTopology, LinkedMove};
use crate::opacity;
use crate::preset::PresetStore;
use crate::registry::{RefreshSummary, WindowRegistry};
use crate::store::{DataDir, LayoutData, PresetData};
use crate::wheel;
use crate::window::{WindowApi, WindowRecord};
use crate::{Error, Result};

/// Default step for opacity hotkeys without a parameter.
const DEFAULT_HOTKEY_STEP: i32 = 10;

pub struct Session {
    api: Arc<dyn WindowApi>,
    settings: Settings,
    registry: WindowRegistry,
    grouping: GroupingEngine,
    presets: PresetStore,
    layouts: LayoutStore,
    data: DataDir,
    /// Saved manual groups, restored once the first window list arrives.
    saved_groups: Option<Vec<ManualGroupData>>,
}

impl Session {
    /// Creates a session and loads presets and layouts from `data`.
    pub fn new(api: Arc<dyn WindowApi>, settings: Settings, data: DataDir) -> Self {
        let preset_data = data.load_presets();
        let layout_data = data.load_layouts();
        log::info!(
            "Loaded {} presets, {} manual groups, {} layouts",
            preset_data.presets.len(),
            preset_data.manual_groups.len(),
            layout_data.layouts.len()
        );
        Self {
            api,
            settings,
            registry: WindowRegistry::new(),
            grouping: GroupingEngine::new(),
            presets: PresetStore::new(preset_data.presets),
            layouts: LayoutStore::new(layout_data.layouts),
            data,
            saved_groups: Some(preset_data.manual_groups),
        }
    }

    pub fn api(&self) -> &Arc<dyn WindowApi> {
        &self.api
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut WindowRegistry {
        &mut self.registry
    }

    pub fn grouping(&self) -> &GroupingEngine {
        &self.grouping
    }

    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    pub fn layouts(&self) -> &LayoutStore {
        &self.layouts
    }

    /// Folds a poll snapshot into the registry and re-partitions groups.
    pub fn apply_snapshot(&mut self, snapshot: Vec<WindowRecord>) -> RefreshSummary {
        let summary = self.registry.reconcile(snapshot);
        if let Some(saved) = self.saved_groups.take() {
            self.grouping
                .restore_manual_groups(&saved, self.registry.windows_mut());
        }
        self.grouping.update_groups(self.registry.windows_mut());
        if !summary.is_empty() {
            log::debug!(
                "Refresh: {} added, {} updated, {} removed",
                summary.added.len(),
                summary.updated.len(),
                summary.removed.len()
            );
        }
        summary
    }

    /// Polls the OS on the calling thread and applies the result.
    pub fn refresh(&mut self) -> Result<RefreshSummary> {
        let snapshot = WindowRegistry::poll(self.api.as_ref())?;
        Ok(self.apply_snapshot(snapshot))
    }

    /// Current linked-drag membership for the coordinator.
    pub fn link_topology(&self) -> LinkTopology {
        self.grouping.link_topology(self.registry.windows())
    }

    /// Mirrors a peer move made by the linked-drag coordinator.
    pub fn mirror_linked_move(&mut self, moved: LinkedMove) {
        self.registry.mirror_rect(moved.hwnd, moved.rect);
    }

    /// Prepares a bulk opacity change over every tracked window.
    pub fn bulk_opacity(&self, percent: Option<u8>) -> BulkOpacity {
        BulkOpacity {
            handles: self.registry.handles().collect(),
            percent: percent.unwrap_or(self.settings.bulk_opacity).min(opacity::OPAQUE),
        }
    }

    /// Mirrors the result of a bulk opacity run.
    pub fn finish_bulk_opacity(&mut self, done: &BulkOpacityDone) {
        for &hwnd in &done.applied {
            self.registry.modify(hwnd, |w| w.opacity = done.percent);
        }
        log::info!("Set {} windows to {}%", done.applied.len(), done.percent);
    }

    /// Runs a hotkey action against the foreground window.
    ///
    /// Bulk opacity is returned for the caller to run off-thread.
    pub fn handle_hotkey(&mut self, command: HotkeyCommand) -> Option<BulkOpacity> {
        if command.action == HotkeyAction::SetAllOpacity {
            let percent = command.parameter.map(opacity::clamp_percent);
            return Some(self.bulk_opacity(percent));
        }
        let Some(hwnd) = self.api.foreground() else {
            log::debug!("Hotkey {} ignored: no foreground window", command.action);
            return None;
        };
        if let Err(e) = self.run_hotkey(hwnd, command) {
            log::warn!("Hotkey {} failed on 0x{hwnd:X}: {e}", command.action);
        }
        None
    }

    fn run_hotkey(&mut self, hwnd: usize, command: HotkeyCommand) -> Result<()> {
        let parameter = command.parameter;
        match command.action {
            HotkeyAction::SetOpacity => {
                let percent = opacity::clamp_percent(parameter.unwrap_or(100));
                self.set_opacity(hwnd, percent)
            }
            HotkeyAction::IncreaseOpacity => {
                self.adjust_opacity(hwnd, parameter.unwrap_or(DEFAULT_HOTKEY_STEP))
            }
            HotkeyAction::DecreaseOpacity => {
                self.adjust_opacity(hwnd, -parameter.unwrap_or(DEFAULT_HOTKEY_STEP))
            }
            HotkeyAction::ToggleTopmost => self.toggle_topmost(hwnd).map(|_| ()),
            HotkeyAction::ToggleClickThrough => self.toggle_click_through(hwnd).map(|_| ()),
            HotkeyAction::ApplyPreset => {
                let index = usize::try_from(parameter.unwrap_or(0)).unwrap_or(0);
                let preset = self
                    .presets
                    .get(index)
                    .ok_or_else(|| Error::UnknownPreset(format!("#{index}")))?;
                let window = self
                    .registry
                    .get_mut(hwnd)
                    .ok_or(Error::UnknownWindow(hwnd))?;
                apply::apply_to_window(self.api.as_ref(), preset, window)
            }
            HotkeyAction::SetAllOpacity => Ok(()),
        }
    }

    /// Handles a Ctrl + wheel event over `hwnd`.
    pub fn handle_wheel(&mut self, hwnd: usize, wheel_delta: i32) {
        let delta = wheel::opacity_delta(wheel_delta, self.settings.opacity_step);
        if delta == 0 {
            return;
        }
        if let Err(e) = self.adjust_opacity(hwnd, delta) {
            log::debug!("Wheel opacity failed on 0x{hwnd:X}: {e}");
        }
    }

    fn set_opacity(&mut self, hwnd: usize, percent: u8) -> Result<()> {
        self.api.set_opacity(hwnd, percent)?;
        self.registry.modify(hwnd, |w| w.opacity = percent);
        Ok(())
    }

    fn adjust_opacity(&mut self, hwnd: usize, delta: i32) -> Result<()> {
        let current = self.api.opacity(hwnd)?;
        self.set_opacity(hwnd, opacity::step(current, delta))
    }

    fn toggle_topmost(&mut self, hwnd: usize) -> Result<bool> {
        let topmost = !self.api.is_topmost(hwnd)?;
        self.api.set_topmost(hwnd, topmost)?;
        self.registry.modify(hwnd, |w| w.topmost = topmost);
        Ok(topmost)
    }

    fn toggle_click_through(&mut self, hwnd: usize) -> Result<bool> {
        let enabled = !self.api.is_click_through(hwnd)?;
        self.api.set_click_through(hwnd, enabled)?;
        let opacity = self.api.opacity(hwnd).ok();
        self.registry.modify(hwnd, |w| {
            w.click_through = enabled;
            if let Some(opacity) = opacity {
                w.opacity = opacity;
            }
        });
        Ok(enabled)
    }

    /// Resolves a group reference: an id, or a case-insensitive name.
    pub fn resolve_group(&self, key: &str) -> Result<GroupId> {
        if let Ok(id) = key.parse::<GroupId>()
            && self.grouping.get(&id).is_some()
        {
            return Ok(id);
        }
        self.grouping
            .groups()
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(key))
            .map(|g| g.id)
            .ok_or_else(|| Error::UnknownGroup(key.to_string()))
    }

    /// Handles an IPC command.
    ///
    /// `Stop` is acknowledged here; stopping the daemon is up to the caller.
    pub fn handle(&mut self, command: Command) -> Response {
        match self.try_handle(command) {
            Ok(response) => response,
            Err(e) => Response::error(e.to_string()),
        }
    }

    fn try_handle(&mut self, command: Command) -> Result<Response> {
        match command {
            Command::Stop => Ok(Response::ok_with_message("Stopping")),
            Command::Status => Ok(Response::ok_with_message(format!(
                "Tracking {} windows in {} groups; {} presets, {} layouts",
                self.registry.len(),
                self.grouping.groups().len(),
                self.presets.presets().len(),
                self.layouts.layouts().len()
            ))),
            Command::Refresh => {
                let summary = self.refresh()?;
                Ok(Response::ok_with_message(format!(
                    "{} added, {} removed",
                    summary.added.len(),
                    summary.removed.len()
                )))
            }
            Command::ListWindows => Ok(Response::ok_with_data(serde_json::to_value(
                self.registry.windows(),
            )?)),
            Command::SetOpacity { hwnd, percent } => {
                self.set_opacity(hwnd, percent.min(opacity::OPAQUE))?;
                Ok(Response::ok())
            }
            Command::ToggleTopmost { hwnd } => {
                let on = self.toggle_topmost(hwnd)?;
                Ok(Response::ok_with_message(format!("Topmost {}", on_off(on))))
            }
            Command::ToggleClickThrough { hwnd } => {
                let on = self.toggle_click_through(hwnd)?;
                Ok(Response::ok_with_message(format!("Click-through {}", on_off(on))))
            }
            Command::MoveWindow { hwnd, rect } => {
                self.api.set_rect(hwnd, &rect)?;
                self.registry.mirror_rect(hwnd, rect);
                Ok(Response::ok())
            }
            Command::BulkOpacity { percent } => {
                let bulk = self.bulk_opacity(percent);
                let done = bulk.run(self.api.as_ref());
                self.finish_bulk_opacity(&done);
                Ok(Response::ok_with_message(format!(
                    "Set {} windows to {}%",
                    done.applied.len(),
                    done.percent
                )))
            }
            Command::ListGroups => Ok(Response::ok_with_data(serde_json::to_value(
                self.grouping.groups(),
            )?)),
            Command::RegroupByProcess => {
                self.grouping.group_by_process(self.registry.windows_mut());
                let count = self
                    .grouping
                    .groups()
                    .iter()
                    .filter(|g| !g.is_manual())
                    .count();
                Ok(Response::ok_with_message(format!("{count} process groups")))
            }
            Command::CreateGroup { name, windows } => {
                let mut members: Vec<&mut WindowRecord> = self
                    .registry
                    .windows_mut()
                    .iter_mut()
                    .filter(|w| windows.contains(&w.hwnd))
                    .collect();
                let id = self.grouping.create_manual_group(&name, &mut members);
                self.save_presets();
                Ok(Response::ok_with_message(id.to_string()))
            }
            Command::AddToGroup { group, hwnd } => {
                let id = self.resolve_group(&group)?;
                let window = self
                    .registry
                    .get_mut(hwnd)
                    .ok_or(Error::UnknownWindow(hwnd))?;
                self.grouping.add_to_group(&id, window)?;
                self.save_presets();
                Ok(Response::ok())
            }
            Command::RemoveFromGroup { group, hwnd } => {
                let id = self.resolve_group(&group)?;
                let window = self
                    .registry
                    .get_mut(hwnd)
                    .ok_or(Error::UnknownWindow(hwnd))?;
                self.grouping.remove_from_group(&id, window)?;
                self.save_presets();
                Ok(Response::ok())
            }
            Command::DeleteGroup { group } => {
                let id = self.resolve_group(&group)?;
                self.grouping.delete_group(&id, self.registry.windows_mut())?;
                // Freed windows go back to their process groups right away.
                self.grouping.update_groups(self.registry.windows_mut());
                self.save_presets();
                Ok(Response::ok())
            }
            Command::SetLinkedDrag { group, enabled } => {
                let id = self.resolve_group(&group)?;
                self.grouping.set_linked_drag(&id, enabled)?;
                Ok(Response::ok_with_message(format!("Linked drag {}", on_off(enabled))))
            }
            Command::SetIncludeInLinkedDrag { hwnd, included } => {
                if !self
                    .registry
                    .modify(hwnd, |w| w.include_in_linked_drag = included)
                {
                    return Err(Error::UnknownWindow(hwnd));
                }
                Ok(Response::ok())
            }
            Command::ListPresets => Ok(Response::ok_with_data(serde_json::to_value(
                self.presets.presets(),
            )?)),
            Command::CreatePreset { name } => {
                let id = self.presets.create(&name).id;
                self.save_presets();
                Ok(Response::ok_with_message(id.to_string()))
            }
            Command::PresetFromWindow { name, hwnd } => {
                let window = self.registry.get(hwnd).ok_or(Error::UnknownWindow(hwnd))?;
                let id = self.presets.create_from_window(&name, window).id;
                self.save_presets();
                Ok(Response::ok_with_message(id.to_string()))
            }
            Command::PresetFromGroup { name, group } => {
                let group_id = self.resolve_group(&group)?;
                let group = self
                    .grouping
                    .get(&group_id)
                    .ok_or_else(|| Error::UnknownGroup(group_id.to_string()))?;
                let first = group.members.first().and_then(|&h| self.registry.get(h));
                let id = self.presets.create_from_group(&name, group, first).id;
                self.save_presets();
                Ok(Response::ok_with_message(id.to_string()))
            }
            Command::DuplicatePreset { preset } => {
                let id = self.presets.duplicate(&preset)?.id;
                self.save_presets();
                Ok(Response::ok_with_message(id.to_string()))
            }
            Command::DeletePreset { preset } => {
                self.presets.delete(&preset)?;
                self.save_presets();
                Ok(Response::ok())
            }
            Command::ApplyPreset { preset, target } => self.apply_preset(&preset, target),
            Command::ListLayouts => Ok(Response::ok_with_data(serde_json::to_value(
                self.layouts.layouts(),
            )?)),
            Command::CaptureLayout { name } => {
                self.refresh_rects();
                let id = self.layouts.capture(&name, self.registry.windows()).id;
                self.save_layouts();
                Ok(Response::ok_with_message(id.to_string()))
            }
            Command::UpdateLayout { layout } => {
                self.refresh_rects();
                self.layouts.update(&layout, self.registry.windows())?;
                self.save_layouts();
                Ok(Response::ok())
            }
            Command::RestoreLayout { layout } => {
                let layout = self.layouts.find(&layout)?;
                let report =
                    apply::restore_layout(self.api.as_ref(), layout, self.registry.windows_mut());
                Ok(Response::ok_with_message(format!(
                    "Restored {} of {} windows",
                    report.applied, report.total
                )))
            }
            Command::DeleteLayout { layout } => {
                self.layouts.delete(&layout)?;
                self.save_layouts();
                Ok(Response::ok())
            }
            Command::SaveSettings => {
                config::save(&self.settings)?;
                Ok(Response::ok())
            }
        }
    }

    fn apply_preset(&mut self, key: &str, target: PresetTarget) -> Result<Response> {
        let preset = self.presets.find(key)?;
        match target {
            PresetTarget::Window { hwnd } => {
                let window = self
                    .registry
                    .get_mut(hwnd)
                    .ok_or(Error::UnknownWindow(hwnd))?;
                apply::apply_to_window(self.api.as_ref(), preset, window)?;
                Ok(Response::ok())
            }
            PresetTarget::Group { group } => {
                let id = self.resolve_group(&group)?;
                let order = self
                    .grouping
                    .get(&id)
                    .map(|g| g.members.clone())
                    .unwrap_or_default();
                let mut members: Vec<&mut WindowRecord> = self
                    .registry
                    .windows_mut()
                    .iter_mut()
                    .filter(|w| order.contains(&w.hwnd))
                    .collect();
                members.sort_by_key(|w| order.iter().position(|&h| h == w.hwnd));
                let report = apply::apply_to_group(self.api.as_ref(), preset, &mut members);
                Ok(Response::ok_with_message(format!(
                    "Applied to {} of {} windows",
                    report.applied, report.total
                )))
            }
        }
    }

    /// Re-reads every tracked window's bounds before a capture.
    fn refresh_rects(&mut self) {
        for window in self.registry.windows_mut() {
            if let Ok(rect) = self.api.rect(window.hwnd) {
                window.rect = rect;
            }
        }
    }

    fn save_presets(&self) {
        self.data.save_presets(&PresetData {
            presets: self.presets.presets().to_vec(),
            manual_groups: self.grouping.manual_group_data(self.registry.windows()),
        });
    }

    fn save_layouts(&self) {
        self.data.save_layouts(&LayoutData {
            layouts: self.layouts.layouts().to_vec(),
        });
    }

    /// Persists everything. Called at shutdown.
    pub fn save_all(&self) {
        self.save_presets();
        self.save_layouts();
        if let Err(e) = config::save(&self.settings) {
            log::error!("Failed to save settings: {e}");
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}
