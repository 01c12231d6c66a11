use clap::Subcommand;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use lucent_core::WindowPreset;
use lucent_core::ipc::{Command, PresetTarget};

use super::args::parse_hwnd;
use super::send;

#[derive(Subcommand)]
pub enum PresetCommands {
    /// List presets; the index is what `apply_preset` hotkeys refer to
    List,
    /// Create a preset with default values (800x600, 100%, not topmost)
    Create { name: String },
    /// Create a preset from a window's current size, opacity and topmost state
    FromWindow {
        name: String,
        #[arg(value_parser = parse_hwnd)]
        hwnd: usize,
    },
    /// Create a cascading preset from a group
    FromGroup {
        name: String,
        /// Group id or name
        group: String,
    },
    /// Copy a preset under "<name> (Copy)"
    Duplicate {
        /// Preset id or name
        preset: String,
    },
    /// Delete a preset
    Delete {
        /// Preset id or name
        preset: String,
    },
    /// Apply a preset to a window or a group
    Apply {
        /// Preset id or name
        preset: String,
        /// Target window handle
        #[arg(long, value_parser = parse_hwnd, conflicts_with = "group", required_unless_present = "group")]
        window: Option<usize>,
        /// Target group id or name
        #[arg(long)]
        group: Option<String>,
    },
}

pub fn execute(command: PresetCommands) {
    let command = match command {
        PresetCommands::List => return list(),
        PresetCommands::Create { name } => Command::CreatePreset { name },
        PresetCommands::FromWindow { name, hwnd } => Command::PresetFromWindow { name, hwnd },
        PresetCommands::FromGroup { name, group } => Command::PresetFromGroup { name, group },
        PresetCommands::Duplicate { preset } => Command::DuplicatePreset { preset },
        PresetCommands::Delete { preset } => Command::DeletePreset { preset },
        PresetCommands::Apply {
            preset,
            window,
            group,
        } => {
            let target = match (window, group) {
                (Some(hwnd), _) => PresetTarget::Window { hwnd },
                (None, Some(group)) => PresetTarget::Group { group },
                // clap enforces one of the two.
                (None, None) => return,
            };
            Command::ApplyPreset { preset, target }
        }
    };
    send::execute(command);
}

fn list() {
    let presets: Vec<WindowPreset> = send::fetch(&Command::ListPresets);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").set_alignment(CellAlignment::Right),
            Cell::new("Name"),
            Cell::new("Size"),
            Cell::new("Opacity").set_alignment(CellAlignment::Right),
            Cell::new("Topmost"),
            Cell::new("Cascade"),
        ]);

    for (index, preset) in presets.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index).set_alignment(CellAlignment::Right),
            Cell::new(&preset.name),
            Cell::new(size(preset)),
            Cell::new(preset.opacity.map(|o| format!("{o}%")).unwrap_or_default())
                .set_alignment(CellAlignment::Right),
            Cell::new(match preset.topmost {
                Some(true) => "on",
                Some(false) => "off",
                None => "",
            }),
            Cell::new(cascade(preset)),
        ]);
    }

    println!("{table}");
}

fn size(preset: &WindowPreset) -> String {
    match (preset.width, preset.height) {
        (Some(w), Some(h)) => format!("{w}x{h}"),
        (Some(w), None) => format!("{w}x-"),
        (None, Some(h)) => format!("-x{h}"),
        (None, None) => String::new(),
    }
}

fn cascade(preset: &WindowPreset) -> String {
    let c = &preset.cascade;
    if !c.enabled {
        return String::new();
    }
    format!("{:?} +{}/+{}", c.direction, c.offset_x, c.offset_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_column_tolerates_partial_overrides() {
        // Arrange
        let mut preset = WindowPreset::named("Tall");
        preset.width = None;
        preset.height = Some(900);

        // Act / Assert
        assert_eq!(size(&preset), "-x900");
    }

    #[test]
    fn cascade_column_is_blank_when_disabled() {
        // Arrange
        let mut preset = WindowPreset::named("Flat");
        preset.cascade.enabled = false;

        // Act / Assert
        assert_eq!(cascade(&preset), "");
    }
}
