use clap::Subcommand;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use lucent_core::ipc::Command;
use lucent_core::{GroupKind, WindowGroup};

use super::args::{Switch, format_hwnd, parse_hwnd};
use super::send;

#[derive(Subcommand)]
pub enum GroupCommands {
    /// List groups, manual groups first
    List,
    /// Create a manual group, optionally seeded with windows
    Create {
        name: String,
        /// Member window handles
        #[arg(value_parser = parse_hwnd)]
        windows: Vec<usize>,
    },
    /// Rebuild the per-process groups; manual groups are untouched
    Regroup,
    /// Add a window to a group
    Add {
        /// Group id or name
        group: String,
        #[arg(value_parser = parse_hwnd)]
        hwnd: usize,
    },
    /// Remove a window from a group
    Remove {
        /// Group id or name
        group: String,
        #[arg(value_parser = parse_hwnd)]
        hwnd: usize,
    },
    /// Delete a group; its windows return to their process group
    Delete {
        /// Group id or name
        group: String,
    },
    /// Turn linked drag on or off for a group
    LinkedDrag {
        /// Group id or name
        group: String,
        #[arg(value_enum)]
        state: Switch,
    },
    /// Include or exclude a window from linked drag
    Include {
        #[arg(value_parser = parse_hwnd)]
        hwnd: usize,
        #[arg(value_enum)]
        state: Switch,
    },
}

pub fn execute(command: GroupCommands) {
    let command = match command {
        GroupCommands::List => return list(),
        GroupCommands::Create { name, windows } => Command::CreateGroup { name, windows },
        GroupCommands::Regroup => Command::RegroupByProcess,
        GroupCommands::Add { group, hwnd } => Command::AddToGroup { group, hwnd },
        GroupCommands::Remove { group, hwnd } => Command::RemoveFromGroup { group, hwnd },
        GroupCommands::Delete { group } => Command::DeleteGroup { group },
        GroupCommands::LinkedDrag { group, state } => Command::SetLinkedDrag {
            group,
            enabled: state.into(),
        },
        GroupCommands::Include { hwnd, state } => Command::SetIncludeInLinkedDrag {
            hwnd,
            included: state.into(),
        },
    };
    send::execute(command);
}

fn list() {
    let groups: Vec<WindowGroup> = send::fetch(&Command::ListGroups);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Group"),
            Cell::new("Kind"),
            Cell::new("Linked drag"),
            Cell::new("Windows"),
            Cell::new("Id"),
        ]);

    for group in &groups {
        let kind = match group.kind {
            GroupKind::Manual => "manual",
            GroupKind::AutoByProcess => "process",
        };
        let members: Vec<String> = group.members.iter().map(|&h| format_hwnd(h)).collect();
        table.add_row(vec![
            Cell::new(group.display_header()),
            Cell::new(kind),
            Cell::new(if group.linked_drag_enabled { "on" } else { "off" })
                .set_alignment(CellAlignment::Center),
            Cell::new(members.join(" ")),
            Cell::new(group.id),
        ]);
    }

    println!("{table}");
}
