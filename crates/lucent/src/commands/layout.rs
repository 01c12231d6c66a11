use clap::Subcommand;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use lucent_core::WindowLayout;
use lucent_core::ipc::Command;

use super::send;

#[derive(Subcommand)]
pub enum LayoutCommands {
    /// List saved layouts
    List,
    /// Save the position, size, opacity and topmost state of every window
    Capture { name: String },
    /// Re-capture the current windows into an existing layout
    Update {
        /// Layout id or name
        layout: String,
    },
    /// Put matching windows back where the layout recorded them
    Restore {
        /// Layout id or name
        layout: String,
    },
    /// Delete a layout
    Delete {
        /// Layout id or name
        layout: String,
    },
}

pub fn execute(command: LayoutCommands) {
    let command = match command {
        LayoutCommands::List => return list(),
        LayoutCommands::Capture { name } => Command::CaptureLayout { name },
        LayoutCommands::Update { layout } => Command::UpdateLayout { layout },
        LayoutCommands::Restore { layout } => Command::RestoreLayout { layout },
        LayoutCommands::Delete { layout } => Command::DeleteLayout { layout },
    };
    send::execute(command);
}

fn list() {
    let layouts: Vec<WindowLayout> = send::fetch(&Command::ListLayouts);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Name"),
            Cell::new("Windows").set_alignment(CellAlignment::Right),
            Cell::new("Modified"),
            Cell::new("Id"),
        ]);

    for layout in &layouts {
        table.add_row(vec![
            Cell::new(&layout.name),
            Cell::new(layout.entries.len()).set_alignment(CellAlignment::Right),
            Cell::new(layout.modified_at.format("%Y-%m-%d %H:%M")),
            Cell::new(layout.id),
        ]);
    }

    println!("{table}");
    println!("\n{} layouts", layouts.len());
}
