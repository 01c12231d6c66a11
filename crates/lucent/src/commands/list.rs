use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use lucent_core::ipc::Command;
use lucent_core::{WindowGroup, WindowRecord};

use super::args::format_hwnd;
use super::send;

pub fn execute() {
    let windows: Vec<WindowRecord> = send::fetch(&Command::ListWindows);
    let groups: Vec<WindowGroup> = send::fetch(&Command::ListGroups);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("HWND"),
            Cell::new("Process"),
            Cell::new("Title"),
            Cell::new("Opacity").set_alignment(CellAlignment::Right),
            Cell::new("Flags"),
            Cell::new("Group"),
            Cell::new("Position"),
        ]);

    for window in &windows {
        let group = window
            .group_id
            .and_then(|id| groups.iter().find(|g| g.id == id))
            .map(|g| g.name.clone())
            .unwrap_or_default();
        let r = window.rect;

        table.add_row(vec![
            Cell::new(format_hwnd(window.hwnd)),
            Cell::new(&window.process_name),
            Cell::new(&window.title),
            Cell::new(format!("{}%", window.opacity)).set_alignment(CellAlignment::Right),
            Cell::new(flags(window)),
            Cell::new(group),
            Cell::new(format!("{},{} {}x{}", r.x, r.y, r.width, r.height)),
        ]);
    }

    println!("{table}");
    println!("\n{} windows tracked", windows.len());
}

/// Compact state column: active, topmost, click-through, excluded from linked drag.
fn flags(window: &WindowRecord) -> String {
    [
        (window.active, '*'),
        (window.topmost, 'T'),
        (window.click_through, 'C'),
        (!window.include_in_linked_drag, 'x'),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, c)| *c)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_show_only_set_states() {
        // Arrange
        let mut window = WindowRecord::new(0x10, "Untitled - Notepad", "notepad");
        window.topmost = true;
        window.include_in_linked_drag = false;

        // Act
        let shown = flags(&window);

        // Assert
        assert_eq!(shown, "Tx");
    }
}
