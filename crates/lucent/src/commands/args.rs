use clap::{Args, ValueEnum};

use lucent_core::Rect;

/// Arguments for the `move` subcommand.
#[derive(Args)]
pub struct MoveArgs {
    /// Window handle (decimal or hex with 0x prefix)
    #[arg(value_parser = parse_hwnd)]
    pub hwnd: usize,
    /// X position in pixels
    #[arg(allow_negative_numbers = true)]
    pub x: i32,
    /// Y position in pixels
    #[arg(allow_negative_numbers = true)]
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl MoveArgs {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(switch: Switch) -> Self {
        switch == Switch::On
    }
}

/// Parses a window handle (decimal, or hex with a 0x prefix as shown by `list`).
pub fn parse_hwnd(s: &str) -> Result<usize, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    match parsed {
        Ok(0) | Err(_) => Err(format!("invalid window handle: {s:?}")),
        Ok(hwnd) => Ok(hwnd),
    }
}

/// Formats a handle the way `list` prints it.
pub fn format_hwnd(hwnd: usize) -> String {
    format!("0x{hwnd:X}")
}
