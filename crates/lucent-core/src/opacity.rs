//! Conversion between opacity percent and the OS 0–255 alpha scale.

/// Fully opaque, also the value reported for non-layered windows.
pub const OPAQUE: u8 = 100;

/// Clamps an arbitrary integer into the 0–100 percent range.
pub fn clamp_percent(value: i32) -> u8 {
    value.clamp(0, i32::from(OPAQUE)) as u8
}

/// Converts a percent (0–100) to a layered-window alpha value.
pub fn percent_to_alpha(percent: u8) -> u8 {
    let percent = percent.min(OPAQUE);
    (f64::from(percent) * 2.55).round() as u8
}

/// Converts a layered-window alpha value back to a percent.
pub fn alpha_to_percent(alpha: u8) -> u8 {
    (f64::from(alpha) / 2.55).round() as u8
}

/// Applies a relative change to an opacity, saturating at both ends.
pub fn step(current: u8, delta: i32) -> u8 {
    clamp_percent(i32::from(current) + delta)
}
