use serde::{Deserialize, Serialize};

/// A rectangle representing a window's position and size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the same rectangle shifted by `(dx, dy)`.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Returns the same rectangle placed at `(x, y)`.
    pub fn at(&self, x: i32, y: i32) -> Self {
        Self { x, y, ..*self }
    }

    /// Whether the rectangle has a usable, non-zero area.
    ///
    /// Minimized and half-destroyed windows report zero or negative
    /// extents; those are never moved.
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_keeps_size() {
        // Arrange
        let rect = Rect::new(100, 100, 800, 600);

        // Act
        let moved = rect.offset(30, -20);

        // Assert
        assert_eq!(moved, Rect::new(130, 80, 800, 600));
    }

    #[test]
    fn zero_sized_rect_has_no_area() {
        // Assert
        assert!(!Rect::new(10, 10, 0, 0).has_area());
        assert!(!Rect::new(10, 10, 200, 0).has_area());
        assert!(Rect::new(-8, -8, 1, 1).has_area());
    }
}
