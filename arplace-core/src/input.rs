//! Screen-space input from the UI layer.

use crate::config::MAX_DEVICE_PIXEL_RATIO;

/// A point in normalized device coordinates, both axes in `[-1, 1]`,
/// origin at the screen center and +Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const CENTER: ScreenPoint = ScreenPoint { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Convert a pixel position (origin top-left, +Y down) inside a
    /// `width` x `height` surface.
    pub fn from_pixels(px: f32, py: f32, width: f32, height: f32) -> Self {
        let width = width.max(1.0);
        let height = height.max(1.0);
        Self {
            x: (px / width) * 2.0 - 1.0,
            y: -((py / height) * 2.0 - 1.0),
        }
    }
}

/// Output surface size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size of a surface of `css_width` x `css_height` logical pixels,
    /// with the device pixel ratio capped at [`MAX_DEVICE_PIXEL_RATIO`].
    pub fn from_css(css_width: f32, css_height: f32, device_pixel_ratio: f32) -> Self {
        Self::from_css_clamped(css_width, css_height, device_pixel_ratio, MAX_DEVICE_PIXEL_RATIO)
    }

    pub fn from_css_clamped(
        css_width: f32,
        css_height: f32,
        device_pixel_ratio: f32,
        max_ratio: f32,
    ) -> Self {
        // A missing or bogus ratio counts as 1
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio.min(max_ratio)
        } else {
            1.0
        };
        Self {
            width: (css_width.max(0.0) * dpr) as u32,
            height: (css_height.max(0.0) * dpr) as u32,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_corners() {
        let top_left = ScreenPoint::from_pixels(0.0, 0.0, 400.0, 200.0);
        assert_eq!(top_left, ScreenPoint::new(-1.0, 1.0));

        let bottom_right = ScreenPoint::from_pixels(400.0, 200.0, 400.0, 200.0);
        assert_eq!(bottom_right, ScreenPoint::new(1.0, -1.0));

        let center = ScreenPoint::from_pixels(200.0, 100.0, 400.0, 200.0);
        assert_eq!(center, ScreenPoint::CENTER);
    }

    #[test]
    fn test_device_pixel_ratio_is_capped() {
        assert_eq!(Viewport::from_css(100.0, 50.0, 3.0), Viewport::new(200, 100));
        assert_eq!(Viewport::from_css(100.0, 50.0, 1.5), Viewport::new(150, 75));
        assert_eq!(Viewport::from_css(100.0, 50.0, f32::NAN), Viewport::new(100, 50));
    }
}
