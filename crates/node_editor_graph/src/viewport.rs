// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pan/zoom state of the canvas.

use serde::{Deserialize, Serialize};

/// Default zoom step per wheel notch
pub const DEFAULT_ZOOM_STEP: f64 = 0.1;

/// Default lower bound for the zoom factor
pub const MIN_ZOOM: f64 = 0.1;

/// A 2D point (canvas or screen space, depending on context)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// The origin
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of the editor area, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Size {
    /// Create a size
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Result of a zoom request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomOutcome {
    /// Zoom changed to the contained factor
    Changed(f64),
    /// Zoom would have dropped below the floor; nothing changed
    Rejected,
}

/// Canvas pan offset and zoom factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Pan offset in screen pixels
    pub position: Point,
    /// Zoom factor (1.0 = 100%)
    pub zoom: f64,
}

impl Viewport {
    /// Create a viewport at the origin with no zoom
    pub fn new() -> Self {
        Self {
            position: Point::ZERO,
            zoom: 1.0,
        }
    }

    /// Move the pan offset back to the origin
    pub fn reset_position(&mut self) {
        self.position = Point::ZERO;
    }

    /// Step the zoom factor in the direction given by a wheel delta.
    ///
    /// Positive `delta_y` zooms out, anything else zooms in. The floor is
    /// never lower than [`MIN_ZOOM`].
    pub fn zoom_by_wheel(&mut self, delta_y: f64, step: f64, min_zoom: f64) -> ZoomOutcome {
        let direction = if delta_y > 0.0 { -1.0 } else { 1.0 };
        let zoom = round_zoom(self.zoom + direction * step.abs());
        if !zoom.is_finite() || zoom < min_zoom.max(MIN_ZOOM) {
            return ZoomOutcome::Rejected;
        }
        self.zoom = zoom;
        ZoomOutcome::Changed(zoom)
    }

    /// Start a pan drag at the given mouse position
    pub fn begin_pan(&self, mouse: Point) -> PanSession {
        PanSession {
            mouse_start: mouse,
            position_start: self.position,
        }
    }

    /// Canvas position of a context-menu click.
    ///
    /// The canvas is centered in the editor and scaled by the zoom factor.
    pub fn menu_to_canvas(&self, menu_position: Point, editor_size: Size) -> Point {
        Point::new(
            menu_position.x / self.zoom - editor_size.width / (2.0 * self.zoom),
            menu_position.y / self.zoom - editor_size.height / (2.0 * self.zoom),
        )
    }

    /// Map a canvas position to editor-local screen space
    pub fn canvas_to_screen(&self, canvas: Point, editor_size: Size) -> Point {
        Point::new(
            canvas.x * self.zoom + editor_size.width / 2.0 + self.position.x,
            canvas.y * self.zoom + editor_size.height / 2.0 + self.position.y,
        )
    }

    /// Map an editor-local screen position to canvas space
    pub fn screen_to_canvas(&self, screen: Point, editor_size: Size) -> Point {
        Point::new(
            (screen.x - self.position.x - editor_size.width / 2.0) / self.zoom,
            (screen.y - self.position.y - editor_size.height / 2.0) / self.zoom,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

// Repeated 0.1 steps drift (0.7000000000000001); snap to a fixed grid.
fn round_zoom(zoom: f64) -> f64 {
    (zoom * 1e6).round() / 1e6
}

/// A pan drag in progress.
///
/// Holds the mouse and viewport positions captured when the drag began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanSession {
    mouse_start: Point,
    position_start: Point,
}

impl PanSession {
    /// Viewport position for the current mouse position.
    ///
    /// The offset is in screen pixels and is not scaled by the zoom factor.
    pub fn position_for(&self, mouse: Point) -> Point {
        Point::new(
            self.position_start.x + mouse.x - self.mouse_start.x,
            self.position_start.y + mouse.y - self.mouse_start.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_floor() {
        let mut viewport = Viewport { zoom: 0.2, ..Viewport::new() };
        assert_eq!(
            viewport.zoom_by_wheel(1.0, DEFAULT_ZOOM_STEP, MIN_ZOOM),
            ZoomOutcome::Changed(0.1)
        );
        assert_eq!(
            viewport.zoom_by_wheel(1.0, DEFAULT_ZOOM_STEP, MIN_ZOOM),
            ZoomOutcome::Rejected
        );
        assert_eq!(viewport.zoom, 0.1);
    }

    #[test]
    fn test_floor_holds_for_lower_min_zoom() {
        let mut viewport = Viewport::new();
        for _ in 0..20 {
            viewport.zoom_by_wheel(1.0, DEFAULT_ZOOM_STEP, 0.0);
        }
        assert_eq!(viewport.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_negative_step_still_zooms_out() {
        let mut viewport = Viewport::new();
        assert_eq!(viewport.zoom_by_wheel(1.0, -0.1, MIN_ZOOM), ZoomOutcome::Changed(0.9));
    }

    #[test]
    fn test_zoom_out_from_one_reaches_floor() {
        let mut viewport = Viewport::new();
        let mut steps = 0;
        while let ZoomOutcome::Changed(_) = viewport.zoom_by_wheel(1.0, DEFAULT_ZOOM_STEP, MIN_ZOOM) {
            steps += 1;
        }
        assert_eq!(steps, 9);
        assert_eq!(viewport.zoom, 0.1);
    }

    #[test]
    fn test_zoom_in_has_no_ceiling() {
        let mut viewport = Viewport::new();
        for _ in 0..50 {
            viewport.zoom_by_wheel(-1.0, DEFAULT_ZOOM_STEP, MIN_ZOOM);
        }
        assert_eq!(viewport.zoom, 6.0);
    }

    #[test]
    fn test_pan_session_is_unscaled() {
        let viewport = Viewport {
            position: Point::new(10.0, -5.0),
            zoom: 2.0,
        };
        let session = viewport.begin_pan(Point::new(100.0, 100.0));
        assert_eq!(session.position_for(Point::new(130.0, 90.0)), Point::new(40.0, -15.0));
    }

    #[test]
    fn test_menu_to_canvas() {
        let viewport = Viewport { zoom: 2.0, ..Viewport::new() };
        let canvas = viewport.menu_to_canvas(Point::new(500.0, 300.0), Size::new(800.0, 600.0));
        assert_eq!(canvas, Point::new(50.0, 0.0));
    }

    #[test]
    fn test_screen_canvas_inverse() {
        let viewport = Viewport {
            position: Point::new(12.0, 34.0),
            zoom: 1.5,
        };
        let size = Size::new(640.0, 480.0);
        let canvas = Point::new(-20.0, 75.0);
        let back = viewport.screen_to_canvas(viewport.canvas_to_screen(canvas, size), size);
        assert!((back.x - canvas.x).abs() < 1e-9);
        assert!((back.y - canvas.y).abs() < 1e-9);
    }
}
