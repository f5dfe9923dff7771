//! Pointer tracking.
//!
//! The background only cares about one thing from input: where the pointer
//! is, in normalized device coordinates. Desktop tracks the mouse cursor,
//! mobile tracks the first moving touch. The raw position becomes a
//! *target*; the position the animator sees eases toward it a little every
//! frame so the repulsion field glides instead of jumping.

use glam::Vec2;
use winit::event::{TouchPhase, WindowEvent};

/// Fraction of the remaining distance covered per frame.
pub const POINTER_EASING: f32 = 0.05;

/// Which window events move the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Mouse,
    Touch,
}

/// Eased pointer position in normalized device coordinates.
///
/// Origin is at the center of the window, X increases to the right and
/// Y increases upward.
#[derive(Debug, Default)]
pub struct Pointer {
    target: Vec2,
    current: Vec2,
    window_size: (u32, u32),
}

impl Pointer {
    /// Create a pointer resting at the window center.
    pub fn new() -> Self {
        Self {
            window_size: (800, 600),
            ..Default::default()
        }
    }

    /// Where the pointer is heading.
    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Eased position used by the animator.
    pub fn current(&self) -> Vec2 {
        self.current
    }

    /// Update window size for NDC calculations.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Move the target to a position in physical pixels.
    pub fn move_to(&mut self, x: f64, y: f64) {
        let (w, h) = self.window_size;
        if w == 0 || h == 0 {
            return;
        }
        self.target = Vec2::new(
            (x as f32 / w as f32) * 2.0 - 1.0,
            1.0 - (y as f32 / h as f32) * 2.0,
        );
    }

    /// Advance the eased position one frame toward the target.
    pub fn smooth(&mut self) {
        self.current += (self.target - self.current) * POINTER_EASING;
    }

    /// Process a winit window event from the given source.
    ///
    /// Returns `true` if the event moved the target.
    pub fn handle_event(&mut self, event: &WindowEvent, source: PointerSource) -> bool {
        match (event, source) {
            (WindowEvent::CursorMoved { position, .. }, PointerSource::Mouse) => {
                self.move_to(position.x, position.y);
                true
            }
            (WindowEvent::Touch(touch), PointerSource::Touch)
                if matches!(touch.phase, TouchPhase::Started | TouchPhase::Moved) =>
            {
                self.move_to(touch.location.x, touch.location.y);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::{DeviceId, Touch};

    #[test]
    fn test_move_to_ndc() {
        let mut pointer = Pointer::new();
        pointer.set_window_size(800, 600);

        pointer.move_to(400.0, 300.0);
        assert!(pointer.target().length() < 1e-6);

        pointer.move_to(0.0, 0.0);
        assert_eq!(pointer.target(), Vec2::new(-1.0, 1.0));

        pointer.move_to(800.0, 600.0);
        assert_eq!(pointer.target(), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_zero_size_window_ignored() {
        let mut pointer = Pointer::new();
        pointer.set_window_size(0, 600);
        pointer.move_to(10.0, 10.0);
        assert_eq!(pointer.target(), Vec2::ZERO);
    }

    fn cursor_moved(x: f64, y: f64) -> WindowEvent {
        WindowEvent::CursorMoved {
            device_id: unsafe { DeviceId::dummy() },
            position: PhysicalPosition::new(x, y),
        }
    }

    fn touch(phase: TouchPhase, x: f64, y: f64) -> WindowEvent {
        WindowEvent::Touch(Touch {
            device_id: unsafe { DeviceId::dummy() },
            phase,
            location: PhysicalPosition::new(x, y),
            force: None,
            id: 0,
        })
    }

    fn sized_pointer() -> Pointer {
        let mut pointer = Pointer::new();
        pointer.set_window_size(800, 600);
        pointer
    }

    #[test]
    fn test_mouse_source_follows_cursor() {
        let mut pointer = sized_pointer();
        assert!(pointer.handle_event(&cursor_moved(800.0, 0.0), PointerSource::Mouse));
        assert_eq!(pointer.target(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_touch_source_follows_started_and_moved() {
        let mut pointer = sized_pointer();
        assert!(pointer.handle_event(&touch(TouchPhase::Started, 0.0, 600.0), PointerSource::Touch));
        assert_eq!(pointer.target(), Vec2::new(-1.0, -1.0));

        assert!(pointer.handle_event(&touch(TouchPhase::Moved, 400.0, 300.0), PointerSource::Touch));
        assert!(pointer.target().length() < 1e-6);
    }

    #[test]
    fn test_touch_end_and_cancel_ignored() {
        let mut pointer = sized_pointer();
        assert!(!pointer.handle_event(&touch(TouchPhase::Ended, 0.0, 0.0), PointerSource::Touch));
        assert!(!pointer.handle_event(&touch(TouchPhase::Cancelled, 0.0, 0.0), PointerSource::Touch));
        assert_eq!(pointer.target(), Vec2::ZERO);
    }

    #[test]
    fn test_events_from_other_source_ignored() {
        let mut pointer = sized_pointer();
        assert!(!pointer.handle_event(&cursor_moved(0.0, 0.0), PointerSource::Touch));
        assert!(!pointer.handle_event(&touch(TouchPhase::Moved, 0.0, 0.0), PointerSource::Mouse));
        assert!(!pointer.handle_event(&WindowEvent::Focused(true), PointerSource::Mouse));
        assert_eq!(pointer.target(), Vec2::ZERO);
    }

    #[test]
    fn test_smoothing_eases_toward_target() {
        let mut pointer = Pointer::new();
        pointer.set_window_size(100, 100);
        pointer.move_to(100.0, 50.0);

        pointer.smooth();
        assert!((pointer.current().x - 0.05).abs() < 1e-6);

        for _ in 0..500 {
            pointer.smooth();
        }
        assert!((pointer.current().x - 1.0).abs() < 1e-3);
    }
}
