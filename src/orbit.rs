//! Mouse-driven orbit camera.

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};

use crate::camera::PerspectiveCamera;

const MAX_ELEVATION: f32 = FRAC_PI_2 - 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Input forwarded by the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed(PointerButton),
    Released(PointerButton),
    /// Cursor movement in physical pixels.
    Moved { dx: f32, dy: f32 },
    /// Scroll amount in lines; positive zooms in.
    Wheel(f32),
}

/// Orbits a [`PerspectiveCamera`] around its target.
///
/// Primary drag rotates, secondary drag pans and the wheel zooms. Input is
/// accumulated by [`handle`](Self::handle) and applied once per frame by
/// [`update`](Self::update).
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
    /// Fraction of the orbit distance moved per pixel of drag.
    pub pan_speed: f32,
    /// Distance scale applied per wheel line.
    pub zoom_step: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    rotating: bool,
    panning: bool,
    rotate: Vec2,
    pan: Vec2,
    zoom: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            rotate_speed: 0.005,
            pan_speed: 0.001,
            zoom_step: 0.95,
            min_distance: 5.0,
            max_distance: 500.0,
            rotating: false,
            panning: false,
            rotate: Vec2::ZERO,
            pan: Vec2::ZERO,
            zoom: 0.0,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    pub fn is_dragging(&self) -> bool {
        self.rotating || self.panning
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Pressed(PointerButton::Primary) => self.rotating = true,
            PointerEvent::Pressed(PointerButton::Secondary) => self.panning = true,
            PointerEvent::Released(PointerButton::Primary) => self.rotating = false,
            PointerEvent::Released(PointerButton::Secondary) => self.panning = false,
            PointerEvent::Pressed(_) | PointerEvent::Released(_) => {}
            PointerEvent::Moved { dx, dy } => {
                let delta = Vec2::new(dx, dy);
                if self.rotating {
                    self.rotate += delta;
                } else if self.panning {
                    self.pan += delta;
                }
            }
            PointerEvent::Wheel(lines) => self.zoom += lines,
        }
    }

    /// Applies accumulated input to `camera`. Returns whether it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if self.rotate == Vec2::ZERO && self.pan == Vec2::ZERO && self.zoom == 0.0 {
            return false;
        }

        let offset = camera.position - camera.target;
        let horizontal = (offset.x * offset.x + offset.z * offset.z).sqrt();
        let mut azimuth = offset.x.atan2(offset.z);
        let mut elevation = offset.y.atan2(horizontal);
        let mut radius = offset.length();

        azimuth -= self.rotate.x * self.rotate_speed;
        elevation = (elevation + self.rotate.y * self.rotate_speed)
            .clamp(-MAX_ELEVATION, MAX_ELEVATION);
        radius = (radius * self.zoom_step.powf(self.zoom))
            .clamp(self.min_distance, self.max_distance);

        if self.pan != Vec2::ZERO {
            let forward = (camera.target - camera.position).normalize_or_zero();
            let right = forward.cross(camera.up).normalize_or_zero();
            let up = right.cross(forward);
            let scale = self.pan_speed * radius;
            camera.target += (-self.pan.x * right + self.pan.y * up) * scale;
        }

        camera.position = camera.target
            + radius
                * Vec3::new(
                    elevation.cos() * azimuth.sin(),
                    elevation.sin(),
                    elevation.cos() * azimuth.cos(),
                );

        self.rotate = Vec2::ZERO;
        self.pan = Vec2::ZERO;
        self.zoom = 0.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(45.0, 1.0, 0.1, 1000.0)
            .with_position(Vec3::new(60.0, 30.0, 100.0))
    }

    fn drag(controls: &mut OrbitControls, button: PointerButton, dx: f32, dy: f32) {
        controls.handle(PointerEvent::Pressed(button));
        controls.handle(PointerEvent::Moved { dx, dy });
        controls.handle(PointerEvent::Released(button));
    }

    #[test]
    fn rotating_keeps_the_orbit_distance() {
        let mut camera = camera();
        let mut controls = OrbitControls::new();
        let distance = camera.distance();
        let before = camera.position.x.atan2(camera.position.z);

        drag(&mut controls, PointerButton::Primary, 120.0, -40.0);
        assert!(controls.update(&mut camera));

        let after = camera.position.x.atan2(camera.position.z);
        assert!((before - after - 0.6).abs() < 1e-4);
        assert!((camera.distance() - distance).abs() < 1e-3);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn elevation_stops_short_of_the_pole() {
        let mut camera = camera();
        let mut controls = OrbitControls::new();
        drag(&mut controls, PointerButton::Primary, 0.0, 10_000.0);
        controls.update(&mut camera);
        let offset = camera.position - camera.target;
        assert!(offset.y < offset.length());
        assert!(offset.x.abs() + offset.z.abs() > 0.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = camera();
        let mut controls = OrbitControls::new().with_distance_limits(10.0, 200.0);
        controls.handle(PointerEvent::Wheel(-500.0));
        controls.update(&mut camera);
        assert!((camera.distance() - 200.0).abs() < 1e-3);

        controls.handle(PointerEvent::Wheel(500.0));
        controls.update(&mut camera);
        assert!((camera.distance() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn panning_moves_target_and_eye_together() {
        let mut camera = camera();
        let mut controls = OrbitControls::new();
        let offset = camera.position - camera.target;
        drag(&mut controls, PointerButton::Secondary, 50.0, 0.0);
        controls.update(&mut camera);
        assert_ne!(camera.target, Vec3::ZERO);
        assert!((camera.position - camera.target - offset).length() < 1e-3);
    }

    #[test]
    fn movement_without_a_button_is_ignored() {
        let mut camera = camera();
        let mut controls = OrbitControls::new();
        controls.handle(PointerEvent::Moved { dx: 30.0, dy: 30.0 });
        assert!(!controls.update(&mut camera));
        assert_eq!(camera.position, Vec3::new(60.0, 30.0, 100.0));
    }
}
