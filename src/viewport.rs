use log::debug;

use crate::camera::PerspectiveCamera;
use crate::error::SceneError;
use crate::orbit::{OrbitControls, PointerEvent};
use crate::scene::SceneGraph;

/// Drawing backend driven by a [`ViewportController`].
pub trait RenderSurface {
    /// Uploads the static scene. Called once before the first frame.
    fn prepare(&mut self, scene: &SceneGraph) -> Result<(), SceneError>;

    fn resize(&mut self, width: u32, height: u32);

    /// Draws one frame. Transient surface problems are handled by the
    /// backend; only fatal ones are returned.
    fn render(&mut self, camera: &PerspectiveCamera) -> Result<(), SceneError>;
}

/// Owns everything a running viewer needs: the scene, camera, orbit
/// controls and the surface they are drawn to.
pub struct ViewportController<S: RenderSurface> {
    scene: SceneGraph,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    surface: S,
}

impl<S: RenderSurface> ViewportController<S> {
    pub fn new(
        scene: SceneGraph,
        camera: PerspectiveCamera,
        controls: OrbitControls,
        mut surface: S,
    ) -> Result<Self, SceneError> {
        surface.prepare(&scene)?;
        Ok(Self {
            scene,
            camera,
            controls,
            surface,
        })
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Resizes the surface and matches the camera aspect to it. Zero-area
    /// sizes (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        debug!("viewport resized to {width}x{height}");
        self.surface.resize(width, height);
        self.camera.set_aspect(width as f32 / height as f32);
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.controls.handle(event);
    }

    /// Applies pending orbit input, then renders.
    pub fn frame(&mut self) -> Result<(), SceneError> {
        self.controls.update(&mut self.camera);
        self.surface.render(&self.camera)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::orbit::PointerButton;

    #[derive(Default)]
    struct RecordingSurface {
        prepared: usize,
        sizes: Vec<(u32, u32)>,
        eyes: Vec<Vec3>,
    }

    impl RenderSurface for RecordingSurface {
        fn prepare(&mut self, _scene: &SceneGraph) -> Result<(), SceneError> {
            self.prepared += 1;
            Ok(())
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.sizes.push((width, height));
        }

        fn render(&mut self, camera: &PerspectiveCamera) -> Result<(), SceneError> {
            self.eyes.push(camera.position);
            Ok(())
        }
    }

    fn controller() -> ViewportController<RecordingSurface> {
        let camera = PerspectiveCamera::new(45.0, 4.0 / 3.0, 0.1, 1000.0)
            .with_position(Vec3::new(60.0, 30.0, 100.0));
        ViewportController::new(
            SceneGraph::from_children(Vec::new()),
            camera,
            OrbitControls::new(),
            RecordingSurface::default(),
        )
        .unwrap()
    }

    #[test]
    fn new_prepares_the_surface_once() {
        assert_eq!(controller().surface().prepared, 1);
    }

    #[test]
    fn resize_sets_exact_aspect() {
        let mut viewport = controller();
        viewport.resize(1917, 1043);
        assert_eq!(viewport.camera().aspect, 1917.0 / 1043.0);
        assert_eq!(viewport.surface().sizes, [(1917, 1043)]);

        viewport.resize(0, 600);
        assert_eq!(viewport.camera().aspect, 1917.0 / 1043.0);
        assert_eq!(viewport.surface().sizes.len(), 1);
    }

    #[test]
    fn frame_applies_orbit_input_before_rendering() {
        let mut viewport = controller();
        viewport.frame().unwrap();
        viewport.handle_pointer(PointerEvent::Pressed(PointerButton::Primary));
        viewport.handle_pointer(PointerEvent::Moved { dx: 100.0, dy: 0.0 });
        viewport.frame().unwrap();

        let eyes = &viewport.surface().eyes;
        assert_eq!(eyes.len(), 2);
        assert_ne!(eyes[0], eyes[1]);
        assert_eq!(eyes[1], viewport.camera().position);
    }
}
