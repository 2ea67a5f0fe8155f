//! winit application shell: owns the window, forwards input to the
//! [`ViewportController`] and drives the render loop.

use std::sync::Arc;

use log::{error, info};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

use crate::config::ViewerConfig;
use crate::error::SceneError;
use crate::orbit::{PointerButton, PointerEvent};
use crate::render::Renderer;
use crate::scene::SceneGraph;
use crate::viewport::ViewportController;

const WINDOW_TITLE: &str = "Rocket Scene";
/// Pixels of trackpad scroll that count as one wheel line.
const PIXELS_PER_LINE: f64 = 40.0;

/// Events delivered to the app through its [`EventLoopProxy`].
pub enum UserEvent {
    /// The renderer finished initialising off the event loop (browser only).
    RendererReady(Result<Renderer, SceneError>),
}

/// Application state: uninitialized until the first `resumed`, then
/// rendering the assembled scene.
pub struct ViewerApp {
    config: ViewerConfig,
    scene: Option<SceneGraph>,
    controller: Option<ViewportController<Renderer>>,
    window_requested: bool,
    cursor: Option<PhysicalPosition<f64>>,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: EventLoopProxy<UserEvent>,
    #[cfg(target_arch = "wasm32")]
    canvas: Option<web_sys::HtmlCanvasElement>,
    error: Option<SceneError>,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig, scene: SceneGraph, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            config,
            scene: Some(scene),
            controller: None,
            window_requested: false,
            cursor: None,
            proxy,
            #[cfg(target_arch = "wasm32")]
            canvas: None,
            error: None,
        }
    }

    /// Renders into an existing canvas element instead of a new one.
    #[cfg(target_arch = "wasm32")]
    pub fn with_canvas(mut self, canvas: web_sys::HtmlCanvasElement) -> Self {
        self.canvas = Some(canvas);
        self
    }

    /// The fatal error that stopped the event loop, if any.
    pub fn take_error(&mut self) -> Option<SceneError> {
        self.error.take()
    }

    fn window_attributes(&self) -> winit::window::WindowAttributes {
        let (width, height) = self.config.window_size;
        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(width as f64, height as f64));
        #[cfg(target_arch = "wasm32")]
        let attributes = {
            use winit::platform::web::WindowAttributesExtWebSys;
            attributes.with_canvas(self.canvas.clone())
        };
        attributes
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start_renderer(&mut self, event_loop: &ActiveEventLoop, window: Arc<Window>) {
        let renderer = pollster::block_on(Renderer::new(window))
            .map_err(|err| SceneError::backend(format!("{err:#}")));
        self.install(event_loop, renderer);
    }

    #[cfg(target_arch = "wasm32")]
    fn start_renderer(&mut self, _event_loop: &ActiveEventLoop, window: Arc<Window>) {
        let proxy = self.proxy.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let renderer = Renderer::new(window)
                .await
                .map_err(|err| SceneError::backend(format!("{err:#}")));
            if proxy.send_event(UserEvent::RendererReady(renderer)).is_err() {
                error!("event loop closed before the renderer was ready");
            }
        });
    }

    fn install(&mut self, event_loop: &ActiveEventLoop, renderer: Result<Renderer, SceneError>) {
        let Some(scene) = self.scene.take() else {
            return;
        };
        let controller = renderer.and_then(|renderer| {
            let size = renderer.size();
            let mut controller = ViewportController::new(
                scene,
                self.config.camera(),
                self.config.orbit_controls(),
                renderer,
            )?;
            controller.resize(size.width, size.height);
            Ok(controller)
        });
        match controller {
            Ok(controller) => {
                info!("viewer ready");
                controller.surface().window().request_redraw();
                self.controller = Some(controller);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: SceneError) {
        error!("{err}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn pointer_event(&mut self, event: &WindowEvent) -> Option<PointerEvent> {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_mouse_button(*button)?;
                Some(match state {
                    ElementState::Pressed => PointerEvent::Pressed(button),
                    ElementState::Released => PointerEvent::Released(button),
                })
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position)?;
                Some(PointerEvent::Moved {
                    dx: (position.x - previous.x) as f32,
                    dy: (position.y - previous.y) as f32,
                })
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                None
            }
            WindowEvent::MouseWheel { delta, .. } => Some(PointerEvent::Wheel(match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_LINE) as f32,
            })),
            _ => None,
        }
    }
}

impl ApplicationHandler<UserEvent> for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window_requested {
            return;
        }
        self.window_requested = true;
        match event_loop.create_window(self.window_attributes()) {
            Ok(window) => self.start_renderer(event_loop, Arc::new(window)),
            Err(err) => self.fail(
                event_loop,
                SceneError::backend(format!("failed to create window: {err}")),
            ),
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::RendererReady(renderer) => self.install(event_loop, renderer),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let owns_window = self
            .controller
            .as_ref()
            .is_some_and(|controller| controller.surface().window_id() == window_id);
        if !owns_window {
            return;
        }
        if let Some(pointer) = self.pointer_event(&event) {
            if let Some(controller) = self.controller.as_mut() {
                controller.handle_pointer(pointer);
            }
            return;
        }

        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        let result = match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Resized(size) => {
                controller.resize(size.width, size.height);
                Ok(())
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = controller.surface().window().inner_size();
                controller.resize(size.width, size.height);
                Ok(())
            }
            WindowEvent::RedrawRequested => controller.frame(),
            _ => Ok(()),
        };
        if let Err(err) = result {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(controller) = &self.controller {
            controller.surface().window().request_redraw();
        }
    }
}

fn map_mouse_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Opens a window and renders `scene` until it is closed.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_native(config: ViewerConfig, scene: SceneGraph) -> anyhow::Result<()> {
    use anyhow::Context;
    use winit::event_loop::{ControlFlow, EventLoop};

    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = ViewerApp::new(config, scene, event_loop.create_proxy());
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;
    match app.take_error() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_buttons_map_to_orbit_buttons() {
        assert_eq!(map_mouse_button(MouseButton::Left), Some(PointerButton::Primary));
        assert_eq!(map_mouse_button(MouseButton::Right), Some(PointerButton::Secondary));
        assert_eq!(map_mouse_button(MouseButton::Middle), Some(PointerButton::Middle));
        assert_eq!(map_mouse_button(MouseButton::Back), None);
    }
}
