#![cfg(target_arch = "wasm32")]

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use winit::event_loop::EventLoop;
use winit::platform::web::EventLoopExtWebSys;

use crate::app::{UserEvent, ViewerApp};
use crate::assembler::SceneAssembler;
use crate::config::ViewerConfig;
use crate::factory::PartFactory;
use crate::recipe::{rocket_lights, rocket_recipe};
use crate::texture::FetchTextureLoader;

/// Assembles the rocket scene and renders it into the canvas `canvas_id`.
/// Textures are fetched relative to the page.
#[wasm_bindgen]
pub fn run(canvas_id: String) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let config = ViewerConfig::default();
    let loader = FetchTextureLoader::new(config.assets.to_string_lossy());
    let factory = PartFactory::new(&loader);
    let scene = SceneAssembler::new(&factory)
        .assemble(&rocket_recipe(), &rocket_lights())
        .map_err(|err| JsValue::from_str(&format!("failed to assemble scene: {err}")))?;
    log_to_console(&format!(
        "Assembled scene with {} children",
        scene.children().len()
    ));

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("missing document"))?;
    let element = document
        .get_element_by_id(&canvas_id)
        .ok_or_else(|| JsValue::from_str("canvas element not found"))?;
    let canvas: web_sys::HtmlCanvasElement = element
        .dyn_into()
        .map_err(|_| JsValue::from_str("element is not a canvas"))?;

    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .map_err(|err| JsValue::from_str(&format!("failed to create event loop: {err}")))?;
    let app = ViewerApp::new(config, scene, event_loop.create_proxy()).with_canvas(canvas);
    event_loop.spawn_app(app);
    Ok(())
}

fn log_to_console(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}
