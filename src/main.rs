#[cfg(not(target_arch = "wasm32"))]
use anyhow::{Context, Result};
#[cfg(not(target_arch = "wasm32"))]
use log::info;

#[cfg(not(target_arch = "wasm32"))]
use rocket_scene::{
    rocket_lights, rocket_recipe, FileTextureLoader, PartFactory, SceneAssembler, SceneGraph,
    ViewerConfig,
};

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<()> {
    let config = ViewerConfig::from_env().context("failed to read viewer configuration")?;
    info!("loading textures from {}", config.assets.display());
    let loader = FileTextureLoader::new(&config.assets);

    let factory = PartFactory::new(&loader);
    let scene = SceneAssembler::new(&factory)
        .assemble(&rocket_recipe(), &rocket_lights())
        .context("failed to assemble the rocket scene")?;

    if config.headless {
        print_summary(&scene, &loader);
        Ok(())
    } else {
        rocket_scene::app::run_native(config, scene)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn print_summary(scene: &SceneGraph, loader: &FileTextureLoader) {
    let lights = scene
        .children()
        .iter()
        .filter(|child| child.as_light().is_some())
        .count();
    println!(
        "Assembled scene with {} children ({} parts, {} lights)",
        scene.children().len(),
        scene.children().len() - lights,
        lights
    );
    for child in scene.children() {
        let position = child.transform().position;
        println!(
            " - {} ({}) pos=({:.2}, {:.2}, {:.2})",
            child.name(),
            child.content().label(),
            position.x,
            position.y,
            position.z
        );
    }

    loader.wait();
    for slot in scene.texture_slots() {
        println!(" - texture {}: {}", slot.reference(), slot.state().label());
    }
}
