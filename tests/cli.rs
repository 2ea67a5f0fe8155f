use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;
use tempfile::TempDir;

fn headless(assets: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rocket-scene").expect("binary exists");
    cmd.env("ROCKET_SCENE_HEADLESS", "1")
        .env("ROCKET_SCENE_ASSETS", assets.path())
        .env_remove("ROCKET_SCENE_SIZE");
    cmd
}

#[test]
fn headless_run_prints_the_scene_summary() {
    let assets = TempDir::new().expect("temp assets");
    headless(&assets)
        .assert()
        .success()
        .stdout(contains(
            "Assembled scene with 14 children (12 parts, 2 lights)",
        ))
        .stdout(contains(" - plane (plane) pos=(0.00, 0.00, 0.00)"))
        .stdout(contains(" - fire (sphere) pos=(0.00, 3.00, 0.00)"))
        .stdout(contains(" - leg1 (group) pos=(-4.00, 0.00, 4.00)"))
        .stdout(contains(" - point_light (point) pos=(100.00, 100.00, 100.00)"));
}

#[test]
fn missing_textures_are_reported_as_failed() {
    let assets = TempDir::new().expect("temp assets");
    headless(&assets)
        .assert()
        .success()
        .stdout(contains(" - texture moon_texture.jpg: failed"))
        .stdout(contains(" - texture normal_moon_texture.jpg: failed"));
}

#[test]
fn readable_textures_are_reported_as_loaded() {
    let assets = TempDir::new().expect("temp assets");
    // The decoder sniffs the format, so PNG bytes under a .jpg name load.
    let mut png = Vec::new();
    image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 200, 200, 255]))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("encode png");
    std::fs::write(assets.path().join("moon_texture.jpg"), &png).expect("write texture");

    headless(&assets)
        .assert()
        .success()
        .stdout(contains(" - texture moon_texture.jpg: loaded"))
        .stdout(contains(" - texture normal_moon_texture.jpg: failed"));
}

#[test]
fn invalid_window_size_exits_with_an_error() {
    let assets = TempDir::new().expect("temp assets");
    headless(&assets)
        .env("ROCKET_SCENE_SIZE", "wide")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("invalid ROCKET_SCENE_SIZE"));
}
