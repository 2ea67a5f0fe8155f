//! Texture slots and the loaders that fill them.
//!
//! Loading is fire-and-forget: [`TextureLoader::load`] hands back a slot in
//! the [`TextureState::Unloaded`] state straight away and the loader fills it
//! in place once the image has been read and decoded.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::RwLock;

use crate::error::AssetLoadError;

/// Decoded RGBA8 image.
#[derive(Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl TextureImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            pixels: Arc::from(pixels.into_boxed_slice()),
        }
    }
}

impl fmt::Debug for TextureImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Load progress of a texture slot.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureState {
    Unloaded,
    Loaded(TextureImage),
    Failed(AssetLoadError),
}

impl TextureState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loaded(_) => "loaded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Shared cell embedded in a material that a loader completes in place.
#[derive(Clone)]
pub struct TextureSlot {
    reference: String,
    state: Arc<RwLock<TextureState>>,
}

impl TextureSlot {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            state: Arc::new(RwLock::new(TextureState::Unloaded)),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn state(&self) -> TextureState {
        self.state.read().clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.state.read(), TextureState::Unloaded)
    }

    /// Returns the image once the slot has been filled.
    pub fn image(&self) -> Option<TextureImage> {
        match &*self.state.read() {
            TextureState::Loaded(image) => Some(image.clone()),
            _ => None,
        }
    }

    /// Stable identity of the underlying cell, shared by all clones.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.state) as usize
    }

    /// Records the outcome of a load. Only the first completion is kept.
    pub fn complete(&self, result: Result<TextureImage, AssetLoadError>) {
        let mut state = self.state.write();
        if !matches!(*state, TextureState::Unloaded) {
            debug!("ignoring repeated completion for texture {}", self.reference);
            return;
        }
        *state = match result {
            Ok(image) => {
                debug!(
                    "texture {} loaded ({}x{})",
                    self.reference, image.width, image.height
                );
                TextureState::Loaded(image)
            }
            Err(err) => {
                warn!("{err}; falling back to the base color");
                TextureState::Failed(err)
            }
        };
    }
}

impl PartialEq for TextureSlot {
    /// Slots are equal when they refer to the same asset, whatever their
    /// load progress or identity.
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl fmt::Debug for TextureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureSlot")
            .field("reference", &self.reference)
            .field("state", &self.state.read().label())
            .finish()
    }
}

/// Backend seam that resolves opaque texture references.
pub trait TextureLoader {
    /// Starts resolving `reference` and returns the slot it will fill.
    fn load(&self, reference: &str) -> TextureSlot;
}

impl<T> TextureLoader for Arc<T>
where
    T: TextureLoader + ?Sized,
{
    fn load(&self, reference: &str) -> TextureSlot {
        (**self).load(reference)
    }
}

/// Decodes an encoded image (PNG or JPEG) into RGBA8 pixels.
pub fn decode_texture(reference: &str, bytes: &[u8]) -> Result<TextureImage, AssetLoadError> {
    let image = image::load_from_memory(bytes).map_err(|err| AssetLoadError::new(reference, err))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(TextureImage::new(width, height, rgba.into_raw()))
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::FileTextureLoader;
#[cfg(target_arch = "wasm32")]
pub use web::FetchTextureLoader;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::{Path, PathBuf};
    use std::thread::{self, JoinHandle};

    use parking_lot::Mutex;

    use super::{decode_texture, TextureLoader, TextureSlot};
    use crate::error::AssetLoadError;

    /// Reads textures from disk on short-lived worker threads.
    #[derive(Debug)]
    pub struct FileTextureLoader {
        base_dir: PathBuf,
        pending: Mutex<Vec<JoinHandle<()>>>,
    }

    impl FileTextureLoader {
        pub fn new(base_dir: impl Into<PathBuf>) -> Self {
            Self {
                base_dir: base_dir.into(),
                pending: Mutex::new(Vec::new()),
            }
        }

        pub fn base_dir(&self) -> &Path {
            &self.base_dir
        }

        /// Blocks until every load started so far has completed.
        pub fn wait(&self) {
            let handles: Vec<_> = self.pending.lock().drain(..).collect();
            for handle in handles {
                if handle.join().is_err() {
                    log::error!("texture loader thread panicked");
                }
            }
        }
    }

    impl TextureLoader for FileTextureLoader {
        fn load(&self, reference: &str) -> TextureSlot {
            let slot = TextureSlot::new(reference);
            let target = slot.clone();
            let path = self.base_dir.join(reference);
            let name = reference.to_string();

            let spawned = thread::Builder::new()
                .name("texture-loader".into())
                .spawn(move || {
                    let result = std::fs::read(&path)
                        .map_err(|err| AssetLoadError::new(&name, format!("{}: {err}", path.display())))
                        .and_then(|bytes| decode_texture(&name, &bytes));
                    target.complete(result);
                });

            match spawned {
                Ok(handle) => self.pending.lock().push(handle),
                Err(err) => slot.complete(Err(AssetLoadError::new(
                    reference,
                    format!("could not start loader thread: {err}"),
                ))),
            }
            slot
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use js_sys::Uint8Array;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::{spawn_local, JsFuture};

    use super::{decode_texture, TextureLoader, TextureSlot};
    use crate::error::AssetLoadError;

    /// Fetches textures relative to a base URL from the browser.
    #[derive(Debug, Clone)]
    pub struct FetchTextureLoader {
        base_url: String,
    }

    impl FetchTextureLoader {
        pub fn new(base_url: impl Into<String>) -> Self {
            Self {
                base_url: base_url.into(),
            }
        }

        fn url_for(&self, reference: &str) -> String {
            if self.base_url.is_empty() {
                reference.to_string()
            } else {
                format!("{}/{}", self.base_url.trim_end_matches('/'), reference)
            }
        }
    }

    impl TextureLoader for FetchTextureLoader {
        fn load(&self, reference: &str) -> TextureSlot {
            let slot = TextureSlot::new(reference);
            let target = slot.clone();
            let url = self.url_for(reference);
            let name = reference.to_string();
            spawn_local(async move {
                let result = fetch_bytes(&url)
                    .await
                    .map_err(|message| AssetLoadError::new(&name, message))
                    .and_then(|bytes| decode_texture(&name, &bytes));
                target.complete(result);
            });
            slot
        }
    }

    async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
        let window = web_sys::window().ok_or("window not available")?;
        let response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|err| format!("fetch failed: {err:?}"))?;
        let response: web_sys::Response = response
            .dyn_into()
            .map_err(|_| "fetch did not return a Response".to_string())?;
        if !response.ok() {
            return Err(format!("HTTP status {}", response.status()));
        }
        let buffer = response
            .array_buffer()
            .map_err(|err| format!("unreadable body: {err:?}"))?;
        let buffer = JsFuture::from(buffer)
            .await
            .map_err(|err| format!("unreadable body: {err:?}"))?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_transitions_once() {
        let slot = TextureSlot::new("moon.jpg");
        assert!(slot.is_pending());
        slot.complete(Ok(TextureImage::new(1, 1, vec![255; 4])));
        assert_eq!(slot.image().map(|image| image.width), Some(1));

        slot.complete(Err(AssetLoadError::new("moon.jpg", "late failure")));
        assert_eq!(slot.state().label(), "loaded");
    }

    #[test]
    fn clones_share_state() {
        let slot = TextureSlot::new("normal.jpg");
        let clone = slot.clone();
        assert_eq!(slot.id(), clone.id());
        clone.complete(Err(AssetLoadError::new("normal.jpg", "missing")));
        assert!(matches!(slot.state(), TextureState::Failed(_)));
    }

    #[test]
    fn slots_compare_by_reference() {
        let a = TextureSlot::new("moon.jpg");
        let b = TextureSlot::new("moon.jpg");
        a.complete(Ok(TextureImage::new(1, 1, vec![0; 4])));
        assert_eq!(a, b);
        assert_ne!(a.id(), b.id());
        assert_ne!(a, TextureSlot::new("other.jpg"));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_texture("broken.jpg", b"not an image").unwrap_err();
        assert_eq!(err.reference, "broken.jpg");
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn file_loader_fills_slots_in_place() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::from_pixel(2, 3, image::Rgba([200, 10, 10, 255]))
            .save(dir.path().join("red.png"))
            .unwrap();

        let loader = FileTextureLoader::new(dir.path());
        let found = loader.load("red.png");
        let missing = loader.load("missing.png");
        loader.wait();

        let image = found.image().expect("texture should be loaded");
        assert_eq!((image.width, image.height), (2, 3));
        assert_eq!(&image.pixels[..4], &[200, 10, 10, 255]);
        match missing.state() {
            TextureState::Failed(err) => assert_eq!(err.reference, "missing.png"),
            other => panic!("expected a failed load, got {other:?}"),
        }
    }
}
