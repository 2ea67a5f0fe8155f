use std::collections::{HashMap, HashSet};

use image::imageops::{self, FilterType};
use log::{debug, warn};
use wgpu::util::DeviceExt;

use crate::error::AssetLoadError;
use crate::texture::{TextureImage, TextureSlot};

/// Color space an image is sampled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TextureUsage {
    /// Base color maps, decoded from sRGB by the sampler.
    Color,
    /// Normal maps, sampled as raw data.
    Data,
}

impl TextureUsage {
    fn format(self) -> wgpu::TextureFormat {
        match self {
            Self::Color => wgpu::TextureFormat::Rgba8UnormSrgb,
            Self::Data => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

pub(crate) struct GpuTexture {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        image: &TextureImage,
        usage: TextureUsage,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: usage.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &image.pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }

    fn solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        rgba: [u8; 4],
        usage: TextureUsage,
    ) -> Self {
        let image = TextureImage::new(1, 1, rgba.to_vec());
        Self::upload(device, queue, label, &image, usage)
    }
}

/// GPU copies of loaded texture slots plus the 1x1 stand-ins bound while a
/// slot is pending or failed.
pub(crate) struct TextureCache {
    pub sampler: wgpu::Sampler,
    white: GpuTexture,
    flat_normal: GpuTexture,
    uploaded: HashMap<(usize, TextureUsage), GpuTexture>,
    rejected: HashSet<(usize, TextureUsage)>,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            sampler,
            white: GpuTexture::solid(device, queue, "fallback-white", [255; 4], TextureUsage::Color),
            flat_normal: GpuTexture::solid(
                device,
                queue,
                "fallback-normal",
                [128, 128, 255, 255],
                TextureUsage::Data,
            ),
            uploaded: HashMap::new(),
            rejected: HashSet::new(),
        }
    }

    /// Uploads `slot` once its image has arrived. Returns whether a real
    /// image is available for it.
    pub fn ensure(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        slot: &TextureSlot,
        usage: TextureUsage,
    ) -> bool {
        let key = (slot.id(), usage);
        if self.uploaded.contains_key(&key) {
            return true;
        }
        if self.rejected.contains(&key) {
            return false;
        }
        let Some(image) = slot.image() else {
            return false;
        };
        let max_dimension = device.limits().max_texture_dimension_2d;
        let image = match fit_to_limit(slot.reference(), image, max_dimension) {
            Ok(image) => image,
            Err(err) => {
                warn!("{err}; using the fallback texture");
                self.rejected.insert(key);
                return false;
            }
        };
        debug!(
            "uploading texture {} ({}x{})",
            slot.reference(),
            image.width,
            image.height
        );
        let texture = GpuTexture::upload(device, queue, slot.reference(), &image, usage);
        self.uploaded.insert(key, texture);
        true
    }

    /// View to bind for `slot`: the uploaded image, or the fallback.
    pub fn view(&self, slot: Option<&TextureSlot>, usage: TextureUsage) -> &wgpu::TextureView {
        slot.and_then(|slot| self.uploaded.get(&(slot.id(), usage)))
            .map(|texture| &texture.view)
            .unwrap_or(match usage {
                TextureUsage::Color => &self.white.view,
                TextureUsage::Data => &self.flat_normal.view,
            })
    }
}

/// Shrinks `image` so neither side exceeds `max_dimension`, keeping its
/// aspect ratio. Images that already fit are returned untouched.
pub(crate) fn fit_to_limit(
    reference: &str,
    image: TextureImage,
    max_dimension: u32,
) -> Result<TextureImage, AssetLoadError> {
    if image.width == 0 || image.height == 0 {
        return Err(AssetLoadError::new(reference, "image has no pixels"));
    }
    let longest = image.width.max(image.height);
    if longest <= max_dimension {
        return Ok(image);
    }
    if max_dimension == 0 {
        return Err(AssetLoadError::new(reference, "device does not support textures"));
    }

    let scale = f64::from(max_dimension) / f64::from(longest);
    let width = ((f64::from(image.width) * scale).round() as u32).clamp(1, max_dimension);
    let height = ((f64::from(image.height) * scale).round() as u32).clamp(1, max_dimension);
    warn!(
        "texture {reference} is {}x{}, above the device limit of {max_dimension}; downscaling to {width}x{height}",
        image.width, image.height
    );

    let source = image::RgbaImage::from_raw(image.width, image.height, image.pixels.to_vec())
        .ok_or_else(|| AssetLoadError::new(reference, "pixel buffer does not match its size"))?;
    let resized = imageops::resize(&source, width, height, FilterType::Triangle);
    Ok(TextureImage::new(width, height, resized.into_raw()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn checker(width: u32, height: u32) -> TextureImage {
        let pixels = (0..width * height)
            .flat_map(|i| if i % 2 == 0 { [255; 4] } else { [0, 0, 0, 255] })
            .collect();
        TextureImage::new(width, height, pixels)
    }

    #[test]
    fn images_within_the_limit_are_kept() {
        let image = checker(64, 32);
        let fitted = fit_to_limit("moon.png", image.clone(), 64).unwrap();
        assert_eq!(fitted, image);
    }

    #[test]
    fn oversized_images_are_downscaled_to_the_limit() {
        let fitted = fit_to_limit("moon.png", checker(256, 64), 32).unwrap();
        assert_eq!((fitted.width, fitted.height), (32, 8));
        assert_eq!(fitted.pixels.len(), 32 * 8 * 4);

        let fitted = fit_to_limit("moon.png", checker(3, 1000), 10).unwrap();
        assert_eq!((fitted.width, fitted.height), (1, 10));
    }

    #[test]
    fn malformed_images_are_rejected() {
        let truncated = TextureImage {
            width: 8,
            height: 8,
            pixels: Arc::from(vec![0u8; 10]),
        };
        let err = fit_to_limit("moon.png", truncated, 4).unwrap_err();
        assert_eq!(err.reference, "moon.png");

        let empty = TextureImage::new(0, 4, Vec::new());
        assert!(fit_to_limit("moon.png", empty, 4).is_err());
    }
}
