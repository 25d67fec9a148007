use image::GenericImageView;
/// Texture loading
/// Decoding happens on the CPU and is cached per name; upload to the GPU is a separate step
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wgpu::{Device, Queue, Texture, TextureView};

use crate::{OrreryError, OrreryResult};

const DEFAULT_EXTENSION: &str = "jpg";

/// Decoded RGBA8 pixels
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureImage {
    /// 1x1 opaque white, drawn when a texture is missing
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        }
    }
}

pub struct TextureAsset {
    pub texture: Texture,
    pub view: TextureView,
    pub width: u32,
    pub height: u32,
}

pub struct AssetManager {
    texture_dir: PathBuf,
    images: HashMap<String, Arc<TextureImage>>,
    textures: HashMap<String, Arc<TextureAsset>>,
}

impl AssetManager {
    pub fn new(texture_dir: impl Into<PathBuf>) -> Self {
        Self {
            texture_dir: texture_dir.into(),
            images: HashMap::new(),
            textures: HashMap::new(),
        }
    }

    pub fn texture_dir(&self) -> &Path {
        &self.texture_dir
    }

    /// `<texture_dir>/<name>.jpg`, or `<texture_dir>/<name>` when the name has an extension
    pub fn texture_path(&self, name: &str) -> PathBuf {
        let path = self.texture_dir.join(name);
        if path.extension().is_some() {
            path
        } else {
            path.with_extension(DEFAULT_EXTENSION)
        }
    }

    pub fn load_image(&mut self, name: &str) -> OrreryResult<Arc<TextureImage>> {
        if let Some(image) = self.images.get(name) {
            return Ok(Arc::clone(image));
        }

        let path = self.texture_path(name);
        let img = image::open(&path).map_err(|e| {
            OrreryError::AssetLoading(format!("Failed to load image {}: {}", path.display(), e))
        })?;
        let (width, height) = img.dimensions();
        let image = Arc::new(TextureImage {
            width,
            height,
            rgba: img.to_rgba8().into_raw(),
        });

        log::debug!("Loaded texture {} ({}x{})", path.display(), width, height);
        self.images.insert(name.to_string(), Arc::clone(&image));
        Ok(image)
    }

    /// Like `load_image`, but a missing or unreadable file yields the white fallback
    pub fn load_image_or_white(&mut self, name: &str) -> Arc<TextureImage> {
        match self.load_image(name) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("{}; drawing {} untextured", e, name);
                let image = Arc::new(TextureImage::white());
                self.images.insert(name.to_string(), Arc::clone(&image));
                image
            }
        }
    }

    /// GPU texture for `name`, uploaded on first use
    pub fn texture(&mut self, device: &Device, queue: &Queue, name: &str) -> Arc<TextureAsset> {
        if let Some(texture) = self.textures.get(name) {
            return Arc::clone(texture);
        }

        let image = self.load_image_or_white(name);
        let texture = Arc::new(Self::create_texture(device, queue, &image, Some(name)));
        self.textures.insert(name.to_string(), Arc::clone(&texture));
        texture
    }

    pub fn white_texture(&mut self, device: &Device, queue: &Queue) -> Arc<TextureAsset> {
        let key = "default_white";
        if let Some(texture) = self.textures.get(key) {
            return Arc::clone(texture);
        }

        let texture = Arc::new(Self::create_texture(
            device,
            queue,
            &TextureImage::white(),
            Some("Default White Texture"),
        ));
        self.textures.insert(key.to_string(), Arc::clone(&texture));
        texture
    }

    fn create_texture(
        device: &Device,
        queue: &Queue,
        image: &TextureImage,
        label: Option<&str>,
    ) -> TextureAsset {
        let texture_size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: texture_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &image.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            texture_size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        TextureAsset {
            texture,
            view,
            width: image.width,
            height: image.height,
        }
    }

    pub fn cache_stats(&self) -> (usize, usize) {
        (self.images.len(), self.textures.len())
    }
}
