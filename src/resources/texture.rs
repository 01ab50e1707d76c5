use std::collections::HashMap;

use anyhow::Context as _;

use crate::data_structures::texture::Texture;

/// Layout of a material bind group: the diffuse texture and its sampler.
pub fn diffuse_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Model texture_bind_group_layout"),
    })
}

pub fn is_remote(file_name: &str) -> bool {
    file_name.starts_with("http://") || file_name.starts_with("https://")
}

/// File extension of an asset name or URL, ignoring any query string.
pub fn extension(file_name: &str) -> Option<&str> {
    let path = file_name.split(['?', '#']).next().unwrap_or(file_name);
    let (_, extension) = path.rsplit_once('.')?;
    (!extension.contains('/')).then_some(extension)
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no browser window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("could not read the page origin: {:?}", e))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

async fn fetch(url: &str) -> anyhow::Result<Vec<u8>> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Read an asset. `http(s)` URLs are fetched, every other name is looked up
/// in the `assets` directory next to the executable or page.
pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    if is_remote(file_name) {
        return fetch(file_name)
            .await
            .with_context(|| format!("failed to fetch {}", file_name));
    }

    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        fetch(url.as_str())
            .await
            .with_context(|| format!("failed to fetch {}", url))?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
    };

    Ok(data)
}

pub async fn load_texture(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = load_binary(file_name).await?;
    Texture::from_bytes(device, queue, &data, file_name, extension(file_name))
        .with_context(|| format!("failed to decode {}", file_name))
}

/// Like [`load_texture`] but never fails: a texture that cannot be loaded is
/// replaced with a neutral grey one.
pub async fn load_texture_or_fallback(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Texture {
    match load_texture(file_name, device, queue).await {
        Ok(texture) => {
            log::debug!("Loaded texture {}", file_name);
            texture
        }
        Err(e) => {
            log::warn!("Using fallback texture for {}: {:#}", file_name, e);
            Texture::from_colour(device, queue, Texture::FALLBACK_COLOUR, file_name)
        }
    }
}

/// Textures keyed by the name they were loaded from.
#[derive(Debug, Default)]
pub struct TextureCache {
    textures: HashMap<String, Texture>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every name not already cached, concurrently.
    pub async fn load_all<'a>(
        &mut self,
        file_names: impl IntoIterator<Item = &'a str>,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        let mut missing: Vec<&str> = file_names
            .into_iter()
            .filter(|name| !self.textures.contains_key(*name))
            .collect();
        missing.sort_unstable();
        missing.dedup();

        let loaded = futures::future::join_all(
            missing
                .iter()
                .map(|name| load_texture_or_fallback(name, device, queue)),
        )
        .await;
        self.textures.extend(
            missing
                .into_iter()
                .map(str::to_string)
                .zip(loaded),
        );
    }

    pub fn get(&self, file_name: &str) -> Option<&Texture> {
        self.textures.get(file_name)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}
