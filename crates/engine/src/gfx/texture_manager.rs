use std::path::{Path, PathBuf};

use image::RgbaImage;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use super::d3d12::{device::Device, resource, view::Srv};
use crate::error::{Error, Result};
use crate::texture::{self, MipChain, TextureMetadata, TextureRegistry, SRV_INDEX_TOP};

/// Decoded images are treated as sRGB.
pub const TEXTURE_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM_SRGB;

const WHITE_TEXTURE_KEY: &str = "<white>";

pub struct GpuTexture {
    resource: ID3D12Resource,
    srv: Srv,
}

impl GpuTexture {
    pub fn resource(&self) -> &ID3D12Resource {
        &self.resource
    }

    pub fn srv(&self) -> &Srv {
        &self.srv
    }
}

/// Loads each texture file once and hands out stable indices for it.
pub struct TextureManager {
    registry: TextureRegistry<GpuTexture>,
}

impl TextureManager {
    pub fn new(device: &Device) -> Self {
        let capacity = device.srv_capacity().saturating_sub(SRV_INDEX_TOP) as usize;
        Self {
            registry: TextureRegistry::new(capacity),
        }
    }

    /// Loading a path that is already loaded does nothing and returns its index.
    pub fn load_texture(&mut self, device: &mut Device, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        if let Some(index) = self.registry.find(path) {
            return Ok(index);
        }

        let image = texture::decode(path)?;
        self.load_image(device, path, image)
    }

    /// A 1x1 white texture for untextured models.
    pub fn white_texture(&mut self, device: &mut Device) -> Result<usize> {
        let key = Path::new(WHITE_TEXTURE_KEY);
        if let Some(index) = self.registry.find(key) {
            return Ok(index);
        }
        let image = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        self.load_image(device, key, image)
    }

    fn load_image(&mut self, device: &mut Device, key: &Path, image: RgbaImage) -> Result<usize> {
        if self.registry.is_full() {
            return Err(Error::DescriptorHeapFull {
                name: "Device::srv_heap".into(),
                capacity: device.srv_capacity(),
            });
        }

        let mips = MipChain::generate(image)?;
        let metadata = mips.metadata();

        let name = key.display().to_string();
        let texture = resource::create_texture_resource(
            device.get(),
            TEXTURE_FORMAT,
            metadata.width,
            metadata.height,
            metadata.mip_levels,
            &name,
        )?;
        resource::upload_texture_data(&texture, &mips)?;

        let srv_desc = D3D12_SHADER_RESOURCE_VIEW_DESC {
            Format: TEXTURE_FORMAT,
            ViewDimension: D3D12_SRV_DIMENSION_TEXTURE2D,
            Shader4ComponentMapping: D3D12_DEFAULT_SHADER_4_COMPONENT_MAPPING,
            Anonymous: D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2D: D3D12_TEX2D_SRV {
                    MostDetailedMip: 0,
                    MipLevels: metadata.mip_levels,
                    PlaneSlice: 0,
                    ResourceMinLODClamp: 0.0,
                },
            },
        };
        let srv = device.create_srv(&texture, &srv_desc)?;

        let index = self.registry.insert(
            key,
            metadata,
            GpuTexture {
                resource: texture,
                srv,
            },
        )?;

        tracing::info!(
            index,
            srv = srv.index(),
            width = metadata.width,
            height = metadata.height,
            mip_levels = metadata.mip_levels,
            "Loaded texture {name}"
        );

        Ok(index)
    }

    pub fn texture_index_by_file_path(&self, path: impl AsRef<Path>) -> Result<usize> {
        self.registry.index_of(path.as_ref())
    }

    pub fn srv_handle_gpu(&self, index: usize) -> Result<D3D12_GPU_DESCRIPTOR_HANDLE> {
        Ok(self.registry.get(index)?.payload.srv().gpu_handle())
    }

    pub fn metadata(&self, index: usize) -> Result<TextureMetadata> {
        self.registry.metadata(index)
    }

    pub fn texture(&self, index: usize) -> Result<&GpuTexture> {
        Ok(&self.registry.get(index)?.payload)
    }

    pub fn path(&self, index: usize) -> Result<PathBuf> {
        Ok(self.registry.get(index)?.path.clone())
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}
