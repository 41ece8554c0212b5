use std::marker::PhantomData;

use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use super::util::{created, set_name_str};
use crate::error::{Error, Result};
use crate::texture::MipChain;

pub fn heap_properties(heap_type: D3D12_HEAP_TYPE) -> D3D12_HEAP_PROPERTIES {
    D3D12_HEAP_PROPERTIES {
        Type: heap_type,
        CPUPageProperty: D3D12_CPU_PAGE_PROPERTY_UNKNOWN,
        MemoryPoolPreference: D3D12_MEMORY_POOL_UNKNOWN,
        CreationNodeMask: 1,
        VisibleNodeMask: 1,
    }
}

/// CPU-writable memory in the L0 pool, so textures can be filled with
/// `WriteToSubresource` without a staging buffer.
pub fn write_back_heap_properties() -> D3D12_HEAP_PROPERTIES {
    D3D12_HEAP_PROPERTIES {
        Type: D3D12_HEAP_TYPE_CUSTOM,
        CPUPageProperty: D3D12_CPU_PAGE_PROPERTY_WRITE_BACK,
        MemoryPoolPreference: D3D12_MEMORY_POOL_L0,
        CreationNodeMask: 1,
        VisibleNodeMask: 1,
    }
}

pub fn buffer_desc(buffer_size: u64) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
        Alignment: 0,
        Width: buffer_size,
        Height: 1,
        DepthOrArraySize: 1,
        MipLevels: 1,
        Format: DXGI_FORMAT_UNKNOWN,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
        Flags: D3D12_RESOURCE_FLAG_NONE,
    }
}

pub fn texture2d_desc(
    format: DXGI_FORMAT,
    width: u64,
    height: u32,
    mip_levels: u16,
    flags: D3D12_RESOURCE_FLAGS,
) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
        Alignment: 0,
        Width: width,
        Height: height,
        DepthOrArraySize: 1,
        MipLevels: mip_levels,
        Format: format,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
        Flags: flags,
    }
}

/// Upload-heap buffer in `GENERIC_READ`, the state the GPU reads vertex,
/// index and constant data from.
pub fn create_buffer_resource(
    device: &ID3D12Device2,
    size_in_bytes: u64,
    name: &str,
) -> Result<ID3D12Resource> {
    if size_in_bytes == 0 {
        return Err(Error::ZeroSize);
    }

    let properties = heap_properties(D3D12_HEAP_TYPE_UPLOAD);
    let desc = buffer_desc(size_in_bytes);
    let mut buffer: Option<ID3D12Resource> = None;
    unsafe {
        device.CreateCommittedResource(
            &properties,
            D3D12_HEAP_FLAG_NONE,
            &desc,
            D3D12_RESOURCE_STATE_GENERIC_READ,
            None,
            &mut buffer,
        )
    }?;
    let buffer = created(buffer, name)?;

    set_name_str(&buffer, name)?;
    tracing::debug!(size_in_bytes, "Created buffer {name}");

    Ok(buffer)
}

pub fn create_texture_resource(
    device: &ID3D12Device2,
    format: DXGI_FORMAT,
    width: u32,
    height: u32,
    mip_levels: u32,
    name: &str,
) -> Result<ID3D12Resource> {
    if width == 0 || height == 0 {
        return Err(Error::ZeroSize);
    }

    let properties = write_back_heap_properties();
    let desc = texture2d_desc(
        format,
        width.into(),
        height,
        mip_levels as u16,
        D3D12_RESOURCE_FLAG_NONE,
    );

    let mut texture: Option<ID3D12Resource> = None;
    unsafe {
        device.CreateCommittedResource(
            &properties,
            D3D12_HEAP_FLAG_NONE,
            &desc,
            D3D12_RESOURCE_STATE_GENERIC_READ,
            None,
            &mut texture,
        )
    }?;
    let texture = created(texture, name)?;

    set_name_str(&texture, name)?;
    tracing::debug!(width, height, mip_levels, "Created texture {name}");

    Ok(texture)
}

/// Writes every mip level of `mips` to the matching subresource.
pub fn upload_texture_data(texture: &ID3D12Resource, mips: &MipChain) -> Result<()> {
    for (level, image) in mips.levels().iter().enumerate() {
        let (width, height) = image.dimensions();
        let row_pitch = width * 4;
        let slice_pitch = row_pitch * height;

        unsafe {
            texture.WriteToSubresource(
                level as u32,
                None,
                image.as_raw().as_ptr() as *const _,
                row_pitch,
                slice_pitch,
            )
        }?;
    }
    Ok(())
}

pub fn create_depth_stencil_texture(
    device: &ID3D12Device2,
    format: DXGI_FORMAT,
    width: u32,
    height: u32,
    name: &str,
) -> Result<ID3D12Resource> {
    if width == 0 || height == 0 {
        return Err(Error::ZeroSize);
    }

    let clear_value = D3D12_CLEAR_VALUE {
        Format: format,
        Anonymous: D3D12_CLEAR_VALUE_0 {
            DepthStencil: D3D12_DEPTH_STENCIL_VALUE {
                Depth: 1.0,
                Stencil: 0,
            },
        },
    };

    let properties = heap_properties(D3D12_HEAP_TYPE_DEFAULT);
    let desc = texture2d_desc(
        format,
        width.into(),
        height,
        1,
        D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL,
    );

    let mut texture: Option<ID3D12Resource> = None;
    unsafe {
        device.CreateCommittedResource(
            &properties,
            D3D12_HEAP_FLAG_NONE,
            &desc,
            D3D12_RESOURCE_STATE_DEPTH_WRITE,
            Some(&clear_value),
            &mut texture,
        )
    }?;
    let texture = created(texture, name)?;

    set_name_str(&texture, name)?;

    Ok(texture)
}

/// Upload buffer of `len` elements of `T` that stays mapped for its whole
/// lifetime. Upload heaps allow persistent mapping; the CPU must not write
/// while the GPU may still read the previous contents.
pub struct UploadBuffer<T: Copy> {
    resource: ID3D12Resource,
    data: *mut T,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Copy> UploadBuffer<T> {
    pub fn new(device: &ID3D12Device2, len: usize, name: &str) -> Result<Self> {
        let size = (std::mem::size_of::<T>() * len) as u64;
        let resource = create_buffer_resource(device, size, name)?;

        let mut data = std::ptr::null_mut();
        unsafe { resource.Map(0, None, Some(&mut data)) }?;

        Ok(Self {
            resource,
            data: data as *mut T,
            len,
            _marker: PhantomData,
        })
    }

    pub fn with_data(device: &ID3D12Device2, init_data: &[T], name: &str) -> Result<Self> {
        let mut buffer = Self::new(device, init_data.len(), name)?;
        buffer.write(init_data);
        Ok(buffer)
    }

    pub fn write(&mut self, items: &[T]) {
        assert!(items.len() <= self.len);
        unsafe { std::ptr::copy_nonoverlapping(items.as_ptr(), self.data, items.len()) };
    }

    pub fn write_one(&mut self, item: T) {
        self.write(std::slice::from_ref(&item));
    }

    pub fn resource(&self) -> &ID3D12Resource {
        &self.resource
    }

    pub fn gpu_virtual_address(&self) -> u64 {
        unsafe { self.resource.GetGPUVirtualAddress() }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn size_in_bytes(&self) -> u32 {
        (std::mem::size_of::<T>() * self.len) as u32
    }

    pub fn stride(&self) -> u32 {
        std::mem::size_of::<T>() as u32
    }
}

impl<T: Copy> Drop for UploadBuffer<T> {
    fn drop(&mut self) {
        unsafe { self.resource.Unmap(0, None) };
    }
}
