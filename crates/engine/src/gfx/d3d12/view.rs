use windows::Win32::Graphics::Direct3D12::*;

use super::util::set_name_str;
use crate::descriptor::{slot_offset, SlotAllocator};
use crate::error::Result;

pub const TYPE_CBV_SRV_UAV: i32 = D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV.0;
pub const TYPE_RTV: i32 = D3D12_DESCRIPTOR_HEAP_TYPE_RTV.0;
pub const TYPE_DSV: i32 = D3D12_DESCRIPTOR_HEAP_TYPE_DSV.0;

/// Shader Resource View
#[derive(Debug, Clone, Copy)]
pub struct Srv {
    index: u32,
    cpu_handle: D3D12_CPU_DESCRIPTOR_HANDLE,
    gpu_handle: D3D12_GPU_DESCRIPTOR_HANDLE,
}

impl Srv {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn cpu_handle(&self) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        self.cpu_handle
    }

    pub fn gpu_handle(&self) -> D3D12_GPU_DESCRIPTOR_HANDLE {
        self.gpu_handle
    }
}

/// Render Target View
#[derive(Debug, Clone, Copy)]
pub struct Rtv {
    cpu_handle: D3D12_CPU_DESCRIPTOR_HANDLE,
}

impl Rtv {
    pub fn cpu_handle(&self) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        self.cpu_handle
    }
}

/// Depth Stencil View
#[derive(Debug, Clone, Copy)]
pub struct Dsv {
    cpu_handle: D3D12_CPU_DESCRIPTOR_HANDLE,
}

impl Dsv {
    pub fn cpu_handle(&self) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        self.cpu_handle
    }
}

pub struct DescriptorHeap<const T: i32> {
    heap: ID3D12DescriptorHeap,
    view_size: u32,
    slots: SlotAllocator,
}

impl<const T: i32> DescriptorHeap<T> {
    /// The first `reserved` slots are never handed out by [`DescriptorHeap::allocate`].
    pub fn build(
        device: &ID3D12Device2,
        capacity: u32,
        reserved: u32,
        name: &str,
    ) -> Result<Self> {
        let heap_type = D3D12_DESCRIPTOR_HEAP_TYPE(T);

        let flags = if T == TYPE_CBV_SRV_UAV {
            D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE
        } else {
            D3D12_DESCRIPTOR_HEAP_FLAG_NONE
        };

        let desc = D3D12_DESCRIPTOR_HEAP_DESC {
            NumDescriptors: capacity,
            Type: heap_type,
            Flags: flags,
            ..Default::default()
        };

        let heap: ID3D12DescriptorHeap = unsafe { device.CreateDescriptorHeap(&desc) }?;
        let view_size = unsafe { device.GetDescriptorHandleIncrementSize(heap_type) };
        set_name_str(&heap, name)?;

        tracing::debug!(capacity, reserved, view_size, "Created descriptor heap {name}");

        Ok(Self {
            heap,
            view_size,
            slots: SlotAllocator::new(name, capacity, reserved),
        })
    }

    pub fn get(&self) -> &ID3D12DescriptorHeap {
        &self.heap
    }

    pub fn allocate(&mut self) -> Result<u32> {
        self.slots.allocate()
    }

    pub fn capacity(&self) -> u32 {
        self.slots.capacity()
    }

    pub fn cpu_handle(&self, index: u32) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        let mut handle = unsafe { self.heap.GetCPUDescriptorHandleForHeapStart() };
        handle.ptr += slot_offset(self.view_size, index) as usize;
        handle
    }
}

impl DescriptorHeap<TYPE_CBV_SRV_UAV> {
    pub fn gpu_handle(&self, index: u32) -> D3D12_GPU_DESCRIPTOR_HANDLE {
        let mut handle = unsafe { self.heap.GetGPUDescriptorHandleForHeapStart() };
        handle.ptr += slot_offset(self.view_size, index);
        handle
    }

    pub fn create_srv(
        &mut self,
        device: &ID3D12Device2,
        resource: &ID3D12Resource,
        desc: &D3D12_SHADER_RESOURCE_VIEW_DESC,
    ) -> Result<Srv> {
        let index = self.allocate()?;
        let cpu_handle = self.cpu_handle(index);

        unsafe { device.CreateShaderResourceView(resource, Some(desc), cpu_handle) };

        Ok(Srv {
            index,
            cpu_handle,
            gpu_handle: self.gpu_handle(index),
        })
    }
}

impl DescriptorHeap<TYPE_RTV> {
    pub fn create_rtv(
        &mut self,
        device: &ID3D12Device2,
        resource: &ID3D12Resource,
        desc: &D3D12_RENDER_TARGET_VIEW_DESC,
    ) -> Result<Rtv> {
        let cpu_handle = self.cpu_handle(self.allocate()?);

        unsafe { device.CreateRenderTargetView(resource, Some(desc), cpu_handle) };

        Ok(Rtv { cpu_handle })
    }
}

impl DescriptorHeap<TYPE_DSV> {
    pub fn create_dsv(
        &mut self,
        device: &ID3D12Device2,
        resource: &ID3D12Resource,
        desc: &D3D12_DEPTH_STENCIL_VIEW_DESC,
    ) -> Result<Dsv> {
        let cpu_handle = self.cpu_handle(self.allocate()?);

        unsafe { device.CreateDepthStencilView(resource, Some(desc), cpu_handle) };

        Ok(Dsv { cpu_handle })
    }
}

pub type CbvSrvUavHeap = DescriptorHeap<TYPE_CBV_SRV_UAV>;
pub type RtvHeap = DescriptorHeap<TYPE_RTV>;
pub type DsvHeap = DescriptorHeap<TYPE_DSV>;
