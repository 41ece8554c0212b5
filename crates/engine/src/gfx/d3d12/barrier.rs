use windows::Win32::Graphics::Direct3D12::*;

use crate::frame::{ResourceState, Transition};

pub fn d3d12_state(state: ResourceState) -> D3D12_RESOURCE_STATES {
    match state {
        ResourceState::Present => D3D12_RESOURCE_STATE_PRESENT,
        ResourceState::RenderTarget => D3D12_RESOURCE_STATE_RENDER_TARGET,
        ResourceState::DepthWrite => D3D12_RESOURCE_STATE_DEPTH_WRITE,
        ResourceState::GenericRead => D3D12_RESOURCE_STATE_GENERIC_READ,
        ResourceState::CopyDest => D3D12_RESOURCE_STATE_COPY_DEST,
        ResourceState::PixelShaderResource => D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
    }
}

pub fn transition(
    resource: &ID3D12Resource,
    old_state: D3D12_RESOURCE_STATES,
    new_state: D3D12_RESOURCE_STATES,
) -> D3D12_RESOURCE_BARRIER {
    // https://github.com/microsoft/windows-rs/blob/master/crates/samples/windows/direct3d12/src/main.rs#L486
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: std::mem::ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: unsafe { std::mem::transmute_copy(resource) },
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                StateBefore: old_state,
                StateAfter: new_state,
            }),
        },
    }
}

/// Barrier for a transition already validated by a [`crate::frame::StateTracker`].
pub fn tracked(resource: &ID3D12Resource, transition: Transition) -> D3D12_RESOURCE_BARRIER {
    self::transition(
        resource,
        d3d12_state(transition.before),
        d3d12_state(transition.after),
    )
}
