use windows::core::Interface;
use windows::Win32::Foundation::{self, HWND, RECT};
use windows::Win32::Graphics::{
    Direct3D::*,
    Direct3D12::*,
    Dxgi::{Common::*, *},
};
use windows::Win32::System::Diagnostics::Debug::IsDebuggerPresent;

use super::command::{self, Context};
use super::view::*;
use super::{barrier, resource, util};
use crate::error::{Error, Result};
use crate::frame::{FramePhase, FrameTracker};
use crate::frame_limiter::FrameLimiter;
use crate::texture::SRV_INDEX_TOP;
use crate::Config;

pub const FRAME_BUFFER_COUNT: usize = 2;

pub const SWAP_CHAIN_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;
/// Back buffers are written through sRGB views.
pub const RTV_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM_SRGB;
pub const DEPTH_FORMAT: DXGI_FORMAT = DXGI_FORMAT_D24_UNORM_S8_UINT;

const CLEAR_COLOR: [f32; 4] = [0.1, 0.25, 0.5, 1.0];

/// Warnings are only logged.
const BREAK_ON_SEVERITIES: [D3D12_MESSAGE_SEVERITY; 2] = [
    D3D12_MESSAGE_SEVERITY_CORRUPTION,
    D3D12_MESSAGE_SEVERITY_ERROR,
];

const FEATURE_LEVELS: [(D3D_FEATURE_LEVEL, &str); 4] = [
    (D3D_FEATURE_LEVEL_12_2, "12.2"),
    (D3D_FEATURE_LEVEL_12_1, "12.1"),
    (D3D_FEATURE_LEVEL_12_0, "12.0"),
    (D3D_FEATURE_LEVEL_11_0, "11.0"),
];

pub struct Device {
    // D3D12 Device: considered as a memory context that tracks allocations in GPU memory
    device: ID3D12Device2,

    gfx_queue: command::Queue,
    command_ctx: Option<Context>,

    swap_chain: IDXGISwapChain4,
    frame_buffers: [ID3D12Resource; FRAME_BUFFER_COUNT],
    frame_buffer_rtvs: [Rtv; FRAME_BUFFER_COUNT],
    frame: FrameTracker<FRAME_BUFFER_COUNT>,

    depth_buffer: ID3D12Resource,
    depth_dsv: Dsv,

    srv_heap: CbvSrvUavHeap,
    // kept alive for the views created in them
    _rtv_heap: RtvHeap,
    _dsv_heap: DsvHeap,

    viewport: D3D12_VIEWPORT,
    scissor_rect: RECT,
    client_width: u32,
    client_height: u32,

    frame_limiter: FrameLimiter,

    // controls whether the swap chain's present method should wait for the next vertical fresh before presenting the rendered image
    vsync_enabled: bool,
    tearing_supported: bool,
}

impl Device {
    pub fn build(hwnd: HWND, config: &Config) -> Result<Self> {
        let (width, height) = (config.client_width(), config.client_height());
        if width == 0 || height == 0 {
            return Err(Error::ZeroSize);
        }

        let factory = create_factory(config.debug_layer_enabled(), config.gpu_validation_enabled())?;

        let device = create_device(&factory, config.debug_layer_enabled())?;

        let gfx_queue = command::Queue::build(
            &device,
            D3D12_COMMAND_LIST_TYPE_DIRECT,
            "Device::gfx_queue".into(),
        )?;

        let tearing_supported = check_tearing_support(&factory);

        let swap_chain = create_swap_chain(
            &factory,
            gfx_queue.get(),
            hwnd,
            width,
            height,
            tearing_supported,
        )?;

        let frame_buffers = create_frame_buffers_from_swap_chain(&swap_chain)?;

        let mut rtv_heap = RtvHeap::build(&device, FRAME_BUFFER_COUNT as u32, 0, "Device::rtv_heap")?;
        let rtv_desc = D3D12_RENDER_TARGET_VIEW_DESC {
            Format: RTV_FORMAT,
            ViewDimension: D3D12_RTV_DIMENSION_TEXTURE2D,
            Anonymous: D3D12_RENDER_TARGET_VIEW_DESC_0 {
                Texture2D: D3D12_TEX2D_RTV {
                    MipSlice: 0,
                    PlaneSlice: 0,
                },
            },
        };
        let frame_buffer_rtvs = [
            rtv_heap.create_rtv(&device, &frame_buffers[0], &rtv_desc)?,
            rtv_heap.create_rtv(&device, &frame_buffers[1], &rtv_desc)?,
        ];

        let mut dsv_heap = DsvHeap::build(&device, 1, 0, "Device::dsv_heap")?;
        let depth_buffer = resource::create_depth_stencil_texture(
            &device,
            DEPTH_FORMAT,
            width,
            height,
            "Device::depth_buffer",
        )?;
        let dsv_desc = D3D12_DEPTH_STENCIL_VIEW_DESC {
            Format: DEPTH_FORMAT,
            ViewDimension: D3D12_DSV_DIMENSION_TEXTURE2D,
            Flags: D3D12_DSV_FLAG_NONE,
            Anonymous: D3D12_DEPTH_STENCIL_VIEW_DESC_0 {
                Texture2D: D3D12_TEX2D_DSV { MipSlice: 0 },
            },
        };
        let depth_dsv = dsv_heap.create_dsv(&device, &depth_buffer, &dsv_desc)?;

        let srv_heap = CbvSrvUavHeap::build(
            &device,
            config.max_srv_count(),
            SRV_INDEX_TOP,
            "Device::srv_heap",
        )?;

        tracing::info!(
            width,
            height,
            vsync = config.vsync_enabled(),
            tearing_supported,
            "Device initialized"
        );

        Ok(Self {
            device,

            gfx_queue,
            command_ctx: None,

            swap_chain,
            frame_buffers,
            frame_buffer_rtvs,
            frame: FrameTracker::new(),

            depth_buffer,
            depth_dsv,

            srv_heap,
            _rtv_heap: rtv_heap,
            _dsv_heap: dsv_heap,

            viewport: util::viewport(width, height),
            scissor_rect: util::scissor_rect(width, height),
            client_width: width,
            client_height: height,

            frame_limiter: FrameLimiter::new(config.target_fps()),

            vsync_enabled: config.vsync_enabled(),
            tearing_supported,
        })
    }

    /// Starts recording a frame: the back buffer becomes a render target, is
    /// cleared and bound together with the depth buffer, the SRV heap, the
    /// viewport and the scissor rectangle.
    pub fn pre_draw(&mut self) -> Result<()> {
        let back_buffer_index = unsafe { self.swap_chain.GetCurrentBackBufferIndex() } as usize;
        let transition = self.frame.begin(back_buffer_index)?;

        let ctx = match self.gfx_queue.request_command_ctx() {
            Ok(ctx) => ctx,
            Err(e) => {
                // nothing was recorded, so the frame can be abandoned
                self.frame.end()?;
                return Err(e.into());
            }
        };
        let cmd_list = ctx.command_list();

        let back_buffer = &self.frame_buffers[back_buffer_index];
        let rtv = self.frame_buffer_rtvs[back_buffer_index].cpu_handle();
        let dsv = self.depth_dsv.cpu_handle();

        unsafe {
            cmd_list.ResourceBarrier(&[barrier::tracked(back_buffer, transition)]);

            cmd_list.OMSetRenderTargets(1, Some(&rtv), Foundation::FALSE, Some(&dsv));

            cmd_list.ClearRenderTargetView(rtv, &CLEAR_COLOR, None);
            cmd_list.ClearDepthStencilView(dsv, D3D12_CLEAR_FLAG_DEPTH, 1.0, 0, &[]);

            cmd_list.SetDescriptorHeaps(&[Some(self.srv_heap.get().clone())]);

            cmd_list.RSSetViewports(&[self.viewport]);
            cmd_list.RSSetScissorRects(&[self.scissor_rect]);
        }

        self.command_ctx = Some(ctx);
        Ok(())
    }

    /// Finishes the frame: transitions the back buffer back to `PRESENT`,
    /// submits, presents, then blocks until the GPU has finished the frame.
    pub fn post_draw(&mut self) -> Result<()> {
        let transition = self.frame.end()?;
        let ctx = self.command_ctx.take().ok_or(Error::FramePhase {
            expected: FramePhase::Recording,
            actual: FramePhase::Idle,
        })?;

        let back_buffer = &self.frame_buffers[self.frame.back_buffer_index()];
        unsafe {
            ctx.command_list()
                .ResourceBarrier(&[barrier::tracked(back_buffer, transition)]);
        }

        self.gfx_queue.execute_commands(ctx)?;

        let sync_interval = if self.vsync_enabled { 1 } else { 0 };
        let present_flags = if self.tearing_supported && !self.vsync_enabled {
            DXGI_PRESENT_ALLOW_TEARING
        } else {
            DXGI_PRESENT(0)
        };
        unsafe { self.swap_chain.Present(sync_interval, present_flags) }.ok()?;

        let fence_value = self.gfx_queue.signal()?;
        self.gfx_queue.wait_fence(fence_value)?;

        self.frame_limiter.wait();

        Ok(())
    }

    /// The command list of the frame being recorded.
    pub fn command_list(&self) -> Result<&ID3D12GraphicsCommandList> {
        self.command_ctx
            .as_ref()
            .map(|ctx| ctx.command_list())
            .ok_or(Error::FramePhase {
                expected: FramePhase::Recording,
                actual: self.frame.phase(),
            })
    }

    pub fn allocate_srv(&mut self) -> Result<u32> {
        self.srv_heap.allocate()
    }

    pub fn create_srv(
        &mut self,
        resource: &ID3D12Resource,
        desc: &D3D12_SHADER_RESOURCE_VIEW_DESC,
    ) -> Result<Srv> {
        self.srv_heap.create_srv(&self.device, resource, desc)
    }

    pub fn srv_cpu_handle(&self, index: u32) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        self.srv_heap.cpu_handle(index)
    }

    pub fn srv_gpu_handle(&self, index: u32) -> D3D12_GPU_DESCRIPTOR_HANDLE {
        self.srv_heap.gpu_handle(index)
    }

    pub fn srv_capacity(&self) -> u32 {
        self.srv_heap.capacity()
    }

    pub fn create_buffer_resource(&self, size_in_bytes: u64, name: &str) -> Result<ID3D12Resource> {
        resource::create_buffer_resource(&self.device, size_in_bytes, name)
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.gfx_queue.flush()?)
    }

    pub fn get(&self) -> &ID3D12Device2 {
        &self.device
    }

    pub fn frame_phase(&self) -> FramePhase {
        self.frame.phase()
    }

    pub fn back_buffer_index(&self) -> usize {
        self.frame.back_buffer_index()
    }

    pub fn depth_buffer(&self) -> &ID3D12Resource {
        &self.depth_buffer
    }

    pub fn client_width(&self) -> u32 {
        self.client_width
    }

    pub fn client_height(&self) -> u32 {
        self.client_height
    }

    pub fn is_tearing_supported(&self) -> bool {
        self.tearing_supported
    }
}

pub fn report_live_objects() -> Result<()> {
    unsafe {
        let debug: IDXGIDebug1 = DXGIGetDebugInterface1(0)?;
        debug.ReportLiveObjects(
            DXGI_DEBUG_ALL,
            DXGI_DEBUG_RLO_DETAIL | DXGI_DEBUG_RLO_IGNORE_INTERNAL,
        )?;
    }
    Ok(())
}

fn create_factory(
    enable_debug_layer: bool,
    enable_gpu_based_validation: bool,
) -> Result<IDXGIFactory6> {
    let enable_debug_layer = enable_debug_layer || enable_gpu_based_validation;
    if enable_debug_layer {
        let mut debug: Option<ID3D12Debug1> = None;
        match unsafe { D3D12GetDebugInterface(&mut debug) } {
            Ok(()) => {
                if let Some(debug) = debug {
                    unsafe {
                        debug.EnableDebugLayer();
                        debug.SetEnableGPUBasedValidation(enable_gpu_based_validation);
                    }
                    tracing::info!(enable_gpu_based_validation, "Enabled the debug layer");
                }
            }
            Err(e) => tracing::warn!("Failed to enable debug layer: {e}"),
        }
    }

    let flags = if enable_debug_layer {
        DXGI_CREATE_FACTORY_DEBUG
    } else {
        DXGI_CREATE_FACTORY_FLAGS(0)
    };

    Ok(unsafe { CreateDXGIFactory2(flags) }?)
}

fn create_device(factory: &IDXGIFactory6, debug_layer_enabled: bool) -> Result<ID3D12Device2> {
    let mut index = 0;
    let mut selected = None;

    while let Ok(adapter) = unsafe {
        factory.EnumAdapterByGpuPreference::<IDXGIAdapter1>(
            index,
            DXGI_GPU_PREFERENCE_HIGH_PERFORMANCE,
        )
    } {
        index += 1;

        let adapter_desc = unsafe { adapter.GetDesc1() }?;
        let adapter_flag = DXGI_ADAPTER_FLAG(adapter_desc.Flags as i32);
        if (adapter_flag & DXGI_ADAPTER_FLAG_SOFTWARE) != DXGI_ADAPTER_FLAG_NONE {
            // reject WARP
            continue;
        }

        for (level, level_name) in FEATURE_LEVELS {
            let mut device: Option<ID3D12Device2> = None;
            if unsafe { D3D12CreateDevice(&adapter, level, &mut device) }.is_ok() {
                if let Some(device) = device {
                    let name = String::from_utf16_lossy(&adapter_desc.Description);
                    let name = name.trim_end_matches('\0').to_string();
                    tracing::info!("Using {name} (feature level {level_name})");
                    selected = Some((device, name));
                    break;
                }
            }
        }

        if selected.is_some() {
            break;
        }
    }

    let Some((device, name)) = selected else {
        return Err(Error::NoSuitableAdapter);
    };

    util::set_name_str(&device, &name)?;

    if debug_layer_enabled {
        configure_info_queue(&device);
    }

    Ok(device)
}

fn configure_info_queue(device: &ID3D12Device2) {
    let Ok(info_queue) = device.cast::<ID3D12InfoQueue>() else {
        tracing::warn!("The info queue is unavailable");
        return;
    };

    let result = unsafe {
        // breaking without a debugger attached would terminate the process
        if IsDebuggerPresent().as_bool() {
            for severity in BREAK_ON_SEVERITIES {
                let _ = info_queue.SetBreakOnSeverity(severity, true);
            }
        }

        let mut denied_severities = [D3D12_MESSAGE_SEVERITY_INFO];
        let mut denied_messages = [
            // a known debug layer bug on Windows 11 with FLIP swap chains
            // https://stackoverflow.com/questions/69805245/directx-12-application-is-crashing-in-windows-11
            D3D12_MESSAGE_ID_RESOURCE_BARRIER_MISMATCHING_COMMAND_LIST_TYPE,
        ];

        let deny_list = D3D12_INFO_QUEUE_FILTER_DESC {
            NumSeverities: denied_severities.len() as u32,
            pSeverityList: denied_severities.as_mut_ptr(),
            NumIDs: denied_messages.len() as u32,
            pIDList: denied_messages.as_mut_ptr(),
            ..Default::default()
        };
        let filter = D3D12_INFO_QUEUE_FILTER {
            DenyList: deny_list,
            ..Default::default()
        };
        info_queue.PushStorageFilter(&filter)
    };
    if let Err(e) = result {
        tracing::warn!("Failed to install the info queue filter: {e}");
    }

    // ID3D12InfoQueue1 requires Windows 11
    // https://github.com/microsoft/windows-rs/issues/3031
    match device.cast::<ID3D12InfoQueue1>() {
        Ok(info_queue) => {
            let mut _callback_cookie = 0;
            let result = unsafe {
                info_queue.RegisterMessageCallback(
                    Some(capture_message),
                    D3D12_MESSAGE_CALLBACK_FLAG_NONE,
                    std::ptr::null_mut(),
                    &mut _callback_cookie,
                )
            };
            if let Err(e) = result {
                tracing::warn!("Failed to register the D3D message callback: {e}");
            }
        }
        Err(_) => tracing::debug!("ID3D12InfoQueue1 is unavailable; D3D messages go to the debugger only"),
    }
}

fn create_swap_chain(
    factory: &IDXGIFactory6,
    command_queue: &ID3D12CommandQueue,
    hwnd: HWND,
    width: u32,
    height: u32,
    tearing_supported: bool,
) -> Result<IDXGISwapChain4> {
    let flags = if tearing_supported {
        DXGI_SWAP_CHAIN_FLAG_ALLOW_TEARING
    } else {
        DXGI_SWAP_CHAIN_FLAG(0)
    };

    let desc = DXGI_SWAP_CHAIN_DESC1 {
        Width: width,
        Height: height,
        Format: SWAP_CHAIN_FORMAT,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Stereo: false.into(),
        BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
        BufferCount: FRAME_BUFFER_COUNT as u32,
        // behavior when resizing window
        Scaling: DXGI_SCALING_STRETCH,
        SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
        AlphaMode: DXGI_ALPHA_MODE_UNSPECIFIED,
        Flags: flags.0 as u32,
    };

    let swap_chain =
        unsafe { factory.CreateSwapChainForHwnd(command_queue, hwnd, &desc, None, None) }?;

    // Disable Alt+Enter fullscreen toggle
    unsafe { factory.MakeWindowAssociation(hwnd, DXGI_MWA_NO_ALT_ENTER) }?;

    Ok(swap_chain.cast::<IDXGISwapChain4>()?)
}

fn create_frame_buffers_from_swap_chain(
    swap_chain: &IDXGISwapChain4,
) -> Result<[ID3D12Resource; FRAME_BUFFER_COUNT]> {
    let create = |i: usize| -> Result<ID3D12Resource> {
        let buffer: ID3D12Resource = unsafe { swap_chain.GetBuffer(i as u32) }?;
        util::set_name_str(&buffer, &format!("frame_buffer[{i}]"))?;
        Ok(buffer)
    };
    Ok([create(0)?, create(1)?])
}

fn check_tearing_support(factory: &IDXGIFactory6) -> bool {
    let mut allow_tearing = Foundation::FALSE;

    unsafe {
        factory.CheckFeatureSupport(
            DXGI_FEATURE_PRESENT_ALLOW_TEARING,
            &mut allow_tearing.0 as *mut std::ffi::c_int as *mut std::ffi::c_void,
            core::mem::size_of_val(&allow_tearing) as u32,
        )
    }
    .is_ok_and(|_| allow_tearing.as_bool())
}

extern "system" fn capture_message(
    _category: D3D12_MESSAGE_CATEGORY,
    severity: D3D12_MESSAGE_SEVERITY,
    id: D3D12_MESSAGE_ID,
    description: windows::core::PCSTR,
    _context: *mut core::ffi::c_void,
) {
    // DO NOT CALL D3D FUNCTIONS IN THIS FUNCTION
    let msg = match unsafe { description.to_string() } {
        Ok(msg) => msg,
        Err(e) => {
            tracing::error!("A message from D3D is corrupted: {e}");
            return;
        }
    };

    match severity {
        D3D12_MESSAGE_SEVERITY_CORRUPTION | D3D12_MESSAGE_SEVERITY_ERROR => {
            tracing::error!(target: "d3d12", id = id.0, "{msg}")
        }
        D3D12_MESSAGE_SEVERITY_WARNING => tracing::warn!(target: "d3d12", id = id.0, "{msg}"),
        D3D12_MESSAGE_SEVERITY_INFO => tracing::info!(target: "d3d12", id = id.0, "{msg}"),
        _ => tracing::debug!(target: "d3d12", id = id.0, "{msg}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debugger_breaks_on_errors_but_not_warnings() {
        assert!(BREAK_ON_SEVERITIES.contains(&D3D12_MESSAGE_SEVERITY_CORRUPTION));
        assert!(BREAK_ON_SEVERITIES.contains(&D3D12_MESSAGE_SEVERITY_ERROR));
        assert!(!BREAK_ON_SEVERITIES.contains(&D3D12_MESSAGE_SEVERITY_WARNING));
        assert!(!BREAK_ON_SEVERITIES.contains(&D3D12_MESSAGE_SEVERITY_INFO));
    }
}
