use std::mem;

use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use super::util::*;
use crate::error::Result;

pub fn create_root_signature(
    device: &ID3D12Device2,
    desc: &D3D12_VERSIONED_ROOT_SIGNATURE_DESC,
    name: &str,
) -> Result<ID3D12RootSignature> {
    let mut blob = None;
    let mut error = None;
    let serialized =
        unsafe { D3D12SerializeVersionedRootSignature(desc, &mut blob, Some(&mut error)) };

    if let Some(e) = error {
        let message = blob_to_string(&e);
        tracing::error!("Failed to serialize {name}: {message}");
        return Err(windows::core::Error::new(
            windows::Win32::Foundation::E_FAIL,
            message,
        )
        .into());
    }
    serialized?;

    let blob = created(blob, name)?;
    let root_signature: ID3D12RootSignature = unsafe {
        let data =
            std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize());
        device.CreateRootSignature(0, data)
    }?;

    set_name_str(&root_signature, name)?;

    Ok(root_signature)
}

pub fn create_gfx_pso(
    device: &ID3D12Device2,
    desc: &D3D12_GRAPHICS_PIPELINE_STATE_DESC,
    name: &str,
) -> Result<ID3D12PipelineState> {
    let pso: ID3D12PipelineState = unsafe { device.CreateGraphicsPipelineState(desc) }?;
    set_name_str(&pso, name)?;
    tracing::debug!("Created {name}");
    Ok(pso)
}

/// The returned desc points into `params` and `samplers`.
pub fn root_signature_desc(
    params: &[D3D12_ROOT_PARAMETER1],
    samplers: &[D3D12_STATIC_SAMPLER_DESC],
) -> D3D12_VERSIONED_ROOT_SIGNATURE_DESC {
    D3D12_VERSIONED_ROOT_SIGNATURE_DESC {
        Version: D3D_ROOT_SIGNATURE_VERSION_1_1,
        Anonymous: D3D12_VERSIONED_ROOT_SIGNATURE_DESC_0 {
            Desc_1_1: D3D12_ROOT_SIGNATURE_DESC1 {
                NumParameters: params.len() as u32,
                pParameters: params.as_ptr(),
                NumStaticSamplers: samplers.len() as u32,
                pStaticSamplers: samplers.as_ptr(),
                Flags: D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
            },
        },
    }
}

pub fn root_cbv(
    shader_register: u32,
    visibility: D3D12_SHADER_VISIBILITY,
) -> D3D12_ROOT_PARAMETER1 {
    D3D12_ROOT_PARAMETER1 {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_CBV,
        Anonymous: D3D12_ROOT_PARAMETER1_0 {
            Descriptor: D3D12_ROOT_DESCRIPTOR1 {
                ShaderRegister: shader_register,
                RegisterSpace: 0,
                Flags: D3D12_ROOT_DESCRIPTOR_FLAG_NONE,
            },
        },
        ShaderVisibility: visibility,
    }
}

/// `ranges` must outlive the root signature serialization.
pub fn root_table(
    ranges: &[D3D12_DESCRIPTOR_RANGE1],
    visibility: D3D12_SHADER_VISIBILITY,
) -> D3D12_ROOT_PARAMETER1 {
    D3D12_ROOT_PARAMETER1 {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
        Anonymous: D3D12_ROOT_PARAMETER1_0 {
            DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE1 {
                NumDescriptorRanges: ranges.len() as u32,
                pDescriptorRanges: ranges.as_ptr(),
            },
        },
        ShaderVisibility: visibility,
    }
}

pub fn srv_range(base_register: u32) -> D3D12_DESCRIPTOR_RANGE1 {
    D3D12_DESCRIPTOR_RANGE1 {
        RangeType: D3D12_DESCRIPTOR_RANGE_TYPE_SRV,
        NumDescriptors: 1,
        BaseShaderRegister: base_register,
        RegisterSpace: 0,
        Flags: D3D12_DESCRIPTOR_RANGE_FLAG_NONE,
        OffsetInDescriptorsFromTableStart: D3D12_DESCRIPTOR_RANGE_OFFSET_APPEND,
    }
}

pub fn linear_wrap_sampler(shader_register: u32) -> D3D12_STATIC_SAMPLER_DESC {
    D3D12_STATIC_SAMPLER_DESC {
        Filter: D3D12_FILTER_MIN_MAG_MIP_LINEAR,
        AddressU: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        AddressV: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        AddressW: D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        MipLODBias: 0.0,
        MaxAnisotropy: 0,
        ComparisonFunc: D3D12_COMPARISON_FUNC_NEVER,
        BorderColor: D3D12_STATIC_BORDER_COLOR_TRANSPARENT_BLACK,
        MinLOD: 0.0,
        MaxLOD: f32::MAX,
        ShaderRegister: shader_register,
        RegisterSpace: 0,
        ShaderVisibility: D3D12_SHADER_VISIBILITY_PIXEL,
    }
}

/// Layout of [`crate::math::VertexData`].
pub fn vertex_input_layout() -> [D3D12_INPUT_ELEMENT_DESC; 3] {
    let element = |name: windows::core::PCSTR, format: DXGI_FORMAT| D3D12_INPUT_ELEMENT_DESC {
        SemanticName: name,
        SemanticIndex: 0,
        Format: format,
        InputSlot: 0,
        AlignedByteOffset: D3D12_APPEND_ALIGNED_ELEMENT,
        InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
        InstanceDataStepRate: 0,
    };
    [
        element(windows::core::s!("POSITION"), DXGI_FORMAT_R32G32B32A32_FLOAT),
        element(windows::core::s!("TEXCOORD"), DXGI_FORMAT_R32G32_FLOAT),
        element(windows::core::s!("NORMAL"), DXGI_FORMAT_R32G32B32_FLOAT),
    ]
}

pub fn blend_desc(alpha_blend: bool) -> D3D12_BLEND_DESC {
    let target = D3D12_RENDER_TARGET_BLEND_DESC {
        BlendEnable: alpha_blend.into(),
        LogicOpEnable: false.into(),
        SrcBlend: D3D12_BLEND_SRC_ALPHA,
        DestBlend: D3D12_BLEND_INV_SRC_ALPHA,
        BlendOp: D3D12_BLEND_OP_ADD,
        SrcBlendAlpha: D3D12_BLEND_ONE,
        DestBlendAlpha: D3D12_BLEND_ZERO,
        BlendOpAlpha: D3D12_BLEND_OP_ADD,
        LogicOp: D3D12_LOGIC_OP_NOOP,
        RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
    };

    D3D12_BLEND_DESC {
        AlphaToCoverageEnable: false.into(),
        IndependentBlendEnable: false.into(),
        RenderTarget: [target; 8],
    }
}

pub fn rasterizer_desc(cull_mode: D3D12_CULL_MODE) -> D3D12_RASTERIZER_DESC {
    D3D12_RASTERIZER_DESC {
        FillMode: D3D12_FILL_MODE_SOLID,
        CullMode: cull_mode,
        DepthClipEnable: true.into(),
        ..Default::default()
    }
}

pub fn depth_stencil_desc(depth_enabled: bool) -> D3D12_DEPTH_STENCIL_DESC {
    D3D12_DEPTH_STENCIL_DESC {
        DepthEnable: depth_enabled.into(),
        DepthWriteMask: if depth_enabled {
            D3D12_DEPTH_WRITE_MASK_ALL
        } else {
            D3D12_DEPTH_WRITE_MASK_ZERO
        },
        DepthFunc: D3D12_COMPARISON_FUNC_LESS_EQUAL,
        StencilEnable: false.into(),
        ..Default::default()
    }
}

pub fn root_signature_ptr(
    root_signature: &ID3D12RootSignature,
) -> mem::ManuallyDrop<Option<ID3D12RootSignature>> {
    // borrowed for the duration of PSO creation; no reference is added
    unsafe { mem::transmute_copy(root_signature) }
}
