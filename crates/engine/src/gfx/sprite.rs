use std::path::Path;

use windows::Win32::Graphics::{Direct3D::*, Direct3D12::*, Dxgi::Common::*};

use super::d3d12::{
    device::{Device, DEPTH_FORMAT, RTV_FORMAT},
    pso,
    resource::UploadBuffer,
    shader::{self, ShaderCompiler, ShaderConfig},
};
use super::texture_manager::TextureManager;
use crate::error::Result;
use crate::math::{Material, TransformationMatrix, VertexData};
use crate::sprite::{SpriteState, CULL_BACK_FACES, INDICES};

const VERTEX_SHADER: &str = "shaders/sprite_vs.hlsl";
const PIXEL_SHADER: &str = "shaders/sprite_ps.hlsl";

/// Pipeline shared by every sprite.
pub struct SpriteCommon {
    root_signature: ID3D12RootSignature,
    pso: ID3D12PipelineState,
}

impl SpriteCommon {
    pub fn build(device: &Device, compiler: &ShaderCompiler) -> Result<Self> {
        let root_signature = create_root_signature(device.get())?;
        let pso = create_pso(device.get(), compiler, &root_signature)?;
        Ok(Self {
            root_signature,
            pso,
        })
    }

    pub fn setup_common_drawing(&self, device: &Device) -> Result<()> {
        let cmd_list = device.command_list()?;
        unsafe {
            cmd_list.SetGraphicsRootSignature(&self.root_signature);
            cmd_list.SetPipelineState(&self.pso);
            cmd_list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
        }
        Ok(())
    }
}

fn create_root_signature(device: &ID3D12Device2) -> Result<ID3D12RootSignature> {
    let ranges = [pso::srv_range(0)];
    let params = [
        pso::root_cbv(0, D3D12_SHADER_VISIBILITY_VERTEX),
        pso::root_cbv(0, D3D12_SHADER_VISIBILITY_PIXEL),
        pso::root_table(&ranges, D3D12_SHADER_VISIBILITY_PIXEL),
    ];
    let samplers = [pso::linear_wrap_sampler(0)];

    let desc = pso::root_signature_desc(&params, &samplers);
    pso::create_root_signature(device, &desc, "SpriteCommon::root_signature")
}

fn create_pso(
    device: &ID3D12Device2,
    compiler: &ShaderCompiler,
    root_signature: &ID3D12RootSignature,
) -> Result<ID3D12PipelineState> {
    let vertex_shader = compiler.compile_file(&ShaderConfig::vertex(VERTEX_SHADER))?;
    let pixel_shader = compiler.compile_file(&ShaderConfig::pixel(PIXEL_SHADER))?;

    let input_layout = pso::vertex_input_layout();

    let mut rtv_formats = [DXGI_FORMAT_UNKNOWN; 8];
    rtv_formats[0] = RTV_FORMAT;

    let desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
        pRootSignature: pso::root_signature_ptr(root_signature),

        VS: shader::bytecode(&vertex_shader),
        PS: shader::bytecode(&pixel_shader),

        BlendState: pso::blend_desc(true),
        SampleMask: u32::MAX,
        RasterizerState: pso::rasterizer_desc(if CULL_BACK_FACES {
            D3D12_CULL_MODE_BACK
        } else {
            D3D12_CULL_MODE_NONE
        }),
        // sprites are drawn in submission order on top of the 3D scene
        DepthStencilState: pso::depth_stencil_desc(false),

        InputLayout: D3D12_INPUT_LAYOUT_DESC {
            pInputElementDescs: input_layout.as_ptr(),
            NumElements: input_layout.len() as u32,
        },

        PrimitiveTopologyType: D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
        NumRenderTargets: 1,
        RTVFormats: rtv_formats,
        DSVFormat: DEPTH_FORMAT,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },

        ..Default::default()
    };

    pso::create_gfx_pso(device, &desc, "SpriteCommon::pso")
}

pub struct Sprite {
    state: SpriteState,
    texture_index: usize,

    vertex_buffer: UploadBuffer<VertexData>,
    index_buffer: UploadBuffer<u32>,
    material: UploadBuffer<Material>,
    transformation: UploadBuffer<TransformationMatrix>,
}

impl Sprite {
    /// The texture must already be loaded. The sprite starts out showing the
    /// whole texture at its native size.
    pub fn build(
        device: &Device,
        textures: &TextureManager,
        texture_file_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let texture_index = textures.texture_index_by_file_path(texture_file_path)?;

        let mut state = SpriteState::default();
        state.adjust_texture_size(textures.metadata(texture_index)?);

        let vertex_buffer = UploadBuffer::with_data(
            device.get(),
            &state.vertices(textures.metadata(texture_index)?),
            "Sprite::vertex_buffer",
        )?;
        let index_buffer = UploadBuffer::with_data(device.get(), &INDICES, "Sprite::index_buffer")?;
        let material = UploadBuffer::with_data(device.get(), &[Material::default()], "Sprite::material")?;
        let transformation = UploadBuffer::with_data(
            device.get(),
            &[TransformationMatrix::default()],
            "Sprite::transformation",
        )?;

        Ok(Self {
            state,
            texture_index,
            vertex_buffer,
            index_buffer,
            material,
            transformation,
        })
    }

    pub fn update(&mut self, device: &Device, textures: &TextureManager) -> Result<()> {
        let metadata = textures.metadata(self.texture_index)?;
        self.vertex_buffer.write(&self.state.vertices(metadata));

        self.material.write_one(Material {
            color: self.state.color.to_array(),
            ..Default::default()
        });

        self.transformation.write_one(
            self.state
                .transformation(device.client_width(), device.client_height()),
        );
        Ok(())
    }

    pub fn draw(&self, device: &Device, textures: &TextureManager) -> Result<()> {
        let cmd_list = device.command_list()?;
        let srv = textures.srv_handle_gpu(self.texture_index)?;

        let vbv = D3D12_VERTEX_BUFFER_VIEW {
            BufferLocation: self.vertex_buffer.gpu_virtual_address(),
            SizeInBytes: self.vertex_buffer.size_in_bytes(),
            StrideInBytes: self.vertex_buffer.stride(),
        };
        let ibv = D3D12_INDEX_BUFFER_VIEW {
            BufferLocation: self.index_buffer.gpu_virtual_address(),
            SizeInBytes: self.index_buffer.size_in_bytes(),
            Format: DXGI_FORMAT_R32_UINT,
        };

        unsafe {
            cmd_list.IASetVertexBuffers(0, Some(&[vbv]));
            cmd_list.IASetIndexBuffer(Some(&ibv));

            cmd_list.SetGraphicsRootConstantBufferView(0, self.transformation.gpu_virtual_address());
            cmd_list.SetGraphicsRootConstantBufferView(1, self.material.gpu_virtual_address());
            cmd_list.SetGraphicsRootDescriptorTable(2, srv);

            cmd_list.DrawIndexedInstanced(INDICES.len() as u32, 1, 0, 0, 0);
        }
        Ok(())
    }

    /// Switches to another loaded texture and resizes to it.
    pub fn set_texture(
        &mut self,
        textures: &TextureManager,
        texture_file_path: impl AsRef<Path>,
    ) -> Result<()> {
        let texture_index = textures.texture_index_by_file_path(texture_file_path)?;
        self.state.adjust_texture_size(textures.metadata(texture_index)?);
        self.texture_index = texture_index;
        Ok(())
    }

    pub fn adjust_texture_size(&mut self, textures: &TextureManager) -> Result<()> {
        self.state
            .adjust_texture_size(textures.metadata(self.texture_index)?);
        Ok(())
    }

    pub fn state(&self) -> &SpriteState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SpriteState {
        &mut self.state
    }

    pub fn texture_index(&self) -> usize {
        self.texture_index
    }
}
