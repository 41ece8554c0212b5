use std::path::Path;
use std::rc::Rc;

use windows::Win32::Graphics::{Direct3D::*, Direct3D12::*, Dxgi::Common::*};

use super::d3d12::{
    device::{Device, DEPTH_FORMAT, RTV_FORMAT},
    pso,
    resource::UploadBuffer,
    shader::{self, ShaderCompiler, ShaderConfig},
};
use super::texture_manager::TextureManager;
use crate::camera::Camera;
use crate::error::Result;
use crate::math::{DirectionalLightData, Material, Transform, TransformationMatrix, VertexData};
use crate::obj;

const VERTEX_SHADER: &str = "shaders/object3d_vs.hlsl";
const PIXEL_SHADER: &str = "shaders/object3d_ps.hlsl";

const ROOT_MATERIAL: u32 = 0;
const ROOT_TRANSFORMATION: u32 = 1;
const ROOT_TEXTURE: u32 = 2;
const ROOT_DIRECTIONAL_LIGHT: u32 = 3;

/// Pipeline shared by every 3D object.
pub struct ModelCommon {
    root_signature: ID3D12RootSignature,
    pso: ID3D12PipelineState,
}

impl ModelCommon {
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
        pso::root_cbv(0, D3D12_SHADER_VISIBILITY_PIXEL),
        pso::root_cbv(0, D3D12_SHADER_VISIBILITY_VERTEX),
        pso::root_table(&ranges, D3D12_SHADER_VISIBILITY_PIXEL),
        pso::root_cbv(1, D3D12_SHADER_VISIBILITY_PIXEL),
    ];
    let samplers = [pso::linear_wrap_sampler(0)];

    let desc = pso::root_signature_desc(&params, &samplers);
    pso::create_root_signature(device, &desc, "ModelCommon::root_signature")
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
        RasterizerState: pso::rasterizer_desc(D3D12_CULL_MODE_NONE),
        DepthStencilState: pso::depth_stencil_desc(true),

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

    pso::create_gfx_pso(device, &desc, "ModelCommon::pso")
}

/// Geometry and material of one OBJ file, shared between the objects that
/// display it.
pub struct Model {
    texture_index: usize,
    vertex_buffer: UploadBuffer<VertexData>,
    index_buffer: UploadBuffer<u32>,
    material_data: Material,
    material: UploadBuffer<Material>,
}

impl Model {
    /// Loads `path` and the texture its material refers to. A model without
    /// a diffuse texture is drawn with a white one.
    pub fn load(
        device: &mut Device,
        textures: &mut TextureManager,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let data = obj::load(path)?;

        let texture_index = match &data.material.texture_file_path {
            Some(texture) => textures.load_texture(device, texture)?,
            None => {
                tracing::warn!("{} has no diffuse texture", path.display());
                textures.white_texture(device)?
            }
        };

        let name = path.display();
        let vertex_buffer =
            UploadBuffer::with_data(device.get(), &data.vertices, &format!("{name}::vertices"))?;
        let index_buffer =
            UploadBuffer::with_data(device.get(), &data.indices, &format!("{name}::indices"))?;
        let material_data = Material {
            enable_lighting: 1,
            ..Default::default()
        };
        let material =
            UploadBuffer::with_data(device.get(), &[material_data], &format!("{name}::material"))?;

        tracing::info!(
            vertices = data.vertices.len(),
            indices = data.indices.len(),
            "Loaded model {name}"
        );

        Ok(Self {
            texture_index,
            vertex_buffer,
            index_buffer,
            material_data,
            material,
        })
    }

    /// Only callable before the model is shared with any [`Object3d`].
    pub fn set_color(&mut self, color: [f32; 4]) {
        self.material_data.color = color;
        self.material.write_one(self.material_data);
    }

    pub fn set_lighting_enabled(&mut self, enabled: bool) {
        self.material_data.enable_lighting = enabled.into();
        self.material.write_one(self.material_data);
    }

    pub fn material(&self) -> &Material {
        &self.material_data
    }

    pub fn texture_index(&self) -> usize {
        self.texture_index
    }

    pub fn index_count(&self) -> u32 {
        self.index_buffer.len() as u32
    }

    fn draw(&self, device: &Device, textures: &TextureManager) -> Result<()> {
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

            cmd_list
                .SetGraphicsRootConstantBufferView(ROOT_MATERIAL, self.material.gpu_virtual_address());
            cmd_list.SetGraphicsRootDescriptorTable(ROOT_TEXTURE, srv);

            cmd_list.DrawIndexedInstanced(self.index_count(), 1, 0, 0, 0);
        }
        Ok(())
    }
}

/// A placed instance of a [`Model`].
pub struct Object3d {
    pub transform: Transform,
    model: Rc<Model>,
    transformation: UploadBuffer<TransformationMatrix>,
}

impl Object3d {
    pub fn build(device: &Device, model: Rc<Model>) -> Result<Self> {
        let transformation = UploadBuffer::with_data(
            device.get(),
            &[TransformationMatrix::default()],
            "Object3d::transformation",
        )?;
        Ok(Self {
            transform: Transform::default(),
            model,
            transformation,
        })
    }

    pub fn update(&mut self, camera: &Camera) {
        let world = self.transform.matrix();
        let wvp = camera.view_projection_matrix() * world;
        self.transformation
            .write_one(TransformationMatrix::new(&wvp, &world));
    }

    pub fn draw(
        &self,
        device: &Device,
        textures: &TextureManager,
        light: &UploadBuffer<DirectionalLightData>,
    ) -> Result<()> {
        let cmd_list = device.command_list()?;
        unsafe {
            cmd_list.SetGraphicsRootConstantBufferView(
                ROOT_TRANSFORMATION,
                self.transformation.gpu_virtual_address(),
            );
            cmd_list.SetGraphicsRootConstantBufferView(
                ROOT_DIRECTIONAL_LIGHT,
                light.gpu_virtual_address(),
            );
        }
        self.model.draw(device, textures)
    }

    pub fn model(&self) -> &Rc<Model> {
        &self.model
    }

    pub fn set_model(&mut self, model: Rc<Model>) {
        self.model = model;
    }
}
