use std::path::PathBuf;

use windows::core::{w, HSTRING, PCWSTR};
use windows::Win32::Graphics::Direct3D::Dxc::*;
use windows::Win32::Graphics::Direct3D12::D3D12_SHADER_BYTECODE;

use crate::error::{Error, Result};

pub struct ShaderConfig {
    pub path: PathBuf,
    pub entry_point: String,
    pub target: String,
}

impl ShaderConfig {
    pub fn vertex(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entry_point: "vs_main".into(),
            target: "vs_6_0".into(),
        }
    }

    pub fn pixel(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entry_point: "ps_main".into(),
            target: "ps_6_0".into(),
        }
    }
}

pub struct ShaderCompiler {
    compiler: IDxcCompiler3,
    utils: IDxcUtils,
    include_handler: IDxcIncludeHandler,
    debug: bool,
}

impl ShaderCompiler {
    pub fn build(debug: bool) -> Result<Self> {
        let utils: IDxcUtils = unsafe { DxcCreateInstance(&CLSID_DxcUtils) }?;
        let compiler = unsafe { DxcCreateInstance(&CLSID_DxcCompiler) }?;

        let include_handler = unsafe { utils.CreateDefaultIncludeHandler() }?;

        Ok(Self {
            compiler,
            utils,
            include_handler,
            debug,
        })
    }

    /// Compiles one entry point. Any compiler error fails the build of the
    /// pipeline that needs it; warnings are only logged.
    pub fn compile_file(&self, config: &ShaderConfig) -> Result<IDxcBlob> {
        let display = config.path.display().to_string();
        tracing::info!("Compiling {display} {}", config.entry_point);

        let filename: HSTRING = config.path.as_os_str().into();
        let file = unsafe { self.utils.LoadFile(PCWSTR(filename.as_ptr()), None) }.map_err(|e| {
            Error::ShaderCompilation {
                path: display.clone(),
                message: e.message(),
            }
        })?;

        let source = DxcBuffer {
            Ptr: unsafe { file.GetBufferPointer() },
            Size: unsafe { file.GetBufferSize() },
            Encoding: DXC_CP_ACP.0,
        };

        let entry: HSTRING = config.entry_point.as_str().into();
        let target: HSTRING = config.target.as_str().into();

        let mut args = vec![
            PCWSTR(filename.as_ptr()),
            w!("-E"),
            PCWSTR(entry.as_ptr()),
            w!("-T"),
            PCWSTR(target.as_ptr()),
            w!("-HV"),
            w!("2021"),
        ];
        if self.debug {
            args.extend([w!("-Zi"), w!("-Qembed_debug"), w!("-Od")]);
        } else {
            args.push(w!("-O3"));
        }

        let result: IDxcResult = unsafe {
            self.compiler
                .Compile(&source, Some(&args), &self.include_handler)
        }?;

        let mut errors: Option<IDxcBlobUtf8> = None;
        unsafe { result.GetOutput(DXC_OUT_ERRORS, &mut None, &mut errors) }?;
        let diagnostics = errors
            .filter(|e| unsafe { e.GetStringLength() } != 0)
            .and_then(|e| unsafe { e.GetStringPointer().to_string() }.ok());

        let status = unsafe { result.GetStatus() }?;
        if status.is_err() {
            return Err(Error::ShaderCompilation {
                path: display,
                message: diagnostics.unwrap_or_else(|| status.message()),
            });
        }
        if let Some(warnings) = diagnostics {
            tracing::warn!("{display}: {warnings}");
        }

        let mut output = None;
        let mut shader_name = None;
        unsafe { result.GetOutput(DXC_OUT_OBJECT, &mut shader_name, &mut output) }?;
        output.ok_or_else(|| Error::ShaderCompilation {
            path: display,
            message: "the compiler produced no object".into(),
        })
    }
}

pub fn bytecode(blob: &IDxcBlob) -> D3D12_SHADER_BYTECODE {
    D3D12_SHADER_BYTECODE {
        pShaderBytecode: unsafe { blob.GetBufferPointer() },
        BytecodeLength: unsafe { blob.GetBufferSize() },
    }
}
