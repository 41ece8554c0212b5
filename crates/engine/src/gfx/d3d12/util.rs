use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{E_FAIL, RECT};
use windows::Win32::Graphics::Direct3D::ID3DBlob;
use windows::Win32::Graphics::Direct3D12::*;

pub fn set_name(object: &ID3D12Object, name: PCWSTR) -> windows::core::Result<()> {
    unsafe { object.SetName(name) }
}

pub fn set_name_str(object: &ID3D12Object, name: &str) -> windows::core::Result<()> {
    // https://github.com/microsoft/windows-rs/issues/973
    let name: HSTRING = name.into();
    set_name(object, PCWSTR(name.as_ptr()))
}

/// Unwraps the out-parameter of a `Create*` call that reported success.
pub fn created<T>(object: Option<T>, name: &str) -> windows::core::Result<T> {
    object.ok_or_else(|| windows::core::Error::new(E_FAIL, format!("Failed to create {name}")))
}

/// Error blobs from the root signature serializer are NUL-terminated ANSI text.
pub fn blob_to_string(blob: &ID3DBlob) -> String {
    let bytes = unsafe {
        std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize())
    };
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .trim_end()
        .to_string()
}

pub fn viewport(width: u32, height: u32) -> D3D12_VIEWPORT {
    D3D12_VIEWPORT {
        TopLeftX: 0.0,
        TopLeftY: 0.0,
        Width: width as f32,
        Height: height as f32,
        MinDepth: D3D12_MIN_DEPTH,
        MaxDepth: D3D12_MAX_DEPTH,
    }
}

pub fn scissor_rect(width: u32, height: u32) -> RECT {
    RECT {
        left: 0,
        top: 0,
        right: width as i32,
        bottom: height as i32,
    }
}
