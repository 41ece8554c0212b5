use std::ffi::CString;
use std::rc::Rc;

use windows::core::PCSTR;
use windows::Win32::{
    Foundation::{HWND, LPARAM, LRESULT, RECT, WPARAM},
    System::LibraryLoader::GetModuleHandleA,
    UI::Input::KeyboardAndMouse::*,
    UI::WindowsAndMessaging::*,
};

use crate::camera::{Camera, DirectionalLight};
use crate::error::{Error, Result};
use crate::gfx::d3d12::{device::Device, resource::UploadBuffer, shader::ShaderCompiler};
use crate::gfx::model::{Model, ModelCommon, Object3d};
use crate::gfx::sprite::{Sprite, SpriteCommon};
use crate::gfx::texture_manager::TextureManager;
use crate::input::{self, Keyboard};
use crate::math::{DirectionalLightData, Vec2, Vec3, Vec4};
use crate::Config;

const SPRITE_TEXTURE: &str = "uvChecker.png";
const PLANE_MODEL: &str = "plane.obj";

const CAMERA_SPEED: f32 = 0.1;
const SPRITE_SPEED: f32 = 4.0;

pub fn run(config: &Config) -> Result<()> {
    let class_name = windows::core::s!("engine_window");
    let title = CString::new(config.title())
        .map_err(|e| Error::Argument(format!("invalid window title: {e}")))?;

    let instance = unsafe { GetModuleHandleA(None)? };

    let wnd_class = WNDCLASSEXA {
        cbSize: std::mem::size_of::<WNDCLASSEXA>() as u32,
        style: CS_HREDRAW | CS_VREDRAW, // redraw when window size or position changes, horizontally and vertically
        lpfnWndProc: Some(wnd_proc),
        hInstance: instance.into(),
        hCursor: unsafe { LoadCursorW(None, IDC_ARROW)? },
        lpszClassName: class_name,
        ..Default::default()
    };
    if unsafe { RegisterClassExA(&wnd_class) } == 0 {
        return Err(windows::core::Error::from_win32().into());
    }

    let mut rect = RECT {
        left: 0,
        top: 0,
        right: config.client_width() as i32,
        bottom: config.client_height() as i32,
    };

    // filled in once the device exists; the window procedure only reaches it
    // through this pointer, and it is reclaimed after the message loop ends
    let framework: *mut Option<Framework> = Box::into_raw(Box::new(None));

    let hwnd = unsafe {
        AdjustWindowRect(&mut rect, WS_OVERLAPPEDWINDOW, false)?;

        CreateWindowExA(
            WINDOW_EX_STYLE::default(),
            class_name,
            PCSTR(title.as_ptr() as *const u8),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            rect.right - rect.left,
            rect.bottom - rect.top,
            None,
            None,
            instance,
            Some(framework as *const std::ffi::c_void),
        )
    };
    let hwnd = match hwnd {
        Ok(hwnd) => hwnd,
        Err(e) => {
            drop(unsafe { Box::from_raw(framework) });
            return Err(e.into());
        }
    };

    let result = run_loop(hwnd, config, framework);
    if let Err(e) = &result {
        tracing::error!("Stopping: {e}");
        let _ = unsafe { DestroyWindow(hwnd) };
    }

    // the window is gone, so nothing can observe the pointer any more
    let framework = unsafe { Box::from_raw(framework) };
    if let Some(mut framework) = *framework {
        framework.finalize()?;
    }

    result
}

fn run_loop(hwnd: HWND, config: &Config, framework: *mut Option<Framework>) -> Result<()> {
    unsafe { *framework = Some(Framework::build(hwnd, config)?) };

    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
    }

    let mut msg = MSG::default();
    loop {
        while unsafe { PeekMessageA(&mut msg, None, 0, 0, PM_REMOVE) }.as_bool() {
            if msg.message == WM_QUIT {
                return Ok(());
            }
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageA(&msg);
            }
        }

        // no message is being dispatched, so this is the only live reference
        if let Some(framework) = unsafe { (*framework).as_mut() } {
            framework.update()?;
            framework.draw()?;
        }
    }
}

extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_CREATE => {
            unsafe {
                let data = &*(lparam.0 as *const CREATESTRUCTA);
                SetWindowLongPtrA(hwnd, GWLP_USERDATA, data.lpCreateParams as _);
            }
            LRESULT::default()
        }
        WM_KILLFOCUS => {
            let user_data = unsafe { GetWindowLongPtrA(hwnd, GWLP_USERDATA) };
            if let Some(mut framework) = std::ptr::NonNull::<Option<Framework>>::new(user_data as _) {
                if let Some(framework) = unsafe { framework.as_mut() } {
                    framework.keyboard.release_all();
                }
            }
            LRESULT::default()
        }
        WM_DESTROY => {
            unsafe {
                SetWindowLongPtrA(hwnd, GWLP_USERDATA, 0);
                PostQuitMessage(0);
            }
            LRESULT::default()
        }
        _ => unsafe { DefWindowProcA(hwnd, msg, wparam, lparam) },
    }
}

/// The scene and everything needed to draw it. Fields drop in declaration
/// order, so GPU objects go before the device that owns the queue.
struct Framework {
    sprites: Vec<Sprite>,
    objects: Vec<Object3d>,
    light_buffer: UploadBuffer<DirectionalLightData>,

    sprite_common: SpriteCommon,
    model_common: ModelCommon,
    textures: TextureManager,

    camera: Camera,
    light: DirectionalLight,
    keyboard: Keyboard,

    hwnd: HWND,
    device: Device,
}

impl Framework {
    fn build(hwnd: HWND, config: &Config) -> Result<Self> {
        let mut device = Device::build(hwnd, config)?;
        let compiler = ShaderCompiler::build(config.debug_layer_enabled())?;

        let sprite_common = SpriteCommon::build(&device, &compiler)?;
        let model_common = ModelCommon::build(&device, &compiler)?;
        let mut textures = TextureManager::new(&device);

        let sprite_texture = config.asset_dir().join(SPRITE_TEXTURE);
        textures.load_texture(&mut device, &sprite_texture)?;

        let mut sprites = Vec::new();
        for i in 0..2 {
            let mut sprite = Sprite::build(&device, &textures, &sprite_texture)?;
            let state = sprite.state_mut();
            state.position = Vec2::new(100.0 + 300.0 * i as f32, 100.0);
            state.size *= 0.5;
            sprites.push(sprite);
        }
        if let Some(sprite) = sprites.last_mut() {
            let state = sprite.state_mut();
            state.anchor_point = Vec2::splat(0.5);
            state.is_flip_x = true;
            state.color = Vec4::new(1.0, 1.0, 1.0, 0.5);
        }

        let plane = Rc::new(Model::load(
            &mut device,
            &mut textures,
            config.asset_dir().join(PLANE_MODEL),
        )?);
        let mut objects = Vec::new();
        for x in [-1.5, 1.5] {
            let mut object = Object3d::build(&device, Rc::clone(&plane))?;
            object.transform.translate = Vec3::new(x, 0.0, 0.0);
            objects.push(object);
        }

        let mut light = DirectionalLight::default();
        light.set_direction(Vec3::new(0.0, -1.0, 1.0));
        let light_buffer = UploadBuffer::with_data(
            device.get(),
            &[light.data()],
            "Framework::light_buffer",
        )?;

        tracing::info!(
            textures = textures.len(),
            sprites = sprites.len(),
            objects = objects.len(),
            "Scene initialized"
        );

        Ok(Self {
            sprites,
            objects,
            light_buffer,

            sprite_common,
            model_common,
            textures,

            camera: Camera::new(config.aspect_ratio()),
            light,
            keyboard: Keyboard::new(),

            hwnd,
            device,
        })
    }

    fn update(&mut self) -> Result<()> {
        input::poll(&mut self.keyboard);

        if self.keyboard.is_triggered(VK_ESCAPE.0 as u8) {
            unsafe { PostMessageA(self.hwnd, WM_CLOSE, WPARAM(0), LPARAM(0)) }?;
        }

        let key_axis = |negative: VIRTUAL_KEY, positive: VIRTUAL_KEY| {
            let pressed = |key: VIRTUAL_KEY| self.keyboard.is_pressed(key.0 as u8) as i32 as f32;
            pressed(positive) - pressed(negative)
        };
        let camera_move = Vec3::new(key_axis(VK_LEFT, VK_RIGHT), 0.0, key_axis(VK_DOWN, VK_UP));
        let sprite_move = Vec2::new(key_axis(VK_A, VK_D), key_axis(VK_W, VK_S));

        self.camera.transform.translate += camera_move * CAMERA_SPEED;

        if self.keyboard.is_triggered(VK_SPACE.0 as u8) {
            let direction = self.light.direction();
            self.light
                .set_direction(Vec3::new(-direction.x, direction.y, direction.z));
        }
        self.light_buffer.write_one(self.light.data());

        for object in &mut self.objects {
            object.transform.rotate.y += 0.01;
            object.update(&self.camera);
        }

        if let Some(sprite) = self.sprites.first_mut() {
            sprite.state_mut().position += sprite_move * SPRITE_SPEED;
        }
        if let Some(sprite) = self.sprites.last_mut() {
            sprite.state_mut().rotation += 0.01;
        }
        for sprite in &mut self.sprites {
            sprite.update(&self.device, &self.textures)?;
        }

        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        self.device.pre_draw()?;
        // the frame has to be closed even when recording fails
        let recorded = self.record_commands();
        let presented = self.device.post_draw();
        recorded.and(presented)
    }

    fn record_commands(&self) -> Result<()> {
        self.model_common.setup_common_drawing(&self.device)?;
        for object in &self.objects {
            object.draw(&self.device, &self.textures, &self.light_buffer)?;
        }

        self.sprite_common.setup_common_drawing(&self.device)?;
        for sprite in &self.sprites {
            sprite.draw(&self.device, &self.textures)?;
        }

        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.device.flush()?;
        tracing::info!("Framework finalized");
        Ok(())
    }
}
