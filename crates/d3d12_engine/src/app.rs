//! Application lifecycle: COM, window, renderer and the message loop.

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use windows::Win32::Foundation::HMODULE;
use windows::Win32::System::Com::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleExW;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::error::HresultContext;
use crate::input::InputState;
use crate::renderer::create_device;
use crate::renderer::log_debug_messages;
use crate::renderer::Renderer;
use crate::timer::StepTimer;
use crate::window::create_window_class;
use crate::window::register_window_class;
use crate::window::HandlerCell;
use crate::window::Window;
use crate::window::WindowEvents;

/// Keeps COM initialized on this thread for as long as it lives.
pub struct ComGuard(());

impl ComGuard {
    pub fn new() -> EngineResult<Self> {
        unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }
            .ok()
            .context("Failed to initialize COM.")?;
        Ok(Self(()))
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

fn get_handle_to_file_used_to_create_the_calling_process() -> EngineResult<HMODULE> {
    let mut out = Default::default();
    unsafe { GetModuleHandleExW(Default::default(), None, &mut out) }
        .context("Failed to get module handle.")?;
    Ok(out)
}

// Field order is drop order: the renderer goes before the window it presents
// to, the window before the handler its procedure points at, COM last.
pub struct Application {
    renderer: Renderer,
    window: Window,
    events: HandlerCell<WindowEvents>,
    timer: StepTimer,
    config: EngineConfig,
    _com: ComGuard,
}

impl Application {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let com = ComGuard::new()?;

        let instance = get_handle_to_file_used_to_create_the_calling_process()?;
        let window_class = create_window_class::<WindowEvents>(instance)?;
        let class_atom = register_window_class(&window_class)?;

        // Declared before the window so an early return destroys the window first.
        let events = HandlerCell::new(WindowEvents::default());
        let window = Window::create(
            instance,
            &class_atom,
            (config.window.width, config.window.height),
            &config.window_title(),
            &events,
        )?;

        let (dxgi_factory, device, info_queue) = create_device(&config.graphics)?;
        let renderer = match Renderer::new(
            device,
            &dxgi_factory,
            info_queue.clone(),
            window.hwnd(),
            &config,
        ) {
            Ok(renderer) => renderer,
            Err(e) => {
                log_debug_messages(info_queue.as_ref());
                return Err(e);
            }
        };

        window.show();
        info!("{} is up", config.window_title());

        Ok(Self {
            renderer,
            window,
            events,
            timer: StepTimer::new(),
            config,
            _com: com,
        })
    }

    /// Pumps messages until `WM_QUIT`, ticking whenever the queue is empty.
    pub fn run(mut self) -> EngineResult<()> {
        let result = self.message_loop();
        let destroyed = self.on_destroy();
        result?;
        destroyed
    }

    fn message_loop(&mut self) -> EngineResult<()> {
        let mut message = MSG::default();
        loop {
            if unsafe { PeekMessageW(&mut message, None, 0, 0, PM_REMOVE) }.as_bool() {
                if message.message == WM_QUIT {
                    debug!("WM_QUIT received");
                    return Ok(());
                }
                unsafe {
                    _ = TranslateMessage(&message);
                    DispatchMessageW(&message);
                }
            } else if !self.events.get().is_destroyed() {
                if let Some((width, height)) = self.events.get_mut().take_resize() {
                    self.renderer.on_window_size_changed(width, height);
                }
                self.tick()?;
            }
        }
    }

    pub fn tick(&mut self) -> EngineResult<()> {
        let input = &self.events.get().input;
        self.timer.tick(|timer| on_update(timer, input));
        self.on_render()
    }

    fn on_render(&mut self) -> EngineResult<()> {
        if let Err(e) = self.renderer.render() {
            error!("Render failed: {e:?}");
            self.renderer.log_debug_messages();
            return Err(e);
        }
        Ok(())
    }

    fn on_destroy(&mut self) -> EngineResult<()> {
        info!(
            "Shutting down after {} frames ({} fps)",
            self.timer.frame_count(),
            self.timer.frames_per_second()
        );
        self.renderer.on_destroy()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

/// Nothing moves yet; input is only observed.
fn on_update(timer: &StepTimer, input: &InputState) {
    let pressed: Vec<u8> = input.keyboard.pressed_keys().collect();
    if !pressed.is_empty() {
        trace!(
            "Frame {}: keys down {:?}, mouse at ({}, {})",
            timer.frame_count(),
            pressed,
            input.mouse.x,
            input.mouse.y
        );
    }
}
