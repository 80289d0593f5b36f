//! Direct3D 12 renderer for the hello triangle.

pub mod assets;
pub mod compile_shader;
pub mod descriptor;
pub mod fence_schedule;

#[cfg(windows)]
pub mod adapter_utils;
#[cfg(windows)]
pub mod create_device;
#[cfg(windows)]
pub mod create_pipeline_state;
#[cfg(windows)]
pub mod create_root_signature;
#[cfg(windows)]
pub mod debug_messages;
#[cfg(windows)]
mod populate_command_list;
#[cfg(windows)]
pub mod renderer;
#[cfg(windows)]
pub mod transition_barrier;
#[cfg(windows)]
mod wait_for_previous_frame;

#[cfg(windows)]
pub use create_device::create_device;
#[cfg(windows)]
pub use debug_messages::log_debug_messages;
pub use fence_schedule::FenceSchedule;
#[cfg(windows)]
pub use renderer::Renderer;

/// Number of swap chain back buffers.
pub const FRAME_COUNT: usize = 2;

#[cfg(windows)]
pub const RENDER_TARGET_FORMAT: windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT =
    windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT_R8G8B8A8_UNORM;
