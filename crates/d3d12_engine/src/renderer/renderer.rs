use eyre::eyre;
use tracing::debug;
use tracing::info;
use tracing::warn;
use windows::core::Interface;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;
use windows::Win32::System::Threading::CreateEventA;

use super::assets::locate_asset;
use super::compile_shader::compile_flags;
use super::compile_shader::compile_shader;
use super::compile_shader::ShaderStage;
use super::compile_shader::SHADER_FILE;
use super::create_pipeline_state::create_pipeline_state;
use super::create_root_signature::create_root_signature;
use super::debug_messages::log_debug_messages;
use super::descriptor::RtvHeap;
use super::fence_schedule::FenceSchedule;
use super::FRAME_COUNT;
use super::RENDER_TARGET_FORMAT;
use crate::config::signed_dimension;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::error::HresultContext;
use crate::rhi::triangle_vertices;
use crate::rhi::VertexBuffer;
use crate::rhi::VertexPosColor;

/// Everything needed to clear the back buffer and draw the triangle.
pub struct Renderer {
    pub(super) device: ID3D12Device,
    pub(super) command_queue: ID3D12CommandQueue,
    pub(super) swap_chain: IDXGISwapChain3,
    pub(super) frame_index: u32,
    pub(super) render_targets: [ID3D12Resource; FRAME_COUNT],
    pub(super) rtv_heap: RtvHeap,
    pub(super) command_allocator: ID3D12CommandAllocator,
    pub(super) root_signature: ID3D12RootSignature,
    pub(super) pso: ID3D12PipelineState,
    pub(super) command_list: ID3D12GraphicsCommandList,
    pub(super) vertex_buffer: VertexBuffer<VertexPosColor>,
    pub(super) viewport: D3D12_VIEWPORT,
    pub(super) scissor_rect: RECT,
    pub(super) fence: ID3D12Fence,
    pub(super) fence_schedule: FenceSchedule,
    pub(super) fence_event: HANDLE,
    pub(super) clear_color: [f32; 4],
    sync_interval: u32,
    aspect_ratio: f32,
    info_queue: Option<IDXGIInfoQueue>,
    destroyed: bool,
}

impl Renderer {
    pub fn new(
        device: ID3D12Device,
        dxgi_factory: &IDXGIFactory4,
        info_queue: Option<IDXGIInfoQueue>,
        hwnd: HWND,
        config: &EngineConfig,
    ) -> EngineResult<Self> {
        let width = config.window.width;
        let height = config.window.height;

        // Pipeline.
        let command_queue: ID3D12CommandQueue = unsafe {
            device.CreateCommandQueue(&D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
                ..Default::default()
            })
        }
        .context("Failed to create command queue.")?;

        let swap_chain_desc = DXGI_SWAP_CHAIN_DESC1 {
            BufferCount: FRAME_COUNT as u32,
            Width: width,
            Height: height,
            Format: RENDER_TARGET_FORMAT,
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                ..Default::default()
            },
            ..Default::default()
        };

        let swap_chain: IDXGISwapChain1 = unsafe {
            dxgi_factory.CreateSwapChainForHwnd(&command_queue, hwnd, &swap_chain_desc, None, None)
        }
        .context("Failed to create swap chain.")?;
        let swap_chain: IDXGISwapChain3 = swap_chain
            .cast()
            .context("Swap chain does not support IDXGISwapChain3.")?;

        // No fullscreen transitions.
        unsafe { dxgi_factory.MakeWindowAssociation(hwnd, DXGI_MWA_NO_ALT_ENTER) }
            .context("Failed to make window association.")?;

        let frame_index = unsafe { swap_chain.GetCurrentBackBufferIndex() };

        let rtv_heap = RtvHeap::new(&device, FRAME_COUNT as u32)?;
        let render_targets: [ID3D12Resource; FRAME_COUNT] =
            array_init::try_array_init(|i| -> EngineResult<ID3D12Resource> {
                let render_target: ID3D12Resource = unsafe { swap_chain.GetBuffer(i as u32) }
                    .context(format!("Failed to get back buffer {i}."))?;
                let handle = rtv_heap.handle(i as u32)?;
                unsafe { device.CreateRenderTargetView(&render_target, None, handle) };
                Ok(render_target)
            })?;

        let command_allocator: ID3D12CommandAllocator =
            unsafe { device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT) }
                .context("Failed to create command allocator.")?;

        // Assets.
        let root_signature = create_root_signature(&device)?;

        let shader_path = locate_asset(SHADER_FILE)?;
        let flags = compile_flags();
        let vertex_shader = compile_shader(&shader_path, ShaderStage::Vertex, flags)?;
        let pixel_shader = compile_shader(&shader_path, ShaderStage::Pixel, flags)?;
        let pso = create_pipeline_state::<VertexPosColor>(
            &device,
            &root_signature,
            &vertex_shader,
            &pixel_shader,
        )?;

        let command_list: ID3D12GraphicsCommandList = unsafe {
            device.CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, &command_allocator, &pso)
        }
        .context("Failed to create command list.")?;
        // Created in the recording state; render() expects it closed.
        unsafe { command_list.Close() }.context("Failed to close command list.")?;

        let aspect_ratio = config.aspect_ratio();
        let vertex_buffer =
            VertexBuffer::new(&device, &triangle_vertices(aspect_ratio), "Triangle vertices")?;

        let fence: ID3D12Fence =
            unsafe { device.CreateFence(FenceSchedule::INITIAL_FENCE_VALUE, D3D12_FENCE_FLAG_NONE) }
                .context("Failed to create fence.")?;
        let fence_event = unsafe { CreateEventA(None, false, false, None) }
            .context("Failed to create fence event.")?;
        if fence_event.is_invalid() {
            return Err(eyre!("CreateEvent returned an invalid handle").into());
        }

        let viewport = D3D12_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: width as f32,
            Height: height as f32,
            MinDepth: D3D12_MIN_DEPTH,
            MaxDepth: D3D12_MAX_DEPTH,
        };
        let scissor_rect = RECT {
            left: 0,
            top: 0,
            right: signed_dimension(width)?,
            bottom: signed_dimension(height)?,
        };

        let mut renderer = Self {
            device,
            command_queue,
            swap_chain,
            frame_index,
            render_targets,
            rtv_heap,
            command_allocator,
            root_signature,
            pso,
            command_list,
            vertex_buffer,
            viewport,
            scissor_rect,
            fence,
            fence_schedule: FenceSchedule::new(),
            fence_event,
            clear_color: config.graphics.clear_color,
            sync_interval: config.graphics.sync_interval(),
            aspect_ratio,
            info_queue,
            destroyed: false,
        };

        // The vertex upload has to land before the first frame records.
        renderer.wait_for_previous_frame()?;
        info!("Renderer ready ({width}x{height}, {FRAME_COUNT} back buffers)");
        Ok(renderer)
    }

    pub fn render(&mut self) -> EngineResult<()> {
        self.populate_command_list()?;

        let command_lists = [Some(
            self.command_list
                .cast::<ID3D12CommandList>()
                .context("Failed to cast command list.")?,
        )];
        unsafe { self.command_queue.ExecuteCommandLists(&command_lists) };

        unsafe { self.swap_chain.Present(self.sync_interval, DXGI_PRESENT(0)) }
            .ok()
            .context("Failed to present.")?;

        self.wait_for_previous_frame()
    }

    /// Only the aspect ratio follows the window; the swap chain keeps its size.
    pub fn on_window_size_changed(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!("Ignoring resize to {width}x{height}");
            return;
        }
        self.aspect_ratio = width as f32 / height as f32;
        debug!("Window resized to {width}x{height}");
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn device(&self) -> &ID3D12Device {
        &self.device
    }

    pub fn log_debug_messages(&self) {
        log_debug_messages(self.info_queue.as_ref());
    }

    /// Waits for the GPU to finish with every resource and releases the fence
    /// event. Safe to call more than once.
    pub fn on_destroy(&mut self) -> EngineResult<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;

        let wait_result = self.wait_for_previous_frame();
        let close_result = unsafe { CloseHandle(self.fence_event) }
            .context("Failed to close fence event.");
        wait_result?;
        close_result?;
        info!("Renderer destroyed");
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.on_destroy() {
            warn!("Renderer teardown failed: {e:?}");
        }
    }
}
