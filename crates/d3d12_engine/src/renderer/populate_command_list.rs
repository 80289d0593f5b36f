use windows::Win32::Graphics::Direct3D::D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST;
use windows::Win32::Graphics::Direct3D12::*;

use super::renderer::Renderer;
use super::transition_barrier::transition_barrier;
use crate::error::EngineResult;
use crate::error::HresultContext;

impl Renderer {
    /// Records the frame: clear the current back buffer and draw the triangle.
    pub(super) fn populate_command_list(&mut self) -> EngineResult<()> {
        // Only safe because wait_for_previous_frame left the GPU idle.
        unsafe { self.command_allocator.Reset() }
            .context("Failed to reset command allocator.")?;

        let command_list = &self.command_list;
        unsafe { command_list.Reset(&self.command_allocator, &self.pso) }
            .context("Failed to reset command list.")?;

        unsafe {
            command_list.SetGraphicsRootSignature(&self.root_signature);
            command_list.RSSetViewports(&[self.viewport]);
            command_list.RSSetScissorRects(&[self.scissor_rect]);
        }

        let back_buffer = &self.render_targets[self.frame_index as usize];
        unsafe {
            command_list.ResourceBarrier(&[transition_barrier(
                back_buffer,
                D3D12_RESOURCE_STATE_PRESENT,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
            )])
        };

        let rtv_handle = self.rtv_heap.handle(self.frame_index)?;
        unsafe {
            command_list.OMSetRenderTargets(1, Some(&rtv_handle), false, None);
            command_list.ClearRenderTargetView(rtv_handle, &self.clear_color, None);
            command_list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
        }
        self.vertex_buffer.apply(command_list);
        unsafe {
            command_list.DrawInstanced(self.vertex_buffer.vertex_count(), 1, 0, 0);

            command_list.ResourceBarrier(&[transition_barrier(
                back_buffer,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
                D3D12_RESOURCE_STATE_PRESENT,
            )]);
        }

        unsafe { command_list.Close() }.context("Failed to close command list.")
    }
}
