use eyre::eyre;
use windows::Win32::Foundation::WAIT_OBJECT_0;
use windows::Win32::System::Threading::WaitForSingleObject;
use windows::Win32::System::Threading::INFINITE;

use super::fence_schedule::FenceSchedule;
use super::renderer::Renderer;
use crate::error::EngineResult;
use crate::error::HresultContext;

impl Renderer {
    /// Blocks until the GPU has finished the last submission.
    ///
    /// Simple, not fast: the CPU never records ahead of the GPU.
    pub fn wait_for_previous_frame(&mut self) -> EngineResult<()> {
        let fence_value = self.fence_schedule.next_signal();
        unsafe { self.command_queue.Signal(&self.fence, fence_value) }
            .context("Failed to signal fence.")?;

        let completed = unsafe { self.fence.GetCompletedValue() };
        if FenceSchedule::must_wait(completed, fence_value) {
            unsafe { self.fence.SetEventOnCompletion(fence_value, self.fence_event) }
                .context("Failed to set fence completion event.")?;
            let wait = unsafe { WaitForSingleObject(self.fence_event, INFINITE) };
            if wait != WAIT_OBJECT_0 {
                return Err(eyre!("Waiting on fence value {fence_value} failed: {wait:?}").into());
            }
        }

        self.frame_index = unsafe { self.swap_chain.GetCurrentBackBufferIndex() };
        Ok(())
    }
}
