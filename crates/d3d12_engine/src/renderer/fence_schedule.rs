/// CPU side bookkeeping for the frame fence.
///
/// The fence is created with value 0 and every submission signals the next
/// value, so values handed out are strictly increasing and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceSchedule {
    next_value: u64,
}

impl Default for FenceSchedule {
    fn default() -> Self {
        Self::new()
    }
}

impl FenceSchedule {
    pub const INITIAL_FENCE_VALUE: u64 = 0;

    pub fn new() -> Self {
        Self {
            next_value: Self::INITIAL_FENCE_VALUE + 1,
        }
    }

    /// Value to pass to `ID3D12CommandQueue::Signal`; advances the schedule.
    pub fn next_signal(&mut self) -> u64 {
        let value = self.next_value;
        self.next_value += 1;
        value
    }

    pub fn last_signalled(&self) -> Option<u64> {
        (self.next_value > Self::INITIAL_FENCE_VALUE + 1).then(|| self.next_value - 1)
    }

    /// The CPU has to block when the GPU has not reached the signalled value yet.
    pub fn must_wait(completed: u64, signalled: u64) -> bool {
        completed < signalled
    }

    /// True once the GPU has caught up with everything signalled so far.
    pub fn is_idle(&self, completed: u64) -> bool {
        self.last_signalled()
            .is_none_or(|last| !Self::must_wait(completed, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_signal_is_one() {
        let mut schedule = FenceSchedule::new();
        assert_eq!(schedule.last_signalled(), None);
        assert_eq!(schedule.next_signal(), 1);
        assert_eq!(schedule.last_signalled(), Some(1));
    }

    #[test]
    fn values_increase_monotonically() {
        let mut schedule = FenceSchedule::default();
        let values: Vec<u64> = (0..5).map(|_| schedule.next_signal()).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn waits_only_while_gpu_is_behind() {
        assert!(FenceSchedule::must_wait(0, 1));
        assert!(!FenceSchedule::must_wait(1, 1));
        assert!(!FenceSchedule::must_wait(2, 1));
        // A removed device reports u64::MAX, which must never block.
        assert!(!FenceSchedule::must_wait(u64::MAX, 7));
    }

    #[test]
    fn idle_tracks_the_last_signal() {
        let mut schedule = FenceSchedule::new();
        assert!(schedule.is_idle(0));
        schedule.next_signal();
        schedule.next_signal();
        assert!(!schedule.is_idle(1));
        assert!(schedule.is_idle(2));
    }
}
