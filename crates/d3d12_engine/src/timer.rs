use std::time::Duration;
use std::time::Instant;

/// Integer tick resolution used for all timer bookkeeping (100ns).
pub const TICKS_PER_SECOND: u64 = 10_000_000;

pub fn ticks_to_seconds(ticks: u64) -> f64 {
    ticks as f64 / TICKS_PER_SECOND as f64
}

pub fn seconds_to_ticks(seconds: f64) -> u64 {
    (seconds * TICKS_PER_SECOND as f64) as u64
}

fn duration_to_ticks(duration: Duration) -> u64 {
    (duration.as_nanos() / 100) as u64
}

/// Frame timer driving the update step, in either variable or fixed step mode.
///
/// In fixed step mode `tick` may call `update` zero, one or several times to
/// catch up with real time. Large stalls are clamped to `max_delta`.
#[derive(Debug, Clone)]
pub struct StepTimer {
    last_time: Instant,
    max_delta: u64,

    elapsed_ticks: u64,
    total_ticks: u64,
    left_over_ticks: u64,

    frame_count: u32,
    frames_per_second: u32,
    frames_this_second: u32,
    second_counter: u64,

    is_fixed_time_step: bool,
    target_elapsed_ticks: u64,
}

impl Default for StepTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl StepTimer {
    pub fn new() -> Self {
        Self::new_at(Instant::now())
    }

    pub fn new_at(now: Instant) -> Self {
        Self {
            last_time: now,
            max_delta: TICKS_PER_SECOND / 10,
            elapsed_ticks: 0,
            total_ticks: 0,
            left_over_ticks: 0,
            frame_count: 0,
            frames_per_second: 0,
            frames_this_second: 0,
            second_counter: 0,
            is_fixed_time_step: false,
            target_elapsed_ticks: TICKS_PER_SECOND / 60,
        }
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    pub fn elapsed_seconds(&self) -> f64 {
        ticks_to_seconds(self.elapsed_ticks)
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn total_seconds(&self) -> f64 {
        ticks_to_seconds(self.total_ticks)
    }

    /// Number of update steps run since the timer was created.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    pub fn is_fixed_time_step(&self) -> bool {
        self.is_fixed_time_step
    }

    pub fn set_fixed_time_step(&mut self, fixed: bool) {
        self.is_fixed_time_step = fixed;
    }

    pub fn set_target_elapsed_ticks(&mut self, ticks: u64) {
        self.target_elapsed_ticks = ticks.max(1);
    }

    pub fn set_target_elapsed_seconds(&mut self, seconds: f64) {
        self.set_target_elapsed_ticks(seconds_to_ticks(seconds));
    }

    pub fn set_max_delta(&mut self, max_delta: Duration) {
        self.max_delta = duration_to_ticks(max_delta);
    }

    /// Call after an intentional stall (e.g. a blocking load) so the fixed
    /// step logic does not try to catch up.
    pub fn reset_elapsed_time(&mut self) {
        self.reset_elapsed_time_at(Instant::now());
    }

    pub fn reset_elapsed_time_at(&mut self, now: Instant) {
        self.last_time = now;
        self.left_over_ticks = 0;
        self.frames_per_second = 0;
        self.frames_this_second = 0;
        self.second_counter = 0;
    }

    pub fn tick<F>(&mut self, update: F)
    where
        F: FnMut(&StepTimer),
    {
        self.tick_at(Instant::now(), update);
    }

    pub fn tick_at<F>(&mut self, now: Instant, mut update: F)
    where
        F: FnMut(&StepTimer),
    {
        let raw_delta = duration_to_ticks(now.saturating_duration_since(self.last_time));
        self.last_time = now;
        self.second_counter += raw_delta;

        let mut time_delta = raw_delta.min(self.max_delta);
        let last_frame_count = self.frame_count;

        if self.is_fixed_time_step {
            // Snap to the target when the clock is within 1/4 of a millisecond,
            // otherwise small timing errors accumulate into dropped frames.
            if time_delta.abs_diff(self.target_elapsed_ticks) < TICKS_PER_SECOND / 4000 {
                time_delta = self.target_elapsed_ticks;
            }

            self.left_over_ticks += time_delta;

            while self.left_over_ticks >= self.target_elapsed_ticks {
                self.elapsed_ticks = self.target_elapsed_ticks;
                self.total_ticks += self.target_elapsed_ticks;
                self.left_over_ticks -= self.target_elapsed_ticks;
                self.frame_count += 1;

                update(self);
            }
        } else {
            self.elapsed_ticks = time_delta;
            self.total_ticks += time_delta;
            self.left_over_ticks = 0;
            self.frame_count += 1;

            update(self);
        }

        if self.frame_count != last_frame_count {
            self.frames_this_second += 1;
        }

        if self.second_counter >= TICKS_PER_SECOND {
            self.frames_per_second = self.frames_this_second;
            self.frames_this_second = 0;
            self.second_counter %= TICKS_PER_SECOND;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn variable_step_updates_once_per_tick() {
        let start = Instant::now();
        let mut timer = StepTimer::new_at(start);
        let mut updates = 0;

        timer.tick_at(start + ms(16), |t| {
            updates += 1;
            assert_eq!(t.elapsed_ticks(), 160_000);
        });
        timer.tick_at(start + ms(40), |_| updates += 1);

        assert_eq!(updates, 2);
        assert_eq!(timer.frame_count(), 2);
        assert_eq!(timer.elapsed_ticks(), 240_000);
        assert_eq!(timer.total_ticks(), 400_000);
    }

    #[test]
    fn large_deltas_are_clamped() {
        let start = Instant::now();
        let mut timer = StepTimer::new_at(start);
        timer.tick_at(start + Duration::from_secs(5), |_| {});
        assert_eq!(timer.elapsed_ticks(), TICKS_PER_SECOND / 10);
        assert!((timer.elapsed_seconds() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn fixed_step_catches_up_and_carries_left_over() {
        let start = Instant::now();
        let mut timer = StepTimer::new_at(start);
        timer.set_fixed_time_step(true);
        timer.set_target_elapsed_ticks(100_000); // 10ms

        let mut updates = 0;
        timer.tick_at(start + ms(35), |t| {
            updates += 1;
            assert_eq!(t.elapsed_ticks(), 100_000);
        });
        assert_eq!(updates, 3);

        // 5ms left over plus 4ms is still short of a step.
        timer.tick_at(start + ms(39), |_| updates += 1);
        assert_eq!(updates, 3);

        timer.tick_at(start + ms(41), |_| updates += 1);
        assert_eq!(updates, 4);
        assert_eq!(timer.total_ticks(), 400_000);
    }

    #[test]
    fn target_seconds_truncate_to_whole_ticks() {
        let start = Instant::now();
        let mut timer = StepTimer::new_at(start);
        timer.set_fixed_time_step(true);
        timer.set_target_elapsed_seconds(1.0 / 60.0);

        let mut updates = 0;
        timer.tick_at(start + ms(50), |t| {
            updates += 1;
            assert_eq!(t.elapsed_ticks(), 166_666);
        });
        assert_eq!(updates, 3);
        assert_eq!(timer.total_ticks(), 499_998);
    }

    #[test]
    fn max_delta_is_configurable() {
        let start = Instant::now();
        let mut timer = StepTimer::new_at(start);
        timer.set_max_delta(ms(250));
        timer.tick_at(start + Duration::from_secs(1), |_| {});
        assert_eq!(timer.elapsed_ticks(), 2_500_000);

        timer.tick_at(start + Duration::from_secs(1) + ms(100), |_| {});
        assert_eq!(timer.elapsed_ticks(), 1_000_000);
    }

    #[test]
    fn fixed_step_snaps_near_target() {
        let start = Instant::now();
        let mut timer = StepTimer::new_at(start);
        timer.set_fixed_time_step(true);
        timer.set_target_elapsed_ticks(100_000);

        let mut updates = 0;
        // 9.9ms is within 1/4000s of the 10ms target.
        timer.tick_at(start + Duration::from_micros(9_900), |_| updates += 1);
        assert_eq!(updates, 1);
        assert_eq!(timer.total_ticks(), 100_000);
    }

    #[test]
    fn frames_per_second_updates_each_second() {
        let start = Instant::now();
        let mut timer = StepTimer::new_at(start);
        for frame in 1..=20 {
            timer.tick_at(start + ms(50 * frame), |_| {});
        }
        assert_eq!(timer.frames_per_second(), 20);
        assert_eq!(timer.frame_count(), 20);
    }

    #[test]
    fn reset_discards_accumulated_time() {
        let start = Instant::now();
        let mut timer = StepTimer::new_at(start);
        timer.set_fixed_time_step(true);
        timer.set_target_elapsed_ticks(100_000);
        timer.tick_at(start + ms(5), |_| {});

        timer.reset_elapsed_time_at(start + ms(500));
        let mut updates = 0;
        timer.tick_at(start + ms(506), |_| updates += 1);
        assert_eq!(updates, 0);
    }
}
