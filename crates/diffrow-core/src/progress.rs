//! Coalesced progress ticks over a known amount of work

/// Reports progress as a ratio in `0.0..=1.0`, at most one tick per
/// advance and never more often than `step` apart. The first advance
/// always ticks, completion always ticks exactly 1.0, and the reported
/// ratios are strictly increasing.
#[derive(Debug)]
pub struct ProgressReporter {
    total: u64,
    processed: u64,
    next_tick: f64,
    step: f64,
    finished: bool,
}

impl ProgressReporter {
    pub fn new(total: u64, step: f64) -> Self {
        // a non-positive or NaN step could never advance the threshold
        let step = if step.is_finite() && step > 0.0 { step } else { 0.01 };
        Self {
            total,
            processed: 0,
            next_tick: 0.0,
            step,
            finished: false,
        }
    }

    /// Record `n` more units of work. Returns the ratio to report, or
    /// None when the tick is coalesced away. A zero-total reporter never
    /// ticks, and advancing past completion is ignored.
    pub fn advance(&mut self, n: u64) -> Option<f64> {
        if self.total == 0 || self.finished {
            return None;
        }
        self.processed += n;
        if self.processed >= self.total {
            self.finished = true;
            return Some(1.0);
        }
        let ratio = self.processed as f64 / self.total as f64;
        if ratio < self.next_tick {
            return None;
        }
        while ratio >= self.next_tick {
            self.next_tick += self.step;
        }
        Some(ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_steps() {
        let mut p = ProgressReporter::new(4, 0.25);
        assert_eq!(p.advance(1), Some(0.25));
        assert_eq!(p.advance(1), Some(0.5));
        assert_eq!(p.advance(1), Some(0.75));
        assert_eq!(p.advance(1), Some(1.0));
    }

    #[test]
    fn test_coalesces_small_advances() {
        let mut p = ProgressReporter::new(100, 0.5);
        assert_eq!(p.advance(10), Some(0.1));
        assert_eq!(p.advance(10), None);
        assert_eq!(p.advance(40), Some(0.6));
        assert_eq!(p.advance(39), None);
        assert_eq!(p.advance(1), Some(1.0));
    }

    #[test]
    fn test_ticks_strictly_increase_and_end_at_one() {
        let mut p = ProgressReporter::new(997, 0.01);
        let mut last = -1.0;
        let mut final_tick = 0.0;
        for _ in 0..997 {
            if let Some(ratio) = p.advance(1) {
                assert!(ratio > last);
                last = ratio;
                final_tick = ratio;
            }
        }
        assert_eq!(final_tick, 1.0);
    }

    #[test]
    fn test_non_positive_step_falls_back() {
        // a zero step must not spin the threshold loop
        let mut p = ProgressReporter::new(4, 0.0);
        assert_eq!(p.advance(1), Some(0.25));
        assert_eq!(p.advance(3), Some(1.0));

        let mut p = ProgressReporter::new(4, -1.0);
        assert_eq!(p.advance(1), Some(0.25));

        let mut p = ProgressReporter::new(4, f64::NAN);
        assert_eq!(p.advance(1), Some(0.25));
    }

    #[test]
    fn test_zero_total_never_ticks() {
        let mut p = ProgressReporter::new(0, 0.01);
        assert_eq!(p.advance(1), None);
    }

    #[test]
    fn test_advance_past_completion_is_ignored() {
        let mut p = ProgressReporter::new(2, 0.01);
        assert_eq!(p.advance(2), Some(1.0));
        assert_eq!(p.advance(1), None);
    }
}
