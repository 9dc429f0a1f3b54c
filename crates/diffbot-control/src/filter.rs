/// Running mean over the last `window` samples.
///
/// Samples live in a ring buffer allocated once at construction. The sum is
/// updated incrementally and recomputed from scratch every time the ring wraps
/// so floating-point drift cannot build up. Until the ring is full the mean is
/// taken over the samples seen so far.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    samples: Box<[f64]>,
    next: usize,
    len: usize,
    sum: f64,
}

impl MovingAverage {
    /// A window of zero is treated as one.
    pub fn new(window: usize) -> Self {
        MovingAverage {
            samples: vec![0.0; window.max(1)].into_boxed_slice(),
            next: 0,
            len: 0,
            sum: 0.0,
        }
    }

    pub fn window(&self) -> usize {
        self.samples.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds a sample and returns the new mean.
    pub fn push(&mut self, sample: f64) -> f64 {
        let window = self.samples.len();
        if self.len == window {
            self.sum -= self.samples[self.next];
        } else {
            self.len += 1;
        }
        self.samples[self.next] = sample;
        self.sum += sample;

        self.next += 1;
        if self.next == window {
            self.next = 0;
            self.sum = self.samples[..self.len].iter().sum();
        }
        self.mean()
    }

    pub fn mean(&self) -> f64 {
        if self.len == 0 { 0.0 } else { self.sum / self.len as f64 }
    }

    pub fn reset(&mut self) {
        self.samples.fill(0.0);
        self.next = 0;
        self.len = 0;
        self.sum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn averages_partial_window() {
        let mut avg = MovingAverage::new(4);
        assert_eq!(avg.mean(), 0.0);
        assert!((avg.push(2.0) - 2.0).abs() < EPSILON);
        assert!((avg.push(4.0) - 3.0).abs() < EPSILON);
        assert_eq!(avg.len(), 2);
    }

    #[test]
    fn drops_oldest_sample_once_full() {
        let mut avg = MovingAverage::new(3);
        for s in [1.0, 2.0, 3.0] {
            avg.push(s);
        }
        assert!((avg.mean() - 2.0).abs() < EPSILON);
        assert!((avg.push(10.0) - 5.0).abs() < EPSILON); // 2, 3, 10
        assert!((avg.push(10.0) - 23.0 / 3.0).abs() < EPSILON); // 3, 10, 10
    }

    #[test]
    fn matches_naive_mean_over_many_wraps() {
        let window = 200;
        let mut avg = MovingAverage::new(window);
        let mut history = Vec::new();
        for i in 0..5_000 {
            let sample = ((i * 7919) % 1000) as f64 * 0.013 - 6.0;
            history.push(sample);
            let got = avg.push(sample);
            let tail = &history[history.len().saturating_sub(window)..];
            let expected = tail.iter().sum::<f64>() / tail.len() as f64;
            assert!((got - expected).abs() < 1e-9, "sample {i}: {got} vs {expected}");
        }
    }

    #[test]
    fn constant_input_settles_to_itself() {
        let mut avg = MovingAverage::new(200);
        let mut last = 0.0;
        for _ in 0..450 {
            last = avg.push(7.5);
        }
        assert!((last - 7.5).abs() < EPSILON);
    }

    #[test]
    fn reset_clears_history() {
        let mut avg = MovingAverage::new(5);
        avg.push(3.0);
        avg.reset();
        assert!(avg.is_empty());
        assert!((avg.push(1.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn zero_window_behaves_as_one() {
        let mut avg = MovingAverage::new(0);
        assert_eq!(avg.window(), 1);
        avg.push(4.0);
        assert!((avg.push(-2.0) + 2.0).abs() < EPSILON);
    }
}
