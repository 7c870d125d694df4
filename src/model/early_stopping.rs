//! Patience-based early stopping on a monitored loss.

/// Stops training once the monitored loss has failed to improve by at least
/// `min_delta` for `patience` consecutive epochs.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f64,
    best: f64,
    wait: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta: min_delta.abs(),
            best: f64::INFINITY,
            wait: 0,
        }
    }

    /// Record one epoch's loss. Returns `true` when training should stop.
    pub fn observe(&mut self, loss: f64) -> bool {
        if loss < self.best - self.min_delta {
            self.best = loss;
            self.wait = 0;
            return false;
        }
        self.wait += 1;
        self.wait >= self.patience
    }

    /// Lowest loss seen so far.
    pub fn best(&self) -> f64 {
        self.best
    }

    /// Consecutive epochs without improvement.
    pub fn wait(&self) -> usize {
        self.wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_going_while_improving() {
        let mut stop = EarlyStopping::new(2, 0.01);
        for loss in [3.0, 2.5, 2.0, 1.5] {
            assert!(!stop.observe(loss));
        }
        assert_eq!(stop.best(), 1.5);
        assert_eq!(stop.wait(), 0);
    }

    #[test]
    fn test_stops_after_patience() {
        let mut stop = EarlyStopping::new(3, 0.0);
        assert!(!stop.observe(1.0));
        assert!(!stop.observe(1.2));
        assert!(!stop.observe(1.1));
        assert!(stop.observe(1.05));
    }

    #[test]
    fn test_improvement_below_min_delta_does_not_count() {
        let mut stop = EarlyStopping::new(2, 0.1);
        assert!(!stop.observe(1.0));
        assert!(!stop.observe(0.95));
        assert!(stop.observe(0.92));
        assert_eq!(stop.best(), 1.0);
    }

    #[test]
    fn test_improvement_resets_wait() {
        let mut stop = EarlyStopping::new(2, 0.0);
        stop.observe(1.0);
        stop.observe(1.1);
        assert_eq!(stop.wait(), 1);
        assert!(!stop.observe(0.5));
        assert_eq!(stop.wait(), 0);
    }
}
