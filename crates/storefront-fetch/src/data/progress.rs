use std::sync::Arc;

/// Bytes moved so far against the bytes expected in total.
///
/// `expected` is widened whenever more bytes arrive than were announced, so
/// `written <= expected` holds for every value handed to a callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub written: u64,
    pub expected: u64,
}

impl Progress {
    pub fn new(written: u64, expected: u64) -> Self {
        Self {
            written,
            expected: expected.max(written),
        }
    }

    /// Completion in `0.0..=1.0`, or `None` while the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        (self.expected > 0).then(|| self.written as f64 / self.expected as f64)
    }

    /// Completion rounded down to a whole percentage.
    pub fn percentage(&self) -> u32 {
        self.fraction()
            .map_or(0, |fraction| (fraction * 100.0).floor() as u32)
            .min(100)
    }
}

/// Callback receiving progress updates. Any user context is captured by the
/// closure itself.
pub type ProgressFn = Arc<dyn Fn(&Progress) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widens_expected() {
        assert_eq!(Progress::new(10, 4), Progress { written: 10, expected: 10 });
    }

    #[test]
    fn percentage() {
        assert_eq!(Progress::new(0, 0).percentage(), 0);
        assert_eq!(Progress::new(1, 3).percentage(), 33);
        assert_eq!(Progress::new(1000, 1000).percentage(), 100);
        assert_eq!(Progress::new(0, 0).fraction(), None);
    }
}
