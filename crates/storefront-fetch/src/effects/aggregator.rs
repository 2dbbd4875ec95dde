//! Summing the progress of many concurrent operations into one figure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::data::{Progress, ProgressFn};

/// How the slots of an aggregator are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blend {
    /// Add up bytes across slots: large downloads weigh more.
    #[default]
    Bytes,
    /// Give every slot an equal share of 100 percentage points.
    Portions,
}

#[derive(Debug, Default)]
struct SlotState {
    consumed: AtomicU64,
    total: AtomicU64,
    done: AtomicBool,
}

/// Progress of one child operation, written by the child and sampled by the
/// aggregator. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct ProgressSlot {
    state: Arc<SlotState>,
}

impl ProgressSlot {
    pub fn set(&self, progress: &Progress) {
        self.state
            .total
            .store(progress.expected.max(progress.written), Ordering::Relaxed);
        self.state.consumed.store(progress.written, Ordering::Relaxed);
    }

    /// Mark the operation finished, whatever its result.
    pub fn complete(&self) {
        let total = self.state.total.load(Ordering::Relaxed);
        self.state.consumed.store(total, Ordering::Relaxed);
        self.state.done.store(true, Ordering::Release);
    }

    pub fn is_done(&self) -> bool {
        self.state.done.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> Progress {
        let consumed = self.state.consumed.load(Ordering::Relaxed);
        let total = self.state.total.load(Ordering::Relaxed);
        Progress::new(consumed, total)
    }

    /// Completion in `0.0..=1.0`; a finished slot is complete even if it
    /// never learnt its size.
    pub fn fraction(&self) -> f64 {
        if self.is_done() {
            return 1.0;
        }
        self.snapshot().fraction().unwrap_or(0.0).min(1.0)
    }

    /// A progress callback feeding this slot, for [`crate::TransferRequest::on_progress`].
    pub fn callback(&self) -> ProgressFn {
        let slot = self.clone();
        Arc::new(move |progress: &Progress| slot.set(progress))
    }
}

/// Periodically combines the slots of concurrent operations and reports the
/// combined progress when its whole percentage changes.
///
/// With [`Blend::Portions`] the reported value is in percentage points, i.e.
/// `expected` is always 100.
pub struct ProgressAggregator {
    blend: Blend,
    slots: Vec<ProgressSlot>,
    on_report: Option<ProgressFn>,
    last_percentage: Option<u32>,
}

impl std::fmt::Debug for ProgressAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressAggregator")
            .field("blend", &self.blend)
            .field("slots", &self.slots.len())
            .field("last_percentage", &self.last_percentage)
            .finish()
    }
}

impl ProgressAggregator {
    pub fn new(blend: Blend) -> Self {
        Self {
            blend,
            slots: Vec::new(),
            on_report: None,
            last_percentage: None,
        }
    }

    #[must_use]
    pub fn on_report(mut self, on_report: ProgressFn) -> Self {
        self.on_report = Some(on_report);
        self
    }

    /// A slot fed with byte counts.
    pub fn slot(&mut self) -> ProgressSlot {
        let slot = ProgressSlot::default();
        self.slots.push(slot.clone());
        slot
    }

    /// A slot that only goes from not done to done.
    pub fn completion_slot(&mut self) -> ProgressSlot {
        let slot = self.slot();
        slot.state.total.store(1, Ordering::Relaxed);
        slot
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn aggregate(&self) -> Progress {
        match self.blend {
            Blend::Bytes => {
                let (consumed, total) = self.slots.iter().map(ProgressSlot::snapshot).fold(
                    (0u64, 0u64),
                    |(consumed, total), p| {
                        (consumed.saturating_add(p.written), total.saturating_add(p.expected))
                    },
                );
                Progress::new(consumed, total)
            }
            Blend::Portions => {
                if self.slots.is_empty() {
                    return Progress::new(0, 100);
                }
                let done: f64 = self.slots.iter().map(ProgressSlot::fraction).sum();
                let points = 100.0 * done / self.slots.len() as f64;
                Progress::new((points.floor() as u64).min(100), 100)
            }
        }
    }

    /// Report the current aggregate if its percentage moved since the last
    /// report.
    pub fn sample(&mut self) -> Option<Progress> {
        let progress = self.aggregate();
        let percentage = progress.percentage();
        if self.last_percentage == Some(percentage) {
            return None;
        }
        self.last_percentage = Some(percentage);
        self.emit(&progress);
        Some(progress)
    }

    /// Report the aggregate one last time and stop.
    pub fn finish(self) -> Progress {
        let progress = self.aggregate();
        self.emit(&progress);
        progress
    }

    fn emit(&self, progress: &Progress) {
        if let Some(on_report) = &self.on_report {
            on_report(progress);
        }
    }
}
