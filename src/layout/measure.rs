//! Measured block heights and the recalculation debounce

use crate::document::BlockId;
use log::{trace, warn};
use rustc_hash::FxHashMap;

/// Last-known rendered height per block
#[derive(Debug, Clone, Default)]
pub struct HeightCache {
    heights: FxHashMap<BlockId, f32>,
}

impl HeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: BlockId) -> Option<f32> {
        self.heights.get(&id).copied()
    }

    /// Store a measurement. Returns true if the cached value changed.
    pub fn record(&mut self, id: BlockId, height: f32) -> bool {
        let height = if height.is_finite() && height >= 0.0 {
            height
        } else {
            warn!("block {} reported height {}, clamping to 0", id, height);
            0.0
        };

        match self.heights.insert(id, height) {
            Some(old) if old == height => false,
            old => {
                trace!("block {} height {:?} -> {}", id, old, height);
                true
            }
        }
    }

    pub fn remove(&mut self, id: BlockId) -> bool {
        self.heights.remove(&id).is_some()
    }

    /// Drop entries for blocks `keep` rejects
    pub fn retain(&mut self, mut keep: impl FnMut(BlockId) -> bool) {
        self.heights.retain(|id, _| keep(*id));
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn clear(&mut self) {
        self.heights.clear();
    }
}

/// Quiet-window tracking for recalculation.
///
/// Time comes from the caller in milliseconds. A recalculation is due once the
/// layout is dirty and no measurement has arrived for `window_ms`, or once
/// `max_wait_ms` has passed since the first measurement of the burst.
/// Structural edits mark the layout dirty without opening a window, so they
/// are picked up by the next tick.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: f64,
    max_wait_ms: f64,
    first_report: Option<f64>,
    last_report: Option<f64>,
    dirty: bool,
}

impl Debouncer {
    pub fn new(window_ms: u64, max_wait_ms: u64) -> Self {
        Self {
            window_ms: window_ms as f64,
            max_wait_ms: max_wait_ms.max(window_ms) as f64,
            first_report: None,
            last_report: None,
            dirty: false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// A measurement landed at `now_ms`
    pub fn note_report(&mut self, now_ms: f64) {
        self.dirty = true;
        self.first_report.get_or_insert(now_ms);
        self.last_report = Some(now_ms);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether a recalculation should run at `now_ms`
    pub fn is_due(&self, now_ms: f64) -> bool {
        if !self.dirty {
            return false;
        }
        match (self.first_report, self.last_report) {
            (Some(first), Some(last)) => {
                now_ms - last >= self.window_ms || now_ms - first >= self.max_wait_ms
            }
            _ => true,
        }
    }

    /// Reset after a recalculation
    pub fn settle(&mut self) {
        self.dirty = false;
        self.first_report = None;
        self.last_report = None;
    }
}
