use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Tag attached to in-flight synthesis and audio work.
pub type Generation = u64;

/// Monotonic generation counter.
///
/// Clones share the same counter, so the audio thread can drop work that was
/// invalidated on the scheduler side before reporting it back.
#[derive(Clone, Debug, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate everything tagged so far and return the new tag.
    pub fn advance(&self) -> Generation {
        self.current.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn current(&self) -> Generation {
        self.current.load(Ordering::Acquire)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}
