//! Majority-vote debouncing of per-frame classifications.
//!
//! Individual inferences are noisy: a hand transitioning between poses
//! produces a short run of conflicting winners. The vote window absorbs
//! a fixed number of consecutive classifications and emits one decision
//! per completed batch — the category with the highest tally, ties to
//! the lowest index. Batches do not overlap; the window clears the
//! moment a decision is emitted.
//!
//! The tally spans every category, including the blank class. A window
//! full of blanks legitimately decides "no gesture"; downstream decides
//! what to do with that.

use mudra_core::{Error, MajorityVote, Result};

/// Fixed-capacity, non-overlapping vote window
#[derive(Debug, Clone)]
pub struct VoteWindow {
    capacity: usize,
    category_count: usize,
    votes: Vec<usize>,
}

impl VoteWindow {
    pub fn new(capacity: usize, category_count: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config("vote window capacity must be non-zero".into()));
        }
        if category_count == 0 {
            return Err(Error::Config("category count must be non-zero".into()));
        }
        Ok(Self {
            capacity,
            category_count,
            votes: Vec::with_capacity(capacity),
        })
    }

    /// Append one classification outcome.
    ///
    /// Returns the majority vote when this push fills the window; the
    /// window is already cleared when the outcome is returned. Push and
    /// classification are paired 1:1, so `category` is always in range
    /// for a correctly wired pipeline.
    pub fn push(&mut self, category: usize) -> Option<MajorityVote> {
        debug_assert!(category < self.category_count);
        self.votes.push(category);

        if self.votes.len() < self.capacity {
            return None;
        }

        let outcome = self.tally();
        self.votes.clear();
        Some(outcome)
    }

    /// Count every category across the full range; highest tally wins,
    /// ties resolve to the lowest category index.
    fn tally(&self) -> MajorityVote {
        let mut counts = vec![0usize; self.category_count];
        for &vote in &self.votes {
            if vote < self.category_count {
                counts[vote] += 1;
            }
        }

        let mut best = 0;
        for index in 1..self.category_count {
            if counts[index] > counts[best] {
                best = index;
            }
        }

        MajorityVote {
            index: best,
            votes: counts[best],
            window: self.capacity,
        }
    }

    /// Votes accumulated since the last decision
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn category_count(&self) -> usize {
        self.category_count
    }

    /// Discard any partial batch
    pub fn clear(&mut self) {
        self.votes.clear();
    }
}
