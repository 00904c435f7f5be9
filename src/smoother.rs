//! Temporal smoothing
//!
//! Per-frame classifications flicker. A `RollingVote` keeps the last few
//! readings and only reports a value once it dominates the window.

use std::collections::VecDeque;

/// Fixed-size window of recent readings with majority voting
#[derive(Debug, Clone)]
pub struct RollingVote<T> {
    /// Recent readings, oldest first; `None` marks a frame without a reading
    buffer: VecDeque<Option<T>>,
    /// Maximum window size
    capacity: usize,
}

impl<T: Clone + PartialEq> RollingVote<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a reading, evicting the oldest when full
    pub fn push(&mut self, value: Option<T>) {
        self.buffer.push_back(value);
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
    }

    /// Majority value of the window.
    ///
    /// Empty readings are ignored. Returns `None` when fewer than `min_samples`
    /// readings remain or the winner's share is below `min_fraction`. Ties go
    /// to the value seen first.
    pub fn stable_value(&self, min_samples: usize, min_fraction: f64) -> Option<T> {
        let mut tally: Vec<(&T, usize)> = Vec::new();
        let mut total = 0usize;

        for value in self.buffer.iter().flatten() {
            total += 1;
            match tally.iter_mut().find(|(seen, _)| *seen == value) {
                Some((_, count)) => *count += 1,
                None => tally.push((value, 1)),
            }
        }

        if total == 0 || total < min_samples {
            return None;
        }

        let (winner, freq) = tally
            .into_iter()
            .fold(None::<(&T, usize)>, |best, (value, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((value, count)),
            })?;

        if freq as f64 / total as f64 >= min_fraction {
            Some(winner.clone())
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
