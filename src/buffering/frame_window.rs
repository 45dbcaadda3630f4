//! Bounded window of the most recent feature vectors.

use crate::features::feature_vector::FeatureVector;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Default number of frames in a classification window.
pub const DEFAULT_SEQUENCE_LENGTH: usize = 30;

/// Where a window is in its fill cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowState {
    Empty,
    Collecting { have: usize, need: usize },
    Ready,
}

impl WindowState {
    fn from_counts(have: usize, need: usize) -> Self {
        if have == 0 {
            WindowState::Empty
        } else if have < need {
            WindowState::Collecting { have, need }
        } else {
            WindowState::Ready
        }
    }
}

/// A FIFO ring of feature vectors holding at most `capacity` entries.
///
/// The deque sits behind a single mutex so that one producer can push while consumers take
/// snapshots from other threads. Append-and-evict happens inside one critical section; a
/// snapshot can never see a window that is over capacity or half-updated.
///
/// Every vector is fitted to `feature_width` on the way in, so the window only ever holds
/// vectors of the model's width.
#[derive(Debug)]
pub struct FrameWindow {
    frames: Mutex<VecDeque<FeatureVector>>,
    capacity: usize,
    feature_width: usize,
}

impl FrameWindow {
    pub fn new(capacity: usize, feature_width: usize) -> Self {
        FrameWindow {
            frames: Mutex::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
            feature_width,
        }
    }

    // A panic while holding the lock cannot leave the deque over capacity, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<FeatureVector>> {
        self.frames.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends `vector` and evicts the oldest frames until the window is back at capacity.
    /// Returns the state after the push.
    pub fn push(&self, mut vector: FeatureVector) -> WindowState {
        vector.fit_to_width(self.feature_width);
        let mut frames = self.lock();
        frames.push_back(vector);
        while frames.len() > self.capacity {
            frames.pop_front();
        }
        WindowState::from_counts(frames.len(), self.capacity)
    }

    /// A point-in-time copy of the window, oldest first.
    pub fn snapshot(&self) -> Vec<FeatureVector> {
        self.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state(&self) -> WindowState {
        WindowState::from_counts(self.size(), self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn tagged(tag: f32, width: usize) -> FeatureVector {
        FeatureVector::new(vec![tag; width])
    }

    #[test]
    fn size_tracks_pushes_up_to_capacity() {
        let window = FrameWindow::new(5, 3);
        for pushes in 1..=12 {
            window.push(tagged(pushes as f32, 3));
            assert_eq!(window.size(), pushes.min(5));
        }
    }

    #[test]
    fn snapshot_keeps_most_recent_in_order() {
        let window = FrameWindow::new(4, 1);
        for i in 1..=10 {
            window.push(tagged(i as f32, 1));
        }
        let tags: Vec<f32> = window.snapshot().iter().map(|v| v.as_slice()[0]).collect();
        assert_eq!(tags, vec![7.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn push_fits_vectors_to_feature_width() {
        let window = FrameWindow::new(2, 4);
        window.push(FeatureVector::new(vec![1.0]));
        window.push(FeatureVector::new(vec![1.0; 9]));
        let snap = window.snapshot();
        assert_eq!(snap[0].as_slice(), &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(snap[1].len(), 4);
    }

    #[test]
    fn state_moves_through_fill_cycle() {
        let window = FrameWindow::new(3, 1);
        assert_eq!(window.state(), WindowState::Empty);
        assert_eq!(
            window.push(tagged(1.0, 1)),
            WindowState::Collecting { have: 1, need: 3 }
        );
        window.push(tagged(2.0, 1));
        assert_eq!(window.push(tagged(3.0, 1)), WindowState::Ready);
        assert_eq!(window.push(tagged(4.0, 1)), WindowState::Ready);
        window.clear();
        assert_eq!(window.size(), 0);
        assert_eq!(window.state(), WindowState::Empty);
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let window = FrameWindow::new(3, 2);
        window.push(tagged(1.0, 2));
        let first = window.snapshot();
        let second = window.snapshot();
        assert_eq!(first, second);
        assert_eq!(window.size(), 1);
    }

    #[test]
    fn concurrent_pushes_and_snapshots_never_exceed_capacity() {
        let window = Arc::new(FrameWindow::new(30, 8));
        let producer = {
            let window = Arc::clone(&window);
            thread::spawn(move || {
                for i in 0..2000 {
                    window.push(tagged(i as f32, 8));
                }
            })
        };
        for _ in 0..500 {
            let snap = window.snapshot();
            assert!(snap.len() <= 30);
            // Consecutive tags: a torn snapshot would show a gap or reordering.
            for pair in snap.windows(2) {
                assert_eq!(pair[1].as_slice()[0], pair[0].as_slice()[0] + 1.0);
            }
        }
        producer.join().unwrap();
        assert_eq!(window.size(), 30);
    }
}
