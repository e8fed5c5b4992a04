use std::collections::VecDeque;

use crate::config::MotionConfig;
use crate::types::MotionType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueEntry {
    pub timestamp: i64,
    pub motion_type: MotionType,
}

/// Time-windowed run of classified samples with cached per-type counts.
///
/// Backed by a ring buffer, so `clear` keeps the allocation and the hot
/// per-sample path does not allocate once the buffer has grown to the
/// window size.
pub struct SamplesQueue {
    entries: VecDeque<QueueEntry>,
    accelerating_count: usize,
    face_down_count: usize,
    face_up_count: usize,

    min_length: usize,
    min_time_window_ns: i64,
}

impl SamplesQueue {
    pub fn new(config: &MotionConfig) -> Self {
        SamplesQueue {
            // ~50 Hz over the window, with headroom
            entries: VecDeque::with_capacity(64),
            accelerating_count: 0,
            face_down_count: 0,
            face_up_count: 0,
            min_length: config.min_queue_length,
            min_time_window_ns: config.min_time_window_ns,
        }
    }

    /// Append a classified sample and evaluate the window.
    /// Returns the confirmed type, or `Other` when nothing is confirmed.
    pub fn push(&mut self, timestamp: i64, motion_type: MotionType) -> MotionType {
        self.entries.push_back(QueueEntry {
            timestamp,
            motion_type,
        });
        if let Some(counter) = self.counter_mut(motion_type) {
            *counter += 1;
        }
        self.confirmed_type()
    }

    /// Drop entries older than `older_than` from the head, keeping at least
    /// `min_length` entries.
    pub fn purge(&mut self, older_than: i64) {
        while self.entries.len() > self.min_length {
            match self.entries.front() {
                Some(oldest) if oldest.timestamp < older_than => {}
                _ => break,
            }
            if let Some(removed) = self.entries.pop_front() {
                if let Some(counter) = self.counter_mut(removed.motion_type) {
                    *counter -= 1;
                }
            }
        }
    }

    /// The type held by at least 75% of the window, once the window spans
    /// more than the minimum time.
    pub fn confirmed_type(&self) -> MotionType {
        let (Some(oldest), Some(newest)) = (self.entries.front(), self.entries.back()) else {
            return MotionType::Other;
        };
        if newest.timestamp - oldest.timestamp <= self.min_time_window_ns {
            return MotionType::Other;
        }

        let count = self.entries.len();
        let threshold = (count >> 1) + (count >> 2);
        if self.face_down_count >= threshold {
            MotionType::FaceDown
        } else if self.face_up_count >= threshold {
            MotionType::FaceUp
        } else if self.accelerating_count >= threshold {
            MotionType::Accelerating
        } else {
            MotionType::Other
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.accelerating_count = 0;
        self.face_down_count = 0;
        self.face_up_count = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_of(&self, motion_type: MotionType) -> usize {
        match motion_type {
            MotionType::Accelerating => self.accelerating_count,
            MotionType::FaceDown => self.face_down_count,
            MotionType::FaceUp => self.face_up_count,
            MotionType::Other => {
                self.entries.len()
                    - self.accelerating_count
                    - self.face_down_count
                    - self.face_up_count
            }
        }
    }

    pub fn oldest(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    pub fn newest(&self) -> Option<&QueueEntry> {
        self.entries.back()
    }

    fn counter_mut(&mut self, motion_type: MotionType) -> Option<&mut usize> {
        match motion_type {
            MotionType::Accelerating => Some(&mut self.accelerating_count),
            MotionType::FaceDown => Some(&mut self.face_down_count),
            MotionType::FaceUp => Some(&mut self.face_up_count),
            MotionType::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: i64 = 1_000_000;

    fn queue() -> SamplesQueue {
        SamplesQueue::new(&MotionConfig::default())
    }

    fn assert_counts_consistent(q: &SamplesQueue) {
        let total: usize = [
            MotionType::FaceDown,
            MotionType::FaceUp,
            MotionType::Accelerating,
            MotionType::Other,
        ]
        .iter()
        .map(|t| q.count_of(*t))
        .sum();
        assert_eq!(total, q.len());
        for t in [MotionType::FaceDown, MotionType::FaceUp, MotionType::Accelerating] {
            let actual = q.entries.iter().filter(|e| e.motion_type == t).count();
            assert_eq!(q.count_of(t), actual);
        }
    }

    /// `count` entries spanning 0..=600 ms, the first `matching` of type `motion_type`,
    /// the rest `Other`. Returns the evaluation of the final push.
    fn fill(q: &mut SamplesQueue, count: usize, matching: usize, motion_type: MotionType) -> MotionType {
        let mut result = MotionType::Other;
        for i in 0..count {
            let t = if i + 1 == count { 600 * MS } else { i as i64 * MS };
            let kind = if i < matching { motion_type } else { MotionType::Other };
            result = q.push(t, kind);
        }
        result
    }

    #[test]
    fn test_window_must_exceed_min_time() {
        let mut q = queue();
        for i in 0..=10 {
            assert_eq!(q.push(i * 50 * MS, MotionType::FaceUp), MotionType::Other);
        }
        // Span is exactly 500 ms
        assert_eq!(q.newest().unwrap().timestamp - q.oldest().unwrap().timestamp, 500 * MS);
        assert_eq!(q.confirmed_type(), MotionType::Other);
        assert_eq!(q.push(550 * MS, MotionType::FaceUp), MotionType::FaceUp);
    }

    #[test]
    fn test_threshold_boundaries() {
        // count -> (count >> 1) + (count >> 2)
        for (count, threshold) in [(4, 3), (5, 3), (6, 4), (7, 4), (8, 6)] {
            let mut q = queue();
            assert_eq!(
                fill(&mut q, count, threshold, MotionType::FaceDown),
                MotionType::FaceDown,
                "count {count} with {threshold} matching"
            );
            assert_counts_consistent(&q);

            let mut q = queue();
            assert_eq!(
                fill(&mut q, count, threshold - 1, MotionType::FaceDown),
                MotionType::Other,
                "count {count} with {} matching",
                threshold - 1
            );
        }
    }

    #[test]
    fn test_three_of_four_confirms() {
        let mut q = queue();
        assert_eq!(fill(&mut q, 4, 3, MotionType::Accelerating), MotionType::Accelerating);
    }

    #[test]
    fn test_face_down_checked_before_face_up() {
        // Two types only reach the threshold together in a two-entry window
        // (threshold 1), which needs a floor below the default.
        let config = MotionConfig {
            min_queue_length: 1,
            ..MotionConfig::default()
        };
        let mut q = SamplesQueue::new(&config);
        q.push(0, MotionType::FaceUp);
        assert_eq!(q.push(600 * MS, MotionType::FaceDown), MotionType::FaceDown);

        let mut q = SamplesQueue::new(&config);
        q.push(0, MotionType::Accelerating);
        assert_eq!(q.push(600 * MS, MotionType::FaceUp), MotionType::FaceUp);
    }

    #[test]
    fn test_purge_respects_floor() {
        let mut q = queue();
        for i in 0..10 {
            q.push(i * MS, MotionType::FaceUp);
        }
        q.purge(i64::MAX);
        assert_eq!(q.len(), 4);
        assert_eq!(q.count_of(MotionType::FaceUp), 4);
        assert_eq!(q.oldest().unwrap().timestamp, 6 * MS);
    }

    #[test]
    fn test_purge_only_removes_old_entries() {
        let mut q = queue();
        for i in 0..10 {
            let kind = if i % 2 == 0 { MotionType::Accelerating } else { MotionType::Other };
            q.push(i * 100 * MS, kind);
        }
        q.purge(450 * MS);
        assert_eq!(q.len(), 5);
        assert_eq!(q.oldest().unwrap().timestamp, 500 * MS);
        assert_counts_consistent(&q);
    }

    #[test]
    fn test_floor_holds_for_mixed_sequence() {
        let mut q = queue();
        let kinds = [
            MotionType::FaceUp,
            MotionType::Other,
            MotionType::Accelerating,
            MotionType::FaceDown,
        ];
        for i in 0..200i64 {
            q.push(i * 7 * MS, kinds[(i as usize * 3) % 4]);
            q.purge(i * 7 * MS - 30 * MS);
            if i >= 3 {
                assert!(q.len() >= 4);
            }
            assert_counts_consistent(&q);
        }
    }

    #[test]
    fn test_clear_resets_counts() {
        let mut q = queue();
        fill(&mut q, 8, 8, MotionType::FaceUp);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.count_of(MotionType::FaceUp), 0);
        assert_eq!(q.confirmed_type(), MotionType::Other);
    }
}
