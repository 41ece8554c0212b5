use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[must_use]
pub struct FenceValue {
    v: u64,
}

impl FenceValue {
    pub fn new(v: u64) -> Self {
        Self { v }
    }

    pub fn value(&self) -> u64 {
        self.v
    }

    /// Whether the GPU has passed this value, given the fence's completed value.
    pub fn is_reached_by(&self, completed_value: u64) -> bool {
        completed_value >= self.v
    }
}

/// Source of fence values for a single fence. Every value handed out is
/// strictly greater than the previous one.
#[derive(Debug)]
pub struct FenceCounter {
    last: FenceValue,
}

impl FenceCounter {
    pub fn new(initial_value: u64) -> Self {
        Self {
            last: FenceValue { v: initial_value },
        }
    }

    pub fn next(&mut self) -> FenceValue {
        self.last.v = self
            .last
            .v
            .checked_add(1)
            .expect("fence value overflowed");
        self.last
    }

    pub fn last_signaled(&self) -> FenceValue {
        self.last
    }
}

/// Objects that may only be reused once the GPU has finished with them,
/// e.g. command allocators. Entries are kept in submission order, so only the
/// front needs to be inspected.
pub struct RetiredQueue<T> {
    entries: VecDeque<(T, FenceValue)>,
}

impl<T> RetiredQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn retire(&mut self, item: T, fence_value: FenceValue) {
        debug_assert!(self
            .entries
            .back()
            .map_or(true, |(_, last)| *last <= fence_value));
        self.entries.push_back((item, fence_value));
    }

    pub fn reclaim(&mut self, completed_value: u64) -> Option<T> {
        match self.entries.front() {
            Some((_, fence_value)) if fence_value.is_reached_by(completed_value) => {
                self.entries.pop_front().map(|(item, _)| item)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for RetiredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_values_are_strictly_increasing() {
        let mut counter = FenceCounter::new(0);
        let mut previous = counter.last_signaled();
        for _ in 0..100 {
            let v = counter.next();
            assert!(v > previous);
            previous = v;
        }
        assert_eq!(counter.last_signaled().value(), 100);
    }

    #[test]
    fn counter_starts_after_initial_value() {
        let mut counter = FenceCounter::new(41);
        assert_eq!(counter.next().value(), 42);
    }

    #[test]
    fn completion_is_inclusive() {
        let v = FenceValue::new(5);
        assert!(!v.is_reached_by(4));
        assert!(v.is_reached_by(5));
        assert!(v.is_reached_by(6));
        assert!(FenceValue::default().is_reached_by(0));
    }

    #[test]
    fn retired_items_come_back_only_after_completion() {
        let mut queue = RetiredQueue::new();
        queue.retire("a", FenceValue::new(1));
        queue.retire("b", FenceValue::new(2));

        assert_eq!(queue.reclaim(0), None);
        assert_eq!(queue.reclaim(1), Some("a"));
        assert_eq!(queue.reclaim(1), None);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.reclaim(7), Some("b"));
        assert!(queue.is_empty());
    }
}
