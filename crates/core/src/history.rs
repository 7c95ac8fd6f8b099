use std::collections::VecDeque;

/// Fixed-capacity, oldest-first sliding history.
///
/// Appending at capacity evicts the oldest entry. Capacity is always ≥ 1.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer<T> {
    samples:  VecDeque<T>,
    capacity: usize,
}

impl<T> HistoryBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new sample, evicting and returning the oldest if at capacity.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(value);
        evicted
    }

    /// Overwrite the newest entry in place. Returns `false` if empty.
    pub fn replace_last(&mut self, value: T) -> bool {
        match self.samples.back_mut() {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Change capacity. Shrinking drops the oldest entries; growing never
    /// evicts and the extra room fills as new samples arrive.
    pub fn resize(&mut self, capacity: usize) {
        let capacity = capacity.max(1);
        if self.samples.len() > capacity {
            let excess = self.samples.len() - capacity;
            self.samples.drain(..excess);
        }
        self.samples.shrink_to(capacity);
        self.capacity = capacity;
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&T> {
        self.samples.back()
    }

    /// Oldest-first iterator.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.samples.iter()
    }
}

impl<T: Clone> HistoryBuffer<T> {
    /// Oldest-first copy of the current contents.
    pub fn snapshot(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut h = HistoryBuffer::new(3);
        for v in 1..=3 {
            assert_eq!(h.push(v), None);
        }
        assert_eq!(h.push(4), Some(1));
        assert_eq!(h.snapshot(), vec![2, 3, 4]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut h = HistoryBuffer::new(5);
        for v in 0..1000 {
            h.push(v);
            assert!(h.len() <= 5);
        }
        assert_eq!(h.snapshot(), vec![995, 996, 997, 998, 999]);
    }

    #[test]
    fn shrink_keeps_most_recent() {
        let mut h = HistoryBuffer::new(6);
        for v in 0..6 {
            h.push(v);
        }
        h.resize(2);
        assert_eq!(h.capacity(), 2);
        assert_eq!(h.snapshot(), vec![4, 5]);
    }

    #[test]
    fn grow_does_not_evict() {
        let mut h = HistoryBuffer::new(2);
        h.push(1);
        h.push(2);
        h.resize(4);
        h.push(3);
        assert_eq!(h.snapshot(), vec![1, 2, 3]);
        h.push(4);
        h.push(5);
        assert_eq!(h.snapshot(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn replace_last_overwrites_tail() {
        let mut h = HistoryBuffer::new(3);
        assert!(!h.replace_last(9));
        h.push(1);
        h.push(2);
        assert!(h.replace_last(7));
        assert_eq!(h.snapshot(), vec![1, 7]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut h = HistoryBuffer::new(0);
        assert_eq!(h.capacity(), 1);
        h.push('a');
        h.push('b');
        assert_eq!(h.snapshot(), vec!['b']);
    }
}
