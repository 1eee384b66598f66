use std::collections::VecDeque;

/// Fixed-capacity FIFO of the most recent empirical probabilities.
#[derive(Clone, Debug)]
pub struct ConvergenceWindow {
    cap: usize,
    buf: VecDeque<f64>,
}

impl ConvergenceWindow {
    /// `cap` is clamped to at least 1.
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self { cap, buf: VecDeque::with_capacity(cap) }
    }

    /// Append `value`, evicting the oldest once `cap` values are held.
    #[inline]
    pub fn push(&mut self, value: f64) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(value);
    }

    /// max − min over the held values; 0.0 when empty.
    pub fn spread(&self) -> f64 {
        let mut it = self.buf.iter().copied();
        let Some(first) = it.next() else { return 0.0 };
        let (lo, hi) = it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        hi - lo
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.buf.len() == self.cap
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Held values, oldest first.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.buf.iter().copied()
    }

    /// Most recently pushed value.
    pub fn last(&self) -> Option<f64> {
        self.buf.back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_below_capacity_covers_all_values() {
        let mut w = ConvergenceWindow::new(5);
        for v in [0.4, 0.1, 0.9] {
            w.push(v);
        }
        assert!(!w.is_full());
        assert!((w.spread() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn overflow_keeps_last_cap_values() {
        let mut w = ConvergenceWindow::new(3);
        for v in [10.0, 1.0, 2.0, 3.0, 4.0] {
            w.push(v);
        }
        assert!(w.is_full());
        assert_eq!(w.len(), 3);
        assert_eq!(w.values().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(w.spread(), 2.0);
        assert_eq!(w.last(), Some(4.0));
    }

    #[test]
    fn single_slot_window_never_spreads() {
        let mut w = ConvergenceWindow::new(0);
        assert_eq!(w.capacity(), 1);
        w.push(0.3);
        w.push(0.7);
        assert!(w.is_full());
        assert_eq!(w.spread(), 0.0);
    }
}
