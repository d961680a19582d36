// capture.rs - The group-capture table.
//
// A fixed-size array of (begin, end) byte-offset pairs indexed by group
// number. Group 0 is the overall match. Entries are cleared at the start
// of every top-level match attempt and only become valid once the
// corresponding group has matched. Subroutine calls operate on a cloned
// copy so the caller's visible captures are unaffected by the call.

/// The (begin, end) byte-offset pair for one capture group.
pub type Span = (usize, usize);

/// Capture results for one match attempt, indexed by group number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTable {
    slots: Vec<Option<Span>>,
}

impl CaptureTable {
    /// A table sized to hold group numbers `0..=max_group`.
    pub fn new(max_group: usize) -> Self {
        CaptureTable {
            slots: vec![None; max_group + 1],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, n: usize) -> Option<Span> {
        self.slots.get(n).copied().flatten()
    }

    pub fn set(&mut self, n: usize, begin: usize, end: usize) {
        if let Some(slot) = self.slots.get_mut(n) {
            *slot = Some((begin, end));
        }
    }

    pub fn clear(&mut self, n: usize) {
        if let Some(slot) = self.slots.get_mut(n) {
            *slot = None;
        }
    }

    pub fn clear_all(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<Span>> + '_ {
        self.slots.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_table_has_no_captures() {
        let t = CaptureTable::new(3);
        assert_eq!(t.len(), 4);
        for i in 0..4 {
            assert_eq!(t.get(i), None);
        }
    }

    #[test]
    fn set_and_get_round_trip() {
        let mut t = CaptureTable::new(2);
        t.set(0, 0, 10);
        t.set(2, 3, 5);
        assert_eq!(t.get(0), Some((0, 10)));
        assert_eq!(t.get(1), None);
        assert_eq!(t.get(2), Some((3, 5)));
    }

    #[test]
    fn clear_resets_single_slot() {
        let mut t = CaptureTable::new(1);
        t.set(1, 2, 4);
        t.clear(1);
        assert_eq!(t.get(1), None);
    }

    #[test]
    fn out_of_bounds_access_is_harmless() {
        let mut t = CaptureTable::new(1);
        t.set(5, 0, 1); // ignored, no panic
        assert_eq!(t.get(5), None);
    }

    #[test]
    fn clone_is_independent() {
        let mut t = CaptureTable::new(1);
        t.set(0, 0, 1);
        let snapshot = t.clone();
        t.set(0, 0, 2);
        assert_eq!(snapshot.get(0), Some((0, 1)));
        assert_eq!(t.get(0), Some((0, 2)));
    }
}
