//! # Position mapping
//!
//! Translates positions in a document before an edit into positions in the
//! document after it.
//!
//! A [`StepMap`] describes one step as a list of replaced ranges
//! `(start, old_size, new_size)` in the coordinates of the document the step
//! applied to. A [`Mapping`] chains the maps of every step of a transaction.

/// Which side a position sticks to when content is inserted exactly at it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    /// Stay before inserted content
    Before,
    /// Move past inserted content
    #[default]
    After,
}

/// One replaced range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRange {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

/// Ranges changed by a single step, ordered by start
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepMap {
    ranges: Vec<MapRange>,
}

impl StepMap {
    pub fn new(ranges: Vec<MapRange>) -> Self {
        Self { ranges }
    }

    /// A map that leaves every position where it is
    pub fn empty() -> Self {
        Self::default()
    }

    /// Map covering a single replaced range
    pub fn replace(start: usize, old_size: usize, new_size: usize) -> Self {
        if old_size == 0 && new_size == 0 {
            return Self::empty();
        }
        Self::new(vec![MapRange {
            start,
            old_size,
            new_size,
        }])
    }

    pub fn ranges(&self) -> &[MapRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Map `pos` through this step.
    ///
    /// Positions inside a replaced range land on its start or end, depending
    /// on `assoc`. Positions on the edges of a deletion stay on their side.
    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        let mut diff: isize = 0;
        for range in &self.ranges {
            if range.start > pos {
                break;
            }
            let end = range.start + range.old_size;
            if pos <= end {
                let side = if range.old_size == 0 {
                    assoc
                } else if pos == range.start {
                    Assoc::Before
                } else if pos == end {
                    Assoc::After
                } else {
                    assoc
                };
                let base = range.start.saturating_add_signed(diff);
                return match side {
                    Assoc::Before => base,
                    Assoc::After => base + range.new_size,
                };
            }
            diff += range.new_size as isize - range.old_size as isize;
        }
        pos.saturating_add_signed(diff)
    }
}

/// Ordered maps of every step in a transaction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_map(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn is_empty(&self) -> bool {
        self.maps.iter().all(StepMap::is_empty)
    }

    /// Map `pos` through every step in order
    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.maps.iter().fold(pos, |pos, map| map.map(pos, assoc))
    }
}

impl From<StepMap> for Mapping {
    fn from(map: StepMap) -> Self {
        Self { maps: vec![map] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_shifts_later_positions() {
        let map = StepMap::replace(5, 0, 3);
        assert_eq!(map.map(2, Assoc::After), 2);
        assert_eq!(map.map(8, Assoc::After), 11);
    }

    #[test]
    fn test_insertion_point_follows_assoc() {
        let map = StepMap::replace(5, 0, 3);
        assert_eq!(map.map(5, Assoc::Before), 5);
        assert_eq!(map.map(5, Assoc::After), 8);
    }

    #[test]
    fn test_deletion_collapses_inner_positions() {
        let map = StepMap::replace(3, 4, 0);
        assert_eq!(map.map(3, Assoc::After), 3);
        assert_eq!(map.map(5, Assoc::Before), 3);
        assert_eq!(map.map(5, Assoc::After), 3);
        assert_eq!(map.map(7, Assoc::Before), 3);
        assert_eq!(map.map(10, Assoc::After), 6);
    }

    #[test]
    fn test_replacement_edges() {
        let map = StepMap::replace(0, 5, 7);
        assert_eq!(map.map(0, Assoc::After), 0);
        assert_eq!(map.map(5, Assoc::Before), 7);
        assert_eq!(map.map(3, Assoc::Before), 0);
        assert_eq!(map.map(3, Assoc::After), 7);
        assert_eq!(map.map(11, Assoc::After), 13);
    }

    #[test]
    fn test_mapping_chains_steps() {
        let mut mapping = Mapping::new();
        mapping.append_map(StepMap::replace(0, 0, 2));
        mapping.append_map(StepMap::replace(4, 2, 0));

        // 3 -> 5 -> 4 (inside the deleted range, collapsed to its start)
        assert_eq!(mapping.map(3, Assoc::After), 4);
        assert_eq!(mapping.map(10, Assoc::After), 10);
        assert!(!mapping.is_empty());
        assert!(Mapping::from(StepMap::empty()).is_empty());
    }
}
