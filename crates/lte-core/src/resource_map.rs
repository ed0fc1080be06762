use crate::Rnti;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceMapErr {
    OutOfRange {
        index: usize,
        len: usize,
    },
    InUse {
        index: usize,
        owner: Rnti,
    },
    NotReserved {
        index: usize,
    },
}

/// Occupancy of the resource units (RBGs in DL, RBs in UL) of one TTI.
/// Each unit is either free or owned by exactly one RNTI.
#[derive(Debug, Clone)]
pub struct ResourceMap {
    owners: Vec<Option<Rnti>>,
}

impl ResourceMap {
    pub fn new(num_units: usize) -> Self {
        Self {
            owners: vec![None; num_units],
        }
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    fn check(&self, index: usize) -> Result<(), ResourceMapErr> {
        if index < self.owners.len() {
            Ok(())
        } else {
            Err(ResourceMapErr::OutOfRange { index, len: self.owners.len() })
        }
    }

    /// Out-of-range units are never free
    pub fn is_free(&self, index: usize) -> bool {
        matches!(self.owners.get(index), Some(None))
    }

    pub fn is_free_range(&self, start: usize, len: usize) -> bool {
        len > 0 && start + len <= self.owners.len() && (start..start + len).all(|i| self.owners[i].is_none())
    }

    pub fn owner(&self, index: usize) -> Option<Rnti> {
        self.owners.get(index).copied().flatten()
    }

    pub fn owners(&self) -> &[Option<Rnti>] {
        &self.owners
    }

    pub fn free_count(&self) -> usize {
        self.owners.iter().filter(|o| o.is_none()).count()
    }

    pub fn reserve(&mut self, index: usize, rnti: Rnti) -> Result<(), ResourceMapErr> {
        self.check(index)?;
        match self.owners[index] {
            None => {
                self.owners[index] = Some(rnti);
                Ok(())
            }
            Some(existing) => Err(ResourceMapErr::InUse { index, owner: existing }),
        }
    }

    /// Reserves all units of a range, or none of them
    pub fn reserve_range(&mut self, start: usize, len: usize, rnti: Rnti) -> Result<(), ResourceMapErr> {
        for i in start..start + len {
            self.check(i)?;
            if let Some(owner) = self.owners[i] {
                return Err(ResourceMapErr::InUse { index: i, owner });
            }
        }
        for i in start..start + len {
            self.owners[i] = Some(rnti);
        }
        Ok(())
    }

    /// Reserves a set of possibly scattered units, or none of them
    pub fn reserve_units(&mut self, units: &[usize], rnti: Rnti) -> Result<(), ResourceMapErr> {
        for &i in units {
            self.check(i)?;
            if let Some(owner) = self.owners[i] {
                return Err(ResourceMapErr::InUse { index: i, owner });
            }
        }
        for &i in units {
            self.owners[i] = Some(rnti);
        }
        Ok(())
    }

    pub fn release(&mut self, index: usize) -> Result<(), ResourceMapErr> {
        self.check(index)?;
        match self.owners[index].take() {
            Some(_) => Ok(()),
            None => Err(ResourceMapErr::NotReserved { index }),
        }
    }

    pub fn release_range(&mut self, start: usize, len: usize) -> Result<(), ResourceMapErr> {
        for i in start..start + len {
            self.release(i)?;
        }
        Ok(())
    }

    /// Returns the start of the first free contiguous run of `len` units
    pub fn find_free_run(&self, len: usize) -> Option<usize> {
        if len == 0 || len > self.owners.len() {
            return None;
        }
        let mut run_start = 0;
        let mut run_len = 0;
        for (i, owner) in self.owners.iter().enumerate() {
            if owner.is_none() {
                if run_len == 0 {
                    run_start = i;
                }
                run_len += 1;
                if run_len == len {
                    return Some(run_start);
                }
            } else {
                run_len = 0;
            }
        }
        None
    }

    /// Returns (start, len) of the longest free contiguous run, the first one on ties
    pub fn largest_free_run(&self) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        let mut run_start = 0;
        let mut run_len = 0;
        for (i, owner) in self.owners.iter().enumerate() {
            if owner.is_none() {
                if run_len == 0 {
                    run_start = i;
                }
                run_len += 1;
                if best.is_none_or(|(_, l)| run_len > l) {
                    best = Some((run_start, run_len));
                }
            } else {
                run_len = 0;
            }
        }
        best
    }

    /// Collects `count` free units scanning forward from `start`, wrapping around once.
    /// The units need not be contiguous. Returns them in ascending order.
    pub fn find_free_units_from(&self, start: usize, count: usize) -> Option<Vec<usize>> {
        let n = self.owners.len();
        if count == 0 || n == 0 {
            return None;
        }
        let mut found = Vec::with_capacity(count);
        for k in 0..n {
            let i = (start + k) % n;
            if self.owners[i].is_none() {
                found.push(i);
                if found.len() == count {
                    found.sort_unstable();
                    return Some(found);
                }
            }
        }
        None
    }

    /// Debug dump of the occupancy, one character per unit
    pub fn dump(&self) -> String {
        self.owners
            .iter()
            .map(|o| match o {
                None => '.',
                Some(rnti) => char::from_digit((*rnti % 36) as u32, 36).unwrap_or('#'),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_and_release() {
        let mut map = ResourceMap::new(6);
        assert_eq!(map.reserve(2, 1), Ok(()));
        assert_eq!(map.reserve(2, 3), Err(ResourceMapErr::InUse { index: 2, owner: 1 }));
        assert_eq!(map.reserve(6, 1), Err(ResourceMapErr::OutOfRange { index: 6, len: 6 }));
        assert_eq!(map.free_count(), 5);
        assert_eq!(map.release(2), Ok(()));
        assert_eq!(map.release(2), Err(ResourceMapErr::NotReserved { index: 2 }));
    }

    #[test]
    fn test_reserve_range_is_all_or_nothing() {
        let mut map = ResourceMap::new(8);
        map.reserve(4, 9).unwrap();
        assert!(map.reserve_range(2, 4, 1).is_err());
        assert_eq!(map.free_count(), 7);
        assert!(map.reserve_range(0, 4, 1).is_ok());
        assert_eq!(map.owner(3), Some(1));
        assert!(!map.is_free_range(3, 2));
        assert!(map.is_free_range(5, 3));
        assert!(!map.is_free_range(5, 4));
    }

    #[test]
    fn test_find_runs() {
        let mut map = ResourceMap::new(10);
        map.reserve_range(0, 2, 1).unwrap();
        map.reserve(5, 2).unwrap();
        assert_eq!(map.find_free_run(3), Some(2));
        assert_eq!(map.find_free_run(4), Some(6));
        assert_eq!(map.find_free_run(5), None);
        assert_eq!(map.largest_free_run(), Some((6, 4)));
    }

    #[test]
    fn test_find_free_units_wraps() {
        let mut map = ResourceMap::new(6);
        map.reserve_range(1, 3, 1).unwrap();
        assert_eq!(map.find_free_units_from(5, 2), Some(vec![0, 5]));
        assert_eq!(map.find_free_units_from(4, 3), Some(vec![0, 4, 5]));
        assert_eq!(map.find_free_units_from(0, 4), None);
        assert!(map.reserve_units(&[0, 2], 2).is_err());
        assert_eq!(map.owner(0), None);
        assert!(map.reserve_units(&[0, 5], 2).is_ok());
        assert_eq!(map.free_count(), 1);
        tracing::info!("map: {}", map.dump());
    }
}
