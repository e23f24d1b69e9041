//! Packed legal-action masks.

use std::fmt;

/// Set of action indices packed into a `u64` (bit `i` set = action `i`).
///
/// Action spaces are limited to 64 actions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ActionMask(u64);

impl ActionMask {
    pub const EMPTY: ActionMask = ActionMask(0);

    /// Largest action space a mask can describe.
    pub const CAPACITY: usize = 64;

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Mask with actions `0..n` set.
    #[inline]
    pub fn full(n: usize) -> Self {
        debug_assert!(n <= Self::CAPACITY);
        if n >= Self::CAPACITY {
            Self(u64::MAX)
        } else {
            Self((1u64 << n) - 1)
        }
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn contains(self, action: usize) -> bool {
        action < Self::CAPACITY && (self.0 >> action) & 1 == 1
    }

    #[inline]
    pub fn insert(&mut self, action: usize) {
        debug_assert!(action < Self::CAPACITY);
        self.0 |= 1u64 << action;
    }

    #[inline]
    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set actions in ascending order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let action = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(action)
        })
    }
}

impl FromIterator<usize> for ActionMask {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut mask = ActionMask::EMPTY;
        for action in iter {
            mask.insert(action);
        }
        mask
    }
}

impl fmt::Debug for ActionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_mask() {
        assert_eq!(ActionMask::full(0), ActionMask::EMPTY);
        assert_eq!(ActionMask::full(3).bits(), 0b111);
        assert_eq!(ActionMask::full(18).count(), 18);
        assert_eq!(ActionMask::full(64).bits(), u64::MAX);
    }

    #[test]
    fn test_insert_contains() {
        let mut mask = ActionMask::EMPTY;
        assert!(mask.is_empty());

        mask.insert(0);
        mask.insert(17);
        assert!(mask.contains(0));
        assert!(mask.contains(17));
        assert!(!mask.contains(5));
        assert!(!mask.contains(200));
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn test_iter_is_ascending() {
        let mask: ActionMask = [9, 2, 17, 4].into_iter().collect();
        let actions: Vec<usize> = mask.iter().collect();
        assert_eq!(actions, vec![2, 4, 9, 17]);
    }

    #[test]
    fn test_debug_lists_actions() {
        let mask = ActionMask::from_bits(0b101);
        assert_eq!(format!("{:?}", mask), "{0, 2}");
    }
}
