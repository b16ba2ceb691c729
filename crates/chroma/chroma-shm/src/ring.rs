//! Ring configuration and index arithmetic.
//!
//! Cursor wraparound always works on the ELEMENT count, never on the byte
//! footprint of the slot array. Capacity is held to a power of two so the
//! wrap is a single mask.

/// Configuration for the slot ring.
#[derive(Debug, Copy, Clone)]
pub struct RingConfig {
    /// Number of slots in the ring. Must be a power of 2.
    pub capacity: usize,
}

impl RingConfig {
    /// Creates a new ring configuration with the specified capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is not a power of 2.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity.is_power_of_two(), "Capacity must be power of 2");
        Self { capacity }
    }

    /// Returns the bitmask for index calculation: `seq & mask == seq % capacity`.
    #[inline(always)]
    pub fn mask(&self) -> u64 {
        (self.capacity as u64) - 1
    }
}

/// Converts a monotonically increasing ticket to a slot index.
#[inline(always)]
pub fn seq_to_index(seq: u64, mask: u64) -> u64 {
    seq & mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_wraps_on_element_count() {
        let cfg = RingConfig::new(128);
        assert_eq!(cfg.mask(), 127);
        assert_eq!(seq_to_index(0, cfg.mask()), 0);
        assert_eq!(seq_to_index(127, cfg.mask()), 127);
        assert_eq!(seq_to_index(128, cfg.mask()), 0);
        assert_eq!(seq_to_index(300, cfg.mask()), 300 % 128);
    }

    #[test]
    #[should_panic(expected = "power of 2")]
    fn rejects_non_power_of_two() {
        RingConfig::new(100);
    }
}
