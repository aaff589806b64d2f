use rand::Rng;
use std::fmt;
use std::ops::Add;

/// A 32-bit wire sequence number, relative to some zero point (the ISN)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Wrap32 {
    value: u32,
}

impl Wrap32 {
    const WRAP_SIZE: u64 = 1 << 32;

    pub fn new(value: u32) -> Self {
        Wrap32 { value }
    }

    /// Draw a random initial sequence number from `rng`
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Wrap32::new(rng.gen())
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Wrap an absolute `seq_no` given the `zero_point`
    pub fn wrap(n: u64, zero_point: Wrap32) -> Self {
        zero_point + n
    }

    /// Unwrap to the absolute `seq_no` closest to the `checkpoint`.
    ///
    /// The candidates one wrap below, at, and one wrap above the checkpoint's wrap are compared
    /// by distance to the checkpoint. On a tie the smallest candidate wins.
    pub fn unwrap(&self, zero_point: Wrap32, checkpoint: u64) -> u64 {
        let offset = self.value.wrapping_sub(zero_point.value) as u64;
        let k = checkpoint / Self::WRAP_SIZE;

        let here = k * Self::WRAP_SIZE + offset;
        let below = match k {
            0 => here,
            _ => (k - 1) * Self::WRAP_SIZE + offset,
        };
        let above = (k + 1)
            .checked_mul(Self::WRAP_SIZE)
            .and_then(|base| base.checked_add(offset));

        // Ordered smallest first so `min_by_key` keeps the smallest on a tie
        [Some(below), Some(here), above]
            .into_iter()
            .flatten()
            .min_by_key(|candidate| candidate.abs_diff(checkpoint))
            .unwrap_or(here)
    }
}

impl Add for Wrap32 {
    type Output = Wrap32;

    fn add(self, other: Wrap32) -> Wrap32 {
        Wrap32::new(self.value.wrapping_add(other.value))
    }
}

impl Add<u32> for Wrap32 {
    type Output = Wrap32;

    fn add(self, n: u32) -> Wrap32 {
        Wrap32::new(self.value.wrapping_add(n))
    }
}

impl Add<u64> for Wrap32 {
    type Output = Wrap32;

    fn add(self, n: u64) -> Wrap32 {
        // Truncation is the mod 2^32 reduction
        Wrap32::new(self.value.wrapping_add(n as u32))
    }
}

impl fmt::Display for Wrap32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::Distribution;
    use rand::distributions::Uniform;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rayon::prelude::*;

    const WRAP: u64 = 1 << 32;

    // -- Test wrapping --

    #[test]
    fn test_wrap_syn_slot_is_isn() {
        let isn = Wrap32::new(0xdead_beef);
        assert_eq!(Wrap32::wrap(0, isn), isn);
        assert_eq!(Wrap32::wrap(1, isn), Wrap32::new(0xdead_bef0));
    }

    #[test]
    fn test_wrap_crosses_u32_max() {
        let isn = Wrap32::new(u32::MAX - 2);
        assert_eq!(Wrap32::wrap(2, isn), Wrap32::new(u32::MAX));
        assert_eq!(Wrap32::wrap(5, isn), Wrap32::new(2));
    }

    #[test]
    fn test_wrap_drops_whole_wraps() {
        let isn = Wrap32::new(1000);
        assert_eq!(Wrap32::wrap(5 * WRAP + 24, isn), Wrap32::new(1024));
        assert_eq!(Wrap32::wrap(5 * WRAP - 1000, isn), Wrap32::new(0));
    }

    // -- Test unwrapping --

    #[test]
    fn test_unwrap_isn_is_zero() {
        let isn = Wrap32::new(0xdead_beef);
        assert_eq!(isn.unwrap(isn, 0), 0);
    }

    #[test]
    fn test_unwrap_across_u32_max_near_start() {
        // ISN just below the top of the space; the seqno has already wrapped
        let unwrapped = Wrap32::new(0x10).unwrap(Wrap32::new(0xffff_fff0), 0);
        assert_eq!(unwrapped, 0x20);
    }

    #[test]
    fn test_unwrap_follows_checkpoint_into_later_wraps() {
        let unwrapped = Wrap32::new(107).unwrap(Wrap32::new(7), 4 * WRAP);
        assert_eq!(unwrapped, 4 * WRAP + 100);
    }

    #[test]
    fn test_unwrap_prefers_previous_wrap_when_closer() {
        let unwrapped = Wrap32::new(u32::MAX - 9).unwrap(Wrap32::new(0), 2 * WRAP + 5);
        assert_eq!(unwrapped, 2 * WRAP - 10);
    }

    #[test]
    fn test_unwrap_prefers_next_wrap_when_closer() {
        let unwrapped = Wrap32::new(3).unwrap(Wrap32::new(0), WRAP - 2);
        assert_eq!(unwrapped, WRAP + 3);
    }

    #[test]
    fn test_unwrap_never_goes_below_zero() {
        // One step "behind" the ISN has no candidate below zero, so it lands at the top of wrap 0
        let unwrapped = Wrap32::new(0).unwrap(Wrap32::new(1), 10);
        assert_eq!(unwrapped, WRAP - 1);
    }

    #[test]
    fn test_unwrap_tie_prefers_smaller_candidate() {
        // Offset 0 with checkpoint exactly half a wrap past 2^32: 2^32 and 2^33 are equidistant
        let checkpoint = (1u64 << 32) + (1u64 << 31);
        let unwrapped = Wrap32::new(0).unwrap(Wrap32::new(0), checkpoint);
        assert_eq!(unwrapped, 1u64 << 32);

        // Same tie in the first wrap, where there is no candidate below zero
        let unwrapped = Wrap32::new(0).unwrap(Wrap32::new(0), 1u64 << 31);
        assert_eq!(unwrapped, 0);
    }

    #[test]
    fn test_unwrap_near_u64_max_does_not_overflow() {
        let unwrapped = Wrap32::new(5).unwrap(Wrap32::new(0), u64::MAX);
        assert_eq!(unwrapped, (u64::MAX & !0xffff_ffff) + 5);
    }

    #[test]
    fn test_random_isn_is_deterministic_with_seeded_rng() {
        let mut a = StdRng::seed_from_u64(144);
        let mut b = StdRng::seed_from_u64(144);
        assert_eq!(Wrap32::random(&mut a), Wrap32::random(&mut b));
    }

    // -- Test `+` operator overload --

    #[test]
    fn test_add() {
        let x = Wrap32::new(1);
        let y = Wrap32::new(2);
        let z = Wrap32::new(3);
        assert_eq!(x + y, z);
    }

    #[test]
    fn test_add_overflow() {
        let x = Wrap32::new(u32::MAX);
        let y = Wrap32::new(1);
        let z = Wrap32::new(0);
        assert_eq!(x + y, z);
        assert_eq!(x + 1u32, z);
        assert_eq!(x + ((1u64 << 32) + 1), z);
    }

    // -- Test compare --

    #[test]
    fn test_equality_random() {
        let n_reps = 32768;
        let mut rng = rand::thread_rng();
        for _ in 0..n_reps {
            let n: u32 = rng.gen();
            let diff: u8 = rng.gen();
            let m: u32 = n.wrapping_add(diff as u32);

            let wrap_n = Wrap32::new(n);
            let wrap_m = Wrap32::new(m);

            assert_eq!(wrap_n == wrap_m, n == m);
            assert_eq!(wrap_n != wrap_m, n != m);
        }
    }

    // -- Test roundtrip --

    #[test]
    fn test_roundtrip() {
        fn check_roundtrip(isn: Wrap32, value: u64, checkpoint: u64) {
            assert_eq!(Wrap32::wrap(value, isn).unwrap(isn, checkpoint), value)
        }

        let n_reps = 1_000_000;
        let dist31minus1 = Uniform::from(0u32..=(1u32 << 31) - 1);
        let dist32 = Uniform::from(0u32..=u32::MAX);
        let big_offset: u64 = (1u64 << 31) - 1;
        let dist63 = Uniform::from(big_offset..=(1u64 << 63));

        // Run parallel tests because we don't have all the time in the world
        (0..n_reps).into_par_iter().for_each(|_| {
            let mut rng = rand::thread_rng();
            let isn = Wrap32::new(dist32.sample(&mut rng));
            let val = dist63.sample(&mut rng);
            let offset = dist31minus1.sample(&mut rng) as u64;

            check_roundtrip(isn, val, val);
            check_roundtrip(isn, val + 1, val);
            check_roundtrip(isn, val - 1, val);
            check_roundtrip(isn, val + offset, val);
            check_roundtrip(isn, val - offset, val);
            check_roundtrip(isn, val + big_offset, val);
            check_roundtrip(isn, val - big_offset, val);
        });
    }
}
