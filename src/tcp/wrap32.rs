use std::fmt;
use std::ops::Add;

/// A 32-bit sequence number relative to some zero point, with modulo 2^32 arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Wrap32 {
    value: u32,
}

impl Wrap32 {
    const WRAP_SIZE: u64 = 1 << 32;

    pub fn new(value: u32) -> Self {
        Wrap32 { value }
    }

    /// A random zero point, suitable as an initial sequence number
    pub fn random() -> Self {
        Wrap32::new(rand::random::<u32>())
    }

    /// The raw 32-bit value
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Wrap an absolute `seq_no` given a `zero_point`
    pub fn wrap(n: u64, zero_point: Wrap32) -> Self {
        Wrap32::new((n as u32).wrapping_add(zero_point.value))
    }

    /// Unwrap into the absolute `seq_no` closest to the `checkpoint`.
    ///
    /// Three candidates are considered: the offset placed in the 2^32 window holding
    /// `checkpoint`, and the windows directly below and above it. When two candidates
    /// are equally far from `checkpoint` the lower one wins.
    pub fn unwrap(&self, zero_point: Wrap32, checkpoint: u64) -> u64 {
        let offset = self.value.wrapping_sub(zero_point.value) as u64;
        let base = checkpoint & !(Self::WRAP_SIZE - 1);
        let candidate = base + offset;

        let below = candidate.checked_sub(Self::WRAP_SIZE);
        let above = candidate.checked_add(Self::WRAP_SIZE);

        // Ascending order; `min_by_key` keeps the first of equal minimums
        [below, Some(candidate), above]
            .into_iter()
            .flatten()
            .min_by_key(|n| n.abs_diff(checkpoint))
            .unwrap_or(candidate)
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
    use rand::Rng;
    use rayon::prelude::*;
    use rstest::rstest;

    const WRAP: u64 = 1u64 << 32;

    // -- Test wrapping --

    #[rstest]
    #[case(3 * WRAP, 0, 0)]
    #[case(3 * WRAP + 17, 15, 32)]
    #[case(7 * WRAP - 2, 15, 13)]
    #[case(WRAP, 0, 0)]
    #[case(0, u32::MAX, u32::MAX)]
    #[case(1, u32::MAX, 0)]
    fn test_wrap(#[case] n: u64, #[case] zero_point: u32, #[case] expected: u32) {
        assert_eq!(Wrap32::wrap(n, Wrap32::new(zero_point)), Wrap32::new(expected));
    }

    // -- Test unwrapping --

    #[test]
    fn test_unwrap_first_sequence_after_isn_zero() {
        let unwrapped = Wrap32::new(1).unwrap(Wrap32::new(0), 0);
        assert_eq!(unwrapped, 1u64)
    }

    #[test]
    fn test_unwrap_first_sequence_after_first_wraparound() {
        let unwrapped = Wrap32::new(1).unwrap(Wrap32::new(0), u32::MAX as u64);
        assert_eq!(unwrapped, WRAP + 1)
    }

    #[test]
    fn test_unwrap_zero_just_below_boundary_picks_upper_window() {
        assert_eq!(Wrap32::wrap(WRAP, Wrap32::new(0)), Wrap32::new(0));
        let unwrapped = Wrap32::new(0).unwrap(Wrap32::new(0), u32::MAX as u64);
        assert_eq!(unwrapped, WRAP);
    }

    #[test]
    fn test_unwrap_last_sequence_before_third_wraparound() {
        let unwrapped = Wrap32::new(u32::MAX - 1).unwrap(Wrap32::new(0), 3 * WRAP);
        assert_eq!(unwrapped, 3 * WRAP - 2);
    }

    #[test]
    fn test_unwrap_tenth_before_third_wraparound() {
        let unwrapped = Wrap32::new(u32::MAX - 10).unwrap(Wrap32::new(0), 3 * WRAP);
        assert_eq!(unwrapped, 3 * WRAP - 11);
    }

    #[test]
    fn test_unwrap_with_nonzero_isn() {
        let unwrapped = Wrap32::new(u32::MAX).unwrap(Wrap32::new(10), 3 * WRAP);
        assert_eq!(unwrapped, 3 * WRAP - 11);
    }

    #[test]
    fn test_unwrap_max_wrapped_value_with_zero_isn() {
        let unwrapped = Wrap32::new(u32::MAX).unwrap(Wrap32::new(0), 0);
        assert_eq!(unwrapped, u32::MAX as u64);
    }

    #[test]
    fn test_unwrap_value_equals_isn_returns_zero() {
        let unwrapped = Wrap32::new(16).unwrap(Wrap32::new(16), 0);
        assert_eq!(unwrapped, 0u64);
    }

    #[test]
    fn test_unwrap_max_value_with_nonzero_isn() {
        let unwrapped = Wrap32::new(15).unwrap(Wrap32::new(16), 0);
        assert_eq!(unwrapped, u32::MAX as u64);
    }

    #[test]
    fn test_unwrap_zero_value_with_large_isn() {
        let unwrapped = Wrap32::new(0).unwrap(Wrap32::new(i32::MAX as u32), 0);
        assert_eq!(unwrapped, (i32::MAX as u64) + 2);
    }

    #[test]
    fn test_unwrap_max_value_with_max_isn_returns_half_wrap() {
        let unwrapped = Wrap32::new(u32::MAX).unwrap(Wrap32::new(i32::MAX as u32), 0);
        assert_eq!(unwrapped, 1u64 << 31);
    }

    #[test]
    fn test_unwrap_max_value_with_half_wrap_isn() {
        let unwrapped = Wrap32::new(u32::MAX).unwrap(Wrap32::new(1 << 31), 0);
        assert_eq!(unwrapped, (u32::MAX as u64) >> 1);
    }

    #[test]
    fn test_unwrap_tie_prefers_lower_window() {
        // 0 and 2^32 are both exactly 2^31 away from the checkpoint
        let unwrapped = Wrap32::new(0).unwrap(Wrap32::new(0), 1u64 << 31);
        assert_eq!(unwrapped, 0);
    }

    #[test]
    fn test_unwrap_stays_within_half_window_of_checkpoint() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let isn = Wrap32::new(rng.gen());
            let checkpoint: u64 = rng.gen_range(WRAP..(1u64 << 48));
            let unwrapped = Wrap32::new(rng.gen()).unwrap(isn, checkpoint);
            assert!(unwrapped.abs_diff(checkpoint) <= 1u64 << 31);
        }
    }

    // -- Test `+` operator overload --

    #[test]
    fn test_add() {
        assert_eq!(Wrap32::new(1) + Wrap32::new(2), Wrap32::new(3));
        assert_eq!(Wrap32::new(1) + 2, Wrap32::new(3));
    }

    #[test]
    fn test_add_overflow() {
        assert_eq!(Wrap32::new(u32::MAX) + Wrap32::new(1), Wrap32::new(0));
        assert_eq!(Wrap32::new(u32::MAX) + 2, Wrap32::new(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Wrap32::new(42).to_string(), "42");
    }

    // -- Test roundtrip --

    #[test]
    fn test_roundtrip_at_checkpoint() {
        for isn in [0u32, 1, 1 << 31, u32::MAX] {
            for n in [0u64, 1, u32::MAX as u64, WRAP, 5 * WRAP + 7, u64::MAX >> 1] {
                let isn = Wrap32::new(isn);
                assert_eq!(Wrap32::wrap(n, isn).unwrap(isn, n), n);
            }
        }
    }

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
