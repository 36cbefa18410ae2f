/// Deterministic RNG. Every stochastic stage draws from an explicit `Rng`
/// value derived from the run seed; nothing reads ambient entropy.

#[inline]
pub fn splitmix32(mut x: u32) -> u32 {
    x = x.wrapping_add(0x9E3779B9);
    let mut z = x;
    z = (z ^ (z >> 16)).wrapping_mul(0x7FEB352D);
    z = (z ^ (z >> 15)).wrapping_mul(0x846CA68B);
    z ^ (z >> 16)
}

/// Derive an independent sub-stream seed for one pipeline stage.
#[inline]
pub fn seed_u32(seed: u32, salt: u32) -> u32 {
    splitmix32(seed ^ salt)
}

/// Mulberry32: a single 32-bit word of state, scrambled on every draw.
#[derive(Clone, Debug)]
pub struct Rng {
    state: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Reset the stream. No state from the previous seed survives.
    pub fn reseed(&mut self, seed: u32) {
        self.state = seed;
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B79F5);
        let s = self.state;
        let mut t = (s ^ (s >> 15)).wrapping_mul(1 | s);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
        t ^ (t >> 14)
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4294967296.0
    }

    /// Uniform in [0, 1). Derived from `next_f64` so both views share one stream.
    pub fn next_f32(&mut self) -> f32 {
        // Rounding 0.999999999 to f32 would yield 1.0.
        (self.next_f64() as f32).min(1.0 - f32::EPSILON)
    }

    /// Uniform index in `0..=max_inclusive`.
    pub fn index(&mut self, max_inclusive: usize) -> usize {
        ((self.next_f64() * (max_inclusive + 1) as f64) as usize).min(max_inclusive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Rng::new(12345);
        let mut b = Rng::new(12345);
        for _ in 0..1000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn reseed_forgets_previous_stream() {
        let mut a = Rng::new(7);
        for _ in 0..17 {
            a.next_u32();
        }
        a.reseed(99);
        let mut b = Rng::new(99);
        for _ in 0..100 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn matches_reference_mulberry32() {
        // First outputs of mulberry32(0) and mulberry32(1).
        let mut r = Rng::new(0);
        assert_eq!(r.next_u32(), 1_144_304_738);
        let mut r = Rng::new(1);
        assert_eq!(r.next_u32(), 2_693_262_067);
    }

    #[test]
    fn floats_stay_in_unit_interval() {
        for seed in [0u32, 1, 42, u32::MAX, 0xDEAD_BEEF] {
            let mut r = Rng::new(seed);
            for _ in 0..10_000 {
                let v = r.next_f64();
                assert!((0.0..1.0).contains(&v));
                let f = r.next_f32();
                assert!((0.0..1.0).contains(&f));
            }
        }
    }

    #[test]
    fn index_bounds() {
        let mut r = Rng::new(3);
        for _ in 0..10_000 {
            assert!(r.index(5) <= 5);
        }
        assert_eq!(r.index(0), 0);
    }

    #[test]
    fn salted_seeds_differ() {
        assert_ne!(seed_u32(1, 0xA5A5_0001), seed_u32(1, 0xA5A5_0002));
        assert_eq!(seed_u32(1, 0xA5A5_0001), seed_u32(1, 0xA5A5_0001));
    }
}
