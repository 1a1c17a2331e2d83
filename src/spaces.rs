//! Box-shaped observation and action spaces.

use rand::Rng;

/// An n-dimensional box `[low_i, high_i]`, possibly unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpace {
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

impl BoxSpace {
    /// Box with per-dimension bounds.
    ///
    /// # Panics
    ///
    /// Panics if `low` and `high` differ in length or any `low_i > high_i`.
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Self {
        assert_eq!(low.len(), high.len(), "BoxSpace bounds must match in length");
        assert!(
            low.iter().zip(&high).all(|(l, h)| l <= h),
            "BoxSpace low must be <= high"
        );
        Self { low, high }
    }

    /// Box with the same bounds on every dimension.
    pub fn uniform(dim: usize, low: f64, high: f64) -> Self {
        Self::new(vec![low; dim], vec![high; dim])
    }

    /// Box spanning the whole real line on every dimension.
    pub fn unbounded(dim: usize) -> Self {
        Self::uniform(dim, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Shape of a sample, always one-dimensional.
    pub fn shape(&self) -> (usize,) {
        (self.low.len(),)
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn is_bounded(&self) -> bool {
        self.low.iter().chain(&self.high).all(|b| b.is_finite())
    }

    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.dim()
            && x
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(v, (l, h))| *l <= *v && *v <= *h)
    }

    /// Draws a sample.
    ///
    /// Finite dimensions are uniform over their bounds. Dimensions with an
    /// infinite bound are uniform over `[-1, 1]` intersected with the box.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(&l, &h)| {
                let (l, h) = if l.is_finite() && h.is_finite() {
                    (l, h)
                } else {
                    (l.max(-1.0), h.min(1.0))
                };
                if l >= h {
                    l
                } else {
                    rng.gen_range(l..=h)
                }
            })
            .collect()
    }
}
