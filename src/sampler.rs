//! Distribution sampling.
//!
//! `sample_int` and `sample_double` map `(current value, parameters, kind)`
//! to a new value. They draw from an explicit random source so every store
//! can own its own stream; `Sampler` is that per-store source.

use rand::distributions::{Bernoulli, Distribution as _};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Binomial, ChiSquared, Exp, FisherF, Gamma, Normal, Poisson};

use crate::distribution::{DistributionKind, Domain, Params};
use crate::error::{PseError, PseResult};

const SEED_CONTEXT: &[u8] = b"pse.sampler.seed.v1";

/// Seeded random source owned by one store.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: ChaCha8Rng,
}

impl Sampler {
    /// Creates a sampler from two independent integer seeds.
    ///
    /// Both seeds are hashed into the 256-bit generator seed, so equal pairs
    /// always reproduce the same stream and swapping the seeds does not.
    #[must_use]
    pub fn from_seeds(seed_1: u64, seed_2: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(SEED_CONTEXT);
        hasher.update(&seed_1.to_le_bytes());
        hasher.update(&seed_2.to_le_bytes());
        let seed: [u8; 32] = *hasher.finalize().as_bytes();
        Self {
            rng: ChaCha8Rng::from_seed(seed),
        }
    }

    /// Draws an integer-domain value.
    ///
    /// # Errors
    ///
    /// See [`sample_int`].
    pub fn sample_int(
        &mut self,
        value: i64,
        params: &Params,
        kind: DistributionKind,
    ) -> PseResult<i64> {
        sample_int(&mut self.rng, value, params, kind)
    }

    /// Draws a real-domain value.
    ///
    /// # Errors
    ///
    /// See [`sample_double`].
    pub fn sample_double(
        &mut self,
        value: f64,
        params: &Params,
        kind: DistributionKind,
    ) -> PseResult<f64> {
        sample_double(&mut self.rng, value, params, kind)
    }

    /// Draws with whichever domain `kind` belongs to, returning a real.
    ///
    /// Used where the target is neither an integer nor a real variable (string
    /// positions and bytes). `None` returns `value` unchanged.
    ///
    /// # Errors
    ///
    /// See [`sample_int`] and [`sample_double`].
    pub fn sample_any(
        &mut self,
        value: f64,
        params: &Params,
        kind: DistributionKind,
    ) -> PseResult<f64> {
        match kind.domain() {
            Some(Domain::Integer) => {
                #[allow(clippy::cast_possible_truncation)]
                let current = value.round() as i64;
                #[allow(clippy::cast_precision_loss)]
                let drawn = self.sample_int(current, params, kind)? as f64;
                Ok(drawn)
            }
            Some(Domain::Real) | None => self.sample_double(value, params, kind),
        }
    }
}

/// Rounds an integer-valued parameter slot, rejecting NaN and infinities.
#[allow(clippy::cast_possible_truncation)]
fn rounded(kind: DistributionKind, x: f64, what: &str) -> PseResult<i64> {
    if !x.is_finite() {
        return Err(PseError::invalid_parameters(
            kind,
            format!("{what} must be finite, got {x}"),
        ));
    }
    Ok(x.round() as i64)
}

fn trials(kind: DistributionKind, n: i64, what: &str) -> PseResult<u64> {
    u64::try_from(n).map_err(|_| PseError::invalid_parameters(kind, format!("{what} must be >= 0, got {n}")))
}

fn saturate(x: u64) -> i64 {
    i64::try_from(x).unwrap_or(i64::MAX)
}

#[allow(clippy::cast_possible_truncation)]
fn poisson<R: Rng + ?Sized>(rng: &mut R, kind: DistributionKind, mean: f64) -> PseResult<i64> {
    if mean == 0.0 {
        return Ok(0);
    }
    let dist = Poisson::new(mean)
        .map_err(|e| PseError::invalid_parameters(kind, format!("mean {mean}: {e}")))?;
    let drawn: f64 = dist.sample(rng);
    Ok(drawn as i64)
}

/// Failures before `successes` successes with success probability `p`,
/// drawn as a gamma-Poisson mixture.
fn negative_binomial<R: Rng + ?Sized>(
    rng: &mut R,
    kind: DistributionKind,
    successes: i64,
    p: f64,
) -> PseResult<i64> {
    if successes <= 0 {
        return Err(PseError::invalid_parameters(
            kind,
            format!("successes must be > 0, got {successes}"),
        ));
    }
    if !(p > 0.0 && p <= 1.0) {
        return Err(PseError::invalid_parameters(
            kind,
            format!("p must be in (0, 1], got {p}"),
        ));
    }
    if p == 1.0 {
        return Ok(0);
    }
    #[allow(clippy::cast_precision_loss)]
    let shape = successes as f64;
    let gamma = Gamma::new(shape, (1.0 - p) / p)
        .map_err(|e| PseError::invalid_parameters(kind, e.to_string()))?;
    let rate = gamma.sample(rng);
    poisson(rng, kind, rate)
}

/// Draws a new integer value for `kind`.
///
/// Self variants use `value` in place of one parameter:
/// `UniformIntSelf` draws between 0 and `value` inclusive, `BinomialSelf`
/// and `NegBinomialSelf` take `value` as the trial/success count and
/// `PoissonSelf` takes it as the mean. `None` returns `value`.
///
/// # Errors
///
/// - `DistributionMismatch` for real-domain kinds.
/// - `InvalidParameters` when the parameters (or the current value, for
///   self variants) are outside the family's support.
pub fn sample_int<R: Rng + ?Sized>(
    rng: &mut R,
    value: i64,
    params: &Params,
    kind: DistributionKind,
) -> PseResult<i64> {
    use DistributionKind as K;

    match kind {
        K::UniformIntSelf => {
            let (lo, hi) = if value >= 0 { (0, value) } else { (value, 0) };
            Ok(rng.gen_range(lo..=hi))
        }
        K::UniformIntBounded => {
            let (min, max) = (rounded(kind, params[0], "min")?, rounded(kind, params[1], "max")?);
            if min > max {
                return Err(PseError::invalid_parameters(
                    kind,
                    format!("min {min} exceeds max {max}"),
                ));
            }
            Ok(rng.gen_range(min..=max))
        }
        K::Bernoulli => {
            let dist = Bernoulli::new(params[0])
                .map_err(|e| PseError::invalid_parameters(kind, e.to_string()))?;
            Ok(i64::from(dist.sample(rng)))
        }
        K::Binomial | K::BinomialSelf => {
            let (n, p) = if kind == K::Binomial {
                (rounded(kind, params[0], "trials")?, params[1])
            } else {
                (value, params[0])
            };
            let dist = Binomial::new(trials(kind, n, "trials")?, p)
                .map_err(|e| PseError::invalid_parameters(kind, format!("p {p}: {e}")))?;
            Ok(saturate(dist.sample(rng)))
        }
        K::NegBinomial => {
            let successes = rounded(kind, params[1], "successes")?;
            negative_binomial(rng, kind, successes, params[0])
        }
        K::NegBinomialSelf => negative_binomial(rng, kind, value, params[0]),
        K::Poisson => poisson(rng, kind, params[0]),
        #[allow(clippy::cast_precision_loss)]
        K::PoissonSelf => poisson(rng, kind, value as f64),
        K::None => Ok(value),
        _ => Err(PseError::DistributionMismatch {
            kind,
            domain: Domain::Integer,
        }),
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, kind: DistributionKind, a: f64, b: f64) -> PseResult<f64> {
    if !a.is_finite() || !b.is_finite() {
        return Err(PseError::invalid_parameters(
            kind,
            format!("bounds must be finite, got [{a}, {b})"),
        ));
    }
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo == hi {
        return Ok(lo);
    }
    if !(hi - lo).is_finite() {
        return Err(PseError::invalid_parameters(
            kind,
            format!("span of [{lo}, {hi}) overflows"),
        ));
    }
    Ok(rng.gen_range(lo..hi))
}

fn exponential<R: Rng + ?Sized>(rng: &mut R, kind: DistributionKind, mean: f64) -> PseResult<f64> {
    if !(mean > 0.0) {
        return Err(PseError::invalid_parameters(
            kind,
            format!("mean must be > 0, got {mean}"),
        ));
    }
    let dist = Exp::new(1.0 / mean).map_err(|e| PseError::invalid_parameters(kind, e.to_string()))?;
    Ok(dist.sample(rng))
}

fn gamma<R: Rng + ?Sized>(
    rng: &mut R,
    kind: DistributionKind,
    rate: f64,
    shape: f64,
) -> PseResult<f64> {
    if !(rate > 0.0) {
        return Err(PseError::invalid_parameters(
            kind,
            format!("rate must be > 0, got {rate}"),
        ));
    }
    let dist = Gamma::new(shape, 1.0 / rate)
        .map_err(|e| PseError::invalid_parameters(kind, format!("shape {shape}: {e}")))?;
    Ok(dist.sample(rng))
}

fn chi_square<R: Rng + ?Sized>(rng: &mut R, kind: DistributionKind, dof: f64) -> PseResult<f64> {
    let dist = ChiSquared::new(dof)
        .map_err(|e| PseError::invalid_parameters(kind, format!("dof {dof}: {e}")))?;
    Ok(dist.sample(rng))
}

/// Draws a new real value for `kind`.
///
/// Self variants use `value` in place of one parameter:
/// `UniformDoubleSelf` draws between 0 and `value`, `NormalSelf` centers on
/// `value`, `ExponentialSelf` uses it as the mean, `GammaSelf` as the rate
/// and `ChiSquareSelf` as the degrees of freedom. `None` and the reserved
/// `FokkerPlanck`/`Custom` kinds return `value`.
///
/// # Errors
///
/// - `DistributionMismatch` for integer-domain kinds.
/// - `InvalidParameters` when the parameters (or the current value, for
///   self variants) are outside the family's support.
pub fn sample_double<R: Rng + ?Sized>(
    rng: &mut R,
    value: f64,
    params: &Params,
    kind: DistributionKind,
) -> PseResult<f64> {
    use DistributionKind as K;

    match kind {
        K::UniformDoubleSelf => uniform(rng, kind, 0.0, value),
        K::UniformDoubleBounded => uniform(rng, kind, params[0], params[1]),
        K::Normal | K::NormalSelf => {
            let (mean, sd) = if kind == K::Normal {
                (params[0], params[1])
            } else {
                (value, params[0])
            };
            let dist = Normal::new(mean, sd)
                .map_err(|e| PseError::invalid_parameters(kind, format!("std dev {sd}: {e}")))?;
            Ok(dist.sample(rng))
        }
        K::Exponential => exponential(rng, kind, params[0]),
        K::ExponentialSelf => exponential(rng, kind, value),
        K::Gamma => gamma(rng, kind, params[0], params[1]),
        K::GammaSelf => gamma(rng, kind, value, params[1]),
        K::ChiSquare => chi_square(rng, kind, params[0]),
        K::ChiSquareSelf => chi_square(rng, kind, value),
        K::F => {
            let dist = FisherF::new(params[0], params[1])
                .map_err(|e| PseError::invalid_parameters(kind, e.to_string()))?;
            Ok(dist.sample(rng))
        }
        K::Beta => {
            let dist = Beta::new(params[0], params[1])
                .map_err(|e| PseError::invalid_parameters(kind, e.to_string()))?;
            Ok(dist.sample(rng))
        }
        K::FokkerPlanck | K::Custom | K::None => Ok(value),
        _ => Err(PseError::DistributionMismatch {
            kind,
            domain: Domain::Real,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(leading: &[f64]) -> Params {
        crate::distribution::Distribution::with(DistributionKind::None, leading).params
    }

    fn mean_of(samples: &[f64]) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let n = samples.len() as f64;
        samples.iter().sum::<f64>() / n
    }

    #[test]
    fn test_same_seeds_same_stream() {
        let mut a = Sampler::from_seeds(1, 1);
        let mut b = Sampler::from_seeds(1, 1);
        let p = params(&[0.5]);
        for _ in 0..1000 {
            assert_eq!(
                a.sample_int(0, &p, DistributionKind::Bernoulli).unwrap(),
                b.sample_int(0, &p, DistributionKind::Bernoulli).unwrap()
            );
        }
    }

    #[test]
    fn test_seed_order_matters() {
        let mut a = Sampler::from_seeds(103, 29);
        let mut b = Sampler::from_seeds(29, 103);
        let p = params(&[0.0, 1.0]);
        let xs: Vec<f64> = (0..16)
            .map(|_| a.sample_double(0.0, &p, DistributionKind::UniformDoubleBounded).unwrap())
            .collect();
        let ys: Vec<f64> = (0..16)
            .map(|_| b.sample_double(0.0, &p, DistributionKind::UniformDoubleBounded).unwrap())
            .collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_none_returns_value() {
        let mut s = Sampler::from_seeds(7, 7);
        let p = params(&[]);
        assert_eq!(s.sample_int(42, &p, DistributionKind::None).unwrap(), 42);
        assert_eq!(s.sample_double(4.5, &p, DistributionKind::None).unwrap(), 4.5);
        assert_eq!(s.sample_double(4.5, &p, DistributionKind::Custom).unwrap(), 4.5);
        assert_eq!(s.sample_double(4.5, &p, DistributionKind::FokkerPlanck).unwrap(), 4.5);
    }

    #[test]
    fn test_domain_mismatch() {
        let mut s = Sampler::from_seeds(7, 7);
        let p = params(&[1.0, 1.0]);
        assert!(matches!(
            s.sample_int(1, &p, DistributionKind::Normal),
            Err(PseError::DistributionMismatch { domain: Domain::Integer, .. })
        ));
        assert!(matches!(
            s.sample_double(1.0, &p, DistributionKind::Poisson),
            Err(PseError::DistributionMismatch { domain: Domain::Real, .. })
        ));
    }

    #[test]
    fn test_uniform_int_bounds() {
        let mut s = Sampler::from_seeds(3, 4);
        let p = params(&[2.0, 5.0]);
        for _ in 0..500 {
            let x = s.sample_int(0, &p, DistributionKind::UniformIntBounded).unwrap();
            assert!((2..=5).contains(&x));
        }
        for _ in 0..500 {
            let x = s.sample_int(-6, &p, DistributionKind::UniformIntSelf).unwrap();
            assert!((-6..=0).contains(&x));
        }
        let bad = params(&[5.0, 2.0]);
        assert!(s.sample_int(0, &bad, DistributionKind::UniformIntBounded).is_err());
    }

    #[test]
    fn test_non_finite_integer_params_rejected() {
        let mut s = Sampler::from_seeds(3, 4);
        for leading in [[f64::NAN, 5.0], [0.0, f64::INFINITY], [f64::NEG_INFINITY, 1.0]] {
            assert!(matches!(
                s.sample_int(0, &params(&leading), DistributionKind::UniformIntBounded),
                Err(PseError::InvalidParameters { .. })
            ));
        }
        assert!(matches!(
            s.sample_int(0, &params(&[f64::NAN, 0.5]), DistributionKind::Binomial),
            Err(PseError::InvalidParameters { .. })
        ));
        assert!(matches!(
            s.sample_int(0, &params(&[0.5, f64::NAN]), DistributionKind::NegBinomial),
            Err(PseError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn test_bernoulli_is_one_with_probability_p() {
        let mut s = Sampler::from_seeds(11, 12);
        let p = params(&[0.2]);
        let ones = (0..10_000)
            .filter(|_| s.sample_int(0, &p, DistributionKind::Bernoulli).unwrap() == 1)
            .count();
        assert!((1500..2500).contains(&ones), "ones = {ones}");
        assert!(s.sample_int(0, &params(&[1.5]), DistributionKind::Bernoulli).is_err());
    }

    #[test]
    fn test_binomial_and_self() {
        let mut s = Sampler::from_seeds(5, 6);
        let p = params(&[100.0, 0.5]);
        let xs: Vec<f64> = (0..2000)
            .map(|_| {
                let x = s.sample_int(0, &p, DistributionKind::Binomial).unwrap();
                assert!((0..=100).contains(&x));
                #[allow(clippy::cast_precision_loss)]
                let x = x as f64;
                x
            })
            .collect();
        assert!((mean_of(&xs) - 50.0).abs() < 2.0);

        let p = params(&[0.5]);
        for _ in 0..200 {
            let x = s.sample_int(10, &p, DistributionKind::BinomialSelf).unwrap();
            assert!((0..=10).contains(&x));
        }
        assert!(s.sample_int(-1, &p, DistributionKind::BinomialSelf).is_err());
    }

    #[test]
    fn test_negative_binomial_mean() {
        // Mean number of failures is r(1-p)/p = 4 * 0.5 / 0.5 = 4.
        let mut s = Sampler::from_seeds(21, 22);
        let p = params(&[0.5, 4.0]);
        let xs: Vec<f64> = (0..5000)
            .map(|_| {
                #[allow(clippy::cast_precision_loss)]
                let x = s.sample_int(0, &p, DistributionKind::NegBinomial).unwrap() as f64;
                x
            })
            .collect();
        assert!(xs.iter().all(|x| *x >= 0.0));
        assert!((mean_of(&xs) - 4.0).abs() < 0.4);

        assert_eq!(s.sample_int(3, &params(&[1.0]), DistributionKind::NegBinomialSelf).unwrap(), 0);
        assert!(s.sample_int(0, &params(&[0.5]), DistributionKind::NegBinomialSelf).is_err());
    }

    #[test]
    fn test_poisson_and_self() {
        let mut s = Sampler::from_seeds(31, 32);
        let xs: Vec<f64> = (0..5000)
            .map(|_| {
                #[allow(clippy::cast_precision_loss)]
                let x = s.sample_int(0, &params(&[3.0]), DistributionKind::Poisson).unwrap() as f64;
                x
            })
            .collect();
        assert!((mean_of(&xs) - 3.0).abs() < 0.2);
        assert_eq!(s.sample_int(0, &params(&[]), DistributionKind::PoissonSelf).unwrap(), 0);
        assert!(s.sample_int(-2, &params(&[]), DistributionKind::PoissonSelf).is_err());
    }

    #[test]
    fn test_normal_self_centers_on_value() {
        let mut s = Sampler::from_seeds(103, 29);
        let p = params(&[2.3]);
        let xs: Vec<f64> = (0..5000)
            .map(|_| s.sample_double(12.4, &p, DistributionKind::NormalSelf).unwrap())
            .collect();
        assert!((mean_of(&xs) - 12.4).abs() < 0.15);
        assert!(s.sample_double(0.0, &params(&[-1.0]), DistributionKind::NormalSelf).is_err());
    }

    #[test]
    fn test_uniform_double() {
        let mut s = Sampler::from_seeds(1, 2);
        for _ in 0..500 {
            let x = s
                .sample_double(0.0, &params(&[-1.0, 1.0]), DistributionKind::UniformDoubleBounded)
                .unwrap();
            assert!((-1.0..1.0).contains(&x));
            let y = s.sample_double(-3.0, &params(&[]), DistributionKind::UniformDoubleSelf).unwrap();
            assert!((-3.0..0.0).contains(&y));
        }
        assert_eq!(
            s.sample_double(0.0, &params(&[]), DistributionKind::UniformDoubleSelf).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_uniform_double_span_overflow_is_an_error() {
        let mut s = Sampler::from_seeds(1, 1);
        let wide = params(&[-1e308, 1e308]);
        assert!(matches!(
            s.sample_double(0.0, &wide, DistributionKind::UniformDoubleBounded),
            Err(PseError::InvalidParameters { .. })
        ));
        assert!(matches!(
            s.sample_double(-f64::MAX, &params(&[]), DistributionKind::UniformDoubleSelf),
            Ok(x) if x.is_finite()
        ));
    }

    #[test]
    fn test_exponential_gamma_chi_mean() {
        let mut s = Sampler::from_seeds(8, 9);
        let n = 5000;
        let exp: Vec<f64> = (0..n)
            .map(|_| s.sample_double(0.0, &params(&[2.0]), DistributionKind::Exponential).unwrap())
            .collect();
        assert!((mean_of(&exp) - 2.0).abs() < 0.15);

        // Rate 2, shape 3: mean 1.5.
        let gam: Vec<f64> = (0..n)
            .map(|_| s.sample_double(0.0, &params(&[2.0, 3.0]), DistributionKind::Gamma).unwrap())
            .collect();
        assert!((mean_of(&gam) - 1.5).abs() < 0.1);

        let chi: Vec<f64> = (0..n)
            .map(|_| s.sample_double(4.0, &params(&[]), DistributionKind::ChiSquareSelf).unwrap())
            .collect();
        assert!((mean_of(&chi) - 4.0).abs() < 0.25);

        assert!(s.sample_double(0.0, &params(&[0.0]), DistributionKind::Exponential).is_err());
        assert!(s.sample_double(-1.0, &params(&[0.0, 1.0]), DistributionKind::GammaSelf).is_err());
    }

    #[test]
    fn test_beta_and_f_support() {
        let mut s = Sampler::from_seeds(13, 14);
        for _ in 0..500 {
            let b = s.sample_double(0.0, &params(&[2.0, 5.0]), DistributionKind::Beta).unwrap();
            assert!((0.0..=1.0).contains(&b));
            let f = s.sample_double(0.0, &params(&[5.0, 10.0]), DistributionKind::F).unwrap();
            assert!(f >= 0.0);
        }
        assert!(s.sample_double(0.0, &params(&[0.0, 1.0]), DistributionKind::Beta).is_err());
    }

    #[test]
    fn test_sample_any_dispatches_by_domain() {
        let mut s = Sampler::from_seeds(17, 18);
        let x = s.sample_any(0.0, &params(&[3.0, 3.0]), DistributionKind::UniformIntBounded).unwrap();
        assert_eq!(x, 3.0);
        let y = s.sample_any(9.0, &params(&[]), DistributionKind::None).unwrap();
        assert_eq!(y, 9.0);
    }
}
