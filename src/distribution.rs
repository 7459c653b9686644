//! Distribution families and their classification.
//!
//! Distributions come in two flavors: those drawing i.i.d. from fixed
//! parameters, and "self" variants that substitute the variable's current
//! value for one parameter (a one-step Markov dependence on the previous
//! draw).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PseError;

/// Number of parameter slots attached to every distribution.
pub const MAX_DIST_PARAMS: usize = 5;

/// Fixed-length parameter vector. Unused slots are ignored.
pub type Params = [f64; MAX_DIST_PARAMS];

/// Numeric domain a distribution samples from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Integer-valued draws.
    Integer,
    /// Real-valued draws.
    Real,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Real => write!(f, "real"),
        }
    }
}

/// Distribution governing how a value (or an array position) varies.
///
/// Parameter slots per family:
///
/// | kind | slot 0 | slot 1 |
/// |------|--------|--------|
/// | `UniformIntBounded`, `UniformDoubleBounded` | min | max |
/// | `Bernoulli` | p | |
/// | `Binomial` | trials | p |
/// | `BinomialSelf` | p | |
/// | `NegBinomial` | p | successes |
/// | `NegBinomialSelf` | p | |
/// | `Poisson` | mean | |
/// | `Normal` | mean | std dev |
/// | `NormalSelf` | std dev | |
/// | `Exponential` | mean | |
/// | `Gamma` | rate | shape |
/// | `GammaSelf` | | shape |
/// | `ChiSquare` | degrees of freedom | |
/// | `F` | numerator dof | denominator dof |
/// | `Beta` | alpha | beta |
///
/// The remaining self variants take everything from the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    UniformIntSelf,
    UniformIntBounded,
    Bernoulli,
    Binomial,
    BinomialSelf,
    NegBinomial,
    NegBinomialSelf,
    Poisson,
    PoissonSelf,
    UniformDoubleSelf,
    UniformDoubleBounded,
    Normal,
    NormalSelf,
    Exponential,
    ExponentialSelf,
    Gamma,
    GammaSelf,
    ChiSquare,
    ChiSquareSelf,
    F,
    Beta,
    /// Reserved; currently returns the value unchanged.
    FokkerPlanck,
    /// Reserved; currently returns the value unchanged.
    Custom,
    /// No variation: the current value is returned.
    None,
}

impl DistributionKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 24] = [
        Self::UniformIntSelf,
        Self::UniformIntBounded,
        Self::Bernoulli,
        Self::Binomial,
        Self::BinomialSelf,
        Self::NegBinomial,
        Self::NegBinomialSelf,
        Self::Poisson,
        Self::PoissonSelf,
        Self::UniformDoubleSelf,
        Self::UniformDoubleBounded,
        Self::Normal,
        Self::NormalSelf,
        Self::Exponential,
        Self::ExponentialSelf,
        Self::Gamma,
        Self::GammaSelf,
        Self::ChiSquare,
        Self::ChiSquareSelf,
        Self::F,
        Self::Beta,
        Self::FokkerPlanck,
        Self::Custom,
        Self::None,
    ];

    /// Domain this kind draws from. `None` has no domain of its own and
    /// works with both.
    #[must_use]
    pub const fn domain(self) -> Option<Domain> {
        match self {
            Self::UniformIntSelf
            | Self::UniformIntBounded
            | Self::Bernoulli
            | Self::Binomial
            | Self::BinomialSelf
            | Self::NegBinomial
            | Self::NegBinomialSelf
            | Self::Poisson
            | Self::PoissonSelf => Some(Domain::Integer),
            Self::UniformDoubleSelf
            | Self::UniformDoubleBounded
            | Self::Normal
            | Self::NormalSelf
            | Self::Exponential
            | Self::ExponentialSelf
            | Self::Gamma
            | Self::GammaSelf
            | Self::ChiSquare
            | Self::ChiSquareSelf
            | Self::F
            | Self::Beta
            | Self::FokkerPlanck
            | Self::Custom => Some(Domain::Real),
            Self::None => None,
        }
    }

    /// Returns true for integer-domain kinds.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self.domain(), Some(Domain::Integer))
    }

    /// Returns true if this kind can sample values of `domain`.
    #[must_use]
    pub const fn supports(self, domain: Domain) -> bool {
        match self.domain() {
            Some(Domain::Integer) => matches!(domain, Domain::Integer),
            Some(Domain::Real) => matches!(domain, Domain::Real),
            None => true,
        }
    }

    /// Returns true for kinds that use the current value as a parameter.
    #[must_use]
    pub const fn is_self(self) -> bool {
        matches!(
            self,
            Self::UniformIntSelf
                | Self::BinomialSelf
                | Self::NegBinomialSelf
                | Self::PoissonSelf
                | Self::UniformDoubleSelf
                | Self::NormalSelf
                | Self::ExponentialSelf
                | Self::GammaSelf
                | Self::ChiSquareSelf
        )
    }

    /// Returns true for reserved kinds that do not sample yet.
    #[must_use]
    pub const fn is_placeholder(self) -> bool {
        matches!(self, Self::FokkerPlanck | Self::Custom)
    }

    /// Stable snake-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UniformIntSelf => "uniform_int_self",
            Self::UniformIntBounded => "uniform_int_bounded",
            Self::Bernoulli => "bernoulli",
            Self::Binomial => "binomial",
            Self::BinomialSelf => "binomial_self",
            Self::NegBinomial => "neg_binomial",
            Self::NegBinomialSelf => "neg_binomial_self",
            Self::Poisson => "poisson",
            Self::PoissonSelf => "poisson_self",
            Self::UniformDoubleSelf => "uniform_double_self",
            Self::UniformDoubleBounded => "uniform_double_bounded",
            Self::Normal => "normal",
            Self::NormalSelf => "normal_self",
            Self::Exponential => "exponential",
            Self::ExponentialSelf => "exponential_self",
            Self::Gamma => "gamma",
            Self::GammaSelf => "gamma_self",
            Self::ChiSquare => "chi_square",
            Self::ChiSquareSelf => "chi_square_self",
            Self::F => "f",
            Self::Beta => "beta",
            Self::FokkerPlanck => "fokker_planck",
            Self::Custom => "custom",
            Self::None => "none",
        }
    }
}

impl Default for DistributionKind {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistributionKind {
    type Err = PseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PseError::TypeUnknown {
                name: s.to_string(),
            })
    }
}

/// A distribution kind together with its parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    /// Family to sample from.
    pub kind: DistributionKind,
    /// Parameter slots, interpreted per `kind`.
    pub params: Params,
}

impl Distribution {
    /// Creates a distribution from a kind and a full parameter vector.
    #[must_use]
    pub const fn new(kind: DistributionKind, params: Params) -> Self {
        Self { kind, params }
    }

    /// Creates a distribution from a kind and leading parameters; the
    /// remaining slots are zero. Extra parameters beyond the slot count are
    /// ignored.
    #[must_use]
    pub fn with(kind: DistributionKind, leading: &[f64]) -> Self {
        let mut params = [0.0; MAX_DIST_PARAMS];
        for (slot, value) in params.iter_mut().zip(leading) {
            *slot = *value;
        }
        Self { kind, params }
    }

    /// The "no variation" distribution.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            kind: DistributionKind::None,
            params: [0.0; MAX_DIST_PARAMS],
        }
    }
}

impl Default for Distribution {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_from_name() {
        for kind in DistributionKind::ALL {
            assert_eq!(kind.name().parse::<DistributionKind>().unwrap(), kind);
        }
        assert_eq!(
            "Normal_Self".parse::<DistributionKind>().unwrap(),
            DistributionKind::NormalSelf
        );
        assert!(matches!(
            "cauchy".parse::<DistributionKind>(),
            Err(PseError::TypeUnknown { .. })
        ));
    }

    #[test]
    fn test_integer_and_real_partition() {
        let integer = DistributionKind::ALL.iter().filter(|k| k.is_integer()).count();
        let real = DistributionKind::ALL
            .iter()
            .filter(|k| k.domain() == Some(Domain::Real))
            .count();
        assert_eq!(integer, 9);
        assert_eq!(real, 14);
        assert_eq!(DistributionKind::None.domain(), None);
    }

    #[test]
    fn test_self_kinds() {
        let selfs: Vec<_> = DistributionKind::ALL
            .iter()
            .copied()
            .filter(|k| k.is_self())
            .collect();
        assert_eq!(selfs.len(), 9);
        assert!(selfs.iter().all(|k| k.name().ends_with("_self")));
        assert!(!DistributionKind::Normal.is_self());
    }

    #[test]
    fn test_supports() {
        assert!(DistributionKind::Poisson.supports(Domain::Integer));
        assert!(!DistributionKind::Poisson.supports(Domain::Real));
        assert!(DistributionKind::Beta.supports(Domain::Real));
        assert!(DistributionKind::None.supports(Domain::Integer));
        assert!(DistributionKind::None.supports(Domain::Real));
    }

    #[test]
    fn test_with_pads_and_truncates() {
        let d = Distribution::with(DistributionKind::Normal, &[1.0, 2.0]);
        assert_eq!(d.params, [1.0, 2.0, 0.0, 0.0, 0.0]);
        let d = Distribution::with(DistributionKind::Normal, &[1.0; 8]);
        assert_eq!(d.params, [1.0; 5]);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&DistributionKind::NegBinomialSelf).unwrap();
        assert_eq!(json, "\"neg_binomial_self\"");
        let back: DistributionKind = serde_json::from_str("\"chi_square\"").unwrap();
        assert_eq!(back, DistributionKind::ChiSquare);
    }
}
