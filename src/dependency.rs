//! Conditioning dependencies between variables.
//!
//! A dependency records that a world-scoped variable's distribution is
//! conditioned on other world-scoped variables, in the form
//! `P(y | x1, ..., xn)`. Conditioning on another agent's private state would
//! encode simultaneity between agents that evolve independently, so only
//! world variables may take part.
//!
//! This is an extension point. The store records dependencies and their
//! prior models but `prepare`/`observe` never evaluate them: a dependent
//! stochastic variable is written verbatim and observed without sampling
//! until a conditioning step exists.

use std::fmt;
use std::sync::Arc;

use crate::variable::VariableId;

/// Prior model attached to a dependency.
///
/// Implementations may wrap closed-form densities, learned classifiers or a
/// full cognitive model. Closures of the right shape implement it directly.
pub trait PriorModel: Send + Sync {
    /// Evaluates the prior for the given conditioning variables.
    fn evaluate(&self, conditionals: &[VariableId]) -> f64;
}

impl<F> PriorModel for F
where
    F: Fn(&[VariableId]) -> f64 + Send + Sync,
{
    fn evaluate(&self, conditionals: &[VariableId]) -> f64 {
        self(conditionals)
    }
}

/// Conditioning record for one variable.
#[derive(Clone)]
pub struct Dependency {
    owner: VariableId,
    conditionals: Vec<VariableId>,
    prior: Option<Arc<dyn PriorModel>>,
}

impl Dependency {
    pub(crate) fn new(owner: VariableId, conditionals: Vec<VariableId>) -> Self {
        Self {
            owner,
            conditionals,
            prior: None,
        }
    }

    /// The conditioned variable.
    #[must_use]
    pub const fn owner(&self) -> VariableId {
        self.owner
    }

    /// Conditioning variables, in declaration order.
    #[must_use]
    pub fn conditionals(&self) -> &[VariableId] {
        &self.conditionals
    }

    /// The supplied prior model, if any.
    #[must_use]
    pub fn prior(&self) -> Option<&Arc<dyn PriorModel>> {
        self.prior.as_ref()
    }

    pub(crate) fn set_prior(&mut self, prior: Arc<dyn PriorModel>) {
        self.prior = Some(prior);
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("owner", &self.owner)
            .field("conditionals", &self.conditionals)
            .field("has_prior", &self.prior.is_some())
            .finish()
    }
}
