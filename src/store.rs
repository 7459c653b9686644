//! The per-agent variable store.
//!
//! A store owns every variable and dependency of one simulated agent and
//! walks a strict, single-use lifecycle:
//!
//! ```text
//! Created --init--> Initialized --start--> Started --finalize--> Finalized
//! ```
//!
//! Declarations (register, deregister, dependencies) happen while
//! Initialized; `prepare`/`observe` happen while Started. A rejected call
//! never changes the store's state.
//!
//! Each store owns its own [`Sampler`], seeded at `start`, so many stores can
//! run side by side (one per agent, on any number of threads) without sharing
//! a random stream.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::dependency::{Dependency, PriorModel};
use crate::error::{PseError, PseResult};
use crate::randomize::{randomize, randomize_and_alter};
use crate::sampler::Sampler;
use crate::value::{SimTime, Value};
use crate::variable::{ModelKind, StorageKind, Variable, VariableId, VariableSpec};

/// Identifier of a store instance, used to tell agents apart in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(uuid::Uuid);

impl StoreId {
    /// Creates a new random store ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Fresh store, nothing allocated.
    Created,
    /// Accepting declarations.
    Initialized,
    /// Sampler seeded; accepting prepare/observe.
    Started,
    /// Terminal; all storage released.
    Finalized,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Initialized => write!(f, "initialized"),
            Self::Started => write!(f, "started"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

fn live(slots: &[Option<Variable>], id: VariableId) -> PseResult<&Variable> {
    slots
        .get(id.index())
        .and_then(Option::as_ref)
        .ok_or(PseError::VariableUnknown { id })
}

fn live_mut(slots: &mut [Option<Variable>], id: VariableId) -> PseResult<&mut Variable> {
    slots
        .get_mut(id.index())
        .and_then(Option::as_mut)
        .ok_or(PseError::VariableUnknown { id })
}

/// Stochastic variable store for one agent.
///
/// # Examples
///
/// ```
/// use pse::{Distribution, DistributionKind, StorageKind, Value, VariableSpec, VariableStore};
///
/// let mut store = VariableStore::new();
/// store.init()?;
/// let distance = store.register(
///     VariableSpec::new("distance", StorageKind::Double)
///         .stochastic(Distribution::with(DistributionKind::NormalSelf, &[2.3]))
///         .read_and_alter(true),
/// )?;
/// store.start(103, 29)?;
/// store.prepare(distance, Value::Double(12.4), 0)?;
/// let seen = store.observe_value(distance, 0)?;
/// assert!(seen.as_double().is_some());
/// store.finalize()?;
/// # Ok::<(), pse::PseError>(())
/// ```
#[derive(Debug)]
pub struct VariableStore {
    id: StoreId,
    config: StoreConfig,
    state: LifecycleState,
    slots: Vec<Option<Variable>>,
    dependencies: BTreeMap<VariableId, Dependency>,
    allocated: u32,
    live: usize,
    sampler: Option<Sampler>,
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableStore {
    /// Creates a store with the default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::build(StoreConfig::default())
    }

    /// Creates a store with custom limits.
    ///
    /// # Errors
    ///
    /// Returns `PseError::InvalidConfig` if `config` does not validate.
    pub fn with_config(config: StoreConfig) -> PseResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StoreConfig) -> Self {
        Self {
            id: StoreId::new(),
            config,
            state: LifecycleState::Created,
            slots: Vec::new(),
            dependencies: BTreeMap::new(),
            allocated: 0,
            live: 0,
            sampler: None,
        }
    }

    /// Instance id used in log events.
    #[must_use]
    pub const fn store_id(&self) -> StoreId {
        self.id
    }

    /// Limits this store enforces.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Number of live variables.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// True when no variable is live.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// The id the next registration will receive.
    #[must_use]
    pub const fn next_id(&self) -> VariableId {
        VariableId::from_raw(self.allocated)
    }

    /// Live variable ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.slots.iter().flatten().map(Variable::id)
    }

    /// Looks up a live variable.
    ///
    /// # Errors
    ///
    /// Returns `PseError::VariableUnknown` if `id` is not live.
    pub fn variable(&self, id: VariableId) -> PseResult<&Variable> {
        live(&self.slots, id)
    }

    /// The dependency recorded for `id`, if any.
    #[must_use]
    pub fn dependency(&self, id: VariableId) -> Option<&Dependency> {
        self.dependencies.get(&id)
    }

    fn require_initialized(&self) -> PseResult<()> {
        match self.state {
            LifecycleState::Initialized => Ok(()),
            LifecycleState::Created => Err(PseError::NotInitialized),
            LifecycleState::Started => Err(PseError::AlreadyStarted),
            LifecycleState::Finalized => Err(PseError::AlreadyFinalized),
        }
    }

    fn require_started(&self) -> PseResult<()> {
        match self.state {
            LifecycleState::Started => Ok(()),
            LifecycleState::Created => Err(PseError::NotInitialized),
            LifecycleState::Initialized => Err(PseError::NotStarted),
            LifecycleState::Finalized => Err(PseError::AlreadyFinalized),
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Initializes an empty store.
    ///
    /// # Errors
    ///
    /// `AlreadyInitialized`, `AlreadyStarted` or `AlreadyFinalized` when the
    /// store has left the Created state.
    pub fn init(&mut self) -> PseResult<()> {
        match self.state {
            LifecycleState::Created => {}
            LifecycleState::Initialized => return Err(PseError::AlreadyInitialized),
            LifecycleState::Started => return Err(PseError::AlreadyStarted),
            LifecycleState::Finalized => return Err(PseError::AlreadyFinalized),
        }

        self.slots.clear();
        self.dependencies.clear();
        self.allocated = 0;
        self.live = 0;
        self.sampler = None;
        self.state = LifecycleState::Initialized;
        debug!(store = %self.id, capacity = self.config.max_variables, "store initialized");
        Ok(())
    }

    /// Seeds the store's sampler from two integer seeds and starts it.
    ///
    /// # Errors
    ///
    /// `NotInitialized`, `AlreadyStarted` or `AlreadyFinalized` unless the
    /// store is Initialized.
    pub fn start(&mut self, seed_1: u64, seed_2: u64) -> PseResult<()> {
        match self.state {
            LifecycleState::Initialized => {}
            LifecycleState::Created => return Err(PseError::NotInitialized),
            LifecycleState::Started => return Err(PseError::AlreadyStarted),
            LifecycleState::Finalized => return Err(PseError::AlreadyFinalized),
        }

        self.sampler = Some(Sampler::from_seeds(seed_1, seed_2));
        self.state = LifecycleState::Started;
        debug!(store = %self.id, seed_1, seed_2, variables = self.live, "store started");
        Ok(())
    }

    /// Releases every variable and dependency. The store cannot be used
    /// again afterwards.
    ///
    /// # Errors
    ///
    /// `NotInitialized`, `NotStarted` or `AlreadyFinalized` unless the store
    /// is Started.
    pub fn finalize(&mut self) -> PseResult<()> {
        match self.state {
            LifecycleState::Started => {}
            LifecycleState::Created => return Err(PseError::NotInitialized),
            LifecycleState::Initialized => return Err(PseError::NotStarted),
            LifecycleState::Finalized => return Err(PseError::AlreadyFinalized),
        }

        let released: usize = self
            .slots
            .iter()
            .flatten()
            .map(|v| v.content().footprint())
            .sum();
        let variables = self.live;

        self.slots = Vec::new();
        self.dependencies.clear();
        self.live = 0;
        self.sampler = None;
        self.state = LifecycleState::Finalized;
        debug!(store = %self.id, variables, released_bytes = released, "store finalized");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Registers a variable and allocates its content.
    ///
    /// Numeric content starts at zero and strings start empty. Ids increase
    /// strictly and are never reused.
    ///
    /// # Errors
    ///
    /// - Lifecycle errors unless Initialized.
    /// - `TooManyVariables` at capacity.
    /// - `NameTooLong`, `InvalidArraySize`, `DistributionMismatch` for an
    ///   invalid declaration.
    pub fn register(&mut self, spec: VariableSpec) -> PseResult<VariableId> {
        self.require_initialized()?;

        let capacity = self.config.max_variables;
        if self.live >= capacity {
            return Err(PseError::TooManyVariables { capacity });
        }
        spec.validate(self.config.max_name_len)?;

        let id = self.next_id();
        let next = self
            .allocated
            .checked_add(1)
            .ok_or(PseError::TooManyVariables { capacity })?;

        if self.slots.len() <= id.index() {
            self.slots.resize_with(id.index() + 1, || None);
        }
        if self.slots[id.index()].is_some() {
            return Err(PseError::VariableAlreadyRegistered { id });
        }

        debug!(
            store = %self.id,
            variable = %id,
            name = %spec.name,
            storage = %spec.storage,
            model = ?spec.model,
            shape = ?spec.shape,
            "registered variable"
        );
        self.slots[id.index()] = Some(Variable::from_spec(id, spec, self.config.max_string_len));
        self.allocated = next;
        self.live += 1;
        Ok(id)
    }

    /// Removes a variable, its content and its dependency.
    ///
    /// # Errors
    ///
    /// Lifecycle errors unless Initialized; `VariableUnknown` if `id` is not
    /// live.
    pub fn deregister(&mut self, id: VariableId) -> PseResult<()> {
        self.require_initialized()?;
        live(&self.slots, id)?;

        self.slots[id.index()] = None;
        self.dependencies.remove(&id);
        self.live -= 1;
        debug!(store = %self.id, variable = %id, "deregistered variable");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Dependencies
    // ---------------------------------------------------------------------

    /// Declares that `id` is conditioned on `conditionals`.
    ///
    /// # Errors
    ///
    /// - Lifecycle errors unless Initialized.
    /// - `VariableUnknown` if `id` or any conditional is not live.
    /// - `DependencyAlreadyExists` if `id` already has one.
    /// - `DependencyNotWorld` if `id` or any conditional is agent-scoped.
    pub fn add_dependencies(
        &mut self,
        id: VariableId,
        conditionals: &[VariableId],
    ) -> PseResult<()> {
        self.require_initialized()?;

        let owner = live(&self.slots, id)?;
        if self.dependencies.contains_key(&id) {
            return Err(PseError::DependencyAlreadyExists { id });
        }
        if !owner.is_world() {
            return Err(PseError::DependencyNotWorld { id });
        }
        for &cond in conditionals {
            if !live(&self.slots, cond)?.is_world() {
                return Err(PseError::DependencyNotWorld { id: cond });
            }
        }

        live_mut(&mut self.slots, id)?.set_has_dependency(true);
        self.dependencies
            .insert(id, Dependency::new(id, conditionals.to_vec()));
        debug!(
            store = %self.id,
            variable = %id,
            conditionals = conditionals.len(),
            "added dependency"
        );
        Ok(())
    }

    /// Removes the dependency of `id`.
    ///
    /// # Errors
    ///
    /// Lifecycle errors unless Initialized; `VariableUnknown` if `id` is not
    /// live; `DependencyUnknown` if it has no dependency.
    pub fn remove_dependencies(&mut self, id: VariableId) -> PseResult<()> {
        self.require_initialized()?;
        let var = live_mut(&mut self.slots, id)?;
        if self.dependencies.remove(&id).is_none() {
            return Err(PseError::DependencyUnknown { id });
        }
        var.set_has_dependency(false);
        debug!(store = %self.id, variable = %id, "removed dependency");
        Ok(())
    }

    /// Attaches a prior model to the dependency of `id`.
    ///
    /// The model is recorded only; nothing evaluates it yet.
    ///
    /// # Errors
    ///
    /// Lifecycle errors unless Initialized; `VariableUnknown` if `id` is not
    /// live; `DependencyUnknown` if it has no dependency.
    pub fn supply_prior(&mut self, id: VariableId, prior: Arc<dyn PriorModel>) -> PseResult<()> {
        self.require_initialized()?;
        live(&self.slots, id)?;
        let dep = self
            .dependencies
            .get_mut(&id)
            .ok_or(PseError::DependencyUnknown { id })?;
        dep.set_prior(prior);
        debug!(store = %self.id, variable = %id, "supplied prior");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Prepare / observe
    // ---------------------------------------------------------------------

    /// Produces a copy of variable `id` to receive observations.
    ///
    /// # Errors
    ///
    /// Returns `PseError::VariableUnknown` if `id` is not live.
    pub fn template(&self, id: VariableId) -> PseResult<Variable> {
        live(&self.slots, id).cloned()
    }

    /// Writes `value` into element `index` of variable `id`.
    ///
    /// Scalars ignore `index`. After the write, a stochastic read-and-alter
    /// variable without dependency is immediately redrawn through its
    /// distribution from the written value, so callers cannot pin its state.
    /// Without read-and-alter the write stands as given. A dependent
    /// variable is only written.
    ///
    /// # Errors
    ///
    /// - Lifecycle errors unless Started.
    /// - `VariableUnknown`, `TypeMismatch`, `ArrayOutOfBounds`,
    ///   `StringTooLong`.
    /// - Sampling errors from the redraw; the written value is kept.
    pub fn prepare(&mut self, id: VariableId, value: Value, index: usize) -> PseResult<()> {
        self.require_started()?;
        let max_attempts = self.config.max_rejection_attempts;
        let var = live_mut(&mut self.slots, id)?;

        if value.storage() != var.storage() {
            return Err(PseError::TypeMismatch {
                id,
                expected: var.storage(),
                found: value.type_name().to_string(),
            });
        }
        var.set(index, value)?;

        if !var.is_stochastic() {
            return Ok(());
        }
        if var.has_dependency() {
            trace!(store = %self.id, variable = %id, "dependent variable written without conditioning");
            return Ok(());
        }

        let sampler = self.sampler.as_mut().ok_or(PseError::NotStarted)?;
        match randomize_and_alter(var, index, sampler, max_attempts) {
            Ok(drawn) => {
                trace!(store = %self.id, variable = %id, index, value = %drawn, "prepared and perturbed");
                Ok(())
            }
            Err(PseError::VariableIsImmutable { .. }) => {
                trace!(store = %self.id, variable = %id, index, "prepared");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Observes element `index` of variable `id` into `output`.
    ///
    /// `output` must have the layout of the variable, as produced by
    /// [`template`](Self::template). Deterministic variables are copied
    /// verbatim. Stochastic variables without dependency are drawn through
    /// their distribution into `output` at `index`; read-and-alter variables
    /// also keep the draw. Dependent stochastic variables are not sampled.
    ///
    /// # Errors
    ///
    /// - Lifecycle errors unless Started.
    /// - `VariableUnknown`, `TypeMismatch` (layout), `ArrayOutOfBounds`.
    /// - Sampling errors.
    pub fn observe(&mut self, id: VariableId, index: usize, output: &mut Variable) -> PseResult<()> {
        self.require_started()?;
        let max_attempts = self.config.max_rejection_attempts;
        let var = live_mut(&mut self.slots, id)?;
        var.ensure_same_layout(output)?;
        var.element_index(index)?;

        match var.model() {
            ModelKind::Deterministic => {
                output.replace_content(var.content().clone());
            }
            ModelKind::Stochastic if var.has_dependency() => {
                trace!(store = %self.id, variable = %id, "dependent variable observed without conditioning");
            }
            ModelKind::Stochastic => {
                let sampler = self.sampler.as_mut().ok_or(PseError::NotStarted)?;
                if var.read_and_alter() {
                    let drawn = randomize_and_alter(var, index, sampler, max_attempts)?;
                    output.set(index, drawn)?;
                } else {
                    randomize(output, var, index, sampler, max_attempts)?;
                }
            }
        }
        Ok(())
    }

    /// Observes element `index` of variable `id` and returns it.
    ///
    /// # Errors
    ///
    /// See [`observe`](Self::observe).
    pub fn observe_value(&mut self, id: VariableId, index: usize) -> PseResult<Value> {
        let mut output = self.template(id)?;
        self.observe(id, index, &mut output)?;
        output.get(index)
    }

    // ---------------------------------------------------------------------
    // Readers
    // ---------------------------------------------------------------------

    /// Reads the stored element `index` of variable `id` without sampling.
    ///
    /// # Errors
    ///
    /// `VariableUnknown` if `id` is not live; `ArrayOutOfBounds` for an array
    /// index past the end.
    pub fn read(&self, id: VariableId, index: usize) -> PseResult<Value> {
        live(&self.slots, id)?.get(index)
    }

    fn read_as<T>(
        &self,
        id: VariableId,
        index: usize,
        wanted: StorageKind,
        pick: impl FnOnce(Value) -> Option<T>,
    ) -> PseResult<T> {
        let var = live(&self.slots, id)?;
        let mismatch = PseError::TypeMismatch {
            id,
            expected: var.storage(),
            found: wanted.name().to_string(),
        };
        if var.storage() != wanted {
            return Err(mismatch);
        }
        pick(var.get(index)?).ok_or(mismatch)
    }

    /// Reads an int element.
    ///
    /// # Errors
    ///
    /// As [`read`](Self::read), plus `TypeMismatch` for other storage kinds.
    pub fn read_int(&self, id: VariableId, index: usize) -> PseResult<i64> {
        self.read_as(id, index, StorageKind::Int, |v| v.as_int())
    }

    /// Reads a double element.
    ///
    /// # Errors
    ///
    /// As [`read`](Self::read), plus `TypeMismatch` for other storage kinds.
    pub fn read_double(&self, id: VariableId, index: usize) -> PseResult<f64> {
        self.read_as(id, index, StorageKind::Double, |v| v.as_double())
    }

    /// Reads a string element.
    ///
    /// # Errors
    ///
    /// As [`read`](Self::read), plus `TypeMismatch` for other storage kinds.
    pub fn read_string(&self, id: VariableId, index: usize) -> PseResult<String> {
        self.read_as(id, index, StorageKind::String, |v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// Reads a time element.
    ///
    /// # Errors
    ///
    /// As [`read`](Self::read), plus `TypeMismatch` for other storage kinds.
    pub fn read_time(&self, id: VariableId, index: usize) -> PseResult<SimTime> {
        self.read_as(id, index, StorageKind::Time, |v| v.as_time())
    }
}
