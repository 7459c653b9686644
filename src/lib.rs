//! # PSE - Per-agent Stochastic variable Engine
//!
//! PSE holds the state variables of one simulated agent and makes them
//! uncertain. Each variable is either deterministic (read back exactly as
//! written) or stochastic (every observation is a draw from a configured
//! probability distribution, optionally conditioned on the variable's own
//! current value).
//!
//! ## Core Concepts
//!
//! - **VariableStore**: owns one agent's variables and walks the
//!   Created → Initialized → Started → Finalized lifecycle
//! - **Variable**: typed, owned content (int, double, string, time; scalar or
//!   fixed-size array) plus its sampling configuration
//! - **Distribution**: one of a closed set of integer and real distributions
//!   with up to five parameters
//! - **Dependency**: a recorded conditioning of a world variable on other
//!   world variables
//! - **ErrorReporter**: renders results into fixed-template diagnostics
//!
//! ## Usage
//!
//! ```rust
//! use pse::{Distribution, DistributionKind, StorageKind, Value, VariableSpec, VariableStore};
//!
//! let mut store = VariableStore::new();
//! store.init()?;
//!
//! let hunger = store.register(
//!     VariableSpec::new("hunger", StorageKind::Int)
//!         .stochastic(Distribution::with(DistributionKind::PoissonSelf, &[]))
//!         .read_and_alter(true),
//! )?;
//! let home = store.register(VariableSpec::new("home", StorageKind::String))?;
//!
//! store.start(7, 11)?;
//! store.prepare(home, Value::from("harbour"), 0)?;
//! store.prepare(hunger, Value::Int(4), 0)?;
//!
//! assert_eq!(store.read_string(home, 0)?, "harbour");
//! let _noisy = store.observe_value(hunger, 0)?;
//!
//! store.finalize()?;
//! # Ok::<(), pse::PseError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Data model
pub mod config;
pub mod content;
pub mod distribution;
pub mod error;
pub mod value;
pub mod variable;

// Sampling
pub mod randomize;
pub mod sampler;

// Store and diagnostics
pub mod dependency;
pub mod report;
pub mod store;

pub use config::StoreConfig;
pub use content::{Cells, Content};
pub use dependency::{Dependency, PriorModel};
pub use distribution::{Distribution, DistributionKind, Domain, Params, MAX_DIST_PARAMS};
pub use error::{PseError, PseResult, RejectionStage, OK_CODE};
pub use randomize::{randomize, randomize_and_alter, PRINTABLE};
pub use report::{Diagnostic, ErrorReporter};
pub use sampler::Sampler;
pub use store::{LifecycleState, StoreId, VariableStore};
pub use value::{SimTime, TextBuffer, Value};
pub use variable::{Locality, ModelKind, Shape, StorageKind, Variable, VariableId, VariableSpec};
