//! Variable declarations and records.
//!
//! A variable is one typed observable owned by a store: its storage kind,
//! whether it is stochastic, whether it is agent-private or world-scoped, its
//! shape, and the distributions that drive it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::content::Content;
use crate::distribution::{Distribution, Domain};
use crate::error::{PseError, PseResult};
use crate::randomize::PRINTABLE;
use crate::value::Value;

/// Dense per-store variable identifier.
///
/// Ids are handed out by an allocation counter that only grows, so an id is
/// never reused within a store, even after the variable is deregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(u32);

impl VariableId {
    /// Wraps a raw id. Only meaningful for ids issued by a store.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw id value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a variable stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Int,
    Double,
    String,
    Time,
}

impl StorageKind {
    /// Domain of the point distribution; strings accept either.
    #[must_use]
    pub const fn domain(self) -> Option<Domain> {
        match self {
            Self::Int => Some(Domain::Integer),
            Self::Double | Self::Time => Some(Domain::Real),
            Self::String => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Double => "double",
            Self::String => "string",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StorageKind {
    type Err = PseError;

    fn from_str(s: &str) -> PseResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" => Ok(Self::Int),
            "double" => Ok(Self::Double),
            "string" => Ok(Self::String),
            "time" => Ok(Self::Time),
            _ => Err(PseError::TypeUnknown { name: s.to_string() }),
        }
    }
}

/// Whether observation reflects a distribution or the stored value verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Stochastic,
    Deterministic,
}

/// Agent-private or shared world state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locality {
    Agent,
    World,
}

/// Scalar or fixed-size array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Scalar,
    Array(usize),
}

impl Shape {
    /// Number of elements (1 for scalars).
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Array(size) => size,
        }
    }

    /// Returns true for a zero-sized array, which registration rejects.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn is_array(self) -> bool {
        matches!(self, Self::Array(_))
    }
}

/// Registration request for a variable.
///
/// Defaults to a deterministic, agent-scoped scalar with no distributions.
///
/// # Examples
///
/// ```
/// use pse::{Distribution, DistributionKind, StorageKind, VariableSpec};
///
/// let spec = VariableSpec::new("distance", StorageKind::Double)
///     .stochastic(Distribution::with(DistributionKind::NormalSelf, &[2.3]))
///     .read_and_alter(true);
/// assert!(spec.read_and_alter);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Variable name, copied into the record.
    pub name: String,
    pub storage: StorageKind,
    pub model: ModelKind,
    pub locality: Locality,
    /// How the value at a point varies.
    pub point: Distribution,
    pub shape: Shape,
    /// Observation destructively resamples the stored value.
    pub read_and_alter: bool,
    /// For string content: which byte position a point draw alters.
    pub array: Distribution,
}

impl VariableSpec {
    /// Starts a deterministic agent-scoped scalar declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, storage: StorageKind) -> Self {
        Self {
            name: name.into(),
            storage,
            model: ModelKind::Deterministic,
            locality: Locality::Agent,
            point: Distribution::none(),
            shape: Shape::Scalar,
            read_and_alter: false,
            array: Distribution::none(),
        }
    }

    /// Marks the variable stochastic with the given point distribution.
    #[must_use]
    pub fn stochastic(mut self, point: Distribution) -> Self {
        self.model = ModelKind::Stochastic;
        self.point = point;
        self
    }

    #[must_use]
    pub fn deterministic(mut self) -> Self {
        self.model = ModelKind::Deterministic;
        self
    }

    #[must_use]
    pub fn locality(mut self, locality: Locality) -> Self {
        self.locality = locality;
        self
    }

    #[must_use]
    pub fn world(self) -> Self {
        self.locality(Locality::World)
    }

    #[must_use]
    pub fn array(mut self, size: usize) -> Self {
        self.shape = Shape::Array(size);
        self
    }

    /// Distribution picking the byte position of a string mutation.
    #[must_use]
    pub fn array_distribution(mut self, array: Distribution) -> Self {
        self.array = array;
        self
    }

    #[must_use]
    pub fn read_and_alter(mut self, read_and_alter: bool) -> Self {
        self.read_and_alter = read_and_alter;
        self
    }

    pub(crate) fn validate(&self, max_name_len: usize) -> PseResult<()> {
        if self.name.len() > max_name_len {
            return Err(PseError::NameTooLong {
                len: self.name.len(),
                max: max_name_len,
            });
        }
        if self.shape.is_empty() {
            return Err(PseError::InvalidArraySize { size: 0 });
        }
        if let Some(domain) = self.storage.domain() {
            if !self.point.kind.supports(domain) {
                return Err(PseError::DistributionMismatch {
                    kind: self.point.kind,
                    domain,
                });
            }
        }
        Ok(())
    }
}

fn ensure_printable(id: VariableId, text: &str) -> PseResult<()> {
    match text
        .bytes()
        .enumerate()
        .find(|(_, b)| !PRINTABLE.contains(b))
    {
        Some((position, byte)) => Err(PseError::TextNotPrintable { id, position, byte }),
        None => Ok(()),
    }
}

/// A registered variable and its owned content.
///
/// Records are created by [`VariableStore::register`](crate::VariableStore::register);
/// [`VariableStore::template`](crate::VariableStore::template) hands out copies
/// that serve as observation outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    id: VariableId,
    name: String,
    storage: StorageKind,
    model: ModelKind,
    locality: Locality,
    point: Distribution,
    array: Distribution,
    shape: Shape,
    read_and_alter: bool,
    has_dependency: bool,
    content: Content,
}

impl Variable {
    pub(crate) fn from_spec(id: VariableId, spec: VariableSpec, text_limit: usize) -> Self {
        // Position distributions only apply to array content.
        let array = if spec.shape.is_array() {
            spec.array
        } else {
            Distribution::none()
        };
        Self {
            id,
            content: Content::allocate(spec.storage, spec.shape, text_limit),
            name: spec.name,
            storage: spec.storage,
            model: spec.model,
            locality: spec.locality,
            point: spec.point,
            array,
            shape: spec.shape,
            read_and_alter: spec.read_and_alter,
            has_dependency: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> VariableId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn storage(&self) -> StorageKind {
        self.storage
    }

    #[must_use]
    pub const fn model(&self) -> ModelKind {
        self.model
    }

    #[must_use]
    pub const fn locality(&self) -> Locality {
        self.locality
    }

    #[must_use]
    pub const fn is_world(&self) -> bool {
        matches!(self.locality, Locality::World)
    }

    #[must_use]
    pub const fn is_stochastic(&self) -> bool {
        matches!(self.model, ModelKind::Stochastic)
    }

    #[must_use]
    pub const fn point_distribution(&self) -> &Distribution {
        &self.point
    }

    #[must_use]
    pub const fn array_distribution(&self) -> &Distribution {
        &self.array
    }

    #[must_use]
    pub const fn read_and_alter(&self) -> bool {
        self.read_and_alter
    }

    #[must_use]
    pub const fn has_dependency(&self) -> bool {
        self.has_dependency
    }

    pub(crate) fn set_has_dependency(&mut self, flag: bool) {
        self.has_dependency = flag;
    }

    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// Number of elements (1 for scalars).
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub const fn content(&self) -> &Content {
        &self.content
    }

    pub(crate) fn content_mut(&mut self) -> &mut Content {
        &mut self.content
    }

    pub(crate) fn replace_content(&mut self, content: Content) {
        self.content = content;
    }

    /// Resolves the element index: scalars ignore it, arrays bound-check it.
    ///
    /// # Errors
    ///
    /// Returns `PseError::ArrayOutOfBounds` for an array index past the end.
    pub fn element_index(&self, index: usize) -> PseResult<usize> {
        match self.shape() {
            Shape::Scalar => Ok(0),
            Shape::Array(size) if index < size => Ok(index),
            Shape::Array(size) => Err(PseError::ArrayOutOfBounds {
                id: self.id,
                index,
                size,
            }),
        }
    }

    /// Reads one element.
    ///
    /// # Errors
    ///
    /// Returns `PseError::ArrayOutOfBounds` for an array index past the end.
    pub fn get(&self, index: usize) -> PseResult<Value> {
        let index = self.element_index(index)?;
        self.content
            .value_at(index)
            .ok_or(PseError::ArrayOutOfBounds {
                id: self.id,
                index,
                size: self.size(),
            })
    }

    /// Overwrites one element.
    ///
    /// Stochastic strings only accept printable ASCII, the alphabet the
    /// mutation sampler works in.
    pub(crate) fn set(&mut self, index: usize, value: Value) -> PseResult<()> {
        let index = self.element_index(index)?;
        let (id, storage, model) = (self.id, self.storage, self.model);
        let out_of_bounds = PseError::ArrayOutOfBounds {
            id,
            index,
            size: self.size(),
        };

        match (&mut self.content, value) {
            (Content::Int(cells), Value::Int(v)) => {
                *cells.get_mut(index).ok_or(out_of_bounds)? = v;
            }
            (Content::Double(cells), Value::Double(v)) => {
                *cells.get_mut(index).ok_or(out_of_bounds)? = v;
            }
            (Content::Time(cells), Value::Time(v)) => {
                *cells.get_mut(index).ok_or(out_of_bounds)? = v;
            }
            (Content::String(cells), Value::String(v)) => {
                if model == ModelKind::Stochastic {
                    ensure_printable(id, &v)?;
                }
                cells.get_mut(index).ok_or(out_of_bounds)?.set(&v)?;
            }
            (_, other) => {
                return Err(PseError::TypeMismatch {
                    id,
                    expected: storage,
                    found: other.type_name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Checks that `other` can receive observations of this variable.
    pub(crate) fn ensure_same_layout(&self, other: &Self) -> PseResult<()> {
        if other.storage != self.storage || other.shape() != self.shape() {
            return Err(PseError::TypeMismatch {
                id: self.id,
                expected: self.storage,
                found: format!("{} {:?}", other.storage, other.shape()),
            });
        }
        Ok(())
    }
}
