//! Owned variable content.
//!
//! Content is a sum over the four storage kinds, each either a single
//! scalar or a fixed-size owned array. The size is fixed at allocation;
//! nothing in the crate resizes it. Dropping the content releases every
//! buffer, strings included.

use crate::value::{SimTime, TextBuffer, Value};
use crate::variable::{Shape, StorageKind};

/// Scalar or fixed-size array of `T`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cells<T> {
    Scalar(T),
    Array(Box<[T]>),
}

impl<T> Cells<T> {
    fn allocate(shape: Shape, mut make: impl FnMut() -> T) -> Self {
        match shape {
            Shape::Scalar => Self::Scalar(make()),
            Shape::Array(size) => Self::Array((0..size).map(|_| make()).collect()),
        }
    }

    /// Number of elements (1 for scalars).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Array(items) => items.len(),
        }
    }

    /// Always false: content holds at least one element.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`; scalars ignore the index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Array(items) => items.get(index),
        }
    }

    /// Mutable element at `index`; scalars ignore the index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Array(items) => items.get_mut(index),
        }
    }

    /// Iterates over every element.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Self::Scalar(v) => std::slice::from_ref(v).iter(),
            Self::Array(items) => items.iter(),
        }
    }
}

/// Content of one variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Int(Cells<i64>),
    Double(Cells<f64>),
    String(Cells<TextBuffer>),
    Time(Cells<SimTime>),
}

impl Content {
    /// Allocates zeroed content for `storage` × `shape`. Each string element
    /// gets its own buffer of `text_limit` bytes.
    #[must_use]
    pub fn allocate(storage: StorageKind, shape: Shape, text_limit: usize) -> Self {
        match storage {
            StorageKind::Int => Self::Int(Cells::allocate(shape, || 0)),
            StorageKind::Double => Self::Double(Cells::allocate(shape, || 0.0)),
            StorageKind::String => {
                Self::String(Cells::allocate(shape, || TextBuffer::with_limit(text_limit)))
            }
            StorageKind::Time => Self::Time(Cells::allocate(shape, SimTime::default)),
        }
    }

    /// Storage kind of this content.
    #[must_use]
    pub const fn storage(&self) -> StorageKind {
        match self {
            Self::Int(_) => StorageKind::Int,
            Self::Double(_) => StorageKind::Double,
            Self::String(_) => StorageKind::String,
            Self::Time(_) => StorageKind::Time,
        }
    }

    /// Number of elements (1 for scalars).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int(c) => c.len(),
            Self::Double(c) => c.len(),
            Self::String(c) => c.len(),
            Self::Time(c) => c.len(),
        }
    }

    /// Always false: content holds at least one element.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the element at `index` out as a `Value`.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<Value> {
        match self {
            Self::Int(c) => c.get(index).map(|v| Value::Int(*v)),
            Self::Double(c) => c.get(index).map(|v| Value::Double(*v)),
            Self::String(c) => c.get(index).map(|v| Value::String(v.to_text())),
            Self::Time(c) => c.get(index).map(|v| Value::Time(*v)),
        }
    }

    /// Total bytes of element storage held (string buffers at full length).
    #[must_use]
    pub fn footprint(&self) -> usize {
        match self {
            Self::Int(c) => c.len() * std::mem::size_of::<i64>(),
            Self::Double(c) => c.len() * std::mem::size_of::<f64>(),
            Self::String(c) => c.iter().map(TextBuffer::limit).sum(),
            Self::Time(c) => c.len() * std::mem::size_of::<SimTime>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_scalar_and_array() {
        let c = Content::allocate(StorageKind::Double, Shape::Scalar, 10);
        assert_eq!(c.len(), 1);
        assert_eq!(c.value_at(99), Some(Value::Double(0.0)));

        let c = Content::allocate(StorageKind::Int, Shape::Array(5), 10);
        assert_eq!(c.len(), 5);
        assert_eq!(c.value_at(4), Some(Value::Int(0)));
        assert_eq!(c.value_at(5), None);
    }

    #[test]
    fn test_string_array_has_independent_buffers() {
        let mut c = Content::allocate(StorageKind::String, Shape::Array(3), 8);
        if let Content::String(cells) = &mut c {
            cells.get_mut(1).unwrap().set("mid").unwrap();
        }
        assert_eq!(c.value_at(0), Some(Value::String(String::new())));
        assert_eq!(c.value_at(1), Some(Value::String("mid".to_string())));
        assert_eq!(c.footprint(), 24);
    }

    #[test]
    fn test_footprint_numeric() {
        let c = Content::allocate(StorageKind::Time, Shape::Array(4), 8);
        assert_eq!(c.footprint(), 32);
        assert_eq!(c.storage(), StorageKind::Time);
    }
}
