//! Applying distributions to variable content.
//!
//! Numeric and time content is redrawn one element at a time through the
//! point distribution. String content is mutated one byte at a time: the
//! array distribution picks a position, the point distribution picks the
//! replacement byte. Both string draws are rejection loops capped at
//! `max_attempts`.
//!
//! Array variables are only ever updated at the requested index, so a
//! single observation cannot disturb unrelated elements.

use crate::content::Content;
use crate::distribution::Distribution;
use crate::error::{PseError, PseResult, RejectionStage};
use crate::sampler::Sampler;
use crate::value::{SimTime, TextBuffer, Value};
use crate::variable::Variable;

/// Printable ASCII range accepted for a mutated byte.
pub const PRINTABLE: std::ops::RangeInclusive<u8> = 0x20..=0x7E;

fn pick_position(
    text: &TextBuffer,
    array: &Distribution,
    sampler: &mut Sampler,
    max_attempts: usize,
) -> PseResult<usize> {
    let bytes = text.as_bytes();
    #[allow(clippy::cast_precision_loss)]
    let midpoint = (bytes.len() / 2) as f64;

    for _ in 0..max_attempts {
        let drawn = sampler.sample_any(midpoint, &array.params, array.kind)?;
        if !drawn.is_finite() || drawn < 0.0 {
            continue;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pos = drawn.floor() as usize;
        if bytes.get(pos).is_some_and(u8::is_ascii) {
            return Ok(pos);
        }
    }
    Err(PseError::RejectionExhausted {
        stage: RejectionStage::Position,
        attempts: max_attempts,
    })
}

fn pick_byte(
    current: u8,
    point: &Distribution,
    sampler: &mut Sampler,
    max_attempts: usize,
) -> PseResult<u8> {
    for _ in 0..max_attempts {
        let drawn = sampler.sample_any(f64::from(current), &point.params, point.kind)?;
        if !drawn.is_finite() {
            continue;
        }
        let floored = drawn.floor();
        if floored >= f64::from(*PRINTABLE.start()) && floored <= f64::from(*PRINTABLE.end()) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let byte = floored as u8;
            return Ok(byte);
        }
    }
    Err(PseError::RejectionExhausted {
        stage: RejectionStage::Byte,
        attempts: max_attempts,
    })
}

/// Returns `text` with one byte resampled.
///
/// Empty text has nothing to mutate and is returned as is.
fn mutate_text(
    text: &TextBuffer,
    point: &Distribution,
    array: &Distribution,
    sampler: &mut Sampler,
    max_attempts: usize,
) -> PseResult<TextBuffer> {
    let mut out = text.clone();
    if text.is_empty() {
        return Ok(out);
    }
    let pos = pick_position(text, array, sampler, max_attempts)?;
    let byte = pick_byte(text.as_bytes()[pos], point, sampler, max_attempts)?;
    out.replace_ascii(pos, byte);
    Ok(out)
}

/// Content holding a single freshly drawn element, tagged with its storage.
enum Draw {
    Int(i64),
    Double(f64),
    Time(SimTime),
    Text(TextBuffer),
}

fn draw(
    source: &Variable,
    index: usize,
    sampler: &mut Sampler,
    max_attempts: usize,
) -> PseResult<Draw> {
    let index = source.element_index(index)?;
    let point = source.point_distribution();
    let missing = || PseError::ArrayOutOfBounds {
        id: source.id(),
        index,
        size: source.size(),
    };

    match source.content() {
        Content::Int(cells) => {
            let current = *cells.get(index).ok_or_else(missing)?;
            Ok(Draw::Int(sampler.sample_int(current, &point.params, point.kind)?))
        }
        Content::Double(cells) => {
            let current = *cells.get(index).ok_or_else(missing)?;
            Ok(Draw::Double(sampler.sample_double(current, &point.params, point.kind)?))
        }
        Content::Time(cells) => {
            let current = cells.get(index).ok_or_else(missing)?.as_f64();
            let next = sampler.sample_double(current, &point.params, point.kind)?;
            Ok(Draw::Time(SimTime(next)))
        }
        Content::String(cells) => {
            let current = cells.get(index).ok_or_else(missing)?;
            let next = mutate_text(
                current,
                point,
                source.array_distribution(),
                sampler,
                max_attempts,
            )?;
            Ok(Draw::Text(next))
        }
    }
}

fn store(target: &mut Variable, index: usize, drawn: Draw) -> PseResult<Value> {
    let index = target.element_index(index)?;
    let (id, storage, size) = (target.id(), target.storage(), target.size());
    let mismatch = |found: &str| PseError::TypeMismatch {
        id,
        expected: storage,
        found: found.to_string(),
    };
    let missing = PseError::ArrayOutOfBounds { id, index, size };

    match (target.content_mut(), drawn) {
        (Content::Int(cells), Draw::Int(v)) => {
            *cells.get_mut(index).ok_or(missing)? = v;
            Ok(Value::Int(v))
        }
        (Content::Double(cells), Draw::Double(v)) => {
            *cells.get_mut(index).ok_or(missing)? = v;
            Ok(Value::Double(v))
        }
        (Content::Time(cells), Draw::Time(v)) => {
            *cells.get_mut(index).ok_or(missing)? = v;
            Ok(Value::Time(v))
        }
        (Content::String(cells), Draw::Text(v)) => {
            let value = Value::String(v.to_text());
            *cells.get_mut(index).ok_or(missing)? = v;
            Ok(value)
        }
        (content, _) => Err(mismatch(content.storage().name())),
    }
}

/// Draws element `index` of `source` through its distributions into the
/// same element of `target`, leaving `source` untouched.
///
/// Scalars ignore `index`. `target` must have the layout of `source`.
///
/// # Errors
///
/// - `ArrayOutOfBounds` if `index` is past the end of an array.
/// - `TypeMismatch` if `target` has a different storage or shape.
/// - Sampling errors (`InvalidParameters`, `RejectionExhausted`, ...).
pub fn randomize(
    target: &mut Variable,
    source: &Variable,
    index: usize,
    sampler: &mut Sampler,
    max_attempts: usize,
) -> PseResult<Value> {
    source.ensure_same_layout(target)?;
    let drawn = draw(source, index, sampler, max_attempts)?;
    store(target, index, drawn)
}

/// Like [`randomize`], but writes the draw back into `source` itself.
///
/// Returns the drawn element so callers can mirror it into an output.
///
/// # Errors
///
/// - `VariableIsImmutable` unless `source` is read-and-alter; nothing is
///   drawn in that case.
/// - Everything [`randomize`] reports.
pub fn randomize_and_alter(
    source: &mut Variable,
    index: usize,
    sampler: &mut Sampler,
    max_attempts: usize,
) -> PseResult<Value> {
    if !source.read_and_alter() {
        return Err(PseError::VariableIsImmutable { id: source.id() });
    }
    let drawn = draw(source, index, sampler, max_attempts)?;
    store(source, index, drawn)
}
