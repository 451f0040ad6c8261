//! In-memory value containers.
//!
//! Data types never own a column, they are handed one by reference. Decoders build values up
//! in a scratch column (or a local buffer) and only touch the caller's column once everything
//! decoded, via [`Column::extend_from`] or a single push, so a failed decode never leaves a
//! partially appended value behind.

use std::any::Any;
use std::fmt::Debug;

use crate::error::TypeError;
use crate::field::Field;

mod array;
mod constant;
mod fixed_string;
mod null;
mod nullable;
mod string;
mod vector;

pub use array::ColumnArray;
pub use constant::ColumnConst;
pub use fixed_string::ColumnFixedString;
pub use null::ColumnNull;
pub use nullable::ColumnNullable;
pub use string::ColumnString;
pub use vector::{ColumnVector, Number};

pub type ColumnPtr = Box<dyn Column>;

pub trait Column: Debug + Send + Sync + 'static {
    /// Name of the concrete representation, used in error messages.
    fn family_name(&self) -> &'static str;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_const(&self) -> bool {
        false
    }

    /// # Panics
    /// If `row >= self.len()`
    fn get(&self, row: usize) -> Field;

    fn push_field(&mut self, field: &Field) -> Result<(), TypeError>;

    /// Append the zero value of this representation.
    fn push_default(&mut self);

    /// Append `len` rows of `src` starting at `start`. `src` must have the same representation
    /// as `self`.
    fn extend_from(&mut self, src: &dyn Column, start: usize, len: usize)
        -> Result<(), TypeError>;

    /// Remove the last `n` rows.
    fn pop(&mut self, n: usize);

    fn clone_empty(&self) -> ColumnPtr;

    fn clone_column(&self) -> ColumnPtr;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn fields(&self) -> Vec<Field> {
        (0..self.len()).map(|row| self.get(row)).collect()
    }
}

impl Clone for ColumnPtr {
    fn clone(&self) -> Self {
        self.clone_column()
    }
}

pub(crate) fn downcast<'a, C: Column>(
    src: &'a dyn Column,
    expected: &'static str,
) -> Result<&'a C, TypeError> {
    src.as_any()
        .downcast_ref::<C>()
        .ok_or_else(|| TypeError::illegal_column(src.family_name(), expected))
}

pub(crate) fn check_range(
    src: &dyn Column,
    start: usize,
    len: usize,
) -> Result<(), TypeError> {
    if start + len > src.len() {
        Err(TypeError::OffsetOutOfBounds {
            offset: start + len,
            len: src.len(),
        })
    } else {
        Ok(())
    }
}
