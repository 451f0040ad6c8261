use std::any::Any;

use super::{check_range, downcast, Column, ColumnPtr};
use crate::error::TypeError;
use crate::field::Field;

/// Rows of the bare `Null` type. Only the row count is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnNull {
    len: usize,
}

impl ColumnNull {
    pub fn new(len: usize) -> Self {
        Self { len }
    }

    pub(crate) fn extend(&mut self, rows: usize) {
        self.len += rows;
    }
}

impl Column for ColumnNull {
    fn family_name(&self) -> &'static str {
        "ColumnNull"
    }

    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, row: usize) -> Field {
        assert!(row < self.len, "row {} out of bounds for {}", row, self.len);
        Field::Null
    }

    fn push_field(&mut self, field: &Field) -> Result<(), TypeError> {
        if field.is_null() {
            self.len += 1;
            Ok(())
        } else {
            Err(TypeError::type_mismatch("Null", field.type_name()))
        }
    }

    fn push_default(&mut self) {
        self.len += 1;
    }

    fn extend_from(
        &mut self,
        src: &dyn Column,
        start: usize,
        len: usize,
    ) -> Result<(), TypeError> {
        let src = downcast::<Self>(src, self.family_name())?;
        check_range(src, start, len)?;
        self.len += len;
        Ok(())
    }

    fn pop(&mut self, n: usize) {
        self.len = self.len.saturating_sub(n);
    }

    fn clone_empty(&self) -> ColumnPtr {
        Box::new(Self::default())
    }

    fn clone_column(&self) -> ColumnPtr {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
