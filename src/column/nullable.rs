use std::any::Any;

use super::{check_range, downcast, Column, ColumnPtr};
use crate::error::TypeError;
use crate::field::Field;

/// A nested column plus a null map (`1` marks a NULL row). NULL rows still hold a default value
/// in the nested column so that both stay the same length.
#[derive(Debug, Clone)]
pub struct ColumnNullable {
    nested: ColumnPtr,
    null_map: Vec<u8>,
}

impl ColumnNullable {
    pub fn new(nested: ColumnPtr) -> Self {
        debug_assert!(nested.is_empty());
        Self {
            nested,
            null_map: Vec::new(),
        }
    }

    pub fn nested(&self) -> &dyn Column {
        self.nested.as_ref()
    }

    pub fn null_map(&self) -> &[u8] {
        &self.null_map
    }

    pub fn is_null_at(&self, row: usize) -> bool {
        self.null_map[row] != 0
    }

    pub(crate) fn nested_mut(&mut self) -> &mut dyn Column {
        self.nested.as_mut()
    }

    /// Flag rows whose nested values were already appended through
    /// [`ColumnNullable::nested_mut`].
    pub(crate) fn push_null_map(&mut self, null_map: &[u8]) {
        self.null_map.extend_from_slice(null_map);
        debug_assert_eq!(self.null_map.len(), self.nested.len());
    }
}

impl Column for ColumnNullable {
    fn family_name(&self) -> &'static str {
        "ColumnNullable"
    }

    fn len(&self) -> usize {
        self.null_map.len()
    }

    fn get(&self, row: usize) -> Field {
        if self.is_null_at(row) {
            Field::Null
        } else {
            self.nested.get(row)
        }
    }

    fn push_field(&mut self, field: &Field) -> Result<(), TypeError> {
        if field.is_null() {
            self.nested.push_default();
            self.null_map.push(1);
        } else {
            self.nested.push_field(field)?;
            self.null_map.push(0);
        }
        Ok(())
    }

    fn push_default(&mut self) {
        self.nested.push_default();
        self.null_map.push(1);
    }

    fn extend_from(
        &mut self,
        src: &dyn Column,
        start: usize,
        len: usize,
    ) -> Result<(), TypeError> {
        let src = downcast::<Self>(src, self.family_name())?;
        check_range(src, start, len)?;
        self.nested.extend_from(src.nested(), start, len)?;
        self.null_map
            .extend_from_slice(&src.null_map[start..start + len]);
        Ok(())
    }

    fn pop(&mut self, n: usize) {
        let n = n.min(self.null_map.len());
        self.nested.pop(n);
        self.null_map.truncate(self.null_map.len() - n);
    }

    fn clone_empty(&self) -> ColumnPtr {
        Box::new(Self::new(self.nested.clone_empty()))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnString;

    #[test]
    fn null_rows_keep_a_nested_slot() {
        let mut col = ColumnNullable::new(Box::new(ColumnString::new()));
        col.push_field(&Field::from("a")).unwrap();
        col.push_field(&Field::Null).unwrap();
        assert_eq!(col.nested().len(), 2);
        assert_eq!(col.fields(), vec![Field::from("a"), Field::Null]);
        assert!(col.push_field(&Field::UInt64(1)).is_err());
        assert_eq!(col.len(), 2);
    }
}
