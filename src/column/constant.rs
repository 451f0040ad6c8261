use std::any::Any;

use super::{Column, ColumnPtr};
use crate::error::TypeError;
use crate::field::Field;

/// One value logically repeated `len` times. `data` always holds exactly one row.
#[derive(Debug, Clone)]
pub struct ColumnConst {
    data: ColumnPtr,
    len: usize,
}

impl ColumnConst {
    pub fn new(data: ColumnPtr, len: usize) -> Result<Self, TypeError> {
        if data.len() != 1 {
            return Err(TypeError::illegal_column(
                data.family_name(),
                "a constant (expected exactly one row)",
            ));
        }
        Ok(Self { data, len })
    }

    pub fn data(&self) -> &dyn Column {
        self.data.as_ref()
    }

    pub fn value(&self) -> Field {
        self.data.get(0)
    }

    /// Materialize `len` copies of the value.
    pub fn convert_to_full_column(&self) -> Result<ColumnPtr, TypeError> {
        let mut full = self.data.clone_empty();
        for _ in 0..self.len {
            full.extend_from(self.data.as_ref(), 0, 1)?;
        }
        Ok(full)
    }
}

impl Column for ColumnConst {
    fn family_name(&self) -> &'static str {
        "ColumnConst"
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_const(&self) -> bool {
        true
    }

    fn get(&self, row: usize) -> Field {
        assert!(row < self.len, "row {} out of bounds for {}", row, self.len);
        self.data.get(0)
    }

    fn push_field(&mut self, field: &Field) -> Result<(), TypeError> {
        if *field == self.value() {
            self.len += 1;
            Ok(())
        } else {
            Err(TypeError::illegal_column(
                self.family_name(),
                format!("a constant of {}", self.value()),
            ))
        }
    }

    /// Grows only when the nested column's default equals the constant; any other value cannot
    /// be held and the column is left as it was.
    fn push_default(&mut self) {
        let mut default = self.data.clone_empty();
        default.push_default();
        if default.get(0) == self.value() {
            self.len += 1;
        }
    }

    fn extend_from(
        &mut self,
        src: &dyn Column,
        start: usize,
        len: usize,
    ) -> Result<(), TypeError> {
        let same = src
            .as_any()
            .downcast_ref::<Self>()
            .map(|other| other.value() == self.value())
            .unwrap_or(false);
        if !same {
            return Err(TypeError::illegal_column(
                src.family_name(),
                format!("a constant of {}", self.value()),
            ));
        }
        super::check_range(src, start, len)?;
        self.len += len;
        Ok(())
    }

    fn pop(&mut self, n: usize) {
        self.len = self.len.saturating_sub(n);
    }

    fn clone_empty(&self) -> ColumnPtr {
        Box::new(Self {
            data: self.data.clone(),
            len: 0,
        })
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
    use crate::column::ColumnVector;

    #[test]
    fn materializes_the_value() {
        let one: ColumnPtr = Box::new(ColumnVector::<u32>::from(vec![7]));
        let col = ColumnConst::new(one, 3).unwrap();
        assert!(col.is_const());
        assert_eq!(col.get(2), Field::UInt64(7));
        let full = col.convert_to_full_column().unwrap();
        assert!(!full.is_const());
        assert_eq!(full.fields(), vec![Field::UInt64(7); 3]);
    }

    #[test]
    fn push_default_only_repeats_a_default_constant() {
        let seven: ColumnPtr = Box::new(ColumnVector::<u32>::from(vec![7]));
        let mut col = ColumnConst::new(seven, 2).unwrap();
        col.push_default();
        assert_eq!(col.len(), 2);

        let zero: ColumnPtr = Box::new(ColumnVector::<u32>::from(vec![0]));
        let mut col = ColumnConst::new(zero, 2).unwrap();
        col.push_default();
        assert_eq!(col.len(), 3);
        assert_eq!(col.get(2), Field::UInt64(0));
    }

    #[test]
    fn needs_exactly_one_row() {
        let two: ColumnPtr = Box::new(ColumnVector::<u32>::from(vec![7, 8]));
        assert!(ColumnConst::new(two, 3).is_err());
    }
}
