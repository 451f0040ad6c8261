use std::any::Any;

use super::{check_range, downcast, Column, ColumnPtr};
use crate::error::TypeError;
use crate::field::Field;

/// Arrays flattened into one `data` column; `offsets[i]` is the end of row `i` in `data`.
#[derive(Debug, Clone)]
pub struct ColumnArray {
    offsets: Vec<usize>,
    data: ColumnPtr,
}

impl ColumnArray {
    pub fn new(data: ColumnPtr) -> Self {
        debug_assert!(data.is_empty());
        Self {
            offsets: Vec::new(),
            data,
        }
    }

    /// Build from an already populated `data` column and the end offset of every row.
    ///
    /// # Errors
    /// If the offsets are not monotonic or do not end at `data.len()`
    pub fn from_parts(data: ColumnPtr, offsets: Vec<usize>) -> Result<Self, TypeError> {
        let monotonic = offsets.windows(2).all(|w| w[0] <= w[1]);
        let end = offsets.last().copied().unwrap_or(0);
        if !monotonic || end != data.len() {
            return Err(TypeError::illegal_column("ColumnArray", "Array"));
        }
        Ok(Self { offsets, data })
    }

    pub fn data(&self) -> &dyn Column {
        self.data.as_ref()
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Index into `data` of the first element of `row`.
    pub fn offset_at(&self, row: usize) -> usize {
        if row == 0 {
            0
        } else {
            self.offsets[row - 1]
        }
    }

    pub fn size_at(&self, row: usize) -> usize {
        self.offsets[row] - self.offset_at(row)
    }

    pub(crate) fn data_mut(&mut self) -> &mut dyn Column {
        self.data.as_mut()
    }

    /// Close rows over elements which were already appended to `data` through
    /// [`ColumnArray::data_mut`].
    pub(crate) fn push_sizes(&mut self, sizes: &[usize]) {
        let mut end = self.offset_at(self.offsets.len());
        for size in sizes {
            end += size;
            self.offsets.push(end);
        }
        debug_assert_eq!(end, self.data.len());
    }
}

impl Column for ColumnArray {
    fn family_name(&self) -> &'static str {
        "ColumnArray"
    }

    fn len(&self) -> usize {
        self.offsets.len()
    }

    fn get(&self, row: usize) -> Field {
        let start = self.offset_at(row);
        let items = (start..self.offsets[row])
            .map(|index| self.data.get(index))
            .collect();
        Field::Array(items)
    }

    fn push_field(&mut self, field: &Field) -> Result<(), TypeError> {
        let items = match field {
            Field::Array(items) => items,
            other => return Err(TypeError::type_mismatch("Array", other.type_name())),
        };
        for (pushed, item) in items.iter().enumerate() {
            if let Err(e) = self.data.push_field(item) {
                self.data.pop(pushed);
                return Err(e);
            }
        }
        self.offsets.push(self.data.len());
        Ok(())
    }

    fn push_default(&mut self) {
        self.offsets.push(self.data.len())
    }

    fn extend_from(
        &mut self,
        src: &dyn Column,
        start: usize,
        len: usize,
    ) -> Result<(), TypeError> {
        let src = downcast::<Self>(src, self.family_name())?;
        check_range(src, start, len)?;
        if len == 0 {
            return Ok(());
        }
        let from = src.offset_at(start);
        let to = src.offsets[start + len - 1];
        self.data.extend_from(src.data(), from, to - from)?;
        let base = self.offset_at(self.offsets.len());
        self.offsets.extend(
            src.offsets[start..start + len]
                .iter()
                .map(|end| end - from + base),
        );
        Ok(())
    }

    fn pop(&mut self, n: usize) {
        let rows = self.offsets.len().saturating_sub(n);
        self.offsets.truncate(rows);
        let end = self.offsets.last().copied().unwrap_or(0);
        let extra = self.data.len() - end;
        self.data.pop(extra);
    }

    fn clone_empty(&self) -> ColumnPtr {
        Box::new(Self::new(self.data.clone_empty()))
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

    fn arrays(rows: &[&[u8]]) -> ColumnArray {
        let mut col = ColumnArray::new(Box::new(ColumnVector::<u8>::new()));
        for row in rows {
            let items = row.iter().map(|v| Field::UInt64(*v as u64)).collect();
            col.push_field(&Field::Array(items)).unwrap();
        }
        col
    }

    #[test]
    fn failed_push_leaves_column_unchanged() {
        let mut col = arrays(&[&[1, 2]]);
        let bad = Field::Array(vec![Field::UInt64(3), Field::UInt64(1000)]);
        assert!(col.push_field(&bad).is_err());
        assert_eq!(col.len(), 1);
        assert_eq!(col.data().len(), 2);
    }

    #[test]
    fn extend_from_slices_elements() {
        let src = arrays(&[&[1, 2], &[], &[3], &[4, 5, 6]]);
        let mut dst = arrays(&[&[9]]);
        dst.extend_from(&src, 1, 2).unwrap();
        assert_eq!(dst.offsets(), &[1, 1, 2]);
        assert_eq!(
            dst.get(2),
            Field::Array(vec![Field::UInt64(3)])
        );
        dst.pop(2);
        assert_eq!(dst.data().len(), 1);
    }

    #[test]
    fn from_parts_checks_offsets() {
        let data: ColumnPtr = Box::new(ColumnVector::<u8>::from(vec![1, 2, 3]));
        assert!(ColumnArray::from_parts(data.clone(), vec![2, 1, 3]).is_err());
        assert!(ColumnArray::from_parts(data.clone(), vec![1, 2]).is_err());
        assert_eq!(ColumnArray::from_parts(data, vec![1, 3]).unwrap().size_at(1), 2);
    }
}
