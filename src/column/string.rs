use std::any::Any;

use super::{check_range, downcast, Column, ColumnPtr};
use crate::error::TypeError;
use crate::field::Field;

/// Variable length byte strings, stored back to back in `chars` with `offsets[i]` the end of
/// row `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnString {
    chars: Vec<u8>,
    offsets: Vec<usize>,
}

impl ColumnString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(rows: usize, bytes: usize) -> Self {
        Self {
            chars: Vec::with_capacity(bytes),
            offsets: Vec::with_capacity(rows),
        }
    }

    pub fn reserve(&mut self, rows: usize, bytes: usize) {
        self.offsets.reserve(rows);
        self.chars.reserve(bytes);
    }

    fn start(&self, row: usize) -> usize {
        if row == 0 {
            0
        } else {
            self.offsets[row - 1]
        }
    }

    pub fn get_bytes(&self, row: usize) -> &[u8] {
        &self.chars[self.start(row)..self.offsets[row]]
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.chars.extend_from_slice(bytes);
        self.offsets.push(self.chars.len());
    }

    /// Total bytes held, which lets decoders size their scratch space.
    pub fn byte_len(&self) -> usize {
        self.chars.len()
    }

    pub fn chars_capacity(&self) -> usize {
        self.chars.capacity()
    }
}

impl<S: AsRef<[u8]>> FromIterator<S> for ColumnString {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut col = ColumnString::new();
        for s in iter {
            col.push_bytes(s.as_ref());
        }
        col
    }
}

impl Column for ColumnString {
    fn family_name(&self) -> &'static str {
        "ColumnString"
    }

    fn len(&self) -> usize {
        self.offsets.len()
    }

    fn get(&self, row: usize) -> Field {
        Field::String(self.get_bytes(row).to_vec())
    }

    fn push_field(&mut self, field: &Field) -> Result<(), TypeError> {
        match field {
            Field::String(bytes) => {
                self.push_bytes(bytes);
                Ok(())
            }
            other => Err(TypeError::type_mismatch("String", other.type_name())),
        }
    }

    fn push_default(&mut self) {
        self.push_bytes(&[])
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
        let from = src.start(start);
        let to = src.offsets[start + len - 1];
        let base = self.chars.len();
        self.chars.extend_from_slice(&src.chars[from..to]);
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
        self.chars.truncate(end);
    }

    fn clone_empty(&self) -> ColumnPtr {
        Box::new(Self::new())
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

    #[test]
    fn extend_from_rebases_offsets() {
        let src: ColumnString = ["ab", "", "cde", "f"].into_iter().collect();
        let mut dst: ColumnString = ["xyz"].into_iter().collect();
        dst.extend_from(&src, 1, 2).unwrap();
        assert_eq!(dst.len(), 3);
        assert_eq!(dst.get_bytes(0), b"xyz");
        assert_eq!(dst.get_bytes(1), b"");
        assert_eq!(dst.get_bytes(2), b"cde");
    }

    #[test]
    fn pop_drops_chars() {
        let mut col: ColumnString = ["ab", "cd"].into_iter().collect();
        col.pop(1);
        assert_eq!(col.fields(), vec![Field::from("ab")]);
        assert_eq!(col.byte_len(), 2);
    }
}
