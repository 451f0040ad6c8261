use std::any::Any;

use super::{check_range, downcast, Column, ColumnPtr};
use crate::error::TypeError;
use crate::field::Field;

/// Strings of exactly `n` bytes each, stored contiguously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFixedString {
    n: usize,
    chars: Vec<u8>,
}

impl ColumnFixedString {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            chars: Vec::new(),
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn get_bytes(&self, row: usize) -> &[u8] {
        &self.chars[row * self.n..(row + 1) * self.n]
    }

    pub fn chars(&self) -> &[u8] {
        &self.chars
    }

    /// Append one value, zero padding it to `n` bytes.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), TypeError> {
        if bytes.len() > self.n {
            return Err(TypeError::OverlargeAllocation {
                attempted: bytes.len() as u64,
                maximum: self.n as u64,
            });
        }
        self.chars.extend_from_slice(bytes);
        self.chars.resize(self.chars.len() + self.n - bytes.len(), 0);
        Ok(())
    }

    /// Append whole rows; `bytes.len()` must be a multiple of `n`.
    pub(crate) fn extend_from_chars(&mut self, bytes: &[u8]) {
        debug_assert_eq!(bytes.len() % self.n.max(1), 0);
        self.chars.extend_from_slice(bytes);
    }
}

impl Column for ColumnFixedString {
    fn family_name(&self) -> &'static str {
        "ColumnFixedString"
    }

    fn len(&self) -> usize {
        if self.n == 0 {
            0
        } else {
            self.chars.len() / self.n
        }
    }

    fn get(&self, row: usize) -> Field {
        Field::String(self.get_bytes(row).to_vec())
    }

    fn push_field(&mut self, field: &Field) -> Result<(), TypeError> {
        match field {
            Field::String(bytes) => self.push_bytes(bytes),
            other => Err(TypeError::type_mismatch("String", other.type_name())),
        }
    }

    fn push_default(&mut self) {
        self.chars.resize(self.chars.len() + self.n, 0);
    }

    fn extend_from(
        &mut self,
        src: &dyn Column,
        start: usize,
        len: usize,
    ) -> Result<(), TypeError> {
        let src = downcast::<Self>(src, self.family_name())?;
        if src.n != self.n {
            return Err(TypeError::illegal_column(
                self.family_name(),
                format!("FixedString({})", self.n),
            ));
        }
        check_range(src, start, len)?;
        self.chars
            .extend_from_slice(&src.chars[start * self.n..(start + len) * self.n]);
        Ok(())
    }

    fn pop(&mut self, n: usize) {
        let rows = self.len().saturating_sub(n);
        self.chars.truncate(rows * self.n);
    }

    fn clone_empty(&self) -> ColumnPtr {
        Box::new(Self::new(self.n))
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
    fn short_values_are_zero_padded() {
        let mut col = ColumnFixedString::new(4);
        col.push_bytes(b"ab").unwrap();
        assert_eq!(col.get_bytes(0), b"ab\0\0");
        assert!(col.push_bytes(b"abcde").is_err());
        assert_eq!(col.len(), 1);
    }
}
