use std::any::Any;
use std::fmt::{Debug, Display};
use std::str::FromStr;

use super::{check_range, downcast, Column, ColumnPtr};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::error::TypeError;
use crate::field::Field;

/// A fixed width number stored little endian.
pub trait Number:
    Copy + Default + PartialEq + PartialOrd + Debug + Display + FromStr + Send + Sync + 'static
{
    const NAME: &'static str;
    const WIDTH: usize;
    /// `UInt64` and `Int64`, which JSON consumers may only be able to read as strings.
    const IS_64BIT_INTEGER: bool = false;
    const IS_FLOAT: bool = false;

    fn into_field(self) -> Field;

    /// `None` if `field` is of the wrong variant or out of range for `Self`.
    fn from_field(field: &Field) -> Option<Self>;

    fn write_le(self, out: &mut WriteBuffer);

    fn read_le(input: &mut ReadBuffer<'_>) -> Result<Self, TypeError>;

    /// The variant of [`Field`] values of this number are exchanged as.
    fn field_type_name() -> &'static str;
}

macro_rules! impl_number {
    (@narrow $t:ty, $v:expr, IS_FLOAT) => {
        Some($v as $t)
    };
    (@narrow $t:ty, $v:expr $(, $flag:ident)*) => {
        <$t>::try_from($v).ok()
    };
    ($t:ty, $name:literal, $variant:ident, $wide:ty $(, $flag:ident)*) => {
        impl Number for $t {
            const NAME: &'static str = $name;
            const WIDTH: usize = std::mem::size_of::<$t>();
            $(const $flag: bool = true;)*

            fn into_field(self) -> Field {
                Field::$variant(self as $wide)
            }

            fn from_field(field: &Field) -> Option<Self> {
                match field {
                    Field::$variant(v) => impl_number!(@narrow $t, *v $(, $flag)*),
                    _ => None,
                }
            }

            fn write_le(self, out: &mut WriteBuffer) {
                out.write(&self.to_le_bytes())
            }

            fn read_le(input: &mut ReadBuffer<'_>) -> Result<Self, TypeError> {
                Ok(<$t>::from_le_bytes(input.read_array()?))
            }

            fn field_type_name() -> &'static str {
                stringify!($variant)
            }
        }
    };
}

impl_number!(u8, "UInt8", UInt64, u64);
impl_number!(u16, "UInt16", UInt64, u64);
impl_number!(u32, "UInt32", UInt64, u64);
impl_number!(u64, "UInt64", UInt64, u64, IS_64BIT_INTEGER);
impl_number!(i8, "Int8", Int64, i64);
impl_number!(i16, "Int16", Int64, i64);
impl_number!(i32, "Int32", Int64, i64);
impl_number!(i64, "Int64", Int64, i64, IS_64BIT_INTEGER);
impl_number!(f32, "Float32", Float64, f64, IS_FLOAT);
impl_number!(f64, "Float64", Float64, f64, IS_FLOAT);

/// A column of fixed width numbers, one per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnVector<T: Number> {
    data: Vec<T>,
}

impl<T: Number> ColumnVector<T> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn push(&mut self, value: T) {
        self.data.push(value)
    }

    pub fn extend_from_slice(&mut self, values: &[T]) {
        self.data.extend_from_slice(values)
    }
}

impl<T: Number> From<Vec<T>> for ColumnVector<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

impl<T: Number> Column for ColumnVector<T> {
    fn family_name(&self) -> &'static str {
        "ColumnVector"
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn get(&self, row: usize) -> Field {
        self.data[row].into_field()
    }

    fn push_field(&mut self, field: &Field) -> Result<(), TypeError> {
        let value = T::from_field(field)
            .ok_or_else(|| TypeError::type_mismatch(T::NAME, field.to_string()))?;
        self.data.push(value);
        Ok(())
    }

    fn push_default(&mut self) {
        self.data.push(T::default())
    }

    fn extend_from(
        &mut self,
        src: &dyn Column,
        start: usize,
        len: usize,
    ) -> Result<(), TypeError> {
        let src = downcast::<Self>(src, self.family_name())?;
        check_range(src, start, len)?;
        self.data.extend_from_slice(&src.data[start..start + len]);
        Ok(())
    }

    fn pop(&mut self, n: usize) {
        self.data.truncate(self.data.len().saturating_sub(n))
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
