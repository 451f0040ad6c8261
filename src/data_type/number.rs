use std::marker::PhantomData;
use std::sync::Arc;

use super::{
    bulk_range, check_row, field_mismatch, read_limit, typed, typed_mut, DataType, DataTypePtr,
};
use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::column::{Column, ColumnPtr, ColumnVector, Number};
use crate::error::TypeError;
use crate::field::Field;
use crate::text::{read_csv_bytes, read_json_bytes, read_number_token};

/// A fixed width integer or float, stored in a [`ColumnVector`] and written little endian.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeNumber<T: Number> {
    _number: PhantomData<T>,
}

pub type DataTypeUInt8 = DataTypeNumber<u8>;
pub type DataTypeUInt16 = DataTypeNumber<u16>;
pub type DataTypeUInt32 = DataTypeNumber<u32>;
pub type DataTypeUInt64 = DataTypeNumber<u64>;
pub type DataTypeInt8 = DataTypeNumber<i8>;
pub type DataTypeInt16 = DataTypeNumber<i16>;
pub type DataTypeInt32 = DataTypeNumber<i32>;
pub type DataTypeInt64 = DataTypeNumber<i64>;
pub type DataTypeFloat32 = DataTypeNumber<f32>;
pub type DataTypeFloat64 = DataTypeNumber<f64>;

impl<T: Number> DataTypeNumber<T> {
    pub fn new() -> Self {
        Self {
            _number: PhantomData,
        }
    }

    fn value(&self, column: &dyn Column, row_num: usize) -> Result<T, TypeError> {
        let column = typed::<ColumnVector<T>, _>(self, column)?;
        check_row(column, row_num)?;
        Ok(column.data()[row_num])
    }

    fn push(&self, column: &mut dyn Column, value: T) -> Result<(), TypeError> {
        typed_mut::<ColumnVector<T>, _>(self, column)?.push(value);
        Ok(())
    }
}

/// Bulk layout shared by every type stored as a [`ColumnVector`]: values back to back.
pub(super) fn serialize_vector_bulk<T: Number, D: DataType + ?Sized>(
    data_type: &D,
    column: &dyn Column,
    out: &mut WriteBuffer,
    offset: usize,
    limit: usize,
) -> Result<(), TypeError> {
    let column = typed::<ColumnVector<T>, _>(data_type, column)?;
    let range = bulk_range(column.len(), offset, limit)?;
    out.reserve(range.len() * T::WIDTH);
    for value in &column.data()[range] {
        value.write_le(out);
    }
    Ok(())
}

pub(super) fn deserialize_vector_bulk<T: Number, D: DataType + ?Sized>(
    data_type: &D,
    column: &mut dyn Column,
    input: &mut ReadBuffer<'_>,
    limit: usize,
) -> Result<(), TypeError> {
    let column = typed_mut::<ColumnVector<T>, _>(data_type, column)?;
    let limit = read_limit(limit);
    let mut values = Vec::with_capacity(limit.min(input.remaining() / T::WIDTH));
    while values.len() < limit && !input.eof() {
        values.push(T::read_le(input)?);
    }
    tracing::trace!(rows = values.len(), type_name = T::NAME, "deserialized fixed width values");
    column.extend_from_slice(&values);
    Ok(())
}

fn parse_number<T: Number>(token: &str) -> Result<T, TypeError> {
    token.parse::<T>().map_err(|_| {
        TypeError::cannot_parse(T::NAME, format!("cannot parse '{}' as {}", token, T::NAME))
    })
}

impl<T: Number> DataType for DataTypeNumber<T> {
    fn name(&self) -> String {
        T::NAME.to_string()
    }

    fn is_numeric(&self) -> bool {
        true
    }

    fn behaves_as_number(&self) -> bool {
        true
    }

    fn clone_type(&self) -> DataTypePtr {
        Arc::new(Self::new())
    }

    fn serialize_binary_bulk(
        &self,
        column: &dyn Column,
        out: &mut WriteBuffer,
        offset: usize,
        limit: usize,
    ) -> Result<(), TypeError> {
        serialize_vector_bulk::<T, _>(self, column, out, offset, limit)
    }

    fn deserialize_binary_bulk(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        limit: usize,
        _avg_value_size_hint: f64,
    ) -> Result<(), TypeError> {
        deserialize_vector_bulk::<T, _>(self, column, input, limit)
    }

    fn serialize_binary_field(&self, field: &Field, out: &mut WriteBuffer) -> Result<(), TypeError> {
        let value = T::from_field(field).ok_or_else(|| field_mismatch(self, field))?;
        value.write_le(out);
        Ok(())
    }

    fn deserialize_binary_field(&self, input: &mut ReadBuffer<'_>) -> Result<Field, TypeError> {
        Ok(T::read_le(input)?.into_field())
    }

    fn serialize_binary(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.value(column, row_num)?.write_le(out);
        Ok(())
    }

    fn deserialize_binary(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let value = T::read_le(input)?;
        self.push(column, value)
    }

    fn serialize_text_escaped(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_text(column, row_num, out)
    }

    fn deserialize_text_escaped(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let value = parse_number::<T>(read_number_token(input))?;
        self.push(column, value)
    }

    fn serialize_text_quoted(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_text(column, row_num, out)
    }

    fn deserialize_text_quoted(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        self.deserialize_text_escaped(column, input)
    }

    fn serialize_text_csv(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        self.serialize_text(column, row_num, out)
    }

    fn deserialize_text_csv(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
        delimiter: u8,
    ) -> Result<(), TypeError> {
        let raw = read_csv_bytes(input, delimiter, T::NAME)?;
        let token = std::str::from_utf8(&raw)
            .map_err(|_| TypeError::cannot_parse(T::NAME, "invalid UTF-8"))?;
        let value = parse_number::<T>(token.trim())?;
        self.push(column, value)
    }

    fn serialize_text(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
    ) -> Result<(), TypeError> {
        out.write_str(&self.value(column, row_num)?.to_string());
        Ok(())
    }

    fn serialize_text_json(
        &self,
        column: &dyn Column,
        row_num: usize,
        out: &mut WriteBuffer,
        force_quoting_64bit_integers: bool,
    ) -> Result<(), TypeError> {
        let value = self.value(column, row_num)?;
        if T::IS_FLOAT {
            // JSON has no representation for inf and nan
            match value.into_field().as_f64() {
                Some(f) if f.is_finite() => out.write_str(&value.to_string()),
                _ => out.write_str("null"),
            }
        } else if T::IS_64BIT_INTEGER && force_quoting_64bit_integers {
            out.write_byte(b'"');
            out.write_str(&value.to_string());
            out.write_byte(b'"');
        } else {
            out.write_str(&value.to_string());
        }
        Ok(())
    }

    fn deserialize_text_json(
        &self,
        column: &mut dyn Column,
        input: &mut ReadBuffer<'_>,
    ) -> Result<(), TypeError> {
        let value = if input.peek() == Some(b'"') {
            let raw = read_json_bytes(input, T::NAME)?;
            let token = std::str::from_utf8(&raw)
                .map_err(|_| TypeError::cannot_parse(T::NAME, "invalid UTF-8"))?;
            parse_number::<T>(token)?
        } else {
            parse_number::<T>(read_number_token(input))?
        };
        self.push(column, value)
    }

    fn create_column(&self) -> ColumnPtr {
        Box::new(ColumnVector::<T>::new())
    }

    fn default_value(&self) -> Field {
        T::default().into_field()
    }

    fn size_of_field(&self) -> Result<usize, TypeError> {
        Ok(T::WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    fn column<T: Number>(values: Vec<T>) -> ColumnPtr {
        Box::new(ColumnVector::from(values))
    }

    fn text<F>(f: F) -> String
    where
        F: FnOnce(&mut WriteBuffer) -> Result<(), TypeError>,
    {
        let mut out = WriteBuffer::new();
        f(&mut out).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn bulk_round_trip_with_limit() {
        let ty = DataTypeUInt64::new();
        let src = column(vec![0u64, 1, u64::MAX]);
        let mut out = WriteBuffer::new();
        ty.serialize_binary_bulk(src.as_ref(), &mut out, 0, 0).unwrap();
        assert_eq!(out.written(), 24);

        let mut dst = ty.create_column();
        ty.deserialize_binary_bulk(dst.as_mut(), &mut out.reader(), 2, 0.0)
            .unwrap();
        assert_eq!(dst.fields(), vec![Field::UInt64(0), Field::UInt64(1)]);
    }

    #[test]
    fn bulk_read_stops_at_clean_eof_and_fails_mid_value() {
        let ty = DataTypeInt32::new();
        let mut out = WriteBuffer::new();
        ty.serialize_binary_bulk(column(vec![-1i32, 2]).as_ref(), &mut out, 0, 0)
            .unwrap();

        let mut dst = ty.create_column();
        ty.deserialize_binary_bulk(dst.as_mut(), &mut out.reader(), 10, 0.0)
            .unwrap();
        assert_eq!(dst.len(), 2);

        let truncated = &out.as_slice()[..6];
        let err = ty
            .deserialize_binary_bulk(dst.as_mut(), &mut truncated.into(), 0, 0.0)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CannotReadAllData);
        assert_eq!(dst.len(), 2);
    }

    #[test]
    fn partial_ranges() {
        let ty = DataTypeUInt8::new();
        let src = column(vec![1u8, 2, 3, 4]);
        let mut out = WriteBuffer::new();
        ty.serialize_binary_bulk(src.as_ref(), &mut out, 1, 2).unwrap();
        ty.serialize_binary_bulk(src.as_ref(), &mut out, 3, 100).unwrap();
        ty.serialize_binary_bulk(src.as_ref(), &mut out, 4, 0).unwrap();
        assert_eq!(out.as_slice(), &[2, 3, 4]);

        let err = ty
            .serialize_binary_bulk(src.as_ref(), &mut out, 5, 0)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ArgumentOutOfBound);
    }

    #[test]
    fn json_quotes_only_64bit_integers_on_request() {
        let u64s = DataTypeUInt64::new();
        let col = column(vec![u64::MAX]);
        assert_eq!(
            text(|out| u64s.serialize_text_json(col.as_ref(), 0, out, true)),
            "\"18446744073709551615\""
        );
        assert_eq!(
            text(|out| u64s.serialize_text_json(col.as_ref(), 0, out, false)),
            "18446744073709551615"
        );

        let u32s = DataTypeUInt32::new();
        let col = column(vec![7u32]);
        assert_eq!(
            text(|out| u32s.serialize_text_json(col.as_ref(), 0, out, true)),
            "7"
        );

        let floats = DataTypeFloat64::new();
        let col = column(vec![0.1f64, f64::NAN]);
        assert_eq!(
            text(|out| floats.serialize_text_json(col.as_ref(), 0, out, true)),
            "0.1"
        );
        assert_eq!(
            text(|out| floats.serialize_text_json(col.as_ref(), 1, out, true)),
            "null"
        );
    }

    #[test]
    fn json_accepts_quoted_and_bare_numbers() {
        let ty = DataTypeInt64::new();
        let mut dst = ty.create_column();
        ty.deserialize_text_json(dst.as_mut(), &mut "\"-5\"".into())
            .unwrap();
        ty.deserialize_text_json(dst.as_mut(), &mut "12,".into())
            .unwrap();
        assert_eq!(dst.fields(), vec![Field::Int64(-5), Field::Int64(12)]);
    }

    #[test]
    fn text_rejects_out_of_range_and_garbage() {
        let ty = DataTypeUInt8::new();
        let mut dst = ty.create_column();
        for bad in ["256", "-1", "abc", ""] {
            let err = ty
                .deserialize_text_escaped(dst.as_mut(), &mut bad.into())
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::CannotParseText, "{:?}", bad);
        }
        assert!(dst.is_empty());

        ty.deserialize_text_escaped(dst.as_mut(), &mut "255\t".into())
            .unwrap();
        assert_eq!(dst.fields(), vec![Field::UInt64(255)]);
    }

    #[test]
    fn csv_reads_quoted_or_bare() {
        let ty = DataTypeFloat32::new();
        let mut dst = ty.create_column();
        let mut input = ReadBuffer::from("1.5,\"2.25\"\n");
        ty.deserialize_text_csv(dst.as_mut(), &mut input, b',').unwrap();
        assert!(input.check_byte(b','));
        ty.deserialize_text_csv(dst.as_mut(), &mut input, b',').unwrap();
        assert_eq!(dst.fields(), vec![Field::Float64(1.5), Field::Float64(2.25)]);
    }

    #[test]
    fn binary_fields_check_range() {
        let ty = DataTypeInt8::new();
        let mut out = WriteBuffer::new();
        ty.serialize_binary_field(&Field::Int64(-3), &mut out).unwrap();
        assert_eq!(out.as_slice(), &[0xfd]);
        assert!(ty.serialize_binary_field(&Field::Int64(300), &mut out).is_err());
        assert!(ty.serialize_binary_field(&Field::UInt64(1), &mut out).is_err());
        assert_eq!(
            ty.deserialize_binary_field(&mut out.reader()).unwrap(),
            Field::Int64(-3)
        );
    }

    #[test]
    fn classification() {
        let ty = DataTypeFloat32::new();
        assert_eq!(ty.name(), "Float32");
        assert!(ty.is_numeric());
        assert!(ty.is_numeric_not_nullable());
        assert!(ty.behaves_as_number());
        assert!(!ty.is_nullable());
        assert_eq!(ty.size_of_field().unwrap(), 4);
        assert_eq!(ty.default_value(), Field::Float64(0.0));
        assert_eq!(ty.clone_type().name(), "Float32");
    }

    #[test]
    fn const_column_checks_the_value() {
        let ty = DataTypeUInt16::new();
        let col = ty.create_const_column(3, &Field::UInt64(9)).unwrap();
        assert!(col.is_const());
        assert_eq!(col.len(), 3);
        assert_eq!(col.get(1), Field::UInt64(9));
        assert!(ty.create_const_column(3, &Field::from("x")).is_err());
        assert!(ty.create_const_column(3, &Field::UInt64(70_000)).is_err());
    }
}
