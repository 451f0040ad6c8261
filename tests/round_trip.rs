use columnar_types::column::{ColumnArray, ColumnNullable};
use columnar_types::data_type::{DataTypeArray, DataTypeNullable, DataTypeString, DataTypeUInt8};
use columnar_types::{
    Column, ColumnPtr, DataType, DataTypeFactory, DataTypePtr, ErrorCode, Field, FormatSettings,
    ReadBuffer, TextFormat, WriteBuffer,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_log::test;

fn bytes(values: &[u8]) -> Field {
    Field::Array(values.iter().map(|v| Field::UInt64(*v as u64)).collect())
}

fn column_of(data_type: &dyn DataType, rows: &[Field]) -> ColumnPtr {
    let mut column = data_type.create_column();
    for row in rows {
        column.push_field(row).unwrap();
    }
    column
}

fn streams_of(data_type: &dyn DataType) -> Vec<String> {
    let mut descriptions = Vec::new();
    data_type.describe_multiple_streams(&mut descriptions, 0);
    descriptions
}

fn write_streams(
    data_type: &dyn DataType,
    column: &dyn Column,
    position_independent: bool,
    offset: usize,
    limit: usize,
) -> Vec<WriteBuffer> {
    let mut streams = vec![WriteBuffer::new(); streams_of(data_type).len()];
    data_type
        .serialize_binary_bulk_with_multiple_streams(
            column,
            &mut streams,
            position_independent,
            offset,
            limit,
        )
        .unwrap();
    streams
}

#[test]
fn nested_arrays_spread_over_one_stream_per_level() {
    let ty = DataTypeFactory::get("Array(Array(UInt8))").unwrap();
    assert_eq!(streams_of(ty.as_ref()), vec![".size0", ".size1", ""]);

    let rows = vec![
        Field::Array(vec![bytes(&[1, 2]), bytes(&[])]),
        Field::Array(vec![]),
        Field::Array(vec![bytes(&[3])]),
    ];
    let column = column_of(ty.as_ref(), &rows);

    let streams = write_streams(ty.as_ref(), column.as_ref(), true, 0, 0);
    assert_eq!(streams[0].as_slice(), &[2, 0, 1]);
    assert_eq!(streams[1].as_slice(), &[2, 0, 1]);
    assert_eq!(streams[2].as_slice(), &[1, 2, 3]);

    for position_independent in [true, false] {
        let streams = write_streams(ty.as_ref(), column.as_ref(), position_independent, 0, 0);
        let mut readers: Vec<ReadBuffer<'_>> = streams.iter().map(|s| s.reader()).collect();
        let mut decoded = ty.create_column();
        for _ in 0..rows.len() {
            ty.deserialize_binary_bulk_with_multiple_streams(
                decoded.as_mut(),
                &mut readers,
                position_independent,
                1,
                0.0,
            )
            .unwrap();
        }
        assert_eq!(decoded.fields(), rows);
    }
}

#[test]
fn nullable_arrays_keep_the_null_map_first() {
    let ty: DataTypePtr = Arc::new(DataTypeNullable::new(Arc::new(DataTypeArray::new(
        Arc::new(DataTypeString::new()),
    ))));
    assert_eq!(ty.name(), "Nullable(Array(String))");
    assert_eq!(streams_of(ty.as_ref()), vec![".null", ".size0", ""]);

    let rows = vec![
        Field::Array(vec!["a".into(), "bc".into()]),
        Field::Null,
        Field::Array(vec![]),
    ];
    let column = column_of(ty.as_ref(), &rows);
    let streams = write_streams(ty.as_ref(), column.as_ref(), true, 0, 0);
    assert_eq!(streams[0].as_slice(), &[0, 1, 0]);
    assert_eq!(streams[1].as_slice(), &[2, 0, 0]);
    assert_eq!(streams[2].as_slice(), b"\x01a\x02bc");

    let mut readers: Vec<ReadBuffer<'_>> = streams.iter().map(|s| s.reader()).collect();
    let mut decoded = ty.create_column();
    ty.deserialize_binary_bulk_with_multiple_streams(decoded.as_mut(), &mut readers, true, 0, 0.0)
        .unwrap();
    assert_eq!(decoded.fields(), rows);

    let nullable = decoded.as_any().downcast_ref::<ColumnNullable>().unwrap();
    assert_eq!(nullable.null_map(), &[0, 1, 0]);
    let arrays = nullable
        .nested()
        .as_any()
        .downcast_ref::<ColumnArray>()
        .unwrap();
    assert_eq!(arrays.offsets(), &[2, 2, 2]);
}

#[test]
fn truncated_element_stream_leaves_the_column_alone() {
    let ty = DataTypeArray::new(Arc::new(DataTypeUInt8::new()));
    let mut column = column_of(&ty, &[bytes(&[9])]);

    let mut streams = vec![ReadBuffer::from(vec![3]), ReadBuffer::from(vec![1, 2])];
    let err = ty
        .deserialize_binary_bulk_with_multiple_streams(column.as_mut(), &mut streams, true, 0, 0.0)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CannotReadAllData);
    assert_eq!(column.fields(), vec![bytes(&[9])]);

    let mut too_few = vec![ReadBuffer::from(vec![1])];
    let err = ty
        .deserialize_binary_bulk_with_multiple_streams(column.as_mut(), &mut too_few, true, 0, 0.0)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotEnoughStreams);
    assert_eq!(column.len(), 1);
}

#[test]
fn bulk_ranges_are_clamped_but_offsets_are_checked() {
    let ty = DataTypeFactory::get("String").unwrap();
    let rows: Vec<Field> = ["x", "yy", "zzz"].iter().map(|s| Field::from(*s)).collect();
    let column = column_of(ty.as_ref(), &rows);

    let mut out = WriteBuffer::new();
    ty.serialize_binary_bulk(column.as_ref(), &mut out, 1, 100).unwrap();
    assert_eq!(out.as_slice(), b"\x02yy\x03zzz");

    let mut decoded = ty.create_column();
    let mut input = out.reader();
    ty.deserialize_binary_bulk(decoded.as_mut(), &mut input, 1, 0.0).unwrap();
    assert_eq!(decoded.fields(), vec![Field::from("yy")]);
    ty.deserialize_binary_bulk(decoded.as_mut(), &mut input, 0, 0.0).unwrap();
    assert_eq!(decoded.fields(), rows[1..].to_vec());

    let mut out = WriteBuffer::new();
    ty.serialize_binary_bulk(column.as_ref(), &mut out, 3, 0).unwrap();
    assert!(out.as_slice().is_empty());
    let err = ty
        .serialize_binary_bulk(column.as_ref(), &mut out, 4, 0)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ArgumentOutOfBound);
}

#[test]
fn malformed_text_leaves_the_column_alone() {
    let ty = DataTypeFactory::get("Array(Nullable(UInt8))").unwrap();
    let mut column = ty.create_column();
    ty.deserialize_text_quoted(column.as_mut(), &mut "[1, NULL ,3]".into())
        .unwrap();
    assert_eq!(
        column.fields(),
        vec![Field::Array(vec![1u64.into(), Field::Null, 3u64.into()])]
    );

    for bad in ["[1,2,x]", "[1,2", "[300]"] {
        let err = ty
            .deserialize_text_quoted(column.as_mut(), &mut bad.into())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CannotParseText, "{}", bad);
        assert_eq!(column.len(), 1);
    }
}

#[test]
fn factory_names_round_trip() {
    for name in [
        "UInt8",
        "Int64",
        "Float32",
        "Date",
        "DateTime",
        "Null",
        "FixedString(16)",
        "Array(Nullable(String))",
        "Nullable(Array(Array(Float64)))",
    ] {
        assert_eq!(DataTypeFactory::get(name).unwrap().name(), name);
    }
    for name in ["", "UInt128", "Array(UInt8", "FixedString(x)", "Nullable()"] {
        let err = DataTypeFactory::get(name).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownType, "{}", name);
    }
}

#[test]
fn csv_rows_follow_the_configured_delimiter() {
    let ty = DataTypeFactory::get("Array(String)").unwrap();
    let settings = FormatSettings::default().with_csv_delimiter(b'|');
    let column = column_of(ty.as_ref(), &[Field::Array(vec!["a'b".into(), "c".into()])]);

    let mut out = WriteBuffer::new();
    TextFormat::Csv
        .serialize(ty.as_ref(), column.as_ref(), 0, &mut out, &settings)
        .unwrap();
    assert_eq!(out.as_slice(), br#""['a\'b','c']""#);
    out.write(b"|next");

    let mut decoded = ty.create_column();
    let mut input = out.reader();
    TextFormat::Csv
        .deserialize(ty.as_ref(), decoded.as_mut(), &mut input, &settings)
        .unwrap();
    assert_eq!(decoded.fields(), column.fields());
    assert_eq!(input.peek_slice(), b"|next");
}

#[test]
fn constant_columns_repeat_one_value() {
    let ty = DataTypeFactory::get("Nullable(UInt8)").unwrap();
    let column = ty.create_const_column(4, &Field::UInt64(7)).unwrap();
    assert!(column.is_const());
    assert_eq!(column.len(), 4);
    assert_eq!(column.get(3), Field::UInt64(7));
    assert_eq!(ty.default_value(), Field::Null);

    let err = ty.create_const_column(2, &"nope".into()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::TypeMismatch);
}
