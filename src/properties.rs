//! Helpers for property tests.

use std::sync::Arc;

use proptest::collection::vec;
use proptest::prelude::*;

use crate::column::{Column, ColumnPtr};
use crate::data_type::{
    DataType, DataTypeArray, DataTypeDate, DataTypeDateTime, DataTypeFixedString, DataTypeFloat32,
    DataTypeFloat64, DataTypeInt16, DataTypeInt64, DataTypeInt8, DataTypeNullable, DataTypePtr,
    DataTypeString, DataTypeUInt16, DataTypeUInt32, DataTypeUInt64, DataTypeUInt8,
};
use crate::field::Field;

/// A data type and rows of values of that type.
#[derive(Clone, Debug)]
pub(crate) struct ColumnScenario {
    pub(crate) data_type: DataTypePtr,
    pub(crate) values: Vec<Field>,
}

impl ColumnScenario {
    pub(crate) fn column(&self) -> ColumnPtr {
        let mut column = self.data_type.create_column();
        for value in &self.values {
            // values are generated to fit the type
            column.push_field(value).unwrap();
        }
        column
    }
}

fn scalar_type() -> impl Strategy<Value = DataTypePtr> {
    prop_oneof![
        Just(Arc::new(DataTypeUInt8::new()) as DataTypePtr),
        Just(Arc::new(DataTypeUInt16::new()) as DataTypePtr),
        Just(Arc::new(DataTypeUInt32::new()) as DataTypePtr),
        Just(Arc::new(DataTypeUInt64::new()) as DataTypePtr),
        Just(Arc::new(DataTypeInt8::new()) as DataTypePtr),
        Just(Arc::new(DataTypeInt16::new()) as DataTypePtr),
        Just(Arc::new(DataTypeInt64::new()) as DataTypePtr),
        Just(Arc::new(DataTypeFloat32::new()) as DataTypePtr),
        Just(Arc::new(DataTypeFloat64::new()) as DataTypePtr),
        Just(Arc::new(DataTypeDate::new()) as DataTypePtr),
        Just(Arc::new(DataTypeDateTime::new()) as DataTypePtr),
        Just(Arc::new(DataTypeString::new()) as DataTypePtr),
        (1usize..4).prop_map(|n| Arc::new(DataTypeFixedString::new(n).unwrap()) as DataTypePtr),
    ]
}

/// Scalars, possibly wrapped in a few levels of `Array` and `Nullable`.
pub(crate) fn data_type() -> impl Strategy<Value = DataTypePtr> {
    scalar_type().prop_recursive(3, 8, 1, |inner| {
        prop_oneof![
            inner
                .clone()
                .prop_map(|nested| Arc::new(DataTypeArray::new(nested)) as DataTypePtr),
            inner.prop_map(|nested| Arc::new(DataTypeNullable::new(nested)) as DataTypePtr),
        ]
    })
}

/// Values of the type called `name`.
pub(crate) fn field(name: &str) -> BoxedStrategy<Field> {
    let inner = |prefix: &str| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(')'))
            .map(str::to_string)
    };
    if let Some(nested) = inner("Array(") {
        return vec(field(&nested), 0..4).prop_map(Field::Array).boxed();
    }
    if let Some(nested) = inner("Nullable(") {
        return prop_oneof![Just(Field::Null), field(&nested)].boxed();
    }
    if let Some(n) = inner("FixedString(").and_then(|n| n.parse::<usize>().ok()) {
        return vec(any::<u8>(), n).prop_map(Field::String).boxed();
    }
    match name {
        "UInt8" => any::<u8>().prop_map(|v| Field::UInt64(v as u64)).boxed(),
        "UInt16" | "Date" => any::<u16>().prop_map(|v| Field::UInt64(v as u64)).boxed(),
        "UInt32" | "DateTime" => any::<u32>().prop_map(|v| Field::UInt64(v as u64)).boxed(),
        "UInt64" => any::<u64>().prop_map(Field::UInt64).boxed(),
        "Int8" => any::<i8>().prop_map(|v| Field::Int64(v as i64)).boxed(),
        "Int16" => any::<i16>().prop_map(|v| Field::Int64(v as i64)).boxed(),
        "Int32" => any::<i32>().prop_map(|v| Field::Int64(v as i64)).boxed(),
        "Int64" => any::<i64>().prop_map(Field::Int64).boxed(),
        "Float32" => (-1e6f32..1e6f32)
            .prop_map(|v| Field::Float64(v as f64))
            .boxed(),
        "Float64" => (-1e12f64..1e12f64).prop_map(Field::Float64).boxed(),
        "String" => vec(any::<u8>(), 0..6).prop_map(Field::String).boxed(),
        other => panic!("no value strategy for {}", other),
    }
}

pub(crate) fn column_scenario() -> impl Strategy<Value = ColumnScenario> {
    data_type().prop_flat_map(|data_type| {
        let values = vec(field(&data_type.name()), 0..8);
        (Just(data_type), values)
            .prop_map(|(data_type, values)| ColumnScenario { data_type, values })
    })
}
