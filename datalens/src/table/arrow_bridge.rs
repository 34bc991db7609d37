//! Conversion between [`Table`] and Arrow record batches.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use super::{Table, Value};
use crate::error::Result;

/// Physical Arrow type chosen for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Int,
    Float,
    Utf8,
}

impl Storage {
    fn for_values<'a>(values: impl Iterator<Item = &'a Value>) -> Self {
        let mut storage = None;
        for value in values {
            storage = match (storage, value) {
                (_, v) if v.is_missing() => storage,
                (_, Value::Text(_)) => return Storage::Utf8,
                (None | Some(Storage::Int), Value::Int(_)) => Some(Storage::Int),
                (_, _) => Some(Storage::Float),
            };
        }
        storage.unwrap_or(Storage::Utf8)
    }

    fn data_type(self) -> DataType {
        match self {
            Storage::Int => DataType::Int64,
            Storage::Float => DataType::Float64,
            Storage::Utf8 => DataType::Utf8,
        }
    }
}

impl Table {
    /// Converts the table into a single Arrow record batch.
    ///
    /// Columns holding only integers become `Int64`, columns holding only
    /// numbers become `Float64`, anything else becomes `Utf8` with every value
    /// cast to its string form. All fields are nullable.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = Vec::with_capacity(self.columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len());

        for (idx, name) in self.columns.iter().enumerate() {
            let storage = Storage::for_values(self.column_at(idx));
            let array: ArrayRef = match storage {
                Storage::Int => Arc::new(Int64Array::from(
                    self.column_at(idx)
                        .map(|v| match v {
                            Value::Int(i) => Some(*i),
                            _ => None,
                        })
                        .collect::<Vec<_>>(),
                )),
                Storage::Float => Arc::new(Float64Array::from(
                    self.column_at(idx).map(Value::as_f64).collect::<Vec<_>>(),
                )),
                Storage::Utf8 => Arc::new(StringArray::from(
                    self.column_at(idx).map(Value::key).collect::<Vec<_>>(),
                )),
            };
            fields.push(Field::new(name, storage.data_type(), true));
            arrays.push(array);
        }

        let schema = Arc::new(Schema::new(fields));
        let options = RecordBatchOptions::new().with_row_count(Some(self.rows.len()));
        Ok(RecordBatch::try_new_with_options(schema, arrays, &options)?)
    }

    /// Builds a table from query results.
    ///
    /// The schema supplies the column names so that an empty result still
    /// carries its columns.
    pub fn from_record_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<Table> {
        let columns = schema
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect();
        let mut table = Table::new(columns);

        for batch in batches {
            let decoded = batch
                .columns()
                .iter()
                .map(decode_array)
                .collect::<Result<Vec<_>>>()?;
            for row_idx in 0..batch.num_rows() {
                table
                    .rows
                    .push(decoded.iter().map(|col| col[row_idx].clone()).collect());
            }
        }

        Ok(table)
    }
}

fn decode_array(array: &ArrayRef) -> Result<Vec<Value>> {
    match array.data_type() {
        DataType::Null => Ok(vec![Value::Missing; array.len()]),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let casted = cast(array.as_ref(), &DataType::Int64)?;
            Ok(casted
                .as_primitive::<Int64Type>()
                .iter()
                .map(|v| v.map_or(Value::Missing, Value::Int))
                .collect())
        }
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => {
            let casted = cast(array.as_ref(), &DataType::Float64)?;
            Ok(casted
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| match v {
                    Some(f) if !f.is_nan() => Value::Float(f),
                    _ => Value::Missing,
                })
                .collect())
        }
        _ => {
            let casted = cast(array.as_ref(), &DataType::Utf8)?;
            Ok(casted
                .as_string::<i32>()
                .iter()
                .map(|v| v.map_or(Value::Missing, |s| Value::Text(s.to_string())))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_table() -> Table {
        Table::from_rows(
            vec![
                "state".to_string(),
                "year".to_string(),
                "rainfall_mm".to_string(),
                "notes".to_string(),
            ],
            vec![
                vec![
                    Value::from("Kerala"),
                    Value::Int(2010),
                    Value::Int(3000),
                    Value::Missing,
                ],
                vec![
                    Value::from("Goa"),
                    Value::Missing,
                    Value::Float(2900.5),
                    Value::Int(7),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_storage_selection() {
        let batch = mixed_table().to_record_batch().unwrap();
        let schema = batch.schema();

        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
        // A lone integer after a missing value stays integral.
        assert_eq!(schema.field(3).data_type(), &DataType::Int64);
        assert_eq!(batch.num_rows(), 2);
    }

    #[test]
    fn test_text_wins_over_numbers() {
        let table = Table::from_rows(
            vec!["mixed".to_string()],
            vec![vec![Value::Int(1)], vec![Value::from("two")]],
        )
        .unwrap();
        let batch = table.to_record_batch().unwrap();
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);

        let back = Table::from_record_batches(&batch.schema(), &[batch]).unwrap();
        assert_eq!(back.value(0, "mixed"), Some(&Value::from("1")));
    }

    #[test]
    fn test_batches_back_to_table() {
        let table = mixed_table();
        let batch = table.to_record_batch().unwrap();
        let back = Table::from_record_batches(&batch.schema(), &[batch]).unwrap();

        assert_eq!(back.columns(), table.columns());
        assert_eq!(back.value(0, "rainfall_mm"), Some(&Value::Float(3000.0)));
        assert_eq!(back.value(1, "year"), Some(&Value::Missing));
        assert_eq!(back.value(1, "state"), Some(&Value::from("Goa")));
    }

    #[test]
    fn test_empty_result_keeps_columns() {
        let schema = Schema::new(vec![Field::new("state", DataType::Utf8, true)]);
        let table = Table::from_record_batches(&schema, &[]).unwrap();
        assert_eq!(table.columns(), &["state"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_table_without_columns() {
        let batch = Table::empty().to_record_batch().unwrap();
        assert_eq!(batch.num_columns(), 0);
        assert_eq!(batch.num_rows(), 0);
    }
}
