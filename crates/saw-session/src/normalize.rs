//! Cleaning of engine results into strictly-typed rows and tables.
//!
//! The engine hands back padded strings for everything. Cleaning uses the
//! field catalog to decide, per field, whether a cell becomes a number or a
//! trimmed string, and orders tables by bus number when that column is
//! present. Cleaning is idempotent: a clean frame passes through unchanged.

use saw_core::{
    FieldCatalog, FieldDataType, FieldDescriptor, Frame, Row, SawError, SawResult, Table, Value,
    Variant,
};

/// Column tables are sorted by, when present.
pub const SORT_COLUMN: &str = "BusNum";

/// Clean a row or a table against `catalog`.
pub fn clean(frame: Frame, catalog: &FieldCatalog) -> SawResult<Frame> {
    Ok(match frame {
        Frame::Row(row) => Frame::Row(clean_row(row, catalog)?),
        Frame::Table(table) => Frame::Table(clean_table(table, catalog)?),
    })
}

pub fn clean_row(mut row: Row, catalog: &FieldCatalog) -> SawResult<Row> {
    let descriptors = catalog.lookup(row.fields())?;
    let descriptors: Vec<FieldDescriptor> = descriptors.into_iter().cloned().collect();
    for (value, field) in row.values_mut().iter_mut().zip(&descriptors) {
        *value = coerce(std::mem::replace(value, Value::Null), field, catalog)?;
    }
    Ok(row)
}

pub fn clean_table(mut table: Table, catalog: &FieldCatalog) -> SawResult<Table> {
    let descriptors: Vec<FieldDescriptor> = catalog
        .lookup(table.columns())?
        .into_iter()
        .cloned()
        .collect();
    for row in table.rows_mut() {
        for (value, field) in row.iter_mut().zip(&descriptors) {
            *value = coerce(std::mem::replace(value, Value::Null), field, catalog)?;
        }
    }
    if let Some(idx) = table.column_index(SORT_COLUMN) {
        table.sort_by_column(idx);
    }
    Ok(table)
}

/// Coerce one cell to the type `field` declares.
fn coerce(value: Value, field: &FieldDescriptor, catalog: &FieldCatalog) -> SawResult<Value> {
    if !field.data_type.is_numeric() {
        return Ok(match value {
            Value::Null => Value::Text(String::new()),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.len() == s.len() {
                    Value::Text(s)
                } else {
                    Value::Text(trimmed.to_string())
                }
            }
            other => Value::Text(other.to_string()),
        });
    }

    let integer = field.data_type == FieldDataType::Integer;
    match value {
        Value::Null => Ok(Value::Real(f64::NAN)),
        Value::Int(i) if integer => Ok(Value::Int(i)),
        Value::Int(i) => Ok(Value::Real(i as f64)),
        Value::Real(x) => Ok(real_or_int(x, integer)),
        Value::Text(s) => {
            let text = s.trim();
            if text.is_empty() {
                return Ok(Value::Real(f64::NAN));
            }
            if integer {
                if let Ok(i) = text.parse::<i64>() {
                    return Ok(Value::Int(i));
                }
            }
            text.parse::<f64>()
                .map(|x| real_or_int(x, integer))
                .map_err(|_| SawError::TypeCoercion {
                    object_type: catalog.object_type().to_string(),
                    field: field.internal_name.clone(),
                    value: s.clone(),
                })
        }
    }
}

/// Integer fields keep whole numbers as integers; anything with a fraction
/// (or NaN) stays real.
fn real_or_int(x: f64, integer: bool) -> Value {
    if integer && x.is_finite() && x.fract() == 0.0 && x.abs() < i64::MAX as f64 {
        Value::Int(x as i64)
    } else {
        Value::Real(x)
    }
}

/// Build an uncleaned row from a single-element payload (one value per field).
pub fn row_from_payload<S: AsRef<str>>(fields: &[S], payload: Variant) -> SawResult<Row> {
    let values = payload.into_array().ok_or_else(|| {
        SawError::InputType("single-element payload is not an array".to_string())
    })?;
    if values.len() != fields.len() {
        return Err(SawError::InputType(format!(
            "{} value(s) returned for {} field(s)",
            values.len(),
            fields.len()
        )));
    }
    Row::new(
        fields.iter().map(|f| f.as_ref().to_string()).collect(),
        values.into_iter().map(Value::from).collect(),
    )
}

/// Build an uncleaned table from a column-major payload (one array per field).
pub fn table_from_payload<S: AsRef<str>>(fields: &[S], payload: Variant) -> SawResult<Table> {
    let columns = payload.into_array().ok_or_else(|| {
        SawError::InputType("multi-element payload is not an array of columns".to_string())
    })?;
    if columns.len() != fields.len() {
        return Err(SawError::InputType(format!(
            "{} column(s) returned for {} field(s)",
            columns.len(),
            fields.len()
        )));
    }
    let columns = columns
        .into_iter()
        .map(|column| match column {
            Variant::Array(cells) => Ok(cells.into_iter().map(Value::from).collect()),
            other => Err(SawError::InputType(format!(
                "result column is a {}, not an array",
                other.kind()
            ))),
        })
        .collect::<SawResult<Vec<Vec<Value>>>>()?;
    Table::from_columns(fields.iter().map(|f| f.as_ref().to_string()).collect(), columns)
}

/// Whether every column of an enumeration result is empty, the engine's
/// way of saying the type has no instances.
pub fn all_columns_empty(payload: &Variant) -> bool {
    match payload {
        Variant::Array(columns) => columns.iter().all(|c| match c {
            Variant::Empty => true,
            Variant::Array(cells) => cells.is_empty(),
            _ => false,
        }),
        Variant::Empty => true,
        _ => false,
    }
}
