//! Row and table shapes for single- and multi-element data.
//!
//! A [`Row`] is one element's field → value pairs; a [`Table`] is many rows
//! sharing a column set. Row indices are implicit and always contiguous from
//! zero, so re-indexing after a sort is free.

use crate::error::{SawError, SawResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Field values for exactly one simulated element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    fields: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new<S: Into<String>>(fields: Vec<S>, values: Vec<Value>) -> SawResult<Self> {
        if fields.len() != values.len() {
            return Err(SawError::Assertion(format!(
                "{} field name(s) but {} value(s)",
                fields.len(),
                values.len()
            )));
        }
        Ok(Self {
            fields: fields.into_iter().map(Into::into).collect(),
            values,
        })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .position(|f| f == field)
            .map(|idx| &self.values[idx])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// Field values for many elements of one object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from row-major data.
    pub fn from_rows<S: Into<String>>(columns: Vec<S>, rows: Vec<Vec<Value>>) -> SawResult<Self> {
        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Build a table from column-major data, the layout the engine returns.
    pub fn from_columns<S: Into<String>>(
        columns: Vec<S>,
        data: Vec<Vec<Value>>,
    ) -> SawResult<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.len() != data.len() {
            return Err(SawError::InputType(format!(
                "{} column name(s) but {} data column(s)",
                columns.len(),
                data.len()
            )));
        }
        let height = data.first().map(Vec::len).unwrap_or(0);
        if let Some((idx, col)) = data.iter().enumerate().find(|(_, c)| c.len() != height) {
            return Err(SawError::InputType(format!(
                "column '{}' has {} value(s), expected {}",
                columns[idx],
                col.len(),
                height
            )));
        }

        let mut rows = vec![Vec::with_capacity(columns.len()); height];
        for col in data {
            for (row, value) in rows.iter_mut().zip(col) {
                row.push(value);
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> SawResult<()> {
        if row.len() != self.columns.len() {
            return Err(SawError::InputType(format!(
                "row {} has {} value(s), expected {}",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Vec<Value>] {
        &mut self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Row `idx` as a standalone [`Row`].
    pub fn row(&self, idx: usize) -> Option<Row> {
        self.rows.get(idx).map(|values| Row {
            fields: self.columns.clone(),
            values: values.clone(),
        })
    }

    /// Stable ascending sort by one column.
    pub fn sort_by_column(&mut self, column: usize) {
        self.rows.sort_by(|a, b| a[column].sort_cmp(&b[column]));
    }

    /// New table with only the named columns, in the given order.
    pub fn select(&self, columns: &[&str]) -> SawResult<Table> {
        let indices = columns
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| {
                    SawError::InputType(format!("table has no column '{name}'"))
                })
            })
            .collect::<SawResult<Vec<_>>>()?;
        Ok(Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }
}

/// Either tabular shape, the input and output of the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Row(Row),
    Table(Table),
}

impl Frame {
    /// Field names: a row's labels or a table's columns.
    pub fn fields(&self) -> &[String] {
        match self {
            Frame::Row(row) => row.fields(),
            Frame::Table(table) => table.columns(),
        }
    }

    pub fn into_row(self) -> SawResult<Row> {
        match self {
            Frame::Row(row) => Ok(row),
            Frame::Table(_) => Err(SawError::InputType("expected a row, got a table".into())),
        }
    }

    pub fn into_table(self) -> SawResult<Table> {
        match self {
            Frame::Table(table) => Ok(table),
            Frame::Row(_) => Err(SawError::InputType("expected a table, got a row".into())),
        }
    }
}

impl From<Row> for Frame {
    fn from(row: Row) -> Self {
        Frame::Row(row)
    }
}

impl From<Table> for Frame {
    fn from(table: Table) -> Self {
        Frame::Table(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_columns_transposes() {
        let table = Table::from_columns(
            vec!["BusNum", "BusName"],
            vec![
                vec![Value::from("2"), Value::from("1")],
                vec![Value::from("Two"), Value::from("One")],
            ],
        )
        .unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.value(0, "BusName"), Some(&Value::from("Two")));
        assert_eq!(table.value(1, "BusNum"), Some(&Value::from("1")));
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let err = Table::from_columns(
            vec!["a", "b"],
            vec![vec![Value::Int(1)], vec![Value::Int(1), Value::Int(2)]],
        )
        .unwrap_err();
        assert!(matches!(err, SawError::InputType(_)));
    }

    #[test]
    fn row_length_mismatch_is_an_assertion() {
        let err = Row::new(vec!["a", "b"], vec![Value::Int(1)]).unwrap_err();
        assert!(matches!(err, SawError::Assertion(_)));
    }

    #[test]
    fn select_reorders_columns() {
        let table = Table::from_rows(
            vec!["a", "b", "c"],
            vec![vec![Value::Int(1), Value::Int(2), Value::Int(3)]],
        )
        .unwrap();
        let picked = table.select(&["c", "a"]).unwrap();
        assert_eq!(picked.columns(), &["c".to_string(), "a".to_string()]);
        assert_eq!(picked.rows()[0], vec![Value::Int(3), Value::Int(1)]);
        assert!(table.select(&["z"]).is_err());
    }
}
