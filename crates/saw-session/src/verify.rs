//! Verified bulk writes.
//!
//! The engine silently ignores some writes (a regulated voltage set through
//! the wrong field, for instance). A verified write re-reads what it wrote
//! and compares: numeric fields within the session tolerance, everything
//! else exactly. Rows are matched on key fields.

use crate::session::Session;
use saw_core::{
    FieldCatalog, KeyFieldSet, ObjectType, SawError, SawResult, Table, Tolerance, Value,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Where a verified write stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    /// Issued, not yet re-read.
    Dirty,
    /// Every compared value matched.
    Confirmed,
    /// At least one value did not stick.
    Rejected,
}

/// Outcome of a confirmed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub state: WriteState,
    pub rows_written: usize,
    pub rows_compared: usize,
    /// Requested rows the re-read did not return.
    pub rows_missing: usize,
}

#[derive(Debug, Default)]
struct Comparison {
    compared: usize,
    missing: usize,
    mismatches: Vec<String>,
}

impl Session {
    /// Write `table` and confirm the engine kept every value.
    ///
    /// Fails with [`SawError::CommandNotRespected`] listing each mismatch.
    /// Requested rows absent from the re-read are logged and skipped.
    pub fn write_many_verified(
        &mut self,
        object_type: impl Into<ObjectType>,
        table: &Table,
    ) -> SawResult<WriteReport> {
        let object_type = object_type.into();
        let requested = self.write_table(&object_type, table)?;
        let mut state = WriteState::Dirty;
        debug!(%object_type, ?state, rows = requested.height(), "re-reading written rows");

        let comparison = if requested.is_empty() {
            Comparison::default()
        } else {
            let reread = self.read_many(&object_type, requested.columns(), "")?;
            let keys = self.key_fields(&object_type)?;
            let catalog = self.field_catalog(&object_type)?;
            compare(&requested, reread.as_ref(), &keys, &catalog, self.tolerance())?
        };

        if comparison.mismatches.is_empty() {
            state = WriteState::Confirmed;
            info!(
                %object_type,
                rows = comparison.compared,
                missing = comparison.missing,
                "write confirmed"
            );
            return Ok(WriteReport {
                state,
                rows_written: requested.height(),
                rows_compared: comparison.compared,
                rows_missing: comparison.missing,
            });
        }

        state = WriteState::Rejected;
        warn!(
            %object_type,
            ?state,
            mismatches = comparison.mismatches.len(),
            "write not respected; try a different field (e.g. GenVoltSet instead of GenRegPUVolt)"
        );
        Err(SawError::CommandNotRespected {
            object_type: object_type.to_string(),
            mismatches: comparison.mismatches,
        })
    }
}

/// Key cell as a join string; whole reals and integers spell the same.
fn key_repr(value: &Value) -> String {
    match value {
        Value::Real(x) if x.fract() == 0.0 && x.is_finite() => format!("{}", *x as i64),
        other => other.to_string(),
    }
}

fn compare(
    requested: &Table,
    reread: Option<&Table>,
    keys: &KeyFieldSet,
    catalog: &FieldCatalog,
    tolerance: Tolerance,
) -> SawResult<Comparison> {
    let Some(reread) = reread else {
        return Ok(Comparison {
            mismatches: vec![format!(
                "re-read returned no {} rows",
                catalog.object_type()
            )],
            ..Comparison::default()
        });
    };

    let key_names = keys.names();
    let index_of = |table: &Table, names: &[&str]| -> SawResult<Vec<usize>> {
        let mut missing = Vec::new();
        let idx: Vec<usize> = names
            .iter()
            .filter_map(|name| {
                let found = table.column_index(name);
                if found.is_none() {
                    missing.push(name.to_string());
                }
                found
            })
            .collect();
        if missing.is_empty() {
            Ok(idx)
        } else {
            Err(SawError::MissingKeyFields {
                object_type: catalog.object_type().to_string(),
                fields: missing,
            })
        }
    };
    let requested_keys = index_of(requested, &key_names)?;
    let reread_keys = index_of(reread, &key_names)?;

    let join_key = |row: &[Value], idx: &[usize]| -> String {
        idx.iter()
            .map(|&i| key_repr(&row[i]))
            .collect::<Vec<_>>()
            .join("\u{1f}")
    };
    let describe = |row: &[Value]| -> String {
        key_names
            .iter()
            .zip(&requested_keys)
            .map(|(name, &i)| format!("{name}={}", row[i]))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let by_key: HashMap<String, &Vec<Value>> = reread
        .rows()
        .iter()
        .map(|row| (join_key(row, &reread_keys), row))
        .collect();
    let numeric = catalog.identify_numeric(requested.columns())?;

    let mut comparison = Comparison::default();
    for row in requested.rows() {
        let Some(actual) = by_key.get(&join_key(row, &requested_keys)) else {
            warn!(row = %describe(row), "written row missing from re-read");
            comparison.missing += 1;
            continue;
        };
        comparison.compared += 1;

        for (col, field) in requested.columns().iter().enumerate() {
            if requested_keys.contains(&col) {
                continue;
            }
            let Some(other) = reread.column_index(field) else {
                continue;
            };
            let wanted = &row[col];
            let held = &actual[other];
            let matches = if numeric[col] {
                match (wanted.as_f64(), held.as_f64()) {
                    (Some(a), Some(b)) => tolerance.is_close(a, b),
                    _ => false,
                }
            } else {
                wanted == held
            };
            if !matches {
                comparison.mismatches.push(format!(
                    "{}: {field} requested {wanted}, engine holds {held}",
                    describe(row)
                ));
            }
        }
    }
    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use saw_core::Variant;

    fn catalog() -> FieldCatalog {
        let payload = Variant::Array(vec![
            Variant::strings(["*1*", "BusNum", "Integer", "Number", "Number"]),
            Variant::strings(["", "BusName", "String", "Name", "Name"]),
            Variant::strings(["", "BusPUVolt", "Real", "Voltage", "PU Volt"]),
        ]);
        FieldCatalog::from_payload(ObjectType::new("bus"), &payload).unwrap()
    }

    fn table(rows: Vec<Vec<Value>>) -> Table {
        Table::from_rows(vec!["BusNum", "BusName", "BusPUVolt"], rows).unwrap()
    }

    #[test]
    fn values_within_tolerance_match() {
        let catalog = catalog();
        let keys = KeyFieldSet::derive(&catalog).unwrap();
        let requested = table(vec![vec![1.into(), "One".into(), 1.02.into()]]);
        let reread = table(vec![vec![1.into(), "One".into(), (1.02 + 1e-12).into()]]);

        let cmp = compare(&requested, Some(&reread), &keys, &catalog, Tolerance::default()).unwrap();
        assert!(cmp.mismatches.is_empty());
        assert_eq!(cmp.compared, 1);
    }

    #[test]
    fn numeric_and_text_mismatches_are_listed() {
        let catalog = catalog();
        let keys = KeyFieldSet::derive(&catalog).unwrap();
        let requested = table(vec![vec![1.into(), "One".into(), 1.05.into()]]);
        let reread = table(vec![vec![1.into(), "Uno".into(), 1.0.into()]]);

        let cmp = compare(&requested, Some(&reread), &keys, &catalog, Tolerance::default()).unwrap();
        assert_eq!(cmp.mismatches.len(), 2);
        assert!(cmp.mismatches[1].contains("BusPUVolt"));
        assert!(cmp.mismatches[1].starts_with("BusNum=1"));
    }

    #[test]
    fn rows_absent_from_reread_are_counted_not_failed() {
        let catalog = catalog();
        let keys = KeyFieldSet::derive(&catalog).unwrap();
        let requested = table(vec![
            vec![1.into(), "One".into(), 1.0.into()],
            vec![7.into(), "Seven".into(), 1.0.into()],
        ]);
        let reread = table(vec![vec![1.into(), "One".into(), 1.0.into()]]);

        let cmp = compare(&requested, Some(&reread), &keys, &catalog, Tolerance::default()).unwrap();
        assert!(cmp.mismatches.is_empty());
        assert_eq!((cmp.compared, cmp.missing), (1, 1));
    }

    #[test]
    fn nan_never_matches() {
        let catalog = catalog();
        let keys = KeyFieldSet::derive(&catalog).unwrap();
        let requested = table(vec![vec![1.into(), "One".into(), f64::NAN.into()]]);
        let reread = requested.clone();

        let cmp = compare(&requested, Some(&reread), &keys, &catalog, Tolerance::default()).unwrap();
        assert_eq!(cmp.mismatches.len(), 1);
    }

    #[test]
    fn empty_reread_rejects() {
        let catalog = catalog();
        let keys = KeyFieldSet::derive(&catalog).unwrap();
        let requested = table(vec![vec![1.into(), "One".into(), 1.0.into()]]);

        let cmp = compare(&requested, None, &keys, &catalog, Tolerance::default()).unwrap();
        assert_eq!(cmp.mismatches.len(), 1);
    }

    #[test]
    fn whole_real_keys_join_integer_keys() {
        assert_eq!(key_repr(&Value::Real(3.0)), key_repr(&Value::Int(3)));
    }
}
