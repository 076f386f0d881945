//! Public operations on a [`Session`].
//!
//! Each operation validates field names against the cached catalog before
//! anything is sent, routes the engine's reply through the classifier, and
//! cleans tabular results. "No instances" is a normal outcome and comes back
//! as `None`, never as an empty table.

use crate::classify::Payload;
use crate::normalize::{self, all_columns_empty, row_from_payload, table_from_payload};
use crate::paths::{to_posix, to_windows};
use crate::power_flow::{power_flow_fields, supported_types};
use crate::session::Session;
use saw_core::{
    CaseFileType, FieldCatalog, Frame, KeyFieldSet, ObjectType, Row, SawError, SawResult,
    SolveMethod, Table, Value, Variant,
};
use saw_transport::SimAutoFunction;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Columns of a specific-field listing.
pub const SPECIFIC_FIELD_LIST_COLUMNS: [&str; 4] = [
    "variablename:location",
    "field",
    "column header",
    "field description",
];

/// Result of the flat-output queries: a count of objects and fields followed
/// by every value, object by object.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatOutput {
    pub objects: usize,
    pub fields: usize,
    pub values: Vec<String>,
}

impl FlatOutput {
    pub fn parse(payload: Variant) -> SawResult<Self> {
        let items = payload.into_array().ok_or_else(|| {
            SawError::InputType("flat output is not an array".to_string())
        })?;
        let count = |idx: usize, what: &str| -> SawResult<usize> {
            items
                .get(idx)
                .and_then(Variant::as_i64)
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| SawError::InputType(format!("flat output has no {what} count")))
        };
        let objects = count(0, "object")?;
        let fields = count(1, "field")?;
        let values: Vec<String> = items[2..]
            .iter()
            .map(|v| v.to_string().trim().to_string())
            .collect();
        if values.len() != objects * fields {
            return Err(SawError::InputType(format!(
                "flat output holds {} value(s) for {objects} object(s) of {fields} field(s)",
                values.len()
            )));
        }
        Ok(Self {
            objects,
            fields,
            values,
        })
    }

    /// Values grouped per object.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.values.chunks(self.fields.max(1))
    }
}

fn names<S: AsRef<str>>(fields: &[S]) -> Variant {
    Variant::strings(fields.iter().map(|f| f.as_ref()))
}

/// Outgoing cell; missing numbers travel as empty variants.
fn to_wire(value: &Value) -> Variant {
    match value {
        Value::Real(x) if x.is_nan() => Variant::Empty,
        other => Variant::from(other),
    }
}

impl Session {
    // Schema

    /// Shared, cached field catalog.
    pub fn field_catalog(&mut self, object_type: impl Into<ObjectType>) -> SawResult<Arc<FieldCatalog>> {
        let object_type = object_type.into();
        self.schema
            .field_catalog(self.transport.as_mut(), &object_type)
    }

    /// A private copy of the field catalog, for callers that want to modify it.
    pub fn field_catalog_copy(&mut self, object_type: impl Into<ObjectType>) -> SawResult<FieldCatalog> {
        let catalog = self.field_catalog(object_type)?;
        Ok(FieldCatalog::clone(&catalog))
    }

    /// Field catalog as a table with the field-list columns.
    pub fn get_field_list(&mut self, object_type: impl Into<ObjectType>) -> SawResult<Table> {
        Ok(self.field_catalog(object_type)?.to_table())
    }

    pub fn key_fields(&mut self, object_type: impl Into<ObjectType>) -> SawResult<Arc<KeyFieldSet>> {
        let object_type = object_type.into();
        self.schema.key_fields(self.transport.as_mut(), &object_type)
    }

    /// Key fields as a table indexed by zero-based key position.
    pub fn get_key_fields_for_object_type(
        &mut self,
        object_type: impl Into<ObjectType>,
    ) -> SawResult<Table> {
        Ok(self.key_fields(object_type)?.to_table())
    }

    /// Key field names in position order.
    pub fn get_key_field_list(&mut self, object_type: impl Into<ObjectType>) -> SawResult<Vec<String>> {
        Ok(self
            .key_fields(object_type)?
            .names()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    pub fn identify_numeric_fields<S: AsRef<str>>(
        &mut self,
        object_type: impl Into<ObjectType>,
        fields: &[S],
    ) -> SawResult<Vec<bool>> {
        self.field_catalog(object_type)?.identify_numeric(fields)
    }

    /// Clean a row or table against the object type's catalog.
    pub fn clean(&mut self, frame: Frame, object_type: impl Into<ObjectType>) -> SawResult<Frame> {
        let catalog = self.field_catalog(object_type)?;
        normalize::clean(frame, &catalog)
    }

    pub fn get_specific_field_list<S: AsRef<str>>(
        &mut self,
        object_type: impl Into<ObjectType>,
        fields: &[S],
    ) -> SawResult<Table> {
        let object_type = object_type.into();
        let payload = self.call(
            SimAutoFunction::GetSpecificFieldList,
            &[Variant::from(object_type.as_str()), names(fields)],
        )?;
        let mut table = Table::new(SPECIFIC_FIELD_LIST_COLUMNS.to_vec());
        let Some(entries) = payload.into_variant().and_then(Variant::into_array) else {
            return Ok(table);
        };
        for entry in entries {
            let cells = entry.into_array().ok_or_else(|| {
                SawError::InputType("specific field entry is not an array".to_string())
            })?;
            let mut row: Vec<Value> = cells
                .iter()
                .take(SPECIFIC_FIELD_LIST_COLUMNS.len())
                .map(|c| Value::Text(c.to_string().trim().to_string()))
                .collect();
            row.resize(SPECIFIC_FIELD_LIST_COLUMNS.len(), Value::Text(String::new()));
            table.push_row(row)?;
        }
        table.sort_by_column(0);
        Ok(table)
    }

    /// Highest location number used by `field`; the engine answers `-1` on
    /// failure, which surfaces as a remote error.
    pub fn get_specific_field_max_num(
        &mut self,
        object_type: impl Into<ObjectType>,
        field: &str,
    ) -> SawResult<i64> {
        let object_type = object_type.into();
        match self.call(
            SimAutoFunction::GetSpecificFieldMaxNum,
            &[Variant::from(object_type.as_str()), Variant::from(field)],
        )? {
            Payload::Count(n) => Ok(n),
            other => Err(SawError::RemoteOperation(format!(
                "GetSpecificFieldMaxNum returned {other:?} instead of an integer"
            ))),
        }
    }

    fn require_keys<S: AsRef<str>>(&mut self, object_type: &ObjectType, fields: &[S]) -> SawResult<()> {
        let keys = self.key_fields(object_type)?;
        let missing: Vec<String> = keys
            .names()
            .into_iter()
            .filter(|key| !fields.iter().any(|f| f.as_ref() == *key))
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SawError::MissingKeyFields {
                object_type: object_type.to_string(),
                fields: missing,
            })
        }
    }

    // Reads

    /// Read one element. `values` carries the key values at the key
    /// positions; other entries are placeholders.
    pub fn read_one<S: AsRef<str>>(
        &mut self,
        object_type: impl Into<ObjectType>,
        fields: &[S],
        values: &[Variant],
    ) -> SawResult<Row> {
        let object_type = object_type.into();
        if fields.len() != values.len() {
            return Err(SawError::Assertion(format!(
                "{} field(s) but {} value(s)",
                fields.len(),
                values.len()
            )));
        }
        let catalog = self.field_catalog(&object_type)?;
        catalog.lookup(fields)?;
        self.require_keys(&object_type, fields)?;

        let payload = self.call(
            SimAutoFunction::GetParametersSingleElement,
            &[
                Variant::from(object_type.as_str()),
                names(fields),
                Variant::Array(values.to_vec()),
            ],
        )?;
        let payload = payload.into_variant().ok_or_else(|| {
            SawError::RemoteOperation(format!(
                "GetParametersSingleElement returned no data for '{object_type}'"
            ))
        })?;
        normalize::clean_row(row_from_payload(fields, payload)?, &catalog)
    }

    /// Read fields of every element of a type, `None` when there are none.
    pub fn read_many<S: AsRef<str>>(
        &mut self,
        object_type: impl Into<ObjectType>,
        fields: &[S],
        filter: &str,
    ) -> SawResult<Option<Table>> {
        let object_type = object_type.into();
        let catalog = self.field_catalog(&object_type)?;
        catalog.lookup(fields)?;

        let payload = self.call(
            SimAutoFunction::GetParametersMultipleElement,
            &[
                Variant::from(object_type.as_str()),
                names(fields),
                Variant::from(filter),
            ],
        )?;
        let Some(payload) = payload.into_variant() else {
            debug!(%object_type, "no elements");
            return Ok(None);
        };
        if all_columns_empty(&payload) {
            return Ok(None);
        }
        let table = table_from_payload(fields, payload)?;
        Ok(Some(normalize::clean_table(table, &catalog)?))
    }

    /// Flat-output variant of [`Session::read_many`]; values are not cleaned.
    pub fn read_many_flat<S: AsRef<str>>(
        &mut self,
        object_type: impl Into<ObjectType>,
        fields: &[S],
        filter: &str,
    ) -> SawResult<Option<FlatOutput>> {
        let object_type = object_type.into();
        self.field_catalog(&object_type)?.lookup(fields)?;
        let payload = self.call(
            SimAutoFunction::GetParametersMultipleElementFlatOutput,
            &[
                Variant::from(object_type.as_str()),
                names(fields),
                Variant::from(filter),
            ],
        )?;
        payload.into_variant().map(FlatOutput::parse).transpose()
    }

    /// Power-flow quantities for one of the supported object types.
    pub fn get_power_flow_results(
        &mut self,
        object_type: impl Into<ObjectType>,
    ) -> SawResult<Option<Table>> {
        let object_type = object_type.into();
        let fields = power_flow_fields(&object_type).ok_or_else(|| {
            SawError::Assertion(format!(
                "unsupported object type '{object_type}' for power flow results; supported: {}",
                supported_types().join(", ")
            ))
        })?;
        self.read_many(object_type, fields, "")
    }

    // Enumeration

    /// Key fields of every element of a type, `None` when there are none.
    pub fn list_devices(
        &mut self,
        object_type: impl Into<ObjectType>,
        filter: &str,
    ) -> SawResult<Option<Table>> {
        let object_type = object_type.into();
        let keys = self.key_fields(&object_type)?;
        let catalog = self.field_catalog(&object_type)?;
        let payload = self.call(
            SimAutoFunction::ListOfDevices,
            &[Variant::from(object_type.as_str()), Variant::from(filter)],
        )?;
        let Some(payload) = payload.into_variant() else {
            return Ok(None);
        };
        if all_columns_empty(&payload) {
            debug!(%object_type, "no devices");
            return Ok(None);
        }
        let table = table_from_payload(&keys.names(), payload)?;
        Ok(Some(normalize::clean_table(table, &catalog)?))
    }

    /// Raw device listing with every value as a string.
    pub fn list_devices_as_variant_strings(
        &mut self,
        object_type: impl Into<ObjectType>,
        filter: &str,
    ) -> SawResult<Option<Variant>> {
        let object_type = object_type.into();
        Ok(self
            .call(
                SimAutoFunction::ListOfDevicesAsVariantStrings,
                &[Variant::from(object_type.as_str()), Variant::from(filter)],
            )?
            .into_variant())
    }

    pub fn list_devices_flat(
        &mut self,
        object_type: impl Into<ObjectType>,
        filter: &str,
    ) -> SawResult<Option<FlatOutput>> {
        let object_type = object_type.into();
        self.call(
            SimAutoFunction::ListOfDevicesFlatOutput,
            &[Variant::from(object_type.as_str()), Variant::from(filter)],
        )?
        .into_variant()
        .map(FlatOutput::parse)
        .transpose()
    }

    // Writes

    /// Change one element. No read-back.
    pub fn write_one<S: AsRef<str>>(
        &mut self,
        object_type: impl Into<ObjectType>,
        fields: &[S],
        values: &[Variant],
    ) -> SawResult<()> {
        let object_type = object_type.into();
        if fields.len() != values.len() {
            return Err(SawError::Assertion(format!(
                "{} field(s) but {} value(s)",
                fields.len(),
                values.len()
            )));
        }
        let catalog = self.field_catalog(&object_type)?;
        catalog.lookup(fields)?;
        self.require_keys(&object_type, fields)?;

        let row = Row::new(
            fields.iter().map(|f| f.as_ref().to_string()).collect(),
            values.iter().map(Value::from).collect(),
        )?;
        let row = normalize::clean_row(row, &catalog)?;
        self.call(
            SimAutoFunction::ChangeParametersSingleElement,
            &[
                Variant::from(object_type.as_str()),
                names(fields),
                Variant::Array(row.values().iter().map(to_wire).collect()),
            ],
        )?;
        Ok(())
    }

    /// Change many elements from a table whose columns are field names.
    /// Key fields are required. No read-back.
    pub fn write_many(&mut self, object_type: impl Into<ObjectType>, table: &Table) -> SawResult<()> {
        let object_type = object_type.into();
        self.write_table(&object_type, table).map(|_| ())
    }

    /// Validate, clean, and send a bulk write; returns the cleaned table.
    pub(crate) fn write_table(&mut self, object_type: &ObjectType, table: &Table) -> SawResult<Table> {
        let catalog = self.field_catalog(object_type)?;
        catalog.lookup(table.columns())?;
        self.require_keys(object_type, table.columns())?;

        let cleaned = normalize::clean_table(table.clone(), &catalog)?;
        if cleaned.is_empty() {
            debug!(%object_type, "nothing to write");
            return Ok(cleaned);
        }
        let rows = cleaned
            .rows()
            .iter()
            .map(|row| Variant::Array(row.iter().map(to_wire).collect()))
            .collect();
        self.call(
            SimAutoFunction::ChangeParametersMultipleElement,
            &[
                Variant::from(object_type.as_str()),
                names(cleaned.columns()),
                Variant::Array(rows),
            ],
        )?;
        debug!(%object_type, rows = cleaned.height(), "bulk write sent");
        Ok(cleaned)
    }

    /// Flat-input bulk write: `values` holds every field of object 1, then
    /// object 2, and so on.
    pub fn write_many_flat<S: AsRef<str>>(
        &mut self,
        object_type: impl Into<ObjectType>,
        fields: &[S],
        objects: usize,
        values: &[Variant],
    ) -> SawResult<()> {
        let object_type = object_type.into();
        if values.len() != objects * fields.len() {
            return Err(SawError::Assertion(format!(
                "{} value(s) do not fill {objects} object(s) of {} field(s)",
                values.len(),
                fields.len()
            )));
        }
        if values.iter().any(|v| matches!(v, Variant::Array(_))) {
            return Err(SawError::Assertion(
                "flat input values must not be nested".to_string(),
            ));
        }
        self.field_catalog(&object_type)?.lookup(fields)?;
        self.require_keys(&object_type, fields)?;
        self.call(
            SimAutoFunction::ChangeParametersMultipleElementFlatInput,
            &[
                Variant::from(object_type.as_str()),
                names(fields),
                Variant::Int(objects as i64),
                Variant::Array(values.to_vec()),
            ],
        )?;
        Ok(())
    }

    // Case lifecycle

    /// Open a case of a specific file type, with optional load options.
    pub fn open_case_type(
        &mut self,
        path: &Path,
        file_type: &CaseFileType,
        options: &[String],
    ) -> SawResult<()> {
        let path = to_posix(path);
        let options = match options {
            [] => Variant::from(""),
            [single] => Variant::from(single.as_str()),
            many => Variant::strings(many.iter().cloned()),
        };
        self.call(
            SimAutoFunction::OpenCaseType,
            &[
                Variant::from(path.as_str()),
                Variant::from(file_type.tag()),
                options,
            ],
        )?;
        info!(case = %path, %file_type, "opened case");
        self.case_path = Some(path);
        Ok(())
    }

    /// Save the case, to the tracked path when `path` is `None`.
    pub fn save_case(
        &mut self,
        path: Option<&Path>,
        file_type: &CaseFileType,
        overwrite: bool,
    ) -> SawResult<()> {
        let target = match path {
            Some(path) => to_windows(path),
            None => to_windows(self.case_path.as_deref().ok_or(SawError::NoCaseOpen)?),
        };
        self.call(
            SimAutoFunction::SaveCase,
            &[
                Variant::from(target.as_str()),
                Variant::from(file_type.tag()),
                Variant::Bool(overwrite),
            ],
        )?;
        info!(case = %target, %file_type, "saved case");
        Ok(())
    }

    /// Snapshot the system state inside the engine.
    pub fn save_state(&mut self) -> SawResult<()> {
        self.call(SimAutoFunction::SaveState, &[]).map(|_| ())
    }

    /// Restore the snapshot taken by [`Session::save_state`].
    pub fn load_state(&mut self) -> SawResult<()> {
        self.call(SimAutoFunction::LoadState, &[]).map(|_| ())
    }

    /// Header lines of a case file, the tracked case by default.
    pub fn get_case_header(&mut self, path: Option<&Path>) -> SawResult<Vec<String>> {
        let path = match path {
            Some(path) => to_posix(path),
            None => self.case_path.clone().ok_or(SawError::NoCaseOpen)?,
        };
        let payload = self.call(SimAutoFunction::GetCaseHeader, &[Variant::from(path)])?;
        Ok(match payload.into_variant() {
            Some(Variant::Array(lines)) => lines.iter().map(|l| l.to_string()).collect(),
            Some(line) => vec![line.to_string()],
            None => Vec::new(),
        })
    }

    // Scripting

    /// Run script statements in order, stopping at the first failure.
    pub fn run_script<S: AsRef<str>>(&mut self, statements: &[S]) -> SawResult<()> {
        for statement in statements {
            let statement = statement.as_ref();
            debug!(statement, "running script command");
            self.call(SimAutoFunction::RunScriptCommand, &[Variant::from(statement)])?;
        }
        Ok(())
    }

    pub fn solve_power_flow(&mut self, method: SolveMethod) -> SawResult<()> {
        info!(%method, "solving power flow");
        self.run_script(&[method.script_command()])
    }

    pub fn process_aux_file(&mut self, path: &Path) -> SawResult<()> {
        let path = to_posix(path);
        self.call(SimAutoFunction::ProcessAuxFile, &[Variant::from(path)])
            .map(|_| ())
    }

    /// Write fields of an object type to an auxiliary file. An empty field
    /// list writes every field.
    pub fn write_aux_file<S: AsRef<str>>(
        &mut self,
        path: &Path,
        filter: &str,
        object_type: impl Into<ObjectType>,
        fields: &[S],
        append: bool,
    ) -> SawResult<()> {
        let object_type = object_type.into();
        let field_list = if fields.is_empty() {
            Variant::from("ALL")
        } else {
            self.field_catalog(&object_type)?.lookup(fields)?;
            names(fields)
        };
        self.call(
            SimAutoFunction::WriteAuxFile,
            &[
                Variant::from(to_posix(path)),
                Variant::from(filter),
                Variant::from(object_type.as_str()),
                Variant::Bool(append),
                field_list,
            ],
        )
        .map(|_| ())
    }

    /// Export to a spreadsheet in the engine's host. An empty field list
    /// exports the engine's default fields.
    pub fn send_to_excel<S: AsRef<str>>(
        &mut self,
        object_type: impl Into<ObjectType>,
        filter: &str,
        fields: &[S],
    ) -> SawResult<()> {
        let object_type = object_type.into();
        let field_list = if fields.is_empty() {
            Variant::from("ALL")
        } else {
            names(fields)
        };
        self.call(
            SimAutoFunction::SendToExcel,
            &[
                Variant::from(object_type.as_str()),
                Variant::from(filter),
                field_list,
            ],
        )
        .map(|_| ())
    }
}
