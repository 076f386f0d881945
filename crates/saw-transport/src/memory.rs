//! In-process engine backed by JSON case snapshots.
//!
//! `MemoryEngine` answers the same remote functions as the real server with
//! the same reply conventions: `("",)` for success without data, `("", x)`
//! for success with data, `("<Function>: <message>",)` for a failure, and a
//! bare integer from `GetSpecificFieldMaxNum`. Numeric cells come back as
//! left-padded strings the way the server formats them, so everything above
//! the transport is exercised exactly as it would be against the real thing.
//!
//! Filters are accepted and ignored. Read-only fields accept writes and
//! silently keep their value.

use crate::error::{TransportError, TransportResult};
use crate::function::{Property, SimAutoFunction};
use crate::transport::Transport;
use parking_lot::Mutex;
use saw_core::{parse_key_marker, FieldDataType, ObjectType, Variant};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const NUMERIC_WIDTH: usize = 8;

fn default_data_type() -> String {
    "String".to_string()
}

/// Schema entry for one field of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default = "default_data_type")]
    pub data_type: String,
    /// Key-field marker (`*1*`, `*2*`, `**`, or empty).
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub read_only: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            data_type: data_type.into(),
            key: String::new(),
            description: String::new(),
            read_only: false,
        }
    }

    pub fn key(mut self, marker: impl Into<String>) -> Self {
        self.key = marker.into();
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    fn is_numeric(&self) -> bool {
        FieldDataType::parse(&self.data_type).is_numeric()
    }

    fn is_integer(&self) -> bool {
        FieldDataType::parse(&self.data_type) == FieldDataType::Integer
    }
}

/// Schema and records of one object type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectData {
    pub fields: Vec<FieldSpec>,
    pub records: Vec<BTreeMap<String, Variant>>,
}

impl ObjectData {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            records: Vec::new(),
        }
    }

    /// Append a record given as `(field, value)` pairs.
    pub fn with_record<I, K, V>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Variant>,
    {
        self.records.push(
            cells
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Key fields in position order.
    fn key_fields(&self) -> Vec<&FieldSpec> {
        let mut keys: Vec<_> = self
            .fields
            .iter()
            .filter_map(|f| parse_key_marker(&f.key).map(|pos| (pos, f)))
            .collect();
        keys.sort_by_key(|(pos, _)| *pos);
        keys.into_iter().map(|(_, f)| f).collect()
    }
}

/// A whole case: header lines plus every object type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryCase {
    pub header: Vec<String>,
    pub objects: BTreeMap<String, ObjectData>,
}

impl MemoryCase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, line: impl Into<String>) -> Self {
        self.header.push(line.into());
        self
    }

    pub fn with_object(mut self, object_type: impl AsRef<str>, data: ObjectData) -> Self {
        self.objects
            .insert(ObjectType::new(object_type).to_string(), data);
        self
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let case: MemoryCase = serde_json::from_str(text)?;
        Ok(case.normalized())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Object type names are case-insensitive; store them folded.
    fn normalized(self) -> Self {
        let objects = self
            .objects
            .into_iter()
            .map(|(name, data)| (ObjectType::new(name).to_string(), data))
            .collect();
        Self {
            header: self.header,
            objects,
        }
    }

    fn object(&self, object_type: &str) -> Option<&ObjectData> {
        self.objects.get(ObjectType::new(object_type).as_str())
    }

    fn object_mut(&mut self, object_type: &str) -> Option<&mut ObjectData> {
        self.objects.get_mut(ObjectType::new(object_type).as_str())
    }
}

#[derive(Debug, Default)]
struct EngineState {
    registered: HashMap<String, MemoryCase>,
    case: Option<MemoryCase>,
    case_path: Option<String>,
    saved_state: Option<MemoryCase>,
    properties: HashMap<Property, Variant>,
    disabled: HashSet<SimAutoFunction>,
    faults: HashMap<SimAutoFunction, String>,
    calls: Vec<(SimAutoFunction, Vec<Variant>)>,
    script_log: Vec<String>,
    exported: Vec<String>,
    released: bool,
}

/// Shared handle to an in-process engine.
///
/// Clones share state, so a test can keep one handle for inspection while a
/// session owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    state: Arc<Mutex<EngineState>>,
}

type Reply = Result<Variant, String>;

fn ok() -> Reply {
    Ok(Variant::Array(vec![Variant::from("")]))
}

fn ok_with(payload: Variant) -> Reply {
    Ok(Variant::Array(vec![Variant::from(""), payload]))
}

fn path_key(path: &str) -> String {
    path.trim().replace('\\', "/")
}

fn arg<'a>(args: &'a [Variant], idx: usize, what: &str) -> Result<&'a Variant, String> {
    args.get(idx)
        .ok_or_else(|| format!("missing argument {} ({what})", idx + 1))
}

fn arg_str(args: &[Variant], idx: usize, what: &str) -> Result<String, String> {
    match arg(args, idx, what)? {
        Variant::Empty => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

fn arg_strings(args: &[Variant], idx: usize, what: &str) -> Result<Vec<String>, String> {
    let value = arg(args, idx, what)?;
    value
        .as_array()
        .map(|items| items.iter().map(|v| v.to_string().trim().to_string()).collect())
        .ok_or_else(|| format!("{what} must be an array, got {}", value.kind()))
}

fn arg_array<'a>(args: &'a [Variant], idx: usize, what: &str) -> Result<&'a [Variant], String> {
    let value = arg(args, idx, what)?;
    value
        .as_array()
        .ok_or_else(|| format!("{what} must be an array, got {}", value.kind()))
}

/// Render a stored cell the way the server does.
fn render(spec: &FieldSpec, cell: Option<&Variant>) -> Variant {
    match cell {
        None | Some(Variant::Empty) => Variant::Empty,
        Some(value) if spec.is_numeric() => {
            Variant::Str(format!("{:>width$}", value.to_string(), width = NUMERIC_WIDTH))
        }
        Some(value) => Variant::Str(value.to_string()),
    }
}

/// Coerce an incoming value to what the field stores.
fn coerce(spec: &FieldSpec, value: &Variant) -> Result<Variant, String> {
    if value.is_empty() {
        return Ok(Variant::Empty);
    }
    if !spec.is_numeric() {
        return Ok(Variant::Str(value.to_string().trim().to_string()));
    }
    let text = value.to_string();
    let text = text.trim();
    if spec.is_integer() {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Variant::Int(i));
        }
    }
    text.parse::<f64>()
        .map(Variant::Real)
        .map_err(|_| format!("invalid value '{text}' for field {}", spec.name))
}

fn cell_matches(spec: &FieldSpec, stored: Option<&Variant>, probe: &Variant) -> bool {
    let Some(stored) = stored else {
        return false;
    };
    let lhs = stored.to_string();
    let rhs = probe.to_string();
    if spec.is_numeric() {
        match (lhs.trim().parse::<f64>(), rhs.trim().parse::<f64>()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    } else {
        lhs.trim() == rhs.trim()
    }
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `case` available under `path` without touching the filesystem.
    pub fn register_case(&self, path: impl AsRef<str>, case: MemoryCase) {
        self.state
            .lock()
            .registered
            .insert(path_key(path.as_ref()), case.normalized());
    }

    /// Start with `case` already open.
    pub fn with_open_case(case: MemoryCase, path: impl AsRef<str>) -> Self {
        let engine = Self::new();
        {
            let mut state = engine.state.lock();
            state.case = Some(case.normalized());
            state.case_path = Some(path_key(path.as_ref()));
        }
        engine
    }

    /// Make `function` unknown to this engine.
    pub fn disable(&self, function: SimAutoFunction) {
        self.state.lock().disabled.insert(function);
    }

    /// Make every call to `function` fail at the transport level.
    pub fn inject_fault(&self, function: SimAutoFunction, message: impl Into<String>) {
        self.state.lock().faults.insert(function, message.into());
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Number of calls received for `function` (including rejected ones).
    pub fn calls_to(&self, function: SimAutoFunction) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(f, _)| *f == function)
            .count()
    }

    /// Arguments of the most recent call to `function`.
    pub fn last_args(&self, function: SimAutoFunction) -> Option<Vec<Variant>> {
        self.state
            .lock()
            .calls
            .iter()
            .rev()
            .find(|(f, _)| *f == function)
            .map(|(_, args)| args.clone())
    }

    pub fn script_log(&self) -> Vec<String> {
        self.state.lock().script_log.clone()
    }

    /// Object types handed to `SendToExcel`.
    pub fn exported(&self) -> Vec<String> {
        self.state.lock().exported.clone()
    }

    /// Snapshot of the open case.
    pub fn case(&self) -> Option<MemoryCase> {
        self.state.lock().case.clone()
    }

    pub fn case_path(&self) -> Option<String> {
        self.state.lock().case_path.clone()
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }
}

impl EngineState {
    fn dispatch(&mut self, function: SimAutoFunction, args: &[Variant]) -> Reply {
        use SimAutoFunction::*;
        match function {
            OpenCase | OpenCaseType => self.open_case(args),
            CloseCase => {
                self.case = None;
                ok()
            }
            SaveCase => self.save_case(args),
            SaveState => {
                let case = self.open()?.clone();
                self.saved_state = Some(case);
                ok()
            }
            LoadState => {
                let saved = self
                    .saved_state
                    .clone()
                    .ok_or_else(|| "no saved state to restore".to_string())?;
                self.case = Some(saved);
                ok()
            }
            GetCaseHeader => {
                let header = &self.open()?.header;
                if header.is_empty() {
                    ok()
                } else {
                    ok_with(Variant::strings(header.iter().cloned()))
                }
            }
            GetFieldList => self.field_list(args),
            GetSpecificFieldList => self.specific_field_list(args),
            GetSpecificFieldMaxNum => Ok(self.specific_field_max_num(args)),
            GetParametersSingleElement => self.get_single(args),
            GetParametersMultipleElement => self.get_multiple(args, false),
            GetParametersMultipleElementFlatOutput => self.get_multiple(args, true),
            ChangeParametersSingleElement => {
                let object_type = arg_str(args, 0, "object type")?;
                let fields = arg_strings(args, 1, "field list")?;
                let values = arg_array(args, 2, "value list")?.to_vec();
                self.change_rows(&object_type, &fields, vec![values])
            }
            ChangeParametersMultipleElement => {
                let object_type = arg_str(args, 0, "object type")?;
                let fields = arg_strings(args, 1, "field list")?;
                let rows = arg_array(args, 2, "value list")?
                    .iter()
                    .map(|row| {
                        row.as_array()
                            .map(<[Variant]>::to_vec)
                            .ok_or_else(|| format!("value row is a {}", row.kind()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.change_rows(&object_type, &fields, rows)
            }
            ChangeParametersMultipleElementFlatInput => {
                let object_type = arg_str(args, 0, "object type")?;
                let fields = arg_strings(args, 1, "field list")?;
                let count = arg(args, 2, "object count")?
                    .as_i64()
                    .ok_or_else(|| "object count must be an integer".to_string())?;
                let flat = arg_array(args, 3, "value list")?;
                if fields.is_empty() || flat.len() != fields.len() * count.max(0) as usize {
                    return Err(format!(
                        "{} value(s) do not fill {count} object(s) of {} field(s)",
                        flat.len(),
                        fields.len()
                    ));
                }
                let rows = flat.chunks(fields.len()).map(<[Variant]>::to_vec).collect();
                self.change_rows(&object_type, &fields, rows)
            }
            ListOfDevices => self.list_devices(args, false),
            ListOfDevicesAsVariantStrings => self.list_devices(args, true),
            ListOfDevicesFlatOutput => self.list_devices_flat(args),
            RunScriptCommand => self.run_script(args),
            ProcessAuxFile => {
                let path = path_key(&arg_str(args, 0, "file name")?);
                if !Path::new(&path).exists() {
                    return Err(format!("file {path} not found"));
                }
                self.script_log.push(format!("LoadAux(\"{path}\")"));
                ok()
            }
            WriteAuxFile => self.write_aux(args),
            SendToExcel => {
                let object_type = arg_str(args, 0, "object type")?;
                self.object(&object_type)?;
                self.exported.push(ObjectType::new(object_type).to_string());
                ok()
            }
        }
    }

    fn open(&self) -> Result<&MemoryCase, String> {
        self.case.as_ref().ok_or_else(|| "no case is open".to_string())
    }

    fn object(&self, object_type: &str) -> Result<&ObjectData, String> {
        self.open()?
            .object(object_type)
            .ok_or_else(|| format!("object type {object_type} not found"))
    }

    fn open_case(&mut self, args: &[Variant]) -> Reply {
        let path = path_key(&arg_str(args, 0, "file name")?);
        let case = match self.registered.get(&path) {
            Some(case) => case.clone(),
            None => {
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| format!("error opening file {path}: {e}"))?;
                MemoryCase::from_json(&text).map_err(|e| format!("error reading {path}: {e}"))?
            }
        };
        info!(path = %path, objects = case.objects.len(), "memory engine opened case");
        self.case = Some(case);
        self.case_path = Some(path);
        ok()
    }

    fn save_case(&mut self, args: &[Variant]) -> Reply {
        let raw = arg_str(args, 0, "file name")?;
        let path = if cfg!(windows) { raw } else { path_key(&raw) };
        let text = self
            .open()?
            .to_json()
            .map_err(|e| format!("error encoding case: {e}"))?;
        std::fs::write(&path, text).map_err(|e| format!("error writing {path}: {e}"))?;
        debug!(path = %path, "memory engine saved case");
        ok()
    }

    fn field_list(&self, args: &[Variant]) -> Reply {
        let object_type = arg_str(args, 0, "object type")?;
        let data = self.object(&object_type)?;
        let entries = data
            .fields
            .iter()
            .map(|f| {
                Variant::strings([
                    f.key.as_str(),
                    f.name.as_str(),
                    f.data_type.as_str(),
                    f.description.as_str(),
                    f.display_name.as_str(),
                ])
            })
            .collect();
        ok_with(Variant::Array(entries))
    }

    fn specific_field_list(&self, args: &[Variant]) -> Reply {
        let object_type = arg_str(args, 0, "object type")?;
        let wanted = arg_strings(args, 1, "field list")?;
        let data = self.object(&object_type)?;
        let all = wanted.iter().any(|w| w.eq_ignore_ascii_case("ALL"));
        let mut entries = Vec::new();
        for field in &data.fields {
            if all || wanted.iter().any(|w| *w == field.name) {
                entries.push(Variant::strings([
                    format!("{}:0", field.name),
                    field.name.clone(),
                    field.display_name.clone(),
                    field.description.clone(),
                ]));
            }
        }
        if entries.is_empty() {
            return Err(format!("no matching fields for {object_type}"));
        }
        ok_with(Variant::Array(entries))
    }

    fn specific_field_max_num(&self, args: &[Variant]) -> Variant {
        let lookup = || -> Result<i64, String> {
            let object_type = arg_str(args, 0, "object type")?;
            let field = arg_str(args, 1, "field")?;
            let data = self.object(&object_type)?;
            if data.field(&field).is_none() {
                return Err(format!("field {field} not found"));
            }
            let prefix = format!("{field}:");
            Ok(data
                .fields
                .iter()
                .filter_map(|f| f.name.strip_prefix(&prefix))
                .filter_map(|n| n.parse::<i64>().ok())
                .max()
                .unwrap_or(0))
        };
        Variant::Int(lookup().unwrap_or(-1))
    }

    fn specs<'a>(data: &'a ObjectData, fields: &[String]) -> Result<Vec<&'a FieldSpec>, String> {
        fields
            .iter()
            .map(|name| {
                data.field(name)
                    .ok_or_else(|| format!("field {name} not found"))
            })
            .collect()
    }

    fn find_record(
        data: &ObjectData,
        fields: &[String],
        values: &[Variant],
    ) -> Result<Option<usize>, String> {
        let keys = data.key_fields();
        let mut probes = Vec::with_capacity(keys.len());
        for key in &keys {
            let idx = fields
                .iter()
                .position(|f| *f == key.name)
                .ok_or_else(|| format!("key field {} not specified", key.name))?;
            probes.push((*key, &values[idx]));
        }
        Ok(data.records.iter().position(|record| {
            probes
                .iter()
                .all(|(spec, probe)| cell_matches(spec, record.get(&spec.name), probe))
        }))
    }

    fn get_single(&self, args: &[Variant]) -> Reply {
        let object_type = arg_str(args, 0, "object type")?;
        let fields = arg_strings(args, 1, "field list")?;
        let values = arg_array(args, 2, "value list")?;
        if values.len() != fields.len() {
            return Err("field and value lists differ in length".into());
        }
        let data = self.object(&object_type)?;
        let specs = Self::specs(data, &fields)?;
        let idx = Self::find_record(data, &fields, values)?
            .ok_or_else(|| format!("object of type {object_type} not found"))?;
        let record = &data.records[idx];
        ok_with(Variant::Array(
            specs
                .iter()
                .map(|spec| render(spec, record.get(&spec.name)))
                .collect(),
        ))
    }

    fn get_multiple(&self, args: &[Variant], flat: bool) -> Reply {
        let object_type = arg_str(args, 0, "object type")?;
        let fields = arg_strings(args, 1, "field list")?;
        let data = self.object(&object_type)?;
        let specs = Self::specs(data, &fields)?;
        if data.records.is_empty() {
            return Err("No data returned".into());
        }
        if flat {
            let mut out = vec![
                Variant::Str(data.records.len().to_string()),
                Variant::Str(specs.len().to_string()),
            ];
            for record in &data.records {
                out.extend(specs.iter().map(|spec| render(spec, record.get(&spec.name))));
            }
            return ok_with(Variant::Array(out));
        }
        let columns = specs
            .iter()
            .map(|spec| {
                Variant::Array(
                    data.records
                        .iter()
                        .map(|record| render(spec, record.get(&spec.name)))
                        .collect(),
                )
            })
            .collect();
        ok_with(Variant::Array(columns))
    }

    fn change_rows(&mut self, object_type: &str, fields: &[String], rows: Vec<Vec<Variant>>) -> Reply {
        let create = self
            .properties
            .get(&Property::CreateIfNotFound)
            .and_then(Variant::as_bool)
            .unwrap_or(false);
        let data = self
            .case
            .as_mut()
            .ok_or_else(|| "no case is open".to_string())?
            .object_mut(object_type)
            .ok_or_else(|| format!("object type {object_type} not found"))?;
        let specs: Vec<FieldSpec> = Self::specs(data, fields)?.into_iter().cloned().collect();

        for values in rows {
            if values.len() != fields.len() {
                return Err(format!(
                    "{} value(s) given for {} field(s)",
                    values.len(),
                    fields.len()
                ));
            }
            let coerced = specs
                .iter()
                .zip(&values)
                .map(|(spec, value)| coerce(spec, value))
                .collect::<Result<Vec<_>, _>>()?;

            let idx = match Self::find_record(data, fields, &values)? {
                Some(idx) => idx,
                None if create => {
                    data.records.push(BTreeMap::new());
                    data.records.len() - 1
                }
                None => return Err(format!("object of type {object_type} not found")),
            };
            let record = &mut data.records[idx];
            let fresh = record.is_empty();
            for (spec, value) in specs.iter().zip(coerced) {
                if spec.read_only && !fresh {
                    continue;
                }
                record.insert(spec.name.clone(), value);
            }
        }
        ok()
    }

    fn list_devices(&self, args: &[Variant], as_strings: bool) -> Reply {
        let object_type = arg_str(args, 0, "object type")?;
        let data = self.object(&object_type)?;
        let keys = data.key_fields();
        let columns = keys
            .iter()
            .map(|spec| {
                if data.records.is_empty() {
                    return Variant::Empty;
                }
                Variant::Array(
                    data.records
                        .iter()
                        .map(|record| match record.get(&spec.name) {
                            Some(value) if as_strings => Variant::Str(value.to_string()),
                            Some(value) if spec.is_integer() => value
                                .as_i64()
                                .map(Variant::Int)
                                .unwrap_or_else(|| value.clone()),
                            Some(value) => value.clone(),
                            None => Variant::Empty,
                        })
                        .collect(),
                )
            })
            .collect();
        ok_with(Variant::Array(columns))
    }

    fn list_devices_flat(&self, args: &[Variant]) -> Reply {
        let object_type = arg_str(args, 0, "object type")?;
        let data = self.object(&object_type)?;
        let keys = data.key_fields();
        if data.records.is_empty() {
            return Err("No data returned".into());
        }
        let mut out = vec![
            Variant::Str(data.records.len().to_string()),
            Variant::Str(keys.len().to_string()),
        ];
        for record in &data.records {
            out.extend(keys.iter().map(|spec| render(spec, record.get(&spec.name))));
        }
        ok_with(Variant::Array(out))
    }

    fn run_script(&mut self, args: &[Variant]) -> Reply {
        let statement = arg_str(args, 0, "script statement")?;
        let trimmed = statement.trim().trim_end_matches(';');
        let well_formed = trimmed
            .find('(')
            .map(|open| open > 0 && trimmed.ends_with(')'))
            .unwrap_or(false);
        if !well_formed {
            return Err(format!("error in script statement '{statement}'"));
        }
        self.open()?;
        self.script_log.push(trimmed.to_string());
        ok()
    }

    fn write_aux(&self, args: &[Variant]) -> Reply {
        let raw = arg_str(args, 0, "file name")?;
        let object_type = arg_str(args, 2, "object type")?;
        let append = args.get(3).and_then(Variant::as_bool).unwrap_or(true);
        let data = self.object(&object_type)?;
        let fields = match arg(args, 4, "field list")? {
            Variant::Str(all) if all.trim().eq_ignore_ascii_case("ALL") => {
                data.fields.iter().map(|f| f.name.clone()).collect()
            }
            _ => arg_strings(args, 4, "field list")?,
        };
        let specs = Self::specs(data, &fields)?;

        let mut text = format!("DATA ({}, [{}])\n{{\n", object_type, fields.join(", "));
        for record in &data.records {
            let cells: Vec<String> = specs
                .iter()
                .map(|spec| match record.get(&spec.name) {
                    Some(value) if spec.is_numeric() => value.to_string(),
                    Some(value) => format!("\"{value}\""),
                    None => String::new(),
                })
                .collect();
            text.push_str(&cells.join(" "));
            text.push('\n');
        }
        text.push_str("}\n");

        let path = path_key(&raw);
        let write = if append {
            use std::io::Write;
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .and_then(|mut f| f.write_all(text.as_bytes()))
        } else {
            std::fs::write(&path, text)
        };
        write.map_err(|e| format!("error writing {path}: {e}"))?;
        ok()
    }
}

impl Transport for MemoryEngine {
    fn invoke(&mut self, function: SimAutoFunction, args: &[Variant]) -> TransportResult<Variant> {
        let mut state = self.state.lock();
        if state.released {
            return Err(TransportError::Closed);
        }
        state.calls.push((function, args.to_vec()));
        if state.disabled.contains(&function) {
            return Err(TransportError::UnknownOperation(function.name().to_string()));
        }
        if let Some(message) = state.faults.get(&function) {
            return Err(TransportError::Fault {
                function: function.name().to_string(),
                message: message.clone(),
            });
        }
        match state.dispatch(function, args) {
            Ok(reply) => Ok(reply),
            Err(message) => Ok(Variant::Array(vec![Variant::Str(format!(
                "{}: {message}",
                function.name()
            ))])),
        }
    }

    fn set_property(&mut self, property: Property, value: Variant) -> TransportResult<()> {
        let mut state = self.state.lock();
        if state.released {
            return Err(TransportError::Closed);
        }
        if !property.is_settable() {
            return Err(TransportError::Fault {
                function: property.name().to_string(),
                message: "property is read-only".into(),
            });
        }
        state.properties.insert(property, value);
        Ok(())
    }

    fn get_property(&mut self, property: Property) -> TransportResult<Variant> {
        let state = self.state.lock();
        if state.released {
            return Err(TransportError::Closed);
        }
        Ok(match property {
            Property::ProcessId => Variant::Int(i64::from(std::process::id())),
            Property::RequestBuildDate => Variant::from(env!("CARGO_PKG_VERSION")),
            Property::CreateIfNotFound | Property::UiVisible => state
                .properties
                .get(&property)
                .cloned()
                .unwrap_or(Variant::Bool(false)),
            Property::CurrentDir => state.properties.get(&property).cloned().unwrap_or_else(|| {
                std::env::current_dir()
                    .map(|p| Variant::Str(p.display().to_string()))
                    .unwrap_or_default()
            }),
        })
    }

    fn release(&mut self) -> TransportResult<()> {
        self.state.lock().released = true;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory engine".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bus() -> MemoryCase {
        MemoryCase::new().with_object(
            "Bus",
            ObjectData::new(vec![
                FieldSpec::new("BusNum", "Integer").key("*1*"),
                FieldSpec::new("BusName", "String"),
                FieldSpec::new("BusPUVolt", "Real"),
                FieldSpec::new("BusNomVolt", "Real").read_only(),
            ])
            .with_record([
                ("BusNum", Variant::Int(1)),
                ("BusName", Variant::from("One")),
                ("BusPUVolt", Variant::Real(1.02)),
                ("BusNomVolt", Variant::Real(138.0)),
            ])
            .with_record([
                ("BusNum", Variant::Int(2)),
                ("BusName", Variant::from("Two")),
                ("BusPUVolt", Variant::Real(0.99)),
            ]),
        )
    }

    fn first(reply: &Variant) -> &str {
        reply.as_array().unwrap()[0].as_str().unwrap()
    }

    #[test]
    fn reads_pad_numbers_and_leave_missing_cells_empty() {
        let mut engine = MemoryEngine::with_open_case(two_bus(), "two.pwb");
        let reply = engine
            .invoke(
                SimAutoFunction::GetParametersMultipleElement,
                &[
                    "bus".into(),
                    Variant::strings(["BusNum", "BusNomVolt"]),
                    "".into(),
                ],
            )
            .unwrap();
        let cols = reply.as_array().unwrap()[1].as_array().unwrap();
        assert_eq!(cols[0].as_array().unwrap()[0], Variant::from("       1"));
        assert_eq!(cols[1].as_array().unwrap()[1], Variant::Empty);
    }

    #[test]
    fn unknown_object_type_reports_in_payload() {
        let mut engine = MemoryEngine::with_open_case(two_bus(), "two.pwb");
        let reply = engine
            .invoke(SimAutoFunction::GetFieldList, &["widget".into()])
            .unwrap();
        assert!(first(&reply).starts_with("GetFieldList:"));
    }

    #[test]
    fn read_only_fields_ignore_writes() {
        let mut engine = MemoryEngine::with_open_case(two_bus(), "two.pwb");
        let reply = engine
            .invoke(
                SimAutoFunction::ChangeParametersSingleElement,
                &[
                    "bus".into(),
                    Variant::strings(["BusNum", "BusNomVolt"]),
                    Variant::Array(vec![Variant::Int(1), Variant::Real(230.0)]),
                ],
            )
            .unwrap();
        assert_eq!(first(&reply), "");
        let case = engine.case().unwrap();
        assert_eq!(
            case.objects["bus"].records[0]["BusNomVolt"],
            Variant::Real(138.0)
        );
    }

    #[test]
    fn max_num_is_a_bare_integer() {
        let mut engine = MemoryEngine::with_open_case(two_bus(), "two.pwb");
        let known = engine
            .invoke(
                SimAutoFunction::GetSpecificFieldMaxNum,
                &["bus".into(), "BusName".into()],
            )
            .unwrap();
        assert_eq!(known, Variant::Int(0));
        let unknown = engine
            .invoke(
                SimAutoFunction::GetSpecificFieldMaxNum,
                &["bus".into(), "Nope".into()],
            )
            .unwrap();
        assert_eq!(unknown, Variant::Int(-1));
    }

    #[test]
    fn disabled_and_released_engines_fail_at_transport_level() {
        let mut engine = MemoryEngine::with_open_case(two_bus(), "two.pwb");
        engine.disable(SimAutoFunction::SendToExcel);
        assert!(matches!(
            engine.invoke(SimAutoFunction::SendToExcel, &[]),
            Err(TransportError::UnknownOperation(_))
        ));
        engine.release().unwrap();
        assert!(matches!(
            engine.invoke(SimAutoFunction::CloseCase, &[]),
            Err(TransportError::Closed)
        ));
        assert_eq!(engine.calls_to(SimAutoFunction::SendToExcel), 1);
    }

    #[test]
    fn case_round_trips_through_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let mut engine = MemoryEngine::with_open_case(two_bus(), "two.pwb");
        let reply = engine
            .invoke(
                SimAutoFunction::SaveCase,
                &[
                    path.display().to_string().into(),
                    "PWB".into(),
                    true.into(),
                ],
            )
            .unwrap();
        assert_eq!(first(&reply), "");

        let mut fresh = MemoryEngine::new();
        let reply = fresh
            .invoke(SimAutoFunction::OpenCase, &[path.display().to_string().into()])
            .unwrap();
        assert_eq!(first(&reply), "");
        assert_eq!(fresh.case().unwrap(), engine.case().unwrap());
    }

    #[test]
    fn malformed_script_is_a_remote_error() {
        let mut engine = MemoryEngine::with_open_case(two_bus(), "two.pwb");
        let reply = engine
            .invoke(SimAutoFunction::RunScriptCommand, &["garbage".into()])
            .unwrap();
        assert!(first(&reply).starts_with("RunScriptCommand:"));
        engine
            .invoke(
                SimAutoFunction::RunScriptCommand,
                &["SolvePowerFlow(RECTNEWT)".into()],
            )
            .unwrap();
        assert_eq!(engine.script_log(), vec!["SolvePowerFlow(RECTNEWT)"]);
    }
}
