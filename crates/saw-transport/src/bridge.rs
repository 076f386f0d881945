//! Subprocess bridge to the automation server.
//!
//! The bridge is a small helper binary that owns the actual automation
//! handle and speaks newline-delimited JSON on stdin/stdout. One request per
//! line, one response per line, strictly in order:
//!
//! ```text
//! -> {"id":1,"op":"call","function":"OpenCase","args":["C:/cases/ieee14.pwb"]}
//! <- {"id":1,"result":[""]}
//! -> {"id":2,"op":"call","function":"Frobnicate","args":[]}
//! <- {"id":2,"fault":{"kind":"unknown_operation","message":"Frobnicate"}}
//! ```
//!
//! Other ops are `set`, `get` (with `property` and `value`), `describe`
//! (returns the list of dispatchable function names) and `release`.

use crate::error::{TransportError, TransportResult};
use crate::function::{Property, SimAutoFunction};
use crate::transport::{Binding, Transport};
use saw_core::Variant;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, trace, warn};

/// Name of the bridge executable (without platform suffix).
pub const BINARY_NAME: &str = "simauto-bridge";

#[derive(Debug, Serialize)]
struct Request<'a> {
    id: u64,
    op: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    function: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<&'a [Variant]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    property: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a Variant>,
}

impl<'a> Request<'a> {
    fn new(id: u64, op: &'a str) -> Self {
        Self {
            id,
            op,
            function: None,
            args: None,
            property: None,
            value: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Fault {
    kind: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Response {
    id: u64,
    #[serde(default)]
    result: Variant,
    #[serde(default)]
    fault: Option<Fault>,
}

/// A running bridge process.
pub struct BridgeProcess {
    binary_path: PathBuf,
    binding: Binding,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: u64,
    /// Dispatch table, populated only under early binding.
    dispatch: Option<HashSet<String>>,
    released: bool,
}

impl BridgeProcess {
    /// Find the bridge binary.
    ///
    /// Search order:
    /// 1. `explicit`, when given
    /// 2. ~/.saw/bin/simauto-bridge
    /// 3. System PATH
    pub fn find_binary(explicit: Option<&Path>) -> TransportResult<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(TransportError::NotInstalled {
                hint: path.display().to_string(),
            });
        }

        let binary_name = format!("{BINARY_NAME}{}", std::env::consts::EXE_SUFFIX);

        if let Some(home) = dirs::home_dir() {
            let saw_path = home.join(".saw").join("bin").join(&binary_name);
            if saw_path.exists() {
                return Ok(saw_path);
            }
        }

        if let Ok(path) = which::which(BINARY_NAME) {
            return Ok(path);
        }

        Err(TransportError::NotInstalled { hint: binary_name })
    }

    /// Locate the bridge and start it.
    pub fn connect(explicit: Option<&Path>, binding: Binding) -> TransportResult<Self> {
        let path = Self::find_binary(explicit)?;
        Self::launch(&path, binding)
    }

    /// Start the bridge at `binary_path`.
    ///
    /// Under [`Binding::Early`] the bridge is asked for its dispatch table
    /// before this returns.
    pub fn launch(binary_path: &Path, binding: Binding) -> TransportResult<Self> {
        debug!(binary = %binary_path.display(), %binding, "starting SimAuto bridge");

        let mut child = Command::new(binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(TransportError::ProcessStart)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Protocol("bridge stdin was not piped".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Protocol("bridge stdout was not piped".into()))?;

        let mut bridge = Self {
            binary_path: binary_path.to_path_buf(),
            binding,
            child,
            stdin,
            stdout: BufReader::new(stdout),
            next_id: 1,
            dispatch: None,
            released: false,
        };

        if binding == Binding::Early {
            let table = bridge.exchange(Request::new(0, "describe"), "describe")?;
            let names = table
                .as_array()
                .ok_or_else(|| {
                    TransportError::Protocol(format!(
                        "describe returned a {}, expected an array of names",
                        table.kind()
                    ))
                })?
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect::<HashSet<_>>();
            debug!(functions = names.len(), "bridge dispatch table resolved");
            bridge.dispatch = Some(names);
        }

        Ok(bridge)
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    fn exchange(&mut self, mut request: Request<'_>, label: &str) -> TransportResult<Variant> {
        if self.released {
            return Err(TransportError::Closed);
        }

        let id = self.next_id;
        self.next_id += 1;
        request.id = id;

        let line = serde_json::to_string(&request)?;
        trace!(%line, "bridge request");
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()?;

        let mut reply = String::new();
        if self.stdout.read_line(&mut reply)? == 0 {
            warn!(function = label, "bridge closed its output");
            return Err(TransportError::Closed);
        }
        trace!(line = reply.trim_end(), "bridge response");

        let response: Response = serde_json::from_str(reply.trim_end())?;
        if response.id != id {
            return Err(TransportError::Protocol(format!(
                "response id {} does not match request id {id}",
                response.id
            )));
        }

        match response.fault {
            Some(fault) if fault.kind == "unknown_operation" => {
                Err(TransportError::UnknownOperation(if fault.message.is_empty() {
                    label.to_string()
                } else {
                    fault.message
                }))
            }
            Some(fault) => Err(TransportError::Fault {
                function: label.to_string(),
                message: fault.message,
            }),
            None => Ok(response.result),
        }
    }
}

impl Transport for BridgeProcess {
    fn invoke(&mut self, function: SimAutoFunction, args: &[Variant]) -> TransportResult<Variant> {
        if let Some(dispatch) = &self.dispatch {
            if !dispatch.contains(function.name()) {
                return Err(TransportError::UnknownOperation(function.name().to_string()));
            }
        }
        let mut request = Request::new(0, "call");
        request.function = Some(function.name());
        request.args = Some(args);
        self.exchange(request, function.name())
    }

    fn set_property(&mut self, property: Property, value: Variant) -> TransportResult<()> {
        let mut request = Request::new(0, "set");
        request.property = Some(property.name());
        request.value = Some(&value);
        self.exchange(request, property.name()).map(|_| ())
    }

    fn get_property(&mut self, property: Property) -> TransportResult<Variant> {
        let mut request = Request::new(0, "get");
        request.property = Some(property.name());
        self.exchange(request, property.name())
    }

    fn release(&mut self) -> TransportResult<()> {
        if self.released {
            return Ok(());
        }
        let outcome = self.exchange(Request::new(0, "release"), "release");
        self.released = true;
        // The bridge exits once released; reap it either way.
        let _ = self.child.wait();
        outcome.map(|_| ())
    }

    fn describe(&self) -> String {
        format!("bridge {} ({})", self.binary_path.display(), self.binding)
    }
}

impl Drop for BridgeProcess {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
