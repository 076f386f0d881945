//! The closed set of remote functions and session properties.

use crate::error::TransportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every SimAuto function this wrapper knows how to call.
///
/// Names match the engine's dispatch names exactly; [`SimAutoFunction::name`]
/// is what goes over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SimAutoFunction {
    // Case lifecycle
    OpenCase,
    OpenCaseType,
    CloseCase,
    SaveCase,
    SaveState,
    LoadState,
    GetCaseHeader,
    // Schema introspection
    GetFieldList,
    GetSpecificFieldList,
    GetSpecificFieldMaxNum,
    // Reads
    GetParametersSingleElement,
    GetParametersMultipleElement,
    GetParametersMultipleElementFlatOutput,
    // Writes
    ChangeParametersSingleElement,
    ChangeParametersMultipleElement,
    ChangeParametersMultipleElementFlatInput,
    // Enumeration
    ListOfDevices,
    ListOfDevicesAsVariantStrings,
    ListOfDevicesFlatOutput,
    // Scripting
    RunScriptCommand,
    ProcessAuxFile,
    WriteAuxFile,
    // Export
    SendToExcel,
}

impl SimAutoFunction {
    pub const ALL: &'static [SimAutoFunction] = &[
        SimAutoFunction::OpenCase,
        SimAutoFunction::OpenCaseType,
        SimAutoFunction::CloseCase,
        SimAutoFunction::SaveCase,
        SimAutoFunction::SaveState,
        SimAutoFunction::LoadState,
        SimAutoFunction::GetCaseHeader,
        SimAutoFunction::GetFieldList,
        SimAutoFunction::GetSpecificFieldList,
        SimAutoFunction::GetSpecificFieldMaxNum,
        SimAutoFunction::GetParametersSingleElement,
        SimAutoFunction::GetParametersMultipleElement,
        SimAutoFunction::GetParametersMultipleElementFlatOutput,
        SimAutoFunction::ChangeParametersSingleElement,
        SimAutoFunction::ChangeParametersMultipleElement,
        SimAutoFunction::ChangeParametersMultipleElementFlatInput,
        SimAutoFunction::ListOfDevices,
        SimAutoFunction::ListOfDevicesAsVariantStrings,
        SimAutoFunction::ListOfDevicesFlatOutput,
        SimAutoFunction::RunScriptCommand,
        SimAutoFunction::ProcessAuxFile,
        SimAutoFunction::WriteAuxFile,
        SimAutoFunction::SendToExcel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SimAutoFunction::OpenCase => "OpenCase",
            SimAutoFunction::OpenCaseType => "OpenCaseType",
            SimAutoFunction::CloseCase => "CloseCase",
            SimAutoFunction::SaveCase => "SaveCase",
            SimAutoFunction::SaveState => "SaveState",
            SimAutoFunction::LoadState => "LoadState",
            SimAutoFunction::GetCaseHeader => "GetCaseHeader",
            SimAutoFunction::GetFieldList => "GetFieldList",
            SimAutoFunction::GetSpecificFieldList => "GetSpecificFieldList",
            SimAutoFunction::GetSpecificFieldMaxNum => "GetSpecificFieldMaxNum",
            SimAutoFunction::GetParametersSingleElement => "GetParametersSingleElement",
            SimAutoFunction::GetParametersMultipleElement => "GetParametersMultipleElement",
            SimAutoFunction::GetParametersMultipleElementFlatOutput => {
                "GetParametersMultipleElementFlatOutput"
            }
            SimAutoFunction::ChangeParametersSingleElement => "ChangeParametersSingleElement",
            SimAutoFunction::ChangeParametersMultipleElement => "ChangeParametersMultipleElement",
            SimAutoFunction::ChangeParametersMultipleElementFlatInput => {
                "ChangeParametersMultipleElementFlatInput"
            }
            SimAutoFunction::ListOfDevices => "ListOfDevices",
            SimAutoFunction::ListOfDevicesAsVariantStrings => "ListOfDevicesAsVariantStrings",
            SimAutoFunction::ListOfDevicesFlatOutput => "ListOfDevicesFlatOutput",
            SimAutoFunction::RunScriptCommand => "RunScriptCommand",
            SimAutoFunction::ProcessAuxFile => "ProcessAuxFile",
            SimAutoFunction::WriteAuxFile => "WriteAuxFile",
            SimAutoFunction::SendToExcel => "SendToExcel",
        }
    }

    /// The one function that answers with a bare integer instead of a tuple,
    /// using `-1` to signal failure.
    pub fn returns_bare_integer(&self) -> bool {
        matches!(self, SimAutoFunction::GetSpecificFieldMaxNum)
    }
}

impl fmt::Display for SimAutoFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimAutoFunction {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SimAutoFunction::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TransportError::UnknownOperation(s.to_string()))
    }
}

/// Kind of value a property holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Bool,
    Path,
    Integer,
    Text,
}

/// Automation server properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Property {
    /// Whether change-parameter calls create objects that do not exist yet.
    CreateIfNotFound,
    /// Whether the engine's user interface is shown.
    UiVisible,
    /// Engine working directory.
    CurrentDir,
    /// Process id of the running engine (read-only).
    ProcessId,
    /// Build date of the engine executable (read-only).
    RequestBuildDate,
}

impl Property {
    pub const ALL: &'static [Property] = &[
        Property::CreateIfNotFound,
        Property::UiVisible,
        Property::CurrentDir,
        Property::ProcessId,
        Property::RequestBuildDate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Property::CreateIfNotFound => "CreateIfNotFound",
            Property::UiVisible => "UIVisible",
            Property::CurrentDir => "CurrentDir",
            Property::ProcessId => "ProcessID",
            Property::RequestBuildDate => "RequestBuildDate",
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            Property::CreateIfNotFound | Property::UiVisible => PropertyKind::Bool,
            Property::CurrentDir => PropertyKind::Path,
            Property::ProcessId => PropertyKind::Integer,
            Property::RequestBuildDate => PropertyKind::Text,
        }
    }

    pub fn is_settable(&self) -> bool {
        matches!(
            self,
            Property::CreateIfNotFound | Property::UiVisible | Property::CurrentDir
        )
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Property {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Property::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown property '{s}'; supported values: {}",
                    Property::ALL
                        .iter()
                        .map(|p| p.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_function_parses_from_its_name() {
        for function in SimAutoFunction::ALL {
            assert_eq!(function.name().parse::<SimAutoFunction>().unwrap(), *function);
        }
        assert_eq!(SimAutoFunction::ALL.len(), 23);
    }

    #[test]
    fn unknown_function_name_is_unknown_operation() {
        assert!(matches!(
            "ChangeEverything".parse::<SimAutoFunction>(),
            Err(TransportError::UnknownOperation(_))
        ));
    }

    #[test]
    fn only_max_num_returns_bare_integer() {
        let bare: Vec<_> = SimAutoFunction::ALL
            .iter()
            .filter(|f| f.returns_bare_integer())
            .collect();
        assert_eq!(bare, vec![&SimAutoFunction::GetSpecificFieldMaxNum]);
    }

    #[test]
    fn read_only_properties_are_not_settable() {
        assert!(Property::UiVisible.is_settable());
        assert!(!Property::ProcessId.is_settable());
        assert_eq!("uivisible".parse::<Property>().unwrap(), Property::UiVisible);
    }
}
