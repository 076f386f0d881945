//! Case-file type tags and power-flow solution methods.
//!
//! Both are opaque to the wrapper: they only travel to the engine as strings.
//! The enums exist so callers cannot misspell the common ones; anything the
//! enums do not name can still be passed through `Other`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// File type tag for opening or saving a case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum CaseFileType {
    /// Native binary, most recent version.
    #[default]
    Pwb,
    /// Native binary, a specific version (`PWB5` .. `PWB23`).
    PwbVersion(u8),
    /// PTI raw, auto-detected version.
    Pti,
    /// PTI raw, a specific version (`PTI23` .. `PTI35`).
    PtiVersion(u8),
    /// GE PSLF epc (`GE` means the newest the engine supports).
    Ge,
    GeVersion(u8),
    /// IEEE common format.
    Ieee,
    Ucte,
    Aux,
    AuxSecond,
    AuxLabel,
    AuxNetwork,
    ArevaHdb,
    Other(String),
}

impl CaseFileType {
    pub fn tag(&self) -> String {
        match self {
            CaseFileType::Pwb => "PWB".into(),
            CaseFileType::PwbVersion(v) => format!("PWB{v}"),
            CaseFileType::Pti => "PTI".into(),
            CaseFileType::PtiVersion(v) => format!("PTI{v}"),
            CaseFileType::Ge => "GE".into(),
            CaseFileType::GeVersion(v) => format!("GE{v}"),
            CaseFileType::Ieee => "CF".into(),
            CaseFileType::Ucte => "UCTE".into(),
            CaseFileType::Aux => "AUX".into(),
            CaseFileType::AuxSecond => "AUXSECOND".into(),
            CaseFileType::AuxLabel => "AUXLABEL".into(),
            CaseFileType::AuxNetwork => "AUXNETWORK".into(),
            CaseFileType::ArevaHdb => "AREVAHDB".into(),
            CaseFileType::Other(tag) => tag.clone(),
        }
    }
}

impl fmt::Display for CaseFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for CaseFileType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let versioned = |prefix: &str| -> Option<u8> {
            upper
                .strip_prefix(prefix)
                .filter(|rest| !rest.is_empty())
                .and_then(|rest| rest.parse().ok())
        };
        Ok(match upper.as_str() {
            "PWB" => CaseFileType::Pwb,
            "PTI" => CaseFileType::Pti,
            "GE" => CaseFileType::Ge,
            "CF" | "IEEE" => CaseFileType::Ieee,
            "UCTE" => CaseFileType::Ucte,
            "AUX" => CaseFileType::Aux,
            "AUXSECOND" => CaseFileType::AuxSecond,
            "AUXLABEL" => CaseFileType::AuxLabel,
            "AUXNETWORK" => CaseFileType::AuxNetwork,
            "AREVAHDB" => CaseFileType::ArevaHdb,
            _ => {
                if let Some(v) = versioned("PWB") {
                    CaseFileType::PwbVersion(v)
                } else if let Some(v) = versioned("PTI") {
                    CaseFileType::PtiVersion(v)
                } else if let Some(v) = versioned("GE") {
                    CaseFileType::GeVersion(v)
                } else {
                    CaseFileType::Other(s.trim().to_string())
                }
            }
        })
    }
}

impl From<String> for CaseFileType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<CaseFileType> for String {
    fn from(t: CaseFileType) -> Self {
        t.tag()
    }
}

/// Solution method for the `SolvePowerFlow` script command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveMethod {
    /// Rectangular Newton-Raphson
    #[default]
    RectNewt,
    /// Polar Newton-Raphson
    PolarNewton,
    GaussSeidel,
    /// Fast decoupled
    FastDec,
    /// Attempt the engine's robust solution process
    Robust,
    /// DC power flow
    Dc,
}

impl SolveMethod {
    pub const ALL: &'static [SolveMethod] = &[
        SolveMethod::RectNewt,
        SolveMethod::PolarNewton,
        SolveMethod::GaussSeidel,
        SolveMethod::FastDec,
        SolveMethod::Robust,
        SolveMethod::Dc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SolveMethod::RectNewt => "RECTNEWT",
            SolveMethod::PolarNewton => "POLARNEWTON",
            SolveMethod::GaussSeidel => "GAUSSSEIDEL",
            SolveMethod::FastDec => "FASTDEC",
            SolveMethod::Robust => "ROBUST",
            SolveMethod::Dc => "DC",
        }
    }

    /// The script statement that runs a solution with this method.
    pub fn script_command(&self) -> String {
        format!("SolvePowerFlow({})", self.as_str())
    }
}

impl fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolveMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        SolveMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| {
                format!(
                    "unknown solution method '{s}'; supported values: {}",
                    SolveMethod::ALL
                        .iter()
                        .map(|m| m.as_str())
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
    fn case_file_tags_parse_versions() {
        assert_eq!("pwb".parse::<CaseFileType>().unwrap(), CaseFileType::Pwb);
        assert_eq!(
            "PWB21".parse::<CaseFileType>().unwrap(),
            CaseFileType::PwbVersion(21)
        );
        assert_eq!(
            "pti33".parse::<CaseFileType>().unwrap(),
            CaseFileType::PtiVersion(33)
        );
        assert_eq!("IEEE".parse::<CaseFileType>().unwrap().tag(), "CF");
        assert_eq!(
            "epc-custom".parse::<CaseFileType>().unwrap(),
            CaseFileType::Other("epc-custom".into())
        );
    }

    #[test]
    fn solve_method_script_command() {
        assert_eq!(
            SolveMethod::default().script_command(),
            "SolvePowerFlow(RECTNEWT)"
        );
        assert_eq!("fastdec".parse::<SolveMethod>().unwrap(), SolveMethod::FastDec);
        assert!("newton".parse::<SolveMethod>().is_err());
    }
}
