//! The closed set of ward specialties.
//!
//! Every layer (admission validation, census, filters, CSV) consumes this one enumeration.
//! The display strings are part of the external contract and must not change.

use crate::{WardError, WardResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Specialty {
    #[serde(rename = "General Internal Medicine")]
    GeneralInternalMedicine,
    #[serde(rename = "Hematology")]
    Hematology,
    #[serde(rename = "Rheumatology")]
    Rheumatology,
    #[serde(rename = "Pulmonology")]
    Pulmonology,
    #[serde(rename = "Infectious Diseases")]
    InfectiousDiseases,
    #[serde(rename = "Neurology")]
    Neurology,
    #[serde(rename = "Endocrinology")]
    Endocrinology,
}

impl Specialty {
    /// All specialties, in census order.
    pub const ALL: [Specialty; 7] = [
        Specialty::GeneralInternalMedicine,
        Specialty::Hematology,
        Specialty::Rheumatology,
        Specialty::Pulmonology,
        Specialty::InfectiousDiseases,
        Specialty::Neurology,
        Specialty::Endocrinology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Specialty::GeneralInternalMedicine => "General Internal Medicine",
            Specialty::Hematology => "Hematology",
            Specialty::Rheumatology => "Rheumatology",
            Specialty::Pulmonology => "Pulmonology",
            Specialty::InfectiousDiseases => "Infectious Diseases",
            Specialty::Neurology => "Neurology",
            Specialty::Endocrinology => "Endocrinology",
        }
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Specialty {
    type Err = WardError;

    /// Matches the display strings, ignoring surrounding whitespace and ASCII case.
    fn from_str(s: &str) -> WardResult<Self> {
        let wanted = s.trim();
        if wanted.is_empty() {
            return Err(WardError::validation("specialty is required"));
        }
        Specialty::ALL
            .into_iter()
            .find(|specialty| specialty.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WardError::validation(format!("unknown specialty '{}'", wanted)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_strings_match_contract() {
        let names: Vec<&str> = Specialty::ALL.iter().map(Specialty::as_str).collect();
        assert_eq!(
            names,
            vec![
                "General Internal Medicine",
                "Hematology",
                "Rheumatology",
                "Pulmonology",
                "Infectious Diseases",
                "Neurology",
                "Endocrinology",
            ]
        );
    }

    #[test]
    fn parse_accepts_display_strings_case_insensitively() {
        for specialty in Specialty::ALL {
            assert_eq!(specialty.as_str().parse::<Specialty>().unwrap(), specialty);
        }
        assert_eq!(
            " infectious diseases ".parse::<Specialty>().unwrap(),
            Specialty::InfectiousDiseases
        );
    }

    #[test]
    fn parse_rejects_unknown_specialty() {
        let err = "Cardiology".parse::<Specialty>().unwrap_err();
        assert!(matches!(err, WardError::Validation(_)));
    }

    #[test]
    fn serde_uses_display_strings() {
        let json = serde_json::to_string(&Specialty::GeneralInternalMedicine).unwrap();
        assert_eq!(json, "\"General Internal Medicine\"");
    }
}
