use crate::utils::error::{Result, WranglerError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Names of the visit columns in a source export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitColumns {
    pub patient_id: String,
    pub visit_id: String,
    pub admitted: String,
    pub discharged: String,
    pub admission_type: String,
    pub diagnosis: String,
}

impl Default for VisitColumns {
    fn default() -> Self {
        Self {
            patient_id: "patient_id".to_string(),
            visit_id: "visit_sn".to_string(),
            admitted: "B12".to_string(),
            discharged: "B15".to_string(),
            admission_type: "B11C".to_string(),
            diagnosis: "C03C".to_string(),
        }
    }
}

impl VisitColumns {
    pub fn all(&self) -> [(&'static str, &str); 6] {
        [
            ("patient_id", self.patient_id.as_str()),
            ("visit_id", self.visit_id.as_str()),
            ("admitted", self.admitted.as_str()),
            ("discharged", self.discharged.as_str()),
            ("admission_type", self.admission_type.as_str()),
            ("diagnosis", self.diagnosis.as_str()),
        ]
    }
}

/// One hospital encounter. Unparseable timestamps are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub patient_id: String,
    pub visit_id: String,
    pub admitted: Option<NaiveDateTime>,
    pub discharged: Option<NaiveDateTime>,
    pub admission_type: String,
    pub diagnosis: String,
}

/// Which readmissions to keep, judged on the next visit's admission type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmergencyMode {
    #[default]
    All,
    EmergencyOnly,
    NonEmergencyOnly,
}

impl EmergencyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::EmergencyOnly => "Y",
            Self::NonEmergencyOnly => "N",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "",
            Self::EmergencyOnly => "EMERGENCY ",
            Self::NonEmergencyOnly => "NON-EMERGENCY ",
        }
    }

    pub fn keeps(&self, next_admission_type: &str, emergency_code: &str) -> bool {
        let is_emergency = next_admission_type.trim() == emergency_code;
        match self {
            Self::All => true,
            Self::EmergencyOnly => is_emergency,
            Self::NonEmergencyOnly => !is_emergency,
        }
    }
}

impl fmt::Display for EmergencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmergencyMode {
    type Err = WranglerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "Y" => Ok(Self::EmergencyOnly),
            "N" => Ok(Self::NonEmergencyOnly),
            other => Err(WranglerError::InvalidConfigValueError {
                field: "emergency".to_string(),
                value: other.to_string(),
                reason: "Expected one of: all, Y, N".to_string(),
            }),
        }
    }
}

/// A visit whose timestamp cell could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidDate {
    pub patient_id: String,
    pub visit_id: String,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub invalid_admissions: Vec<InvalidDate>,
    pub invalid_discharges: Vec<InvalidDate>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.invalid_admissions.is_empty() && self.invalid_discharges.is_empty()
    }
}

/// (readmitted visit id, triggering visit id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReadmissionPair {
    pub readmit_visit_id: String,
    pub trigger_visit_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadmissionReport {
    pub pairs: Vec<ReadmissionPair>,
    pub readmit_visit_ids: Vec<String>,
    pub trigger_visit_ids: Vec<String>,
    pub patients_matched: usize,
    pub parse_report: ParseReport,
}
