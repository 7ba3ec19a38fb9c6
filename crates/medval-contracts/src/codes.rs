//! Medical code systems and their lexical grammars.
//!
//! Shared by the code validator rule and the compliance scorer, which both
//! need to decide whether a value is a well-formed code.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MedvalError, MedvalResult};

static ICD10: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][0-9]{2}(\.[0-9A-Z]{1,4})?$").expect("static ICD-10 grammar"));
static ICD9: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(V[0-9]{2}(\.[0-9]{1,2})?|E[0-9]{3}(\.[0-9])?|[0-9]{3}(\.[0-9]{1,2})?)$")
        .expect("static ICD-9 grammar")
});
static LOINC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,5}-[0-9]$").expect("static LOINC grammar"));
static CPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{5}$").expect("static CPT grammar"));
static SNOMED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9][0-9]{5,17}$").expect("static SNOMED CT grammar"));
static NDC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4}-[0-9]{4}-[0-9]{2}|[0-9]{5}-[0-9]{3}-[0-9]{2}|[0-9]{5}-[0-9]{4}-[0-9])$")
        .expect("static NDC grammar")
});

/// A supported medical coding standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeSystem {
    /// ICD-10: letter, two digits, optional `.` subdivision (`E11.9`).
    Icd10,
    /// ICD-9-CM: three digits, or `V`/`E` codes, optional decimals.
    Icd9,
    /// LOINC: up to five digits, dash, check digit (`2345-7`).
    Loinc,
    /// CPT: five digits (`99213`).
    Cpt,
    /// SNOMED CT concept identifier: 6 to 18 digits.
    Snomed,
    /// NDC in one of the three 10-digit dashed layouts.
    Ndc,
}

impl CodeSystem {
    pub const ALL: [CodeSystem; 6] = [
        CodeSystem::Icd10,
        CodeSystem::Icd9,
        CodeSystem::Loinc,
        CodeSystem::Cpt,
        CodeSystem::Snomed,
        CodeSystem::Ndc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeSystem::Icd10 => "icd10",
            CodeSystem::Icd9 => "icd9",
            CodeSystem::Loinc => "loinc",
            CodeSystem::Cpt => "cpt",
            CodeSystem::Snomed => "snomed",
            CodeSystem::Ndc => "ndc",
        }
    }

    /// Display name used in issue messages.
    pub fn label(&self) -> &'static str {
        match self {
            CodeSystem::Icd10 => "ICD-10",
            CodeSystem::Icd9 => "ICD-9",
            CodeSystem::Loinc => "LOINC",
            CodeSystem::Cpt => "CPT",
            CodeSystem::Snomed => "SNOMED CT",
            CodeSystem::Ndc => "NDC",
        }
    }

    /// True if `value` (trimmed, upper-cased) is lexically valid for this system.
    pub fn is_valid(&self, value: &str) -> bool {
        let normalized = value.trim().to_ascii_uppercase();
        let grammar: &Regex = match self {
            CodeSystem::Icd10 => &*ICD10,
            CodeSystem::Icd9 => &*ICD9,
            CodeSystem::Loinc => &*LOINC,
            CodeSystem::Cpt => &*CPT,
            CodeSystem::Snomed => &*SNOMED,
            CodeSystem::Ndc => &*NDC,
        };
        grammar.is_match(&normalized)
    }

    /// Guess the code system a column holds from its name
    /// (`icd10_code` → ICD-10, `loinc` → LOINC, `procedure_cpt` → CPT).
    pub fn from_column_name(column: &str) -> Option<Self> {
        let lower = column.to_ascii_lowercase();
        if lower.contains("icd9") || lower.contains("icd_9") {
            Some(CodeSystem::Icd9)
        } else if lower.contains("icd") {
            Some(CodeSystem::Icd10)
        } else if lower.contains("loinc") {
            Some(CodeSystem::Loinc)
        } else if lower.contains("cpt") {
            Some(CodeSystem::Cpt)
        } else if lower.contains("snomed") {
            Some(CodeSystem::Snomed)
        } else if lower.contains("ndc") {
            Some(CodeSystem::Ndc)
        } else {
            None
        }
    }
}

impl fmt::Display for CodeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeSystem {
    type Err = MedvalError;

    fn from_str(s: &str) -> MedvalResult<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "icd10" | "icd10cm" => Ok(CodeSystem::Icd10),
            "icd9" | "icd9cm" => Ok(CodeSystem::Icd9),
            "loinc" => Ok(CodeSystem::Loinc),
            "cpt" => Ok(CodeSystem::Cpt),
            "snomed" | "snomedct" => Ok(CodeSystem::Snomed),
            "ndc" => Ok(CodeSystem::Ndc),
            _ => Err(MedvalError::config(format!("unknown code system '{s}'"))),
        }
    }
}
