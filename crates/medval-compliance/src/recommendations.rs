//! Fixed recommendation lookup, keyed by violation category.

/// Violation categories raised by column inspection rather than by an issue.
pub mod categories {
    pub const SPECIAL_CATEGORY_DATA: &str = "special_category_data";
    pub const MISSING_LAWFUL_BASIS: &str = "missing_lawful_basis";
    pub const PERSONAL_DATA: &str = "personal_data";
    pub const MISSING_AUDIT_TIMESTAMP: &str = "missing_audit_timestamp";
    pub const MISSING_USER_ATTRIBUTION: &str = "missing_user_attribution";
    pub const MISSING_REQUIRED_FIELD: &str = "missing_required_field";
    pub const INCOMPLETE_RECORDS: &str = "incomplete_records";
    pub const DUPLICATE_RECORDS: &str = "duplicate_records";
    pub const INVALID_DATES: &str = "invalid_dates";
    pub const CUSTOM_RULE: &str = "custom_rule";
}

/// Category of a medical-coding violation for `system` (`invalid_icd10_codes`).
pub fn invalid_code_category(system: &str) -> String {
    format!("invalid_{system}_codes")
}

/// Recommendation text for `category`.
pub fn recommendation_for(category: &str) -> &'static str {
    use categories::*;

    match category {
        // HIPAA, by PHI type
        "ssn" => "Remove or tokenize Social Security numbers; they are direct identifiers under the HIPAA Safe Harbor method",
        "medical_record_number" => "Replace medical record numbers with study-specific pseudonyms before sharing",
        "email" => "Remove email addresses or replace them with opaque contact identifiers",
        "phone" => "Remove telephone and fax numbers from shared extracts",
        "name" => "Remove patient names or replace them with coded identifiers",
        "address" => "Generalize street addresses to the state or first three ZIP digits",
        "date_of_birth" => "Reduce dates of birth to the year and aggregate ages over 89",
        "zip_code" => "Truncate ZIP codes to the first three digits for populations over 20,000",
        "ip_address" => "Drop IP addresses or hash them with a secret salt",
        // GDPR
        PERSONAL_DATA => "Apply pseudonymization to personal data and document the processing purpose",
        SPECIAL_CATEGORY_DATA => "Confirm an Article 9 condition for special-category data or remove those columns",
        MISSING_LAWFUL_BASIS => "Record consent or another lawful basis for processing alongside each record",
        // FDA 21 CFR Part 11
        MISSING_AUDIT_TIMESTAMP => "Add a record timestamp column so every entry carries a secure, time-stamped audit trail",
        MISSING_USER_ATTRIBUTION => "Add a user or operator column so every entry is attributable to the person who made it",
        MISSING_REQUIRED_FIELD => "Restore required fields so records are complete for regulatory submission",
        INCOMPLETE_RECORDS => "Investigate missing values and document the reason for each gap",
        DUPLICATE_RECORDS => "Remove duplicate records and add a unique record identifier",
        INVALID_DATES => "Normalize dates to ISO 8601 (YYYY-MM-DD) at the point of capture",
        // Medical coding
        "invalid_icd10_codes" => "Map diagnosis codes to valid ICD-10-CM codes",
        "invalid_icd9_codes" => "Correct ICD-9 codes or migrate them to ICD-10-CM",
        "invalid_loinc_codes" => "Verify laboratory codes against the LOINC table, including the check digit",
        "invalid_cpt_codes" => "Correct procedure codes to five-character CPT codes",
        "invalid_snomed_codes" => "Replace malformed SNOMED CT concept identifiers",
        "invalid_ndc_codes" => "Normalize drug codes to the 10 or 11 digit NDC format",
        CUSTOM_RULE => "Review values that violate the site-defined validation rule",
        _ => "Review the flagged data against the applicable regulation",
    }
}
