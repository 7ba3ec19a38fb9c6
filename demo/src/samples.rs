//! Fictional sample datasets for the demo scenarios.
//!
//! All data here is hardcoded. Names, SSNs and contact details are invented.

use medval_contracts::{Column, Dataset, MedvalResult};

/// A clean-looking patient extract that is full of PHI.
pub fn patient_extract() -> MedvalResult<Dataset> {
    Dataset::new(vec![
        Column::new("patient_id", ["P001", "P002", "P003", "P004", "P005"]),
        Column::new("first_name", ["John", "Jane", "Michael", "Sarah", "David"]),
        Column::new("last_name", ["Smith", "Johnson", "Williams", "Brown", "Jones"]),
        Column::new(
            "ssn",
            ["123-45-6789", "234-56-7890", "345-67-8901", "456-78-9012", "567-89-0123"],
        ),
        Column::new(
            "date_of_birth",
            ["1985-03-15", "1990-07-22", "1978-11-08", "1982-04-30", "1988-09-12"],
        ),
        Column::new("age", [38, 33, 45, 41, 35]),
        Column::new("gender", ["M", "F", "M", "F", "M"]),
        Column::new(
            "diagnosis",
            ["Hypertension", "Diabetes Type 2", "Asthma", "Depression", "Migraine"],
        ),
        Column::new("icd10_code", ["I10", "E11.9", "J45.909", "F32.1", "G43.909"]),
        Column::new("temperature", [98.6, 99.2, 97.8, 98.9, 100.1]),
        Column::new("blood_pressure_systolic", [140, 135, 120, 145, 80]),
        Column::new("blood_pressure_diastolic", [90, 85, 80, 95, 85]),
        Column::new(
            "admission_date",
            ["2024-01-15", "2024-01-20", "2024-01-25", "2024-01-30", "2024-02-05"],
        ),
        Column::new(
            "email",
            [
                "john.smith@example.com",
                "jane.johnson@example.com",
                "michael.williams@example.com",
                "sarah.brown@example.com",
                "david.jones@example.com",
            ],
        ),
        Column::new("phone", ["555-0101", "555-0102", "555-0103", "555-0104", "555-0105"]),
        Column::new(
            "address",
            ["123 Main St", "456 Oak Ave", "789 Pine Rd", "321 Elm St", "654 Maple Dr"],
        ),
        Column::new("zip_code", ["12345", "23456", "34567", "45678", "56789"]),
    ])
}

/// An extract with one problem of each kind the built-in rules look for.
pub fn problematic_extract() -> MedvalResult<Dataset> {
    Dataset::new(vec![
        Column::new("patient_id", [Some("P001"), Some("P002"), None, Some("P004"), Some("P005")]),
        Column::new("age", [38, 33, 45, 150, 35]),
        Column::new("temperature", [98.6, 99.2, 97.8, 98.9, 110.0]),
        Column::new("icd10_code", ["I10", "INVALID", "J45.909", "F32.1", "G43.909"]),
        Column::new(
            "date_of_birth",
            ["1985-03-15", "1990-07-22", "INVALID_DATE", "1982-04-30", "1988-09-12"],
        ),
        Column::new("constant_col", ["A", "A", "A", "A", "A"]),
        Column::new("empty_col", [None::<&str>, None, None, None, None]),
    ])
}

/// An audited EHR extract: timestamps, user attribution and code columns.
pub fn audited_ehr_extract() -> MedvalResult<Dataset> {
    Dataset::new(vec![
        Column::new("patient_id", ["P00000001", "P00000002", "P00000003", "X-4"]),
        Column::new("patient_name", ["John Smith", "Jane Doe", "Bob Johnson", "Alice Brown"]),
        Column::new("ssn", ["123-45-6789", "987-65-4321", "111-22-3333", "444-55-6666"]),
        Column::new("diagnosis_code", ["E11.9", "I10", "J45.909", "I25.10"]),
        Column::new("loinc_code", ["2345-7", "58410-2", "3456-8", "7890-1"]),
        Column::new("procedure_code", ["99213", "99214", "9921", "99212"]),
        Column::new("bp", ["120/80", "135/85", "high", "128/82"]),
        Column::new("dosage", ["10 mg", "500 mg", "2 tablets", "81 mg"]),
        Column::new(
            "timestamp",
            [
                "2024-01-01 10:00:00",
                "2024-01-01 11:00:00",
                "2024-01-01 12:00:00",
                "2024-01-01 13:00:00",
            ],
        ),
        Column::new("user_id", ["user1", "user2", "user3", "user4"]),
    ])
}

/// A laboratory extract matching the `laboratory` template.
pub fn lab_extract() -> MedvalResult<Dataset> {
    Dataset::new(vec![
        Column::new("specimen_id", ["SP123456-001", "SP123456-002", "SP99-1"]),
        Column::new("loinc_code", ["2345-7", "718-7", "BAD"]),
        Column::new(
            "result",
            ["15.2 (10.0-20.0 mg/dL)", "13.5 (12.0-16.0 g/dL)", "positive"],
        ),
        Column::new("status", ["completed", "pending", "lost"]),
        Column::new("collection_date", ["2024-03-01", "2024-03-02", "2024-13-40"]),
    ])
}
