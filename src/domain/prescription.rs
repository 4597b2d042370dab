//! Prescription request shapes and the sanitized form that templates consume.

use serde::Deserialize;

use crate::domain::{error::DomainError, escape};

/// One compile request as posted by the form client. Field names follow the
/// wire format (`camelCase`); every field is optional at this level so that
/// absence can sanitize to an empty string instead of a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrescriptionRequest {
    pub hospital_name: Option<String>,
    /// `YYYY-MM-DD`; decomposed into year/month/day during composition.
    pub date: Option<String>,
    /// Patient name.
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub department: Option<String>,
    pub patient_id: Option<String>,
    pub fee_type: Option<String>,
    pub diagnosis: Option<String>,
    pub doctor_name: Option<String>,
    pub fee: Option<String>,
    /// Host-derived access code; compared, never typeset.
    pub auth_code: Option<String>,
    /// Optional base64-encoded PNG replacing the built-in signature image.
    pub custom_sign: Option<String>,
    pub medicines: Vec<MedicineLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MedicineLine {
    pub name: String,
    pub quantity: String,
    pub usage: String,
}

impl PrescriptionRequest {
    /// Reject requests missing the fields the template cannot render without.
    /// Runs before the access gate and before any disk I/O.
    pub fn validate(&self) -> Result<(), DomainError> {
        fn blank(value: &Option<String>) -> bool {
            value.as_deref().is_none_or(|v| v.trim().is_empty())
        }

        if blank(&self.hospital_name) {
            return Err(DomainError::validation("hospitalName is required"));
        }
        if blank(&self.date) {
            return Err(DomainError::validation("date is required"));
        }
        if blank(&self.name) {
            return Err(DomainError::validation("name is required"));
        }
        if self.medicines.is_empty() {
            return Err(DomainError::validation(
                "at least one medicine line is required",
            ));
        }
        Ok(())
    }
}

/// Escaped counterpart of [`PrescriptionRequest`]. This is the only shape
/// that is ever spliced into template source text.
#[derive(Debug, Clone)]
pub struct SanitizedPrescription {
    pub hospital_name: String,
    pub date: String,
    pub name: String,
    pub gender: String,
    pub age: String,
    pub department: String,
    pub patient_id: String,
    pub fee_type: String,
    pub diagnosis: String,
    pub doctor_name: String,
    pub fee: String,
    pub medicines: Vec<SanitizedMedicine>,
}

#[derive(Debug, Clone)]
pub struct SanitizedMedicine {
    pub name: String,
    pub quantity: String,
    pub usage: String,
}

impl SanitizedPrescription {
    pub fn from_request(request: &PrescriptionRequest) -> Self {
        fn text(value: &Option<String>) -> String {
            escape::escape_preserving_layout(value.as_deref().unwrap_or(""))
        }

        Self {
            hospital_name: text(&request.hospital_name),
            date: text(&request.date),
            name: text(&request.name),
            gender: text(&request.gender),
            age: text(&request.age),
            department: text(&request.department),
            patient_id: text(&request.patient_id),
            fee_type: text(&request.fee_type),
            diagnosis: text(&request.diagnosis),
            doctor_name: text(&request.doctor_name),
            fee: text(&request.fee),
            medicines: request
                .medicines
                .iter()
                .map(|med| SanitizedMedicine {
                    name: escape::escape_medicine_name(&med.name),
                    quantity: escape::escape(&med.quantity),
                    usage: escape::escape(&med.usage),
                })
                .collect(),
        }
    }
}
