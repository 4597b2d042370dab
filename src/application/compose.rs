//! Template composition.
//!
//! The macro document is treated as raw text: each placeholder is a full
//! `\newcommand` definition replaced literally, exactly once, with the same
//! command redefined to the sanitized value. No template engine sits in
//! between, so output stays byte-for-byte predictable.

use thiserror::Error;

use crate::domain::prescription::{SanitizedMedicine, SanitizedPrescription};

/// Master document; compiled as-is, includes `macro.tex` and `medicine.tex`
/// from the job directory.
pub const MAIN_TEMPLATE: &str = include_str!("../../assets/tex/main.tex");

const MACRO_TEMPLATE: &str = include_str!("../../assets/tex/macro.tex");

/// Forced double line break between medicine blocks.
const MEDICINE_BREAK: &str = r"\\\\";

/// The fixed placeholder set: command name and the default body it carries in
/// the unfilled template.
const PLACEHOLDERS: &[(&str, &str)] = &[
    ("\\textHospitalName", ""),
    ("\\textPatientDateYear", "\\the\\year"),
    ("\\textPatientDateMonth", "\\the\\month"),
    ("\\textPatientDateDay", "\\the\\day"),
    ("\\textPatientName", ""),
    ("\\textPatientGender", ""),
    ("\\textPatientAge", ""),
    ("\\textPatientDep", ""),
    ("\\textPatientID", ""),
    ("\\textPatientFeeType", ""),
    ("\\textPatientDiag", ""),
    ("\\textDoctorName", ""),
    ("\\textFee", ""),
    ("\\textWatermark", "SAMPLE"),
];

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("placeholder `{command}` is missing from the embedded macro template")]
    MissingPlaceholder { command: &'static str },
}

/// Verify that every placeholder definition is present in the embedded macro
/// template. Run at startup so template drift refuses to boot instead of
/// producing half-filled documents.
pub fn verify_template_placeholders() -> Result<(), ComposeError> {
    for (command, default_body) in PLACEHOLDERS.iter().copied() {
        let needle = definition(command, default_body);
        if !MACRO_TEMPLATE.contains(&needle) {
            return Err(ComposeError::MissingPlaceholder { command });
        }
    }
    Ok(())
}

/// Fill the macro template from sanitized fields.
///
/// The date arrives as an escaped `YYYY-MM-DD` string and is split into its
/// three components without validation; malformed input propagates into the
/// document as-is, and a missing component substitutes as empty. The
/// watermark is always substituted empty: authorized renders carry no sample
/// marking.
pub fn fill_macro_template(fields: &SanitizedPrescription) -> Result<String, ComposeError> {
    let mut date_parts = fields.date.split('-');
    let year = date_parts.next().unwrap_or("");
    let month = date_parts.next().unwrap_or("");
    let day = date_parts.next().unwrap_or("");

    let values: &[&str] = &[
        fields.hospital_name.as_str(),
        year,
        month,
        day,
        fields.name.as_str(),
        fields.gender.as_str(),
        fields.age.as_str(),
        fields.department.as_str(),
        fields.patient_id.as_str(),
        fields.fee_type.as_str(),
        fields.diagnosis.as_str(),
        fields.doctor_name.as_str(),
        fields.fee.as_str(),
        "",
    ];

    let mut filled = MACRO_TEMPLATE.to_string();
    for ((command, default_body), value) in
        PLACEHOLDERS.iter().copied().zip(values.iter().copied())
    {
        filled = replace_definition_once(filled, command, default_body, value)?;
    }
    Ok(filled)
}

/// Render the medicine list as one `\blockMedicine` line per entry, joined
/// with a visible line break after every block except the last.
pub fn medicine_fragment(medicines: &[SanitizedMedicine]) -> String {
    let last = medicines.len().saturating_sub(1);
    medicines
        .iter()
        .enumerate()
        .map(|(index, med)| {
            let block = format!(
                "\\blockMedicine{{{}}}{{{}}}{{{}}}",
                med.name, med.quantity, med.usage
            );
            if index == last {
                block
            } else {
                block + MEDICINE_BREAK
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn definition(command: &str, body: &str) -> String {
    format!("\\newcommand{{{command}}}{{{body}}}")
}

fn replace_definition_once(
    source: String,
    command: &'static str,
    default_body: &str,
    value: &str,
) -> Result<String, ComposeError> {
    let needle = definition(command, default_body);
    let Some(at) = source.find(&needle) else {
        return Err(ComposeError::MissingPlaceholder { command });
    };

    let replacement = definition(command, value);
    let mut out = String::with_capacity(source.len() + replacement.len());
    out.push_str(&source[..at]);
    out.push_str(&replacement);
    out.push_str(&source[at + needle.len()..]);
    Ok(out)
}
