//! The rendering pipeline: validate, gate, compose, compile, clean up.
//!
//! Ordering is deliberate: validation runs first, the access gate second, and
//! only then does any disk I/O happen. The workspace is disposed on every
//! exit path once it exists.

use std::{path::PathBuf, time::Instant};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use metrics::{counter, histogram};
use tracing::info;

use crate::{
    application::{compose, error::RenderError, license::LicenseGate},
    domain::{
        error::DomainError,
        prescription::{PrescriptionRequest, SanitizedPrescription},
    },
    infra::{error::InfraError, latex::LatexCompiler, workdir::RenderWorkspace},
};

/// Built-in signature image, written into the job directory when the caller
/// does not supply `customSign`.
const DEFAULT_SIGN_PNG: &[u8] = include_bytes!("../../assets/sign.png");

const SIGN_FILE: &str = "sign.png";
const MACRO_FILE: &str = "macro.tex";
const MEDICINE_FILE: &str = "medicine.tex";

#[derive(Clone)]
pub struct RenderService {
    gate: LicenseGate,
    compiler: LatexCompiler,
    workdir_base: PathBuf,
}

impl RenderService {
    pub fn new(gate: LicenseGate, compiler: LatexCompiler, workdir_base: PathBuf) -> Self {
        Self {
            gate,
            compiler,
            workdir_base,
        }
    }

    /// Render one prescription to PDF bytes.
    pub async fn render(&self, request: &PrescriptionRequest) -> Result<Bytes, RenderError> {
        let started_at = Instant::now();

        request.validate().inspect_err(|_| {
            counter!("ricetta_render_rejected_total").increment(1);
        })?;
        let fields = SanitizedPrescription::from_request(request);

        let supplied = request.auth_code.as_deref().unwrap_or("");
        if !self.gate.verify(supplied) {
            counter!("ricetta_render_rejected_total").increment(1);
            return Err(RenderError::Unauthorized {
                device_info: self.gate.identity().to_string(),
            });
        }

        let workspace =
            RenderWorkspace::create(&self.workdir_base).map_err(RenderError::Infra)?;
        let result = self.render_in(&workspace, request, &fields).await;
        workspace.dispose();

        match &result {
            Ok(pdf) => {
                counter!("ricetta_render_success_total").increment(1);
                histogram!("ricetta_render_duration_ms")
                    .record(started_at.elapsed().as_millis() as f64);
                info!(
                    target = "ricetta::pipeline",
                    pdf_bytes = pdf.len(),
                    medicines = request.medicines.len(),
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    "prescription rendered"
                );
            }
            Err(_) => {
                counter!("ricetta_render_failure_total").increment(1);
            }
        }
        result
    }

    async fn render_in(
        &self,
        workspace: &RenderWorkspace,
        request: &PrescriptionRequest,
        fields: &SanitizedPrescription,
    ) -> Result<Bytes, RenderError> {
        let signature = decode_signature(request.custom_sign.as_deref())?;
        tokio::fs::write(workspace.path().join(SIGN_FILE), &signature)
            .await
            .map_err(InfraError::from)?;

        let filled_macros = compose::fill_macro_template(fields)?;
        tokio::fs::write(workspace.path().join(MACRO_FILE), filled_macros)
            .await
            .map_err(InfraError::from)?;

        let fragment = compose::medicine_fragment(&fields.medicines);
        tokio::fs::write(workspace.path().join(MEDICINE_FILE), fragment)
            .await
            .map_err(InfraError::from)?;

        let pdf = self
            .compiler
            .compile(workspace.path(), compose::MAIN_TEMPLATE)
            .await?;
        Ok(pdf)
    }
}

fn decode_signature(custom_sign: Option<&str>) -> Result<Vec<u8>, RenderError> {
    match custom_sign {
        Some(encoded) if !encoded.trim().is_empty() => BASE64
            .decode(encoded.trim())
            .map_err(|err| {
                RenderError::Domain(DomainError::validation(format!(
                    "customSign is not valid base64: {err}"
                )))
            }),
        _ => Ok(DEFAULT_SIGN_PNG.to_vec()),
    }
}
