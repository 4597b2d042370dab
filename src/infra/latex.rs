//! Typesetting engine invocation for one composed job directory.

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    process::Stdio,
    time::{Duration, Instant},
};

use bytes::Bytes;
use thiserror::Error;
use tokio::{fs::File, io::AsyncReadExt, process::Command, time::timeout};
use tracing::{info, warn};

/// Cross-references in the master document (the footer page reference)
/// stabilize only on the second pass. Structural, not tunable.
const PASSES: u32 = 2;
const JOB_NAME: &str = "prescription";
const MASTER_FILE: &str = "main.tex";
const READ_CHUNK: usize = 64 * 1024;
const DIAGNOSTIC_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum LatexError {
    #[error("failed to stage compiler input: {0}")]
    Io(#[from] io::Error),
    #[error("typesetting engine unavailable: {0}")]
    NotFound(io::Error),
    #[error("typesetting engine failed (exit {exit_code:?}): {log}")]
    Engine {
        exit_code: Option<i32>,
        log: String,
    },
    #[error("typesetting engine timed out after {0:?}")]
    Timeout(Duration),
    #[error("typesetting engine reported success but produced no document")]
    MissingOutput,
}

#[derive(Debug, Clone)]
pub struct LatexCompiler {
    engine: PathBuf,
    pass_timeout: Duration,
}

impl LatexCompiler {
    pub fn new(engine: PathBuf, pass_timeout: Duration) -> Self {
        Self {
            engine,
            pass_timeout,
        }
    }

    /// Write the master document into `workdir`, run the engine against it
    /// twice with included files resolved from `workdir`, and collect the
    /// produced PDF into memory. The full buffer is the unit of response;
    /// callers never see partial documents.
    pub async fn compile(&self, workdir: &Path, master_source: &str) -> Result<Bytes, LatexError> {
        tokio::fs::write(workdir.join(MASTER_FILE), master_source).await?;
        for pass in 1..=PASSES {
            self.run_pass(workdir, pass).await?;
        }
        self.collect_pdf(workdir).await
    }

    async fn run_pass(&self, workdir: &Path, pass: u32) -> Result<(), LatexError> {
        let started_at = Instant::now();
        let child = Command::new(&self.engine)
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg(format!("-jobname={JOB_NAME}"))
            .arg(MASTER_FILE)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                warn!(
                    target = "ricetta::latex",
                    engine = %self.engine.display(),
                    error = %err,
                    "failed to spawn typesetting engine"
                );
                if err.kind() == ErrorKind::NotFound {
                    LatexError::NotFound(err)
                } else {
                    LatexError::Io(err)
                }
            })?;

        let output = match timeout(self.pass_timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(LatexError::Io)?,
            Err(_) => {
                warn!(
                    target = "ricetta::latex",
                    pass,
                    timeout_ms = self.pass_timeout.as_millis() as u64,
                    "typesetting pass timed out"
                );
                return Err(LatexError::Timeout(self.pass_timeout));
            }
        };

        if !output.status.success() {
            let exit_code = output.status.code();
            let log = engine_diagnostic(&output.stdout, &output.stderr);
            warn!(
                target = "ricetta::latex",
                pass,
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                log = %log,
                "typesetting pass failed"
            );
            return Err(LatexError::Engine { exit_code, log });
        }

        info!(
            target = "ricetta::latex",
            pass,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "typesetting pass complete"
        );
        Ok(())
    }

    async fn collect_pdf(&self, workdir: &Path) -> Result<Bytes, LatexError> {
        let pdf_path = workdir.join(format!("{JOB_NAME}.pdf"));
        let mut file = File::open(&pdf_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                LatexError::MissingOutput
            } else {
                LatexError::Io(err)
            }
        })?;

        let mut buffer = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let read = file.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..read]);
        }

        if buffer.is_empty() {
            return Err(LatexError::MissingOutput);
        }
        Ok(Bytes::from(buffer))
    }
}

fn engine_diagnostic(stdout: &[u8], stderr: &[u8]) -> String {
    // TeX engines put the useful diagnostics on stdout; stderr is the
    // fallback for spawn-adjacent noise.
    let primary = if stdout.is_empty() { stderr } else { stdout };
    let text = String::from_utf8_lossy(primary);
    let lines: Vec<&str> = text.lines().collect();
    let tail_start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    lines[tail_start..].join("\n")
}
