//! Ricetta: a self-hosted prescription typesetting service.
//!
//! Structured form data comes in over HTTP, every field is escaped for safe
//! splicing into LaTeX source, an access code derived from the host identity
//! gates the render, and XeLaTeX runs twice inside an ephemeral per-request
//! working directory before the PDF bytes stream back.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
