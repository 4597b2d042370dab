//! Infrastructure adapters: telemetry, working storage, the typesetting
//! engine, and the HTTP surface.

pub mod error;
pub mod http;
pub mod latex;
pub mod telemetry;
pub mod workdir;
