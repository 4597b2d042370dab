use std::{process, sync::Arc};

use ricetta::{
    application::{compose, license::LicenseGate, pipeline::RenderService},
    config,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        latex::LatexCompiler,
        telemetry,
    },
};
use thiserror::Error;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[derive(Debug, Error)]
enum BootError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Template(#[from] compose::ComposeError),
    #[error("server error: {0}")]
    Server(std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_boot_error(&error);
        process::exit(1);
    }
}

fn report_boot_error(error: &BootError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "startup error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "startup error");
    });
}

async fn run() -> Result<(), BootError> {
    let settings = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    // Refuse to boot if the embedded template drifted from the placeholder set.
    compose::verify_template_placeholders()?;

    let gate = LicenseGate::from_host_identity();
    info!(
        target = "ricetta::license",
        identity = gate.identity(),
        "licensing identity; the access code is SHA-256(identity), uppercase hex, first 12 characters"
    );

    let compiler = LatexCompiler::new(
        settings.compiler.engine_path.clone(),
        settings.compiler.pass_timeout,
    );
    let renderer = RenderService::new(
        gate.clone(),
        compiler,
        settings.compiler.workdir_base.clone(),
    );

    let state = HttpState {
        renderer: Arc::new(renderer),
        license: Arc::new(gate),
    };
    let router = http::build_router(state, settings.server.max_request_bytes.get() as usize);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = "ricetta::server",
        addr = %settings.server.addr,
        engine = %settings.compiler.engine_path.display(),
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(BootError::Server)?;

    Ok(())
}
