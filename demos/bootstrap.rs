use std::time::Duration;

use color_eyre::Report;
use service_bootstrap::{
    attach_trace_id, database, load_dotenv, logging, Context, EnvReader, EnvironmentError,
    FallbackPolicy, FromEnv, PoolSettings, SystemEnv, TraceId, TracingSink,
};
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), Report> {
    color_eyre::install()?;

    match load_dotenv() {
        Ok(path) => println!("Loaded {}", path.display()),
        Err(EnvironmentError::DotEnvNotFound) => {}
        Err(e) => return Err(e.into()),
    }
    logging::setup()?;

    let reader = EnvReader::new(FallbackPolicy::UseDefault);
    let startup_timeout = reader.read_duration("STARTUP_TIMEOUT", Duration::from_secs(10));
    let service_name = reader.read_string("SERVICE_NAME", "bootstrap-demo");

    let settings = PoolSettings::from_reader(&reader);
    let ctx = Context::background().with_timeout(startup_timeout);
    let pool = database::connect_with(&SystemEnv, &settings, &ctx, TracingSink).await?;

    let request = attach_trace_id(&Context::background());
    if let Some(trace_id) = TraceId::from_context(&request) {
        async {
            info!(service = %service_name, "Handling request");
            if pool.is_closed() {
                warn!("Pool closed unexpectedly");
            }
        }
        .instrument(trace_id.span())
        .await;
    }

    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}
