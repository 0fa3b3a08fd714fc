use tracing_subscriber::EnvFilter;

pub fn tracing_subscriber_init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout is reserved for prediction output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Must run once before any model is loaded.
pub fn ort_init() -> Result<(), ort::Error> {
    ort::init().with_name(env!("CARGO_PKG_NAME")).commit()?;
    Ok(())
}
