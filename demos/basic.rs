//! Basic usage: install the sink and emit a few records.
//!
//! Writes `app.<pid>.json` into a temporary directory and prints the lines
//! it produced.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;

    cloudlog::builder()
        .with_directory(dir.path())
        .with_level("info")
        .init()?;

    tracing::info!("service starting");
    tracing::warn!(endpoint = "/healthz", "slow response");
    tracing::error!(trace_id = "deadbeef", "request failed");

    cloudlog::flush()?;

    let path = cloudlog::SinkConfig::new()
        .with_directory(dir.path())
        .log_path();
    print!("{}", std::fs::read_to_string(path)?);

    Ok(())
}
