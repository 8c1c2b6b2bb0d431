//! Rotation demo: a tiny size cap forces the backup chain to turn over.

use cloudlog::{CloudLogHandler, LogRecord, SinkConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = SinkConfig::new()
        .with_directory(dir.path())
        .with_max_bytes(1024)
        .with_backup_count(3);

    let handler = CloudLogHandler::open(&config)?;
    for i in 0..100 {
        let record = LogRecord::new("INFO", format!("Log message number {}", i));
        handler.handle(&record, "")?;
    }
    handler.flush()?;

    for entry in std::fs::read_dir(dir.path())? {
        let entry = entry?;
        let len = entry.metadata()?.len();
        println!("{}\t{} bytes", entry.file_name().to_string_lossy(), len);
    }

    Ok(())
}
