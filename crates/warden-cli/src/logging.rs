use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;
use warden_security::redact::{REDACTION, SEPARATOR};
use warden_security::{RedactingMakeWriter, Redactor};

/// Install the global subscriber: `RUST_LOG` filter (default `info`), text or
/// JSON, written to stderr through the PII redactor.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        // Colour codes would split `field=value` and hide it from the redactor.
        .with_ansi(false);

    if config.json {
        let redactor = Redactor::json(&config.redact_fields, REDACTION, SEPARATOR)?;
        builder
            .json()
            .with_writer(RedactingMakeWriter::stderr(redactor))
            .init();
    } else {
        let redactor = Redactor::new(&config.redact_fields, REDACTION, SEPARATOR)?;
        builder
            .with_writer(RedactingMakeWriter::stderr(redactor))
            .init();
    }
    Ok(())
}
