use regex::{NoExpand, Regex};
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use warden_core::{WardenError, WardenResult};

/// Field names treated as personal data by default.
pub const PII_FIELDS: [&str; 5] = ["name", "email", "phone", "ssn", "password"];

/// Default replacement text.
pub const REDACTION: &str = "***";

/// Default separator between `field=value` pairs.
pub const SEPARATOR: &str = ";";

/// Replace the value of every `field=value` pair naming one of `fields`.
///
/// A value runs up to the next `separator`. Compiles its patterns on every
/// call; use a [`Redactor`] when filtering many messages.
pub fn filter_datum<S: AsRef<str>>(
    fields: &[S],
    redaction: &str,
    message: &str,
    separator: &str,
) -> WardenResult<String> {
    Ok(Redactor::new(fields, redaction, separator)?.redact(message))
}

/// Precompiled PII filter.
#[derive(Debug, Clone)]
pub struct Redactor {
    patterns: Vec<(Regex, String)>,
}

impl Default for Redactor {
    fn default() -> Self {
        // The default field names are plain words, so compilation cannot fail.
        Self::new(&PII_FIELDS, REDACTION, SEPARATOR).unwrap_or(Self {
            patterns: Vec::new(),
        })
    }
}

impl Redactor {
    /// Build a filter for `fields`. Field names and the separator are matched literally.
    pub fn new<S: AsRef<str>>(fields: &[S], redaction: &str, separator: &str) -> WardenResult<Self> {
        let separator = regex::escape(separator);
        let patterns = fields
            .iter()
            .map(|field| {
                let field = field.as_ref();
                compile(
                    &format!("{}=[^{separator}]*", regex::escape(field)),
                    format!("{field}={redaction}"),
                    field,
                )
            })
            .collect::<WardenResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Filter for JSON-formatted log lines.
    ///
    /// Masks `"field":value` members, and `field=value` pairs inside string
    /// values, where a value also stops at a quote or backslash so the
    /// surrounding JSON stays intact.
    pub fn json<S: AsRef<str>>(fields: &[S], redaction: &str, separator: &str) -> WardenResult<Self> {
        let separator = regex::escape(separator);
        let mut patterns = Vec::with_capacity(fields.len() * 2);
        for field in fields {
            let field = field.as_ref();
            let key = regex::escape(field);
            patterns.push(compile(
                &format!(r#""{key}":(?:"(?:[^"\\]|\\.)*"|[^,}}\]]*)"#),
                format!(r#""{field}":"{redaction}""#),
                field,
            )?);
            patterns.push(compile(
                &format!(r#"{key}=[^{separator}"\\]*"#),
                format!("{field}={redaction}"),
                field,
            )?);
        }
        Ok(Self { patterns })
    }

    /// Apply every pattern to `message`.
    pub fn redact(&self, message: &str) -> String {
        let mut out = message.to_string();
        for (re, replacement) in &self.patterns {
            out = re
                .replace_all(&out, NoExpand(replacement.as_str()))
                .into_owned();
        }
        out
    }

    /// Redact line by line so a value never swallows the line break after it.
    fn redact_lines(&self, text: &str) -> String {
        text.split_inclusive('\n')
            .map(|line| match line.strip_suffix('\n') {
                Some(body) => format!("{}\n", self.redact(body)),
                None => self.redact(line),
            })
            .collect()
    }
}

fn compile(pattern: &str, replacement: String, field: &str) -> WardenResult<(Regex, String)> {
    Regex::new(pattern)
        .map(|re| (re, replacement))
        .map_err(|e| WardenError::Config(format!("bad redaction field {field:?}: {e}")))
}

/// A [`MakeWriter`] that passes every formatted event through a [`Redactor`].
#[derive(Clone)]
pub struct RedactingMakeWriter<M = fn() -> io::Stderr> {
    redactor: Arc<Redactor>,
    inner: M,
}

impl RedactingMakeWriter {
    /// Redact onto standard error.
    pub fn stderr(redactor: Redactor) -> Self {
        Self::new(redactor, io::stderr)
    }
}

impl<M> RedactingMakeWriter<M> {
    /// Redact onto whatever `inner` produces.
    pub fn new(redactor: Redactor, inner: M) -> Self {
        Self {
            redactor: Arc::new(redactor),
            inner,
        }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for RedactingMakeWriter<M> {
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            redactor: self.redactor.clone(),
            inner: self.inner.make_writer(),
            buf: Vec::new(),
        }
    }
}

/// Buffers one event and writes it redacted on flush or drop.
pub struct RedactingWriter<W: io::Write> {
    redactor: Arc<Redactor>,
    inner: W,
    buf: Vec<u8>,
}

impl<W: io::Write> RedactingWriter<W> {
    fn emit(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let redacted = self
            .redactor
            .redact_lines(&String::from_utf8_lossy(&self.buf));
        self.buf.clear();
        self.inner.write_all(redacted.as_bytes())
    }
}

impl<W: io::Write> io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit()?;
        self.inner.flush()
    }
}

impl<W: io::Write> Drop for RedactingWriter<W> {
    fn drop(&mut self) {
        let _ = self.emit();
    }
}
