//! Log redaction for patient data.
//!
//! Assessment code never logs raw vitals on purpose, but formatted errors and
//! third-party messages can still carry them. Every log line passes through
//! [`SanitizingMakeWriter`], which rewrites:
//! - blood-pressure readings (`150/95`, `150/95 mmHg`)
//! - labelled vitals (`BMI 28.0`, `age: 58`, `weight=85.75`)
//! - contact details (emails, phone numbers)
//! - identifiers (UUIDs, SSN-like numbers, MRNs)
//!
//! Model digests and file paths are left alone.
//!
//! Input is capped per call (`CARDIOCARE_REDACT_MAX_BYTES`, 16 KiB default) so a
//! runaway line cannot stall the logger.

use std::io::{self, Write};
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_REDACT_MAX_BYTES: usize = 16 * 1024;

const RULES: [(&str, &str); 7] = [
    (
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        "[REDACTED-ID]",
    ),
    (r"\b\d{3}-\d{2}-\d{4}\b", "[REDACTED-SSN]"),
    (r"(?i)\bMRN[:#\s]?\s*\d{6,10}\b", "[REDACTED-MRN]"),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (
        r"\b(?:\+?\d{1,2}[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b",
        "[REDACTED-PHONE]",
    ),
    (r"\b\d{2,3}\s*/\s*\d{2,3}(?:\s*mmHg)?\b", "[REDACTED-BP]"),
    (
        r"(?i)\b(age|bmi|height|weight|systolic|diastolic|ap_hi|ap_lo)\b(\s*[:=]?\s*)\d+(?:\.\d+)?",
        "$1$2[REDACTED]",
    ),
];

struct Redactions {
    set: RegexSet,
    rules: Vec<(Regex, &'static str)>,
}

fn redactions() -> &'static Redactions {
    static REDACTIONS: OnceLock<Redactions> = OnceLock::new();
    REDACTIONS.get_or_init(|| Redactions {
        set: RegexSet::new(RULES.iter().map(|(pattern, _)| *pattern))
            .expect("redaction patterns are valid"),
        rules: RULES
            .iter()
            .map(|(pattern, replacement)| {
                (
                    Regex::new(pattern).expect("redaction pattern is valid"),
                    *replacement,
                )
            })
            .collect(),
    })
}

fn max_redact_bytes() -> usize {
    static LIMIT: OnceLock<usize> = OnceLock::new();
    *LIMIT.get_or_init(|| {
        std::env::var("CARDIOCARE_REDACT_MAX_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_REDACT_MAX_BYTES)
    })
}

fn clip(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Replace patient-identifying values in `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_redact_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let redactions = redactions();
    let (text, clipped) = clip(input, max_bytes);

    let mut out = text.to_string();
    for index in redactions.set.matches(text).iter() {
        let (regex, replacement) = &redactions.rules[index];
        out = regex.replace_all(&out, *replacement).into_owned();
    }

    if clipped {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// Whether `input` holds anything [`sanitize`] would rewrite.
#[must_use]
pub fn contains_pii(input: &str) -> bool {
    let (text, _) = clip(input, max_redact_bytes());
    redactions().set.is_match(text)
}

/// `MakeWriter` wrapper that redacts each formatted log line.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            pending: Vec::new(),
        }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: Write> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> SanitizingWriter<W> {
    fn emit(&mut self, bytes: &[u8]) -> io::Result<()> {
        let line = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&line).as_bytes())
    }

    fn drain_lines(&mut self) -> io::Result<()> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line)?;
        }
        Ok(())
    }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);

        if self.pending.len() > max_redact_bytes().saturating_mul(2) {
            let overflow = std::mem::take(&mut self.pending);
            self.emit(&overflow)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.drain_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain_lines()?;
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest)?;
        }
        self.inner.flush()
    }
}

impl<W: Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
