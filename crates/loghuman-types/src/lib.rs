//! Shared types for loghuman
//!
//! This crate contains the log record shapes the decoder targets and the
//! renderer consumes. Every record is built fresh from one input line and
//! dropped once it has been written out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;

// ============================================================================
// Variant Selection
// ============================================================================

/// The record shape a run decodes every line as
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Quarkus JSON logging (structured exceptions, MDC tracing)
    #[default]
    Quarkus,
    /// Spring Boot / logstash encoder
    SpringBoot,
    /// Uber zap (controller-runtime style)
    Zap,
    /// .NET console JSON formatter
    DotNet,
}

impl Variant {
    pub const ALL: [Variant; 4] = [Self::Quarkus, Self::SpringBoot, Self::Zap, Self::DotNet];

    /// Name used on the command line and in config files
    pub fn name(&self) -> &'static str {
        match self {
            Self::Quarkus => "quarkus",
            Self::SpringBoot => "springboot",
            Self::Zap => "zap",
            Self::DotNet => "dotnet",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Largest accepted input line, excluding the terminating newline
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Settings fixed for the lifetime of one run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub variant: Variant,
    pub max_line_bytes: usize,
}

impl RunConfig {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(Variant::default())
    }
}

// ============================================================================
// Log Records
// ============================================================================

/// A fully decoded log line, one case per variant
#[derive(Clone, Debug, PartialEq)]
pub enum LogRecord {
    Quarkus(QuarkusRecord),
    SpringBoot(SpringBootRecord),
    Zap(ZapRecord),
    DotNet(DotNetRecord),
}

impl LogRecord {
    pub fn variant(&self) -> Variant {
        match self {
            Self::Quarkus(_) => Variant::Quarkus,
            Self::SpringBoot(_) => Variant::SpringBoot,
            Self::Zap(_) => Variant::Zap,
            Self::DotNet(_) => Variant::DotNet,
        }
    }
}

/// Quarkus `quarkus-logging-json` record
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuarkusRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_as_default")]
    pub level: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub logger_name: String,
    pub exception: Option<ExceptionNode>,
    #[serde(rename = "mdc")]
    pub tracing: Option<Tracing>,
}

impl QuarkusRecord {
    /// The primary exception, unless it is absent or entirely zero-valued
    pub fn exception(&self) -> Option<&ExceptionNode> {
        self.exception.as_ref().filter(|ex| !ex.is_empty())
    }

    pub fn has_exception(&self) -> bool {
        self.exception().is_some()
    }

    /// Walk the primary exception and its causes, outermost first
    pub fn cause_chain(&self) -> CauseChain<'_> {
        CauseChain {
            next: self.exception(),
        }
    }

    /// Tracing context, unless every field of it is empty
    pub fn tracing(&self) -> Option<&Tracing> {
        self.tracing.as_ref().filter(|t| !t.is_empty())
    }
}

/// Spring Boot record; the stack trace arrives pre-formatted
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpringBootRecord {
    #[serde(rename = "@timestamp", deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_as_default")]
    pub level: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub logger_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub stack_trace: String,
}

/// Uber zap record
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZapRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub level: String,
    /// Seconds since the Unix epoch, sub-second precision in the fraction
    #[serde(deserialize_with = "null_as_default")]
    pub ts: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub logger: String,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
    #[serde(deserialize_with = "null_as_default")]
    pub controller: String,
    #[serde(deserialize_with = "null_as_default")]
    pub request: String,
    #[serde(deserialize_with = "null_as_default")]
    pub error: String,
    #[serde(deserialize_with = "null_as_default")]
    pub stacktrace: String,
}

impl ZapRecord {
    /// `ts` as a UTC instant, `None` if it falls outside chrono's range
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        unix_epoch_to_utc(self.ts)
    }
}

/// .NET console JSON record
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DotNetRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(rename = "LogLevel", deserialize_with = "null_as_default")]
    pub level: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(rename = "Category", deserialize_with = "null_as_default")]
    pub logger_name: String,
}

// ============================================================================
// Exceptions
// ============================================================================

/// One exception in a cause chain
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExceptionNode {
    /// Informational only, never rendered
    #[serde(deserialize_with = "null_as_default")]
    pub ref_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub exception_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    pub caused_by: Option<CausedBy>,
    #[serde(deserialize_with = "null_as_default")]
    pub frames: Vec<Frame>,
}

impl ExceptionNode {
    /// The directly wrapped cause, if one is present
    pub fn cause(&self) -> Option<&ExceptionNode> {
        self.caused_by.as_ref()?.exception.as_deref()
    }

    /// True when every field still holds its zero value
    pub fn is_empty(&self) -> bool {
        self.ref_id == 0
            && self.exception_type.is_empty()
            && self.message.is_empty()
            && self.frames.is_empty()
            && self.cause().is_none()
    }
}

/// Wrapper around a nested cause; an absent `exception` ends the chain
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CausedBy {
    pub exception: Option<Box<ExceptionNode>>,
}

/// A single stack frame
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Frame {
    #[serde(deserialize_with = "null_as_default")]
    pub class: String,
    #[serde(deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub line: i64,
}

/// Iterator over an exception and its causes, in cause order
#[derive(Clone, Debug)]
pub struct CauseChain<'a> {
    next: Option<&'a ExceptionNode>,
}

impl<'a> CauseChain<'a> {
    pub fn new(root: &'a ExceptionNode) -> Self {
        Self { next: Some(root) }
    }
}

impl<'a> Iterator for CauseChain<'a> {
    type Item = &'a ExceptionNode;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.cause();
        Some(current)
    }
}

// ============================================================================
// Tracing Context
// ============================================================================

/// Quarkus MDC tracing fields
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tracing {
    #[serde(deserialize_with = "null_as_default")]
    pub trace_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub span_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sampled: String,
}

impl Tracing {
    pub fn is_empty(&self) -> bool {
        self.trace_id.is_empty() && self.span_id.is_empty() && self.sampled.is_empty()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Convert fractional Unix epoch seconds to UTC.
///
/// The fraction is scaled to nanoseconds and truncated toward zero; a
/// negative fraction borrows one whole second so nanoseconds stay positive.
pub fn unix_epoch_to_utc(ts: f64) -> Option<DateTime<Utc>> {
    if !ts.is_finite() {
        return None;
    }
    let mut secs = ts.trunc() as i64;
    let mut nanos = (ts.fract() * 1e9) as i64;
    if nanos < 0 {
        secs = secs.checked_sub(1)?;
        nanos += 1_000_000_000;
    }
    DateTime::from_timestamp(secs, u32::try_from(nanos).ok()?)
}

/// JSON `null` decodes to the field's zero value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn node(exception_type: &str, cause: Option<ExceptionNode>) -> ExceptionNode {
        ExceptionNode {
            exception_type: exception_type.to_string(),
            caused_by: Some(CausedBy {
                exception: cause.map(Box::new),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_cause_chain_order() {
        let root = node("outer", Some(node("middle", Some(node("inner", None)))));
        let types: Vec<&str> = CauseChain::new(&root)
            .map(|ex| ex.exception_type.as_str())
            .collect();
        assert_eq!(types, vec!["outer", "middle", "inner"]);
    }

    #[test]
    fn test_zero_valued_exception_is_absent() {
        let record = QuarkusRecord {
            exception: Some(ExceptionNode::default()),
            ..Default::default()
        };
        assert!(!record.has_exception());
        assert_eq!(record.cause_chain().count(), 0);

        let record = QuarkusRecord {
            exception: Some(ExceptionNode {
                ref_id: 3,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(record.has_exception());
    }

    #[test]
    fn test_empty_nested_cause_still_walked() {
        let root = node("outer", Some(ExceptionNode::default()));
        assert_eq!(CauseChain::new(&root).count(), 2);
    }

    #[test]
    fn test_empty_tracing_is_absent() {
        let record = QuarkusRecord {
            tracing: Some(Tracing::default()),
            ..Default::default()
        };
        assert!(record.tracing().is_none());

        let record = QuarkusRecord {
            tracing: Some(Tracing {
                span_id: "12".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(record.tracing().is_some());
    }

    #[test]
    fn test_null_fields_default() {
        let record: QuarkusRecord = serde_json::from_str(
            r#"{"level":null,"message":"m","exception":{"frames":null,"causedBy":null}}"#,
        )
        .unwrap();
        assert_eq!(record.level, "");
        assert_eq!(record.message, "m");
        assert!(!record.has_exception());
    }

    #[test]
    fn test_variant_names_round_trip_through_serde() {
        for variant in Variant::ALL {
            let parsed: Variant = serde_json::from_str(&format!("\"{}\"", variant)).unwrap();
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn test_unix_epoch_to_utc() {
        let ts = unix_epoch_to_utc(1598445905.143377).unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2020, 8, 26));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (12, 45, 5));
        assert_eq!(ts.timestamp_subsec_nanos(), 143377065);
    }

    #[test]
    fn test_unix_epoch_negative_fraction_borrows() {
        let ts = unix_epoch_to_utc(-1.5).unwrap();
        assert_eq!(ts.timestamp(), -2);
        assert_eq!(ts.timestamp_subsec_nanos(), 500_000_000);
    }

    #[test]
    fn test_unix_epoch_out_of_range() {
        assert!(unix_epoch_to_utc(1e300).is_none());
    }
}
