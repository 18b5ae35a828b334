use chrono::{DateTime, Datelike, Utc};
use std::fmt::{self, Write};

use loghuman_types::{
    DotNetRecord, ExceptionNode, LogRecord, QuarkusRecord, SpringBootRecord, ZapRecord,
};

/// Renders decoded records as human readable text
pub struct Renderer;

impl Renderer {
    /// Render a record into a string, newlines included
    pub fn render(record: &LogRecord) -> String {
        let mut out = String::new();
        // Writing into a String never fails
        let _ = Self::render_to(record, &mut out);
        out
    }

    /// Render a record as its output lines, each keeping its terminator.
    ///
    /// The last line may lack a newline when a Spring Boot stack trace
    /// does not end with one.
    pub fn render_lines(record: &LogRecord) -> Vec<String> {
        Self::render(record)
            .split_inclusive('\n')
            .map(str::to_string)
            .collect()
    }

    pub fn render_to<W: Write>(record: &LogRecord, out: &mut W) -> fmt::Result {
        match record {
            LogRecord::Quarkus(record) => Self::quarkus(record, out),
            LogRecord::SpringBoot(record) => Self::spring_boot(record, out),
            LogRecord::Zap(record) => Self::zap(record, out),
            LogRecord::DotNet(record) => Self::dotnet(record, out),
        }
    }

    fn quarkus<W: Write>(record: &QuarkusRecord, out: &mut W) -> fmt::Result {
        match record.tracing() {
            Some(tracing) => writeln!(
                out,
                "{} {}\ttraceId={} {}\t{}",
                record.level,
                record.timestamp,
                tracing.trace_id,
                record.logger_name,
                record.message
            )?,
            None => writeln!(
                out,
                "{} {}\t{}\t{}",
                record.level, record.timestamp, record.logger_name, record.message
            )?,
        }

        for exception in record.cause_chain() {
            Self::exception(exception, out)?;
        }
        Ok(())
    }

    /// One `Caused by:` block; every level of the chain uses the same wording
    fn exception<W: Write>(exception: &ExceptionNode, out: &mut W) -> fmt::Result {
        writeln!(
            out,
            "Caused by: {}. {}:",
            exception.exception_type, exception.message
        )?;
        for frame in &exception.frames {
            writeln!(out, "\t at {}({}:{})", frame.method, frame.class, frame.line)?;
        }
        Ok(())
    }

    fn spring_boot<W: Write>(record: &SpringBootRecord, out: &mut W) -> fmt::Result {
        writeln!(
            out,
            "{} {}\t{}\t{}",
            record.level, record.timestamp, record.logger_name, record.message
        )?;
        if !record.stack_trace.is_empty() {
            write!(out, "Exception: {}", record.stack_trace)?;
        }
        Ok(())
    }

    fn zap<W: Write>(record: &ZapRecord, out: &mut W) -> fmt::Result {
        let timestamp = match record.timestamp() {
            Some(ts) => Self::go_utc(&ts),
            None => record.ts.to_string(),
        };
        writeln!(
            out,
            "{} {}\t{}\tmsg: {}\tcontroller: {}\trequest: {}",
            record.level, timestamp, record.logger, record.msg, record.controller, record.request
        )?;
        // The stacktrace follows any error directly, even when it is empty
        if !record.error.is_empty() {
            write!(out, "error: {}", record.error)?;
            writeln!(out, "stacktrace: {}", record.stacktrace)?;
        }
        Ok(())
    }

    fn dotnet<W: Write>(record: &DotNetRecord, out: &mut W) -> fmt::Result {
        writeln!(
            out,
            "{} {}\t{}\t{}",
            record.level, record.timestamp, record.logger_name, record.message
        )
    }

    /// Format like Go's `time.Time.String()` for a UTC instant:
    /// `2006-01-02 15:04:05.999999999 +0000 UTC`, trailing zeros trimmed.
    /// The year is padded to four digits and never carries a `+` sign.
    fn go_utc(ts: &DateTime<Utc>) -> String {
        let year = ts.year();
        let mut formatted = if year < 0 {
            format!("-{:04}", year.unsigned_abs())
        } else {
            format!("{:04}", year)
        };
        formatted.push_str(&ts.format("-%m-%d %H:%M:%S").to_string());
        let nanos = ts.timestamp_subsec_nanos();
        if nanos > 0 {
            let fraction = format!("{:09}", nanos);
            formatted.push('.');
            formatted.push_str(fraction.trim_end_matches('0'));
        }
        formatted.push_str(" +0000 UTC");
        formatted
    }
}
