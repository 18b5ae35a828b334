use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DecodeError;
use loghuman_types::{LogRecord, Variant, ZapRecord};

/// Decoder for turning raw log lines into typed records
pub struct LogDecoder;

impl LogDecoder {
    /// Decode a raw line as the given variant.
    ///
    /// Missing fields take their zero value and a repeated key keeps its
    /// last value. Malformed JSON, a non-object document or a field of the
    /// wrong JSON type fails the whole line.
    pub fn decode(raw: &[u8], variant: Variant) -> Result<LogRecord, DecodeError> {
        let value: Value = serde_json::from_slice(raw)
            .map_err(|source| DecodeError::Json { variant, source })?;
        // Struct deserialization would also accept arrays positionally
        if !value.is_object() {
            return Err(DecodeError::NotAnObject);
        }

        let record = match variant {
            Variant::Quarkus => LogRecord::Quarkus(Self::from_value(value, variant)?),
            Variant::SpringBoot => LogRecord::SpringBoot(Self::from_value(value, variant)?),
            Variant::Zap => {
                let record: ZapRecord = Self::from_value(value, variant)?;
                if record.timestamp().is_none() {
                    return Err(DecodeError::TimestampOutOfRange { ts: record.ts });
                }
                LogRecord::Zap(record)
            }
            Variant::DotNet => LogRecord::DotNet(Self::from_value(value, variant)?),
        };

        Ok(record)
    }

    fn from_value<T: DeserializeOwned>(value: Value, variant: Variant) -> Result<T, DecodeError> {
        serde_json::from_value(value).map_err(|source| DecodeError::Json { variant, source })
    }
}
