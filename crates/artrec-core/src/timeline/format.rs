use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::{Map, Value};

use crate::{Delta, TimelineEvent};

use super::error::TimelineError;

/// Serialize one event as a single-key JSON object, without the newline.
///
/// ```text
/// {"250":[{"channel":5,"value":20}]}
/// ```
pub fn encode_line(event: &TimelineEvent) -> Result<String, TimelineError> {
    let mut object = Map::with_capacity(1);
    object.insert(
        event.offset_ms.to_string(),
        serde_json::to_value(&event.deltas)?,
    );
    Ok(serde_json::to_string(&Value::Object(object))?)
}

/// Every key of a line object in document order, duplicates included.
struct LineEntries(Vec<(String, Vec<Delta>)>);

impl<'de> Deserialize<'de> for LineEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = LineEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping an offset to a list of deltas")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(1));
                while let Some(entry) = map.next_entry::<String, Vec<Delta>>()? {
                    entries.push(entry);
                }
                Ok(LineEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Parse one timeline line. `line` is the 1-based line number used in errors.
pub fn decode_line(text: &str, line: usize) -> Result<TimelineEvent, TimelineError> {
    let LineEntries(entries) =
        serde_json::from_str(text).map_err(|err| TimelineError::Malformed {
            line,
            message: err.to_string(),
        })?;
    if entries.len() != 1 {
        return Err(TimelineError::OffsetCount {
            line,
            count: entries.len(),
        });
    }

    let Some((key, deltas)) = entries.into_iter().next() else {
        return Err(TimelineError::OffsetCount { line, count: 0 });
    };
    let offset_ms = key
        .trim()
        .parse::<u64>()
        .map_err(|_| TimelineError::InvalidOffset {
            line,
            key: key.clone(),
        })?;
    if deltas.is_empty() {
        return Err(TimelineError::EmptyEvent { line });
    }
    Ok(TimelineEvent { offset_ms, deltas })
}

#[cfg(test)]
mod tests {
    use super::{decode_line, encode_line};
    use crate::timeline::error::TimelineError;
    use crate::{Delta, TimelineEvent};

    #[test]
    fn encodes_offset_as_quoted_key() {
        let event = TimelineEvent::new(250, vec![Delta::new(5, 20), Delta::new(6, 0)]);
        let line = encode_line(&event).unwrap();
        assert_eq!(
            line,
            r#"{"250":[{"channel":5,"value":20},{"channel":6,"value":0}]}"#
        );
    }

    #[test]
    fn decodes_a_written_line() {
        let event = decode_line(r#"{"0":[{"channel":1,"value":255}]}"#, 1).unwrap();
        assert_eq!(event, TimelineEvent::new(0, vec![Delta::new(1, 255)]));
    }

    #[test]
    fn rejects_garbage() {
        let err = decode_line("not json", 4).unwrap_err();
        assert!(matches!(err, TimelineError::Malformed { line: 4, .. }));
    }

    #[test]
    fn rejects_multiple_offsets() {
        let err = decode_line(
            r#"{"1":[{"channel":1,"value":1}],"2":[{"channel":1,"value":2}]}"#,
            2,
        )
        .unwrap_err();
        assert!(matches!(err, TimelineError::OffsetCount { line: 2, count: 2 }));
    }

    #[test]
    fn rejects_repeated_offset_key() {
        let err = decode_line(
            r#"{"1":[{"channel":1,"value":1}],"1":[{"channel":2,"value":2}]}"#,
            3,
        )
        .unwrap_err();
        assert!(matches!(err, TimelineError::OffsetCount { line: 3, count: 2 }));
    }

    #[test]
    fn rejects_non_numeric_offset() {
        let err = decode_line(r#"{"soon":[{"channel":1,"value":1}]}"#, 1).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidOffset { .. }));
    }

    #[test]
    fn rejects_empty_delta_list() {
        let err = decode_line(r#"{"10":[]}"#, 7).unwrap_err();
        assert!(matches!(err, TimelineError::EmptyEvent { line: 7 }));
    }
}
