//! Broker order templates.
//!
//! An order template is a JSON array of order entries. Only two paths carry
//! meaning here: `instrument.tradingsymbol` (the join key) and
//! `params.quantity` (the field we rewrite). Everything else is opaque and
//! must survive a parse/serialise round trip with key order intact.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use thiserror::Error;

use crate::error::{CoreError, Result};

pub const INSTRUMENT_KEY: &str = "instrument";
pub const SYMBOL_KEY: &str = "tradingsymbol";
pub const PARAMS_KEY: &str = "params";
pub const QUANTITY_KEY: &str = "quantity";

const OUTPUT_INDENT: &[u8] = b"    ";

/// Ordered list of order entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDocument {
    entries: Vec<Value>,
}

impl OrderDocument {
    pub fn new(entries: Vec<Value>) -> Self {
        Self { entries }
    }

    /// Parse a template. The top-level value must be an array.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Array(entries) => Ok(Self { entries }),
            other => Err(CoreError::NotAnArray(json_kind(&other))),
        }
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        Self::from_slice(input.as_bytes())
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialise with a 4-space indent.
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut buf = Vec::with_capacity(self.entries.len() * 256);
        let formatter = PrettyFormatter::with_indent(OUTPUT_INDENT);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.entries.serialize(&mut ser)?;
        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl From<Vec<Value>> for OrderDocument {
    fn from(entries: Vec<Value>) -> Self {
        Self::new(entries)
    }
}

/// Why an entry could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryShapeError {
    #[error("entry is {0}, expected an object")]
    NotAnObject(&'static str),

    #[error("'instrument' is {0}, expected an object")]
    InstrumentNotAnObject(&'static str),

    #[error("'params' is {0}, expected an object")]
    ParamsNotAnObject(&'static str),
}

/// Read `instrument.tradingsymbol`.
///
/// Returns `Ok(None)` when the path is absent or the symbol is not a non-empty
/// string. Errors when the entry or its `instrument` is not an object.
pub fn trading_symbol(entry: &Value) -> std::result::Result<Option<&str>, EntryShapeError> {
    let obj = entry.as_object().ok_or(EntryShapeError::NotAnObject(json_kind(entry)))?;
    let Some(instrument) = obj.get(INSTRUMENT_KEY) else {
        return Ok(None);
    };
    let instrument = instrument
        .as_object()
        .ok_or(EntryShapeError::InstrumentNotAnObject(json_kind(instrument)))?;

    Ok(instrument
        .get(SYMBOL_KEY)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty()))
}

/// Human-readable JSON type name, used in error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_array() {
        let doc = OrderDocument::from_json_str(r#"[{"a":1},{"b":2}]"#).unwrap();
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_parse_rejects_object() {
        let err = OrderDocument::from_json_str(r#"{"instrument":{}}"#).unwrap_err();
        assert!(matches!(err, CoreError::NotAnArray("an object")));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = OrderDocument::from_json_str("[{").unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }

    #[test]
    fn test_pretty_output_uses_four_spaces_and_keeps_key_order() {
        let doc = OrderDocument::from_json_str(
            r#"[{"zeta":1,"instrument":{"tradingsymbol":"A"},"alpha":2}]"#,
        )
        .unwrap();
        let out = doc.to_pretty_string().unwrap();

        assert!(out.starts_with("[\n    {\n        \"zeta\": 1,"));
        let zeta = out.find("zeta").unwrap();
        let instrument = out.find("instrument").unwrap();
        let alpha = out.find("alpha").unwrap();
        assert!(zeta < instrument && instrument < alpha);
    }

    #[test]
    fn test_untouched_numbers_written_verbatim() {
        let doc = OrderDocument::from_json_str(
            r#"[{"instrument":{"instrument_token":123456789012345678901234,"tick_size":0.050},"params":{"price":-0.0}}]"#,
        )
        .unwrap();
        let out = doc.to_pretty_string().unwrap();

        assert!(out.contains("\"instrument_token\": 123456789012345678901234"));
        assert!(out.contains("\"tick_size\": 0.050"));
        assert!(out.contains("\"price\": -0.0"));
    }

    #[test]
    fn test_empty_document_serialises() {
        let doc = OrderDocument::default();
        assert_eq!(doc.to_pretty_string().unwrap(), "[]");
    }

    #[test]
    fn test_trading_symbol_paths() {
        let entry = json!({"instrument": {"tradingsymbol": "NIFTYBEES"}});
        assert_eq!(trading_symbol(&entry), Ok(Some("NIFTYBEES")));

        assert_eq!(trading_symbol(&json!({"params": {}})), Ok(None));
        assert_eq!(trading_symbol(&json!({"instrument": {}})), Ok(None));
        assert_eq!(
            trading_symbol(&json!({"instrument": {"tradingsymbol": ""}})),
            Ok(None)
        );
        assert_eq!(
            trading_symbol(&json!({"instrument": {"tradingsymbol": 7}})),
            Ok(None)
        );
    }

    #[test]
    fn test_trading_symbol_shape_errors() {
        assert_eq!(
            trading_symbol(&json!("NIFTYBEES")),
            Err(EntryShapeError::NotAnObject("a string"))
        );
        assert_eq!(
            trading_symbol(&json!({"instrument": null})),
            Err(EntryShapeError::InstrumentNotAnObject("null"))
        );
    }
}
