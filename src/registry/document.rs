//! Top-level registry document shape
//!
//! Entries are collected in source order with duplicates preserved, so the
//! loader can apply its duplicate policy instead of the YAML mapping type
//! rejecting them outright.

use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_yaml::Value;
use std::fmt;

pub(super) enum RawDocument {
    /// Empty document or explicit null
    Empty,
    Entries(Vec<(Value, Value)>),
    /// Anything other than a mapping; holds a description of what was found
    Other(&'static str),
}

impl RawDocument {
    /// A document with nothing but whitespace and comments
    pub(super) fn is_blank(source: &str) -> bool {
        source
            .lines()
            .map(str::trim)
            .all(|line| line.is_empty() || line.starts_with('#') || line == "---" || line == "...")
    }
}

pub(super) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

struct RawDocumentVisitor;

impl<'de> Visitor<'de> for RawDocumentVisitor {
    type Value = RawDocument;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawDocument, A::Error> {
        let mut entries = Vec::new();
        while let Some((key, value)) = map.next_entry::<Value, Value>()? {
            entries.push((key, value));
        }
        Ok(RawDocument::Entries(entries))
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawDocument, E> {
        Ok(RawDocument::Empty)
    }

    fn visit_none<E: de::Error>(self) -> Result<RawDocument, E> {
        Ok(RawDocument::Empty)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<RawDocument, D::Error> {
        deserializer.deserialize_any(RawDocumentVisitor)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<RawDocument, E> {
        Ok(RawDocument::Other("a boolean"))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<RawDocument, E> {
        Ok(RawDocument::Other("a number"))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<RawDocument, E> {
        Ok(RawDocument::Other("a number"))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<RawDocument, E> {
        Ok(RawDocument::Other("a number"))
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<RawDocument, E> {
        Ok(RawDocument::Other("a string"))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawDocument, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(RawDocument::Other("a sequence"))
    }

    fn visit_enum<A: de::EnumAccess<'de>>(self, data: A) -> Result<RawDocument, A::Error> {
        let (IgnoredAny, variant) = data.variant::<IgnoredAny>()?;
        de::VariantAccess::newtype_variant::<IgnoredAny>(variant)?;
        Ok(RawDocument::Other("a tagged value"))
    }
}

impl<'de> Deserialize<'de> for RawDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawDocumentVisitor)
    }
}
