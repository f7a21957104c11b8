//! Attribute types
//!
//! Each built-in kind pairs a parser (raw attribute string → value) with a
//! serializer (value → raw string, or `None` to remove the attribute). Both
//! directions are total; bad input degrades to `Null` with a warning.

use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::value::{format_date, format_number};
use crate::{AttributeValue, RichDataStore};

type ParseFn = Rc<dyn Fn(&str) -> AttributeValue>;
type SerializeFn = Rc<dyn Fn(&AttributeValue) -> Option<String>>;

/// User-supplied attribute type
#[derive(Clone)]
pub struct CustomType {
    parse: ParseFn,
    serialize: Option<SerializeFn>,
}

impl CustomType {
    /// Type with a parser only; writes use the value's display form
    pub fn new<P>(parse: P) -> Self
    where
        P: Fn(&str) -> AttributeValue + 'static,
    {
        Self { parse: Rc::new(parse), serialize: None }
    }

    pub fn with_serializer<S>(mut self, serialize: S) -> Self
    where
        S: Fn(&AttributeValue) -> Option<String> + 'static,
    {
        self.serialize = Some(Rc::new(serialize));
        self
    }
}

impl PartialEq for CustomType {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.parse, &other.parse)
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType")
            .field("serialize", &self.serialize.is_some())
            .finish_non_exhaustive()
    }
}

/// Attribute type descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    /// Presence attribute
    Boolean,
    String,
    Number,
    Json,
    Date,
    CsvString,
    CsvNumber,
    CsvDate,
    /// `key:value;key:value`
    Entries,
    /// In-memory value behind a store token
    RichData,
    Custom(CustomType),
}

/// Parse/serialize pair for one attribute type
#[derive(Clone, Copy)]
pub struct Codec<'a> {
    registry: &'a TypeRegistry,
    ty: &'a AttributeType,
}

impl Codec<'_> {
    /// Parse a raw attribute value; `None` means the attribute is absent
    pub fn parse(&self, raw: Option<&str>, name: &str) -> AttributeValue {
        self.registry.parse(self.ty, raw, name)
    }

    /// Serialize a value; `None` means the attribute should be removed
    pub fn serialize(&self, value: &AttributeValue, name: &str) -> Option<String> {
        self.registry.serialize(self.ty, value, name)
    }
}

/// Fixed mapping from attribute types to their codecs
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    rich: RichDataStore,
}

impl TypeRegistry {
    pub fn new(rich: RichDataStore) -> Self {
        Self { rich }
    }

    /// Store backing `RichData` attributes
    pub fn rich_data(&self) -> &RichDataStore {
        &self.rich
    }

    pub fn resolve<'a>(&'a self, ty: &'a AttributeType) -> Codec<'a> {
        Codec { registry: self, ty }
    }

    /// Parse a raw attribute value
    pub fn parse(&self, ty: &AttributeType, raw: Option<&str>, name: &str) -> AttributeValue {
        let Some(raw) = raw else {
            return match ty {
                AttributeType::Boolean => AttributeValue::Bool(false),
                _ => AttributeValue::Null,
            };
        };
        match ty {
            AttributeType::Boolean => AttributeValue::Bool(parse_bool(raw, name)),
            AttributeType::String => AttributeValue::String(raw.to_string()),
            AttributeType::Number => AttributeValue::Number(parse_number(raw)),
            AttributeType::Json => match serde_json::from_str(raw) {
                Ok(value) => AttributeValue::Json(value),
                Err(err) => {
                    tracing::warn!("Attribute '{}' holds invalid JSON: {}", name, err);
                    AttributeValue::Null
                }
            },
            AttributeType::Date => date_or_null(raw, name),
            AttributeType::CsvString => {
                AttributeValue::List(raw.split(',').map(AttributeValue::from).collect())
            }
            AttributeType::CsvNumber => AttributeValue::List(
                raw.split(',').map(|item| AttributeValue::Number(parse_number(item))).collect(),
            ),
            AttributeType::CsvDate => {
                AttributeValue::List(raw.split(',').map(|item| date_or_null(item, name)).collect())
            }
            AttributeType::Entries => AttributeValue::Entries(
                raw.split(';')
                    .map(|item| {
                        let (key, value) = item.split_once(':').unwrap_or((item, ""));
                        (key.to_string(), value.to_string())
                    })
                    .collect(),
            ),
            AttributeType::RichData => self.rich.get(raw).unwrap_or_default(),
            AttributeType::Custom(custom) => (custom.parse)(raw),
        }
    }

    /// Serialize a value for writing
    ///
    /// `RichData` values land under a fresh, unowned token; element
    /// attributes go through `AttributesAccess`, which keeps their token.
    pub fn serialize(&self, ty: &AttributeType, value: &AttributeValue, name: &str) -> Option<String> {
        if let AttributeType::Boolean = ty {
            return value.is_truthy().then(|| name.to_string());
        }
        if value.is_null() {
            return None;
        }
        match ty {
            AttributeType::Json => Some(match value {
                AttributeValue::Json(json) => json.to_string(),
                other => other.to_json().to_string(),
            }),
            AttributeType::Date => Some(serialize_date(value)),
            AttributeType::CsvDate => Some(match value {
                AttributeValue::List(items) => {
                    items.iter().map(serialize_date).collect::<Vec<_>>().join(",")
                }
                other => serialize_date(other),
            }),
            AttributeType::RichData => Some(self.rich.store(value.clone())),
            AttributeType::Custom(custom) => match &custom.serialize {
                Some(serialize) => serialize(value),
                None => Some(value.to_string()),
            },
            // lists and entries already display in their wire form
            _ => Some(value.to_string()),
        }
    }
}

pub(crate) fn parse_bool(raw: &str, name: &str) -> bool {
    if raw == name {
        return true;
    }
    !matches!(raw, "false" | "off" | "")
}

/// Numeric coercion with script-engine semantics: surrounding whitespace is
/// ignored, an empty string is `0`, `0x`/`0o`/`0b` prefixes select the radix
/// and anything else unparseable is `NaN`.
pub(crate) fn parse_number(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix).map_or(f64::NAN, |n| n as f64);
    }
    // reject the spellings Rust accepts but scripts do not ("inf", "nan")
    if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// RFC 3339, a bare date (midnight UTC), a local-less date-time taken as UTC,
/// or integer milliseconds since the epoch
pub(crate) fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(s, format) {
            return Some(date.and_utc());
        }
    }
    s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
}

fn date_or_null(raw: &str, name: &str) -> AttributeValue {
    match parse_date(raw) {
        Some(date) => AttributeValue::Date(date),
        None => {
            tracing::warn!("Attribute '{}' holds an invalid date: {:?}", name, raw);
            AttributeValue::Null
        }
    }
}

fn serialize_date(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Date(date) => format_date(date),
        AttributeValue::Number(ms) => DateTime::from_timestamp_millis(*ms as i64)
            .map_or_else(|| format_number(*ms), |d| format_date(&d)),
        other => other.to_string(),
    }
}
