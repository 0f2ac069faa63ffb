//! Leaf parsing: the textual value of one form control → a typed scalar.
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::Schema;
use crate::typed::Typed;

// ------------------------------- Policy ---------------------------------- //

const TRUE_WORDS: &[&str] = &["true", "t", "yes", "y", "on", "1"];
const FALSE_WORDS: &[&str] = &["false", "f", "no", "n", "off", "0"];

// `YYYY-MM-DDTHH:MM[:SS[.fraction]]` + optional `Z` / `±HH:MM`; no offset means UTC
static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(?::\d{2}(?:\.\d{1,9})?)?)([Zz]|[+-]\d{2}:\d{2})?$")
        .expect("timestamp pattern compiles")
});

// ------------------------------- Parsing --------------------------------- //

/// Parse `text` as the scalar `schema` describes. Non-scalar schemas are the
/// caller's business and are rejected here.
pub fn parse(text: &str, schema: &Schema) -> Result<Typed, String> {
    match schema {
        Schema::String => Ok(Typed::String(text.to_string())),
        Schema::UInt => parse_uint(text).map(Typed::UInt),
        Schema::Bool => parse_bool(text).map(Typed::Bool),
        Schema::Timestamp => parse_timestamp(text).map(Typed::Timestamp),
        other => Err(format!("expected {}, found a single value", article(other))),
    }
}

/// The value a padded-but-never-submitted position takes.
pub fn zero(schema: &Schema) -> Option<Typed> {
    match schema {
        Schema::String => Some(Typed::String(String::new())),
        Schema::UInt => Some(Typed::UInt(0)),
        Schema::Bool => Some(Typed::Bool(false)),
        _ => None,
    }
}

pub fn parse_uint(text: &str) -> Result<u64, String> {
    use std::num::IntErrorKind;
    let t = text.trim();
    if t.is_empty() {
        return Err("expected a non-negative integer, found an empty value".into());
    }
    match t.parse::<u64>() {
        Ok(n) => Ok(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Err(format!("`{t}` is too large")),
            _ if t.strip_prefix('-').is_some_and(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit())) => {
                Err(format!("must be non-negative, found `{t}`"))
            }
            _ => Err(format!("expected a non-negative integer, found `{t}`")),
        },
    }
}

pub fn parse_bool(text: &str) -> Result<bool, String> {
    let t = text.trim().to_ascii_lowercase();
    if TRUE_WORDS.contains(&t.as_str()) {
        Ok(true)
    } else if FALSE_WORDS.contains(&t.as_str()) {
        Ok(false)
    } else {
        Err(format!("expected a boolean, found `{}`", text.trim()))
    }
}

pub fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>, String> {
    let t = text.trim();
    let invalid = || format!("expected a timestamp like 2024-01-31T09:30:00Z, found `{t}`");

    let caps = TIMESTAMP_RE.captures(t).ok_or_else(invalid)?;
    let naive = NaiveDateTime::parse_from_str(&caps[1], "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&caps[1], "%Y-%m-%dT%H:%M"))
        .map_err(|_| invalid())?;

    let offset = match caps.get(2).map(|m| m.as_str()) {
        None | Some("Z") | Some("z") => FixedOffset::east_opt(0),
        Some(o) => parse_offset(o),
    }
    .ok_or_else(invalid)?;

    offset.from_local_datetime(&naive).single().ok_or_else(invalid)
}

/// `±HH:MM`, already shape-checked by the pattern.
fn parse_offset(o: &str) -> Option<FixedOffset> {
    let sign = if o.starts_with('-') { -1 } else { 1 };
    let hours: i32 = o.get(1..3)?.parse().ok()?;
    let minutes: i32 = o.get(4..6)?.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

pub(crate) fn article(schema: &Schema) -> String {
    let name = schema.type_name();
    match name.as_bytes().first() {
        Some(b'a' | b'e' | b'i' | b'o' | b'u') => format!("an {name}"),
        _ => format!("a {name}"),
    }
}
