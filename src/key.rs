//! Bracket-indexed keys: `root[contacts][1][relationship]` → `[contacts, 1, relationship]`.
use std::fmt;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::decode::DecodeOptions;
use crate::error::DecodeError;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One path component. Digit-only text is always an index; there is no way to
/// spell a field whose name is a string of digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// What a raw form key turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedKey {
    /// No brackets: a direct top-level field named by the whole key.
    Flat(String),
    /// `<root>[seg]...`, root stripped.
    Structured(Vec<Segment>),
}

/// A location in the form, rendered back in the input key syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormPath {
    root: String,
    segments: Vec<Segment>,
}

// whole key: root name followed by one or more bracket groups, nothing else
static KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^\[\]]+)((?:\[[^\[\]]*\])+)$").expect("key pattern compiles")
});

static SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\[\]]*)\]").expect("segment pattern compiles")
});

// ————————————————————————————————————————————————————————————————————————————
// TOKENIZER
// ————————————————————————————————————————————————————————————————————————————

pub fn tokenize(key: &str, options: &DecodeOptions) -> Result<ParsedKey, DecodeError> {
    let malformed = |reason: String| DecodeError::MalformedKey { key: key.to_string(), reason };

    if key.is_empty() {
        return Err(malformed("empty key".into()));
    }
    if !key.contains(['[', ']']) {
        // a bare `3` is no field name; it addresses the root like `root[3]`
        if is_index(key) {
            return Ok(ParsedKey::Structured(vec![parse_segment(key, options).map_err(malformed)?]));
        }
        return Ok(ParsedKey::Flat(key.to_string()));
    }

    let caps = KEY_RE.captures(key).ok_or_else(|| {
        malformed(format!("expected `{}[segment]...` with balanced brackets", options.root))
    })?;

    let root = &caps[1];
    if root != options.root {
        return Err(malformed(format!("unexpected root `{root}`, expected `{}`", options.root)));
    }

    let mut segments = Vec::new();
    for seg in SEGMENT_RE.captures_iter(&caps[2]) {
        let text = &seg[1];
        segments.push(parse_segment(text, options).map_err(malformed)?);
    }
    Ok(ParsedKey::Structured(segments))
}

fn parse_segment(text: &str, options: &DecodeOptions) -> Result<Segment, String> {
    if text.is_empty() {
        return Err("empty segment `[]`".into());
    }
    if !is_index(text) {
        return Ok(Segment::Field(text.to_string()));
    }
    let index: usize = text
        .parse()
        .map_err(|_| format!("index `{text}` is out of range"))?;
    let limit = options.index_limit();
    if index > limit {
        return Err(format!("index {index} exceeds the limit of {limit}"));
    }
    Ok(Segment::Index(index))
}

/// Non-empty and ASCII digits only.
pub fn is_index(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

// ————————————————————————————————————————————————————————————————————————————
// PATHS
// ————————————————————————————————————————————————————————————————————————————

impl Segment {
    pub fn is_index(&self) -> bool { matches!(self, Segment::Index(_)) }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl FormPath {
    pub fn root(root: impl Into<String>) -> Self {
        Self { root: root.into(), segments: Vec::new() }
    }

    pub fn segments(&self) -> &[Segment] { &self.segments }

    pub fn is_root(&self) -> bool { self.segments.is_empty() }

    pub fn push(&mut self, segment: Segment) { self.segments.push(segment); }

    pub fn pop(&mut self) -> Option<Segment> { self.segments.pop() }

    pub fn field(&self, name: &str) -> Self {
        let mut out = self.clone();
        out.push(Segment::Field(name.to_string()));
        out
    }

    pub fn index(&self, i: usize) -> Self {
        let mut out = self.clone();
        out.push(Segment::Index(i));
        out
    }

    /// The path of the first `n` segments.
    pub fn prefix(&self, n: usize) -> Self {
        Self { root: self.root.clone(), segments: self.segments[..n.min(self.segments.len())].to_vec() }
    }
}

impl fmt::Display for FormPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for seg in &self.segments {
            write!(f, "[{seg}]")?;
        }
        Ok(())
    }
}

// ------------------------------- Tests ------------------------------------ //
