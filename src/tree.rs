//! Intermediate tree: accumulate `(segments, value)` pairs into one nested
//! structure before anything is known about the target schema.
//!
//! A node's kind is fixed by the first segment that addresses it:
//! - field name → object
//! - index      → list
//!
//! The root is an object from the start (flat keys land there), so indices
//! applied to it are kept as digit-named fields until [`crate::normalize`]
//! sees the finished tree.
use indexmap::IndexMap;
use serde_json::Value;

use crate::decode::DecodeOptions;
use crate::error::DecodeError;
use crate::form::FlatForm;
use crate::key::{self, FormPath, ParsedKey, Segment};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Created on first reference, or as list padding. Not yet an object or list.
    Unresolved,
    Object(IndexMap<String, Node>),
    Array(Vec<Node>),
    Scalar(String),
}

#[derive(Debug)]
pub struct TreeBuilder {
    root_name: String,
    root: Node,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Node {
    pub fn object() -> Self { Node::Object(IndexMap::new()) }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Unresolved => "nothing",
            Node::Object(_) => "an object",
            Node::Array(_) => "a list",
            Node::Scalar(_) => "a single value",
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Project a nested JSON document onto the tree shape. Scalars keep their
    /// textual form, `null` becomes [`Node::Unresolved`].
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Node::Unresolved,
            Value::Bool(b) => Node::Scalar(b.to_string()),
            Value::Number(n) => Node::Scalar(n.to_string()),
            Value::String(s) => Node::Scalar(s.clone()),
            Value::Array(xs) => Node::Array(xs.iter().map(Node::from_json).collect()),
            Value::Object(m) => Node::Object(m.iter().map(|(k, v)| (k.clone(), Node::from_json(v))).collect()),
        }
    }
}

impl TreeBuilder {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self { root_name: root_name.into(), root: Node::object() }
    }

    /// A key without brackets: a field directly on the root object.
    pub fn insert_flat(&mut self, name: &str, value: String) -> Result<(), DecodeError> {
        self.insert(&[Segment::Field(name.to_string())], value)
    }

    pub fn insert(&mut self, segments: &[Segment], value: String) -> Result<(), DecodeError> {
        let Some((last, parents)) = segments.split_last() else {
            return Err(conflict(&FormPath::root(self.root_name.as_str()), "a value cannot replace the root".into()));
        };

        let mut path = FormPath::root(self.root_name.as_str());
        let mut node = &mut self.root;
        for seg in parents {
            node = child_mut(node, seg, &path)?;
            path.push(seg.clone());
        }

        let slot = child_mut(node, last, &path)?;
        path.push(last.clone());
        store(slot, value, &path)
    }

    pub fn finish(self) -> Node { self.root }
}

/// Run the whole form through the tokenizer and builder. Stops at the first
/// fatal error; keys are visited in the form's canonical order.
pub fn build(form: &FlatForm, options: &DecodeOptions) -> Result<Node, DecodeError> {
    let mut builder = TreeBuilder::new(options.root.as_str());
    for (k, v) in form.iter() {
        match key::tokenize(k, options)? {
            ParsedKey::Flat(name) => builder.insert_flat(&name, v.to_string())?,
            ParsedKey::Structured(segments) => builder.insert(&segments, v.to_string())?,
        }
    }
    Ok(builder.finish())
}

// ------------------------------- Walking ---------------------------------- //

/// Step from `node` (located at `at`) into the child addressed by `seg`,
/// resolving an unresolved node on the way.
fn child_mut<'a>(node: &'a mut Node, seg: &Segment, at: &FormPath) -> Result<&'a mut Node, DecodeError> {
    if matches!(node, Node::Unresolved) {
        *node = match seg {
            Segment::Field(_) => Node::object(),
            Segment::Index(_) => Node::Array(Vec::new()),
        };
    }

    match (node, seg) {
        // an object's keys are all indices or all fields, so the first one decides
        (Node::Object(map), Segment::Field(name)) => {
            if let Some(k) = map.keys().next().filter(|k| key::is_index(k)) {
                return Err(conflict(at, format!("field `{name}` used on a node already addressed by index [{k}]")));
            }
            Ok(map.entry(name.clone()).or_insert(Node::Unresolved))
        }
        // deferred: settled by normalization once every key has been seen
        (Node::Object(map), Segment::Index(i)) => {
            if let Some(k) = map.keys().next().filter(|k| !key::is_index(k)) {
                return Err(conflict(at, format!("index [{i}] used on a node already holding field `{k}`")));
            }
            Ok(map.entry(i.to_string()).or_insert(Node::Unresolved))
        }
        (Node::Array(items), Segment::Index(i)) => {
            let i = *i;
            if items.len() <= i {
                items.resize_with(i + 1, || Node::Unresolved);
            }
            Ok(&mut items[i])
        }
        (Node::Array(_), Segment::Field(name)) => {
            Err(conflict(at, format!("field `{name}` used on a node already addressed as a list")))
        }
        (Node::Scalar(_), seg) => {
            Err(conflict(at, format!("holds a single value and cannot also contain [{seg}]")))
        }
        (Node::Unresolved, _) => unreachable!("resolved above"),
    }
}

fn store(slot: &mut Node, value: String, at: &FormPath) -> Result<(), DecodeError> {
    match slot {
        Node::Unresolved => {
            *slot = Node::Scalar(value);
            Ok(())
        }
        Node::Scalar(_) => Err(conflict(at, "submitted more than once".into())),
        other => Err(conflict(at, format!("already holds {} and cannot also be a single value", other.kind_name()))),
    }
}

fn conflict(at: &FormPath, reason: String) -> DecodeError {
    DecodeError::PathKindConflict { path: at.to_string(), reason }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FlatForm {
        pairs.iter().copied().collect()
    }

    fn obj(pairs: Vec<(&str, Node)>) -> Node {
        Node::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn s(v: &str) -> Node { Node::Scalar(v.into()) }

    #[test]
    fn nested_objects_are_created_on_demand() {
        let tree = build(
            &form(&[("root[address][street]", "Main St"), ("root[address][city]", "NYC"), ("root[name]", "Ada")]),
            &DecodeOptions::default(),
        ).unwrap();
        assert_eq!(tree, obj(vec![
            ("address", obj(vec![("city", s("NYC")), ("street", s("Main St"))])),
            ("name", s("Ada")),
        ]));
    }

    #[test]
    fn arrays_pad_missing_indices() {
        let mut b = TreeBuilder::new("root");
        b.insert(&[Segment::Field("hobbies".into()), Segment::Index(2)], "Jogging".into()).unwrap();
        assert_eq!(b.finish(), obj(vec![
            ("hobbies", Node::Array(vec![Node::Unresolved, Node::Unresolved, s("Jogging")])),
        ]));
    }

    #[test]
    fn list_of_objects() {
        let tree = build(
            &form(&[
                ("root[contacts][1][name]", "Bob"),
                ("root[contacts][0][name]", "Alice"),
                ("root[contacts][1][_type]", "FamilyMember"),
            ]),
            &DecodeOptions::default(),
        ).unwrap();
        assert_eq!(tree, obj(vec![(
            "contacts",
            Node::Array(vec![
                obj(vec![("name", s("Alice"))]),
                obj(vec![("_type", s("FamilyMember")), ("name", s("Bob"))]),
            ]),
        )]));
    }

    #[test]
    fn scalar_then_child_conflicts() {
        let mut b = TreeBuilder::new("root");
        b.insert(&[Segment::Field("address".into())], "foo".into()).unwrap();
        let err = b
            .insert(&[Segment::Field("address".into()), Segment::Field("street".into())], "Main".into())
            .unwrap_err();
        assert_eq!(err, DecodeError::PathKindConflict {
            path: "root[address]".into(),
            reason: "holds a single value and cannot also contain [street]".into(),
        });
    }

    #[test]
    fn child_then_scalar_conflicts() {
        let mut b = TreeBuilder::new("root");
        b.insert(&[Segment::Field("address".into()), Segment::Field("street".into())], "Main".into()).unwrap();
        let err = b.insert(&[Segment::Field("address".into())], "foo".into()).unwrap_err();
        assert!(matches!(err, DecodeError::PathKindConflict { ref path, .. } if path == "root[address]"));
    }

    #[test]
    fn field_on_list_conflicts() {
        let err = build(
            &form(&[("root[hobbies][0]", "Walking"), ("root[hobbies][name]", "x")]),
            &DecodeOptions::default(),
        ).unwrap_err();
        assert!(matches!(err, DecodeError::PathKindConflict { ref path, .. } if path == "root[hobbies]"));
    }

    #[test]
    fn index_on_object_conflicts() {
        let err = build(
            &form(&[("root[address][street]", "Main"), ("root[address][0]", "x")]),
            &DecodeOptions::default(),
        ).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::PathKindConflict);
    }

    #[test]
    fn root_indices_are_deferred() {
        let tree = build(&form(&[("root[1]", "b"), ("root[0]", "a")]), &DecodeOptions::default()).unwrap();
        assert_eq!(tree, obj(vec![("0", s("a")), ("1", s("b"))]));
    }

    #[test]
    fn flat_and_bracketed_spelling_of_same_field_conflict() {
        let err = build(&form(&[("name", "a"), ("root[name]", "b")]), &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, DecodeError::PathKindConflict { ref path, .. } if path == "root[name]"));
    }

    #[test]
    fn flat_name_after_root_index_conflicts() {
        let err = build(&form(&[("0", "a"), ("name", "b")]), &DecodeOptions::default()).unwrap_err();
        assert_eq!(err, DecodeError::PathKindConflict {
            path: "root".into(),
            reason: "field `name` used on a node already addressed by index [0]".into(),
        });
    }

    #[test]
    fn root_index_after_fields_conflicts() {
        let mut b = TreeBuilder::new("root");
        for i in 0..50 {
            b.insert_flat(&format!("field_{i}"), "x".into()).unwrap();
        }
        let err = b.insert(&[Segment::Index(0)], "a".into()).unwrap_err();
        assert!(matches!(err, DecodeError::PathKindConflict { ref reason, .. } if reason.contains("field_0")));
    }

    #[test]
    fn json_projection() {
        let node = Node::from_json(&serde_json::json!({ "a": [1, null, true] }));
        assert_eq!(node, obj(vec![("a", Node::Array(vec![s("1"), Node::Unresolved, s("true")]))]));
    }
}
