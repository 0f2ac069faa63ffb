//! End-to-end behavior of the decoder against the built-in Person schema.
use chrono::DateTime;
use nested_form::key::{tokenize, FormPath, ParsedKey};
use nested_form::model::{person_schema, Person, DEFAULT_JOB};
use nested_form::normalize::normalize;
use nested_form::tree::{Node, TreeBuilder};
use nested_form::validate::validate;
use nested_form::{decode, flatten, DecodeOptions, Decoder, ErrorKind, FlatForm, ObjectSchema, Schema, Typed, VariantValue};
use serde_json::json;
use test_case::test_case;

fn schema() -> Schema {
    person_schema().unwrap()
}

fn form<const N: usize>(pairs: [(&str, &str); N]) -> FlatForm {
    pairs.into_iter().collect()
}

fn full_form() -> FlatForm {
    form([
        ("root[name]", "John Doe"),
        ("root[age]", "30"),
        ("root[job]", "Pilot"),
        ("root[address][house_number]", "123"),
        ("root[address][street]", "Main St"),
        ("root[address][city]", "New York"),
        ("root[hobbies][0]", "Walking"),
        ("root[hobbies][1]", "Reading"),
        ("root[contacts][0][_type]", "Friend"),
        ("root[contacts][0][name]", "Alice"),
        ("root[contacts][0][known_since]", "2023-05-01T10:00:00Z"),
        ("root[contacts][1][_type]", "FamilyMember"),
        ("root[contacts][1][name]", "Bob"),
        ("root[contacts][1][relationship]", "Father"),
    ])
}

#[test]
fn flatten_then_decode_gives_the_value_back() {
    let value = decode(&full_form(), &schema()).unwrap();
    let again = decode(&flatten(&value, "root"), &schema()).unwrap();
    assert_eq!(again, value);
    assert_eq!(flatten(&again, "root"), full_form());
}

// ------------------------------ Round trips ------------------------------- //

fn obj(fields: Vec<(&str, Typed)>) -> Typed {
    Typed::Object(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

fn variant(tag: &str, fields: Vec<(&str, Typed)>) -> Typed {
    let mut v = VariantValue::new("_type", tag);
    for (k, x) in fields {
        v.insert(k, x).unwrap();
    }
    v.into()
}

fn timestamp(text: &str) -> Typed {
    Typed::Timestamp(DateTime::parse_from_rfc3339(text).unwrap())
}

fn person(contacts: Vec<Typed>, address: Typed) -> Typed {
    obj(vec![
        ("name", "Jane".into()),
        ("age", 25u64.into()),
        ("job", DEFAULT_JOB.into()),
        ("address", address),
        ("hobbies", Typed::List(vec![])),
        ("contacts", Typed::List(contacts)),
    ])
}

fn minimal_person() -> (Schema, Typed) {
    (schema(), person(vec![], Typed::Null))
}

fn every_contact_kind() -> (Schema, Typed) {
    let contacts = vec![
        variant("Contact", vec![("name", "Carol".into())]),
        variant("Friend", vec![("name", "Alice".into()), ("known_since", timestamp("2023-05-01T10:00:00+02:00"))]),
        variant("FamilyMember", vec![("name", "Bob".into()), ("relationship", "Father".into())]),
    ];
    let address = obj(vec![
        ("house_number", 0u64.into()),
        ("street", "".into()),
        ("city", "Oslo".into()),
    ]);
    (schema(), person(contacts, address))
}

fn required_empty_list() -> (Schema, Typed) {
    let schema = ObjectSchema::new("Post")
        .field("name", Schema::String)
        .field("tags", Schema::list(Schema::String))
        .into();
    (schema, obj(vec![("name", "a".into()), ("tags", Typed::List(vec![]))]))
}

fn required_object_of_nulls() -> (Schema, Typed) {
    let meta = ObjectSchema::new("Meta").optional("note", Schema::String).optional("seen", Schema::Timestamp);
    let schema = ObjectSchema::new("Post").field("name", Schema::String).field("meta", meta.into()).into();
    let value = obj(vec![("name", "a".into()), ("meta", obj(vec![("note", Typed::Null), ("seen", Typed::Null)]))]);
    (schema, value)
}

#[test_case(minimal_person() ; "null address and empty defaulted lists")]
#[test_case(every_contact_kind() ; "base variant and non utc offset")]
#[test_case(required_empty_list() ; "required empty list")]
#[test_case(required_object_of_nulls() ; "required object of nulls")]
fn values_survive_flatten_and_decode(case: (Schema, Typed)) {
    let (schema, value) = case;
    let flat = flatten(&value, "root");
    let back = decode(&flat, &schema).unwrap();
    assert_eq!(back, value);
    // same text, so offsets survive too
    assert_eq!(flatten(&back, "root"), flat);
}

#[test]
fn non_utc_offset_is_kept() {
    let (schema, value) = every_contact_kind();
    let flat = flatten(&value, "root");
    assert_eq!(flat.get("root[contacts][1][known_since]"), Some("2023-05-01T10:00:00+02:00"));
    let back = decode(&flat, &schema).unwrap();
    let friend = back.get("contacts").and_then(Typed::as_list).unwrap()[1].clone();
    let Some(Typed::Timestamp(t)) = friend.get("known_since") else { panic!("expected a timestamp") };
    assert_eq!(t.offset().local_minus_utc(), 2 * 3600);
}

#[test]
fn trailing_keyless_list_elements_are_lost() {
    let schema: Schema = ObjectSchema::new("P").field("notes", Schema::list(Schema::optional(Schema::String))).into();
    let value = obj(vec![("notes", Typed::List(vec!["a".into(), Typed::Null]))]);
    let back = decode(&flatten(&value, "root"), &schema).unwrap();
    assert_eq!(back.to_json(), json!({ "notes": ["a"] }));
}

// ---------------------------- Order independence -------------------------- //

fn scattered_pairs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("root[contacts][1][name]", "Bob"),
        ("root[contacts][0][_type]", "Friend"),
        ("root[hobbies][2]", "Jogging"),
        ("name", "Jane"),
        ("root[contacts][1][_type]", "FamilyMember"),
        ("root[address][city]", "Oslo"),
        ("root[age]", "25"),
        ("root[contacts][0][name]", "Alice"),
        ("root[hobbies][0]", "Walking"),
        ("root[contacts][0][known_since]", "2023-05-01T10:00"),
        ("root[address][house_number]", "7"),
        ("root[contacts][1][relationship]", "Father"),
        ("root[address][street]", "Main St"),
    ]
}

/// Feed the pairs to the builder in exactly the given order.
fn tree_in_order(pairs: &[(&str, &str)]) -> Node {
    let options = DecodeOptions::default();
    let mut builder = TreeBuilder::new(options.root.as_str());
    for (k, v) in pairs {
        match tokenize(k, &options).unwrap() {
            ParsedKey::Flat(name) => builder.insert_flat(&name, v.to_string()).unwrap(),
            ParsedKey::Structured(segments) => builder.insert(&segments, v.to_string()).unwrap(),
        }
    }
    normalize(builder.finish())
}

#[test]
fn insertion_order_does_not_change_tree_or_value() {
    let pairs = scattered_pairs();
    let expected_tree = tree_in_order(&pairs);
    let expected = validate(&expected_tree, &schema(), &FormPath::root("root")).unwrap();
    assert_eq!(expected.to_json()["hobbies"], json!(["Walking", "", "Jogging"]));

    for reverse in [false, true] {
        for shift in 0..pairs.len() {
            let mut order = pairs.clone();
            if reverse {
                order.reverse();
            }
            order.rotate_left(shift);
            let tree = tree_in_order(&order);
            assert_eq!(tree, expected_tree, "order: {order:?}");
            assert_eq!(validate(&tree, &schema(), &FormPath::root("root")).unwrap(), expected);
        }
    }
}

#[test]
fn conflicts_are_found_in_either_order() {
    let pairs = [("root[hobbies][0]", "Walking"), ("root[hobbies][kind]", "x")];
    for order in [pairs, [pairs[1], pairs[0]]] {
        let options = DecodeOptions::default();
        let mut builder = TreeBuilder::new("root");
        let results: Vec<_> = order
            .iter()
            .map(|(k, v)| match tokenize(k, &options).unwrap() {
                ParsedKey::Structured(segments) => builder.insert(&segments, v.to_string()),
                ParsedKey::Flat(name) => builder.insert_flat(&name, v.to_string()),
            })
            .collect();
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().kind(), ErrorKind::PathKindConflict);
    }
}

#[test]
fn indexed_keys_become_lists_in_index_order() {
    let f = form([
        ("root[name]", "Jane"),
        ("root[age]", "25"),
        ("root[hobbies][1]", "Reading"),
        ("root[hobbies][0]", "Walking"),
        ("root[hobbies][2]", "Jogging"),
    ]);
    let value = decode(&f, &schema()).unwrap();
    assert_eq!(value.to_json()["hobbies"], json!(["Walking", "Reading", "Jogging"]));
}

#[test]
fn gaps_in_a_list_are_filled_with_empty_values() {
    let f = form([("root[name]", "Jane"), ("root[age]", "25"), ("root[hobbies][2]", "Jogging")]);
    let value = decode(&f, &schema()).unwrap();
    assert_eq!(value.to_json()["hobbies"], json!(["", "", "Jogging"]));
}

#[test]
fn every_missing_field_is_reported_at_once() {
    let report = decode(&FlatForm::new(), &schema()).unwrap_err();
    let paths: Vec<_> = report.iter().map(|e| (e.path.as_str(), e.kind)).collect();
    assert_eq!(paths, vec![
        ("root[name]", ErrorKind::MissingField),
        ("root[age]", ErrorKind::MissingField),
    ]);
}

#[test]
fn scalar_errors_and_missing_fields_accumulate() {
    let f = form([("root[age]", "-3"), ("root[address][house_number]", "abc")]);
    let report = decode(&f, &schema()).unwrap_err();
    assert_eq!(report.at("root[name]").next().map(|e| e.kind), Some(ErrorKind::MissingField));
    assert_eq!(report.at("root[age]").next().map(|e| e.kind), Some(ErrorKind::TypeMismatch));
    assert_eq!(report.at("root[address][house_number]").next().map(|e| e.kind), Some(ErrorKind::TypeMismatch));
}

#[test]
fn union_elements_dispatch_on_the_tag() {
    let value = decode(&full_form(), &schema()).unwrap();
    let contacts = value.get("contacts").and_then(Typed::as_list).unwrap();
    let tags: Vec<_> = contacts.iter().filter_map(Typed::as_variant).map(|v| v.tag()).collect();
    assert_eq!(tags, vec!["Friend", "FamilyMember"]);
    assert_eq!(value.to_json()["contacts"][1], json!({
        "_type": "FamilyMember",
        "name": "Bob",
        "relationship": "Father",
    }));
}

#[test]
fn unknown_tag_is_reported_at_the_element() {
    let f = form([
        ("root[name]", "Jane"),
        ("root[age]", "25"),
        ("root[contacts][0][_type]", "Enemy"),
        ("root[contacts][0][name]", "Mallory"),
    ]);
    let report = decode(&f, &schema()).unwrap_err();
    assert_eq!(report.len(), 1);
    assert_eq!(report.errors()[0].path, "root[contacts][0]");
    assert_eq!(report.errors()[0].kind, ErrorKind::UnknownVariant);
}

#[test]
fn missing_tag_is_reported_at_the_element() {
    let f = form([("root[name]", "Jane"), ("root[age]", "25"), ("root[contacts][0][name]", "Mallory")]);
    let report = decode(&f, &schema()).unwrap_err();
    assert_eq!(report.errors()[0].path, "root[contacts][0]");
    assert_eq!(report.errors()[0].kind, ErrorKind::MissingDiscriminator);
}

#[test]
fn scalar_and_container_at_one_path_conflict() {
    let f = form([("root[address]", "foo"), ("root[address][street]", "Main St")]);
    let report = decode(&f, &schema()).unwrap_err();
    assert_eq!(report.len(), 1);
    assert_eq!(report.errors()[0].kind, ErrorKind::PathKindConflict);
}

#[test]
fn malformed_key_is_rejected() {
    let f = form([("root[name", "Jane")]);
    let report = decode(&f, &schema()).unwrap_err();
    assert_eq!(report.errors()[0].kind, ErrorKind::MalformedKey);
}

#[test]
fn defaults_are_stable_across_a_second_pass() {
    let f = form([("root[name]", "Jane"), ("root[age]", "25")]);
    let once = decode(&f, &schema()).unwrap();
    assert_eq!(once.get("job"), Some(&Typed::from(DEFAULT_JOB)));
    let twice = decode(&flatten(&once, "root"), &schema()).unwrap();
    assert_eq!(twice, once);
}

#[test]
fn decoder_fills_serde_types() {
    let person: Person = Decoder::new(schema()).decode_into(&full_form()).unwrap();
    assert_eq!(person.job, "Pilot");
    assert_eq!(person.contacts[0].name(), "Alice");
}

#[test]
fn exported_schema_describes_the_form() {
    let doc = Decoder::new(schema()).json_schema();
    assert_eq!(doc["title"], "Person");
    assert_eq!(doc["properties"]["age"]["minimum"], 0);
    assert_eq!(doc["properties"]["contacts"]["items"]["discriminator"]["propertyName"], "_type");
}
