//! The demo domain: a person with an address, hobbies and typed contacts.
//!
//! Exposed twice: as a runtime [`Schema`] the decoder validates against, and
//! as plain serde types the validated document deserializes into.
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::schema::{ObjectSchema, Schema, UnionSchema, Variant};
use crate::typed::Typed;

pub const DEFAULT_JOB: &str = "Developer";
pub const CONTACT_TAG: &str = "_type";

// ————————————————————————————————————————————————————————————————————————————
// SCHEMA
// ————————————————————————————————————————————————————————————————————————————

pub fn address_schema() -> ObjectSchema {
    ObjectSchema::new("Address")
        .describe("Example of an address model with simple fields.")
        .field("house_number", Schema::UInt)
        .field("street", Schema::String)
        .field("city", Schema::String)
}

/// `Contact` is a member of its own union next to its two refinements.
pub fn contact_schema() -> Result<UnionSchema, SchemaError> {
    let contact = ObjectSchema::new("Contact")
        .describe("Example of a contact model with simple fields.")
        .field("name", Schema::String);
    let friend = ObjectSchema::new("Friend")
        .describe("Example of a friend model with additional fields.")
        .field("name", Schema::String)
        .field("known_since", Schema::Timestamp);
    let family = ObjectSchema::new("FamilyMember")
        .describe("Example of a family member model with additional fields.")
        .field("name", Schema::String)
        .field("relationship", Schema::String);
    UnionSchema::new(CONTACT_TAG, vec![Variant::of(contact), Variant::of(friend), Variant::of(family)])
}

pub fn person_schema() -> Result<Schema, SchemaError> {
    Ok(ObjectSchema::new("Person")
        .describe("Example of a person model with simple fields.")
        .field("name", Schema::String)
        .field("age", Schema::UInt)
        .field_default("job", Schema::String, DEFAULT_JOB)
        .optional("address", address_schema().into())
        .field_default("hobbies", Schema::list(Schema::String), Typed::List(Vec::new()))
        .field_default("contacts", Schema::list(contact_schema()?.into()), Typed::List(Vec::new()))
        .into())
}

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub age: u64,
    #[serde(default = "default_job")]
    pub job: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub house_number: u64,
    pub street: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Contact {
    Contact { name: String },
    Friend { name: String, known_since: DateTime<FixedOffset> },
    FamilyMember { name: String, relationship: String },
}

fn default_job() -> String { DEFAULT_JOB.to_string() }

impl Contact {
    pub fn name(&self) -> &str {
        match self {
            Contact::Contact { name } | Contact::Friend { name, .. } | Contact::FamilyMember { name, .. } => name,
        }
    }

    /// The variant identity, as emitted in the tag field.
    pub fn kind(&self) -> &'static str {
        match self {
            Contact::Contact { .. } => "Contact",
            Contact::Friend { .. } => "Friend",
            Contact::FamilyMember { .. } => "FamilyMember",
        }
    }
}
