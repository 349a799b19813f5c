//! Mapping between [`Profile`] values and stored documents.
//!
//! Attribute names are part of the shared collection schema and must not
//! change without migrating existing documents.

use serde_json::{Value, json};

use crate::domain::ports::{Document, DocumentFields};
use crate::domain::{
    Account, DisplayName, DocumentId, Error, Profile, ProfileDraft, SkillList, UserId,
};

/// Attribute holding the owning account id.
pub const OWNER_ATTRIBUTE: &str = "userId";
/// Attribute holding the owner's display name, copied at creation.
pub const DISPLAY_NAME_ATTRIBUTE: &str = "userName";
/// Attribute holding the biography.
pub const BIO_ATTRIBUTE: &str = "bio";
/// Attribute holding the skills offered.
pub const SKILLS_OFFERED_ATTRIBUTE: &str = "skills";
/// Attribute holding the skills wanted.
pub const SKILLS_WANTED_ATTRIBUTE: &str = "skillsNeeded";

/// Fields written on update.
///
/// Owner id and display name are deliberately absent so they keep their
/// creation-time values.
pub(crate) fn draft_fields(draft: &ProfileDraft) -> DocumentFields {
    let mut fields = DocumentFields::new();
    fields.insert(BIO_ATTRIBUTE.to_owned(), json!(draft.bio));
    fields.insert(
        SKILLS_OFFERED_ATTRIBUTE.to_owned(),
        json!(draft.skills_offered.as_str()),
    );
    fields.insert(
        SKILLS_WANTED_ATTRIBUTE.to_owned(),
        json!(draft.skills_wanted.as_str()),
    );
    fields
}

/// Fields written on creation.
pub(crate) fn new_profile_fields(owner: &Account, draft: &ProfileDraft) -> DocumentFields {
    let mut fields = draft_fields(draft);
    fields.insert(OWNER_ATTRIBUTE.to_owned(), json!(owner.id().as_ref()));
    fields.insert(
        DISPLAY_NAME_ATTRIBUTE.to_owned(),
        json!(owner.display_name().as_ref()),
    );
    fields
}

/// Decode a stored document into a [`Profile`].
///
/// Missing text attributes decode as empty strings; a missing or invalid
/// owner id or display name is an internal error.
pub(crate) fn profile_from_document(document: Document) -> Result<Profile, Error> {
    let Document { id, fields, .. } = document;
    let owner_id = UserId::new(required_text(&fields, &id, OWNER_ATTRIBUTE)?)
        .map_err(|err| corrupt(&id, OWNER_ATTRIBUTE, err))?;
    let display_name = DisplayName::new(required_text(&fields, &id, DISPLAY_NAME_ATTRIBUTE)?)
        .map_err(|err| corrupt(&id, DISPLAY_NAME_ATTRIBUTE, err))?;
    let draft = ProfileDraft {
        bio: optional_text(&fields, BIO_ATTRIBUTE),
        skills_offered: SkillList::from(optional_text(&fields, SKILLS_OFFERED_ATTRIBUTE)),
        skills_wanted: SkillList::from(optional_text(&fields, SKILLS_WANTED_ATTRIBUTE)),
    };
    Ok(Profile::new(id, owner_id, display_name, draft))
}

fn required_text<'a>(
    fields: &'a DocumentFields,
    id: &DocumentId,
    attribute: &str,
) -> Result<&'a str, Error> {
    fields.get(attribute).and_then(Value::as_str).ok_or_else(|| {
        Error::internal(format!(
            "profile document {id} has no text attribute `{attribute}`"
        ))
    })
}

fn optional_text(fields: &DocumentFields, attribute: &str) -> String {
    fields
        .get(attribute)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn corrupt(id: &DocumentId, attribute: &str, err: impl std::fmt::Display) -> Error {
    Error::internal(format!(
        "profile document {id} has invalid `{attribute}`: {err}"
    ))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{EmailAddress, ErrorCode};
    use chrono::Utc;
    use rstest::{fixture, rstest};

    #[fixture]
    fn owner() -> Account {
        Account::new(
            UserId::new("owner01").expect("id"),
            EmailAddress::new("ada@example.com").expect("email"),
            DisplayName::new("Ada").expect("name"),
            Utc::now(),
        )
    }

    fn document(fields: Value) -> Document {
        let Value::Object(fields) = fields else {
            panic!("fields must be an object");
        };
        Document {
            id: DocumentId::new("doc1").expect("doc id"),
            fields,
            permissions: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[rstest]
    fn update_fields_leave_identity_untouched() {
        let fields = draft_fields(&ProfileDraft::new("hi", "Rust", "Go"));
        assert_eq!(
            Value::Object(fields),
            json!({ "bio": "hi", "skills": "Rust", "skillsNeeded": "Go" })
        );
    }

    #[rstest]
    fn creation_fields_copy_owner_identity(owner: Account) {
        let fields = new_profile_fields(&owner, &ProfileDraft::new("", "Guitar", ""));
        assert_eq!(fields["userId"], "owner01");
        assert_eq!(fields["userName"], "Ada");
        assert_eq!(fields["skills"], "Guitar");
        assert_eq!(fields["skillsNeeded"], "");
    }

    #[rstest]
    fn decodes_documents_with_missing_optional_text() {
        let profile = profile_from_document(document(json!({
            "userId": "owner01",
            "userName": "Ada",
            "skills": "React, Node.js",
        })))
        .expect("decodes");
        assert_eq!(profile.owner_id().as_ref(), "owner01");
        assert_eq!(profile.bio(), "");
        assert_eq!(profile.skills_wanted().as_str(), "");
        assert_eq!(
            profile.skills_offered().labels().collect::<Vec<_>>(),
            ["React", "Node.js"]
        );
    }

    #[rstest]
    #[case(json!({ "userName": "Ada" }), "userId")]
    #[case(json!({ "userId": "owner01" }), "userName")]
    #[case(json!({ "userId": "", "userName": "Ada" }), "userId")]
    #[case(json!({ "userId": 7, "userName": "Ada" }), "userId")]
    fn rejects_documents_without_identity(#[case] fields: Value, #[case] attribute: &str) {
        let err = profile_from_document(document(fields)).expect_err("invalid document");
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert!(err.message().contains(attribute), "{}", err.message());
    }
}
