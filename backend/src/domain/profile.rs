//! Skill profile data model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::user::{DisplayName, UserId};

/// Validation errors raised by profile value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValidationError {
    EmptyDocumentId,
}

impl fmt::Display for ProfileValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDocumentId => write!(f, "document id must not be empty"),
        }
    }
}

impl std::error::Error for ProfileValidationError {}

/// Identifier assigned by the document store when a profile is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Validate and construct a [`DocumentId`].
    pub fn new(id: impl Into<String>) -> Result<Self, ProfileValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ProfileValidationError::EmptyDocumentId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}

impl TryFrom<String> for DocumentId {
    type Error = ProfileValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Comma-delimited list of free-text skill labels.
///
/// The raw text is stored verbatim; no uniqueness or normalisation is
/// enforced. Consumers read individual labels through [`SkillList::labels`].
///
/// # Examples
/// ```
/// use skill_exchange::domain::SkillList;
///
/// let skills = SkillList::from("React, Node.js");
/// assert_eq!(skills.labels().collect::<Vec<_>>(), ["React", "Node.js"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillList(String);

impl SkillList {
    /// Raw comma-delimited text as submitted.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Labels split on `,` with surrounding whitespace trimmed.
    ///
    /// Empty segments (for example from a trailing comma) are skipped.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }

    /// Case-insensitive substring match against the raw text.
    pub fn mentions(&self, needle: &str) -> bool {
        self.0.to_lowercase().contains(&needle.to_lowercase())
    }
}

impl From<&str> for SkillList {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for SkillList {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SkillList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable profile fields submitted by the owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    /// Free-text biography; empty when omitted.
    pub bio: String,
    /// Skills the owner can teach.
    pub skills_offered: SkillList,
    /// Skills the owner wants to learn.
    pub skills_wanted: SkillList,
}

impl ProfileDraft {
    /// Build a draft from raw form values.
    pub fn new(
        bio: impl Into<String>,
        skills_offered: impl Into<SkillList>,
        skills_wanted: impl Into<SkillList>,
    ) -> Self {
        Self {
            bio: bio.into(),
            skills_offered: skills_offered.into(),
            skills_wanted: skills_wanted.into(),
        }
    }
}

/// Persisted skill profile.
///
/// ## Invariants
/// - At most one profile exists per `owner_id` (enforced by
///   [`crate::domain::ProfileService`], not by storage).
/// - `owner_id` and `display_name` are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    document_id: DocumentId,
    owner_id: UserId,
    display_name: DisplayName,
    bio: String,
    skills_offered: SkillList,
    skills_wanted: SkillList,
}

impl Profile {
    /// Assemble a profile from stored values.
    pub fn new(
        document_id: DocumentId,
        owner_id: UserId,
        display_name: DisplayName,
        draft: ProfileDraft,
    ) -> Self {
        let ProfileDraft {
            bio,
            skills_offered,
            skills_wanted,
        } = draft;
        Self {
            document_id,
            owner_id,
            display_name,
            bio,
            skills_offered,
            skills_wanted,
        }
    }

    /// Store-assigned document identifier.
    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// Owning account.
    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    /// Owner's name as copied at creation time.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Biography text.
    pub fn bio(&self) -> &str {
        self.bio.as_str()
    }

    /// Skills offered.
    pub fn skills_offered(&self) -> &SkillList {
        &self.skills_offered
    }

    /// Skills wanted.
    pub fn skills_wanted(&self) -> &SkillList {
        &self.skills_wanted
    }

    /// Whether either skill list mentions `term`, ignoring case.
    pub fn matches_skill(&self, term: &str) -> bool {
        self.skills_offered.mentions(term) || self.skills_wanted.mentions(term)
    }
}
