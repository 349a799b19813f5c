//! Skill profile domain service.
//!
//! Owns the one-profile-per-owner rule: saves look up the caller's existing
//! document first and update it in place, creating a new document only when
//! none exists. The lookup and the write are not atomic; two concurrent first
//! saves for the same owner may both create.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::port_errors::map_document_store_error;
use crate::domain::ports::{
    Document, DocumentFilter, DocumentStore, NewDocument, NewDocumentId, Permission,
};
use crate::domain::profile_document::{
    OWNER_ATTRIBUTE, draft_fields, new_profile_fields, profile_from_document,
};
use crate::domain::{Account, DocumentId, Error, Profile, ProfileDraft, UserId};

/// Profile service backed by a [`DocumentStore`].
pub struct ProfileService<D: ?Sized> {
    store: Arc<D>,
}

impl<D: ?Sized> Clone for ProfileService<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<D: ?Sized> ProfileService<D> {
    /// Create a service over the given store.
    pub fn new(store: Arc<D>) -> Self {
        Self { store }
    }
}

impl<D> ProfileService<D>
where
    D: DocumentStore + ?Sized,
{
    /// Create or update the authenticated owner's profile.
    ///
    /// Fails with [`crate::domain::ErrorCode::InvalidRequest`] before any
    /// store call when `owner` is `None`. When the existence check fails no
    /// write is attempted. On update only the bio and skill fields change;
    /// the owner id and display name keep their creation-time values.
    pub async fn upsert_profile(
        &self,
        owner: Option<&Account>,
        draft: ProfileDraft,
    ) -> Result<Profile, Error> {
        let Some(owner) = owner else {
            return Err(Error::invalid_request(
                "a signed-in account is required to save a profile",
            ));
        };

        let document = match self.find_owned(owner.id()).await? {
            Some(existing) => {
                debug!(owner_id = %owner.id(), document_id = %existing.id, "updating profile");
                self.store
                    .update(&existing.id, draft_fields(&draft))
                    .await
                    .map_err(|err| map_document_store_error(err, "update profile"))?
            }
            None => {
                debug!(owner_id = %owner.id(), "creating profile");
                self.store
                    .create(NewDocument {
                        id: NewDocumentId::Unique,
                        fields: new_profile_fields(owner, &draft),
                        permissions: Permission::public_read_owner_write(owner.id()),
                    })
                    .await
                    .map_err(|err| map_document_store_error(err, "create profile"))?
            }
        };

        let profile = profile_from_document(document)?;
        info!(
            owner_id = %profile.owner_id(),
            document_id = %profile.document_id(),
            "profile saved"
        );
        Ok(profile)
    }

    /// Profile owned by `owner_id`, if one exists.
    pub async fn profile_for_owner(&self, owner_id: &UserId) -> Result<Option<Profile>, Error> {
        self.find_owned(owner_id)
            .await?
            .map(profile_from_document)
            .transpose()
    }

    /// Profile stored under `id`.
    pub async fn profile(&self, id: &DocumentId) -> Result<Profile, Error> {
        let document = self
            .store
            .get(id)
            .await
            .map_err(|err| map_document_store_error(err, "get profile"))?
            .ok_or_else(|| Error::not_found(format!("profile {id} not found")))?;
        profile_from_document(document)
    }

    /// List every profile, optionally narrowed to those whose offered or
    /// wanted skills mention `search` (case-insensitive substring).
    ///
    /// A blank search term lists everything. Documents that cannot be
    /// decoded are skipped and logged.
    pub async fn explore(&self, search: Option<&str>) -> Result<Vec<Profile>, Error> {
        let documents = self
            .store
            .find(&DocumentFilter::all())
            .await
            .map_err(|err| map_document_store_error(err, "list profiles"))?;
        let term = search.map(str::trim).filter(|term| !term.is_empty());

        let profiles = documents
            .into_iter()
            .filter_map(|document| {
                let id = document.id.clone();
                profile_from_document(document)
                    .inspect_err(|err| warn!(document_id = %id, error = %err, "skipping profile"))
                    .ok()
            })
            .filter(|profile| term.is_none_or(|term| profile.matches_skill(term)))
            .collect();
        Ok(profiles)
    }

    /// Delete the profile stored under `id`.
    ///
    /// Access control is the store's: only the owner's session may delete.
    pub async fn delete_profile(&self, id: &DocumentId) -> Result<(), Error> {
        self.store
            .delete(id)
            .await
            .map_err(|err| map_document_store_error(err, "delete profile"))?;
        info!(document_id = %id, "profile deleted");
        Ok(())
    }

    async fn find_owned(&self, owner_id: &UserId) -> Result<Option<Document>, Error> {
        let documents = self
            .store
            .find(&DocumentFilter::all().equal(OWNER_ATTRIBUTE, owner_id.as_ref()))
            .await
            .map_err(|err| map_document_store_error(err, "find profile"))?;
        if documents.len() > 1 {
            warn!(
                owner_id = %owner_id,
                count = documents.len(),
                "owner has more than one profile; using the first"
            );
        }
        Ok(documents.into_iter().next())
    }
}

#[cfg(test)]
#[path = "profile_service_tests.rs"]
mod tests;
