use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateContactRequest, UpdateContactRequest},
    repo::ContactStore,
    repo_types::{Contact, ContactChanges, NewContact, DEFAULT_CONTACT_TYPE},
};
use crate::error::{ApiError, FieldError};

const NOT_FOUND: &str = "Contact not found";

/// Empty strings count as "not supplied".
fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub fn validate_new_contact(req: &CreateContactRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let raw = req.name.as_deref();
    if raw.map_or(true, |name| name.trim().is_empty()) {
        errors.push(FieldError::body("name", "Name is required", raw));
    }
    errors
}

pub fn changes_from(req: UpdateContactRequest) -> ContactChanges {
    ContactChanges {
        name: supplied(req.name.map(|n| n.trim().to_string())),
        email: supplied(req.email),
        phone: supplied(req.phone),
        kind: supplied(req.kind),
    }
}

pub async fn list_contacts(store: &dyn ContactStore, user_id: Uuid) -> Result<Vec<Contact>, ApiError> {
    Ok(store.find_by_owner(user_id).await?)
}

pub async fn create_contact(
    store: &dyn ContactStore,
    user_id: Uuid,
    req: CreateContactRequest,
) -> Result<Contact, ApiError> {
    let errors = validate_new_contact(&req);
    if !errors.is_empty() {
        warn!(%user_id, "contact rejected by validation");
        return Err(ApiError::Validation(errors));
    }

    let contact = store
        .insert(NewContact {
            user: user_id,
            name: req.name.unwrap_or_default().trim().to_string(),
            email: supplied(req.email),
            phone: supplied(req.phone),
            kind: supplied(req.kind).unwrap_or_else(|| DEFAULT_CONTACT_TYPE.into()),
        })
        .await?;

    info!(%user_id, contact_id = %contact.id, "contact created");
    Ok(contact)
}

/// Loads the contact and checks it belongs to the caller. Nothing is written
/// until this returns `Ok`.
async fn owned_contact(store: &dyn ContactStore, user_id: Uuid, id: Uuid) -> Result<Contact, ApiError> {
    let contact = store
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    if contact.user != user_id {
        warn!(%user_id, contact_id = %id, owner = %contact.user, "contact owned by another user");
        return Err(ApiError::Unauthorized);
    }
    Ok(contact)
}

pub async fn update_contact(
    store: &dyn ContactStore,
    user_id: Uuid,
    id: Uuid,
    req: UpdateContactRequest,
) -> Result<Contact, ApiError> {
    let current = owned_contact(store, user_id, id).await?;

    let changes = changes_from(req);
    if changes.is_empty() {
        return Ok(current);
    }

    // A concurrent delete can win between the check and the write.
    let updated = store
        .update_by_id(id, changes)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    info!(%user_id, contact_id = %id, "contact updated");
    Ok(updated)
}

pub async fn delete_contact(store: &dyn ContactStore, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
    owned_contact(store, user_id, id).await?;

    if !store.delete_by_id(id).await? {
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    info!(%user_id, contact_id = %id, "contact removed");
    Ok(())
}
