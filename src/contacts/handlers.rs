use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateContactRequest, MessageResponse, UpdateContactRequest},
    repo_types::Contact,
    services,
};
use crate::{auth::extractors::AuthUser, error::ApiError, state::AppState};

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/contacts/:id", put(update_contact).delete(delete_contact))
}

/// Unparseable ids can't match a record, so they are a 404 like any other miss.
fn contact_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Contact not found"))
}

#[instrument(skip(state))]
pub async fn list_contacts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = services::list_contacts(state.contacts.as_ref(), user_id).await?;
    Ok(Json(contacts))
}

#[instrument(skip(state, payload))]
pub async fn create_contact(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateContactRequest>, JsonRejection>,
) -> Result<Json<Contact>, ApiError> {
    let Json(payload) = payload?;
    let contact = services::create_contact(state.contacts.as_ref(), user_id, payload).await?;
    Ok(Json(contact))
}

#[instrument(skip(state, payload))]
pub async fn update_contact(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateContactRequest>, JsonRejection>,
) -> Result<Json<Contact>, ApiError> {
    let id = contact_id(&id)?;
    let Json(payload) = payload?;
    let contact = services::update_contact(state.contacts.as_ref(), user_id, id, payload).await?;
    Ok(Json(contact))
}

#[instrument(skip(state))]
pub async fn delete_contact(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = contact_id(&id)?;
    services::delete_contact(state.contacts.as_ref(), user_id, id).await?;
    Ok(Json(MessageResponse {
        msg: "Contact removed".into(),
    }))
}
