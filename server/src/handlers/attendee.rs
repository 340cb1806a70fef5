use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::models::{AttendeeForm, AttendeePatch, EntityId, Permission};
use crate::registry::AppRegistry;
use crate::services::{AttendeeSort, SortDirection};
use crate::session::Session;
use crate::utils::error::AppResult;
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Default, Deserialize)]
pub struct AttendeeListQuery {
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
}

impl AttendeeListQuery {
    fn into_sort(self) -> Option<AttendeeSort> {
        let field = self.sort.filter(|field| !field.trim().is_empty())?;
        Some(AttendeeSort {
            field,
            direction: self.direction.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialQuery {
    #[serde(default)]
    pub preview: bool,
}

pub async fn list_attendees(
    session: Session,
    Path(event_id): Path<EntityId>,
    Query(query): Query<AttendeeListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::AttendeesRead)?;
    let attendees = registry
        .attendee_service()
        .list_for_event(event_id, query.into_sort())
        .await?;
    Ok(success(attendees, "Attendees retrieved"))
}

pub async fn register_attendee(
    session: Session,
    Path(event_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
    Json(form): Json<AttendeeForm>,
) -> AppResult<Response> {
    session.require(Permission::AttendeesWrite)?;
    let attendee = registry.attendee_service().register(event_id, form).await?;
    Ok(created(attendee, "Attendee registered"))
}

pub async fn show_attendee(
    session: Session,
    Path((event_id, attendee_id)): Path<(EntityId, EntityId)>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::AttendeesRead)?;
    let attendee = registry
        .attendee_service()
        .get_for_event(event_id, attendee_id)
        .await?;
    Ok(success(attendee, "Attendee retrieved"))
}

pub async fn update_attendee(
    session: Session,
    Path((event_id, attendee_id)): Path<(EntityId, EntityId)>,
    State(registry): State<AppRegistry>,
    Json(patch): Json<AttendeePatch>,
) -> AppResult<Response> {
    session.require(Permission::AttendeesWrite)?;
    let attendee = registry
        .attendee_service()
        .update(event_id, attendee_id, patch)
        .await?;
    Ok(success(attendee, "Attendee updated"))
}

pub async fn delete_attendee(
    session: Session,
    Path((event_id, attendee_id)): Path<(EntityId, EntityId)>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::AttendeesWrite)?;
    registry
        .attendee_service()
        .delete(event_id, attendee_id)
        .await?;
    Ok(empty_success("Attendee deleted"))
}

pub async fn show_edit_form(
    session: Session,
    Path((event_id, attendee_id)): Path<(EntityId, EntityId)>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::AttendeesWrite)?;
    let form = registry
        .attendee_service()
        .edit_form(event_id, attendee_id)
        .await?;
    Ok(success(form, "Attendee form rendered"))
}

/// The credential as a PNG. A superseded preview answers `204 No Content`.
pub async fn render_credential(
    session: Session,
    Path((event_id, attendee_id)): Path<(EntityId, EntityId)>,
    Query(query): Query<CredentialQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::AttendeesRead)?;
    let credentials = registry.credential_service();

    let credential = if query.preview {
        match credentials
            .preview(session.user_id(), event_id, attendee_id)
            .await?
        {
            Some(credential) => credential,
            None => return Ok(StatusCode::NO_CONTENT.into_response()),
        }
    } else {
        credentials.render(event_id, attendee_id).await?
    };

    let png = credential.to_png()?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}
