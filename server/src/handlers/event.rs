use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::models::{EntityId, EventDraft, EventPatch, Permission};
use crate::registry::AppRegistry;
use crate::services::EventTemplateForm;
use crate::session::Session;
use crate::utils::error::AppResult;
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Default, Deserialize)]
pub struct EventListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    pub attendee_ids: Vec<EntityId>,
}

pub async fn show_session(session: Session) -> Response {
    success(session, "Session resolved")
}

pub async fn show_dashboard(
    session: Session,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::EventsRead)?;
    let stats = registry.event_service().dashboard().await?;
    Ok(success(stats, "Dashboard loaded"))
}

pub async fn list_events(
    session: Session,
    Query(query): Query<EventListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::EventsRead)?;
    let events = registry
        .event_service()
        .search(query.search.as_deref())
        .await?;
    Ok(success(events, "Events retrieved"))
}

pub async fn create_event(
    session: Session,
    State(registry): State<AppRegistry>,
    Json(draft): Json<EventDraft>,
) -> AppResult<Response> {
    session.require(Permission::EventsWrite)?;
    let event = registry.event_service().create(draft).await?;
    Ok(created(event, "Event created"))
}

pub async fn show_event(
    session: Session,
    Path(event_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::EventsRead)?;
    let event = registry.event_service().get_by_id(event_id).await?;
    Ok(success(event, "Event retrieved"))
}

pub async fn update_event(
    session: Session,
    Path(event_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
    Json(patch): Json<EventPatch>,
) -> AppResult<Response> {
    session.require(Permission::EventsWrite)?;
    let event = registry.event_service().update(event_id, patch).await?;
    Ok(success(event, "Event updated"))
}

pub async fn delete_event(
    session: Session,
    Path(event_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::EventsWrite)?;
    registry.event_service().delete(event_id).await?;
    Ok(empty_success("Event deleted"))
}

pub async fn show_event_stats(
    session: Session,
    Path(event_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::EventsRead)?;
    let stats = registry.event_service().stats(event_id).await?;
    Ok(success(stats, "Event statistics retrieved"))
}

pub async fn show_registration_form(
    session: Session,
    Path(event_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::AttendeesWrite)?;
    let form = registry.event_service().registration_form(event_id).await?;
    Ok(success(form, "Registration form rendered"))
}

pub async fn save_event_template(
    session: Session,
    Path(event_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
    Json(form): Json<EventTemplateForm>,
) -> AppResult<Response> {
    session.require(Permission::TemplatesWrite)?;
    let template = registry
        .template_service()
        .save_for_event(event_id, form)
        .await?;
    Ok(success(template, "Template saved"))
}

pub async fn print_credentials(
    session: Session,
    Path(event_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
    Json(request): Json<PrintRequest>,
) -> AppResult<Response> {
    session.require(Permission::AttendeesWrite)?;
    let printed = registry
        .attendee_service()
        .mark_printed(event_id, &request.attendee_ids)
        .await?;
    let message = format!("{} credential(s) marked as printed", printed.len());
    Ok(success(printed, message))
}
