use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;

use crate::models::{EntityId, Permission, TemplateDraft, TemplatePatch};
use crate::registry::AppRegistry;
use crate::session::Session;
use crate::utils::error::AppResult;
use crate::utils::response::{created, empty_success, success};

pub async fn list_templates(
    session: Session,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::TemplatesRead)?;
    let templates = registry.template_service().get_all().await?;
    Ok(success(templates, "Templates retrieved"))
}

pub async fn create_template(
    session: Session,
    State(registry): State<AppRegistry>,
    Json(draft): Json<TemplateDraft>,
) -> AppResult<Response> {
    session.require(Permission::TemplatesWrite)?;
    let template = registry.template_service().create(draft).await?;
    Ok(created(template, "Template created"))
}

pub async fn show_template(
    session: Session,
    Path(template_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::TemplatesRead)?;
    let template = registry.template_service().get_by_id(template_id).await?;
    Ok(success(template, "Template retrieved"))
}

pub async fn update_template(
    session: Session,
    Path(template_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
    Json(patch): Json<TemplatePatch>,
) -> AppResult<Response> {
    session.require(Permission::TemplatesWrite)?;
    let template = registry
        .template_service()
        .update(template_id, patch)
        .await?;
    Ok(success(template, "Template updated"))
}

pub async fn delete_template(
    session: Session,
    Path(template_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::TemplatesWrite)?;
    registry.template_service().delete(template_id).await?;
    Ok(empty_success("Template deleted"))
}
