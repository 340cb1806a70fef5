use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;

use crate::models::{EntityId, NewRole, Permission, RolePatch};
use crate::registry::AppRegistry;
use crate::session::Session;
use crate::utils::error::AppResult;
use crate::utils::response::{created, empty_success, success};

pub async fn list_roles(
    session: Session,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::RolesRead)?;
    let roles = registry.user_service().get_roles().await?;
    Ok(success(roles, "Roles retrieved"))
}

pub async fn create_role(
    session: Session,
    State(registry): State<AppRegistry>,
    Json(new_role): Json<NewRole>,
) -> AppResult<Response> {
    session.require(Permission::RolesWrite)?;
    let role = registry.user_service().create_role(new_role).await?;
    Ok(created(role, "Role created"))
}

pub async fn show_role(
    session: Session,
    Path(role_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::RolesRead)?;
    let role = registry.user_service().get_role(role_id).await?;
    Ok(success(role, "Role retrieved"))
}

pub async fn update_role(
    session: Session,
    Path(role_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
    Json(patch): Json<RolePatch>,
) -> AppResult<Response> {
    session.require(Permission::RolesWrite)?;
    let role = registry.user_service().update_role(role_id, patch).await?;
    Ok(success(role, "Role updated"))
}

pub async fn delete_role(
    session: Session,
    Path(role_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::RolesWrite)?;
    registry.user_service().delete_role(role_id).await?;
    Ok(empty_success("Role deleted"))
}
