use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;

use crate::models::{EntityId, NewUser, Permission, UserFilter, UserPatch};
use crate::registry::AppRegistry;
use crate::session::Session;
use crate::utils::error::AppResult;
use crate::utils::response::{created, empty_success, success};

pub async fn list_users(
    session: Session,
    Query(filter): Query<UserFilter>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::UsersRead)?;
    let users = registry.user_service().list(&filter).await?;
    Ok(success(users, "Users retrieved"))
}

pub async fn create_user(
    session: Session,
    State(registry): State<AppRegistry>,
    Json(new_user): Json<NewUser>,
) -> AppResult<Response> {
    session.require(Permission::UsersWrite)?;
    let user = registry.user_service().create(new_user).await?;
    Ok(created(user, "User created"))
}

pub async fn show_user(
    session: Session,
    Path(user_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::UsersRead)?;
    let user = registry.user_service().get_by_id(user_id).await?;
    Ok(success(user, "User retrieved"))
}

pub async fn update_user(
    session: Session,
    Path(user_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
    Json(patch): Json<UserPatch>,
) -> AppResult<Response> {
    session.require(Permission::UsersWrite)?;
    let user = registry.user_service().update(user_id, patch).await?;
    Ok(success(user, "User updated"))
}

pub async fn delete_user(
    session: Session,
    Path(user_id): Path<EntityId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::UsersWrite)?;
    registry.user_service().delete(user_id).await?;
    Ok(empty_success("User deleted"))
}
