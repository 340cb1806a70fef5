use axum::extract::State;
use axum::response::Response;
use axum::Json;

use crate::models::{AppSettings, Permission};
use crate::registry::AppRegistry;
use crate::session::Session;
use crate::utils::error::AppResult;
use crate::utils::response::success;

/// Every signed-in user may read the settings.
pub async fn show_settings(_session: Session, State(registry): State<AppRegistry>) -> Response {
    success(registry.settings().get().await, "Settings retrieved")
}

/// Changing settings is reserved to administrators.
pub async fn update_settings(
    session: Session,
    State(registry): State<AppRegistry>,
    Json(settings): Json<AppSettings>,
) -> AppResult<Response> {
    session.require(Permission::All)?;
    let settings = registry.settings().save(settings).await?;
    Ok(success(settings, "Settings saved"))
}

pub async fn reset_settings(
    session: Session,
    State(registry): State<AppRegistry>,
) -> AppResult<Response> {
    session.require(Permission::All)?;
    let settings = registry.settings().reset().await?;
    Ok(success(settings, "Settings reset to defaults"))
}
