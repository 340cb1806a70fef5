use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;

use crate::models::{EntityId, Permission, Role, User};
use crate::registry::AppRegistry;
use crate::utils::error::{AppError, AppResult};

/// Header carrying the id of the acting user.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The acting user and their role, resolved once per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    pub role: Role,
}

impl Session {
    pub fn new(user: User, role: Role) -> Self {
        Self { user, role }
    }

    pub fn user_id(&self) -> EntityId {
        self.user.id
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.permissions.allows(permission)
    }

    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Role '{}' lacks the '{permission}' permission",
                self.role.name
            )))
        }
    }

    pub fn can_access_events(&self) -> bool {
        self.has_permission(Permission::EventsRead)
    }

    pub fn can_manage_users(&self) -> bool {
        self.has_permission(Permission::UsersWrite)
    }

    pub fn can_manage_roles(&self) -> bool {
        self.has_permission(Permission::RolesWrite)
    }
}

fn user_id_from(parts: &Parts) -> AppResult<EntityId> {
    let value = parts
        .headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::AuthError(format!("Missing {USER_ID_HEADER} header")))?;
    value
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| AppError::AuthError(format!("Invalid {USER_ID_HEADER} header")))
}

#[async_trait]
impl FromRequestParts<AppRegistry> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        registry: &AppRegistry,
    ) -> Result<Self, Self::Rejection> {
        let user_id = user_id_from(parts)?;
        registry.user_service().session_for(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HexColor, PermissionSet, UserStatus};
    use axum::http::Request;
    use chrono::Utc;

    fn session(permissions: PermissionSet) -> Session {
        Session::new(
            User {
                id: 5,
                name: "Olga".into(),
                email: "olga@example.com".into(),
                status: UserStatus::Active,
                role_id: 2,
                created_at: Utc::now(),
                last_login: None,
            },
            Role {
                id: 2,
                name: "Operator".into(),
                color: HexColor::rgb(0x25, 0x63, 0xeb),
                description: None,
                permissions,
            },
        )
    }

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/events");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_require_reports_missing_permission() {
        let session = session(PermissionSet::from_iter([Permission::EventsRead]));
        assert!(session.require(Permission::EventsRead).is_ok());
        assert!(session.can_access_events());
        assert!(!session.can_manage_users());

        let err = session.require(Permission::EventsWrite).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref msg) if msg.contains("events:write")));
    }

    #[test]
    fn test_wildcard_grants_everything() {
        let session = session(PermissionSet::wildcard());
        assert!(session.can_manage_roles());
        assert!(session.require(Permission::TemplatesWrite).is_ok());
    }

    #[test]
    fn test_user_id_header_parsing() {
        assert_eq!(user_id_from(&parts(Some(" 12 "))).unwrap(), 12);
        assert!(matches!(user_id_from(&parts(None)), Err(AppError::AuthError(_))));
        assert!(matches!(
            user_id_from(&parts(Some("abc"))),
            Err(AppError::AuthError(_))
        ));
    }
}
