use chrono::Utc;

use crate::models::{HexColor, Permission, PermissionSet, Role, User, UserStatus};

pub const ADMINISTRATOR_ROLE_ID: i64 = 1;
pub const OPERATOR_ROLE_ID: i64 = 2;
pub const VIEWER_ROLE_ID: i64 = 3;

/// Roles every fresh store starts with. Mirrored by the initial migration.
pub fn default_roles() -> Vec<Role> {
    vec![
        Role {
            id: ADMINISTRATOR_ROLE_ID,
            name: "Administrator".to_string(),
            color: HexColor::rgb(0xdc, 0x26, 0x26),
            description: Some("Full access to every screen".to_string()),
            permissions: PermissionSet::wildcard(),
        },
        Role {
            id: OPERATOR_ROLE_ID,
            name: "Operator".to_string(),
            color: HexColor::rgb(0x25, 0x63, 0xeb),
            description: Some("Registers attendees and prints credentials".to_string()),
            permissions: PermissionSet::from_iter([
                Permission::EventsRead,
                Permission::AttendeesRead,
                Permission::AttendeesWrite,
                Permission::TemplatesRead,
            ]),
        },
        Role {
            id: VIEWER_ROLE_ID,
            name: "Viewer".to_string(),
            color: HexColor::rgb(0x6b, 0x72, 0x80),
            description: Some("Read-only access".to_string()),
            permissions: PermissionSet::from_iter([
                Permission::EventsRead,
                Permission::AttendeesRead,
                Permission::TemplatesRead,
            ]),
        },
    ]
}

/// The administrator account of an empty store.
pub fn admin_user(email: &str) -> User {
    User {
        id: 1,
        name: "Administrator".to_string(),
        email: email.to_string(),
        status: UserStatus::Active,
        role_id: ADMINISTRATOR_ROLE_ID,
        created_at: Utc::now(),
        last_login: None,
    }
}
