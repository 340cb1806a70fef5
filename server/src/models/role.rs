use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{EntityId, HexColor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "events:read")]
    EventsRead,
    #[serde(rename = "events:write")]
    EventsWrite,
    #[serde(rename = "attendees:read")]
    AttendeesRead,
    #[serde(rename = "attendees:write")]
    AttendeesWrite,
    #[serde(rename = "templates:read")]
    TemplatesRead,
    #[serde(rename = "templates:write")]
    TemplatesWrite,
    #[serde(rename = "users:read")]
    UsersRead,
    #[serde(rename = "users:write")]
    UsersWrite,
    #[serde(rename = "roles:read")]
    RolesRead,
    #[serde(rename = "roles:write")]
    RolesWrite,
    /// Grants every permission.
    #[serde(rename = "*")]
    All,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::EventsRead => "events:read",
            Permission::EventsWrite => "events:write",
            Permission::AttendeesRead => "attendees:read",
            Permission::AttendeesWrite => "attendees:write",
            Permission::TemplatesRead => "templates:read",
            Permission::TemplatesWrite => "templates:write",
            Permission::UsersRead => "users:read",
            Permission::UsersWrite => "users:write",
            Permission::RolesRead => "roles:read",
            Permission::RolesWrite => "roles:write",
            Permission::All => "*",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn wildcard() -> Self {
        Self::from_iter([Permission::All])
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.0.contains(&permission) || self.is_wildcard()
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.contains(&Permission::All)
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: EntityId,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub color: HexColor,
    pub description: Option<String>,
    #[sqlx(json)]
    pub permissions: PermissionSet,
}

impl Role {
    /// Roles holding the wildcard make their users administrators.
    pub fn is_admin(&self) -> bool {
        self.permissions.is_wildcard()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRole {
    pub name: String,
    pub color: HexColor,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: PermissionSet,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePatch {
    pub name: Option<String>,
    pub color: Option<HexColor>,
    pub description: Option<String>,
    pub permissions: Option<PermissionSet>,
}

impl Role {
    pub fn apply(&mut self, patch: RolePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(permissions) = patch.permissions {
            self.permissions = permissions;
        }
    }
}
