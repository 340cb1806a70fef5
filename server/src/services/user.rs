use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::models::{
    EntityId, NewRole, NewUser, Permission, Role, RolePatch, User, UserFilter, UserPatch,
    UserStatus,
};
use crate::repository::Repository;
use crate::session::Session;
use crate::utils::error::{AppError, AppResult};

const LAST_ADMIN_DELETE: &str = "Cannot delete the last administrator";
const LAST_ADMIN_REMOVE: &str = "Cannot remove the last administrator";

fn required(value: &str, what: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationError(format!("{what} is required")));
    }
    Ok(())
}

fn check_email(email: &str) -> AppResult<()> {
    required(email, "Email")?;
    match email.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::ValidationError(format!(
            "'{email}' is not a valid email address"
        ))),
    }
}

/// Users and the roles that grant them permissions.
///
/// Every write goes through `writes`, so the last-administrator and
/// unique-email checks see the state their write is applied to.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn Repository<User>>,
    roles: Arc<dyn Repository<Role>>,
    writes: Arc<Mutex<()>>,
}

impl UserService {
    pub fn new(users: Arc<dyn Repository<User>>, roles: Arc<dyn Repository<Role>>) -> Self {
        Self {
            users,
            roles,
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get_all(&self) -> AppResult<Vec<User>> {
        self.users.get_all().await
    }

    pub async fn list(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let users = self.users.get_all().await?;
        Ok(users.into_iter().filter(|user| filter.matches(user)).collect())
    }

    pub async fn get_by_id(&self, id: EntityId) -> AppResult<User> {
        self.users.get_by_id(id).await
    }

    /// Users holding the given role.
    pub async fn get_by_parent_id(&self, role_id: EntityId) -> AppResult<Vec<User>> {
        self.users.get_by_parent_id(role_id).await
    }

    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let users = self.users.get_all().await?;
        Ok(users
            .into_iter()
            .find(|user| user.email.to_lowercase() == email))
    }

    async fn ensure_email_free(&self, email: &str, owner: Option<EntityId>) -> AppResult<()> {
        match self.get_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => Err(AppError::Conflict(format!(
                "A user with email '{}' already exists",
                email.trim()
            ))),
            _ => Ok(()),
        }
    }

    async fn role_index(&self) -> AppResult<HashMap<EntityId, Role>> {
        let roles = self.roles.get_all().await?;
        Ok(roles.into_iter().map(|role| (role.id, role)).collect())
    }

    /// Number of users whose role holds the wildcard.
    async fn admin_count(&self) -> AppResult<usize> {
        let roles = self.role_index().await?;
        let users = self.users.get_all().await?;
        Ok(users
            .iter()
            .filter(|user| roles.get(&user.role_id).is_some_and(Role::is_admin))
            .count())
    }

    pub async fn create(&self, new_user: NewUser) -> AppResult<User> {
        required(&new_user.name, "Name")?;
        check_email(&new_user.email)?;
        let _guard = self.writes.lock().await;
        self.roles.get_by_id(new_user.role_id).await?;
        self.ensure_email_free(&new_user.email, None).await?;

        let user = self
            .users
            .create(NewUser {
                email: new_user.email.trim().to_string(),
                ..new_user
            })
            .await?;
        info!(user_id = user.id, role_id = user.role_id, "user created");
        Ok(user)
    }

    pub async fn update(&self, id: EntityId, patch: UserPatch) -> AppResult<User> {
        let _guard = self.writes.lock().await;
        let current = self.users.get_by_id(id).await?;
        let mut user = current.clone();
        user.apply(patch);
        user.email = user.email.trim().to_string();

        required(&user.name, "Name")?;
        check_email(&user.email)?;
        if user.email != current.email {
            self.ensure_email_free(&user.email, Some(id)).await?;
        }

        if user.role_id != current.role_id {
            let new_role = self.roles.get_by_id(user.role_id).await?;
            let was_admin = self
                .roles
                .get_by_id(current.role_id)
                .await
                .map(|role| role.is_admin())
                .unwrap_or(false);
            if was_admin && !new_role.is_admin() && self.admin_count().await? <= 1 {
                return Err(AppError::Conflict(LAST_ADMIN_REMOVE.into()));
            }
        }

        let user = self.users.update(user).await?;
        info!(user_id = user.id, "user updated");
        Ok(user)
    }

    pub async fn delete(&self, id: EntityId) -> AppResult<()> {
        let _guard = self.writes.lock().await;
        let user = self.users.get_by_id(id).await?;
        let is_admin = self
            .roles
            .get_by_id(user.role_id)
            .await
            .map(|role| role.is_admin())
            .unwrap_or(false);
        if is_admin && self.admin_count().await? <= 1 {
            return Err(AppError::Conflict(LAST_ADMIN_DELETE.into()));
        }

        self.users.delete(id).await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }

    pub async fn get_roles(&self) -> AppResult<Vec<Role>> {
        self.roles.get_all().await
    }

    pub async fn get_role(&self, id: EntityId) -> AppResult<Role> {
        self.roles.get_by_id(id).await
    }

    pub async fn create_role(&self, new_role: NewRole) -> AppResult<Role> {
        required(&new_role.name, "Role name")?;
        let _guard = self.writes.lock().await;
        let role = self.roles.create(new_role).await?;
        info!(role_id = role.id, name = %role.name, "role created");
        Ok(role)
    }

    pub async fn update_role(&self, id: EntityId, patch: RolePatch) -> AppResult<Role> {
        let _guard = self.writes.lock().await;
        let current = self.roles.get_by_id(id).await?;
        let mut role = current.clone();
        role.apply(patch);
        required(&role.name, "Role name")?;

        if current.is_admin() && !role.is_admin() {
            let holders = self.users.get_by_parent_id(id).await?.len();
            if holders > 0 && self.admin_count().await? <= holders {
                return Err(AppError::Conflict(LAST_ADMIN_REMOVE.into()));
            }
        }

        let role = self.roles.update(role).await?;
        info!(role_id = role.id, "role updated");
        Ok(role)
    }

    /// Roles still assigned to users cannot be deleted.
    pub async fn delete_role(&self, id: EntityId) -> AppResult<()> {
        let _guard = self.writes.lock().await;
        let role = self.roles.get_by_id(id).await?;
        let holders = self.users.get_by_parent_id(id).await?.len();
        if holders > 0 {
            if role.is_admin() && self.admin_count().await? <= holders {
                return Err(AppError::Conflict(LAST_ADMIN_REMOVE.into()));
            }
            return Err(AppError::Conflict(format!(
                "Role '{}' is still assigned to {holders} user(s)",
                role.name
            )));
        }

        self.roles.delete(id).await?;
        info!(role_id = id, "role deleted");
        Ok(())
    }

    /// Resolves the acting user. Unknown and inactive users get no session.
    pub async fn session_for(&self, user_id: EntityId) -> AppResult<Session> {
        let user = match self.users.get_by_id(user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::AuthError(format!("Unknown user {user_id}")))
            }
            Err(e) => return Err(e),
        };
        if user.status == UserStatus::Inactive {
            return Err(AppError::AuthError(format!("User {user_id} is inactive")));
        }
        let role = self.roles.get_by_id(user.role_id).await?;
        Ok(Session::new(user, role))
    }

    pub async fn has_permission(&self, user: &User, permission: Permission) -> AppResult<bool> {
        let role = self.roles.get_by_id(user.role_id).await?;
        Ok(role.permissions.allows(permission))
    }
}
