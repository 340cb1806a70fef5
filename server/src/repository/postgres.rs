use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;

use super::{not_found, Entity, Repository};
use crate::models::{
    Attendee, EntityId, Event, EventDraft, NewAttendee, NewRole, NewUser, Role, Template,
    TemplateDraft, User, UserStatus,
};
use crate::utils::error::AppResult;

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    tracing::info!("Successfully connected to database");

    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Migrations run successfully");

    Ok(pool)
}

fn deleted(kind: &str, id: EntityId, rows_affected: u64) -> AppResult<bool> {
    if rows_affected == 0 {
        Err(not_found(kind, id))
    } else {
        Ok(true)
    }
}

#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Event> for PgEventRepository {
    async fn get_all(&self) -> AppResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, Event>(
            "SELECT id, name, date, location, schema, template_id FROM events ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: EntityId) -> AppResult<Event> {
        sqlx::query_as::<_, Event>(
            "SELECT id, name, date, location, schema, template_id FROM events WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(Event::KIND, id))
    }

    async fn get_by_parent_id(&self, parent_id: EntityId) -> AppResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, Event>(
            r#"
                SELECT id, name, date, location, schema, template_id
                FROM events
                WHERE template_id = $1
                ORDER BY id
            "#,
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, draft: EventDraft) -> AppResult<Event> {
        let event = sqlx::query_as::<_, Event>(
            r#"
                INSERT INTO events (name, date, location, schema, template_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, name, date, location, schema, template_id
            "#,
        )
        .bind(&draft.name)
        .bind(draft.date)
        .bind(&draft.location)
        .bind(Json(&draft.schema))
        .bind(draft.template_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    async fn update(&self, event: Event) -> AppResult<Event> {
        sqlx::query_as::<_, Event>(
            r#"
                UPDATE events
                SET name = $2, date = $3, location = $4, schema = $5, template_id = $6
                WHERE id = $1
                RETURNING id, name, date, location, schema, template_id
            "#,
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(event.date)
        .bind(&event.location)
        .bind(Json(&event.schema))
        .bind(event.template_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(Event::KIND, event.id))
    }

    async fn delete(&self, id: EntityId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        deleted(Event::KIND, id, result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgAttendeeRepository {
    pool: PgPool,
}

impl PgAttendeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Attendee> for PgAttendeeRepository {
    async fn get_all(&self) -> AppResult<Vec<Attendee>> {
        let rows = sqlx::query_as::<_, Attendee>(
            r#"
                SELECT id, event_id, custom_data, photo_url, print_status, created_at
                FROM attendees
                ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: EntityId) -> AppResult<Attendee> {
        sqlx::query_as::<_, Attendee>(
            r#"
                SELECT id, event_id, custom_data, photo_url, print_status, created_at
                FROM attendees
                WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(Attendee::KIND, id))
    }

    async fn get_by_parent_id(&self, parent_id: EntityId) -> AppResult<Vec<Attendee>> {
        let rows = sqlx::query_as::<_, Attendee>(
            r#"
                SELECT id, event_id, custom_data, photo_url, print_status, created_at
                FROM attendees
                WHERE event_id = $1
                ORDER BY id
            "#,
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, draft: NewAttendee) -> AppResult<Attendee> {
        let attendee = sqlx::query_as::<_, Attendee>(
            r#"
                INSERT INTO attendees (event_id, custom_data, photo_url, print_status)
                VALUES ($1, $2, $3, $4)
                RETURNING id, event_id, custom_data, photo_url, print_status, created_at
            "#,
        )
        .bind(draft.event_id)
        .bind(Json(&draft.custom_data))
        .bind(&draft.photo_url)
        .bind(draft.print_status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(attendee)
    }

    async fn update(&self, attendee: Attendee) -> AppResult<Attendee> {
        sqlx::query_as::<_, Attendee>(
            r#"
                UPDATE attendees
                SET event_id = $2, custom_data = $3, photo_url = $4, print_status = $5
                WHERE id = $1
                RETURNING id, event_id, custom_data, photo_url, print_status, created_at
            "#,
        )
        .bind(attendee.id)
        .bind(attendee.event_id)
        .bind(Json(&attendee.custom_data))
        .bind(&attendee.photo_url)
        .bind(attendee.print_status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(Attendee::KIND, attendee.id))
    }

    async fn delete(&self, id: EntityId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM attendees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        deleted(Attendee::KIND, id, result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgTemplateRepository {
    pool: PgPool,
}

impl PgTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Template> for PgTemplateRepository {
    async fn get_all(&self) -> AppResult<Vec<Template>> {
        let rows = sqlx::query_as::<_, Template>(
            "SELECT id, name, dimensions, design FROM templates ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: EntityId) -> AppResult<Template> {
        sqlx::query_as::<_, Template>(
            "SELECT id, name, dimensions, design FROM templates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(Template::KIND, id))
    }

    async fn get_by_parent_id(&self, _parent_id: EntityId) -> AppResult<Vec<Template>> {
        Ok(Vec::new())
    }

    async fn create(&self, draft: TemplateDraft) -> AppResult<Template> {
        let template = sqlx::query_as::<_, Template>(
            r#"
                INSERT INTO templates (name, dimensions, design)
                VALUES ($1, $2, $3)
                RETURNING id, name, dimensions, design
            "#,
        )
        .bind(&draft.name)
        .bind(Json(&draft.dimensions))
        .bind(Json(&draft.design))
        .fetch_one(&self.pool)
        .await?;
        Ok(template)
    }

    async fn update(&self, template: Template) -> AppResult<Template> {
        sqlx::query_as::<_, Template>(
            r#"
                UPDATE templates
                SET name = $2, dimensions = $3, design = $4
                WHERE id = $1
                RETURNING id, name, dimensions, design
            "#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(Json(&template.dimensions))
        .bind(Json(&template.design))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(Template::KIND, template.id))
    }

    async fn delete(&self, id: EntityId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        deleted(Template::KIND, id, result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<User> for PgUserRepository {
    async fn get_all(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
                SELECT id, name, email, status, role_id, created_at, last_login
                FROM users
                ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: EntityId) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
                SELECT id, name, email, status, role_id, created_at, last_login
                FROM users
                WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(User::KIND, id))
    }

    async fn get_by_parent_id(&self, parent_id: EntityId) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
                SELECT id, name, email, status, role_id, created_at, last_login
                FROM users
                WHERE role_id = $1
                ORDER BY id
            "#,
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, draft: NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
                INSERT INTO users (name, email, status, role_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id, name, email, status, role_id, created_at, last_login
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(UserStatus::Active.as_str())
        .bind(draft.role_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update(&self, user: User) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
                UPDATE users
                SET name = $2, email = $3, status = $4, role_id = $5, last_login = $6
                WHERE id = $1
                RETURNING id, name, email, status, role_id, created_at, last_login
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.status.as_str())
        .bind(user.role_id)
        .bind(user.last_login)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(User::KIND, user.id))
    }

    async fn delete(&self, id: EntityId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        deleted(User::KIND, id, result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Role> for PgRoleRepository {
    async fn get_all(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, Role>(
            "SELECT id, name, color, description, permissions FROM roles ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: EntityId) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, color, description, permissions FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(Role::KIND, id))
    }

    async fn get_by_parent_id(&self, _parent_id: EntityId) -> AppResult<Vec<Role>> {
        Ok(Vec::new())
    }

    async fn create(&self, draft: NewRole) -> AppResult<Role> {
        let role = sqlx::query_as::<_, Role>(
            r#"
                INSERT INTO roles (name, color, description, permissions)
                VALUES ($1, $2, $3, $4)
                RETURNING id, name, color, description, permissions
            "#,
        )
        .bind(&draft.name)
        .bind(draft.color.to_string())
        .bind(&draft.description)
        .bind(Json(&draft.permissions))
        .fetch_one(&self.pool)
        .await?;
        Ok(role)
    }

    async fn update(&self, role: Role) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(
            r#"
                UPDATE roles
                SET name = $2, color = $3, description = $4, permissions = $5
                WHERE id = $1
                RETURNING id, name, color, description, permissions
            "#,
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(role.color.to_string())
        .bind(&role.description)
        .bind(Json(&role.permissions))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(Role::KIND, role.id))
    }

    async fn delete(&self, id: EntityId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        deleted(Role::KIND, id, result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AppError;

    #[test]
    fn test_zero_rows_affected_is_not_found() {
        assert!(matches!(
            deleted("Event", 4, 0),
            Err(AppError::NotFound(msg)) if msg == "Event with id 4 was not found"
        ));
        assert!(deleted("Event", 4, 1).unwrap());
    }
}
