//! Storage behind the entity services.
//!
//! Every entity kind is reached through [`Repository`]; a process runs with
//! exactly one backend, either [`memory`] or [`postgres`].

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{
    Attendee, EntityId, Event, EventDraft, NewAttendee, NewRole, NewUser, Role, Template,
    TemplateDraft, User, UserStatus,
};
use crate::utils::error::{AppError, AppResult};

pub mod memory;
pub mod postgres;
pub mod seed;

pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: &'static str;

    /// Validated creation payload.
    type Draft: Send + 'static;

    fn id(&self) -> EntityId;

    /// Owning record, for [`Repository::get_by_parent_id`].
    fn parent_id(&self) -> Option<EntityId>;

    fn from_draft(id: EntityId, draft: Self::Draft) -> Self;
}

#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// All records, in id order.
    async fn get_all(&self) -> AppResult<Vec<T>>;
    async fn get_by_id(&self, id: EntityId) -> AppResult<T>;
    async fn get_by_parent_id(&self, parent_id: EntityId) -> AppResult<Vec<T>>;
    async fn create(&self, draft: T::Draft) -> AppResult<T>;
    /// Replaces the stored record with the same id.
    async fn update(&self, entity: T) -> AppResult<T>;
    async fn delete(&self, id: EntityId) -> AppResult<bool>;
}

pub fn not_found(kind: &str, id: EntityId) -> AppError {
    AppError::NotFound(format!("{kind} with id {id} was not found"))
}

impl Entity for Event {
    const KIND: &'static str = "Event";
    type Draft = EventDraft;

    fn id(&self) -> EntityId {
        self.id
    }

    fn parent_id(&self) -> Option<EntityId> {
        self.template_id
    }

    fn from_draft(id: EntityId, draft: EventDraft) -> Self {
        Self {
            id,
            name: draft.name,
            date: draft.date,
            location: draft.location,
            schema: draft.schema,
            template_id: draft.template_id,
        }
    }
}

impl Entity for Attendee {
    const KIND: &'static str = "Attendee";
    type Draft = NewAttendee;

    fn id(&self) -> EntityId {
        self.id
    }

    fn parent_id(&self) -> Option<EntityId> {
        Some(self.event_id)
    }

    fn from_draft(id: EntityId, draft: NewAttendee) -> Self {
        Self {
            id,
            event_id: draft.event_id,
            custom_data: draft.custom_data,
            photo_url: draft.photo_url,
            print_status: draft.print_status,
            created_at: Utc::now(),
        }
    }
}

impl Entity for Template {
    const KIND: &'static str = "Template";
    type Draft = TemplateDraft;

    fn id(&self) -> EntityId {
        self.id
    }

    fn parent_id(&self) -> Option<EntityId> {
        None
    }

    fn from_draft(id: EntityId, draft: TemplateDraft) -> Self {
        Self {
            id,
            name: draft.name,
            dimensions: draft.dimensions,
            design: draft.design,
        }
    }
}

impl Entity for User {
    const KIND: &'static str = "User";
    type Draft = NewUser;

    fn id(&self) -> EntityId {
        self.id
    }

    fn parent_id(&self) -> Option<EntityId> {
        Some(self.role_id)
    }

    fn from_draft(id: EntityId, draft: NewUser) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            status: UserStatus::Active,
            role_id: draft.role_id,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

impl Entity for Role {
    const KIND: &'static str = "Role";
    type Draft = NewRole;

    fn id(&self) -> EntityId {
        self.id
    }

    fn parent_id(&self) -> Option<EntityId> {
        None
    }

    fn from_draft(id: EntityId, draft: NewRole) -> Self {
        Self {
            id,
            name: draft.name,
            color: draft.color,
            description: draft.description,
            permissions: draft.permissions,
        }
    }
}
