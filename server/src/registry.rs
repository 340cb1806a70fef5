use std::sync::Arc;

use sqlx::PgPool;

use crate::models::{Attendee, Event, Role, Template, User};
use crate::render::photo::PhotoLoader;
use crate::render::CredentialRenderer;
use crate::repository::memory::{Latency, MemoryRepository};
use crate::repository::postgres::{
    PgAttendeeRepository, PgEventRepository, PgRoleRepository, PgTemplateRepository,
    PgUserRepository,
};
use crate::repository::seed::{admin_user, default_roles};
use crate::repository::Repository;
use crate::services::{
    AttendeeService, CredentialService, EventService, SettingsStore, TemplateService, UserService,
};

/// One repository per entity kind, all from the same backend.
pub struct Repositories {
    pub events: Arc<dyn Repository<Event>>,
    pub attendees: Arc<dyn Repository<Attendee>>,
    pub templates: Arc<dyn Repository<Template>>,
    pub users: Arc<dyn Repository<User>>,
    pub roles: Arc<dyn Repository<Role>>,
}

impl Repositories {
    /// Empty in-memory store holding the default roles and one administrator.
    pub fn in_memory(latency: Latency, admin_email: &str) -> Self {
        Self {
            events: Arc::new(MemoryRepository::<Event>::new(latency)),
            attendees: Arc::new(MemoryRepository::<Attendee>::new(latency)),
            templates: Arc::new(MemoryRepository::<Template>::new(latency)),
            users: Arc::new(MemoryRepository::with_rows(
                vec![admin_user(admin_email)],
                latency,
            )),
            roles: Arc::new(MemoryRepository::with_rows(default_roles(), latency)),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            events: Arc::new(PgEventRepository::new(pool.clone())),
            attendees: Arc::new(PgAttendeeRepository::new(pool.clone())),
            templates: Arc::new(PgTemplateRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            roles: Arc::new(PgRoleRepository::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct AppRegistry {
    event_service: EventService,
    attendee_service: AttendeeService,
    template_service: TemplateService,
    user_service: UserService,
    credential_service: CredentialService,
    settings: Arc<SettingsStore>,
}

impl AppRegistry {
    pub fn new(
        repositories: Repositories,
        settings: SettingsStore,
        photos: Arc<dyn PhotoLoader>,
    ) -> Self {
        let Repositories {
            events,
            attendees,
            templates,
            users,
            roles,
        } = repositories;

        let settings = Arc::new(settings);
        let event_service = EventService::new(events.clone(), attendees.clone());
        let attendee_service = AttendeeService::new(attendees, events.clone());
        let template_service = TemplateService::new(templates, events);
        let user_service = UserService::new(users, roles);
        let credential_service = CredentialService::new(
            CredentialRenderer::new(photos),
            event_service.clone(),
            attendee_service.clone(),
            template_service.clone(),
            settings.clone(),
        );

        Self {
            event_service,
            attendee_service,
            template_service,
            user_service,
            credential_service,
            settings,
        }
    }

    pub fn event_service(&self) -> &EventService {
        &self.event_service
    }

    pub fn attendee_service(&self) -> &AttendeeService {
        &self.attendee_service
    }

    pub fn template_service(&self) -> &TemplateService {
        &self.template_service
    }

    pub fn user_service(&self) -> &UserService {
        &self.user_service
    }

    pub fn credential_service(&self) -> &CredentialService {
        &self.credential_service
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }
}
