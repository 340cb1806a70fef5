use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::models::{Attendee, Dimensions, EntityId, Event, Template};
use crate::render::{Credential, CredentialInput, CredentialRenderer, PreviewSlot};
use crate::services::{AttendeeService, EventService, SettingsStore, TemplateService};
use crate::utils::error::AppResult;

/// Everything needed to draw one attendee's credential.
struct Subject {
    attendee: Attendee,
    event: Event,
    template: Option<Template>,
}

/// Draws credentials from stored records.
#[derive(Clone)]
pub struct CredentialService {
    renderer: CredentialRenderer,
    events: EventService,
    attendees: AttendeeService,
    templates: TemplateService,
    settings: Arc<SettingsStore>,
    /// One preview surface per user.
    previews: Arc<Mutex<HashMap<EntityId, Arc<PreviewSlot>>>>,
}

impl CredentialService {
    pub fn new(
        renderer: CredentialRenderer,
        events: EventService,
        attendees: AttendeeService,
        templates: TemplateService,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            renderer,
            events,
            attendees,
            templates,
            settings,
            previews: Arc::default(),
        }
    }

    async fn subject(&self, event_id: EntityId, attendee_id: EntityId) -> AppResult<Subject> {
        let attendee = self.attendees.get_for_event(event_id, attendee_id).await?;
        let event = self.events.get_by_id(event_id).await?;
        let template = self.templates.template_for_event(&event).await?;
        Ok(Subject {
            attendee,
            event,
            template,
        })
    }

    /// Size used when an event has no template.
    async fn fallback_dimensions(&self) -> Dimensions {
        let settings = self.settings.get().await;
        settings.general.default_credential_size.dimensions()
    }

    pub async fn render(&self, event_id: EntityId, attendee_id: EntityId) -> AppResult<Credential> {
        let subject = self.subject(event_id, attendee_id).await?;
        let fallback_dimensions = self.fallback_dimensions().await;
        let input = CredentialInput {
            attendee: &subject.attendee,
            template: subject.template.as_ref(),
            event: Some(&subject.event),
            fallback_dimensions,
        };
        Ok(self.renderer.render(&input).await?)
    }

    /// Renders on the user's preview surface. `None` means a newer preview
    /// request from the same user replaced this one.
    pub async fn preview(
        &self,
        user_id: EntityId,
        event_id: EntityId,
        attendee_id: EntityId,
    ) -> AppResult<Option<Credential>> {
        let subject = self.subject(event_id, attendee_id).await?;
        let fallback_dimensions = self.fallback_dimensions().await;
        let input = CredentialInput {
            attendee: &subject.attendee,
            template: subject.template.as_ref(),
            event: Some(&subject.event),
            fallback_dimensions,
        };
        let slot = self.preview_slot(user_id);
        Ok(slot.render(&self.renderer, &input).await?)
    }

    fn preview_slot(&self, user_id: EntityId) -> Arc<PreviewSlot> {
        let mut previews = self
            .previews
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        previews.entry(user_id).or_default().clone()
    }
}
