use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::models::{Attendee, EntityId, Event, EventDraft, EventPatch};
use crate::repository::Repository;
use crate::schema::{blank_form, render_fields, validate_definition, FormControl};
use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total: usize,
    pub printed: usize,
    pub not_printed: usize,
}

impl EventStats {
    fn from_attendees<'a>(attendees: impl IntoIterator<Item = &'a Attendee>) -> Self {
        let (printed, not_printed) = attendees
            .into_iter()
            .fold((0, 0), |(printed, not_printed), attendee| {
                if attendee.is_printed() {
                    (printed + 1, not_printed)
                } else {
                    (printed, not_printed + 1)
                }
            });
        Self {
            total: printed + not_printed,
            printed,
            not_printed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_events: usize,
    pub total_attendees: usize,
    pub printed_credentials: usize,
}

fn require_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::ValidationError("Event name is required".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn Repository<Event>>,
    attendees: Arc<dyn Repository<Attendee>>,
}

impl EventService {
    pub fn new(events: Arc<dyn Repository<Event>>, attendees: Arc<dyn Repository<Attendee>>) -> Self {
        Self { events, attendees }
    }

    pub async fn get_all(&self) -> AppResult<Vec<Event>> {
        self.events.get_all().await
    }

    /// Events whose name or location contains `term`, ignoring case. A blank
    /// term lists everything.
    pub async fn search(&self, term: Option<&str>) -> AppResult<Vec<Event>> {
        let events = self.events.get_all().await?;
        match term.map(str::trim).filter(|term| !term.is_empty()) {
            Some(term) => Ok(events.into_iter().filter(|e| e.matches(term)).collect()),
            None => Ok(events),
        }
    }

    pub async fn get_by_id(&self, id: EntityId) -> AppResult<Event> {
        self.events.get_by_id(id).await
    }

    /// Events styled by the given template.
    pub async fn get_by_parent_id(&self, template_id: EntityId) -> AppResult<Vec<Event>> {
        self.events.get_by_parent_id(template_id).await
    }

    pub async fn create(&self, draft: EventDraft) -> AppResult<Event> {
        require_name(&draft.name)?;
        validate_definition(&draft.schema)?;

        let event = self.events.create(draft).await?;
        info!(event_id = event.id, name = %event.name, "event created");
        Ok(event)
    }

    pub async fn update(&self, id: EntityId, patch: EventPatch) -> AppResult<Event> {
        let mut event = self.events.get_by_id(id).await?;
        event.apply(patch);
        require_name(&event.name)?;
        validate_definition(&event.schema)?;

        let event = self.events.update(event).await?;
        info!(event_id = event.id, "event updated");
        Ok(event)
    }

    /// Deleting an event leaves its attendees in place.
    pub async fn delete(&self, id: EntityId) -> AppResult<()> {
        let orphans = self.attendees.get_by_parent_id(id).await?.len();
        self.events.delete(id).await?;

        if orphans > 0 {
            warn!(event_id = id, orphans, "event deleted with attendees still attached");
        } else {
            info!(event_id = id, "event deleted");
        }
        Ok(())
    }

    pub async fn stats(&self, id: EntityId) -> AppResult<EventStats> {
        self.events.get_by_id(id).await?;
        let attendees = self.attendees.get_by_parent_id(id).await?;
        Ok(EventStats::from_attendees(&attendees))
    }

    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let total_events = self.events.get_all().await?.len();
        let attendees = self.attendees.get_all().await?;
        let stats = EventStats::from_attendees(&attendees);
        Ok(DashboardStats {
            total_events,
            total_attendees: stats.total,
            printed_credentials: stats.printed,
        })
    }

    /// Empty registration form for a new attendee of the event.
    pub async fn registration_form(&self, id: EntityId) -> AppResult<Vec<FormControl>> {
        let event = self.events.get_by_id(id).await?;
        Ok(render_fields(&event.schema, &blank_form(&event.schema)))
    }
}
