use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::models::attendee::normalize_photo_url;
use crate::models::{
    Attendee, AttendeeForm, AttendeePatch, EntityId, Event, NewAttendee, PrintStatus,
};
use crate::repository::{not_found, Entity, Repository};
use crate::schema::{render_fields, validate_custom_data, CustomData, FormControl};
use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Orders attendees by one custom field. Missing values sort as empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendeeSort {
    pub field: String,
    pub direction: SortDirection,
}

impl AttendeeSort {
    fn compare(&self, a: &Attendee, b: &Attendee) -> Ordering {
        let value = |attendee: &Attendee| {
            attendee
                .custom_data
                .get(&self.field)
                .map(|value| value.to_lowercase())
                .unwrap_or_default()
        };
        let ordering = value(a).cmp(&value(b)).then(a.id.cmp(&b.id));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

#[derive(Clone)]
pub struct AttendeeService {
    attendees: Arc<dyn Repository<Attendee>>,
    events: Arc<dyn Repository<Event>>,
}

impl AttendeeService {
    pub fn new(attendees: Arc<dyn Repository<Attendee>>, events: Arc<dyn Repository<Event>>) -> Self {
        Self { attendees, events }
    }

    pub async fn get_all(&self) -> AppResult<Vec<Attendee>> {
        self.attendees.get_all().await
    }

    pub async fn get_by_id(&self, id: EntityId) -> AppResult<Attendee> {
        self.attendees.get_by_id(id).await
    }

    pub async fn get_by_parent_id(&self, event_id: EntityId) -> AppResult<Vec<Attendee>> {
        self.attendees.get_by_parent_id(event_id).await
    }

    /// An attendee reached through its event; one registered elsewhere is
    /// reported as not found.
    pub async fn get_for_event(&self, event_id: EntityId, id: EntityId) -> AppResult<Attendee> {
        let attendee = self.attendees.get_by_id(id).await?;
        if attendee.event_id != event_id {
            return Err(not_found(Attendee::KIND, id));
        }
        Ok(attendee)
    }

    pub async fn list_for_event(
        &self,
        event_id: EntityId,
        sort: Option<AttendeeSort>,
    ) -> AppResult<Vec<Attendee>> {
        self.events.get_by_id(event_id).await?;
        let mut attendees = self.attendees.get_by_parent_id(event_id).await?;
        if let Some(sort) = sort {
            attendees.sort_by(|a, b| sort.compare(a, b));
        }
        Ok(attendees)
    }

    /// Registers an attendee after checking the form against the event schema.
    pub async fn register(&self, event_id: EntityId, form: AttendeeForm) -> AppResult<Attendee> {
        let event = self.events.get_by_id(event_id).await?;
        let custom_data = validate_custom_data(&event.schema, &CustomData::new(), form.custom_data)?;

        let attendee = self
            .attendees
            .create(NewAttendee {
                event_id,
                custom_data,
                photo_url: normalize_photo_url(form.photo_url),
                print_status: PrintStatus::NotPrinted,
            })
            .await?;
        info!(attendee_id = attendee.id, event_id, "attendee registered");
        Ok(attendee)
    }

    pub async fn update(
        &self,
        event_id: EntityId,
        id: EntityId,
        patch: AttendeePatch,
    ) -> AppResult<Attendee> {
        let mut attendee = self.get_for_event(event_id, id).await?;

        if let Some(submitted) = patch.custom_data {
            let event = self.events.get_by_id(event_id).await?;
            attendee.custom_data = validate_custom_data(&event.schema, &attendee.custom_data, submitted)?;
        }
        if let Some(photo_url) = patch.photo_url {
            attendee.photo_url = normalize_photo_url(Some(photo_url));
        }

        let attendee = self.attendees.update(attendee).await?;
        info!(attendee_id = attendee.id, event_id, "attendee updated");
        Ok(attendee)
    }

    pub async fn delete(&self, event_id: EntityId, id: EntityId) -> AppResult<()> {
        self.get_for_event(event_id, id).await?;
        self.attendees.delete(id).await?;
        info!(attendee_id = id, event_id, "attendee deleted");
        Ok(())
    }

    /// Marks a selection of the event's attendees as printed. The whole
    /// selection is checked before anything is written.
    pub async fn mark_printed(
        &self,
        event_id: EntityId,
        attendee_ids: &[EntityId],
    ) -> AppResult<Vec<Attendee>> {
        if attendee_ids.is_empty() {
            return Err(AppError::ValidationError(
                "Select at least one attendee to print".into(),
            ));
        }
        self.events.get_by_id(event_id).await?;

        let ids: BTreeSet<EntityId> = attendee_ids.iter().copied().collect();
        let mut selection = Vec::with_capacity(ids.len());
        for id in ids {
            selection.push(self.get_for_event(event_id, id).await?);
        }

        let mut printed = Vec::with_capacity(selection.len());
        for mut attendee in selection {
            attendee.print_status = PrintStatus::Printed;
            printed.push(self.attendees.update(attendee).await?);
        }
        info!(event_id, count = printed.len(), "credentials marked printed");
        Ok(printed)
    }

    /// Edit form of an attendee, pre-filled with the stored values.
    pub async fn edit_form(&self, event_id: EntityId, id: EntityId) -> AppResult<Vec<FormControl>> {
        let attendee = self.get_for_event(event_id, id).await?;
        let event = self.events.get_by_id(event_id).await?;
        Ok(render_fields(&event.schema, &attendee.custom_data))
    }
}
