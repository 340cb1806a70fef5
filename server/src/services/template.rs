use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::models::template::MAX_DIMENSION;
use crate::models::{Design, Dimensions, EntityId, Event, Template, TemplateDraft, TemplatePatch};
use crate::repository::Repository;
use crate::utils::error::{AppError, AppResult};

fn check_dimensions(dimensions: &Dimensions) -> AppResult<()> {
    if !dimensions.is_renderable() {
        return Err(AppError::ValidationError(format!(
            "Credential size {}x{} is not supported; width and height must be between 1 and {MAX_DIMENSION}",
            dimensions.width, dimensions.height
        )));
    }
    Ok(())
}

fn check_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::ValidationError("Template name is required".into()));
    }
    Ok(())
}

/// Styling saved from an event's template editor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTemplateForm {
    pub name: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub design: Option<Design>,
}

#[derive(Clone)]
pub struct TemplateService {
    templates: Arc<dyn Repository<Template>>,
    events: Arc<dyn Repository<Event>>,
}

impl TemplateService {
    pub fn new(templates: Arc<dyn Repository<Template>>, events: Arc<dyn Repository<Event>>) -> Self {
        Self { templates, events }
    }

    pub async fn get_all(&self) -> AppResult<Vec<Template>> {
        self.templates.get_all().await
    }

    pub async fn get_by_id(&self, id: EntityId) -> AppResult<Template> {
        self.templates.get_by_id(id).await
    }

    pub async fn create(&self, draft: TemplateDraft) -> AppResult<Template> {
        check_name(&draft.name)?;
        check_dimensions(&draft.dimensions)?;

        let template = self.templates.create(draft).await?;
        info!(template_id = template.id, name = %template.name, "template created");
        Ok(template)
    }

    pub async fn update(&self, id: EntityId, patch: TemplatePatch) -> AppResult<Template> {
        let mut template = self.templates.get_by_id(id).await?;
        template.apply(patch);
        check_name(&template.name)?;
        check_dimensions(&template.dimensions)?;

        let template = self.templates.update(template).await?;
        info!(template_id = template.id, "template updated");
        Ok(template)
    }

    /// Events keep their link to a deleted template and render with the
    /// default design until relinked.
    pub async fn delete(&self, id: EntityId) -> AppResult<()> {
        let linked = self.events.get_by_parent_id(id).await?.len();
        self.templates.delete(id).await?;
        if linked > 0 {
            warn!(template_id = id, linked, "template deleted while events still use it");
        } else {
            info!(template_id = id, "template deleted");
        }
        Ok(())
    }

    /// The template an event renders with. A link to a template that no
    /// longer exists resolves to `None`.
    pub async fn template_for_event(&self, event: &Event) -> AppResult<Option<Template>> {
        let Some(template_id) = event.template_id else {
            return Ok(None);
        };
        match self.templates.get_by_id(template_id).await {
            Ok(template) => Ok(Some(template)),
            Err(AppError::NotFound(_)) => {
                warn!(event_id = event.id, template_id, "event links a missing template");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Updates the event's template in place, or creates one and links it
    /// when the event has none.
    pub async fn save_for_event(
        &self,
        event_id: EntityId,
        form: EventTemplateForm,
    ) -> AppResult<Template> {
        let mut event = self.events.get_by_id(event_id).await?;

        if let Some(mut template) = self.template_for_event(&event).await? {
            template.apply(TemplatePatch {
                name: form.name,
                dimensions: form.dimensions,
                design: form.design,
            });
            check_name(&template.name)?;
            check_dimensions(&template.dimensions)?;
            let template = self.templates.update(template).await?;
            info!(template_id = template.id, event_id, "event template updated");
            return Ok(template);
        }

        let name = form
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("{} Template", event.name));
        let template = self
            .create(TemplateDraft {
                name,
                dimensions: form.dimensions.unwrap_or_default(),
                design: form.design.unwrap_or_default(),
            })
            .await?;

        event.template_id = Some(template.id);
        self.events.update(event).await?;
        info!(template_id = template.id, event_id, "template linked to event");
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventDraft, HexColor};
    use crate::repository::memory::{Latency, MemoryRepository};
    use crate::schema::FieldSchema;
    use chrono::NaiveDate;

    async fn setup() -> (TemplateService, Arc<MemoryRepository<Event>>, Event) {
        let events = Arc::new(MemoryRepository::<Event>::new(Latency::none()));
        let event = events
            .create(EventDraft {
                name: "Conf".into(),
                date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                location: String::new(),
                schema: FieldSchema::default_attendee_fields(),
                template_id: None,
            })
            .await
            .unwrap();
        let service = TemplateService::new(
            Arc::new(MemoryRepository::<Template>::new(Latency::none())),
            events.clone(),
        );
        (service, events, event)
    }

    #[tokio::test]
    async fn test_save_for_event_creates_then_updates() {
        let (service, events, event) = setup().await;

        let created = service
            .save_for_event(event.id, EventTemplateForm::default())
            .await
            .unwrap();
        assert_eq!(created.name, "Conf Template");
        assert_eq!(created.dimensions, Dimensions::default());
        assert_eq!(
            events.get_by_id(event.id).await.unwrap().template_id,
            Some(created.id)
        );

        let mut design = Design::default();
        design.header_color = HexColor::rgb(0, 0, 0);
        let updated = service
            .save_for_event(
                event.id,
                EventTemplateForm {
                    design: Some(design),
                    ..EventTemplateForm::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.design.header_color, HexColor::rgb(0, 0, 0));
        assert_eq!(service.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unrenderable_sizes_are_rejected() {
        let (service, _, _) = setup().await;
        for (width, height) in [(0, 250), (400, 0), (MAX_DIMENSION + 1, 250)] {
            let result = service
                .create(TemplateDraft {
                    name: "Odd".into(),
                    dimensions: Dimensions { width, height },
                    design: Design::default(),
                })
                .await;
            assert!(matches!(result, Err(AppError::ValidationError(_))));
        }
    }

    #[tokio::test]
    async fn test_deleted_template_falls_back_to_none() {
        let (service, events, event) = setup().await;
        let template = service
            .save_for_event(event.id, EventTemplateForm::default())
            .await
            .unwrap();
        service.delete(template.id).await.unwrap();

        let event = events.get_by_id(event.id).await.unwrap();
        assert_eq!(event.template_id, Some(template.id));
        assert_eq!(service.template_for_event(&event).await.unwrap(), None);
        assert!(matches!(
            service.update(template.id, TemplatePatch::default()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
