use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::{Credential, CredentialInput, CredentialRenderer, RenderError};

/// One on-screen preview surface.
///
/// Every render request takes a new ticket. A request whose photo finishes
/// loading after a newer request was issued is dropped instead of drawn, so
/// the surface never shows a stale attendee.
#[derive(Debug, Default)]
pub struct PreviewSlot {
    generation: AtomicU64,
}

impl PreviewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Ok(None)` when the render was superseded while loading.
    pub async fn render(
        &self,
        renderer: &CredentialRenderer,
        input: &CredentialInput<'_>,
    ) -> Result<Option<Credential>, RenderError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let photo = renderer.load_photo(input.attendee).await;

        let current = self.generation.load(Ordering::SeqCst);
        if current != ticket {
            debug!(
                attendee_id = input.attendee.id,
                ticket, current, "discarding superseded credential render"
            );
            return Ok(None);
        }

        super::draw(input, photo.as_ref()).map(Some)
    }
}
