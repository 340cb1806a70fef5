//! Credential rendering.
//!
//! A credential is drawn in two steps: [`layout::compose`] turns the
//! attendee, template and event into an ordered list of draw operations,
//! then [`canvas::rasterize`] paints that list onto a pixmap. The photo, if
//! any, is loaded before anything is drawn.

pub mod canvas;
pub mod layout;
pub mod photo;
pub mod preview;

use std::sync::Arc;

use thiserror::Error;
use tiny_skia::Pixmap;
use tracing::{debug, warn};

use crate::models::{Attendee, Dimensions, Event, Template};
use layout::CredentialLayout;
use photo::PhotoLoader;

pub use preview::PreviewSlot;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("credential size {width}x{height} cannot be rendered")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("failed to encode credential: {0}")]
    Encode(String),
}

/// Everything one credential is drawn from.
#[derive(Debug, Clone, Copy)]
pub struct CredentialInput<'a> {
    pub attendee: &'a Attendee,
    pub template: Option<&'a Template>,
    pub event: Option<&'a Event>,
    /// Used when no template applies, taken from the configured default size.
    pub fallback_dimensions: Dimensions,
}

pub struct Credential {
    layout: CredentialLayout,
    pixmap: Pixmap,
}

impl Credential {
    pub fn layout(&self) -> &CredentialLayout {
        &self.layout
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(e.to_string()))
    }
}

#[derive(Clone)]
pub struct CredentialRenderer {
    photos: Arc<dyn PhotoLoader>,
}

impl CredentialRenderer {
    pub fn new(photos: Arc<dyn PhotoLoader>) -> Self {
        Self { photos }
    }

    /// Loads the photo, then draws. A photo that fails to load falls back to
    /// the placeholder.
    pub async fn render(&self, input: &CredentialInput<'_>) -> Result<Credential, RenderError> {
        let photo = self.load_photo(input.attendee).await;
        draw(input, photo.as_ref())
    }

    pub async fn load_photo(&self, attendee: &Attendee) -> Option<Pixmap> {
        let url = attendee.photo_url.as_deref()?;
        match self.photos.load(url).await {
            Ok(photo) => Some(photo),
            Err(e) => {
                warn!(
                    attendee_id = attendee.id,
                    error = %e,
                    "photo could not be loaded, drawing placeholder"
                );
                None
            }
        }
    }
}

pub fn draw(input: &CredentialInput<'_>, photo: Option<&Pixmap>) -> Result<Credential, RenderError> {
    let layout = layout::compose(input, photo.is_some());
    let pixmap = canvas::rasterize(&layout, photo)?;
    debug!(
        attendee_id = input.attendee.id,
        width = pixmap.width(),
        height = pixmap.height(),
        "credential drawn"
    );
    Ok(Credential { layout, pixmap })
}
