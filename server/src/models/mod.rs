use thiserror::Error;

pub mod attendee;
pub mod event;
pub mod role;
pub mod settings;
pub mod template;
pub mod user;

pub use attendee::{Attendee, AttendeeForm, AttendeePatch, NewAttendee, PrintStatus};
pub use event::{Event, EventDraft, EventPatch};
pub use role::{NewRole, Permission, PermissionSet, Role, RolePatch};
pub use settings::AppSettings;
pub use template::{CredentialSize, Design, Dimensions, HexColor, Template, TemplateDraft, TemplatePatch};
pub use user::{NewUser, User, UserFilter, UserPatch, UserStatus};

/// Store-assigned identifier shared by every entity kind.
pub type EntityId = i64;

/// Raised when a stored string does not name a known enum variant.
#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
