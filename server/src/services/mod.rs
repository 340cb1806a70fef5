//! Entity services. Each one wraps the repositories it needs and applies
//! validation and cross-entity rules before anything is stored.

pub mod attendee;
pub mod credential;
pub mod event;
pub mod settings;
pub mod template;
pub mod user;

pub use attendee::{AttendeeService, AttendeeSort, SortDirection};
pub use credential::CredentialService;
pub use event::{DashboardStats, EventService, EventStats};
pub use settings::{SettingsError, SettingsStore};
pub use template::{EventTemplateForm, TemplateService};
pub use user::UserService;
