pub mod attendee;
pub mod event;
pub mod health;
pub mod role;
pub mod settings;
pub mod template;
pub mod user;

pub use health::health_check;
