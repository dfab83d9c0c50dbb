pub mod draw;
pub mod security_event;
pub mod user;
