pub mod prelude;

pub mod draws;
pub mod security_events;
pub mod users;
