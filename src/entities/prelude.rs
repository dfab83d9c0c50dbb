pub use super::draws::Entity as Draws;
pub use super::security_events::Entity as SecurityEvents;
pub use super::users::Entity as Users;
