use crate::entities::{prelude::*, security_events};
use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

pub use crate::entities::security_events::Model as SecurityEventRow;

/// Row to append to the security trail.
#[derive(Debug, Clone, Default)]
pub struct NewSecurityEvent {
    pub event_type: String,
    pub user_id: Option<i32>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub ip: Option<String>,
    pub message: String,
}

pub struct SecurityEventRepository {
    conn: DatabaseConnection,
}

impl SecurityEventRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(&self, event: NewSecurityEvent) -> Result<()> {
        let active_model = security_events::ActiveModel {
            event_type: Set(event.event_type),
            user_id: Set(event.user_id),
            email: Set(event.email),
            role: Set(event.role),
            ip: Set(event.ip),
            message: Set(event.message),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        SecurityEvents::insert(active_model).exec(&self.conn).await?;
        Ok(())
    }

    /// Newest first.
    pub async fn recent(&self, limit: u64) -> Result<Vec<SecurityEventRow>> {
        let items = SecurityEvents::find()
            .order_by_desc(security_events::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;
        Ok(items)
    }

    pub async fn by_type(&self, event_type: &str) -> Result<Vec<SecurityEventRow>> {
        let items = SecurityEvents::find()
            .filter(security_events::Column::EventType.eq(event_type))
            .order_by_desc(security_events::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(items)
    }
}
