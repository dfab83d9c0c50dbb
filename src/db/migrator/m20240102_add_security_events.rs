use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SecurityEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SecurityEvents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SecurityEvents::EventType).string().not_null())
                    .col(ColumnDef::new(SecurityEvents::UserId).integer().null())
                    .col(ColumnDef::new(SecurityEvents::Email).string().null())
                    .col(ColumnDef::new(SecurityEvents::Role).string().null())
                    .col(ColumnDef::new(SecurityEvents::Ip).string().null())
                    .col(ColumnDef::new(SecurityEvents::Message).string().not_null())
                    .col(
                        ColumnDef::new(SecurityEvents::CreatedAt)
                            .string()
                            .not_null()
                            .extra("DEFAULT CURRENT_TIMESTAMP".to_owned()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_security_events_created_at")
                    .table(SecurityEvents::Table)
                    .col(SecurityEvents::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SecurityEvents::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SecurityEvents {
    Table,
    Id,
    EventType,
    UserId,
    Email,
    Role,
    Ip,
    Message,
    CreatedAt,
}
