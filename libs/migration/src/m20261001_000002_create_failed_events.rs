use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign key on user_id: user.deleted events outlive their user row
        manager
            .create_table(
                Table::create()
                    .table(FailedEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FailedEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(uuid(FailedEvents::EventId))
                    .col(string_len(FailedEvents::EventType, 64))
                    .col(uuid(FailedEvents::UserId))
                    .col(text(FailedEvents::Payload))
                    .col(text(FailedEvents::Error))
                    .col(integer(FailedEvents::Attempts))
                    .col(
                        timestamp_with_time_zone(FailedEvents::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone(FailedEvents::LastErrorAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_failed_events_created_at")
                    .table(FailedEvents::Table)
                    .col(FailedEvents::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FailedEvents::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum FailedEvents {
    Table,
    Id,
    EventId,
    EventType,
    UserId,
    Payload,
    Error,
    Attempts,
    CreatedAt,
    LastErrorAt,
}
