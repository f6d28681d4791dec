use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickets::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tickets::Title).string().not_null())
                    .col(ColumnDef::new(Tickets::Description).text())
                    .col(
                        ColumnDef::new(Tickets::Status)
                            .string_len(20)
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        ColumnDef::new(Tickets::Priority)
                            .string_len(20)
                            .not_null()
                            .default("normal"),
                    )
                    .col(ColumnDef::new(Tickets::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(Tickets::AssignedTo).uuid())
                    .col(ColumnDef::new(Tickets::SlaSeconds).big_integer().not_null())
                    .col(
                        ColumnDef::new(Tickets::SlaDueAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tickets::Version)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Tickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Role-scoped listings filter on these two columns
        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_created_by")
                    .table(Tickets::Table)
                    .col(Tickets::CreatedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_assigned_to")
                    .table(Tickets::Table)
                    .col(Tickets::AssignedTo)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_status_due")
                    .table(Tickets::Table)
                    .col(Tickets::Status)
                    .col(Tickets::SlaDueAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tickets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    Title,
    Description,
    Status,
    Priority,
    CreatedBy,
    AssignedTo,
    SlaSeconds,
    SlaDueAt,
    Version,
    CreatedAt,
}
