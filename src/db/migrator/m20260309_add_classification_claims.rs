use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClassificationClaims::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClassificationClaims::ArtistId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClassificationClaims::WorkerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassificationClaims::ClaimedAt)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClassificationClaims::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClassificationClaims {
    Table,
    ArtistId,
    WorkerId,
    ClaimedAt,
}
