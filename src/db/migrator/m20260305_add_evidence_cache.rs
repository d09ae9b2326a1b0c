use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EvidenceCache::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EvidenceCache::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EvidenceCache::Source).string().not_null())
                    .col(ColumnDef::new(EvidenceCache::LookupKey).string().not_null())
                    .col(ColumnDef::new(EvidenceCache::Payload).text().null())
                    .col(ColumnDef::new(EvidenceCache::FetchedAt).string().not_null())
                    .col(ColumnDef::new(EvidenceCache::ExpiresAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_evidence_cache_source_key")
                    .table(EvidenceCache::Table)
                    .col(EvidenceCache::Source)
                    .col(EvidenceCache::LookupKey)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EvidenceCache::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EvidenceCache {
    Table,
    Id,
    Source,
    LookupKey,
    Payload,
    FetchedAt,
    ExpiresAt,
}
