use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "artists")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub name_ko: Option<String>,
    pub nationality: Option<String>,
    pub era: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub biography: Option<String>,
    #[sea_orm(default_value = 0)]
    pub follower_count: i32,
    #[sea_orm(default_value = false)]
    pub is_verified: bool,
    /// Versioned profile document; `None` means not yet classified.
    #[sea_orm(column_type = "Text", nullable)]
    pub apt_profile: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::artist_apt_mappings::Entity")]
    ArtistAptMappings,
}

impl Related<super::artist_apt_mappings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArtistAptMappings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
