use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tourist_place_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tourist_place_id: Uuid,
    pub image: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tourist_places::Entity",
        from = "Column::TouristPlaceId",
        to = "super::tourist_places::Column::Id"
    )]
    TouristPlaces,
}

impl Related<super::tourist_places::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TouristPlaces.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
