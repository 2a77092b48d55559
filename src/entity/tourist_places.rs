use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tourist_places")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub city_id: Option<Uuid>,
    pub name: String,
    pub short_description: Option<String>,
    pub location_inside_city: Option<String>,
    pub distance_from_main_city: Option<String>,
    pub map_url: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cities::Entity",
        from = "Column::CityId",
        to = "super::cities::Column::Id"
    )]
    Cities,
    #[sea_orm(has_many = "super::tourist_place_images::Entity")]
    TouristPlaceImages,
}

impl Related<super::cities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cities.def()
    }
}

impl Related<super::tourist_place_images::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TouristPlaceImages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
