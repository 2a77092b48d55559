//! Read-only travel catalog: regions, cities, events and tourist places.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::{
        catalog::{CityList, CityQuery, RegionList},
        directory::{EventList, EventQuery, TouristPlaceList, TouristPlaceQuery},
    },
    entity::{
        cities::{Column as CityCol, Entity as Cities, Model as CityModel},
        events::{Column as EventCol, Entity as Events, Model as EventModel},
        regions::{Column as RegionCol, Entity as Regions},
        tourist_place_images::{Column as PlaceImageCol, Entity as TouristPlaceImages},
        tourist_places::{Column as PlaceCol, Entity as TouristPlaces, Model as PlaceModel},
    },
    error::{AppError, AppResult},
    models::{City, Event, EventType, Region, TouristPlace},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_regions(state: &AppState) -> AppResult<ApiResponse<RegionList>> {
    let items: Vec<Region> = Regions::find()
        .order_by_asc(RegionCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|r| Region {
            id: r.id,
            name: r.name,
        })
        .collect();
    let total = items.len() as i64;

    Ok(ApiResponse::success(
        "Regions",
        RegionList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn list_cities(state: &AppState, query: CityQuery) -> AppResult<ApiResponse<CityList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut finder = Cities::find().order_by_asc(CityCol::Name);
    if let Some(region_id) = query.region_id {
        finder = finder.filter(CityCol::RegionId.eq(region_id));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let region_ids: Vec<Uuid> = models.iter().map(|c| c.region_id).collect();
    let regions: HashMap<Uuid, String> = Regions::find()
        .filter(RegionCol::Id.is_in(region_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect();

    let items = models
        .into_iter()
        .map(|model| {
            let region = regions.get(&model.region_id).cloned();
            city_from_entity(model, region)
        })
        .collect();

    Ok(ApiResponse::success(
        "Cities",
        CityList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_city(state: &AppState, id: Uuid) -> AppResult<ApiResponse<City>> {
    let (city, region) = Cities::find_by_id(id)
        .find_also_related(Regions)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".into()))?;

    Ok(ApiResponse::success(
        "City",
        city_from_entity(city, region.map(|r| r.name)),
        None,
    ))
}

/// Events newest first, or with `upcoming` only those after today, soonest first.
pub async fn list_events(state: &AppState, query: EventQuery) -> AppResult<ApiResponse<EventList>> {
    let mut condition = Condition::all();
    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(EventCol::Title).ilike(pattern.clone()))
                .add(Expr::col(EventCol::Description).ilike(pattern.clone()))
                .add(Expr::col(EventCol::Location).ilike(pattern)),
        );
    }
    if let Some(city_id) = query.city_id {
        condition = condition.add(EventCol::CityId.eq(city_id));
    }
    if let Some(kind) = query.event_type {
        condition = condition.add(EventCol::EventType.eq(kind.as_str()));
    }

    let mut finder = Events::find();
    if query.upcoming.unwrap_or(false) {
        condition = condition.add(EventCol::Date.gt(Utc::now().date_naive()));
        finder = finder.order_by_asc(EventCol::Date);
    } else {
        finder = finder.order_by_desc(EventCol::Date);
    }
    let finder = finder.filter(condition);

    let (page, limit, offset) = query.pagination().normalize();
    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let names = city_names(&state.orm, models.iter().map(|e| e.city_id)).await?;
    let items = models
        .into_iter()
        .map(|model| {
            let city = names.get(&model.city_id).cloned();
            event_from_entity(model, city)
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Events",
        EventList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_event(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Event>> {
    let (event, city) = Events::find_by_id(id)
        .find_also_related(Cities)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;

    Ok(ApiResponse::success(
        "Event",
        event_from_entity(event, city.map(|c| c.name))?,
        None,
    ))
}

pub async fn list_tourist_places(
    state: &AppState,
    query: TouristPlaceQuery,
) -> AppResult<ApiResponse<TouristPlaceList>> {
    let mut condition = Condition::all();
    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(PlaceCol::Name).ilike(pattern.clone()))
                .add(Expr::col(PlaceCol::LocationInsideCity).ilike(pattern.clone()))
                .add(Expr::col(PlaceCol::ShortDescription).ilike(pattern)),
        );
    }
    if let Some(city_id) = query.city_id {
        condition = condition.add(PlaceCol::CityId.eq(city_id));
    }
    let finder = TouristPlaces::find()
        .filter(condition)
        .order_by_asc(PlaceCol::Name);

    let (page, limit, offset) = query.pagination().normalize();
    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = load_tourist_places(&state.orm, models).await?;

    let message = if total == 0 {
        "No tourist places found"
    } else {
        "Tourist places"
    };
    Ok(ApiResponse::success(
        message,
        TouristPlaceList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_tourist_place(state: &AppState, id: Uuid) -> AppResult<ApiResponse<TouristPlace>> {
    let model = TouristPlaces::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Tourist place not found".into()))?;
    let place = load_tourist_places(&state.orm, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("tourist place vanished while loading")))?;
    Ok(ApiResponse::success("Tourist place", place, None))
}

/// City names for a batch of ids, one query.
pub async fn city_names<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, String>, DbErr> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(Cities::find()
        .filter(CityCol::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

async fn load_tourist_places<C: ConnectionTrait>(
    db: &C,
    models: Vec<PlaceModel>,
) -> AppResult<Vec<TouristPlace>> {
    let names = city_names(db, models.iter().filter_map(|p| p.city_id)).await?;
    let place_ids: Vec<Uuid> = models.iter().map(|p| p.id).collect();
    let mut images: HashMap<Uuid, Vec<String>> = HashMap::new();
    if !place_ids.is_empty() {
        for image in TouristPlaceImages::find()
            .filter(PlaceImageCol::TouristPlaceId.is_in(place_ids))
            .order_by_asc(PlaceImageCol::CreatedAt)
            .all(db)
            .await?
        {
            images
                .entry(image.tourist_place_id)
                .or_default()
                .push(image.image);
        }
    }

    Ok(models
        .into_iter()
        .map(|model| TouristPlace {
            city: model.city_id.and_then(|id| names.get(&id).cloned()),
            extra_images: images.remove(&model.id).unwrap_or_default(),
            id: model.id,
            city_id: model.city_id,
            name: model.name,
            short_description: model.short_description,
            location_inside_city: model.location_inside_city,
            distance_from_main_city: model.distance_from_main_city,
            map_url: model.map_url,
            image: model.image,
            created_at: model.created_at.with_timezone(&Utc),
        })
        .collect())
}

fn event_from_entity(model: EventModel, city: Option<String>) -> AppResult<Event> {
    let event_type = model
        .event_type
        .parse::<EventType>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(Event {
        id: model.id,
        city_id: model.city_id,
        city,
        title: model.title,
        description: model.description,
        event_type,
        date: model.date,
        location: model.location,
        image: model.image,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn split_highlights(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect()
}

fn city_from_entity(model: CityModel, region: Option<String>) -> City {
    City {
        id: model.id,
        region_id: model.region_id,
        region,
        highlights: split_highlights(model.highlights.as_deref()),
        name: model.name,
        description: model.description,
        altitude: model.altitude,
        best_time_to_visit: model.best_time_to_visit,
        image: model.image,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            split_highlights(Some(" Rakaposhi View, Baltit Fort ,, Attabad Lake")),
            vec!["Rakaposhi View", "Baltit Fort", "Attabad Lake"]
        );
        assert!(split_highlights(None).is_empty());
    }

    #[test]
    fn stored_event_type_is_checked() {
        let event = EventModel {
            id: Uuid::new_v4(),
            city_id: Uuid::new_v4(),
            title: "Shandur Polo Festival".into(),
            description: String::new(),
            event_type: "sports_festival".into(),
            date: chrono::NaiveDate::from_ymd_opt(2026, 7, 7).unwrap(),
            location: "Shandur Pass".into(),
            image: None,
            created_at: Utc::now().into(),
        };
        let parsed = event_from_entity(event.clone(), Some("Gilgit".into())).unwrap();
        assert_eq!(parsed.event_type, EventType::SportsFestival);

        let broken = EventModel {
            event_type: "concert".into(),
            ..event
        };
        assert!(event_from_entity(broken, None).is_err());
    }
}
