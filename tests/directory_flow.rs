mod common;

use chrono::{Duration, Utc};
use marketplace_api::{
    dto::directory::{
        BusinessQuery, CreateBusinessRequest, EventQuery, TouristPlaceQuery, UpdateBusinessRequest,
    },
    entity::{
        events::ActiveModel as EventActive, tourist_place_images::ActiveModel as PlaceImageActive,
        tourist_places::ActiveModel as PlaceActive,
    },
    error::AppError,
    models::{BusinessType, EventType, Role},
    routes::params::Pagination,
    services::{catalog_service, directory_service},
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use common::{create_city, create_user, setup};

fn guest_house(name: &str, city_id: Option<Uuid>) -> CreateBusinessRequest {
    CreateBusinessRequest {
        name: name.into(),
        business_type: Some(BusinessType::Hotel),
        city_id,
        location_inside_city: Some("Karimabad".into()),
        description: None,
        is_active: None,
        room_available: Some(true),
        contacts_and_hours: Some(vec!["8am-11pm".into(), " ".into()]),
        amenities: Some(vec!["Wifi".into(), "Parking".into()]),
        get_direction: None,
        whatsapp_number: Some("+92 355 1234567".into()),
        image: None,
    }
}

#[tokio::test]
async fn business_owners_manage_their_own_listings() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let city = create_city(state, "Hunza").await?;
    let (_, tourist) = create_user(state, Role::Tourist).await?;
    let (_, owner) = create_user(state, Role::BusinessOwner).await?;
    let (_, rival) = create_user(state, Role::BusinessOwner).await?;

    let err = directory_service::create_business(state, &tourist, guest_house("Eagle Nest", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = directory_service::create_business(state, &owner, guest_house("  ", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err =
        directory_service::create_business(state, &owner, guest_house("Eagle Nest", Some(Uuid::new_v4())))
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let created =
        directory_service::create_business(state, &owner, guest_house("Eagle Nest", Some(city.id)))
            .await?
            .data
            .expect("business");
    assert_eq!(created.city.as_deref(), Some("Hunza"));
    assert_eq!(created.business_type, BusinessType::Hotel);
    assert_eq!(created.contacts_and_hours, vec!["8am-11pm"]);
    assert_eq!(created.whatsapp_link.as_deref(), Some("https://wa.me/923551234567"));
    assert!(created.is_active);

    let in_city = directory_service::list_businesses(
        state,
        BusinessQuery {
            city_id: Some(city.id),
            ..Default::default()
        },
    )
    .await?;
    let in_city = in_city.data.map(|l| l.items).unwrap_or_default();
    assert_eq!(in_city.len(), 1);
    assert_eq!(in_city[0].id, created.id);

    let mine = directory_service::my_businesses(state, &owner, Pagination::default()).await?;
    assert_eq!(mine.meta.and_then(|m| m.total), Some(1));
    let theirs = directory_service::my_businesses(state, &rival, Pagination::default()).await?;
    assert_eq!(theirs.meta.and_then(|m| m.total), Some(0));

    let rename = || UpdateBusinessRequest {
        name: Some("Eagle Nest Hotel".into()),
        room_available: Some(false),
        ..Default::default()
    };
    let err = directory_service::update_business(state, &rival, created.id, rename())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = directory_service::delete_business(state, &rival, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let updated = directory_service::update_business(state, &owner, created.id, rename())
        .await?
        .data
        .expect("business");
    assert_eq!(updated.name, "Eagle Nest Hotel");
    assert!(!updated.room_available);
    assert_eq!(updated.amenities, vec!["Wifi", "Parking"]);

    directory_service::delete_business(state, &owner, created.id).await?;
    let err = directory_service::get_business(state, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn upcoming_events_are_future_and_soonest_first() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let city = create_city(state, "Gilgit").await?;
    let today = Utc::now().date_naive();
    for (title, offset) in [("Past Fair", -30), ("Polo Final", 60), ("Apricot Bloom", 10)] {
        EventActive {
            id: Set(Uuid::new_v4()),
            city_id: Set(city.id),
            title: Set(title.into()),
            description: Set(String::new()),
            event_type: Set(EventType::CulturalFestival.as_str().into()),
            date: Set(today + Duration::days(offset)),
            location: Set("Gilgit".into()),
            image: Set(None),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?;
    }

    let all = catalog_service::list_events(
        state,
        EventQuery {
            city_id: Some(city.id),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(all.meta.and_then(|m| m.total), Some(3));

    let upcoming = catalog_service::list_events(
        state,
        EventQuery {
            city_id: Some(city.id),
            upcoming: Some(true),
            ..Default::default()
        },
    )
    .await?;
    let titles: Vec<String> = upcoming
        .data
        .map(|l| l.items.into_iter().map(|e| e.title).collect())
        .unwrap_or_default();
    assert_eq!(titles, vec!["Apricot Bloom", "Polo Final"]);

    let err = catalog_service::get_event(state, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn tourist_places_carry_their_extra_images() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let city = create_city(state, "Skardu").await?;
    let place = PlaceActive {
        id: Set(Uuid::new_v4()),
        city_id: Set(Some(city.id)),
        name: Set("Shangrila Lake".into()),
        short_description: Set(Some("Heart shaped lake".into())),
        location_inside_city: Set(Some("Lower Kachura".into())),
        distance_from_main_city: Set(Some("25 km".into())),
        map_url: Set(None),
        image: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    for image in ["uploads/touristplaces/extra/a.jpg", "uploads/touristplaces/extra/b.jpg"] {
        PlaceImageActive {
            id: Set(Uuid::new_v4()),
            tourist_place_id: Set(place.id),
            image: Set(image.into()),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?;
    }

    let listed = catalog_service::list_tourist_places(
        state,
        TouristPlaceQuery {
            city_id: Some(city.id),
            q: Some("kachura".into()),
            ..Default::default()
        },
    )
    .await?;
    let items = listed.data.map(|l| l.items).unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].city.as_deref(), Some("Skardu"));
    assert_eq!(items[0].extra_images.len(), 2);

    let detail = catalog_service::get_tourist_place(state, place.id)
        .await?
        .data
        .expect("tourist place");
    assert_eq!(detail.name, "Shangrila Lake");

    let empty = catalog_service::list_tourist_places(
        state,
        TouristPlaceQuery {
            city_id: Some(city.id),
            q: Some("glacier".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(empty.message, "No tourist places found");

    Ok(())
}
