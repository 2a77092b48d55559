use chrono::Datelike;
use marketplace_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    services::auth_service::hash_password,
    slug::slugify,
};
use uuid::Uuid;

const REGION: &str = "Gilgit-Baltistan";

const CITIES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "Gilgit",
        "Regional capital on the Karakoram Highway.",
        "Naltar Valley, Kargah Buddha, Gilgit Bridge",
        "1500m",
        "April to October",
    ),
    (
        "Hunza",
        "Terraced valley under Rakaposhi and Ultar Sar.",
        "Baltit Fort, Altit Fort, Attabad Lake",
        "2438m",
        "April to October",
    ),
    (
        "Skardu",
        "Gateway to the Baltoro and the Deosai plains.",
        "Shangrila Lake, Deosai, Shigar Fort",
        "2228m",
        "May to September",
    ),
];

const CATEGORIES: &[&str] = &["Dry Fruits", "Handicrafts", "Gemstones"];

// (name, category, city, price, discount_price, stock)
const PRODUCTS: &[(&str, &str, &str, i64, Option<i64>, i32)] = &[
    ("Dried Apricots", "Dry Fruits", "Hunza", 1000, Some(800), 120),
    ("Mulberry Mix", "Dry Fruits", "Hunza", 650, None, 80),
    ("Hand-woven Shawl", "Handicrafts", "Gilgit", 4500, Some(3900), 15),
    ("Topaz Pendant", "Gemstones", "Skardu", 12000, None, 5),
];

// (title, city, type, month, day, location)
const EVENTS: &[(&str, &str, &str, u32, u32, &str)] = &[
    ("Shandur Polo Festival", "Gilgit", "sports_festival", 7, 7, "Shandur Pass"),
    ("Silk Route Festival", "Hunza", "cultural_festival", 10, 2, "Karimabad"),
    ("Cherry Blossom Walk", "Skardu", "natural_festival", 4, 10, "Shigar Valley"),
];

// (name, city, location, distance)
const TOURIST_PLACES: &[(&str, &str, &str, &str)] = &[
    ("Baltit Fort", "Hunza", "Karimabad", "2 km"),
    ("Attabad Lake", "Hunza", "Gojal", "25 km"),
    ("Shangrila Lake", "Skardu", "Lower Kachura", "25 km"),
    ("Kargah Buddha", "Gilgit", "Kargah Nullah", "10 km"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(&config.database_url).await?;

    let region_id = ensure_region(&pool, REGION).await?;
    for city in CITIES {
        ensure_city(&pool, region_id, city).await?;
    }
    for name in CATEGORIES {
        ensure_category(&pool, name).await?;
    }

    let seller_id = ensure_user(&pool, "hunza_store", "shop@example.com", "business_owner").await?;
    let tourist_id = ensure_user(&pool, "ali", "ali@example.com", "tourist").await?;
    seed_products(&pool, seller_id).await?;
    seed_travel(&pool).await?;
    seed_business(&pool, seller_id).await?;

    println!("Seed completed. Seller ID: {seller_id}, Tourist ID: {tourist_id}");
    Ok(())
}

async fn ensure_region(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO regions (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn ensure_city(
    pool: &sqlx::PgPool,
    region_id: Uuid,
    (name, description, highlights, altitude, best_time): &(&str, &str, &str, &str, &str),
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO cities (id, region_id, name, description, highlights, altitude, best_time_to_visit)
        SELECT $1, $2, $3, $4, $5, $6, $7
        WHERE NOT EXISTS (SELECT 1 FROM cities WHERE region_id = $2 AND name = $3)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(region_id)
    .bind(*name)
    .bind(*description)
    .bind(*highlights)
    .bind(*altitude)
    .bind(*best_time)
    .execute(pool)
    .await?;
    Ok(())
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO categories (id, name, slug)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slugify(name))
    .execute(pool)
    .await?;
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password("password123").map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {username} (role={role})");
    Ok(id)
}

async fn seed_products(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<()> {
    for (name, category, city, price, discount_price, stock) in PRODUCTS {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, owner_id, category_id, city_id, name, slug, price, discount_price, stock)
            VALUES (
                $1, $2,
                (SELECT id FROM categories WHERE name = $3),
                (SELECT id FROM cities WHERE name = $4 LIMIT 1),
                $5, $6, $7, $8, $9
            )
            ON CONFLICT (owner_id, slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(*category)
        .bind(*city)
        .bind(*name)
        .bind(slugify(name))
        .bind(*price)
        .bind(*discount_price)
        .bind(*stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_travel(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let year = chrono::Utc::now().year() + 1;
    for (title, city, kind, month, day, location) in EVENTS {
        let date = chrono::NaiveDate::from_ymd_opt(year, *month, *day)
            .ok_or_else(|| anyhow::anyhow!("invalid event date for {title}"))?;
        sqlx::query(
            r#"
            INSERT INTO events (id, city_id, title, description, event_type, date, location)
            SELECT $1, c.id, $3, $4, $5, $6, $7
            FROM cities c
            WHERE c.name = $2
              AND NOT EXISTS (SELECT 1 FROM events WHERE title = $3)
            LIMIT 1
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(*city)
        .bind(*title)
        .bind(format!("{title} in {location}."))
        .bind(*kind)
        .bind(date)
        .bind(*location)
        .execute(pool)
        .await?;
    }

    for (name, city, location, distance) in TOURIST_PLACES {
        sqlx::query(
            r#"
            INSERT INTO tourist_places (id, city_id, name, location_inside_city, distance_from_main_city)
            SELECT $1, c.id, $3, $4, $5
            FROM cities c
            WHERE c.name = $2
              AND NOT EXISTS (SELECT 1 FROM tourist_places WHERE name = $3)
            LIMIT 1
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(*city)
        .bind(*name)
        .bind(*location)
        .bind(*distance)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_business(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO businesses (id, owner_id, city_id, name, business_type, location_inside_city,
                                room_available, amenities, whatsapp_number)
        SELECT $1, $2, c.id, 'Eagle Nest Guest House', 'hotel', 'Duikar', TRUE, $3::jsonb, '+923551234567'
        FROM cities c
        WHERE c.name = 'Hunza'
          AND NOT EXISTS (SELECT 1 FROM businesses WHERE owner_id = $2 AND name = 'Eagle Nest Guest House')
        LIMIT 1
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(serde_json::json!(["Wifi", "Parking", "Sunrise view"]).to_string())
    .execute(pool)
    .await?;
    Ok(())
}
