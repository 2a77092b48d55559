mod common;

use marketplace_api::{
    dto::{
        products::{CreateProductRequest, UpdateProductRequest},
        reviews::CreateReviewRequest,
    },
    error::AppError,
    models::Role,
    routes::params::Pagination,
    services::{product_service, review_service},
};

use common::{create_product, create_user, setup};

fn new_product(name: &str, price: i64, discount_price: Option<i64>) -> CreateProductRequest {
    CreateProductRequest {
        name: name.into(),
        description: Some("Sun-dried in Karimabad".into()),
        price,
        discount_price,
        stock: Some(20),
        is_available: None,
        image: None,
        category_id: None,
        city_id: None,
    }
}

fn review(rating: i16) -> CreateReviewRequest {
    CreateReviewRequest {
        rating,
        comment: Some("Sweet and fresh".into()),
    }
}

#[tokio::test]
async fn only_business_owners_list_products() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (_, tourist) = create_user(state, Role::Tourist).await?;
    let err = product_service::create_product(state, &tourist, new_product("Apricots", 1000, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let (_, owner) = create_user(state, Role::BusinessOwner).await?;
    let created =
        product_service::create_product(state, &owner, new_product("Dried Apricots", 1000, Some(800)))
            .await?
            .data
            .expect("product");
    assert_eq!(created.slug, "dried-apricots");
    assert_eq!(created.effective_price, 800);
    assert_eq!(created.discount_percentage, 20);
    assert!(created.is_available);

    let err = product_service::create_product(state, &owner, new_product("Bad", 100, Some(200)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn slugs_are_unique_per_owner() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (_, owner) = create_user(state, Role::BusinessOwner).await?;
    let (_, other) = create_user(state, Role::BusinessOwner).await?;

    let mut slugs = Vec::new();
    for _ in 0..3 {
        let product =
            product_service::create_product(state, &owner, new_product("Mulberry Mix", 650, None))
                .await?
                .data
                .expect("product");
        slugs.push(product.slug);
    }
    assert_eq!(slugs, vec!["mulberry-mix", "mulberry-mix-1", "mulberry-mix-2"]);

    let elsewhere =
        product_service::create_product(state, &other, new_product("Mulberry Mix", 650, None))
            .await?
            .data
            .expect("product");
    assert_eq!(elsewhere.slug, "mulberry-mix");

    Ok(())
}

#[tokio::test]
async fn products_are_changed_by_their_owner_only() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (owner_model, owner) = create_user(state, Role::BusinessOwner).await?;
    let (_, rival) = create_user(state, Role::BusinessOwner).await?;
    let product = create_product(state, &owner_model, "Topaz Pendant", 12000, None).await?;

    let update = || UpdateProductRequest {
        name: Some("Blue Topaz Pendant".into()),
        description: None,
        price: Some(11000),
        discount_price: None,
        stock: None,
        is_available: None,
        image: None,
        category_id: None,
        city_id: None,
    };

    let err = product_service::update_product(state, &rival, product.id, update())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = product_service::delete_product(state, &rival, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let updated = product_service::update_product(state, &owner, product.id, update())
        .await?
        .data
        .expect("product");
    assert_eq!(updated.name, "Blue Topaz Pendant");
    assert_eq!(updated.price, 11000);
    // Renaming keeps the original slug.
    assert_eq!(updated.slug, "topaz-pendant");

    product_service::delete_product(state, &owner, product.id).await?;
    let err = product_service::get_product(state, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn discount_can_be_removed() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (owner_model, owner) = create_user(state, Role::BusinessOwner).await?;
    let product = create_product(state, &owner_model, "Dried Apricots", 1000, Some(800)).await?;

    let reprice = |discount_price| UpdateProductRequest {
        name: None,
        description: None,
        price: Some(500),
        discount_price,
        stock: None,
        is_available: None,
        image: None,
        category_id: None,
        city_id: None,
    };

    // Leaving the discount out keeps 800, which is above the new price.
    let err = product_service::update_product(state, &owner, product.id, reprice(None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let updated = product_service::update_product(state, &owner, product.id, reprice(Some(None)))
        .await?
        .data
        .expect("product");
    assert_eq!(updated.discount_price, None);
    assert_eq!(updated.effective_price, 500);
    assert_eq!(updated.discount_percentage, 0);

    Ok(())
}

#[tokio::test]
async fn one_review_per_user_and_product() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (owner, _) = create_user(state, Role::BusinessOwner).await?;
    let (_, author) = create_user(state, Role::Tourist).await?;
    let (_, other) = create_user(state, Role::Tourist).await?;
    let product = create_product(state, &owner, "Dried Apricots", 1000, None).await?;

    let err = review_service::create_review(state, &author, product.id, review(6))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let created = review_service::create_review(state, &author, product.id, review(5))
        .await?
        .data
        .expect("review");
    assert_eq!(created.rating, 5);

    let err = review_service::create_review(state, &author, product.id, review(4))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let detail = product_service::get_product(state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(detail.reviews_count, 1);

    let listed = review_service::list_reviews(state, product.id, Pagination::default()).await?;
    assert_eq!(listed.meta.and_then(|m| m.total), Some(1));

    let err = review_service::delete_review(state, &other, product.id, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    review_service::delete_review(state, &author, product.id, created.id).await?;

    let detail = product_service::get_product(state, product.id)
        .await?
        .data
        .expect("product");
    assert_eq!(detail.reviews_count, 0);

    Ok(())
}
