use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
            ResetPasswordRequest, UpdateProfileRequest,
        },
        cart::{AddToCartRequest, RemoveFromCartRequest},
        catalog::{CityList, RegionList},
        directory::{
            BusinessList, CreateBusinessRequest, EventList, TouristPlaceList,
            UpdateBusinessRequest,
        },
        orders::{
            CheckoutResponse, ConfirmOrderRequest, CreateOrderRequest, OrderList,
            OrderStatusResponse,
        },
        products::{CategoryList, CategoryRequest, CreateProductRequest, ProductList, UpdateProductRequest},
        reviews::{CreateReviewRequest, ReviewList},
    },
    error::ErrorBody,
    models::{
        Business, BusinessType, Cart, CartItem, Category, City, Event, EventType, Order, OrderItem,
        Product, Region, Review, Role, TouristPlace, User,
    },
    order_status::OrderStatus,
    response::{ApiResponse, Meta},
    routes::{
        auth, businesses, cart, catalog, categories, health, orders, params, products, reviews,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        auth::update_me,
        auth::forgot_password,
        auth::reset_password,
        catalog::list_regions,
        catalog::list_cities,
        catalog::get_city,
        catalog::list_events,
        catalog::get_event,
        catalog::list_tourist_places,
        catalog::get_tourist_place,
        businesses::list_businesses,
        businesses::my_businesses,
        businesses::get_business,
        businesses::create_business,
        businesses::update_business,
        businesses::delete_business,
        categories::list_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::my_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        reviews::list_reviews,
        reviews::create_review,
        reviews::delete_review,
        cart::get_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::my_orders,
        orders::seller_orders,
        orders::get_order,
        orders::confirm_order,
        orders::cancel_order,
        orders::delete_order
    ),
    components(
        schemas(
            User,
            Role,
            Region,
            City,
            Event,
            EventType,
            TouristPlace,
            Business,
            BusinessType,
            Category,
            Product,
            Review,
            Cart,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            AddToCartRequest,
            RemoveFromCartRequest,
            CreateProductRequest,
            UpdateProductRequest,
            CategoryRequest,
            CreateReviewRequest,
            CreateOrderRequest,
            ConfirmOrderRequest,
            CheckoutResponse,
            OrderStatusResponse,
            RegionList,
            CityList,
            EventList,
            TouristPlaceList,
            BusinessList,
            CreateBusinessRequest,
            UpdateBusinessRequest,
            CategoryList,
            ProductList,
            ReviewList,
            OrderList,
            params::Pagination,
            params::ProductQuery,
            ErrorBody,
            Meta,
            ApiResponse<User>,
            ApiResponse<Business>,
            ApiResponse<BusinessList>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Cart>,
            ApiResponse<Order>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and password reset"),
        (name = "Catalog", description = "Regions, cities, events and tourist places"),
        (name = "Businesses", description = "Restaurant, hotel and cafe directory"),
        (name = "Categories", description = "Product categories"),
        (name = "Products", description = "Product endpoints"),
        (name = "Reviews", description = "Product reviews"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order workflow"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
