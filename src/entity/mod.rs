pub mod audit_logs;
pub mod businesses;
pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod cities;
pub mod events;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod regions;
pub mod reviews;
pub mod tourist_place_images;
pub mod tourist_places;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use businesses::Entity as Businesses;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use cities::Entity as Cities;
pub use events::Entity as Events;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use regions::Entity as Regions;
pub use reviews::Entity as Reviews;
pub use tourist_place_images::Entity as TouristPlaceImages;
pub use tourist_places::Entity as TouristPlaces;
pub use users::Entity as Users;
