pub mod category;
pub mod country;
pub mod image_asset;
pub mod province;
pub mod publication;
pub mod supplier;
pub mod user;
