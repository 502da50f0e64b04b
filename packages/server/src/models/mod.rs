pub mod auth;
pub mod publication;
pub mod reference;
pub mod shared;
pub mod supplier;
