pub mod auth;
pub mod discovery;
pub mod multipart;
pub mod publication;
pub mod reference;
pub mod supplier;
