pub mod assets;
pub mod discovery;
pub mod identity;
pub mod location;
pub mod publication;
pub mod reference;
pub mod supplier;
