pub mod storage;
pub mod supplier_status;
pub mod user_role;

pub use supplier_status::SupplierStatus;
pub use user_role::UserRole;
