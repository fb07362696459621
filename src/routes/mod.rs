pub mod admin;
pub mod health;
pub mod objects;
pub mod share;

pub use admin::{admin_stats, provision_caller};
pub use health::health_check;
pub use objects::get_object;
pub use share::{create_share, redeem_share};
