pub mod models;
pub mod operations;

pub use models::User;
pub use operations::UserOps;
