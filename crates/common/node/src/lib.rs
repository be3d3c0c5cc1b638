pub mod mock;
pub mod services;
pub mod version;

pub use services::ServiceProvider;
