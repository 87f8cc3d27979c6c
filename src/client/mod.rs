// File: ./src/client/mod.rs
// Asana REST client: TLS setup and the paginated read calls
pub mod cert;
pub mod core;

pub use self::core::{AsanaClient, DEFAULT_BASE_URL};
pub use crate::error::ApiError;
