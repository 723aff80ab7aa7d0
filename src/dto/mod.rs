/// Health check response.
pub mod health;
/// Navigation links attached to every returned record.
pub mod links;
/// Free-form JSON request bodies.
pub mod payload;
