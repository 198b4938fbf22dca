pub mod handlers;
pub mod relay;
pub mod router;
