pub mod health_handlers;

pub use health_handlers::health_handler;
