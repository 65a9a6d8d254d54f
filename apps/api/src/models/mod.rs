// Database row types and wire payloads shared across handlers.

pub mod application;
pub mod job;
pub mod resume;
