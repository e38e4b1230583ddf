// Application layer - Use cases over the domain models
pub mod command_service;
pub mod decomposer;
pub mod insight_session;
pub mod sample_source;
pub mod series_store;
pub mod streaming_service;
