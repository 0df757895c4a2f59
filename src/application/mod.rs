// Application layer - Query dispatch, framing and streaming
pub mod api;
pub mod framer;
pub mod paginator;
pub mod query_service;
pub mod resolution;
pub mod resource_cache;
pub mod resource_provider;
pub mod sitewise_client;
pub mod streaming_service;

#[cfg(test)]
pub mod testing;
