// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod credentials;
pub mod edge_auth;
pub mod http_response;
pub mod sigv4;
pub mod sitewise_http;
