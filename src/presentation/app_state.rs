// Application state for HTTP handlers
use std::sync::Arc;

use crate::application::query_service::QueryService;
use crate::application::streaming_service::StreamingService;

#[derive(Clone)]
pub struct AppState {
    pub query_service: Arc<QueryService>,
    pub streaming_service: StreamingService,
}
