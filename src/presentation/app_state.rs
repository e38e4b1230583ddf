// Application state for HTTP handlers
use crate::application::command_service::CommandService;
use crate::application::sample_source::SourceRegistry;
use crate::application::streaming_service::StreamingInsightService;

#[derive(Clone)]
pub struct AppState {
    pub registry: SourceRegistry,
    pub streaming_service: StreamingInsightService,
    pub command_service: CommandService,
}
