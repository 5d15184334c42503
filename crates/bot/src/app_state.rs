use std::sync::Arc;

use paginator::Paginator;
use shared::protocol::PlatformEvent;
use tokio::sync::broadcast;

use crate::{config::Settings, platform::InMemoryPlatform};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) paginator: Paginator,
    pub(crate) platform: Arc<InMemoryPlatform>,
    pub(crate) events: broadcast::Sender<PlatformEvent>,
    pub(crate) default_per_page: usize,
}

impl AppState {
    pub(crate) fn new(settings: &Settings) -> Self {
        let (events, _) = broadcast::channel(settings.event_buffer);
        let platform = Arc::new(InMemoryPlatform::new(events.clone()));
        let paginator = Paginator::new(platform.clone(), settings.paginator.to_config());
        Self {
            paginator,
            platform,
            events,
            default_per_page: settings.paginator.per_page,
        }
    }
}
