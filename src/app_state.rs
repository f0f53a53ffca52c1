use std::sync::Arc;

use crate::config::{AppConfig, DeliveryMode};
use crate::storage::{ObjectStore, S3Store};
use crate::videogen::poller::PollPolicy;
use crate::videogen::veo::{VeoClient, VideoGenerator};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub generator: Arc<dyn VideoGenerator>,
    /// Absent when storage credentials are not configured
    pub store: Option<Arc<dyn ObjectStore>>,
    pub poll_policy: PollPolicy,
}

impl AppState {
    pub async fn new(app_config: AppConfig) -> Self {
        let generator = Arc::new(VeoClient::new(&app_config.veo));
        let store = init_object_store(&app_config).await;

        Self::with_clients(app_config, generator, store)
    }

    pub fn with_clients(
        app_config: AppConfig,
        generator: Arc<dyn VideoGenerator>,
        store: Option<Arc<dyn ObjectStore>>,
    ) -> Self {
        let poll_policy = app_config.poll.policy();
        AppState {
            config: app_config,
            generator,
            store,
            poll_policy,
        }
    }
}

async fn init_object_store(app_config: &AppConfig) -> Option<Arc<dyn ObjectStore>> {
    match S3Store::from_config(&app_config.storage).await {
        Some(store) => Some(Arc::new(store)),
        None => {
            if app_config.delivery.mode == DeliveryMode::ObjectStore {
                log::warn!(
                    "delivery mode is object_store but storage is not fully configured, uploads will fail"
                );
            }
            None
        }
    }
}
