use std::sync::Arc;

use gly_adapters::shared::loader_deps::default_loader_service;
use gly_application::{
    config::LoaderSettings, infrastructure_config::Config, loader::service::LoaderService,
};

#[derive(Clone)]
pub struct CliState {
    pub config: Arc<Config>,
    pub loader_service: LoaderService,
}

impl CliState {
    pub fn new(config: Config) -> Self {
        let settings = LoaderSettings::from(&config.loader);

        Self {
            config: Arc::new(config),
            loader_service: default_loader_service(settings),
        }
    }
}
