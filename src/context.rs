use std::path::Path;

use anyhow::Context as _;
use log::debug;

use crate::{config::Config, renderer::Templates};

/// Everything a generation run needs before it touches any post.
#[derive(Debug)]
pub(crate) struct Context {
    pub config: Config,
    pub templates: Templates,
}

impl Context {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let config = Config::load(config_path)?;
        debug!("Loaded config {config:?}");
        let templates = Templates::load(&config.templates)
            .with_context(|| format!("while loading templates from {:?}", config.templates))?;
        Ok(Self { config, templates })
    }
}
