//! `deck board`: the interactive TUI.

use std::sync::Arc;

use crate::api::{HttpTaskApi, TaskApi};
use crate::config::Config;
use crate::error::Result;

pub fn run(config: Config) -> Result<()> {
    let api: Arc<dyn TaskApi> = Arc::new(HttpTaskApi::new(&config.api)?);
    crate::ui::board::run(api, config)
}
