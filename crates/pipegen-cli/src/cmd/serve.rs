use anyhow::Context;
use pipegen_core::{CompletionBackend, Config};
use pipegen_server::AppState;
use std::sync::Arc;

pub fn run(
    config: &Config,
    backend: Arc<dyn CompletionBackend>,
    bind: &str,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let port = port.unwrap_or(config.server.port);
    let ttl = i64::try_from(config.server.session_ttl_minutes)
        .ok()
        .and_then(chrono::Duration::try_minutes)
        .context("server.session_ttl_minutes is too large")?;
    let state = AppState::new(backend, config.prompts.clone(), ttl);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(pipegen_server::serve(state, bind, port))
}
