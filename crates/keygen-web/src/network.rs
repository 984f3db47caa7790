//! HTTP client for the key generation service and the generate/download glue

use bevy::prelude::*;
use keygen_core::{
    GenerateError, GenerateResponse, GenerationController, KeyService, ModelError, ServiceConfig,
};
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::app::Generation;
use crate::models::LoadModel;

pub struct NetworkPlugin;

/// User pressed the generate action
#[derive(Message, Debug, Clone, Copy)]
pub struct GenerateRequested;

/// User pressed the download action
#[derive(Message, Debug, Clone, Copy)]
pub struct DownloadRequested;

/// Generation outcomes delivered by async requests, drained each frame
#[derive(Resource, Default)]
pub struct PendingGeneration(pub Arc<Mutex<Vec<Result<GenerateResponse, GenerateError>>>>);

impl Plugin for NetworkPlugin {
    fn build(&self, app: &mut App) {
        let config = service_config_from_browser();
        tracing::info!("Key service at {}", config.http_url);

        app.insert_resource(Generation(GenerationController::new(config)))
            .init_resource::<PendingGeneration>()
            .add_message::<GenerateRequested>()
            .add_message::<DownloadRequested>()
            .add_systems(
                Update,
                (
                    handle_generate_requests,
                    process_generation_results,
                    handle_download_requests,
                ),
            );
    }
}

/// Query string of the current page ("?api=..."), if running in a browser
#[cfg(target_arch = "wasm32")]
pub fn page_search() -> Option<String> {
    web_sys::window().and_then(|w| w.location().search().ok())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn page_search() -> Option<String> {
    None
}

/// Create config from URL query parameters or same-origin fallback
#[cfg(target_arch = "wasm32")]
pub fn service_config_from_browser() -> ServiceConfig {
    let Some(window) = web_sys::window() else {
        return ServiceConfig::default();
    };
    let location = window.location();
    let search = location.search().unwrap_or_default();
    let origin = location.origin().unwrap_or_default();
    ServiceConfig::from_page(&search, &origin)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn service_config_from_browser() -> ServiceConfig {
    ServiceConfig::default()
}

/// `fetch`-backed client for the generation service
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpKeyService;

#[cfg(target_arch = "wasm32")]
impl KeyService for HttpKeyService {
    async fn generate(&self, url: &str) -> Result<GenerateResponse, GenerateError> {
        let response = gloo_net::http::Request::post(url)
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        if !response.ok() {
            return Err(GenerateError::Status(response.status()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| GenerateError::Parse(e.to_string()))?;
        GenerateResponse::from_json(&text)
    }

    async fn fetch_model(&self, url: &str) -> Result<Vec<u8>, ModelError> {
        let response = gloo_net::http::Request::get(url)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        if !response.ok() {
            return Err(ModelError::Status(response.status()));
        }

        response
            .binary()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyService for HttpKeyService {
    async fn generate(&self, _url: &str) -> Result<GenerateResponse, GenerateError> {
        Err(GenerateError::Transport(
            "HTTP client is only available in the browser".to_string(),
        ))
    }

    async fn fetch_model(&self, _url: &str) -> Result<Vec<u8>, ModelError> {
        Err(ModelError::Transport(
            "HTTP client is only available in the browser".to_string(),
        ))
    }
}

/// Run a future on the page's event loop without blocking the frame
#[cfg(target_arch = "wasm32")]
pub fn spawn_task<F: Future<Output = ()> + 'static>(f: F) {
    wasm_bindgen_futures::spawn_local(f);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_task<F: Future<Output = ()> + 'static>(f: F) {
    bevy::tasks::block_on(f);
}

fn handle_generate_requests(
    mut requests: MessageReader<GenerateRequested>,
    mut generation: ResMut<Generation>,
    pending: Res<PendingGeneration>,
) {
    for _ in requests.read() {
        let url = match generation.0.begin() {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("{}", e);
                continue;
            }
        };

        tracing::info!("Requesting key generation: {}", url);
        let queue = pending.0.clone();
        spawn_task(async move {
            let outcome = HttpKeyService.generate(&url).await;
            if let Ok(mut queue) = queue.lock() {
                queue.push(outcome);
            }
        });
    }
}

fn process_generation_results(
    mut generation: ResMut<Generation>,
    pending: Res<PendingGeneration>,
    mut loads: MessageWriter<LoadModel>,
) {
    let outcomes = match pending.0.try_lock() {
        Ok(mut queue) if !queue.is_empty() => std::mem::take(&mut *queue),
        _ => return,
    };

    for outcome in outcomes {
        if let Some(request) = generation.0.finish(outcome) {
            loads.write(LoadModel { url: request.url });
        }
    }
}

fn handle_download_requests(
    mut requests: MessageReader<DownloadRequested>,
    generation: Res<Generation>,
) {
    for _ in requests.read() {
        match generation.0.download_target() {
            Some(url) => navigate(&url),
            None => tracing::debug!("Download requested before any key was generated"),
        }
    }
}

/// Full-page navigation; the browser takes over the download
#[cfg(target_arch = "wasm32")]
fn navigate(url: &str) {
    tracing::info!("Downloading key from {}", url);
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(e) = window.location().set_href(url) {
        tracing::error!("Failed to navigate to {}: {:?}", url, e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn navigate(url: &str) {
    tracing::info!("Download available at {}", url);
}
