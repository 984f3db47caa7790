//! Async seam to the key generation service
//!
//! The browser build implements [`KeyService`] over `fetch`; tests inject
//! fakes. Futures are not required to be `Send` since everything runs on the
//! page's main thread.

use crate::error::{GenerateError, ModelError};
use crate::geometry::KeyGeometry;
use crate::protocol::GenerateResponse;

#[allow(async_fn_in_trait)]
pub trait KeyService {
    /// POST to the generation endpoint and parse the response body
    async fn generate(&self, url: &str) -> Result<GenerateResponse, GenerateError>;

    /// GET raw model bytes
    async fn fetch_model(&self, url: &str) -> Result<Vec<u8>, ModelError>;
}

/// Fetch a key model and decode it, recentred on its bounding box
pub async fn load_geometry<S: KeyService>(service: &S, url: &str) -> Result<KeyGeometry, ModelError> {
    let bytes = service.fetch_model(url).await?;
    tracing::debug!("Fetched {} bytes from {}", bytes.len(), url);
    KeyGeometry::centered_from_stl(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::controller::GenerationController;
    use crate::loader::{Install, ModelSlot};
    use std::cell::Cell;
    use std::collections::HashMap;

    /// Serves canned responses and counts generation calls
    struct FakeService {
        responses: Vec<Result<GenerateResponse, GenerateError>>,
        calls: Cell<usize>,
        models: HashMap<String, Vec<u8>>,
    }

    impl KeyService for FakeService {
        async fn generate(&self, _url: &str) -> Result<GenerateResponse, GenerateError> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            self.responses[n].clone()
        }

        async fn fetch_model(&self, url: &str) -> Result<Vec<u8>, ModelError> {
            self.models.get(url).cloned().ok_or(ModelError::Status(404))
        }
    }

    fn triangle_stl(offset: f32) -> Vec<u8> {
        let mut bytes = vec![0u8; 80];
        bytes.extend_from_slice(&1u32.to_le_bytes());
        let values = [
            0.0, 0.0, 1.0,
            offset, 0.0, 0.0,
            offset + 1.0, 0.0, 0.0,
            offset, 1.0, 0.0,
        ];
        for v in values {
            bytes.extend_from_slice(&f32::to_le_bytes(v));
        }
        bytes.extend_from_slice(&[0, 0]);
        bytes
    }

    fn ok(key_id: &str) -> Result<GenerateResponse, GenerateError> {
        Ok(GenerateResponse {
            key_id: key_id.to_string(),
            stl_url: format!("files/{}.stl", key_id),
        })
    }

    #[tokio::test]
    async fn test_load_geometry_recenters() {
        let mut models = HashMap::new();
        models.insert("http://svc/files/a.stl".to_string(), triangle_stl(5.0));
        let service = FakeService {
            responses: Vec::new(),
            calls: Cell::new(0),
            models,
        };

        let geometry = load_geometry(&service, "http://svc/files/a.stl").await.unwrap();
        assert_eq!(geometry.bounds().unwrap().center(), [0.0, 0.0, 0.0]);

        let err = load_geometry(&service, "http://svc/files/missing.stl").await.unwrap_err();
        assert_eq!(err, ModelError::Status(404));
    }

    #[tokio::test]
    async fn test_overlapping_generations_settle_on_latest() {
        let config = ServiceConfig::from_address("svc");
        let mut models = HashMap::new();
        models.insert(config.resolve("files/k1.stl"), triangle_stl(0.0));
        models.insert(config.resolve("files/k2.stl"), triangle_stl(3.0));
        let service = FakeService {
            responses: vec![ok("k1"), ok("k2")],
            calls: Cell::new(0),
            models,
        };

        let mut controller = GenerationController::new(config);
        let mut slot: ModelSlot<String> = ModelSlot::new();

        // Two generations whose model loads are both still in flight
        let mut pending = Vec::new();
        for _ in 0..2 {
            let url = controller.begin().unwrap();
            let outcome = service.generate(&url).await;
            let request = controller.finish(outcome).unwrap();
            let (token, evicted) = slot.begin();
            assert!(evicted.is_none());
            pending.push((token, request));
        }
        assert_eq!(service.calls.get(), 2);

        // Resolve the later load first, then the earlier one
        for (token, request) in pending.into_iter().rev() {
            let geometry = load_geometry(&service, &request.url).await.unwrap();
            assert_eq!(geometry.triangle_count(), 1);
            match slot.install(token, request.key_id.clone()) {
                Install::Applied { evicted } => assert!(evicted.is_none()),
                Install::Stale(key_id) => assert_eq!(key_id, "k1"),
            }
        }

        assert_eq!(slot.resident().map(String::as_str), Some("k2"));
        assert_eq!(controller.session().key_id(), Some("k2"));
        assert!(controller.can_download());
    }

    #[tokio::test]
    async fn test_failed_generation_issues_no_load() {
        let service = FakeService {
            responses: vec![Err(GenerateError::Status(500))],
            calls: Cell::new(0),
            models: HashMap::new(),
        };
        let mut controller = GenerationController::new(ServiceConfig::default());

        let url = controller.begin().unwrap();
        let outcome = service.generate(&url).await;
        assert!(controller.finish(outcome).is_none());
        assert!(controller.can_generate());
        assert_eq!(controller.status().to_string(), "Generation Failed");
    }
}
