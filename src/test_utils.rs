pub mod test_helpers {
    use crate::error::FetchError;
    use crate::models::{InterfaceDescription, SanitizedDescription, VersionToken};
    use crate::services::schema_sanitizer;
    use crate::services::spec_fetcher::{self, SpecSource};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Three endpoints covering path, query, header and body arguments.
    ///
    /// The `Transfer` body has a `from` property, which is renamed to
    /// `from_` by sanitization.
    pub fn sample_description() -> Value {
        json!({
            "openapi": "3.1.0",
            "info": {"title": "Sample Token API", "version": "1.0.0"},
            "paths": {
                "/v1/networks": {
                    "get": {
                        "summary": "List supported networks",
                        "responses": {"200": {"description": "OK"}}
                    }
                },
                "/v1/evm/tokens/{contract}": {
                    "parameters": [
                        {"name": "contract", "in": "path", "required": true, "schema": {"type": "string"}}
                    ],
                    "get": {
                        "summary": "Token metadata",
                        "parameters": [
                            {"name": "network_id", "in": "query", "schema": {"type": "string"}},
                            {"name": "fields", "in": "query", "schema": {"type": "array", "items": {"type": "string"}}}
                        ]
                    }
                },
                "/v1/transfers": {
                    "post": {
                        "summary": "Create a transfer",
                        "parameters": [
                            {"name": "X-Request-Id", "in": "header", "schema": {"type": "string"}}
                        ],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/Transfer"}
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Transfer": {
                        "type": "object",
                        "required": ["from", "to", "amount"],
                        "properties": {
                            "from": {"type": "string"},
                            "to": {"type": "string"},
                            "amount": {"type": "integer"}
                        }
                    }
                }
            }
        })
    }

    /// [`sample_description`] plus `GET /v1/evm/holders/{contract}`
    pub fn sample_description_v2() -> Value {
        let mut document = sample_description();
        if let Some(paths) = document.get_mut("paths").and_then(Value::as_object_mut) {
            paths.insert(
                "/v1/evm/holders/{contract}".to_string(),
                json!({
                    "get": {
                        "summary": "Token holders",
                        "parameters": [
                            {"name": "contract", "in": "path", "required": true, "schema": {"type": "string"}},
                            {"name": "limit", "in": "query", "schema": {"type": "integer"}}
                        ]
                    }
                }),
            );
        }
        document
    }

    /// Validates and sanitizes a document the same way the fetcher does
    pub fn sanitized(document: Value) -> Result<SanitizedDescription, FetchError> {
        let description = InterfaceDescription::new(document);
        spec_fetcher::validate(&description)?;
        Ok(schema_sanitizer::sanitize(&description))
    }

    fn unavailable(what: &str) -> FetchError {
        FetchError::Status {
            url: format!("scripted://{}", what),
            status: 503,
            body: "unavailable".to_string(),
        }
    }

    /// In-memory [`SpecSource`] whose answers can be changed mid-test
    ///
    /// `None` for either document makes the corresponding fetch fail with a
    /// transport-class error.
    pub struct ScriptedSource {
        description: Mutex<Option<Value>>,
        version: Mutex<Option<String>>,
        delay: Mutex<Duration>,
        description_calls: AtomicUsize,
        version_calls: AtomicUsize,
    }

    impl ScriptedSource {
        pub fn new(description: Value, version: &str) -> Self {
            Self {
                description: Mutex::new(Some(description)),
                version: Mutex::new(Some(version.to_string())),
                delay: Mutex::new(Duration::ZERO),
                description_calls: AtomicUsize::new(0),
                version_calls: AtomicUsize::new(0),
            }
        }

        pub fn set_description(&self, description: Option<Value>) {
            *self.description.lock().unwrap_or_else(|e| e.into_inner()) = description;
        }

        pub fn set_version(&self, version: Option<&str>) {
            *self.version.lock().unwrap_or_else(|e| e.into_inner()) = version.map(str::to_string);
        }

        /// Delay applied to every description fetch
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
        }

        pub fn description_calls(&self) -> usize {
            self.description_calls.load(Ordering::SeqCst)
        }

        pub fn version_calls(&self) -> usize {
            self.version_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SpecSource for ScriptedSource {
        async fn fetch_description(&self) -> Result<SanitizedDescription, FetchError> {
            self.description_calls.fetch_add(1, Ordering::SeqCst);

            let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let document = self
                .description
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            match document {
                Some(document) => sanitized(document),
                None => Err(unavailable("openapi")),
            }
        }

        async fn fetch_version(&self) -> Result<VersionToken, FetchError> {
            self.version_calls.fetch_add(1, Ordering::SeqCst);

            let version = self
                .version
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            version
                .map(VersionToken::new)
                .ok_or_else(|| unavailable("version"))
        }
    }
}
