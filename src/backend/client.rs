use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::types::{
    Acknowledgement, ChatRequest, ChatResponse, CodeQueryRequest, CodeQueryResponse,
    ConnectRequest, EntityContext, EntityContextRequest, FindPathsRequest, GraphOverview,
    HealthResponse, IngestReport, Neo4jRequest, ParserRequest, ParserResponse, PathSet,
    QueryAnswer, Question, StorageRequest, StorageResponse,
};
use super::Backend;
use crate::config::{BackendConfig, BackendProfile, RequestConfig};
use crate::error::{BackendError, BackendResult};
use crate::session::Entity;

/// HTTP client for the retrieval backend.
///
/// Every call is fire-once: no retry, no backoff.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    profile: BackendProfile,
    request_config: RequestConfig,
}

impl BackendClient {
    /// Create a new backend client
    pub fn new(config: &BackendConfig, request_config: RequestConfig) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(BackendError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile,
            request_config,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Backend contract in use.
    pub fn profile(&self) -> BackendProfile {
        self.profile
    }

    /// Check the service is up (`GET /`)
    pub async fn health(&self) -> BackendResult<HealthResponse> {
        let request = self.client.get(self.url("/"));
        self.execute("/", request).await
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> BackendResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self
            .client
            .post(self.url(endpoint))
            .header("Content-Type", "application/json")
            .json(body);
        self.execute(endpoint, request).await
    }

    /// Send a request and decode the JSON body (internal)
    async fn execute<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> BackendResult<R> {
        debug!(endpoint = %endpoint, "Calling backend");
        let start = Instant::now();

        let result = match request.send().await {
            Ok(response) => self.decode(response).await,
            Err(e) if e.is_timeout() => Err(BackendError::Timeout {
                timeout_ms: self.request_config.timeout_ms,
            }),
            Err(e) => Err(BackendError::Http(e)),
        };

        let latency = start.elapsed();
        match &result {
            Ok(_) => info!(
                endpoint = %endpoint,
                latency_ms = latency.as_millis(),
                "Backend call succeeded"
            ),
            Err(e) => error!(
                endpoint = %endpoint,
                error = %e,
                latency_ms = latency.as_millis(),
                "Backend call failed"
            ),
        }
        result
    }

    async fn decode<R: DeserializeOwned>(&self, response: Response) -> BackendResult<R> {
        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Upload a local file for ingestion (chat profile: `POST /upload`)
    async fn upload(&self, path: &Path) -> BackendResult<IngestReport> {
        let upload_error = |message: String| BackendError::Upload {
            path: path.display().to_string(),
            message,
        };

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| upload_error(e.to_string()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        info!(file = %file_name, bytes = bytes.len(), "Uploading document");

        let form = multipart::Form::new().part(
            "file",
            multipart::Part::bytes(bytes).file_name(file_name.clone()),
        );
        let request = self.client.post(self.url("/upload")).multipart(form);
        let ack: Acknowledgement = self.execute("/upload", request).await?;

        if let Some(error) = ack.error.clone() {
            return Err(BackendError::Rejected { message: error });
        }

        Ok(IngestReport {
            message: format!("Uploaded {}: {}", file_name, ack.describe()),
            files_analyzed: None,
            total_nodes: ack.total_nodes,
            total_relationships: ack.total_relationships,
            ..IngestReport::default()
        })
    }

    /// Parse then store a codebase on the backend host (code profile)
    async fn parse_and_store(&self, path: &Path) -> BackendResult<IngestReport> {
        let parsed: ParserResponse = self
            .post_json(
                "/parser",
                &ParserRequest {
                    file_path: path.display().to_string(),
                    save_output: true,
                },
            )
            .await?;

        if parsed.status != "success" {
            return Err(BackendError::Rejected {
                message: parsed.error.unwrap_or_else(|| "Parsing failed".to_string()),
            });
        }
        let json_file_path = parsed.output_path.ok_or_else(|| BackendError::InvalidResponse {
            message: "Parser did not report an output_path".to_string(),
        })?;

        info!(
            files_analyzed = parsed.files_analyzed,
            files_skipped = parsed.files_skipped,
            output = %json_file_path,
            "Codebase parsed"
        );

        let stored: StorageResponse = self
            .post_json(
                "/store",
                &StorageRequest {
                    json_file_path,
                    verbose: false,
                },
            )
            .await?;

        if stored.status != "success" {
            return Err(BackendError::Rejected {
                message: stored.error.unwrap_or_else(|| "Storage failed".to_string()),
            });
        }

        Ok(IngestReport {
            message: format!(
                "Analyzed {} files; stored {} nodes, {} relationships",
                parsed.files_analyzed, stored.total_nodes, stored.total_relationships
            ),
            files_analyzed: Some(parsed.files_analyzed),
            total_nodes: Some(stored.total_nodes),
            total_relationships: Some(stored.total_relationships),
            node_types: stored.node_types,
            relationship_types: stored.relationship_types,
            embeddings: stored.embeddings,
        })
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn connect(&self, db_name: Option<String>) -> BackendResult<Acknowledgement> {
        match self.profile {
            BackendProfile::Chat => {
                self.post_json("/connect", &ConnectRequest { db_name }).await
            }
            BackendProfile::Code => {
                self.post_json(
                    "/neo4j",
                    &Neo4jRequest {
                        test_connection: true,
                        db_name,
                    },
                )
                .await
            }
        }
    }

    async fn ingest(&self, source: &Path) -> BackendResult<IngestReport> {
        match self.profile {
            BackendProfile::Chat => self.upload(source).await,
            BackendProfile::Code => self.parse_and_store(source).await,
        }
    }

    async fn ask(&self, question: &Question) -> BackendResult<QueryAnswer> {
        match self.profile {
            BackendProfile::Chat => {
                let response: ChatResponse = self
                    .post_json(
                        "/chat",
                        &ChatRequest {
                            query: question.text.clone(),
                            expand_depth: question.expand_depth,
                        },
                    )
                    .await?;
                Ok(response.into())
            }
            BackendProfile::Code => {
                let response: CodeQueryResponse = self
                    .post_json(
                        "/query",
                        &CodeQueryRequest {
                            query: question.text.clone(),
                            current_file: question.current_file.clone(),
                            current_line: question.current_line,
                        },
                    )
                    .await?;
                if let Some(error) = response.error.clone() {
                    return Err(BackendError::Rejected { message: error });
                }
                Ok(response.into())
            }
        }
    }

    async fn graph_overview(&self, limit: u32) -> BackendResult<GraphOverview> {
        let request = self
            .client
            .get(self.url("/graph-data"))
            .query(&[("limit", limit)]);
        self.execute("/graph-data", request).await
    }

    async fn entity_context(&self, entity: &Entity) -> BackendResult<EntityContext> {
        self.post_json(
            "/entity-context",
            &EntityContextRequest {
                entity_name: entity.as_str().to_string(),
            },
        )
        .await
    }

    async fn find_paths(&self, entities: &[Entity], max_hops: u32) -> BackendResult<PathSet> {
        self.post_json(
            "/find-paths",
            &FindPathsRequest {
                entity_names: entities.to_vec(),
                max_hops,
            },
        )
        .await
    }

    async fn disconnect(&self) -> BackendResult<Acknowledgement> {
        let request = self.client.delete(self.url("/disconnect"));
        self.execute("/disconnect", request).await
    }
}
