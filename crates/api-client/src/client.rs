//! Percapita backend HTTP client.
//!
//! Async reqwest client. Every non-2xx response becomes [`ApiError::Http`] carrying the status and
//! body text; no timeouts or retries are configured.

use crate::traits::{BatchValidator, EnrollmentStore, ExtractSource};
use crate::wire::{
    BatchRequest, BatchResponse, BatchUser, EnrollmentPage, EnrollmentQuery, RowsResponse,
    SummaryResponse,
};
use crate::{ApiError, ApiResult};
use percapita_core::{
    CatalogItem, CatalogKind, ConfirmedDeletion, CoreConfig, Enrollment, EnrollmentPatch,
    EnrollmentStatus, ExtractPeriod, ExtractRow,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client for the backend described by `config`.
    pub fn new(config: &CoreConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("percapita/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            api_base: config.api_base_url().to_string(),
            token: config.api_token().map(str::to_string),
        })
    }

    /// `GET /api/nuevos-usuarios/` with filters.
    pub async fn list_enrollments(&self, query: &EnrollmentQuery) -> ApiResult<EnrollmentPage> {
        let request = self
            .request(Method::GET, "/api/nuevos-usuarios/")
            .query(&query.to_pairs());
        self.json(request).await
    }

    pub async fn get_enrollment(&self, id: u64) -> ApiResult<Enrollment> {
        let request = self.request(Method::GET, &format!("/api/nuevos-usuarios/{id}/"));
        self.json(request).await
    }

    /// Registers a new enrollment and returns it as stored, with its id.
    pub async fn create_enrollment(&self, enrollment: &Enrollment) -> ApiResult<Enrollment> {
        let request = self
            .request(Method::POST, "/api/nuevos-usuarios/")
            .json(enrollment);
        self.json(request).await
    }

    /// `PATCH /api/nuevos-usuarios/{id}/` with the set fields of `patch`; returns the stored
    /// record. This is the manual edit and status override path.
    pub async fn update_enrollment(
        &self,
        id: u64,
        patch: &EnrollmentPatch,
    ) -> ApiResult<Enrollment> {
        let request = self
            .request(Method::PATCH, &format!("/api/nuevos-usuarios/{id}/"))
            .json(patch);
        let stored: Enrollment = self.json(request).await?;
        tracing::info!(id, estado = ?patch.estado, "enrollment updated");
        Ok(stored)
    }

    /// Deletes an enrollment. Requires proof that the operator retyped its RUN.
    pub async fn delete_enrollment(&self, confirmed: ConfirmedDeletion) -> ApiResult<()> {
        let id = confirmed.id();
        let request = self.request(Method::DELETE, &format!("/api/nuevos-usuarios/{id}/"));
        self.send(request).await?;
        tracing::info!(id, "enrollment deleted");
        Ok(())
    }

    /// Active catalog entries of one kind.
    pub async fn list_catalog(&self, kind: CatalogKind) -> ApiResult<Vec<CatalogItem>> {
        let request = self
            .request(Method::GET, "/api/catalogos/")
            .query(&[("tipo", kind.as_str())]);
        self.json(request).await
    }

    pub async fn create_catalog_item(&self, item: &CatalogItem) -> ApiResult<CatalogItem> {
        let request = self.request(Method::POST, "/api/catalogos/").json(item);
        self.json(request).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_base, path);
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(ApiError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(ApiError::Parse)
    }
}

impl ExtractSource for ApiClient {
    async fn extract_periods(&self) -> ApiResult<Vec<ExtractPeriod>> {
        let request = self
            .request(Method::GET, "/api/corte-fonasa/")
            .query(&[("summary_only", "true")]);
        let summary: SummaryResponse = self.json(request).await?;
        Ok(summary.into_periods())
    }

    async fn search_extract_rows(&self, run: &str) -> ApiResult<Vec<ExtractRow>> {
        let request = self
            .request(Method::GET, "/api/corte-fonasa/")
            .query(&[("search", run), ("all", "true")]);
        let rows: RowsResponse = self.json(request).await?;
        Ok(rows.rows)
    }
}

impl EnrollmentStore for ApiClient {
    async fn update_status(&self, id: u64, estado: EnrollmentStatus) -> ApiResult<()> {
        let request = self
            .request(Method::PATCH, &format!("/api/nuevos-usuarios/{id}/"))
            .json(&EnrollmentPatch::status(estado));
        self.send(request).await?;
        Ok(())
    }
}

impl BatchValidator for ApiClient {
    async fn validate_batch(&self, usuarios: Vec<BatchUser>) -> ApiResult<BatchResponse> {
        let request = self
            .request(Method::POST, "/api/nuevos-usuarios/validar-lote/")
            .json(&BatchRequest { usuarios });
        self.json(request).await
    }
}
