use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use tradetrack_auth::{AuthToken, Persistence, SessionContext, SessionError, UserProfile};
use tradetrack_core::{ApiError, InvoiceId, ProductId};
use tradetrack_invoicing::{InvoiceGateway, PersistedInvoice, SubmissionPayload};
use tradetrack_products::{Product, ProductSource};

use crate::config::ApiConfig;
use crate::dto::{
    CreateInvoiceRequest, InvoiceDto, ListBody, ProductDto, ProductInput, TokenResponse,
};
use crate::error::{classify_response, from_transport, malformed};
use crate::reports::{InvoicesReport, ReportRange, SalesReport};

#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Typed client for the TradeTrack REST API.
///
/// The token is read from the shared [`SessionContext`] on every request, so
/// a login or logout elsewhere takes effect immediately.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(config: ApiConfig, session: SessionContext) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::transient(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            session,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, self.config.url(path));
        match self.session.token() {
            Some(token) => req.header(AUTHORIZATION, token.header_value()),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, resource: &str) -> Result<Response, ApiError> {
        let res = req.send().await.map_err(from_transport)?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        let err = classify_response(status.as_u16(), &body, resource);
        tracing::warn!(status = status.as_u16(), resource, error = %err, "api request failed");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        resource: &str,
    ) -> Result<T, ApiError> {
        let res = self.send(req, resource).await?;
        let bytes = res.bytes().await.map_err(from_transport)?;
        serde_json::from_slice(&bytes).map_err(|e| malformed(resource, e))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Authentication
    // ─────────────────────────────────────────────────────────────────────

    /// Exchange credentials for a token.
    ///
    /// Identifiers containing `@` are tried against the email endpoint first,
    /// then as a username built from the local part. If both fail the email
    /// endpoint's error is returned.
    pub async fn obtain_token(&self, identifier: &str, password: &str) -> Result<AuthToken, ApiError> {
        if let Some((local_part, _)) = identifier.split_once('@') {
            let by_email = self
                .token_request(
                    "/api/token-auth-email/",
                    &[("email", identifier), ("password", password)],
                )
                .await;

            return match by_email {
                Ok(token) => Ok(token),
                Err(original) => {
                    tracing::debug!("email login failed; retrying with username '{local_part}'");
                    self.token_request(
                        "/api-token-auth/",
                        &[("username", local_part), ("password", password)],
                    )
                    .await
                    .map_err(|_| original)
                }
            };
        }

        self.token_request(
            "/api-token-auth/",
            &[("username", identifier), ("password", password)],
        )
        .await
    }

    async fn token_request(&self, path: &str, form: &[(&str, &str)]) -> Result<AuthToken, ApiError> {
        let req = self.http.post(self.config.url(path)).form(form);
        let body: TokenResponse = self.send_json(req, "token").await?;
        Ok(AuthToken::new(body.token))
    }

    /// Obtain a token, store it in the session and load the user's profile.
    ///
    /// If the profile cannot be loaded the new token is dropped again, so a
    /// failed login never leaves a half-authenticated session behind.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        persistence: Persistence,
    ) -> Result<UserProfile, LoginError> {
        let token = self.obtain_token(identifier, password).await?;
        self.session.login(token, persistence)?;

        let profile = match self.fetch_me().await {
            Ok(profile) => profile,
            Err(err) => {
                if let Err(clear) = self.session.logout() {
                    tracing::warn!(error = %clear, "failed to discard token after profile error");
                }
                return Err(err.into());
            }
        };
        self.session.set_profile(profile.clone())?;
        tracing::info!(username = %profile.username, "signed in");
        Ok(profile)
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.session.logout()
    }

    pub async fn fetch_me(&self) -> Result<UserProfile, ApiError> {
        self.send_json(self.request(Method::GET, "/api/me/"), "profile")
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Products
    // ─────────────────────────────────────────────────────────────────────

    pub async fn list_products(&self, for_invoice: bool) -> Result<Vec<Product>, ApiError> {
        let mut req = self.request(Method::GET, "/api/products/");
        if for_invoice {
            req = req.query(&[("for_invoice", "1")]);
        }

        let body: ListBody<ProductDto> = self.send_json(req, "products").await?;
        let products: Vec<Product> = body.into_items().into_iter().map(Product::from).collect();
        tracing::debug!(count = products.len(), for_invoice, "products loaded");
        Ok(products)
    }

    /// `Ok(None)` when the product does not exist.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, ApiError> {
        let req = self.request(Method::GET, &format!("/api/products/{id}/"));
        match self.send_json::<ProductDto>(req, &format!("product {id}")).await {
            Ok(dto) => Ok(Some(dto.into())),
            Err(ApiError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ApiError> {
        let req = self.request(Method::POST, "/api/products/").json(input);
        let dto: ProductDto = self.send_json(req, "product").await?;
        tracing::info!(product_id = %dto.id, name = %dto.name, "product created");
        Ok(dto.into())
    }

    /// Replace every editable field of product `id`.
    pub async fn update_product(&self, id: ProductId, input: &ProductInput) -> Result<Product, ApiError> {
        let req = self
            .request(Method::PUT, &format!("/api/products/{id}/"))
            .json(input);
        let dto: ProductDto = self.send_json(req, &format!("product {id}")).await?;
        tracing::info!(product_id = %id, "product updated");
        Ok(dto.into())
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, &format!("/api/products/{id}/"));
        self.send(req, &format!("product {id}")).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Invoices
    // ─────────────────────────────────────────────────────────────────────

    pub async fn list_invoices(&self) -> Result<Vec<PersistedInvoice>, ApiError> {
        let body: ListBody<InvoiceDto> = self
            .send_json(self.request(Method::GET, "/api/invoices/"), "invoices")
            .await?;
        Ok(body.into_items().into_iter().map(PersistedInvoice::from).collect())
    }

    pub async fn get_invoice(&self, id: InvoiceId) -> Result<PersistedInvoice, ApiError> {
        let req = self.request(Method::GET, &format!("/api/invoices/{id}/"));
        let dto: InvoiceDto = self.send_json(req, &format!("invoice {id}")).await?;
        Ok(dto.into())
    }

    pub async fn create_invoice(&self, payload: &SubmissionPayload) -> Result<PersistedInvoice, ApiError> {
        let body = CreateInvoiceRequest::from(payload);
        let req = self.request(Method::POST, "/api/invoices/").json(&body);
        let dto: InvoiceDto = self.send_json(req, "invoice").await?;

        let invoice = PersistedInvoice::from(dto);
        tracing::info!(
            invoice_id = %invoice.id,
            invoice_no = invoice.display_number(),
            lines = invoice.items.len(),
            "invoice created"
        );
        Ok(invoice)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────

    pub async fn sales_report(&self, range: ReportRange) -> Result<SalesReport, ApiError> {
        let req = self
            .request(Method::GET, "/api/reports/sales/")
            .query(&range.query());
        self.send_json(req, "sales report").await
    }

    /// Sales by product as CSV text.
    pub async fn sales_report_csv(&self, range: ReportRange) -> Result<String, ApiError> {
        let req = self
            .request(Method::GET, "/api/reports/sales/csv/")
            .query(&range.query());
        let res = self.send(req, "sales report").await?;
        res.text().await.map_err(from_transport)
    }

    pub async fn invoices_report(&self, range: ReportRange) -> Result<InvoicesReport, ApiError> {
        let req = self
            .request(Method::GET, "/api/reports/invoices/")
            .query(&range.query());
        self.send_json(req, "invoices report").await
    }
}

#[async_trait]
impl ProductSource for ApiClient {
    async fn fetch_products(&self, for_invoice: bool) -> Result<Vec<Product>, ApiError> {
        self.list_products(for_invoice).await
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, ApiError> {
        self.get_product(id).await
    }
}

#[async_trait]
impl InvoiceGateway for ApiClient {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<PersistedInvoice, ApiError> {
        self.create_invoice(payload).await
    }
}
