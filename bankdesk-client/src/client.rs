use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bankdesk_core::{
    AccountStatus, DeskConfig, FetchError, ListQuery, ListResponse, ListSource, MutationReceipt,
    NewUser, SessionContext, SessionUser, StoredSession, UserRecord, UserStats, UserUpdate,
};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::auth::{LoginRequest, LoginResponse, NewRegistration};
use crate::response::{error_detail, handle_response, transport};

/// Connection settings for [`ApiClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Base URL including the `/api` prefix
    pub endpoint: String,
    pub timeout: Duration,
    /// Accept invalid TLS certificates
    pub insecure: bool,
}

impl ApiSettings {
    pub fn from_config(config: &DeskConfig) -> Self {
        Self {
            endpoint: config.api.endpoint.clone(),
            timeout: config.timeout(),
            insecure: config.api.insecure,
        }
    }
}

fn build_client(settings: &ApiSettings) -> Result<Client, FetchError> {
    let builder = Client::builder().timeout(settings.timeout);
    let builder = if settings.insecure {
        builder.danger_accept_invalid_certs(true)
    } else {
        builder
    };
    builder
        .build()
        .map_err(|e| FetchError::network(format!("failed to build HTTP client: {}", e)))
}

/// Client for the banking back-office REST API.
///
/// Every request carries the session's bearer token when one is present.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    endpoint: String,
    session: Arc<dyn SessionContext>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, session: Arc<dyn SessionContext>) -> Result<Self, FetchError> {
        Ok(Self {
            http: build_client(settings)?,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn session(&self) -> &Arc<dyn SessionContext> {
        &self.session
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, FetchError> {
        let response = builder.send().await.map_err(transport)?;
        handle_response(response).await
    }

    /// `GET /users/` with paging, search and filters.
    pub async fn list_users(&self, query: &ListQuery) -> Result<ListResponse<UserRecord>, FetchError> {
        debug!(endpoint = %self.endpoint, page = query.page, limit = query.page_size, "listing users");
        self.send(self.request(Method::GET, "users/").query(&query.to_params()))
            .await
    }

    /// `GET /users/stats`
    pub async fn stats(&self) -> Result<UserStats, FetchError> {
        self.send(self.request(Method::GET, "users/stats")).await
    }

    /// `GET /users/{id}`
    pub async fn get_user(&self, id: i64) -> Result<UserRecord, FetchError> {
        self.send(self.request(Method::GET, &format!("users/{}", id)))
            .await
    }

    /// `POST /users/` (admin only)
    pub async fn create_user(&self, user: &NewUser) -> Result<MutationReceipt, FetchError> {
        let receipt: MutationReceipt = self
            .send(self.request(Method::POST, "users/").json(user))
            .await?;
        info!(email = %user.email, id = ?receipt.id(), "user created");
        Ok(receipt)
    }

    /// `PUT /users/{id}`
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<MutationReceipt, FetchError> {
        let receipt = self
            .send(self.request(Method::PUT, &format!("users/{}", id)).json(update))
            .await?;
        info!(id, "user updated");
        Ok(receipt)
    }

    /// Activate or deactivate through `PUT /users/{id}`.
    pub async fn set_status(&self, id: i64, status: AccountStatus) -> Result<MutationReceipt, FetchError> {
        self.update_user(id, &UserUpdate::status(status)).await
    }

    /// `DELETE /users/{id}` (admin only)
    pub async fn delete_user(&self, id: i64) -> Result<MutationReceipt, FetchError> {
        let receipt = self
            .send(self.request(Method::DELETE, &format!("users/{}", id)))
            .await?;
        info!(id, "user deleted");
        Ok(receipt)
    }

    /// `GET /auth/me`
    pub async fn me(&self) -> Result<SessionUser, FetchError> {
        self.send(self.request(Method::GET, "auth/me")).await
    }

    /// `POST /auth/login`
    ///
    /// Bad credentials come back as `Forbidden` with the server's message
    /// rather than `Unauthenticated`, which would read as an expired session.
    pub async fn login(&self, email: &str, password: &str) -> Result<StoredSession, FetchError> {
        let response = self
            .http
            .post(self.url("auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::forbidden(error_detail(status, &body)));
        }

        let body: LoginResponse = handle_response(response).await?;
        let session = body.into_session()?;
        info!(email, "signed in");
        Ok(session)
    }

    /// `POST /auth/register`
    ///
    /// Sent without a token. A taken email comes back as a 400 with the
    /// server's detail.
    pub async fn register(
        &self,
        registration: &NewRegistration,
    ) -> Result<MutationReceipt, FetchError> {
        let response = self
            .http
            .post(self.url("auth/register"))
            .json(registration)
            .send()
            .await
            .map_err(transport)?;
        let receipt: MutationReceipt = handle_response(response).await?;
        info!(email = %registration.email, "account registered");
        Ok(receipt)
    }
}

#[async_trait]
impl ListSource for ApiClient {
    type Item = UserRecord;

    async fn fetch_page(&self, query: &ListQuery) -> Result<ListResponse<UserRecord>, FetchError> {
        self.list_users(query).await
    }
}
