//! Vehicle facade: authenticated telemetry requests
//!
//! Thin consumer of the session manager. Every call asks the session layer
//! for a valid token first; a login rejection halts the telemetry request
//! immediately and is never retried here.

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use carlink_core::models::{
    ApiResponse, Dashboard, Location, Notification, NotificationHistory, TripHistory, TripSummary,
    VehicleList, VehicleSummary,
};

use crate::auth::{Authenticator, MemoryTokenCache, SessionManager, TokenCache, TokenRecord};
use crate::config::CloudConfig;
use crate::error::{CarlinkError, Result};

/// Header carrying the provider-internal account id
const HEADER_GUID: &str = "x-guid";
/// Header selecting the vehicle a telemetry request targets
const HEADER_VIN: &str = "vin";

/// Async client for the vehicle manufacturer's cloud telemetry API
pub struct CarlinkClient {
    http: Client,
    config: CloudConfig,
    session: SessionManager,
    username: String,
    password: String,
}

impl CarlinkClient {
    /// Create a client with the production endpoints and a process-lifetime
    /// token cache.
    pub fn new(username: &str, password: &str) -> Result<Self> {
        Self::with_config(
            CloudConfig::default(),
            Arc::new(MemoryTokenCache::new()),
            username,
            password,
        )
    }

    /// Create a client with explicit endpoints and an injected token cache.
    ///
    /// Pass a [`crate::auth::FileTokenCache`] to keep tokens across process
    /// restarts.
    pub fn with_config(
        config: CloudConfig,
        cache: Arc<dyn TokenCache>,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        let session = SessionManager::new(Authenticator::new(config.clone())?, cache);

        Ok(Self {
            http,
            config,
            session,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Eagerly establish a session.
    ///
    /// Optional: every telemetry call authenticates on demand. Useful to
    /// surface credential errors before issuing vehicle requests.
    #[instrument(skip(self))]
    pub async fn login(&self) -> Result<()> {
        self.valid_record().await?;
        Ok(())
    }

    /// List vehicles associated with the account
    #[instrument(skip(self))]
    pub async fn get_vehicles(&self) -> Result<Vec<VehicleSummary>> {
        let list: VehicleList = self.authorized_get("/v2/vehicle/guid", None, &[]).await?;
        Ok(list.vehicles)
    }

    /// Last-known location of one vehicle
    #[instrument(skip(self))]
    pub async fn get_location(&self, vin: &str) -> Result<Location> {
        self.authorized_get("/v1/location", Some(vin), &[]).await
    }

    /// Dashboard metrics (odometer, fuel, traction battery)
    #[instrument(skip(self))]
    pub async fn get_telemetry(&self, vin: &str) -> Result<Dashboard> {
        self.authorized_get("/v3/telemetry", Some(vin), &[]).await
    }

    /// Account notification history for one vehicle
    #[instrument(skip(self))]
    pub async fn get_notifications(&self, vin: &str) -> Result<Vec<Notification>> {
        let history: NotificationHistory = self
            .authorized_get("/v2/notification/history", Some(vin), &[])
            .await?;
        Ok(history.notifications)
    }

    /// Trip summaries for one vehicle over a date range
    #[instrument(skip(self))]
    pub async fn get_trips(
        &self,
        vin: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TripSummary>> {
        let from = from.to_string();
        let to = to.to_string();
        let query = [("from", from.as_str()), ("to", to.as_str())];
        let history: TripHistory = self
            .authorized_get("/v1/trips", Some(vin), &query)
            .await?;
        Ok(history.trips)
    }

    async fn valid_record(&self) -> Result<TokenRecord> {
        // The login username is the cache key (the account identifier).
        Ok(self
            .session
            .ensure_valid_record(&self.username, &self.username, &self.password)
            .await?)
    }

    /// GET against the telemetry API with bearer token and routing headers
    async fn authorized_get<T: DeserializeOwned>(
        &self,
        path: &str,
        vin: Option<&str>,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let record = self.valid_record().await?;
        let url = self.config.api_url(path)?;
        debug!(%url, "telemetry request");

        let mut request = self
            .http
            .get(url)
            .bearer_auth(&record.access_token)
            .header(HEADER_GUID, record.account_uuid.to_string());
        if let Some(vin) = vin {
            request = request.header(HEADER_VIN, vin);
        }
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Unwrap the provider envelope or map the failure to an API error
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let envelope: ApiResponse<T> = response
                .json()
                .await
                .map_err(|e| CarlinkError::Parse(e.to_string()))?;
            envelope
                .payload
                .ok_or_else(|| CarlinkError::Parse("response envelope without payload".into()))
        } else {
            Err(self.extract_error(response, status).await)
        }
    }

    async fn extract_error(&self, response: Response, status: StatusCode) -> CarlinkError {
        let message = match response.json::<ApiResponse<serde_json::Value>>().await {
            Ok(envelope) => envelope
                .status_message()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {status}")),
            Err(_) => format!("HTTP {status}"),
        };

        CarlinkError::api_error(status.as_u16(), message)
    }
}

impl std::fmt::Debug for CarlinkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarlinkClient")
            .field("username", &self.username)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
