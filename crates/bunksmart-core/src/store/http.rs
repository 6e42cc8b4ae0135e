//! Record store backed by a remote JSON document service.
//!
//! Routes, relative to the configured base URL:
//!
//! | Method  | Path                         | Body                         |
//! |---------|------------------------------|------------------------------|
//! | `GET`   | `users/{uid}`                | (404 when never written)     |
//! | `PUT`   | `users/{uid}`                | whole document               |
//! | `PATCH` | `users/{uid}`                | changed top-level fields     |
//! | `PUT`   | `users/{uid}/settings/{key}` | the setting value            |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use url::Url;

use super::{RecordStore, UserDocument, UserId};
use crate::attendance::AttendanceMap;
use crate::challenge::ChallengeMap;
use crate::error::{ConfigError, CoreError, StoreError};
use crate::settings::SettingsMap;

#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpStore {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: &str, api_token: Option<&str>, timeout: Duration) -> Result<Self, CoreError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "store.base_url".into(),
            message,
        };
        if base_url.trim().is_empty() {
            return Err(invalid("base URL is not set".into()).into());
        }
        let base_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid(format!("'{base_url}' cannot be a base URL")).into());
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StoreError::Network)?;

        Ok(Self {
            client,
            base_url,
            api_token: api_token.map(str::to_string),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.client.request(method, url);
        match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let resp = req.send().await?;
        Self::check_status(resp).await
    }

    /// Map non-success statuses to store errors.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::Unauthorized {
                status: status.as_u16(),
            });
        }
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Remote {
            status: status.as_u16(),
            body,
        })
    }

    async fn patch(&self, user: &UserId, fields: Value) -> Result<(), StoreError> {
        let url = self.url(&["users", user.as_str()]);
        tracing::debug!(%url, "patching user document");
        self.send(self.request(Method::PATCH, url).json(&fields)).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for HttpStore {
    async fn load_user_record_set(&self, user: &UserId) -> Result<UserDocument, StoreError> {
        let url = self.url(&["users", user.as_str()]);
        let resp = self.request(Method::GET, url.clone()).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            tracing::info!(user = %user, "creating empty remote document");
            let doc = UserDocument::default();
            self.send(self.request(Method::PUT, url).json(&doc)).await?;
            return Ok(doc);
        }

        let resp = Self::check_status(resp).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| StoreError::CorruptDocument {
            user: user.to_string(),
            message: e.to_string(),
        })
    }

    async fn save_attendance(
        &self,
        user: &UserId,
        records: &AttendanceMap,
    ) -> Result<(), StoreError> {
        self.patch(user, json!({ "attendance": records })).await
    }

    async fn save_challenges(
        &self,
        user: &UserId,
        challenges: &ChallengeMap,
    ) -> Result<(), StoreError> {
        self.patch(user, json!({ "challenges": challenges })).await
    }

    async fn save_setting(
        &self,
        user: &UserId,
        key: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        let url = self.url(&["users", user.as_str(), "settings", key]);
        self.send(self.request(Method::PUT, url).json(value)).await?;
        Ok(())
    }

    async fn save_settings(
        &self,
        user: &UserId,
        settings: &SettingsMap,
    ) -> Result<(), StoreError> {
        self.patch(user, json!({ "settings": settings })).await
    }
}
