use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A stored user. Fields missing from the record deserialize as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedUser {
    pub id: String,
}

/// Fields to overwrite; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Substring filters for `list`; set filters are OR-ed together.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserFilter {
    fn query(&self) -> Vec<(&'static str, &str)> {
        let mut query = Vec::new();
        if let Some(name) = &self.name {
            query.push(("name", name.as_str()));
        }
        if let Some(email) = &self.email {
            query.push(("email", email.as_str()));
        }
        query
    }
}

pub struct UsersClient {
    client: Client,
    base_url: String,
}

impl UsersClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Use a preconfigured `reqwest::Client` (timeouts, proxies, pooling).
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn user_url(&self, id: &str) -> String {
        format!("{}/users/{}", self.base_url, id)
    }

    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, SdkError> {
        let resp = self
            .client
            .get(self.users_url())
            .query(&filter.query())
            .send()
            .await?;

        let text = expect_status(resp, StatusCode::OK).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn create(&self, user: &NewUser) -> Result<CreatedUser, SdkError> {
        let resp = self.client.post(self.users_url()).json(user).send().await?;

        let text = expect_status(resp, StatusCode::CREATED).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn update(&self, id: &str, patch: &UserPatch) -> Result<(), SdkError> {
        let resp = self.client.put(self.user_url(id)).json(patch).send().await?;

        expect_status(resp, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), SdkError> {
        let resp = self.client.delete(self.user_url(id)).send().await?;

        expect_status(resp, StatusCode::NO_CONTENT).await?;
        Ok(())
    }
}

async fn expect_status(resp: Response, expected: StatusCode) -> Result<String, SdkError> {
    let status = resp.status();
    let body = resp.text().await?;

    if status != expected {
        return Err(SdkError::Status { status, body });
    }
    Ok(body)
}
