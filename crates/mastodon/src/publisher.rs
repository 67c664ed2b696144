use {
    async_trait::async_trait,
    secrecy::ExposeSecret,
    serde::Deserialize,
    tracing::{debug, warn},
};

use {
    reshare_channels::{Error, Publisher, Result},
    reshare_common::types::Event,
};

use crate::{CHANNEL_NAME, config::MastodonConfig};

#[derive(Debug, Deserialize)]
struct Account {
    username: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    error: String,
}

/// Posts statuses through the Mastodon REST API.
pub struct MastodonPublisher {
    client: reqwest::Client,
    config: MastodonConfig,
}

impl MastodonPublisher {
    pub fn new(config: MastodonConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1/{path}", self.config.base_url())
    }
}

#[async_trait]
impl Publisher for MastodonPublisher {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn validate_credentials(&self) -> Result<()> {
        let response = self
            .client
            .get(self.endpoint("accounts/verify_credentials"))
            .bearer_auth(self.config.token.expose_secret())
            .send()
            .await
            .map_err(|e| Error::external("mastodon verify_credentials", e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "mastodon rejected access token");
            return Err(Error::invalid_credentials("Invalid credentials"));
        }
        let account: Account = response
            .json()
            .await
            .map_err(|e| Error::external("mastodon verify_credentials", e))?;

        if let Some(expected) = &self.config.username
            && account.username != expected.trim_start_matches('@')
        {
            return Err(Error::invalid_credentials(format!(
                "Invalid credentials: account is {}, expected {expected}",
                account.username
            )));
        }
        Ok(())
    }

    async fn send(&self, message: &str, event: Option<&Event>) -> Result<()> {
        let form = [
            ("status", message),
            ("visibility", self.config.visibility.as_str()),
        ];
        let response = self
            .client
            .post(self.endpoint("statuses"))
            .bearer_auth(self.config.token.expose_secret())
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::send(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body: ApiError = response.json().await.unwrap_or_default();
        warn!(
            event_id = event.map(|e| e.id().to_string()).as_deref(),
            %status,
            error = %body.error,
            "mastodon refused the status"
        );
        if body.error.is_empty() {
            Err(Error::send(format!("mastodon returned {status}")))
        } else {
            Err(Error::send(body.error))
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::config::{DEFAULT_MAX_LENGTH, Visibility},
        mockito::Matcher,
        secrecy::Secret,
    };

    fn publisher(instance: String, username: Option<&str>) -> MastodonPublisher {
        MastodonPublisher::new(MastodonConfig {
            instance,
            token: Secret::new("tok".into()),
            username: username.map(String::from),
            visibility: Visibility::Unlisted,
            max_length: DEFAULT_MAX_LENGTH,
        })
    }

    #[tokio::test]
    async fn credentials_checked_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/accounts/verify_credentials")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"1","username":"events","acct":"events"}"#)
            .create_async()
            .await;

        publisher(server.url(), Some("@events"))
            .validate_credentials()
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn username_mismatch_is_invalid_credentials() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/accounts/verify_credentials")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"1","username":"someone","acct":"someone"}"#)
            .create_async()
            .await;

        let err = publisher(server.url(), Some("events"))
            .validate_credentials()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials { .. }));
    }

    #[tokio::test]
    async fn revoked_token_is_invalid_credentials() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/accounts/verify_credentials")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"The access token is invalid"}"#)
            .create_async()
            .await;

        let err = publisher(server.url(), None)
            .validate_credentials()
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn send_posts_status_with_visibility() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/statuses")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("status".into(), "hello".into()),
                Matcher::UrlEncoded("visibility".into(), "unlisted".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"103254962155278888"}"#)
            .create_async()
            .await;

        publisher(server.url(), None).send("hello", None).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_status_reports_error_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/statuses")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Validation failed: Text character limit of 500 exceeded"}"#)
            .create_async()
            .await;

        let err = publisher(server.url(), None)
            .send("x", None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Text character limit of 500 exceeded"
        );
    }
}
