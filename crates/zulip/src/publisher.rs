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

use crate::{CHANNEL_NAME, config::ZulipConfig};

/// Envelope shared by every Zulip REST response.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    result: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    is_bot: Option<bool>,
}

impl ApiResponse {
    fn is_success(&self) -> bool {
        self.result == "success"
    }
}

/// Posts messages to a Zulip stream with bot credentials.
pub struct ZulipPublisher {
    client: reqwest::Client,
    config: ZulipConfig,
}

impl ZulipPublisher {
    pub fn new(config: ZulipConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1/{path}", self.config.base_url())
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(
            &self.config.bot_email,
            Some(self.config.bot_token.expose_secret()),
        )
    }
}

#[async_trait]
impl Publisher for ZulipPublisher {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn validate_credentials(&self) -> Result<()> {
        let response = self
            .authorized(self.client.get(self.endpoint("users/me")))
            .send()
            .await
            .map_err(|e| Error::external("zulip users/me", e))?;
        let status = response.status();
        let body: ApiResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!(%status, error = %e, "zulip returned an unreadable users/me response");
                return Err(Error::invalid_credentials("Invalid credentials"));
            },
        };

        if !body.is_success() {
            debug!(%status, msg = %body.msg, "zulip rejected bot credentials");
            return Err(Error::invalid_credentials("Invalid credentials"));
        }
        if body.is_bot != Some(true) {
            return Err(Error::invalid_credentials(
                "Invalid credentials: the account is not a bot",
            ));
        }
        if body.email.as_deref() != Some(self.config.bot_email.as_str()) {
            return Err(Error::invalid_credentials(format!(
                "Invalid credentials: bot email is {}, expected {}",
                body.email.as_deref().unwrap_or("<none>"),
                self.config.bot_email
            )));
        }
        Ok(())
    }

    async fn send(&self, message: &str, event: Option<&Event>) -> Result<()> {
        let form = [
            ("type", "stream"),
            ("to", self.config.stream.as_str()),
            ("topic", self.config.topic.as_str()),
            ("content", message),
        ];
        let response = self
            .authorized(self.client.post(self.endpoint("messages")))
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::send(e.to_string()))?;
        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::send(format!("unexpected zulip response ({status}): {e}")))?;

        if !body.is_success() {
            warn!(
                event_id = event.map(|e| e.id().to_string()).as_deref(),
                %status,
                msg = %body.msg,
                "zulip refused the message"
            );
            return Err(Error::send(body.msg));
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher, secrecy::Secret};

    fn publisher(instance: String) -> ZulipPublisher {
        ZulipPublisher::new(ZulipConfig {
            instance,
            bot_email: "events-bot@chat.example.org".into(),
            bot_token: Secret::new("key".into()),
            stream: "events".into(),
            topic: "Events".into(),
        })
    }

    #[tokio::test]
    async fn valid_bot_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/users/me")
            .match_header("authorization", Matcher::Regex("^Basic ".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"result":"success","msg":"","email":"events-bot@chat.example.org","is_bot":true,"user_id":7}"#,
            )
            .create_async()
            .await;

        publisher(server.url()).validate_credentials().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn human_account_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/users/me")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"result":"success","msg":"","email":"events-bot@chat.example.org","is_bot":false}"#,
            )
            .create_async()
            .await;

        let err = publisher(server.url())
            .validate_credentials()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials { .. }));
    }

    #[tokio::test]
    async fn unauthorized_is_invalid_credentials() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/users/me")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result":"error","msg":"Invalid API key","code":"INVALID_API_KEY"}"#)
            .create_async()
            .await;

        let err = publisher(server.url())
            .validate_credentials()
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn send_posts_to_stream_topic() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/messages")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("type".into(), "stream".into()),
                Matcher::UrlEncoded("to".into(), "events".into()),
                Matcher::UrlEncoded("topic".into(), "Events".into()),
                Matcher::UrlEncoded("content".into(), "**hello**".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result":"success","msg":"","id":42}"#)
            .create_async()
            .await;

        publisher(server.url()).send("**hello**", None).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn refused_message_surfaces_zulip_msg() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/messages")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result":"error","msg":"Stream 'events' does not exist","code":"STREAM_DOES_NOT_EXIST"}"#)
            .create_async()
            .await;

        let err = publisher(server.url()).send("hi", None).await.unwrap_err();
        assert!(matches!(err, Error::Send { .. }));
        assert_eq!(err.to_string(), "Stream 'events' does not exist");
    }
}
