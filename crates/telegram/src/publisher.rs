use std::{future::Future, time::Duration};

use {
    async_trait::async_trait,
    secrecy::ExposeSecret,
    teloxide::{
        RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{ChatId, ParseMode, Recipient},
    },
    tracing::{debug, warn},
};

use {
    reshare_channels::{Error, Publisher, Result},
    reshare_common::types::Event,
};

use crate::{CHANNEL_NAME, config::TelegramConfig};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Sends messages to one Telegram chat through the Bot API.
pub struct TelegramPublisher {
    bot: Bot,
    chat: Recipient,
    username: Option<String>,
}

impl TelegramPublisher {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let mut bot = Bot::new(config.token.expose_secret());
        if let Some(api_url) = &config.api_url {
            let url = reqwest::Url::parse(api_url)
                .map_err(|e| Error::external(format!("invalid api_url {api_url}"), e))?;
            bot = bot.set_api_url(url);
        }
        Ok(Self {
            bot,
            chat: parse_recipient(&config.chat_id),
            username: config.username,
        })
    }

    async fn run_with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut request: F,
    ) -> std::result::Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };
                    if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            operation,
                            retries,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }
                    retries += 1;
                    warn!(
                        operation,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn validate_credentials(&self) -> Result<()> {
        let me = match self
            .run_with_retry("get me", || {
                let req = self.bot.get_me();
                async move { req.await }
            })
            .await
        {
            Ok(me) => me,
            Err(RequestError::Api(e)) => {
                debug!(error = %e, "telegram rejected bot token");
                return Err(Error::invalid_credentials("Invalid credentials"));
            },
            Err(e) => return Err(Error::external("telegram getMe", e)),
        };

        if let Some(expected) = &self.username
            && me.user.username.as_deref() != Some(expected.trim_start_matches('@'))
        {
            return Err(Error::invalid_credentials(format!(
                "Invalid credentials: bot username is {}, expected {expected}",
                me.user.username.as_deref().unwrap_or("<none>")
            )));
        }
        Ok(())
    }

    async fn send(&self, message: &str, event: Option<&Event>) -> Result<()> {
        let event_id = event.map(|e| e.id().to_string());
        let html = self
            .run_with_retry("send message (html)", || {
                let req = self
                    .bot
                    .send_message(self.chat.clone(), message)
                    .parse_mode(ParseMode::Html);
                async move { req.await }
            })
            .await;

        match html {
            Ok(_) => Ok(()),
            Err(RequestError::Api(e)) => {
                warn!(
                    event_id = event_id.as_deref(),
                    error = %e,
                    "telegram HTML send failed, retrying as plain text"
                );
                self.run_with_retry("send message (plain)", || {
                    let req = self.bot.send_message(self.chat.clone(), message);
                    async move { req.await }
                })
                .await
                .map(|_| ())
                .map_err(|e| Error::send(e.to_string()))
            },
            Err(e) => Err(Error::send(e.to_string())),
        }
    }
}

/// Numeric ids address chats directly, anything else is a public
/// `@channelname`.
fn parse_recipient(chat_id: &str) -> Recipient {
    let chat_id = chat_id.trim();
    match chat_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if chat_id.starts_with('@') => Recipient::ChannelUsername(chat_id.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{chat_id}")),
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}
