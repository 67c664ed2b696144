use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Configuration for the Zulip bot used to publish.
#[derive(Clone, Serialize, Deserialize)]
pub struct ZulipConfig {
    /// Organization URL, e.g. `https://chat.example.org`.
    pub instance: String,

    /// Bot account email, as shown in the Zulip bot settings.
    pub bot_email: String,

    /// Bot API key.
    #[serde(serialize_with = "serialize_secret")]
    pub bot_token: Secret<String>,

    /// Stream messages are posted to.
    pub stream: String,

    /// Topic inside the stream.
    #[serde(default = "default_topic")]
    pub topic: String,
}

fn default_topic() -> String {
    "Events".into()
}

impl ZulipConfig {
    /// Decode a raw channel entry (extra keys such as `active` are ignored).
    pub fn from_value(value: &serde_json::Value) -> reshare_channels::Result<Self> {
        Ok(Self::deserialize(value)?)
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.instance.trim_end_matches('/')
    }
}

impl std::fmt::Debug for ZulipConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZulipConfig")
            .field("instance", &self.instance)
            .field("bot_email", &self.bot_email)
            .field("bot_token", &"[REDACTED]")
            .field("stream", &self.stream)
            .field("topic", &self.topic)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_defaults_and_base_url_is_trimmed() {
        let cfg = ZulipConfig::from_value(&serde_json::json!({
            "active": true,
            "instance": "https://chat.example.org/",
            "bot_email": "events-bot@chat.example.org",
            "bot_token": "key",
            "stream": "events",
        }))
        .unwrap();
        assert_eq!(cfg.topic, "Events");
        assert_eq!(cfg.base_url(), "https://chat.example.org");
        assert!(!format!("{cfg:?}").contains("\"key\""));
    }
}
