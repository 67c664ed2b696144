use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Mastodon's default status limit. Instances may raise it.
pub const DEFAULT_MAX_LENGTH: usize = 500;

/// Who can see the statuses we post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
            Self::Direct => "direct",
        }
    }
}

/// Configuration for the Mastodon account used to publish.
#[derive(Clone, Serialize, Deserialize)]
pub struct MastodonConfig {
    /// Instance URL, e.g. `https://mastodon.example`.
    pub instance: String,

    /// Application access token with `write:statuses` and `read:accounts`.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Expected account username. Checked against `verify_credentials`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default)]
    pub visibility: Visibility,

    /// Character limit enforced on rendered statuses.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

impl MastodonConfig {
    /// Decode a raw channel entry (extra keys such as `active` are ignored).
    pub fn from_value(value: &serde_json::Value) -> reshare_channels::Result<Self> {
        Ok(Self::deserialize(value)?)
    }

    pub fn base_url(&self) -> &str {
        self.instance.trim_end_matches('/')
    }
}

impl std::fmt::Debug for MastodonConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MastodonConfig")
            .field("instance", &self.instance)
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .field("visibility", &self.visibility)
            .field("max_length", &self.max_length)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
