//! Default configuration template with all options documented.

/// Generate the default config template written by `reshare config init`.
pub fn default_config_template() -> String {
    r##"# Reshare Configuration
# =====================
# Uncomment and modify settings as needed.
#
# Environment variable substitution is supported: ${ENV_VAR}
# Example: token = "${TELEGRAM_TOKEN}"

# ══════════════════════════════════════════════════════════════════════════════
# PUBLISHING POLICY
# ══════════════════════════════════════════════════════════════════════════════

[publishing]
cooldown_minutes = 60             # Minimum gap between two published events
channel_timeout_secs = 30         # Upper bound for every single channel call

[publishing.window]
begin = 8                         # First hour (0-23) when `reshare start` may publish
end = 22                          # First hour after the window; begin > end wraps midnight
timezone = "local"                # "local", "UTC" or an IANA name like "Europe/Rome"

# ══════════════════════════════════════════════════════════════════════════════
# STORAGE
# ══════════════════════════════════════════════════════════════════════════════

[database]
# path = "/var/lib/reshare/reshare.db"   # Default: <data dir>/reshare.db

# ══════════════════════════════════════════════════════════════════════════════
# PUBLISHERS
# ══════════════════════════════════════════════════════════════════════════════
# Channels that events are announced on. Only entries with `active = true`
# take part in publishing.

# [publishers.telegram]
# active = true
# token = "${TELEGRAM_TOKEN}"
# chat_id = "-1001234567890"
# username = "my_events_bot"     # Optional: checked against getMe

# [publishers.zulip]
# active = true
# instance = "https://zulip.example.org"
# bot_email = "events-bot@zulip.example.org"
# bot_token = "${ZULIP_TOKEN}"
# stream = "events"
# topic = "Upcoming events"

# [publishers.mastodon]
# active = true
# instance = "https://mastodon.example.org"
# token = "${MASTODON_TOKEN}"
# username = "events"            # Optional: checked against verify_credentials
# visibility = "public"
# max_length = 500

# ══════════════════════════════════════════════════════════════════════════════
# NOTIFIERS
# ══════════════════════════════════════════════════════════════════════════════
# Operator channels that receive a message whenever a publication fails.
# Same settings as the publishers above.

# [notifiers.telegram]
# active = true
# token = "${TELEGRAM_TOKEN}"
# chat_id = "123456789"
"##
    .to_string()
}
