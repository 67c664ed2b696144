use {
    reshare_channels::{
        Error, Formatter, Result,
        text::{char_len, format_time_range},
    },
    reshare_common::types::Event,
};

/// Zulip rejects message bodies above 10000 characters.
pub const ZULIP_MAX_MESSAGE_LEN: usize = 10_000;

/// Renders events as Zulip Markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZulipFormatter;

impl Formatter for ZulipFormatter {
    fn validate_event(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    fn render(&self, event: &Event) -> String {
        let mut out = format!(
            "**{}**\n\n🕒 {}",
            event.name(),
            format_time_range(event.begin(), event.end())
        );
        if let Some(location) = event.location() {
            out.push_str(&format!("\n📍 {location}"));
        }
        if let Some(description) = event.description().map(str::trim).filter(|d| !d.is_empty()) {
            out.push_str("\n\n");
            out.push_str(description);
        }
        if let Some(link) = event.link() {
            out.push_str(&format!("\n\n🔗 [Link]({link})"));
        }
        out
    }

    fn validate_message(&self, message: &str) -> Result<()> {
        if message.trim().is_empty() {
            return Err(Error::invalid_message("Message is empty"));
        }
        let len = char_len(message);
        if len > ZULIP_MAX_MESSAGE_LEN {
            return Err(Error::invalid_message(format!(
                "Message is too long ({len} > {ZULIP_MAX_MESSAGE_LEN} characters)"
            )));
        }
        Ok(())
    }

    fn recap_header(&self) -> String {
        "**📅 Upcoming events**".to_string()
    }

    fn recap_fragment(&self, event: &Event) -> String {
        let mut out = format!(
            "* **{}** ({})",
            event.name(),
            format_time_range(event.begin(), event.end())
        );
        if let Some(link) = event.link() {
            out.push_str(&format!(" [Link]({link})"));
        }
        out
    }
}
