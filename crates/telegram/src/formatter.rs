use {
    reshare_channels::{
        Error, Formatter, Result,
        text::{escape_html, format_time_range, html_text_len},
    },
    reshare_common::types::Event,
};

/// Telegram caps a single text message at 4096 characters, counted after
/// the HTML markup is parsed away.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Renders events as Telegram HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelegramFormatter;

impl Formatter for TelegramFormatter {
    fn validate_event(&self, event: &Event) -> Result<()> {
        if event.description().is_none_or(|d| d.trim().is_empty()) {
            return Err(Error::invalid_event("No description was found"));
        }
        Ok(())
    }

    fn render(&self, event: &Event) -> String {
        let mut out = format!(
            "<b>{}</b>\n\n🕒 {}",
            escape_html(event.name()),
            format_time_range(event.begin(), event.end())
        );
        if let Some(location) = event.location() {
            out.push_str(&format!("\n📍 {}", escape_html(location)));
        }
        if let Some(description) = event.description() {
            out.push_str("\n\n");
            out.push_str(&escape_html(description.trim()));
        }
        if let Some(link) = event.link() {
            out.push_str(&format!(
                "\n\n🔗 <a href=\"{}\">Link</a>",
                escape_html(link)
            ));
        }
        out
    }

    fn validate_message(&self, message: &str) -> Result<()> {
        if message.trim().is_empty() {
            return Err(Error::invalid_message("Message is empty"));
        }
        let len = html_text_len(message);
        if len > TELEGRAM_MAX_MESSAGE_LEN {
            return Err(Error::invalid_message(format!(
                "Message is too long ({len} > {TELEGRAM_MAX_MESSAGE_LEN} characters)"
            )));
        }
        Ok(())
    }

    fn recap_header(&self) -> String {
        "<b>📅 Upcoming events</b>".to_string()
    }

    fn recap_fragment(&self, event: &Event) -> String {
        let mut out = format!(
            "• <b>{}</b>\n{}",
            escape_html(event.name()),
            format_time_range(event.begin(), event.end())
        );
        if let Some(link) = event.link() {
            out.push_str(&format!("\n{}", escape_html(link)));
        }
        out
    }
}
