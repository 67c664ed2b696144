use {
    reshare_channels::{
        Error, Formatter, Result,
        text::{char_len, format_time_range, truncate_chars},
    },
    reshare_common::types::Event,
};

use crate::config::DEFAULT_MAX_LENGTH;

/// Renders events as plain-text statuses, shortening the description so the
/// status fits the instance limit.
#[derive(Debug, Clone, Copy)]
pub struct MastodonFormatter {
    max_length: usize,
}

impl Default for MastodonFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH)
    }
}

impl MastodonFormatter {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    fn head(event: &Event) -> String {
        let mut out = format!(
            "{}\n\n🕒 {}",
            event.name(),
            format_time_range(event.begin(), event.end())
        );
        if let Some(location) = event.location() {
            out.push_str(&format!("\n📍 {location}"));
        }
        out
    }
}

impl Formatter for MastodonFormatter {
    fn validate_event(&self, _event: &Event) -> Result<()> {
        Ok(())
    }

    fn render(&self, event: &Event) -> String {
        let head = Self::head(event);
        let tail = event
            .link()
            .map(|link| format!("\n\n🔗 {link}"))
            .unwrap_or_default();

        let Some(description) = event.description().map(str::trim).filter(|d| !d.is_empty())
        else {
            return format!("{head}{tail}");
        };

        // Two characters go to the blank line before the description.
        let budget = self
            .max_length
            .saturating_sub(char_len(&head) + char_len(&tail) + 2);
        if budget == 0 {
            return format!("{head}{tail}");
        }
        format!("{head}\n\n{}{tail}", truncate_chars(description, budget))
    }

    fn validate_message(&self, message: &str) -> Result<()> {
        if message.trim().is_empty() {
            return Err(Error::invalid_message("Message is empty"));
        }
        let len = char_len(message);
        if len > self.max_length {
            return Err(Error::invalid_message(format!(
                "Message is too long ({len} > {} characters)",
                self.max_length
            )));
        }
        Ok(())
    }

    fn recap_header(&self) -> String {
        "📅 Upcoming events".to_string()
    }

    fn recap_fragment(&self, event: &Event) -> String {
        let mut out = format!(
            "▪️ {} ({})",
            event.name(),
            format_time_range(event.begin(), event.end())
        );
        if let Some(link) = event.link() {
            out.push_str(&format!("\n{link}"));
        }
        out
    }
}
