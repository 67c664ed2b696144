//! Small text helpers shared by the platform formatters.

use chrono::{DateTime, Utc};

/// Escape the characters that are significant in Telegram/Mastodon HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Human readable time range. Collapses the date when both ends fall on the
/// same day.
pub fn format_time_range(begin: DateTime<Utc>, end: DateTime<Utc>) -> String {
    if begin.date_naive() == end.date_naive() {
        format!(
            "{} {} - {} UTC",
            begin.format("%Y-%m-%d"),
            begin.format("%H:%M"),
            end.format("%H:%M")
        )
    } else {
        format!(
            "{} - {} UTC",
            begin.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Length in Unicode scalar values, which is how the platforms count limits.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Length of the text an HTML message displays: tags are dropped and each
/// entity written by [`escape_html`] counts as one character.
pub fn html_text_len(html: &str) -> usize {
    const ENTITIES: [&str; 4] = ["&amp;", "&lt;", "&gt;", "&quot;"];

    let mut len = 0;
    let mut rest = html;
    while let Some(ch) = rest.chars().next() {
        if ch == '<'
            && let Some(end) = rest.find('>')
        {
            rest = &rest[end + 1..];
            continue;
        }
        let skip = match ENTITIES.iter().find(|e| rest.starts_with(**e)) {
            Some(entity) => entity.len(),
            None => ch.len_utf8(),
        };
        rest = &rest[skip..];
        len += 1;
    }
    len
}

/// Cut `text` to at most `max_chars` characters, appending an ellipsis when
/// something was removed.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}
