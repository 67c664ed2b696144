//! Configuration validation.
//!
//! Parses a configuration file and reports semantic problems (hours out of
//! range, empty publishing window, channels nobody can build, ...) as
//! diagnostics instead of failing on the first one.

use std::path::{Path, PathBuf};

use crate::{
    env_subst::substitute_env,
    schema::{ChannelsConfig, KNOWN_CHANNELS, ReshareConfig},
};

/// Longest accepted cooldown: one year.
pub const MAX_COOLDOWN_MINUTES: u64 = 365 * 24 * 60;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "range", "channel", "policy"
    pub category: &'static str,
    /// Dotted path, e.g. "publishing.window.begin"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Read, parse and validate the config file at `path`.
pub fn validate(path: &Path) -> ValidationResult {
    let mut diagnostics = Vec::new();
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => substitute_env(&raw),
        Err(e) => {
            diagnostics.push(diag(Severity::Error, "syntax", "", format!("cannot read file: {e}")));
            return ValidationResult {
                diagnostics,
                config_path: Some(path.to_path_buf()),
            };
        },
    };

    match crate::loader::load_config(path) {
        Ok(config) => check_config(&config, &mut diagnostics),
        Err(e) => diagnostics.push(diag(Severity::Error, "syntax", "", e.to_string())),
    }
    check_placeholders(&raw, &mut diagnostics);

    ValidationResult {
        diagnostics,
        config_path: Some(path.to_path_buf()),
    }
}

/// Validate an already loaded configuration.
pub fn validate_config(config: &ReshareConfig) -> ValidationResult {
    let mut diagnostics = Vec::new();
    check_config(config, &mut diagnostics);
    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn diag(
    severity: Severity,
    category: &'static str,
    path: impl Into<String>,
    message: impl Into<String>,
) -> Diagnostic {
    Diagnostic {
        severity,
        category,
        path: path.into(),
        message: message.into(),
    }
}

fn check_config(config: &ReshareConfig, diagnostics: &mut Vec<Diagnostic>) {
    let publishing = &config.publishing;
    let window = &publishing.window;

    for (field, hour) in [("begin", window.begin), ("end", window.end)] {
        if hour > 23 {
            diagnostics.push(diag(
                Severity::Error,
                "range",
                format!("publishing.window.{field}"),
                format!("hour must be between 0 and 23, got {hour}"),
            ));
        }
    }
    if window.begin == window.end {
        diagnostics.push(diag(
            Severity::Warning,
            "policy",
            "publishing.window",
            "window begin and end are the same hour: the window is empty and nothing will be published",
        ));
    }
    let tz = window.timezone.as_str();
    if !tz.eq_ignore_ascii_case("local") && tz.parse::<chrono_tz::Tz>().is_err() {
        diagnostics.push(diag(
            Severity::Error,
            "range",
            "publishing.window.timezone",
            format!("unknown timezone: {tz}"),
        ));
    }

    if publishing.cooldown_minutes == 0 {
        diagnostics.push(diag(
            Severity::Info,
            "policy",
            "publishing.cooldown_minutes",
            "cooldown is disabled: every run may publish an event",
        ));
    } else if publishing.cooldown_minutes > MAX_COOLDOWN_MINUTES {
        diagnostics.push(diag(
            Severity::Error,
            "range",
            "publishing.cooldown_minutes",
            format!(
                "cooldown of {} minutes is longer than {MAX_COOLDOWN_MINUTES}",
                publishing.cooldown_minutes
            ),
        ));
    }
    if publishing.channel_timeout_secs == 0 {
        diagnostics.push(diag(
            Severity::Error,
            "range",
            "publishing.channel_timeout_secs",
            "timeout must be at least one second",
        ));
    }

    if config.publishers.active_names().is_empty() {
        diagnostics.push(diag(
            Severity::Warning,
            "channel",
            "publishers",
            "no active publisher: events will never be published",
        ));
    }
    check_channel_names("publishers", &config.publishers, diagnostics);
    check_channel_names("notifiers", &config.notifiers, diagnostics);
}

fn check_channel_names(section: &str, channels: &ChannelsConfig, diagnostics: &mut Vec<Diagnostic>) {
    for name in channels.names() {
        if !KNOWN_CHANNELS.contains(&name) {
            diagnostics.push(diag(
                Severity::Warning,
                "channel",
                format!("{section}.{name}"),
                format!(
                    "unknown channel \"{name}\" (known: {})",
                    KNOWN_CHANNELS.join(", ")
                ),
            ));
        }
    }
}

/// Flag `${VAR}` placeholders that survived substitution: the variable is not
/// set and the literal text would be used as a credential.
fn check_placeholders(raw: &str, diagnostics: &mut Vec<Diagnostic>) {
    for line in raw.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            continue;
        }
        if let Some(start) = trimmed.find("${")
            && let Some(len) = trimmed[start..].find('}')
        {
            let var = &trimmed[start + 2..start + len];
            diagnostics.push(diag(
                Severity::Warning,
                "channel",
                "",
                format!("environment variable {var} is not set"),
            ));
        }
    }
}
