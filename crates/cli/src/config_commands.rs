use std::path::{Path, PathBuf};

use {anyhow::Result, clap::Subcommand};

use reshare_config::validate::{self, Severity, ValidationResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Write a documented default configuration file.
    Init {
        /// Where to write it. Defaults to the user config directory.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

/// Returns `false` when the configuration has errors.
pub fn handle_config(action: ConfigAction, explicit: Option<&Path>) -> Result<bool> {
    match action {
        ConfigAction::Check { verbose } => Ok(check(explicit, verbose)),
        ConfigAction::Init { path } => {
            let written = reshare_config::init_config(path.as_deref().or(explicit))?;
            eprintln!("Wrote {}", written.display());
            Ok(true)
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(explicit: Option<&Path>, verbose: bool) -> bool {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(reshare_config::find_config_file);
    let result = match &path {
        Some(path) => {
            eprintln!("Checking {}\n", path.display());
            validate::validate(path)
        },
        None => {
            eprintln!("No config file found; checking defaults.\n");
            validate::validate_config(&reshare_config::ReshareConfig::default())
        },
    };

    print_diagnostics(&result, verbose);
    !result.has_errors()
}

fn print_diagnostics(result: &ValidationResult, verbose: bool) {
    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
            Severity::Info => CYAN,
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{}{RESET} {}", d.severity, d.message);
        } else {
            eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }
}
