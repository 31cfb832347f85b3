//! Configuration resolution
//!
//! Resolves the final [`ReporterConfig`] from option defaults, the
//! environment source and the host parameter source, in that order of
//! increasing precedence. Keys are matched leniently: case is ignored and the
//! separators `_`, `-` and `.` are dropped, so `PassLabel`, `pass_label`,
//! `pass-label` and `PASS.LABEL` all name the same option.
//!
//! Nothing here fails. Unknown keys and values that cannot be coerced produce
//! warning [`Diagnostic`]s and leave the previous value in place.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use super::options::{describe, OptionDescriptor, OptionSlot, ReporterConfig, ENV_PREFIX};
use super::source::{RawSource, SourceKind};

/// Values accepted as "on" for flag options (compared case-insensitively)
pub const TRUTHY_VALUES: [&str; 5] = ["yes", "true", "1", "on", "enable"];

/// Values accepted as "off" for flag options (compared case-insensitively)
pub const FALSY_VALUES: [&str; 5] = ["no", "false", "0", "off", "disable"];

/// Reserved key that turns on verbose internal tracing
pub const DEBUG_KEY: &str = "debug";

/// Environment variable that disables color when present with any value
pub const NO_COLOR_ENV: &str = "NO_COLOR";

/// Keys that are never options and never warned about.
///
/// Besides the debug switch, test hosts pass their own bookkeeping values
/// alongside logger parameters.
const RESERVED_KEYS: &[&str] = &[DEBUG_KEY, "TestRunDirectory", "TargetFramework"];

/// Why a raw value could not be applied to an option
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoerceError {
    /// Value is in neither the truthy nor the falsy token set
    #[error("Invalid flag value '{value}' specified for '{option}'")]
    InvalidFlag {
        /// Option name
        option: String,
        /// Offending value
        value: String,
    },

    /// Value is not a base-10 integer
    #[error("Invalid integer value '{value}' specified for '{option}'")]
    InvalidInteger {
        /// Option name
        option: String,
        /// Offending value
        value: String,
    },
}

/// Severity of a resolution diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Severity {
    /// Non-fatal; resolution carried on with the prior value
    Warning,
}

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A key matched no option
    UnknownKey,
    /// A key matched an option but its value could not be coerced
    InvalidValue,
}

/// A non-fatal problem found while resolving configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Always [`Severity::Warning`] today
    pub severity: Severity,
    /// Unknown key or invalid value
    pub kind: DiagnosticKind,
    /// The raw key as it appeared in its source
    pub key: String,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    fn unknown(source: SourceKind, key: &str, value: &str) -> Self {
        let message = match source {
            SourceKind::Environment => {
                format!("Unrecognised quackers environment variable: {key}")
            }
            SourceKind::Parameters => format!("Unrecognised quackers parameter: {key}={value}"),
        };
        Self {
            severity: Severity::Warning,
            kind: DiagnosticKind::UnknownKey,
            key: key.to_string(),
            message,
        }
    }

    fn invalid(key: &str, err: &CoerceError) -> Self {
        Self {
            severity: Severity::Warning,
            kind: DiagnosticKind::InvalidValue,
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of resolving configuration
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Final configuration, every option populated
    pub config: ReporterConfig,
    /// Warnings produced along the way, in encounter order
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the caller should print configuration help
    pub help_requested: bool,
    /// Whether the reserved debug key was set to a truthy value
    pub debug: bool,
}

impl Resolution {
    /// True when at least one key matched no option
    #[must_use]
    pub fn has_unknown_keys(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnknownKey)
    }
}

/// Normalize a key for lenient matching: lower-case, separators removed.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Strip the environment prefix, ignoring case. `None` if absent.
fn strip_env_prefix(key: &str) -> Option<&str> {
    let head = key.get(..ENV_PREFIX.len())?;
    head.eq_ignore_ascii_case(ENV_PREFIX)
        .then(|| &key[ENV_PREFIX.len()..])
}

/// The part of `key` that names an option, or `None` when the source does
/// not consider this key at all (unprefixed environment variables).
fn candidate_key(kind: SourceKind, key: &str) -> Option<&str> {
    match kind {
        SourceKind::Environment => strip_env_prefix(key),
        SourceKind::Parameters => Some(key),
    }
}

/// Whether either source sets the reserved debug key to a truthy value.
///
/// Hosts call this before [`resolve`] so tracing is live while resolving.
#[must_use]
pub fn debug_requested(env: &RawSource, params: &RawSource) -> bool {
    [env, params].into_iter().any(|source| {
        source.iter().any(|(key, value)| {
            candidate_key(source.kind(), key).is_some_and(|k| normalize_key(k) == DEBUG_KEY)
                && parse_flag(value) == Some(true)
        })
    })
}

/// Parse a flag token. `None` when the token is in neither set.
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    let lowered = value.to_lowercase();
    if TRUTHY_VALUES.contains(&lowered.as_str()) {
        Some(true)
    } else if FALSY_VALUES.contains(&lowered.as_str()) {
        Some(false)
    } else {
        None
    }
}

fn is_reserved(normalized: &str) -> bool {
    RESERVED_KEYS.iter().any(|k| normalize_key(k) == normalized)
}

/// Find the option a normalized key refers to, including legacy aliases.
#[must_use]
pub fn lookup(normalized: &str) -> Option<&'static OptionDescriptor> {
    describe().iter().find(|option| {
        normalize_key(option.name) == normalized
            || option.aliases.iter().any(|a| normalize_key(a) == normalized)
    })
}

/// Coerce `value` to the option's type and store it.
///
/// On failure the config is left untouched.
pub fn apply_value(
    option: &OptionDescriptor,
    value: &str,
    config: &mut ReporterConfig,
) -> Result<(), CoerceError> {
    match option.slot {
        OptionSlot::Str { set, .. } => set(config, Some(value.to_string())),
        OptionSlot::Bool { set, .. } => {
            let flag = parse_flag(value).ok_or_else(|| CoerceError::InvalidFlag {
                option: option.name.to_string(),
                value: value.to_string(),
            })?;
            set(config, flag);
        }
        OptionSlot::Int { set, .. } => {
            let number = value
                .parse::<i64>()
                .map_err(|_| CoerceError::InvalidInteger {
                    option: option.name.to_string(),
                    value: value.to_string(),
                })?;
            set(config, number);
        }
    }
    Ok(())
}

/// Bookkeeping shared across both sources during one resolution
struct Pass<'a> {
    config: &'a mut ReporterConfig,
    diagnostics: &'a mut Vec<Diagnostic>,
    help_explicit: bool,
}

impl Pass<'_> {
    fn apply(&mut self, source: &RawSource) {
        for (key, value) in source.iter() {
            let Some(candidate) = candidate_key(source.kind(), key) else {
                continue;
            };

            let normalized = normalize_key(candidate);
            if is_reserved(&normalized) {
                continue;
            }

            let Some(option) = lookup(&normalized) else {
                debug!(key, "no option matches key");
                self.diagnostics
                    .push(Diagnostic::unknown(source.kind(), key, value));
                continue;
            };

            if value.is_empty() {
                continue;
            }

            debug!(key, option = option.name, value, "setting option");
            if option.name == "ShowHelp" {
                self.help_explicit = true;
            }
            if let Err(err) = apply_value(option, value, self.config) {
                self.diagnostics.push(Diagnostic::invalid(key, &err));
            }
        }
    }
}

/// Resolve configuration from both sources.
///
/// Precedence, lowest first: option defaults, `env`, `params`. Within one
/// source, keys are visited in sorted order, so if two keys in the same
/// source name the same option the lexically later key wins.
#[must_use]
pub fn resolve(env: &RawSource, params: &RawSource) -> Resolution {
    let mut config = ReporterConfig::default();
    if env.kind() == SourceKind::Environment && env.contains(NO_COLOR_ENV) {
        config.no_color = true;
    }

    let mut diagnostics = Vec::new();
    let mut pass = Pass {
        config: &mut config,
        diagnostics: &mut diagnostics,
        help_explicit: false,
    };
    pass.apply(env);
    pass.apply(params);
    let help_explicit = pass.help_explicit;

    let has_unknown = diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::UnknownKey);
    let help_requested = config.show_help && (help_explicit || has_unknown);

    Resolution {
        config,
        diagnostics,
        help_requested,
        debug: debug_requested(env, params),
    }
}

/// Render configuration help for every option with its current value.
#[must_use]
pub fn render_help(config: &ReporterConfig) -> Vec<String> {
    let mut lines = vec!["Quackers configuration help:".to_string()];
    for option in describe() {
        lines.push(format!(
            "{} : {} ({})",
            option.env_name(),
            option.help,
            option.current(config)
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "Flags can be set on with one of:  {}",
        TRUTHY_VALUES.join(",")
    ));
    lines.push(format!(
        "Flags can be set off with one of: {}",
        FALSY_VALUES.join(",")
    ));
    lines
}
