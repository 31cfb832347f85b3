//! Option catalog
//!
//! Declares every configuration option the reporter understands as a static
//! table of [`OptionDescriptor`]s. Each descriptor owns a typed slot with its
//! default and plain function accessors into [`ReporterConfig`], so defaults,
//! help text and resolution all read from the same table.

use std::fmt;

use crate::report::format::DEFAULT_TIMESTAMP_FORMAT;

/// Prefix that environment variables must carry to be considered options
pub const ENV_PREFIX: &str = "QUACKERS_";

/// Semantic type of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Free text, used verbatim
    String,
    /// Flag parsed from the truthy/falsy token sets
    Bool,
    /// Base-10 integer
    Int,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
        };
        f.write_str(name)
    }
}

/// A typed option value, as read back out of a [`ReporterConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// String option; `None` means unset
    Str(Option<String>),
    /// Flag option
    Bool(bool),
    /// Integer option
    Int(i64),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(Some(s)) => write!(f, "{s}"),
            Self::Str(None) => f.write_str("not set"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
        }
    }
}

/// Typed storage slot for one option: its default plus accessors.
///
/// The option kind is implied by the variant, so there is no way to declare
/// an option the resolver cannot coerce.
#[derive(Clone, Copy)]
pub enum OptionSlot {
    /// String slot
    Str {
        /// Default value (`None` = unset)
        default: Option<&'static str>,
        /// Read the current value
        get: fn(&ReporterConfig) -> Option<&str>,
        /// Overwrite the current value
        set: fn(&mut ReporterConfig, Option<String>),
    },
    /// Flag slot
    Bool {
        /// Default value
        default: bool,
        /// Read the current value
        get: fn(&ReporterConfig) -> bool,
        /// Overwrite the current value
        set: fn(&mut ReporterConfig, bool),
    },
    /// Integer slot
    Int {
        /// Default value
        default: i64,
        /// Read the current value
        get: fn(&ReporterConfig) -> i64,
        /// Overwrite the current value
        set: fn(&mut ReporterConfig, i64),
    },
}

/// A named, typed, documented configuration slot
#[derive(Clone, Copy)]
pub struct OptionDescriptor {
    /// Stable identifier, in `PascalCase`
    pub name: &'static str,
    /// Older names still accepted for this option
    pub aliases: &'static [&'static str],
    /// One-line help text
    pub help: &'static str,
    /// Typed default and accessors
    pub slot: OptionSlot,
}

impl fmt::Debug for OptionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("default", &self.default_value())
            .finish_non_exhaustive()
    }
}

impl OptionDescriptor {
    /// The option's semantic type
    #[must_use]
    pub const fn kind(&self) -> OptionKind {
        match self.slot {
            OptionSlot::Str { .. } => OptionKind::String,
            OptionSlot::Bool { .. } => OptionKind::Bool,
            OptionSlot::Int { .. } => OptionKind::Int,
        }
    }

    /// The declared default as a typed value
    #[must_use]
    pub fn default_value(&self) -> OptionValue {
        match self.slot {
            OptionSlot::Str { default, .. } => OptionValue::Str(default.map(str::to_string)),
            OptionSlot::Bool { default, .. } => OptionValue::Bool(default),
            OptionSlot::Int { default, .. } => OptionValue::Int(default),
        }
    }

    /// Read this option's value out of a config
    #[must_use]
    pub fn current(&self, config: &ReporterConfig) -> OptionValue {
        match self.slot {
            OptionSlot::Str { get, .. } => OptionValue::Str(get(config).map(str::to_string)),
            OptionSlot::Bool { get, .. } => OptionValue::Bool(get(config)),
            OptionSlot::Int { get, .. } => OptionValue::Int(get(config)),
        }
    }

    /// Reset this option to its declared default
    pub fn apply_default(&self, config: &mut ReporterConfig) {
        match self.slot {
            OptionSlot::Str { default, set, .. } => set(config, default.map(str::to_string)),
            OptionSlot::Bool { default, set, .. } => set(config, default),
            OptionSlot::Int { default, set, .. } => set(config, default),
        }
    }

    /// Environment variable spelling, e.g. `QUACKERS_SLOW_TEST_THRESHOLD_MS`
    #[must_use]
    pub fn env_name(&self) -> String {
        format!("{ENV_PREFIX}{}", screaming_snake(self.name))
    }
}

/// Convert `PascalCase` into `SCREAMING_SNAKE_CASE`.
fn screaming_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        out.push(c.to_ascii_uppercase());
    }
    out
}

/// Fully populated reporter configuration.
///
/// Built once per run by the resolver and then owned, read-only, by the
/// reporting engine. String options that are unset hold `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ReporterConfig {
    /// Label for passed tests
    pub pass_label: Option<String>,
    /// Label for failed tests
    pub fail_label: Option<String>,
    /// Label for tests with no outcome
    pub none_label: Option<String>,
    /// Label for skipped tests
    pub skip_label: Option<String>,
    /// Label for tests that could not be found
    pub not_found_label: Option<String>,
    /// Disable all coloring
    pub no_color: bool,
    /// Color theme name
    pub theme: Option<String>,
    /// Track and report slow tests
    pub highlight_slow_tests: bool,
    /// Duration (ms) at or above which a test is slow
    pub slow_test_threshold_ms: i64,
    /// Print totals in the summary
    pub show_totals: bool,
    /// Print failure details as failures happen
    pub output_failures_inline: bool,
    /// Allow configuration help output
    pub show_help: bool,
    /// Prefix written before every output line
    pub log_prefix: Option<String>,
    /// Prefix written before every test name
    pub test_name_prefix: Option<String>,
    /// Printed before the summary
    pub summary_start_marker: Option<String>,
    /// Printed after the summary
    pub summary_complete_marker: Option<String>,
    /// Printed before the failure list
    pub failure_start_marker: Option<String>,
    /// Printed after the failure list
    pub failure_complete_marker: Option<String>,
    /// Printed before the slow test list
    pub slow_summary_start_marker: Option<String>,
    /// Printed after the slow test list
    pub slow_summary_complete_marker: Option<String>,
    /// Printed before the totals block
    pub summary_totals_start_marker: Option<String>,
    /// Printed after the totals block
    pub summary_totals_complete_marker: Option<String>,
    /// Literal used in place of `[n]` for failures
    pub failure_index_placeholder: Option<String>,
    /// Literal used in place of `[n]` for slow tests
    pub slow_index_placeholder: Option<String>,
    /// Maximum slow tests listed in the summary
    pub max_slow_tests_to_display: i64,
    /// Add a timestamp to every per-test line
    pub show_timestamps: bool,
    /// chrono strftime pattern for per-test timestamps
    pub timestamp_format: Option<String>,
}

impl ReporterConfig {
    /// A config with every slot zeroed, before defaults are applied
    const fn blank() -> Self {
        Self {
            pass_label: None,
            fail_label: None,
            none_label: None,
            skip_label: None,
            not_found_label: None,
            no_color: false,
            theme: None,
            highlight_slow_tests: false,
            slow_test_threshold_ms: 0,
            show_totals: false,
            output_failures_inline: false,
            show_help: false,
            log_prefix: None,
            test_name_prefix: None,
            summary_start_marker: None,
            summary_complete_marker: None,
            failure_start_marker: None,
            failure_complete_marker: None,
            slow_summary_start_marker: None,
            slow_summary_complete_marker: None,
            summary_totals_start_marker: None,
            summary_totals_complete_marker: None,
            failure_index_placeholder: None,
            slow_index_placeholder: None,
            max_slow_tests_to_display: 0,
            show_timestamps: false,
            timestamp_format: None,
        }
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        let mut config = Self::blank();
        for option in describe() {
            option.apply_default(&mut config);
        }
        config
    }
}

macro_rules! string_option {
    ($name:literal, $field:ident, $default:expr, $help:literal) => {
        OptionDescriptor {
            name: $name,
            aliases: &[],
            help: $help,
            slot: OptionSlot::Str {
                default: $default,
                get: |c| c.$field.as_deref(),
                set: |c, v| c.$field = v,
            },
        }
    };
}

macro_rules! bool_option {
    ($name:literal, $field:ident, $default:expr, $help:literal) => {
        OptionDescriptor {
            name: $name,
            aliases: &[],
            help: $help,
            slot: OptionSlot::Bool {
                default: $default,
                get: |c| c.$field,
                set: |c, v| c.$field = v,
            },
        }
    };
}

macro_rules! int_option {
    ($name:literal, $field:ident, $default:expr, $help:literal) => {
        OptionDescriptor {
            name: $name,
            aliases: &[],
            help: $help,
            slot: OptionSlot::Int {
                default: $default,
                get: |c| c.$field,
                set: |c, v| c.$field = v,
            },
        }
    };
}

static OPTIONS: &[OptionDescriptor] = &[
    string_option!("PassLabel", pass_label, Some("✅"), "label for passed tests"),
    string_option!("FailLabel", fail_label, Some("🛑"), "label for failed tests"),
    string_option!("NoneLabel", none_label, Some("❓"), "label for tests with no outcome"),
    string_option!("SkipLabel", skip_label, Some("🚫"), "label for skipped tests"),
    string_option!("NotFoundLabel", not_found_label, Some("🤷"), "label for tests that were not found"),
    bool_option!("NoColor", no_color, false, "disable colored output (also set by NO_COLOR)"),
    string_option!("Theme", theme, Some("default"), "color theme: default or darker"),
    bool_option!("HighlightSlowTests", highlight_slow_tests, true, "track slow tests and list them in the summary"),
    int_option!("SlowTestThresholdMs", slow_test_threshold_ms, 1000, "duration in ms at or above which a test is slow"),
    OptionDescriptor {
        name: "ShowTotals",
        aliases: &["VerboseSummary"],
        help: "show passed/failed/skipped totals and run time in the summary",
        slot: OptionSlot::Bool {
            default: false,
            get: |c| c.show_totals,
            set: |c, v| c.show_totals = v,
        },
    },
    bool_option!("OutputFailuresInline", output_failures_inline, false, "print failure messages and stack traces as failures happen"),
    bool_option!("ShowHelp", show_help, true, "show this help (also shown when unknown options are found)"),
    string_option!("LogPrefix", log_prefix, None, "prefix for every line of output"),
    string_option!("TestNamePrefix", test_name_prefix, None, "prefix for every test name"),
    string_option!("SummaryStartMarker", summary_start_marker, None, "line printed before the summary"),
    string_option!("SummaryCompleteMarker", summary_complete_marker, None, "line printed after the summary"),
    string_option!("FailureStartMarker", failure_start_marker, None, "line printed before the failure list"),
    string_option!("FailureCompleteMarker", failure_complete_marker, None, "line printed after the failure list"),
    string_option!("SlowSummaryStartMarker", slow_summary_start_marker, None, "line printed before the slow test list"),
    string_option!("SlowSummaryCompleteMarker", slow_summary_complete_marker, None, "line printed after the slow test list"),
    string_option!("SummaryTotalsStartMarker", summary_totals_start_marker, None, "line printed before the totals"),
    string_option!("SummaryTotalsCompleteMarker", summary_totals_complete_marker, None, "line printed after the totals"),
    string_option!("FailureIndexPlaceholder", failure_index_placeholder, None, "literal used instead of [n] for each failure"),
    string_option!("SlowIndexPlaceholder", slow_index_placeholder, None, "literal used instead of [n] for each slow test"),
    int_option!("MaxSlowTestsToDisplay", max_slow_tests_to_display, 10, "maximum number of slow tests listed in the summary"),
    bool_option!("ShowTimestamps", show_timestamps, false, "prefix each test line with a timestamp"),
    string_option!("TimestampFormat", timestamp_format, Some(DEFAULT_TIMESTAMP_FORMAT), "strftime pattern for timestamps"),
];

/// The full option catalog, in declaration order
#[must_use]
pub fn describe() -> &'static [OptionDescriptor] {
    OPTIONS
}
