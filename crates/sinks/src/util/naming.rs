//! File naming for the rotating file sink
//!
//! Two schemes:
//!
//! - **Default**: `<binary>-<%Y-%m-%dT%H%M%S>.log`, archived as
//!   `<binary>-<timestamp>.tgz`.
//! - **Pattern**: a single `*` is replaced with a random non-negative 31-bit
//!   number. `app-*` yields `app-1804289383.log`, archived as
//!   `app-1804289383.tgz`.
//!
//! Each scheme has a *family*: the regexes that recognise its logs and
//! archives, so the archiver and the sweeper never touch another sink's files
//! in a shared directory. A default-scheme name taken within the same second
//! gets a `.<n>` counter before the extension.

use std::fmt;
use std::path::Path;

use chrono::Local;
use rand::Rng;
use regex::Regex;
use thiserror::Error;

/// Timestamp layout of the default scheme
pub const DEFAULT_TIME_LAYOUT: &str = "%Y-%m-%dT%H%M%S";

/// Candidate names tried before the pattern scheme gives up
pub const MAX_NAME_ATTEMPTS: usize = 100;

/// Binary name used when the executable name cannot be determined
const FALLBACK_BINARY_NAME: &str = "fanlog";

const LOG_EXTENSION: &str = ".log";
const ARCHIVE_EXTENSION: &str = ".tgz";

/// Errors from pattern validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    /// Pattern is empty
    #[error("filename pattern must not be empty")]
    Empty,

    /// Pattern names a path instead of a file
    #[error("filename pattern '{0}' contains a path separator")]
    PathSeparator(String),

    /// More than one wildcard
    #[error("filename pattern '{0}' contains more than one '*'")]
    MultipleWildcards(String),

    /// Family regex failed to compile
    #[error("filename pattern '{pattern}' produced an invalid family regex: {message}")]
    Regex {
        /// Offending pattern
        pattern: String,
        /// Regex compiler message
        message: String,
    },
}

type RandomSource = Box<dyn Fn() -> u32 + Send + Sync>;

/// Prefix and suffix around the wildcard; the suffix always ends in `.log`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pattern {
    prefix: String,
    suffix: String,
}

impl Pattern {
    fn parse(pattern: &str) -> Result<Self, NamingError> {
        if pattern.is_empty() {
            return Err(NamingError::Empty);
        }
        if pattern.contains(['/', '\\', std::path::MAIN_SEPARATOR]) {
            return Err(NamingError::PathSeparator(pattern.to_string()));
        }
        if pattern.matches('*').count() > 1 {
            return Err(NamingError::MultipleWildcards(pattern.to_string()));
        }

        let (prefix, suffix) = match pattern.split_once('*') {
            Some((prefix, suffix)) => (prefix.to_string(), suffix.to_string()),
            None => (pattern.to_string(), String::new()),
        };

        let suffix = if suffix.ends_with(LOG_EXTENSION) {
            suffix
        } else {
            format!("{suffix}{LOG_EXTENSION}")
        };

        Ok(Self { prefix, suffix })
    }

    fn family(&self, raw: &str) -> Result<Family, NamingError> {
        let stem = self.suffix.strip_suffix(LOG_EXTENSION).unwrap_or(&self.suffix);
        let source = format!(r"^{}\d+{}", regex::escape(&self.prefix), regex::escape(stem));
        Family::compile(&source, raw)
    }

    fn candidate(&self, n: u32) -> String {
        format!("{}{}{}", self.prefix, n, self.suffix)
    }
}

/// Log and archive regexes sharing one stem
#[derive(Debug, Clone)]
struct Family {
    logs: Regex,
    archives: Regex,
}

impl Family {
    fn compile(stem: &str, raw: &str) -> Result<Self, NamingError> {
        let compile = |extension: &str| {
            Regex::new(&format!("{stem}{}$", regex::escape(extension))).map_err(|e| {
                NamingError::Regex {
                    pattern: raw.to_string(),
                    message: e.to_string(),
                }
            })
        };
        Ok(Self {
            logs: compile(LOG_EXTENSION)?,
            archives: compile(ARCHIVE_EXTENSION)?,
        })
    }
}

/// Produces log filenames and recognises the logs and archives of its family
pub struct NamingPolicy {
    binary: String,
    pattern: Option<Pattern>,
    family: Family,
    default_family: Family,
    random: RandomSource,
}

impl NamingPolicy {
    /// Naming policy for `binary`, using `pattern` if given
    pub fn new(binary: impl Into<String>, pattern: Option<&str>) -> Result<Self, NamingError> {
        let binary = binary.into();
        let default_family = default_family(&binary)?;

        let (pattern, family) = match pattern {
            Some(raw) => {
                let parsed = Pattern::parse(raw)?;
                let family = parsed.family(raw)?;
                (Some(parsed), family)
            }
            None => (None, default_family.clone()),
        };

        Ok(Self {
            binary,
            pattern,
            family,
            default_family,
            random: Box::new(|| rand::rng().random_range(0..=i32::MAX as u32)),
        })
    }

    /// Naming policy for the running executable
    pub fn for_current_binary(pattern: Option<&str>) -> Result<Self, NamingError> {
        Self::new(current_binary_name(), pattern)
    }

    /// Replace the random number source used by the pattern scheme
    #[must_use]
    pub fn with_random_source<F>(mut self, random: F) -> Self
    where
        F: Fn() -> u32 + Send + Sync + 'static,
    {
        self.random = Box::new(random);
        self
    }

    /// Binary name used by the default scheme
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Whether a user pattern is in effect
    pub fn has_pattern(&self) -> bool {
        self.pattern.is_some()
    }

    /// Name for the next active file in `dir`
    ///
    /// Candidates whose log or archive already exists are skipped. The
    /// default scheme always yields a name, counting `.1`, `.2`, ... after a
    /// taken timestamp. The pattern scheme returns `None` after
    /// `MAX_NAME_ATTEMPTS` collisions.
    pub fn next_filename(&self, dir: &Path) -> Option<String> {
        let Some(pattern) = &self.pattern else {
            let name = self.default_filename();
            if is_free(dir, &name) {
                return Some(name);
            }
            let stem = name.strip_suffix(LOG_EXTENSION).unwrap_or(&name);
            return (1..)
                .map(|n| format!("{stem}.{n}{LOG_EXTENSION}"))
                .find(|candidate| is_free(dir, candidate));
        };

        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = pattern.candidate((self.random)());
            if is_free(dir, &name) {
                return Some(name);
            }
        }

        tracing::warn!(
            dir = %dir.display(),
            attempts = MAX_NAME_ATTEMPTS,
            "no free filename for pattern"
        );
        None
    }

    /// Name under the default scheme, stamped with the current local time
    pub fn default_filename(&self) -> String {
        format!(
            "{}-{}{LOG_EXTENSION}",
            self.binary,
            Local::now().format(DEFAULT_TIME_LAYOUT)
        )
    }

    /// Whether `path` is an archive of this policy's family
    pub fn belongs(&self, path: &Path) -> bool {
        matches_basename(&self.family.archives, path)
    }

    /// Whether `path` is an archive of the default family
    pub fn belongs_to_default(&self, path: &Path) -> bool {
        matches_basename(&self.default_family.archives, path)
    }

    /// Whether `path` is a log this policy could have named
    pub fn owns_log(&self, path: &Path) -> bool {
        matches_basename(&self.family.logs, path)
    }

    /// Archive family regex source (for diagnostics)
    pub fn family(&self) -> &str {
        self.family.archives.as_str()
    }
}

impl fmt::Debug for NamingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamingPolicy")
            .field("binary", &self.binary)
            .field("pattern", &self.pattern)
            .field("family", &self.family.archives.as_str())
            .finish_non_exhaustive()
    }
}

/// `<stem>.tgz` for a `<stem>.log` name
pub fn archive_name(log_name: &str) -> String {
    let stem = log_name.strip_suffix(LOG_EXTENSION).unwrap_or(log_name);
    format!("{stem}{ARCHIVE_EXTENSION}")
}

/// File stem of the running executable
pub fn current_binary_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_BINARY_NAME.to_string())
}

fn default_family(binary: &str) -> Result<Family, NamingError> {
    let source = format!(r"^{}-\d+-\d+-\d+T\d+(?:\.\d+)?", regex::escape(binary));
    Family::compile(&source, binary)
}

fn is_free(dir: &Path, log_name: &str) -> bool {
    !dir.join(log_name).exists() && !dir.join(archive_name(log_name)).exists()
}

fn matches_basename(family: &Regex, path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| family.is_match(name))
}

#[cfg(test)]
#[path = "naming_test.rs"]
mod naming_test;
