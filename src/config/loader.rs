use crate::config::schema::{ReplaceConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a set of rules came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// Rules handed over as a string.
    Inline,
    File(PathBuf),
    /// Several files merged in order; validation only sees the union.
    Merged(Vec<PathBuf>),
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::Inline => f.write_str("inline rules"),
            RuleSource::File(path) => write!(f, "rule file {}", path.display()),
            RuleSource::Merged(paths) => {
                write!(f, "merged rules from {} file(s) [", paths.len())?;
                for (i, path) in paths.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", path.display())?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// A rule file could not be read.
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A rule file is not TOML of the expected shape.
    Malformed {
        origin: RuleSource,
        source: toml_edit::de::Error,
    },
    /// The rules parsed but describe patterns or settings that cannot run.
    Rejected {
        origin: RuleSource,
        source: ValidationError,
    },
}

impl ConfigError {
    /// The rules the error was raised for, if any were read.
    pub fn origin(&self) -> Option<&RuleSource> {
        match self {
            ConfigError::Unreadable { .. } => None,
            ConfigError::Malformed { origin, .. } | ConfigError::Rejected { origin, .. } => {
                Some(origin)
            }
        }
    }

    fn in_file(self, path: &Path) -> Self {
        match self {
            ConfigError::Malformed {
                origin: RuleSource::Inline,
                source,
            } => ConfigError::Malformed {
                origin: RuleSource::File(path.to_path_buf()),
                source,
            },
            ConfigError::Rejected {
                origin: RuleSource::Inline,
                source,
            } => ConfigError::Rejected {
                origin: RuleSource::File(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Unreadable { path, source } => {
                write!(f, "cannot read rule file {}: {}", path.display(), source)
            }
            ConfigError::Malformed { origin, source } => {
                write!(f, "{origin} is not a valid rule table: {source}")
            }
            ConfigError::Rejected { origin, source } => {
                write!(f, "{origin} cannot be run: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Unreadable { source, .. } => Some(source),
            ConfigError::Malformed { source, .. } => Some(source),
            ConfigError::Rejected { source, .. } => Some(source),
        }
    }
}

fn parse(input: &str) -> Result<ReplaceConfig, ConfigError> {
    toml_edit::de::from_str(input).map_err(|source| ConfigError::Malformed {
        origin: RuleSource::Inline,
        source,
    })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_from_str(input: &str) -> Result<ReplaceConfig, ConfigError> {
    let config = parse(input)?;
    config.validate().map_err(|source| ConfigError::Rejected {
        origin: RuleSource::Inline,
        source,
    })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<ReplaceConfig, ConfigError> {
    let path = path.as_ref();
    let contents = read(path)?;
    load_from_str(&contents).map_err(|error| error.in_file(path))
}

/// Load several rule files and merge them in order, later files winning.
///
/// Each file only has to parse on its own; validation runs once on the
/// merged result, so a file may hold nothing but patterns or nothing but
/// settings. A rejected merge names every file that went into it.
pub fn load_from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<ReplaceConfig, ConfigError> {
    let mut merged = ReplaceConfig::default();
    for path in paths {
        let path = path.as_ref();
        let contents = read(path)?;
        let config = parse(&contents).map_err(|error| error.in_file(path))?;
        merged = merged.merge(config);
    }
    merged.validate().map_err(|source| ConfigError::Rejected {
        origin: RuleSource::Merged(paths.iter().map(|p| p.as_ref().to_path_buf()).collect()),
        source,
    })?;
    Ok(merged)
}
