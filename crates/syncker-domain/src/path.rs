use std::env;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::IndexError;

pub const DRIVE_PREFIX: &str = "gdrive:/";

/// Splits a Drive path into its folder/file segments.
///
/// Empty segments are dropped, so `gdrive:/a//b/` yields `["a", "b"]` and
/// `gdrive:/` yields nothing (the root).
pub fn parse(path: &str) -> Result<Vec<String>, IndexError> {
    let rest = path
        .strip_prefix(DRIVE_PREFIX)
        .ok_or_else(|| IndexError::InvalidPath {
            path: path.to_string(),
        })?;
    Ok(rest
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(ToOwned::to_owned)
        .collect())
}

#[must_use]
pub fn is_drive_path(path: &str) -> bool {
    path.starts_with(DRIVE_PREFIX)
}

/// A parsed `gdrive:/...` path. Displays in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemotePath {
    segments: Vec<String>,
}

impl RemotePath {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Result<Self, IndexError> {
        Ok(Self {
            segments: parse(raw)?,
        })
    }

    #[must_use]
    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, `None` for the root.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    #[must_use]
    pub fn starts_with(&self, other: &RemotePath) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{DRIVE_PREFIX}{}", self.segments.join("/"))
    }
}

impl FromStr for RemotePath {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RemotePath {
    type Error = IndexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RemotePath> for String {
    fn from(value: RemotePath) -> Self {
        value.to_string()
    }
}

/// Absolute, lexically normalised local path.
///
/// Two spellings of the same location (`./a/../b.txt` vs `b.txt`) compare
/// equal once normalised. The file does not have to exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocalPath(Utf8PathBuf);

impl LocalPath {
    /// Normalises `path` against the process working directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let cwd = env::current_dir().map_err(|err| IndexError::InvalidLocalPath {
            path: path.display().to_string(),
            reason: format!("cannot read the working directory: {err}"),
        })?;
        Self::with_base(path, &cwd)
    }

    /// Normalises `path`, resolving relative paths against `base`.
    pub fn with_base(path: impl AsRef<Path>, base: &Path) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };
        let normalized = normalize(&joined);
        if !normalized.is_absolute() {
            return Err(IndexError::InvalidLocalPath {
                path: path.display().to_string(),
                reason: "path could not be made absolute".to_string(),
            });
        }
        Utf8PathBuf::from_path_buf(normalized)
            .map(Self)
            .map_err(|_| IndexError::InvalidLocalPath {
                path: path.display().to_string(),
                reason: "path is not valid UTF-8".to_string(),
            })
    }

    #[must_use]
    pub fn as_path(&self) -> &Utf8Path {
        &self.0
    }

    #[must_use]
    pub fn as_std_path(&self) -> &Path {
        self.0.as_std_path()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name()
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.0.exists()
    }

    /// Renders the path with `$HOME` collapsed to `~` (never on Windows).
    #[must_use]
    pub fn shorten(&self, home: Option<&Path>) -> String {
        if cfg!(windows) {
            return self.0.to_string();
        }
        let Some(home) = home else {
            return self.0.to_string();
        };
        match self.0.as_std_path().strip_prefix(home) {
            Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => self.0.to_string(),
        }
    }
}

impl fmt::Display for LocalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for LocalPath {
    type Error = IndexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let path = PathBuf::from(&value);
        if !path.is_absolute() {
            return Err(IndexError::InvalidLocalPath {
                path: value,
                reason: "stored links must be absolute".to_string(),
            });
        }
        Utf8PathBuf::from_path_buf(normalize(&path))
            .map(Self)
            .map_err(|_| IndexError::InvalidLocalPath {
                path: value,
                reason: "path is not valid UTF-8".to_string(),
            })
    }
}

impl From<LocalPath> for String {
    fn from(value: LocalPath) -> Self {
        value.0.into_string()
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
        }
    }
    out
}
