//! Operational remedies run from the command line.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use snafu::{Location, ResultExt as _, Snafu};

pub type Result<T, E = MaintenanceError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MaintenanceError {
    #[snafu(display("could not create directory `{}`", path.display()))]
    CreateDirectory {
        path: PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not read directory `{}`", path.display()))]
    ReadDirectory {
        path: PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not report progress"))]
    Progress {
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not remove `{}`", path.display()))]
    Remove {
        path: PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Where the server keeps the state that `fix-auth` wipes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoragePaths {
    /// One file per session.
    #[serde(default = "default_session_dir")]
    pub session_dir: PathBuf,
    /// Application cache.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Cached configuration.
    #[serde(default = "default_config_cache_dir")]
    pub config_cache_dir: PathBuf,
    /// Compiled page templates.
    #[serde(default = "default_view_cache_dir")]
    pub view_cache_dir: PathBuf,
}

fn default_session_dir() -> PathBuf {
    PathBuf::from("storage/framework/sessions")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("storage/framework/cache")
}

fn default_config_cache_dir() -> PathBuf {
    PathBuf::from("bootstrap/cache")
}

fn default_view_cache_dir() -> PathBuf {
    PathBuf::from("storage/framework/views")
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self {
            session_dir: default_session_dir(),
            cache_dir: default_cache_dir(),
            config_cache_dir: default_config_cache_dir(),
            view_cache_dir: default_view_cache_dir(),
        }
    }
}

impl StoragePaths {
    /// Every path relative to `root`, for deployments that do not run from the project root.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let defaults = Self::default();

        Self {
            session_dir: root.join(defaults.session_dir),
            cache_dir: root.join(defaults.cache_dir),
            config_cache_dir: root.join(defaults.config_cache_dir),
            view_cache_dir: root.join(defaults.view_cache_dir),
        }
    }
}

/// The lines `fix-auth` prints, one per step, in order.
pub const PROGRESS: [&str; 7] = [
    "Fixing authentication and CSRF issues...",
    "Session directory is in place.",
    "Old sessions cleared.",
    "Application cache cleared.",
    "Configuration cache cleared.",
    "Compiled views cleared.",
    "Done. Log in again to get a fresh session.",
];

/// Clears sessions and caches so that stale tokens stop failing verification, reporting each
/// step on `out`.
///
/// Safe to run any number of times; missing cache directories count as already clear.
pub fn fix_auth(paths: &StoragePaths, out: &mut impl Write) -> Result<()> {
    let [starting, sessions_ready, sessions_cleared, cache, config, views, done] = PROGRESS;

    progress(out, starting)?;

    fs::create_dir_all(&paths.session_dir).context(CreateDirectorySnafu {
        path: &paths.session_dir,
    })?;
    progress(out, sessions_ready)?;

    let sessions = clear_directory(&paths.session_dir)?;
    tracing::debug!(removed = sessions, "cleared sessions");
    progress(out, sessions_cleared)?;

    clear_cache("application", &paths.cache_dir)?;
    progress(out, cache)?;

    clear_cache("configuration", &paths.config_cache_dir)?;
    progress(out, config)?;

    clear_cache("view", &paths.view_cache_dir)?;
    progress(out, views)?;

    progress(out, done)
}

fn progress(out: &mut impl Write, message: &str) -> Result<()> {
    tracing::debug!("{message}");
    writeln!(out, "{message}").context(ProgressSnafu)
}

fn clear_cache(name: &str, path: &Path) -> Result<()> {
    if !path.exists() {
        tracing::debug!(cache = name, path = %path.display(), "cache directory missing, nothing to clear");
        return Ok(());
    }

    let removed = clear_directory(path)?;
    tracing::debug!(cache = name, removed, "cleared cache");
    Ok(())
}

/// Removes everything inside `path` except dot-files, returning how many entries went.
fn clear_directory(path: &Path) -> Result<usize> {
    let entries = fs::read_dir(path).context(ReadDirectorySnafu { path })?;
    let mut removed = 0;

    for entry in entries {
        let entry = entry.context(ReadDirectorySnafu { path })?;

        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let target = entry.path();
        let file_type = entry.file_type().context(RemoveSnafu { path: &target })?;

        if file_type.is_dir() {
            fs::remove_dir_all(&target).context(RemoveSnafu { path: &target })?;
        } else {
            fs::remove_file(&target).context(RemoveSnafu { path: &target })?;
        }

        removed += 1;
    }

    Ok(removed)
}
