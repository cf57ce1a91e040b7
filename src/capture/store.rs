use crate::config::CaptureConfig;
use crate::error::CaptureError;
use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Timezone used to stamp picture file names
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureTimezone {
    Local,
    Named(Tz),
}

/// Resolve configured timezone, falling back to UTC on parse errors
pub(crate) fn resolve_timestamp_timezone(tz_name: &str) -> CaptureTimezone {
    let trimmed = tz_name.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("local") {
        return CaptureTimezone::Local;
    }

    match trimmed.parse::<Tz>() {
        Ok(tz) => CaptureTimezone::Named(tz),
        Err(_) => {
            warn!(
                "Invalid timestamp timezone '{}', falling back to UTC",
                tz_name
            );
            CaptureTimezone::Named(chrono_tz::UTC)
        }
    }
}

/// Persists still pictures under `<pictures_dir>/<album>/`
#[derive(Debug, Clone)]
pub struct PictureStore {
    directory: PathBuf,
    file_prefix: String,
    timezone: CaptureTimezone,
}

impl PictureStore {
    pub fn new(config: &CaptureConfig) -> Self {
        let pictures_dir = match &config.pictures_dir {
            Some(dir) => PathBuf::from(dir),
            None => default_pictures_dir(),
        };

        Self::with_directory(
            pictures_dir.join(&config.album),
            config.file_prefix.clone(),
            resolve_timestamp_timezone(&config.timestamp_timezone),
        )
    }

    pub fn with_directory(
        directory: PathBuf,
        file_prefix: String,
        timezone: CaptureTimezone,
    ) -> Self {
        Self {
            directory,
            file_prefix,
            timezone,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Create the picture directory if it does not exist yet
    pub fn ensure_directory(&self) -> Result<(), CaptureError> {
        if self.directory.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(&self.directory).map_err(|e| CaptureError::DirectoryCreation {
            path: self.directory.display().to_string(),
            source: e,
        })?;
        info!("Created picture directory: {}", self.directory.display());
        Ok(())
    }

    /// File name for a picture taken at `taken_at`, at one-second resolution.
    ///
    /// Two pictures in the same second share a name; the later one replaces the earlier.
    pub fn file_name(&self, taken_at: SystemTime) -> String {
        let utc = DateTime::<Utc>::from(taken_at);
        let stamp = match self.timezone {
            CaptureTimezone::Local => utc
                .with_timezone(&Local)
                .format(FILE_TIMESTAMP_FORMAT)
                .to_string(),
            CaptureTimezone::Named(tz) => utc
                .with_timezone(&tz)
                .format(FILE_TIMESTAMP_FORMAT)
                .to_string(),
        };
        format!("{}{}.jpg", self.file_prefix, stamp)
    }

    pub fn path_for(&self, taken_at: SystemTime) -> PathBuf {
        self.directory.join(self.file_name(taken_at))
    }

    /// Write the encoded picture verbatim.
    ///
    /// Bytes go to a `.part` sibling first and are renamed into place, so a
    /// failed write leaves no partial file and keeps any earlier picture with
    /// the same name.
    pub fn save(&self, data: &[u8], taken_at: SystemTime) -> Result<PathBuf, CaptureError> {
        if data.is_empty() {
            return Err(CaptureError::EmptyPicture);
        }

        let path = self.path_for(taken_at);
        let partial = partial_path(&path);

        if let Err(e) = fs::write(&partial, data).and_then(|_| {
            if path.exists() {
                warn!("Overwriting picture taken in the same second: {}", path.display());
            }
            fs::rename(&partial, &path)
        }) {
            if let Err(cleanup) = fs::remove_file(&partial) {
                debug!("Could not remove {}: {}", partial.display(), cleanup);
            }
            return Err(CaptureError::Write {
                path: path.display().to_string(),
                source: e,
            });
        }

        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(path)
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

fn default_pictures_dir() -> PathBuf {
    let user_dirs = directories::UserDirs::new();
    if let Some(dir) = user_dirs.as_ref().and_then(|dirs| dirs.picture_dir()) {
        return dir.to_path_buf();
    }
    if let Some(home) = user_dirs.as_ref().map(|dirs| dirs.home_dir()) {
        return home.join("Pictures");
    }

    warn!("No user picture directory found; using ./Pictures");
    PathBuf::from("Pictures")
}
