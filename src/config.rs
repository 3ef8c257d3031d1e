use crate::{entries::local_now, error::LogError};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufReader, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};
use time::OffsetDateTime;
use tracing::debug;

pub const CONF_FOLDER: &str = "logcli";
const CONF_FILE: &str = "logcli.conf";
const LOG_FILE: &str = "logcli.log";

/// `logcli` under the platform config root (`$XDG_CONFIG_HOME` or `~/.config` on Linux).
pub fn default_dir() -> Result<PathBuf, LogError> {
    dirs::config_dir()
        .map(|root| root.join(CONF_FOLDER))
        .ok_or(LogError::NoConfigRoot)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Append,
    Read,
}

/// Metadata kept next to the log.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub created: Option<OffsetDateTime>,
}

impl Settings {
    fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            created: Some(local_now()),
        }
    }

    fn load(path: &Path) -> Result<Self, LogError> {
        match fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => Ok(Self::default()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(LogError::Open {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Open handles to the config directory's files, owned for the whole command.
#[derive(Debug)]
pub struct Journal {
    dir: PathBuf,
    settings: Settings,
    log: LogFile,
}

/// The log handle. Appends first close off a record left unterminated.
#[derive(Debug)]
pub struct LogFile {
    file: File,
    separator: &'static str,
}

impl LogFile {
    fn appending(mut file: File) -> io::Result<Self> {
        let separator = missing_terminator(&mut file)?;
        if !separator.is_empty() {
            debug!("Log ends mid-record, closing it before the next append");
        }

        Ok(Self { file, separator })
    }

    fn reading(file: File) -> Self {
        Self {
            file,
            separator: "",
        }
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.separator.is_empty() {
            return self.file.write(buf);
        }

        let mut joined = Vec::with_capacity(self.separator.len() + buf.len());
        joined.extend_from_slice(self.separator.as_bytes());
        joined.extend_from_slice(buf);
        self.file.write_all(&joined)?;
        self.separator = "";

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// What must be written so the log ends with a blank line (or is empty).
fn missing_terminator(file: &mut File) -> io::Result<&'static str> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok("");
    }

    let mut tail = [0u8; 2];
    let tail = &mut tail[..len.min(2) as usize];
    file.seek(SeekFrom::End(-(tail.len() as i64)))?;
    file.read_exact(tail)?;

    Ok(match tail {
        [b'\n', b'\n'] => "",
        [.., b'\n'] => "\n",
        _ => "\n\n",
    })
}

impl Journal {
    pub fn open(dir: &Path, access: Access) -> Result<Self, LogError> {
        if !dir.is_dir() {
            if access == Access::Read {
                return Err(LogError::NoEntries);
            }
            create_dir(dir)?;
        }

        let conf_path = dir.join(CONF_FILE);
        if access == Access::Append && !conf_path.exists() {
            let file = File::create(&conf_path).map_err(|source| LogError::Open {
                path: conf_path.clone(),
                source,
            })?;
            serde_json::to_writer_pretty(file, &Settings::new())?;
        }

        let settings = Settings::load(&conf_path)?;
        debug!(?settings, "Loaded {}", conf_path.display());

        let log_path = dir.join(LOG_FILE);
        let log = match access {
            Access::Append => OpenOptions::new()
                .read(true)
                .append(true)
                .create(true)
                .open(&log_path)
                .and_then(LogFile::appending),
            Access::Read => File::open(&log_path).map(LogFile::reading),
        }
        .map_err(|source| LogError::Open {
            path: log_path.clone(),
            source,
        })?;
        debug!("Opened {} for {access:?}", log_path.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            settings,
            log,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn log(&mut self) -> &mut LogFile {
        &mut self.log
    }

    pub fn into_reader(self) -> BufReader<File> {
        BufReader::new(self.log.file)
    }
}

/// Creates the directory as rwxr-xr-x, ignoring the umask.
fn create_dir(dir: &Path) -> Result<(), LogError> {
    let wrap = |source: io::Error| LogError::CreateDir {
        path: dir.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(wrap)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).map_err(wrap)?;
    }

    debug!("Created configuration directory {}", dir.display());
    Ok(())
}
