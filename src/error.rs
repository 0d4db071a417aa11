use thiserror::Error;

/// Failures surfaced by the docking core
#[derive(Debug, Error)]
pub enum DockError {
    /// Window handle is invalid or the window is gone
    #[error("cannot resolve window {window:#x}: {reason}")]
    Resolution { window: u32, reason: String },

    /// The window manager refused an app-bar message
    #[error("app-bar {message} failed: {reason}")]
    Protocol { message: &'static str, reason: String },

    /// Config file could not be read, parsed or written
    #[error("config file {path}: {reason}")]
    ConfigIo { path: String, reason: String },

    /// Caller named an option outside the config schema
    #[error("unknown option '{0}'")]
    InvalidOption(String),

    /// Known option with a value that does not parse or is out of range
    #[error("invalid value '{value}' for option '{option}'")]
    InvalidValue { option: String, value: String },

    /// Window capability (geometry or chrome) failed on the host side
    #[error("host window: {0}")]
    Host(String),
}

impl DockError {
    pub fn resolution(window: u32, err: impl std::fmt::Display) -> Self {
        Self::Resolution { window, reason: format!("{err:#}") }
    }

    pub fn protocol(message: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Protocol { message, reason: format!("{err:#}") }
    }

    pub fn host(err: impl std::fmt::Display) -> Self {
        Self::Host(format!("{err:#}"))
    }
}

pub type DockResult<T> = std::result::Result<T, DockError>;
