use std::{fmt::Display, io, path::PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("couldn't access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("couldn't parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("couldn't serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// no home directory to derive the config location from
    #[error("couldn't determine the config directory")]
    NoConfigDir,

    #[error("Bad command: {0:?}")]
    BadCommand(String),

    #[error("couldn't spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Terminates the process after a broken lock or a failed thread spawn.
///
/// There is no recovery path once one of the registry's primitives has
/// failed, so the failure is logged, echoed to stderr and the process aborts.
pub(crate) fn fatal(context: &str, cause: impl Display) -> ! {
    log::error!("{context}: {cause}");
    eprintln!("fatal: {context}: {cause}");
    std::process::abort()
}
