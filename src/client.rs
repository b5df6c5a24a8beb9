//! Process-wide, one-time initialization of the native client library.

use std::path::{Path, PathBuf};

use once_cell::sync::{Lazy, OnceCell};

use crate::config::ClientLibrary;
use crate::error::{Error, Result};

/// Runs client initialization at most once successfully. A failed attempt is
/// logged and reported, and the next call tries again.
#[derive(Debug, Default)]
pub struct ClientInitializer {
    lib_dir: OnceCell<Option<PathBuf>>,
}

static GLOBAL: Lazy<ClientInitializer> = Lazy::new(ClientInitializer::new);

/// The initializer shared by every connector in the process
pub fn global() -> &'static ClientInitializer {
    &GLOBAL
}

impl ClientInitializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.lib_dir.get().is_some()
    }

    /// Library directory the client was initialized with, if it was
    pub fn lib_dir(&self) -> Option<&Path> {
        self.lib_dir.get().and_then(|d| d.as_deref())
    }

    pub fn ensure<F>(&self, library: &ClientLibrary, init: F) -> Result<()>
    where
        F: FnOnce(Option<&Path>) -> anyhow::Result<()>,
    {
        self.lib_dir
            .get_or_try_init(|| {
                let dir = resolve_lib_dir(library);
                match init(dir.as_deref()) {
                    Ok(()) => {
                        tracing::info!(lib_dir = ?dir, "client library initialized");
                        Ok(dir)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "client library initialization failed");
                        Err(Error::ClientInit(e.to_string()))
                    }
                }
            })
            .map(|_| ())
    }
}

/// On macOS a custom path is taken relative to `$HOME`
pub fn resolve_lib_dir(library: &ClientLibrary) -> Option<PathBuf> {
    match library {
        ClientLibrary::Default => None,
        ClientLibrary::Custom { path } => {
            if cfg!(target_os = "macos") {
                let home = std::env::var_os("HOME").unwrap_or_default();
                let mut joined = home.into_string().unwrap_or_default();
                joined.push_str(&path.to_string_lossy());
                Some(PathBuf::from(joined))
            } else {
                Some(path.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn init_runs_once() {
        let init = ClientInitializer::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            init.ensure(&ClientLibrary::Default, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(init.is_initialized());
        assert!(init.lib_dir().is_none());
    }

    #[test]
    fn failure_is_reported_and_retried() {
        let init = ClientInitializer::new();
        let err = init
            .ensure(&ClientLibrary::Default, |_| Err(anyhow::anyhow!("no library")))
            .unwrap_err();
        assert!(matches!(err, Error::ClientInit(ref m) if m == "no library"));
        assert!(!init.is_initialized());
        init.ensure(&ClientLibrary::Default, |_| Ok(())).unwrap();
        assert!(init.is_initialized());
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn custom_library_dir_is_remembered() {
        let config = ConnectionConfig::default().with_client_library(ClientLibrary::Custom {
            path: PathBuf::from("/opt/client"),
        });
        let init = ClientInitializer::new();
        let mut seen = None;
        init.ensure(&config.client_library, |dir| {
            seen = dir.map(Path::to_path_buf);
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, Some(PathBuf::from("/opt/client")));
        assert_eq!(init.lib_dir(), Some(Path::new("/opt/client")));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn custom_path_is_used_as_given() {
        let library = ClientLibrary::Custom {
            path: PathBuf::from("/opt/client"),
        };
        assert_eq!(resolve_lib_dir(&library), Some(PathBuf::from("/opt/client")));
    }
}
