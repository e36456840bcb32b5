//! Engine binary selection and launch checks.

use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::error::LaunchError;

/// Stockfish release binaries by `(os, arch)`, as reported by
/// [`std::env::consts`].
pub const ENGINE_BINARIES: &[(&str, &str, &str)] = &[
    ("linux", "x86_64", "stockfish-ubuntu-x86-64"),
    ("linux", "aarch64", "stockfish-android-armv8"),
    ("macos", "x86_64", "stockfish-macos-x86-64"),
    ("macos", "aarch64", "stockfish-macos-m1-apple-silicon"),
    ("windows", "x86_64", "stockfish-windows-x86-64.exe"),
];

/// Binary file name for a platform, if one is known.
pub fn binary_for(os: &str, arch: &str) -> Option<&'static str> {
    ENGINE_BINARIES
        .iter()
        .find(|(o, a, _)| *o == os && *a == arch)
        .map(|(_, _, name)| *name)
}

/// Path of the engine to launch for this host.
///
/// An explicit `path` in the config wins over the platform table.
pub fn resolve_engine_path(config: &EngineConfig) -> Result<PathBuf, LaunchError> {
    resolve_for(config, std::env::consts::OS, std::env::consts::ARCH)
}

fn resolve_for(config: &EngineConfig, os: &str, arch: &str) -> Result<PathBuf, LaunchError> {
    if let Some(path) = &config.path {
        return Ok(path.clone());
    }
    binary_for(os, arch)
        .map(|name| config.engine_dir.join(name))
        .ok_or_else(|| LaunchError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        })
}

/// Check that `path` is an existing, executable regular file.
pub fn check_executable(path: &Path) -> Result<(), LaunchError> {
    let metadata =
        std::fs::metadata(path).map_err(|_| LaunchError::NotFound(path.to_path_buf()))?;
    if !metadata.is_file() {
        return Err(LaunchError::NotExecutable(path.to_path_buf()));
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(LaunchError::NotExecutable(path.to_path_buf()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_platforms() {
        assert_eq!(binary_for("linux", "x86_64"), Some("stockfish-ubuntu-x86-64"));
        assert_eq!(
            binary_for("windows", "x86_64"),
            Some("stockfish-windows-x86-64.exe")
        );
        assert_eq!(binary_for("freebsd", "riscv64"), None);
    }

    #[test]
    fn test_resolve_from_table() {
        let config = EngineConfig {
            engine_dir: PathBuf::from("/opt/engines"),
            ..EngineConfig::default()
        };
        let path = resolve_for(&config, "macos", "aarch64").unwrap();
        assert_eq!(
            path,
            PathBuf::from("/opt/engines/stockfish-macos-m1-apple-silicon")
        );
    }

    #[test]
    fn test_explicit_path_wins() {
        let config = EngineConfig {
            path: Some(PathBuf::from("/usr/games/stockfish")),
            ..EngineConfig::default()
        };
        let path = resolve_for(&config, "plan9", "mips").unwrap();
        assert_eq!(path, PathBuf::from("/usr/games/stockfish"));
    }

    #[test]
    fn test_unsupported_platform() {
        let config = EngineConfig::default();
        match resolve_for(&config, "plan9", "mips") {
            Err(LaunchError::UnsupportedPlatform { os, arch }) => {
                assert_eq!(os, "plan9");
                assert_eq!(arch, "mips");
            }
            other => panic!("Expected UnsupportedPlatform, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_binary() {
        let result = check_executable(Path::new("/nonexistent/path/to/stockfish"));
        assert!(matches!(result, Err(LaunchError::NotFound(_))));
    }

    #[test]
    fn test_directory_is_not_executable() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_executable(dir.path());
        assert!(matches!(result, Err(LaunchError::NotExecutable(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_without_exec_bit() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = check_executable(file.path());
        assert!(matches!(result, Err(LaunchError::NotExecutable(_))));
    }
}
