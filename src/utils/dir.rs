use std::{
    env, io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};

/// Name of the directory the application keeps its state in.
pub const APPLICATION_DIR: &str = "pomodoro-logger";

/// Resolves the per-user application directory without creating it.
pub fn application_default_path() -> Result<PathBuf> {
    cfg_if::cfg_if! {
        if #[cfg(windows)] {
            let mut path = env::var("APPDATA")
                .map(PathBuf::from)
                .map_err(|_| anyhow!("APPDATA should be present on Windows"))?;
            path.push(APPLICATION_DIR);
            Ok(path)
        } else {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))?;
            path.push(APPLICATION_DIR);
            Ok(path)
        }
    }
}

/// Creates `path` and all of its parents. An already existing directory is fine.
pub fn ensure_dir(path: &Path) -> Result<()> {
    match std::fs::create_dir_all(path) {
        Ok(_) => Ok(()),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(v) => Err(v.into()),
    }
}

pub fn create_application_default_path() -> Result<PathBuf> {
    let path = application_default_path()?;
    ensure_dir(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::ensure_dir;

    #[test]
    fn ensure_dir_creates_parents_and_is_idempotent() -> Result<()> {
        let root = tempdir()?;
        let nested = root.path().join("a").join("b").join("c");

        ensure_dir(&nested)?;
        ensure_dir(&nested)?;

        assert!(nested.is_dir());
        Ok(())
    }

    #[test]
    fn ensure_dir_fails_when_a_file_is_in_the_way() -> Result<()> {
        let root = tempdir()?;
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, "x")?;

        assert!(ensure_dir(&blocker.join("child")).is_err());
        Ok(())
    }
}
