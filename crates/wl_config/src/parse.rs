use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use tracing::{debug, info, trace};

use crate::{
    Config,
    error::{Error, Result},
};

pub const APPLICATION: &str = "wl";

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "wl.toml";

/// Prefix of the environment variables that override configuration values.
pub const ENV_PREFIX: &str = "WL_";

/// Load the configuration.
///
/// The file is `file` if given, otherwise the first file found by
/// [`find_file`]. Environment variables from `envs` are applied on top of the
/// file, followed by `overrides`.
pub fn load<E>(file: Option<&Path>, envs: E, overrides: &[(String, String)]) -> Result<Config>
where
    E: IntoIterator<Item = (String, String)>,
{
    let mut config = match file {
        Some(path) if !path.is_file() => return Err(Error::MissingFile(path.to_owned())),
        Some(path) => load_file(path)?,
        None => match find_file(Path::new(".")) {
            Some(path) => load_file(&path)?,
            None => {
                debug!("No configuration file found, using defaults.");
                Config::default()
            }
        },
    };

    load_envs(&mut config, envs)?;

    for (key, value) in overrides {
        trace!(%key, %value, "Applying configuration override.");
        config.set(key, value)?;
    }

    config.validate()?;
    Ok(config)
}

/// Find the configuration file, looking first in `dir`, then in the user's
/// configuration directory.
#[must_use]
pub fn find_file(dir: &Path) -> Option<PathBuf> {
    let local = dir.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    user_config_file().filter(|path| path.is_file())
}

/// Path of the per-user configuration file, whether it exists or not.
#[must_use]
pub fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load a configuration file. Missing fields take their default value.
pub fn load_file(path: &Path) -> Result<Config> {
    info!(path = %path.display(), "Loading configuration file.");

    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|error| Error::Toml {
        path: path.to_owned(),
        error,
    })
}

/// Apply `WL_*` variables to `config`.
///
/// Variables without the prefix are ignored. So are prefixed variables not
/// matching any configuration key, as the prefix is shared with other
/// settings, such as logging.
pub fn load_envs<E>(config: &mut Config, envs: E) -> Result<()>
where
    E: IntoIterator<Item = (String, String)>,
{
    trace!("Loading environment variable configuration.");

    for (name, value) in envs {
        if !name.starts_with(ENV_PREFIX) {
            continue;
        }

        let Some(key) = Config::KEYS.iter().find(|key| env_name(key) == name) else {
            trace!(%name, "Ignoring unrelated environment variable.");
            continue;
        };

        debug!(%name, %key, "Applying environment variable.");
        config.set(key, value)?;
    }

    Ok(())
}

/// The environment variable for a configuration key, e.g. `WL_API_BASE_URL`
/// for `api.base_url`.
#[must_use]
pub fn env_name(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.replace('.', "_").to_uppercase())
}

/// Parse a `KEY=VALUE` assignment. The value may contain `=`.
pub fn parse_assignment(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(Error::InvalidAssignment(s.to_owned())),
    }
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
