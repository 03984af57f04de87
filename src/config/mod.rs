use std::{
    fmt, fs, io::{self, Write}, net::{Ipv4Addr, Ipv6Addr}, path::{Path, PathBuf}, str::FromStr, time::Duration,
};
use confique::Config as _;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::prelude::*;


mod general;

pub(crate) use self::general::GeneralConfig;


/// The locations where Cairn will look for a configuration file. The first
/// existing file in this list is used.
const DEFAULT_PATHS: &[&str] = &[
    // For better DX, we include this special path here, but just in debug mode.
    #[cfg(debug_assertions)]
    "util/dev-config/config.toml",

    "config.toml",
    "/etc/cairn/config.toml",
];

const CAIRN_CONFIG_PATH_ENV: &str = "CAIRN_CONFIG_PATH";

/// Configuration for Cairn.
///
/// All relative paths are relative to the location of this configuration file.
/// Duration values are specified as string with a unit, e.g. "27s". Valid
/// units: 'ms', 's', 'min', 'h' and 'd'.
///
/// All user-facing texts you can configure here have to be specified per
/// language, with the locale code as key. The special key 'default' is
/// required and used as fallback for locales that are not specified
/// explicitly. Take `general.site_title` for example:
///
///     [general]
///     site_title.default = "Acme"
///     site_title.de = "Acme GmbH"
///
#[derive(Debug, confique::Config)]
pub(crate) struct Config {
    #[config(nested)]
    pub(crate) general: GeneralConfig,

    #[config(nested)]
    pub(crate) http: crate::http::HttpConfig,

    #[config(nested)]
    pub(crate) log: crate::logger::LogConfig,

    #[config(nested)]
    pub(crate) cms: crate::cms::CmsConfig,

    #[config(nested)]
    pub(crate) collections: crate::collections::CollectionsConfig,
}

impl Config {
    /// Tries to find a config file by checking `CAIRN_CONFIG_PATH` and from a
    /// list of possible default config file locations. The first config file
    /// is loaded via [`Self::load_from`]. Returns the loaded config and the
    /// path that it was loaded from.
    pub(crate) fn from_env_or_default_locations() -> Result<(Self, PathBuf)> {
        let path = if let Some(path) = std::env::var_os(CAIRN_CONFIG_PATH_ENV) {
            PathBuf::from(path)
        } else {
            DEFAULT_PATHS.iter()
                .map(PathBuf::from)
                .find(|p| p.exists())
                .ok_or(anyhow!(
                    "no configuration file found. Note: we checked the following paths: {}",
                    DEFAULT_PATHS.join(", "),
                ))?
        };

        let config = Self::load_from(&path)
            .context(format!("failed to load configuration from '{}'", path.display()))?;

        Ok((config, path))
    }

    /// Loads the configuration from a specific TOML file. Values can be
    /// overridden by environment variables where the option says so.
    pub(crate) fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Config::builder()
            .env()
            .file(path)
            .load()
            .context(format!("failed to read config file '{}'", path.display()))?;

        config.fix_paths(path)?;

        Ok(config)
    }

    /// Goes through all paths in the configuration and changes relative paths
    /// to be absolute based on the path of the configuration file itself.
    fn fix_paths(&mut self, config_path: &Path) -> Result<()> {
        let absolute_config_path = config_path.canonicalize()
            .context("failed to canonicalize config path")?;
        let base = absolute_config_path.parent()
            .ok_or_else(|| anyhow!("config file path has no parent"))?;

        if let Some(p) = &mut self.log.file {
            fix_path(base, p);
        }
        fix_path(base, &mut self.collections.generated_file);

        Ok(())
    }
}

pub(crate) fn fix_path(base_path: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base_path.join(&path);
    }
}

/// Writes the generated TOML config template file to the given destination or
/// stdout.
pub(crate) fn write_template(path: Option<&PathBuf>) -> Result<()> {
    use confique::toml::FormatOptions;

    info!(
        "Writing configuration template to '{}'",
        path.map(|p| p.display().to_string()).unwrap_or("<stdout>".into()),
    );

    let mut options = FormatOptions::default();
    options.general.nested_field_gap = 2;
    let template = confique::toml::template::<Config>(options);
    match path {
        Some(path) => fs::write(path, template)?,
        None => io::stdout().write_all(template.as_bytes())?,
    }

    Ok(())
}

/// Our custom format for durations. We allow a couple useful units and require
/// a unit to increase readability of config files.
pub(crate) fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(D::Error::custom)
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    // Allow unit-less zeroes
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let start_unit = s.find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| "no time unit for duration".to_owned())?;
    let (num, unit) = s.split_at(start_unit);
    let num: u64 = num.parse::<u32>()
        .map_err(|e| format!("invalid integer for duration: {e}"))?
        .into();

    match unit {
        "ms" => Ok(Duration::from_millis(num)),
        "s" => Ok(Duration::from_secs(num)),
        "min" => Ok(Duration::from_secs(num * 60)),
        "h" => Ok(Duration::from_secs(num * 60 * 60)),
        "d" => Ok(Duration::from_secs(num * 60 * 60 * 24)),
        _ => Err("invalid unit of time for duration".into()),
    }
}


/// Scheme and authority of a public HTTP(S) origin, e.g. the public URL of
/// this website. Plain HTTP is only accepted for loopback hosts, unless the
/// value ends in `#allow-insecure`.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub(crate) struct HttpHost {
    pub(crate) scheme: String,
    pub(crate) authority: String,
}

impl HttpHost {
    /// Returns an absolute URL by appending `path` (which has to start with
    /// `/`) to this host.
    pub(crate) fn join(&self, path: &str) -> String {
        debug_assert!(path.starts_with('/'));
        format!("{}://{}{}", self.scheme, self.authority, path)
    }
}

impl fmt::Display for HttpHost {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

impl fmt::Debug for HttpHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<HttpHost> for String {
    fn from(value: HttpHost) -> Self {
        value.to_string()
    }
}

impl FromStr for HttpHost {
    type Err = anyhow::Error;
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        const SAFE_WORD: &str = "allow-insecure";

        let url: Url = src.parse().map_err(|e| anyhow!("invalid URL: {e}"))?;

        anyhow::ensure!(url.query().is_none(), "URL must not contain a query part");
        anyhow::ensure!(!url.fragment().is_some_and(|f| f != SAFE_WORD),
            "URL must not have a fragment part, except for optionally '{SAFE_WORD}'");
        anyhow::ensure!(url.username().is_empty(), "URL must not contain username part");
        anyhow::ensure!(url.password().is_none(), "URL must not contain password part");
        anyhow::ensure!(["http", "https"].contains(&url.scheme()),
            "URL scheme must be 'http' or 'https'");
        anyhow::ensure!(url.path().is_empty() || url.path() == "/",
            "invalid HTTP host: must not contain a path");

        let host = url.host_str().ok_or(anyhow!("URL must have a host"))?;
        let is_local = {
            let bracketed_ipv6 =
                (|| host.strip_prefix('[')?.strip_suffix(']')?.parse::<Ipv6Addr>().ok())();

            if let Some(ipv6) = bracketed_ipv6 {
                ipv6.is_loopback()
            } else if let Ok(ipv4) = host.parse::<Ipv4Addr>() {
                ipv4.is_loopback()
            } else {
                host == "localhost"
            }
        };

        if url.scheme() != "https" && !(is_local || url.fragment() == Some(SAFE_WORD)) {
            bail!("Potentially dangerous URL with non-local host and 'http' scheme. \
                If you really want to use unencrypted HTTP for non-local hosts, \
                confirm by specifing the host as '{url}#{SAFE_WORD}'");
        }

        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };

        Ok(Self { scheme: url.scheme().to_owned(), authority })
    }
}

impl TryFrom<String> for HttpHost {
    type Error = <Self as FromStr>::Err;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
