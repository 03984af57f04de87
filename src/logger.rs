use std::{
    collections::HashMap,
    fmt::{self, Write as _},
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};
use nu_ansi_term::{Color, Style};
use serde::Deserialize;
use termcolor::ColorChoice;
use tracing::{field::{Field, Visit}, Level, Metadata};
use tracing_log::NormalizeEvent;
use tracing_subscriber::{
    filter::{FilterFn, LevelFilter},
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    prelude::*,
    registry::LookupSpan,
};

use crate::{prelude::*, args::Args};


#[derive(Debug, confique::Config)]
pub(crate) struct LogConfig {
    /// Which log messages to emit, by module path prefix and minimum level.
    ///
    /// For each message, the entry with the longest prefix of the message's
    /// module path decides. Messages without matching entry are dropped.
    /// Levels: "off", "error", "warn", "info", "debug" and "trace".
    ///
    /// Example: emit ≥"info" messages from Cairn in general, everything from
    /// the CMS client, nothing of the per-request HTTP logs and ≥"warn" from
    /// the HTTP library `hyper`:
    ///
    ///    [log]
    ///    filters.cairn = "info"
    ///    filters."cairn::cms" = "trace"
    ///    filters."cairn::http::log" = "off"
    ///    filters.hyper = "warn"
    #[config(default = { "cairn": "debug" })]
    pub(crate) filters: Filters,

    /// If set, log messages are also appended to this file. `${cmd}` is
    /// replaced by the short name of the running subcommand (`serve`,
    /// `generate` or `other`). Example: "/var/log/cairn-${cmd}.log".
    pub(crate) file: Option<PathBuf>,

    /// Whether to write log messages to stdout.
    #[config(default = true)]
    pub(crate) stdout: bool,

    /// If `true`, the headers of every incoming HTTP request are logged with
    /// level "trace".
    #[config(default = false)]
    pub(crate) log_http_headers: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "HashMap<String, String>")]
pub(crate) struct Filters(HashMap<String, LevelFilter>);

impl Filters {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.level_for(metadata.target()).is_some_and(|max| metadata.level() <= &max)
    }

    /// The level of the entry with the longest matching prefix. There are
    /// only ever a handful of entries, so a linear scan is fine.
    fn level_for(&self, target: &str) -> Option<LevelFilter> {
        self.0.iter()
            .filter(|(prefix, _)| target.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, level)| *level)
    }

    fn max_level(&self) -> LevelFilter {
        self.0.values().max().copied().unwrap_or(LevelFilter::OFF)
    }
}

impl TryFrom<HashMap<String, String>> for Filters {
    type Error = String;
    fn try_from(value: HashMap<String, String>) -> Result<Self, Self::Error> {
        value.into_iter()
            .map(|(prefix, level)| Ok((prefix, parse_level_filter(&level)?)))
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

fn parse_level_filter(s: &str) -> Result<LevelFilter, String> {
    match s {
        "off" => Ok(LevelFilter::OFF),
        "error" => Ok(LevelFilter::ERROR),
        "warn" => Ok(LevelFilter::WARN),
        "info" => Ok(LevelFilter::INFO),
        "debug" => Ok(LevelFilter::DEBUG),
        "trace" => Ok(LevelFilter::TRACE),
        other => Err(format!("invalid log level '{other}'")),
    }
}

/// Installs the global logger. Must only be called once per process.
pub(crate) fn init(config: &LogConfig, args: &Args, cmd: &str) -> Result<()> {
    let filter = {
        let filters = config.filters.clone();
        let max_level = filters.max_level();
        FilterFn::new(move |metadata| filters.enabled(metadata)).with_max_level_hint(max_level)
    };

    let stdout_output = config.stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .event_format(LineFormatter { color: args.color })
            .with_writer(std::io::stdout)
    });

    let file_output = config.file.as_deref()
        .map(|path| open_log_file(path, cmd))
        .transpose()?
        .map(|file| {
            // Files only get colors if explicitly requested.
            let color = match args.color {
                ColorChoice::Always => ColorChoice::Always,
                _ => ColorChoice::Never,
            };
            tracing_subscriber::fmt::layer()
                .event_format(LineFormatter { color })
                .with_ansi(color == ColorChoice::Always)
                .with_writer(file)
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_output)
        .with(stdout_output)
        .init();

    Ok(())
}

fn open_log_file(path: &Path, cmd: &str) -> Result<File> {
    use std::io::Write;

    let path = path.to_str()
        .ok_or_else(|| anyhow!("log file path '{}' is not valid UTF-8", path.display()))?
        .replace("${cmd}", cmd);

    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&path)
        .with_context(|| format!("failed to open/create log file '{path}'"))?;

    // Empty line to make process restarts easy to spot.
    file.write_all(b"\n").context("could not write to log file")?;
    Ok(file)
}


/// Formats each event as `time level target > message ~~ key=value ...`.
/// Continuation lines of multi-line messages are indented to line up with
/// the message start.
struct LineFormatter {
    color: ColorChoice,
}

impl<S, N> FormatEvent<S, N> for LineFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let ansi = self.color == ColorChoice::Always
            || (self.color != ColorChoice::Never && writer.has_ansi_escapes());
        let paint = |style: Style, s: &str| match ansi {
            true => style.paint(s).to_string(),
            false => s.to_owned(),
        };

        // Events forwarded from the `log` crate carry their real metadata in
        // fields.
        let normalized = event.normalized_metadata();
        let metadata = normalized.as_ref().unwrap_or(event.metadata());
        let (level_style, body_style) = level_styles(*metadata.level());

        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let head = format!(
            "{} {:5} {} > ",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            metadata.level(),
            metadata.target(),
        );
        let indent = format!("\n{:width$}", "", width = head.chars().count());

        write!(writer, "{}", paint(Style::new().dimmed(), &head))?;
        let message = fields.message.as_deref().unwrap_or("");
        write!(writer, "{}", paint(body_style, &message.replace('\n', &indent)))?;

        if !fields.values.is_empty() {
            write!(writer, "{}", paint(level_style, " ~~"))?;
            for (name, value) in &fields.values {
                write!(writer, " {}{}", paint(body_style.italic(), name), paint(body_style, "="))?;
                write!(writer, "{}", paint(body_style, &value.replace('\n', &indent)))?;
            }
        }

        writeln!(writer)
    }
}

fn level_styles(level: Level) -> (Style, Style) {
    match level {
        Level::ERROR => (Color::Red.bold(), Color::Red.normal()),
        Level::WARN => (Color::Yellow.bold(), Color::Yellow.normal()),
        Level::INFO => (Color::Green.normal(), Style::new()),
        Level::DEBUG => (Color::Blue.normal(), Style::new().dimmed()),
        Level::TRACE => (Color::Magenta.normal(), Color::DarkGray.normal()),
    }
}

/// Collects the message and all other fields of an event. Fields added by
/// `tracing-log` (`log.target`, ...) are skipped.
#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    values: Vec<(&'static str, String)>,
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{value:?}")),
            name if name.starts_with("log.") => {}
            name => {
                let mut s = String::new();
                let _ = write!(s, "{value:?}");
                self.values.push((name, s));
            }
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_owned()),
            name if name.starts_with("log.") => {}
            name => self.values.push((name, value.to_owned())),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn filters(entries: &[(&str, &str)]) -> Filters {
        let raw = entries.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        Filters::try_from(raw).unwrap()
    }

    #[test]
    fn longest_prefix_wins() {
        let f = filters(&[
            ("cairn", "info"),
            ("cairn::cms", "trace"),
            ("cairn::http::log", "off"),
        ]);

        assert_eq!(f.level_for("cairn::render"), Some(LevelFilter::INFO));
        assert_eq!(f.level_for("cairn::cms::sanity"), Some(LevelFilter::TRACE));
        assert_eq!(f.level_for("cairn::http::log::res"), Some(LevelFilter::OFF));
        assert_eq!(f.level_for("hyper::proto"), None);
        assert_eq!(f.max_level(), LevelFilter::TRACE);
    }

    #[test]
    fn invalid_level() {
        let raw = [("cairn".to_owned(), "loud".to_owned())].into_iter().collect::<HashMap<_, _>>();
        assert_eq!(Filters::try_from(raw).unwrap_err(), "invalid log level 'loud'");
    }

    #[test]
    fn log_file_name_contains_command() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("cairn-${cmd}.log");
        open_log_file(&template, "serve").unwrap();
        open_log_file(&template, "serve").unwrap();

        let written = std::fs::read_to_string(dir.path().join("cairn-serve.log")).unwrap();
        assert_eq!(written, "\n\n");
    }
}
