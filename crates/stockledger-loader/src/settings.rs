//! Application settings.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::LoadError;

/// Date-time layouts accepted by [`parse_date`], tried in order.
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Date-only layouts accepted by [`parse_date`]; they mean midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Layout used when writing dates back out.
const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const TMP_SUFFIX: &str = "tmp";

/// Parse a user-supplied date or date-time.
///
/// Accepts `2024-01-31T12:00:00`, `2024-01-31 12:00:00`, `2024-01-31`,
/// `31.01.2024` and `31/01/2024`.
pub fn parse_date(input: &str) -> Result<NaiveDateTime, LoadError> {
    let input = input.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| LoadError::InvalidDate(input.to_string()))
}

/// Render a date-time the way settings files store it.
pub fn format_date(value: NaiveDateTime) -> String {
    value.format(CANONICAL_FORMAT).to_string()
}

/// Output format of the command-line front-ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Aligned plain-text tables.
    #[default]
    Text,
    /// JSON documents.
    Json,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Settings shared by every front-end.
///
/// Every field is optional in the file and falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The block-period cutoff.
    #[serde(
        serialize_with = "serialize_period",
        deserialize_with = "deserialize_period"
    )]
    pub block_period: NaiveDateTime,
    /// Where the blocked-period snapshot is persisted. Relative paths are
    /// resolved against the settings file's directory.
    pub snapshot_file: PathBuf,
    /// Default output format.
    pub default_format: ReportFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            block_period: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap_or(NaiveDate::MIN)
                .and_time(NaiveTime::MIN),
            snapshot_file: PathBuf::from("blocked_turnovers.json"),
            default_format: ReportFormat::Text,
        }
    }
}

fn serialize_period<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_date(*value))
}

fn deserialize_period<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(d)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

impl Settings {
    /// Read settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let data = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| LoadError::Decode {
            origin: path.display().to_string(),
            source,
        })
    }

    /// Read settings from `path` if it exists, otherwise use the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, LoadError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write settings as pretty JSON, replacing the file atomically.
    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        let io_error = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let data = serde_json::to_string_pretty(self).map_err(LoadError::Encode)?;

        let mut tmp = path.to_path_buf();
        let ext = match path.extension().and_then(|ext| ext.to_str()) {
            Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
            None => TMP_SUFFIX.to_string(),
        };
        tmp.set_extension(ext);

        let mut file = fs::File::create(&tmp).map_err(io_error)?;
        file.write_all(data.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(io_error)?;
        drop(file);
        fs::rename(&tmp, path).map_err(io_error)?;

        info!(path = %path.display(), block_period = %self.block_period, "saved settings");
        Ok(())
    }

    /// The snapshot file path, resolved against the settings file location.
    pub fn snapshot_path(&self, settings_path: &Path) -> PathBuf {
        if self.snapshot_file.is_absolute() {
            return self.snapshot_file.clone();
        }
        settings_path
            .parent()
            .map_or_else(|| self.snapshot_file.clone(), |dir| dir.join(&self.snapshot_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-31T12:30:05").unwrap(), dt(2024, 1, 31, 12, 30, 5));
        assert_eq!(parse_date("2024-01-31 12:30:05").unwrap(), dt(2024, 1, 31, 12, 30, 5));
        assert_eq!(parse_date(" 2024-01-31 ").unwrap(), dt(2024, 1, 31, 0, 0, 0));
        assert_eq!(parse_date("31.01.2024").unwrap(), dt(2024, 1, 31, 0, 0, 0));
        assert_eq!(parse_date("31/01/2024").unwrap(), dt(2024, 1, 31, 0, 0, 0));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        let err = parse_date("01-31-2024").unwrap_err();
        assert!(matches!(err, LoadError::InvalidDate(ref s) if s == "01-31-2024"));
        assert!(err.is_validation());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{"block_period": "01.06.2024"}"#).unwrap();
        assert_eq!(settings.block_period, dt(2024, 6, 1, 0, 0, 0));
        assert_eq!(settings.snapshot_file, PathBuf::from("blocked_turnovers.json"));
        assert_eq!(settings.default_format, ReportFormat::Text);
    }

    #[test]
    fn test_snapshot_path_resolution() {
        let settings = Settings::default();
        assert_eq!(
            settings.snapshot_path(Path::new("conf/settings.json")),
            PathBuf::from("conf/blocked_turnovers.json")
        );
    }
}
