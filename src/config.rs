// Runtime configuration for the stay-forge binary: environment first, then CLI flags

use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::ConfigError;
use crate::profile::GeneratorProfile;

pub const DEFAULT_OUTPUT: &str = "hotel_stays.csv";

/// Profiles shipped with the crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BuiltinProfile {
    #[default]
    HotelCalendar,
    Meteorological,
}

impl BuiltinProfile {
    pub fn profile(&self) -> Result<GeneratorProfile, ConfigError> {
        match self {
            BuiltinProfile::HotelCalendar => GeneratorProfile::hotel_calendar(),
            BuiltinProfile::Meteorological => GeneratorProfile::meteorological(),
        }
    }
}

impl FromStr for BuiltinProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hotel-calendar" | "hotel_calendar" => Ok(BuiltinProfile::HotelCalendar),
            "meteorological" => Ok(BuiltinProfile::Meteorological),
            _ => Err(ConfigError::UnknownProfile(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Where the generated CSV is written.
    pub output: PathBuf,
    /// Overrides the profile's record count.
    pub record_count: Option<usize>,
    /// Seed for the random source; a fresh one is drawn when unset.
    pub seed: Option<u64>,
    pub profile: BuiltinProfile,
    /// JSON profile that replaces the built-in one.
    pub profile_file: Option<PathBuf>,
    /// Emit logs as JSON lines.
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            record_count: None,
            seed: None,
            profile: BuiltinProfile::default(),
            profile_file: None,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv().ok()` first so a `.env` file in the working
    /// directory is honoured. Unset variables keep their defaults; set but
    /// unparseable ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            output: lookup("STAY_FORGE_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output),
            record_count: parse_var(&lookup, "STAY_FORGE_RECORDS")?,
            seed: parse_var(&lookup, "STAY_FORGE_SEED")?,
            profile: parse_var(&lookup, "STAY_FORGE_PROFILE")?.unwrap_or(defaults.profile),
            profile_file: lookup("STAY_FORGE_PROFILE_FILE").map(PathBuf::from),
            log_json: parse_bool(&lookup, "STAY_FORGE_LOG_JSON", defaults.log_json),
        })
    }

    /// Builds the profile the generator should run with: the profile file if
    /// one is configured, otherwise the built-in profile, then the record
    /// count override.
    pub fn resolve_profile(&self) -> Result<GeneratorProfile, ConfigError> {
        let profile = match &self.profile_file {
            Some(path) => GeneratorProfile::from_json_file(path)?,
            None => self.profile.profile()?,
        };
        let profile = match self.record_count {
            Some(count) => profile.with_record_count(count),
            None => profile,
        };
        profile.validate()?;
        Ok(profile)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
    }
}

/// Accepts `"true"`, `"1"`, `"false"`, `"0"` (case-insensitive).
/// Returns `default` otherwise.
fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.output, PathBuf::from("hotel_stays.csv"));
    }

    #[test]
    fn test_reads_every_variable() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("STAY_FORGE_OUTPUT", "out/stays.csv"),
            ("STAY_FORGE_RECORDS", "1500"),
            ("STAY_FORGE_SEED", "42"),
            ("STAY_FORGE_PROFILE", "meteorological"),
            ("STAY_FORGE_PROFILE_FILE", "profiles/custom.json"),
            ("STAY_FORGE_LOG_JSON", "TRUE"),
        ]))
        .unwrap();

        assert_eq!(config.output, PathBuf::from("out/stays.csv"));
        assert_eq!(config.record_count, Some(1500));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.profile, BuiltinProfile::Meteorological);
        assert_eq!(
            config.profile_file,
            Some(PathBuf::from("profiles/custom.json"))
        );
        assert!(config.log_json);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let err = AppConfig::from_lookup(lookup_from(&[("STAY_FORGE_RECORDS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "STAY_FORGE_RECORDS"));

        let err = AppConfig::from_lookup(lookup_from(&[("STAY_FORGE_PROFILE", "luxury")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_unrecognised_bool_keeps_default() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("STAY_FORGE_LOG_JSON", "maybe")])).unwrap();
        assert!(!config.log_json);
    }

    #[test]
    fn test_resolve_profile_applies_record_override() {
        let config = AppConfig {
            record_count: Some(10),
            profile: BuiltinProfile::Meteorological,
            ..AppConfig::default()
        };
        let profile = config.resolve_profile().unwrap();
        assert_eq!(profile.name, "meteorological");
        assert_eq!(profile.record_count, 10);
    }

    #[test]
    fn test_resolve_profile_prefers_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let custom = GeneratorProfile {
            name: "custom".to_string(),
            ..GeneratorProfile::hotel_calendar().unwrap()
        };
        std::fs::write(&path, custom.to_json().unwrap()).unwrap();

        let config = AppConfig {
            profile_file: Some(path),
            profile: BuiltinProfile::Meteorological,
            ..AppConfig::default()
        };
        assert_eq!(config.resolve_profile().unwrap().name, "custom");
    }

    #[test]
    fn test_builtin_profile_names() {
        assert_eq!(
            "hotel-calendar".parse::<BuiltinProfile>().unwrap(),
            BuiltinProfile::HotelCalendar
        );
        assert_eq!(
            "Meteorological".parse::<BuiltinProfile>().unwrap(),
            BuiltinProfile::Meteorological
        );
        assert!("resort".parse::<BuiltinProfile>().is_err());
    }
}
