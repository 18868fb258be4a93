//! INI file configuration adapter.

use crate::domain::error::ConfigError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| ConfigError::Parse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ConfigError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ConfigError::Parse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
dir = ./data
symbols = RELIANCE,TCS

[strategy]
name = Nifty momentum
min_score = 4
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "symbols"),
            Some("RELIANCE,TCS".to_string())
        );
        assert_eq!(
            adapter.get_string("strategy", "name"),
            Some("Nifty momentum".to_string())
        );
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let adapter =
            FileConfigAdapter::from_string("[conditions]\nTREND = ABOVE(CLOSE, EMA_TREND)\n")
                .unwrap();
        assert_eq!(
            adapter.get_string("conditions", "TREND"),
            Some("ABOVE(CLOSE, EMA_TREND)".to_string())
        );
        assert_eq!(
            adapter.get_string("Conditions", "trend"),
            Some("ABOVE(CLOSE, EMA_TREND)".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[position]\nrisk_pct = 2\n").unwrap();
        assert_eq!(adapter.get_string("position", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn blank_value_is_present_but_empty() {
        let adapter = FileConfigAdapter::from_string("[strategy]\nfilters =\n").unwrap();
        assert_eq!(
            adapter.get_string("strategy", "filters"),
            Some(String::new())
        );
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[notify]\noutbox = /tmp/outbox\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("notify", "outbox"),
            Some("/tmp/outbox".to_string())
        );
    }

    #[test]
    fn from_file_missing_file_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(ConfigError::Parse { ref file, .. }) if file.contains("config.ini")));
    }
}
