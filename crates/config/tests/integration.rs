//! Integration tests for config crate

#[cfg(test)]
mod tests {
    use pnlog_config::*;
    use pnlog_errors::{ConfigError, Error};
    use pnlog_types::{ColorChoice, OutputFormat};
    use std::io::Write;

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[general]\noutput = \"json\"\ncolor = \"always\"\n\n[decoder]\nignore_blank = false\n\n[logging]\nfilter = \"debug\""
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).await.unwrap();
        assert_eq!(config.general.output, OutputFormat::Json);
        assert_eq!(config.general.color, ColorChoice::Always);
        assert!(!config.decoder.ignore_blank);
        assert_eq!(config.decoder.max_record_bytes, 1024 * 1024);
        assert_eq!(config.logging.filter(), "debug");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let err = Config::load_or_default(Some(&path)).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[general\noutput = ").unwrap();
        let err = Config::load_from_file(file.path()).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_default_path_is_pnlog_config() {
        if let Ok(path) = Config::default_path() {
            assert!(path.ends_with("pnlog/config.toml"));
        }
    }
}
