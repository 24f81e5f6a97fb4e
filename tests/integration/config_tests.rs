use dirdedupe::actions::DeleteMode;
use dirdedupe::cli::Cli;
use dirdedupe::config::{Config, ConfigError, ConfigOverrides};
use dirdedupe::scanner::HashAlgorithm;
use clap::Parser;
use figment::Jail;

#[test]
fn test_file_values_used_when_no_flags() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "dd.toml",
            r#"
            workers = 2
            follow_symlinks = true
            cache = "/var/tmp/dd.json"
            "#,
        )?;
        let path = jail.directory().join("dd.toml");
        let config = Config::load(Some(&path), &ConfigOverrides::default()).unwrap();

        assert_eq!(config.workers, 2);
        assert!(config.follow_symlinks);
        assert_eq!(config.cache.as_deref(), Some(std::path::Path::new("/var/tmp/dd.json")));
        assert_eq!(config.algorithm, HashAlgorithm::Blake3);
        Ok(())
    });
}

#[test]
fn test_cli_flags_override_file_and_env() {
    Jail::expect_with(|jail| {
        jail.create_file("dd.toml", "workers = 2\ndelete_mode = \"permanent\"")?;
        jail.set_env("DIRDEDUPE_ALGORITHM", "md5");
        let path = jail.directory().join("dd.toml");
        let path_str = path.to_string_lossy().into_owned();

        let cli = Cli::try_parse_from([
            "dirdedupe",
            "/a",
            "/b",
            "--config",
            path_str.as_str(),
            "-w",
            "6",
            "--trash",
        ])
        .unwrap();
        let config = Config::load(cli.config.as_deref(), &cli.config_overrides()).unwrap();

        assert_eq!(config.workers, 6);
        assert_eq!(config.delete_mode, DeleteMode::Trash);
        assert_eq!(config.algorithm, HashAlgorithm::Md5);
        Ok(())
    });
}

#[test]
fn test_env_zero_workers_is_invalid() {
    Jail::expect_with(|jail| {
        jail.create_file("dd.toml", "")?;
        jail.set_env("DIRDEDUPE_WORKERS", "0");
        let path = jail.directory().join("dd.toml");
        let result = Config::load(Some(&path), &ConfigOverrides::default());
        assert!(matches!(result, Err(ConfigError::InvalidWorkers)));
        Ok(())
    });
}

#[test]
fn test_unparseable_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("dd.toml", "workers = = 3")?;
        let path = jail.directory().join("dd.toml");
        let result = Config::load(Some(&path), &ConfigOverrides::default());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        Ok(())
    });
}
