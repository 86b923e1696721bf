#[cfg(test)]
mod tests {
    use crate::config::settings::Settings;

    #[test]
    fn test_config_loading_defaults() {
        let settings = Settings::new().expect("default configuration should load");

        assert_eq!(settings.storage.storage_type, "local");
        assert_eq!(settings.gateway.timeout_secs, 15);
        assert!(settings.gateway.direct_first);
        assert_eq!(settings.gateway.relays.len(), 3);
        assert!(settings
            .gateway
            .relays
            .iter()
            .all(|r| r.contains("{url}")));
        assert_eq!(settings.collection.region_delay_ms, 1000);
        assert_eq!(settings.sources.kindergarten.page_size, 100);
        assert!(settings.sources.church.endpoint.contains("{keyword}"));
        assert!(settings.sources.church.endpoint.contains("{page}"));
        assert_eq!(settings.run.mode, "collect");
        assert!(settings.run.regions.is_empty());
    }

    #[test]
    fn test_config_env_override() {
        std::env::set_var("REGCRAWL__EXTRACTION__TARGET_DELAY_MS", "25");
        let settings = Settings::new().expect("configuration should load");
        std::env::remove_var("REGCRAWL__EXTRACTION__TARGET_DELAY_MS");

        assert_eq!(settings.extraction.target_delay_ms, 25);
    }

    #[test]
    fn test_validate_defaults() {
        let settings = Settings::new().expect("default configuration should load");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = Settings::new().expect("default configuration should load");

        let mut settings = base.clone();
        settings.run.mode = "serve".to_string();
        assert!(settings.validate().is_err());

        let mut settings = base.clone();
        settings.storage.storage_type = "s3".to_string();
        assert!(settings.validate().is_err());

        let mut settings = base.clone();
        settings.gateway.direct_first = false;
        settings.gateway.relays.clear();
        assert!(settings.validate().is_err());

        let mut settings = base.clone();
        settings.gateway.relays.push("https://relay.test/raw".to_string());
        assert!(settings.validate().is_err());

        let mut settings = base;
        settings.sources.academy.page_size = 0;
        assert!(settings.validate().is_err());
    }
}
