use super::StoreSettings;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 150;
pub const DEFAULT_MUTATION_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_SEARCH_RESULT_LIMIT: usize = 500;

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            mutation_timeout_ms: DEFAULT_MUTATION_TIMEOUT_MS,
            search_result_limit: DEFAULT_SEARCH_RESULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::settings::Settings;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "store": { "page_size": 50 } }"#).unwrap();
        assert_eq!(settings.store.page_size, 50);
        assert_eq!(settings.store.search_debounce_ms, 150);
        assert_eq!(settings.store.search_result_limit, 500);
        assert!(settings.logging.level.is_empty());
    }
}
