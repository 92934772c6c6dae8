use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use config_rs::{Config as ConfigRs, Value, ValueKind};
use tracing::{debug, info, trace, warn};

use super::{store::SettingsStore, Settings};

type Binder = fn(Option<Value>) -> Arc<dyn Any + Send + Sync>;

struct SettingsVariant {
    name: &'static str,
    type_id: TypeId,
    bind: Binder,
}

/// The set of settings types known to the application.
///
/// Every registered type is bound by [`SettingsRegistrar::bind`], whether
/// or not the configuration carries a section for it. The registry, not the
/// configuration file, decides which settings exist.
#[derive(Default)]
pub struct SettingsRegistrar {
    variants: Vec<SettingsVariant>,
}

impl SettingsRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `T` to the known settings. Registering the same type again is a
    /// no-op.
    ///
    /// # Panics
    /// Panics if a different type already claims the same section name,
    /// since both would be bound from one section.
    pub fn register<T: Settings>(&mut self) -> &mut Self {
        let type_id = TypeId::of::<T>();
        if self.variants.iter().any(|variant| variant.type_id == type_id) {
            return self;
        }

        assert!(
            !self
                .variants
                .iter()
                .any(|variant| variant.name.eq_ignore_ascii_case(T::NAME)),
            "Settings section '{}' is claimed by more than one type",
            T::NAME
        );

        self.variants.push(SettingsVariant {
            name: T::NAME,
            type_id,
            bind: bind_section::<T>,
        });
        self
    }

    /// Binds every known settings type from `config`.
    ///
    /// Never fails: a missing section yields the type's defaults, and so
    /// does a section that cannot be deserialized (with a warning).
    pub fn bind(&self, config: &ConfigRs) -> SettingsStore {
        let root = config
            .clone()
            .try_deserialize::<HashMap<String, Value>>()
            .unwrap_or_else(|e| {
                warn!("Configuration could not be read as a table, binding defaults: {e}");
                HashMap::new()
            });

        let bound = self
            .variants
            .iter()
            .map(|variant| {
                let settings = (variant.bind)(find_section(&root, variant.name));
                info!("Injected settings for {}", variant.name);
                (variant.type_id, variant.name, settings)
            })
            .collect();

        SettingsStore::from_bound(bound)
    }
}

fn bind_section<T: Settings>(section: Option<Value>) -> Arc<dyn Any + Send + Sync> {
    let settings = match section {
        Some(section) => section.try_deserialize::<T>().unwrap_or_else(|e| {
            warn!(
                "Settings section '{}' could not be bound, using defaults: {}",
                T::NAME,
                e
            );
            T::default()
        }),
        None => {
            debug!("No configuration section for '{}', using defaults", T::NAME);
            T::default()
        }
    };

    trace!("Bound {}: {:?}", T::NAME, settings);
    Arc::new(settings)
}

/// Exact key first, then every key equal to `name` ignoring ASCII case laid
/// over it in key order. Environment overrides arrive lower-cased.
fn find_section(root: &HashMap<String, Value>, name: &str) -> Option<Value> {
    let mut section = root.get(name).cloned();

    let mut folded: Vec<_> = root
        .iter()
        .filter(|(key, _)| key.as_str() != name && key.eq_ignore_ascii_case(name))
        .collect();
    folded.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (_, value) in folded {
        match section.as_mut() {
            Some(base) => overlay(base, value.clone()),
            None => section = Some(value.clone()),
        }
    }

    section
}

/// Lays `top` over `base`. Table keys are matched ignoring ASCII case and
/// underscores, so `base_api_url` and `baseapiurl` replace `BaseApiUrl`
/// instead of sitting next to it. The key spelled in `base` is kept.
fn overlay(base: &mut Value, top: Value) {
    match top.kind {
        ValueKind::Table(top_table) if matches!(base.kind, ValueKind::Table(_)) => {
            if let ValueKind::Table(base_table) = &mut base.kind {
                for (key, value) in top_table {
                    let existing_key = if base_table.contains_key(&key) {
                        Some(key.clone())
                    } else {
                        base_table
                            .keys()
                            .find(|existing| folded_key(existing) == folded_key(&key))
                            .cloned()
                    };

                    match existing_key.and_then(|existing| base_table.get_mut(&existing)) {
                        Some(existing) => overlay(existing, value),
                        None => {
                            base_table.insert(key, value);
                        }
                    }
                }
            }
        }
        kind => base.kind = kind,
    }
}

fn folded_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use config_rs::{File, FileFormat};
    use serde::Deserialize;

    use super::*;
    use crate::test_support::capture_logs;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct FeedSettings {
        url: String,
        retries: u32,
        tags: Vec<String>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default)]
    struct PollSettings {
        interval_seconds: u64,
    }

    impl Default for PollSettings {
        fn default() -> Self {
            Self {
                interval_seconds: 30,
            }
        }
    }

    #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
    #[derive(Debug, Default, Deserialize)]
    struct FEEDSETTINGS {}

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct SourceSettings {
        #[serde(alias = "BaseUrl")]
        base_url: String,
        #[serde(alias = "PageSize")]
        page_size: u32,
    }

    crate::settings!(FeedSettings, PollSettings, FEEDSETTINGS, SourceSettings);

    fn config_from(sources: &[&str]) -> ConfigRs {
        sources
            .iter()
            .fold(ConfigRs::builder(), |builder, json| {
                builder.add_source(File::from_str(json, FileFormat::Json))
            })
            .build()
            .unwrap()
    }

    fn registrar() -> SettingsRegistrar {
        let mut registrar = SettingsRegistrar::new();
        registrar.register::<FeedSettings>().register::<PollSettings>();
        registrar
    }

    #[test]
    fn test_present_section_is_bound_verbatim() {
        let config = config_from(&[r#"{
            "FeedSettings": { "url": "https://feed.example", "retries": 4, "tags": ["a", "b"] },
            "PollSettings": { "interval_seconds": 5 }
        }"#]);

        let store = registrar().bind(&config);

        assert_eq!(
            *store.get::<FeedSettings>().unwrap(),
            FeedSettings {
                url: "https://feed.example".to_string(),
                retries: 4,
                tags: vec!["a".to_string(), "b".to_string()],
            }
        );
        assert_eq!(store.get::<PollSettings>().unwrap().interval_seconds, 5);
    }

    #[test]
    fn test_missing_section_binds_defaults() {
        let config = config_from(&[r#"{ "Unrelated": { "key": "value" } }"#]);

        let store = registrar().bind(&config);

        assert_eq!(*store.get::<FeedSettings>().unwrap(), FeedSettings::default());
        assert_eq!(store.get::<PollSettings>().unwrap().interval_seconds, 30);
    }

    #[test]
    fn test_partial_section_keeps_defaults_for_absent_fields() {
        let config = config_from(&[r#"{ "FeedSettings": { "url": "https://feed.example" } }"#]);

        let store = registrar().bind(&config);

        let feed = store.get::<FeedSettings>().unwrap();
        assert_eq!(feed.url, "https://feed.example");
        assert_eq!(feed.retries, 0);
        assert!(feed.tags.is_empty());
    }

    #[test]
    fn test_lowercased_override_is_laid_over_section() {
        let config = config_from(&[
            r#"{ "FeedSettings": { "url": "https://file.example", "retries": 2 } }"#,
            r#"{ "feedsettings": { "url": "https://override.example" } }"#,
        ]);

        let store = registrar().bind(&config);

        let feed = store.get::<FeedSettings>().unwrap();
        assert_eq!(feed.url, "https://override.example");
        assert_eq!(feed.retries, 2);
    }

    fn bind_source(sources: &[&str]) -> (Arc<SourceSettings>, String) {
        let config = config_from(sources);
        let mut registrar = SettingsRegistrar::new();
        registrar.register::<SourceSettings>();

        let (store, logs) = capture_logs(|| registrar.bind(&config));
        (store.get::<SourceSettings>().unwrap(), logs)
    }

    #[test]
    fn test_snake_case_override_replaces_pascal_case_key() {
        let (source, logs) = bind_source(&[
            r#"{ "SourceSettings": { "BaseUrl": "https://file.example", "PageSize": 20 } }"#,
            r#"{ "sourcesettings": { "base_url": "https://override.example" } }"#,
        ]);

        assert_eq!(source.base_url, "https://override.example");
        assert_eq!(source.page_size, 20);
        assert!(!logs.contains("WARN"));
    }

    #[test]
    fn test_lowercased_pascal_case_override_replaces_key() {
        let (source, _) = bind_source(&[
            r#"{ "SourceSettings": { "BaseUrl": "https://file.example", "PageSize": 20 } }"#,
            r#"{ "sourcesettings": { "baseurl": "https://override.example" } }"#,
        ]);

        assert_eq!(source.base_url, "https://override.example");
        assert_eq!(source.page_size, 20);
    }

    #[test]
    fn test_nested_keys_are_matched_ignoring_case() {
        let config = config_from(&[
            r#"{ "Section": { "Paging": { "PageSize": 20, "MaxPages": 3 } } }"#,
            r#"{ "section": { "paging": { "page_size": 50 } } }"#,
        ]);
        let root = config.try_deserialize::<HashMap<String, Value>>().unwrap();

        let section: HashMap<String, HashMap<String, u32>> = find_section(&root, "Section")
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(section.len(), 1);
        assert_eq!(section["Paging"].len(), 2);
        assert_eq!(section["Paging"]["PageSize"], 50);
        assert_eq!(section["Paging"]["MaxPages"], 3);
    }

    #[test]
    fn test_malformed_section_falls_back_to_defaults_with_warning() {
        let config = config_from(&[r#"{ "PollSettings": { "interval_seconds": "soon" } }"#]);

        let (store, logs) = capture_logs(|| registrar().bind(&config));

        assert_eq!(store.get::<PollSettings>().unwrap().interval_seconds, 30);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Settings section 'PollSettings' could not be bound"));
    }

    #[test]
    fn test_logs_one_line_per_bound_type() {
        let config = config_from(&[r#"{}"#]);

        let (_, logs) = capture_logs(|| registrar().bind(&config));

        let injected: Vec<_> = logs
            .lines()
            .filter(|line| line.contains("Injected settings for"))
            .collect();
        assert_eq!(injected.len(), 2);
        assert!(injected.iter().all(|line| line.contains("INFO")));
        assert!(injected.iter().any(|line| line.ends_with("FeedSettings")));
        assert!(injected.iter().any(|line| line.ends_with("PollSettings")));
    }

    #[test]
    fn test_registering_same_type_twice_keeps_one_entry() {
        let mut registrar = registrar();
        registrar.register::<FeedSettings>();

        assert_eq!(
            registrar.bind(&config_from(&[r#"{}"#])).names(),
            vec!["FeedSettings", "PollSettings"]
        );
    }

    #[test]
    #[should_panic(expected = "claimed by more than one type")]
    fn test_colliding_section_names_panic() {
        let mut registrar = registrar();
        registrar.register::<FEEDSETTINGS>();
    }
}
