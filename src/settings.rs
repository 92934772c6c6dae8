pub mod registrar;
pub mod store;

use serde::de::DeserializeOwned;
use std::fmt::Debug;

pub use registrar::SettingsRegistrar;
pub use store::SettingsStore;

/// A strongly-typed settings group bound from the configuration section
/// whose key equals [`Settings::NAME`].
///
/// Implement it with the [`settings!`](crate::settings!) macro so the
/// section name always matches the type name.
pub trait Settings: DeserializeOwned + Default + Debug + Send + Sync + 'static {
    const NAME: &'static str;
}

/// Implement [`Settings`] for one or more types, naming each section after
/// the type.
///
/// # Usage
///
/// ```rust,ignore
/// #[derive(Debug, Default, Deserialize)]
/// #[serde(default)]
/// pub struct KufarSettings {
///     pub base_api_url: String,
/// }
///
/// mammon::settings!(KufarSettings);
/// ```
#[macro_export]
macro_rules! settings {
    ($($settings:ident),+ $(,)?) => {
        $(
            impl $crate::settings::Settings for $settings {
                const NAME: &'static str = stringify!($settings);
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::Settings;

    #[derive(Debug, Default, Deserialize)]
    struct MailSettings {}

    #[derive(Debug, Default, Deserialize)]
    struct StorageSettings {}

    crate::settings!(MailSettings, StorageSettings);

    #[test]
    fn test_macro_names_section_after_type() {
        assert_eq!(MailSettings::NAME, "MailSettings");
        assert_eq!(StorageSettings::NAME, "StorageSettings");
    }
}
