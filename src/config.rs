use std::path::PathBuf;

/// Environment variable overriding the default store location.
pub const STORE_ENV: &str = "APPT_STORE";

const APP_DIR: &str = "appt-insights";
const STORE_FILE: &str = "records.json";

/// Runtime settings shared by the CLI commands.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// JSON snapshot holding every ingested record.
    pub store_path: PathBuf,
    /// Tag for number formatting (`en`, `de`, ...).
    pub locale: String,
    /// Rows per page in listings.
    pub page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            locale: "en".into(),
            page_size: 10,
        }
    }
}

impl Settings {
    /// Apply explicit overrides on top of the defaults. The env variable sits between the two.
    pub fn resolve(store: Option<PathBuf>, locale: Option<String>, page_size: Option<usize>) -> Self {
        let defaults = Self::default();
        Self {
            store_path: store
                .or_else(|| std::env::var_os(STORE_ENV).map(PathBuf::from))
                .unwrap_or(defaults.store_path),
            locale: locale.unwrap_or(defaults.locale),
            page_size: page_size.filter(|n| *n > 0).unwrap_or(defaults.page_size),
        }
    }
}

/// `<data dir>/appt-insights/records.json`, falling back to the working directory.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(STORE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_win() {
        let s = Settings::resolve(Some("x.json".into()), Some("de".into()), Some(25));
        assert_eq!(s.store_path, PathBuf::from("x.json"));
        assert_eq!(s.locale, "de");
        assert_eq!(s.page_size, 25);
    }

    #[test]
    fn zero_page_size_falls_back() {
        let s = Settings::resolve(Some("x.json".into()), None, Some(0));
        assert_eq!(s.page_size, 10);
        assert!(default_store_path().ends_with("appt-insights/records.json"));
    }
}
