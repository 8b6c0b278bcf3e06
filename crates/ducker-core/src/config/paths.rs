//! Well-known filesystem locations

use std::path::PathBuf;

/// Default settings file path.
///
/// Returns: ~/.config/ducker/settings.json
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("ducker")
        .join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_shape() {
        let path = default_settings_path();
        assert!(path.ends_with("ducker/settings.json"));
    }
}
