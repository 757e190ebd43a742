use base64::{engine::general_purpose, Engine};
use md5::{Digest, Md5};
use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Prefix for icons returned as inline `data:` URIs.
pub const ICON_DATA_URI_PREFIX: &str = "data:image/png;base64, ";

/// Derive the cache key for a location query.
///
/// The query is hashed verbatim (no trimming or case folding) into a
/// 32-character lowercase hex MD5 digest, which is safe to use as a file stem.
pub fn cache_key(location: &str) -> String {
    hex::encode(Md5::digest(location.as_bytes()))
}

/// Ensure the cache directory path ends with a path separator.
pub fn normalize_cache_dir(dir: &Path) -> PathBuf {
    let mut raw: OsString = dir.as_os_str().to_owned();
    if !raw.to_string_lossy().ends_with(MAIN_SEPARATOR) {
        raw.push(MAIN_SEPARATOR.to_string());
    }
    PathBuf::from(raw)
}

/// `<key>.<language>`, shared by the memo and the disk file name.
pub fn weather_stem(key: &str, language: &str) -> String {
    format!("{}.{}", key, language)
}

pub fn weather_file_path(cache_dir: &Path, key: &str, language: &str) -> PathBuf {
    cache_dir.join(format!("{}.json", weather_stem(key, language)))
}

pub fn icon_file_path(cache_dir: &Path, icon_id: &str) -> PathBuf {
    cache_dir.join(format!("{}.png", icon_id))
}

/// Icon identifiers end up in file names and URL paths.
pub fn is_safe_icon_id(icon_id: &str) -> bool {
    !icon_id.is_empty() && icon_id.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn icon_data_uri(bytes: &[u8]) -> String {
    format!("{}{}", ICON_DATA_URI_PREFIX, general_purpose::STANDARD.encode(bytes))
}

/// Whether a file name belongs to this cache (`*.json` or `*.png`).
pub fn is_cache_artifact(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("json") | Some("png")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_stable_md5() {
        assert_eq!(cache_key("Berlin"), cache_key("Berlin"));
        // md5("") is a well known value
        assert_eq!(cache_key(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(cache_key("Berlin").len(), 32);
        assert!(cache_key("Berlin")
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_cache_key_is_verbatim() {
        assert_ne!(cache_key("Berlin"), cache_key("berlin"));
        assert_ne!(cache_key("Berlin"), cache_key("Berlin "));
    }

    #[test]
    fn test_normalize_cache_dir() {
        let sep = MAIN_SEPARATOR.to_string();
        let plain = normalize_cache_dir(Path::new("cache"));
        assert_eq!(plain.to_string_lossy(), format!("cache{}", sep));

        let already = normalize_cache_dir(&plain);
        assert_eq!(already, plain);
    }

    #[test]
    fn test_file_paths() {
        let dir = Path::new("/tmp/weather/");
        let key = cache_key("Paris");
        assert_eq!(
            weather_file_path(dir, &key, "fr"),
            PathBuf::from(format!("/tmp/weather/{}.fr.json", key))
        );
        assert_eq!(icon_file_path(dir, "10n"), PathBuf::from("/tmp/weather/10n.png"));
    }

    #[test]
    fn test_is_safe_icon_id() {
        assert!(is_safe_icon_id("01d"));
        assert!(!is_safe_icon_id(""));
        assert!(!is_safe_icon_id("../etc"));
        assert!(!is_safe_icon_id("01d.png"));
    }

    #[test]
    fn test_icon_data_uri() {
        assert_eq!(icon_data_uri(b"png"), "data:image/png;base64, cG5n");
        assert_eq!(icon_data_uri(&[]), ICON_DATA_URI_PREFIX);
    }

    #[test]
    fn test_is_cache_artifact() {
        assert!(is_cache_artifact(Path::new("abc.en.json")));
        assert!(is_cache_artifact(Path::new("01d.png")));
        assert!(!is_cache_artifact(Path::new("notes.txt")));
        assert!(!is_cache_artifact(Path::new("json")));
    }
}
