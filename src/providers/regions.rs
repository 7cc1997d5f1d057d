//! Region-specific base URLs per provider

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::utils::constants::DEFAULT_REGION;

static BUILTIN_REGIONS: Lazy<RegionTable> = Lazy::new(|| {
    let mut table = RegionTable::empty();
    let entries: &[(&str, &[(&str, &str)])] = &[
        (
            "google",
            &[
                ("com", "https://www.google.com"),
                ("cn", "https://www.google.com.hk"),
                ("hk", "https://www.google.com.hk"),
                ("jp", "https://www.google.co.jp"),
                ("kr", "https://www.google.co.kr"),
                ("uk", "https://www.google.co.uk"),
                ("de", "https://www.google.de"),
                ("fr", "https://www.google.fr"),
            ],
        ),
        (
            "google_news",
            &[
                ("com", "https://www.google.com"),
                ("cn", "https://www.google.com.hk"),
                ("hk", "https://www.google.com.hk"),
            ],
        ),
        (
            "bing",
            &[
                ("cn", "https://cn.bing.com"),
                ("com", "https://www.bing.com"),
                ("uk", "https://www.bing.co.uk"),
                ("de", "https://www.bing.de"),
                ("fr", "https://www.bing.fr"),
                ("jp", "https://www.bing.co.jp"),
                ("kr", "https://www.bing.co.kr"),
            ],
        ),
        ("duckduckgo", &[("com", "https://duckduckgo.com")]),
        ("baidu", &[("com", "https://www.baidu.com")]),
        ("baidu_news", &[("com", "https://www.baidu.com")]),
    ];
    for (provider, regions) in entries {
        for (region, url) in *regions {
            table.insert(provider, region, url);
        }
    }
    table
});

/// provider -> region -> base URL
#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    entries: HashMap<String, HashMap<String, String>>,
}

impl RegionTable {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Table for the providers shipped with searchpool
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN_REGIONS.clone()
    }

    /// Add or replace one entry
    pub fn insert(&mut self, provider: &str, region: &str, base_url: &str) {
        self.entries
            .entry(provider.to_string())
            .or_default()
            .insert(region.to_string(), base_url.trim_end_matches('/').to_string());
    }

    /// Base URL for `provider` in `region`, falling back to the default region
    #[must_use]
    pub fn base_url(&self, provider: &str, region: &str) -> Option<&str> {
        let regions = self.entries.get(provider)?;
        regions
            .get(region)
            .or_else(|| regions.get(DEFAULT_REGION))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_lookup_with_fallback() {
        let table = RegionTable::builtin();
        assert_eq!(table.base_url("bing", "cn"), Some("https://cn.bing.com"));
        assert_eq!(table.base_url("google", "hk"), Some("https://www.google.com.hk"));
        assert_eq!(table.base_url("duckduckgo", "jp"), Some("https://duckduckgo.com"));
        assert_eq!(table.base_url("nowhere", "com"), None);
    }

    #[test]
    fn test_insert_trims_trailing_slash() {
        let mut table = RegionTable::empty();
        table.insert("local", "com", "http://127.0.0.1:8080/");
        assert_eq!(table.base_url("local", "de"), Some("http://127.0.0.1:8080"));
    }
}
