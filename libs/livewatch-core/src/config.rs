//! Provider conventions and heuristic cue lists.
//!
//! Everything the engine knows about the remote provider lives here as data:
//! host names, URL templates, the client identities used for probing and the
//! per-locale phrase lists the classifier matches against. The defaults target
//! the Facebook family of front ends; a TOML file can override any section.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder substituted with the target identifier in URL templates.
pub const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub provider: ProviderConfig,
    pub cues: Vec<LocaleCues>,
    pub auth_wall_markers: Vec<String>,
}

impl EngineConfig {
    /// Compiled-in configuration with the English and Vietnamese cue sets.
    pub fn builtin() -> Self {
        Self {
            provider: ProviderConfig::default(),
            cues: vec![LocaleCues::english(), LocaleCues::vietnamese()],
            auth_wall_markers: vec![
                "/login/".to_string(),
                "/login.php".to_string(),
                "/checkpoint/".to_string(),
            ],
        }
    }

    /// Parses a TOML document, filling anything it leaves out from [`EngineConfig::builtin`].
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        let parsed: PartialEngineConfig = toml::from_str(raw)?;
        let mut config = Self::builtin();
        if let Some(provider) = parsed.provider {
            config.provider = provider;
        }
        if let Some(cues) = parsed.cues {
            config.cues = cues;
        }
        if let Some(markers) = parsed.auth_wall_markers {
            config.auth_wall_markers = markers;
        }
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Deserialize)]
struct PartialEngineConfig {
    provider: Option<ProviderConfig>,
    cues: Option<Vec<LocaleCues>>,
    auth_wall_markers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Registrable domain every accepted URL must belong to.
    pub domain: String,
    /// Host used to build canonical probe URLs.
    pub canonical_host: String,
    /// Alternate front ends, lightest markup first. May include `canonical_host`.
    pub mirror_hosts: Vec<String>,
    /// Hosts that also serve the short `/p/{id}/` numeric route.
    pub short_route_hosts: Vec<String>,
    pub numeric_path: String,
    pub slug_path: String,
    pub group_path: String,
    pub short_numeric_path: String,
    /// Query parameter carrying a numeric identity.
    pub id_param: String,
    pub min_numeric_len: usize,
    pub max_variants: usize,
    pub probe_timeout_secs: u64,
    pub primary_profile: ClientProfile,
    pub crawler_profile: ClientProfile,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            domain: "facebook.com".to_string(),
            canonical_host: "mbasic.facebook.com".to_string(),
            mirror_hosts: vec![
                "mbasic.facebook.com".to_string(),
                "m.facebook.com".to_string(),
                "www.facebook.com".to_string(),
            ],
            short_route_hosts: vec!["m.facebook.com".to_string(), "www.facebook.com".to_string()],
            numeric_path: "/profile.php?id={id}".to_string(),
            slug_path: "/{id}".to_string(),
            group_path: "/groups/{id}".to_string(),
            short_numeric_path: "/p/{id}/".to_string(),
            id_param: "id".to_string(),
            min_numeric_len: 5,
            max_variants: 12,
            probe_timeout_secs: 20,
            primary_profile: ClientProfile::browser(),
            crawler_profile: ClientProfile::crawler(),
        }
    }
}

impl ProviderConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn url_for(&self, host: &str, template: &str, id: &str) -> String {
        format!("https://{}{}", host, template.replace(ID_PLACEHOLDER, id))
    }

    /// True when `host` is the provider domain or one of its subdomains.
    pub fn owns_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        let domain = self.domain.to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{}", domain))
    }
}

/// A named set of request headers presented to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientProfile {
    pub name: String,
    pub user_agent: String,
    pub accept_language: String,
}

impl ClientProfile {
    pub fn browser() -> Self {
        Self {
            name: "browser".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            accept_language: "vi-VN,vi;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
        }
    }

    pub fn crawler() -> Self {
        Self {
            name: "crawler".to_string(),
            user_agent: "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)"
                .to_string(),
            accept_language: "vi-VN,vi;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
        }
    }
}

/// Phrase lists for one locale. All entries are matched lowercase.
///
/// Existence cues must only appear on a rendered profile or group, never in
/// the provider's own navigation or footer, which also shows on the sign-in page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleCues {
    pub locale: String,
    #[serde(default)]
    pub dead_phrases: Vec<String>,
    #[serde(default)]
    pub existence_cues: Vec<String>,
    /// Substrings marking a title as the provider's generic sign-in page.
    #[serde(default)]
    pub placeholder_titles: Vec<String>,
}

impl LocaleCues {
    pub fn english() -> Self {
        Self {
            locale: "en".to_string(),
            dead_phrases: strings(&[
                "this content isn't available right now",
                "content isn't available right now",
                "this page isn't available",
                "the link may be broken",
                "page isn't available",
                "the page you requested cannot be displayed right now",
                "content not found",
                "not available right now",
            ]),
            existence_cues: strings(&[
                "add friend",
                "followers",
                "mutual friends",
                "join group",
                "public group",
                "private group",
                "page transparency",
            ]),
            placeholder_titles: strings(&["facebook", "log in", "log into"]),
        }
    }

    pub fn vietnamese() -> Self {
        Self {
            locale: "vi".to_string(),
            dead_phrases: strings(&[
                "trang bạn yêu cầu không thể hiển thị",
                "liên kết có thể đã bị hỏng",
                "bạn hiện không thể xem nội dung này",
                "nội dung này hiện không khả dụng",
                "rất tiếc, nội dung này hiện không khả dụng",
            ]),
            existence_cues: strings(&[
                "thêm bạn bè",
                "người theo dõi",
                "bạn chung",
                "tham gia nhóm",
                "nhóm công khai",
                "nhóm riêng tư",
                "minh bạch trang",
            ]),
            placeholder_titles: strings(&["đăng nhập"]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owns_host_accepts_subdomains_only_of_the_provider() {
        let provider = ProviderConfig::default();
        assert!(provider.owns_host("facebook.com"));
        assert!(provider.owns_host("www.facebook.com"));
        assert!(provider.owns_host("M.Facebook.com"));
        assert!(!provider.owns_host("notfacebook.com"));
        assert!(!provider.owns_host("facebook.com.evil.net"));
    }

    #[test]
    fn toml_overrides_only_the_sections_present() {
        let raw = r#"
            auth_wall_markers = ["/signin"]

            [[cues]]
            locale = "fr"
            dead_phrases = ["contenu indisponible"]
        "#;
        let config = EngineConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.auth_wall_markers, vec!["/signin".to_string()]);
        assert_eq!(config.cues.len(), 1);
        assert_eq!(config.cues[0].locale, "fr");
        assert_eq!(config.provider.domain, "facebook.com");
    }

    #[test]
    fn default_is_the_builtin_cue_set() {
        let config = EngineConfig::default();
        assert_eq!(config.cues.len(), 2);
        assert!(!config.auth_wall_markers.is_empty());
        assert!(config.cues.iter().all(|c| !c.dead_phrases.is_empty()));
    }

    #[test]
    fn provider_section_falls_back_to_field_defaults() {
        let raw = r#"
            [provider]
            domain = "provider.example"
            canonical_host = "lite.provider.example"
        "#;
        let config = EngineConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.provider.domain, "provider.example");
        assert_eq!(config.provider.max_variants, 12);
        assert_eq!(config.cues.len(), 2);
    }
}
