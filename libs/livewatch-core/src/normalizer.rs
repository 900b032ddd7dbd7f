use crate::TargetKind;
use crate::config::ProviderConfig;
use crate::error::NormalizeError;
use url::Url;

/// Canonical identity of a target plus the URL the engine probes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTarget {
    pub id: String,
    pub canonical_url: String,
    pub kind: TargetKind,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    provider: ProviderConfig,
}

impl Normalizer {
    pub fn new(provider: ProviderConfig) -> Self {
        Self { provider }
    }

    /// Accepts either a provider URL or a bare identifier.
    pub fn normalize(
        &self,
        input: &str,
        kind_hint: Option<TargetKind>,
    ) -> Result<NormalizedTarget, NormalizeError> {
        let input = input.trim();
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            self.from_url(input, kind_hint)
        } else {
            self.from_token(input, kind_hint)
        }
    }

    fn from_url(
        &self,
        input: &str,
        kind_hint: Option<TargetKind>,
    ) -> Result<NormalizedTarget, NormalizeError> {
        let invalid_source = || NormalizeError::InvalidSource {
            input: input.to_string(),
            expected: self.provider.domain.clone(),
        };

        let url = Url::parse(input).map_err(|_| invalid_source())?;
        let host = url.host_str().ok_or_else(invalid_source)?;
        if !self.provider.owns_host(host) {
            return Err(invalid_source());
        }

        // An explicit numeric id outranks whatever slug the path carries.
        if let Some((_, value)) = url
            .query_pairs()
            .find(|(key, value)| key == self.provider.id_param.as_str() && is_numeric(value))
        {
            return Ok(self.build(value.into_owned(), kind_hint.unwrap_or_default()));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [] => Err(NormalizeError::InvalidIdentifier(input.to_string())),
            ["groups", group, ..] => {
                let id = self.checked_identifier(group)?;
                Ok(self.build(id, TargetKind::Group))
            }
            ["groups"] => Err(NormalizeError::InvalidIdentifier(input.to_string())),
            ["p", numeric, ..] if is_numeric(numeric) => {
                Ok(self.build(numeric.to_string(), kind_hint.unwrap_or_default()))
            }
            ["profile.php", ..] => Err(invalid_source()),
            [slug, ..] => {
                let id = self.checked_identifier(slug)?;
                Ok(self.build(id, kind_hint.unwrap_or_default()))
            }
        }
    }

    fn from_token(
        &self,
        token: &str,
        kind_hint: Option<TargetKind>,
    ) -> Result<NormalizedTarget, NormalizeError> {
        let id = self.checked_identifier(token)?;
        Ok(self.build(id, kind_hint.unwrap_or_default()))
    }

    fn checked_identifier(&self, raw: &str) -> Result<String, NormalizeError> {
        if is_identifier(raw) {
            Ok(raw.to_string())
        } else {
            Err(NormalizeError::InvalidIdentifier(raw.to_string()))
        }
    }

    fn build(&self, id: String, kind: TargetKind) -> NormalizedTarget {
        let provider = &self.provider;
        let template = match kind {
            TargetKind::Group => &provider.group_path,
            TargetKind::Profile if self.is_numeric_id(&id) => &provider.numeric_path,
            TargetKind::Profile => &provider.slug_path,
        };
        let canonical_url = provider.url_for(&provider.canonical_host, template, &id);
        NormalizedTarget {
            id,
            canonical_url,
            kind,
        }
    }

    /// Digits only and long enough to be a provider-assigned numeric id.
    pub fn is_numeric_id(&self, id: &str) -> bool {
        is_numeric(id) && id.len() >= self.provider.min_numeric_len
    }
}

/// `^[A-Za-z0-9.]+$`
fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(ProviderConfig::default())
    }

    fn example_normalizer() -> Normalizer {
        Normalizer::new(ProviderConfig {
            domain: "provider.example".to_string(),
            canonical_host: "provider.example".to_string(),
            ..ProviderConfig::default()
        })
    }

    #[test]
    fn numeric_query_param_wins_over_path_slug() {
        let n = normalizer();
        for input in [
            "https://www.facebook.com/profile.php?id=100012345678",
            "https://m.facebook.com/some.slug?id=100012345678",
            "https://facebook.com/groups/whatever?ref=x&id=100012345678",
        ] {
            let target = n.normalize(input, None).unwrap();
            assert_eq!(target.id, "100012345678", "input: {}", input);
            assert_eq!(
                target.canonical_url,
                "https://mbasic.facebook.com/profile.php?id=100012345678"
            );
        }
    }

    #[test]
    fn non_numeric_id_param_is_ignored() {
        let target = normalizer()
            .normalize("https://www.facebook.com/jane.doe?id=abc", None)
            .unwrap();
        assert_eq!(target.id, "jane.doe");
        assert_eq!(target.canonical_url, "https://mbasic.facebook.com/jane.doe");
    }

    #[test]
    fn group_route_sets_group_kind() {
        let target = example_normalizer()
            .normalize("https://provider.example/groups/abc123", None)
            .unwrap();
        assert_eq!(target.kind, TargetKind::Group);
        assert_eq!(target.id, "abc123");
        assert_eq!(target.canonical_url, "https://provider.example/groups/abc123");
    }

    #[test]
    fn short_numeric_route_is_a_profile() {
        let target = normalizer()
            .normalize("https://www.facebook.com/p/61550000000000/", None)
            .unwrap();
        assert_eq!(target.id, "61550000000000");
        assert_eq!(target.kind, TargetKind::Profile);
    }

    #[test]
    fn foreign_host_is_invalid_source() {
        let err = normalizer()
            .normalize("https://twitter.com/jane", None)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidSource { .. }));
    }

    #[test]
    fn profile_php_without_id_is_invalid_source() {
        let err = normalizer()
            .normalize("https://www.facebook.com/profile.php", None)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidSource { .. }));
    }

    #[test]
    fn bare_tokens_outside_charset_are_invalid_identifiers() {
        let n = normalizer();
        for token in ["", "jane doe", "jane_doe", "abc/def", "ünicode", "a-b", "id?x=1"] {
            assert!(
                matches!(
                    n.normalize(token, None),
                    Err(NormalizeError::InvalidIdentifier(_))
                ),
                "token {:?} should be rejected",
                token
            );
        }
    }

    #[test]
    fn bare_numeric_token_uses_numeric_form() {
        let target = normalizer().normalize("  123456789 ", None).unwrap();
        assert_eq!(target.id, "123456789");
        assert_eq!(
            target.canonical_url,
            "https://mbasic.facebook.com/profile.php?id=123456789"
        );
    }

    #[test]
    fn short_numeric_token_uses_slug_form() {
        let target = normalizer().normalize("1234", None).unwrap();
        assert_eq!(target.canonical_url, "https://mbasic.facebook.com/1234");
    }

    #[test]
    fn group_hint_applies_to_bare_token() {
        let target = normalizer()
            .normalize("mygroup.vn", Some(TargetKind::Group))
            .unwrap();
        assert_eq!(target.kind, TargetKind::Group);
        assert_eq!(target.canonical_url, "https://mbasic.facebook.com/groups/mygroup.vn");
    }
}
