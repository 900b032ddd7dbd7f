use crate::config::{ClientProfile, ProviderConfig};
use std::collections::HashSet;
use url::Url;

/// One concrete (URL, client identity) pair tried during a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variant {
    pub url: String,
    pub profile: ClientProfile,
}

#[derive(Debug, Clone)]
pub struct VariantGenerator {
    provider: ProviderConfig,
}

impl VariantGenerator {
    pub fn new(provider: ProviderConfig) -> Self {
        Self { provider }
    }

    /// Ordered candidates, cheapest mirror first, crawler identity last.
    pub fn generate(&self, id: &str, canonical_url: &str) -> Vec<Variant> {
        let provider = &self.provider;
        let mut urls = vec![canonical_url.to_string()];

        if let Ok(parsed) = Url::parse(canonical_url) {
            for host in &provider.mirror_hosts {
                if let Some(mirrored) = swap_host(&parsed, host) {
                    urls.push(mirrored);
                }
            }
        }

        if is_numeric(id) && id.len() >= provider.min_numeric_len {
            for host in &provider.mirror_hosts {
                urls.push(provider.url_for(host, &provider.numeric_path, id));
            }
            for host in &provider.short_route_hosts {
                urls.push(provider.url_for(host, &provider.short_numeric_path, id));
            }
        }

        let profiles = [&provider.primary_profile, &provider.crawler_profile];
        let mut seen = HashSet::new();
        let mut variants = Vec::new();
        for profile in profiles {
            for url in &urls {
                if seen.insert((url.clone(), profile.name.clone())) {
                    variants.push(Variant {
                        url: url.clone(),
                        profile: profile.clone(),
                    });
                }
            }
        }

        variants.truncate(provider.max_variants);
        variants
    }
}

fn swap_host(url: &Url, host: &str) -> Option<String> {
    let mut swapped = url.clone();
    swapped.set_host(Some(host)).ok()?;
    Some(swapped.to_string())
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
