use crate::Resolution;
use crate::config::EngineConfig;
use crate::probe::{HttpProbe, Probe};
use crate::variants::VariantGenerator;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves a target to a definitive verdict, or `None` when nothing was conclusive.
#[async_trait]
pub trait LivenessCheck: Send + Sync {
    async fn resolve(&self, id: &str, canonical_url: &str) -> Option<Resolution>;
}

#[derive(Clone)]
pub struct LivenessResolver {
    variants: VariantGenerator,
    probe: Arc<dyn Probe>,
}

impl LivenessResolver {
    pub fn new(variants: VariantGenerator, probe: Arc<dyn Probe>) -> Self {
        Self { variants, probe }
    }

    /// Resolver backed by real HTTP probes.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            VariantGenerator::new(config.provider.clone()),
            Arc::new(HttpProbe::new(config)),
        )
    }
}

#[async_trait]
impl LivenessCheck for LivenessResolver {
    async fn resolve(&self, id: &str, canonical_url: &str) -> Option<Resolution> {
        let candidates = self.variants.generate(id, canonical_url);
        let total = candidates.len();

        for (attempt, variant) in candidates.iter().enumerate() {
            let result = self.probe.probe(variant).await;
            if let Some(status) = result.status.verdict() {
                debug!(
                    "{} resolved {} on attempt {}/{} via {} [{}]",
                    id,
                    status,
                    attempt + 1,
                    total,
                    variant.url,
                    variant.profile.name
                );
                return Some(Resolution {
                    status,
                    display_name: result.display_name,
                });
            }
        }

        info!("{} unresolved after {} variants", id, total);
        None
    }
}
