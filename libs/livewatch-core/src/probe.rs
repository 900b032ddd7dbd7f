use crate::ProbeResult;
use crate::classifier::{Classifier, FetchedPage};
use crate::config::EngineConfig;
use crate::error::ProbeError;
use crate::variants::Variant;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;
use tracing::debug;

/// Performs one bounded fetch for a variant and classifies it.
///
/// Implementations never fail: transport problems come back as an
/// inconclusive result so the resolver can move on to the next variant.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, variant: &Variant) -> ProbeResult;
}

pub struct HttpProbe {
    client: Client,
    classifier: Classifier,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(config: &EngineConfig) -> Self {
        let timeout = config.provider.probe_timeout();
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .connect_timeout(Duration::from_secs(5).min(timeout))
            .build()
            .unwrap_or_default();

        Self {
            client,
            classifier: Classifier::new(config),
            timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch(&self, variant: &Variant) -> Result<FetchedPage, ProbeError> {
        let response = self
            .client
            .get(&variant.url)
            .header(USER_AGENT, &variant.profile.user_agent)
            .header(ACCEPT_LANGUAGE, &variant.profile.accept_language)
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await?;

        Ok(FetchedPage {
            status,
            final_url,
            body,
        })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, variant: &Variant) -> ProbeResult {
        match self.fetch(variant).await {
            Ok(page) => {
                let result = self.classifier.classify(&page);
                debug!(
                    "probe {} [{}] -> HTTP {} {:?} at {}",
                    variant.url, variant.profile.name, page.status, result.status, result.final_url
                );
                result
            }
            Err(e) => {
                debug!("probe {} [{}] failed: {}", variant.url, variant.profile.name, e);
                ProbeResult::inconclusive(variant.url.clone())
            }
        }
    }
}
