use crate::validation::ip::public_ip;
use anyhow::Result;
use reqwest::StatusCode;
use std::time::Duration;

pub const DEFAULT_LOOKUP_BASE_URL: &str = "https://blackbox.ipinfo.app/lookup";
const USER_AGENT: &str = "SRP/1.0 (+vpn-check)";

/// Classifies an address as VPN/proxy exit. Implementations must fail closed: anything
/// short of a definite "no" answers `true`.
#[async_trait::async_trait]
pub trait VpnOracle: Send + Sync {
    async fn is_vpn(&self, ip: &str) -> bool;
}

pub struct HttpVpnOracle {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl HttpVpnOracle {
    pub fn new(base_url: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn lookup_url(&self, ip: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(ip))
    }
}

#[async_trait::async_trait]
impl VpnOracle for HttpVpnOracle {
    async fn is_vpn(&self, ip: &str) -> bool {
        let Some(ip) = public_ip(ip) else {
            return true;
        };

        let resp = self
            .client
            .get(self.lookup_url(&ip))
            .header(reqwest::header::ACCEPT, "text/plain")
            .send()
            .await;

        match resp {
            Ok(r) if r.status() == StatusCode::OK => match r.text().await {
                Ok(body) => verdict_from_body(&body),
                Err(e) => {
                    tracing::warn!("vpn lookup body read failed for {}: {}", ip, e);
                    true
                }
            },
            Ok(r) => {
                tracing::warn!("vpn lookup for {} answered HTTP {}", ip, r.status().as_u16());
                true
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!("vpn lookup for {} timed out", ip);
                true
            }
            Err(e) => {
                tracing::warn!("vpn lookup for {} failed: {}", ip, e);
                true
            }
        }
    }
}

pub fn verdict_from_body(body: &str) -> bool {
    body.trim() == "Y"
}
