pub mod config;
pub mod domain {
    pub mod decision;
}
pub mod engine {
    pub mod decision;
    pub mod device;
    pub mod sanitize;
}
pub mod hits {
    pub mod feed;
    pub mod log;
    pub mod store_pg;
}
pub mod http {
    pub mod body;
    pub mod client_ip;
    pub mod handlers {
        pub mod clicks;
        pub mod decision;
        pub mod ops;
        pub mod settings;
        pub mod stats;
    }
    pub mod middleware {
        pub mod api_key;
        pub mod security_headers;
    }
    pub mod respond;
    pub mod router;
}
pub mod service {
    pub mod decision_service;
}
pub mod settings {
    pub mod state;
    pub mod store;
    pub mod store_pg;
    pub mod transitions;
}
pub mod sources;
pub mod validation {
    pub mod country_code;
    pub mod ip;
    pub mod redirect_url;
}
pub mod vpn {
    pub mod cache;
    pub mod oracle;
}

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub decision_service: service::decision_service::DecisionService,
    pub settings_store: Arc<dyn settings::store::SettingsStore>,
    pub hit_log: Arc<dyn hits::log::HitLog>,
    pub clock: Arc<dyn sources::Clock>,
    pub redis_client: Option<redis::Client>,
    pub api_key: String,
    pub cors: http::middleware::security_headers::CorsPolicy,
    pub max_payload_bytes: usize,
}
