use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub site_url: String,
    pub bind_address: String,
    pub hms_access_key: String,
    pub hms_app_secret: String,
    pub hms_api_base_url: String,
    pub hms_template_id: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            site_url: env::var("SITE_URL")
                .unwrap_or_else(|_| {
                    warn!("SITE_URL not set, using default");
                    "http://localhost:3000".to_string()
                }),
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            hms_access_key: env::var("HMS_ACCESS_KEY")
                .unwrap_or_else(|_| {
                    warn!("HMS_ACCESS_KEY not set, using empty value");
                    String::new()
                }),
            hms_app_secret: env::var("HMS_APP_SECRET")
                .unwrap_or_else(|_| {
                    warn!("HMS_APP_SECRET not set, using empty value");
                    String::new()
                }),
            hms_api_base_url: env::var("HMS_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.100ms.live/v2".to_string()),
            hms_template_id: env::var("HMS_TEMPLATE_ID").ok().filter(|t| !t.is_empty()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_video_conferencing_configured(&self) -> bool {
        !self.hms_access_key.is_empty()
            && !self.hms_app_secret.is_empty()
            && !self.hms_api_base_url.is_empty()
    }
}
