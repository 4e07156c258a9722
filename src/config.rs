use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub sumsub_app_token: String,
    pub sumsub_secret_key: String,
    pub sumsub_base_url: String,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            sumsub_app_token: std::env::var("SUMSUB_APP_TOKEN")
                .map_err(|_| anyhow::anyhow!("SUMSUB_APP_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("SUMSUB_APP_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            sumsub_secret_key: std::env::var("SUMSUB_SECRET_KEY")
                .map_err(|_| anyhow::anyhow!("SUMSUB_SECRET_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("SUMSUB_SECRET_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            sumsub_base_url: std::env::var("SUMSUB_BASE_URL")
                .unwrap_or_else(|_| "https://api.sumsub.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be a valid number"))?,
        };

        if !config.sumsub_base_url.starts_with("http://")
            && !config.sumsub_base_url.starts_with("https://")
        {
            anyhow::bail!("SUMSUB_BASE_URL must start with http:// or https://");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Sumsub Base URL: {}", config.sumsub_base_url);
        tracing::debug!("Provider request timeout: {}s", config.request_timeout_secs);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
