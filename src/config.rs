#![allow(dead_code)]
use once_cell::sync::OnceCell;

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub summary_model: String,
    pub summary_temperature: f64,
    pub summary_top_p: f64,
    pub summary_max_tokens: i64,
    pub mongodb_uri: String,
    pub mongodb_host: String,
    pub mongodb_port: u16,
    pub mongodb_database: String,
    pub mongodb_username: String,
    pub mongodb_password: String,
    pub port: u16,
    pub host: String,
    pub log_level: String,
    pub log_max_files: String,
    pub cors_origins: Vec<String>,
    pub recent_limit: i64,
}

static CONFIG: OnceCell<Config> = OnceCell::new();

impl Config {
    pub fn init_global() -> Result<&'static Config, String> {
        let cfg = Config::from_env()?;
        CONFIG
            .set(cfg)
            .map_err(|_| "Config already initialized".to_string())?;
        Ok(CONFIG.get().expect("config"))
    }

    pub fn get() -> &'static Config {
        CONFIG.get().expect("Config not initialized")
    }

    fn from_env() -> Result<Config, String> {
        let read_num = |key: &str, def: f64| -> f64 {
            match std::env::var(key) {
                Ok(v) => v.parse::<f64>().unwrap_or(def),
                Err(_) => def,
            }
        };
        let read_int = |key: &str, def: i64| -> i64 {
            match std::env::var(key) {
                Ok(v) => v.parse::<i64>().unwrap_or(def),
                Err(_) => def,
            }
        };

        // Absence of either credential is reported per-request by the
        // orchestrator, not treated as a startup failure.
        let openai_api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let openai_base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string());
        let summary_model = std::env::var("SUMMARY_MODEL")
            .unwrap_or_else(|_| "mistralai/mistral-7b-instruct:free".to_string());
        let summary_temperature = read_num("SUMMARY_TEMPERATURE", 0.7);
        let summary_top_p = read_num("SUMMARY_TOP_P", 0.8);
        let summary_max_tokens = read_int("SUMMARY_MAX_TOKENS", 350);

        let mongodb_uri = std::env::var("MONGODB_URI").unwrap_or_default();
        let mongodb_host = std::env::var("MONGODB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let mongodb_port = std::env::var("MONGODB_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(27017);
        let mongodb_database =
            std::env::var("MONGODB_DB").unwrap_or_else(|_| "summary_app".to_string());
        let mongodb_username = std::env::var("MONGODB_USERNAME").unwrap_or_default();
        let mongodb_password = std::env::var("MONGODB_PASSWORD").unwrap_or_default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(3001);
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_max_files = std::env::var("LOG_MAX_FILES").unwrap_or_else(|_| "7d".to_string());

        let cors_origins = match std::env::var("CORS_ORIGINS") {
            Ok(v) => v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => vec!["*".to_string()],
        };

        let recent_limit = read_int("SUMMARY_RECENT_LIMIT", 20).clamp(1, 100);

        Ok(Config {
            openai_api_key,
            openai_base_url,
            summary_model,
            summary_temperature,
            summary_top_p,
            summary_max_tokens,
            mongodb_uri,
            mongodb_host,
            mongodb_port,
            mongodb_database,
            mongodb_username,
            mongodb_password,
            port,
            host,
            log_level,
            log_max_files,
            cors_origins,
            recent_limit,
        })
    }

    pub fn has_generation_credentials(&self) -> bool {
        !self.openai_api_key.trim().is_empty() && !self.openai_base_url.trim().is_empty()
    }

    pub fn print(&self) {
        println!("Current configuration:");
        println!("  - PORT: {}", self.port);
        println!("  - HOST: {}", self.host);
        println!("  - OPENAI_BASE_URL: {}", self.openai_base_url);
        println!(
            "  - OPENAI_API_KEY: {}",
            if self.openai_api_key.is_empty() { "not set" } else { "set" }
        );
        println!("  - SUMMARY_MODEL: {}", self.summary_model);
        println!(
            "  - MONGODB_URI: {}",
            if self.mongodb_uri.is_empty() { "not set (host/port fallback)" } else { "set" }
        );
        println!("  - MONGODB_DB: {}", self.mongodb_database);
        println!("  - LOG_LEVEL: {}", self.log_level);
        println!("  - SUMMARY_RECENT_LIMIT: {}", self.recent_limit);
    }
}
