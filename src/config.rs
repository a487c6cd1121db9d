use serde::{Deserialize, Serialize};
use std::path::Path;

/// 默认配置文件名 (不含扩展名, 可为 toml / yaml / json)
const CONFIG_FILE: &str = "gst-return";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub filing: FilingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 未配置时使用内存存储
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingConfig {
    /// 会话没有 GSTIN 时使用的供货方州代码
    pub home_state_code: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
            },
            filing: FilingConfig {
                home_state_code: "33".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// 默认值 -> gst-return.* 文件 (可选) -> GST__ 前缀环境变量
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// 指定配置文件 (必须存在) 时不再查找默认文件
    pub fn load_from(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let defaults = AppConfig::default();
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("database.max_connections", i64::from(defaults.database.max_connections))?
            .set_default("filing.home_state_code", defaults.filing.home_state_code)?
            .add_source(file_source)
            .add_source(config::Environment::with_prefix("GST").separator("__"))
            .build()?;

        let mut config: AppConfig = settings.try_deserialize()?;
        if config.database.url.is_none() {
            config.database.url = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty());
        }
        Ok(config)
    }
}
