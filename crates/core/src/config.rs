use serde::{Deserialize, Serialize};

use crate::errors::{DispatchError, DispatchResult};

/// 应用配置
///
/// 配置加载顺序：默认值 -> TOML配置文件 -> `DISPATCH__` 前缀的环境变量。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// HTTP服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
}

/// 排序服务（外部排序Oracle）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: u64,
}

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    pub jwt_secret: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:dispatch.db".to_string(),
            max_connections: 10,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jwt_secret: String::new(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            oracle: OracleConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl AppConfig {
    /// 加载配置文件，环境变量可覆盖文件中的配置项
    pub fn load(config_path: Option<&str>) -> DispatchResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DISPATCH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| DispatchError::Configuration(format!("构建配置失败: {e}")))?;

        let app_config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| DispatchError::Configuration(format!("解析配置失败: {e}")))?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// 校验配置项
    pub fn validate(&self) -> DispatchResult<()> {
        if self.database.url.is_empty() {
            return Err(DispatchError::Configuration(
                "database.url 不能为空".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(DispatchError::Configuration(
                "database.max_connections 必须大于0".to_string(),
            ));
        }
        if self.server.bind_address.is_empty() {
            return Err(DispatchError::Configuration(
                "server.bind_address 不能为空".to_string(),
            ));
        }
        if self.oracle.base_url.is_empty() {
            return Err(DispatchError::Configuration(
                "oracle.base_url 不能为空".to_string(),
            ));
        }
        if self.auth.enabled && self.auth.jwt_secret.is_empty() {
            return Err(DispatchError::Configuration(
                "启用认证时 auth.jwt_secret 不能为空".to_string(),
            ));
        }
        Ok(())
    }
}
