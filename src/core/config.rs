//! 配置管理模块
//!
//! 提供加载器配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//! log_file = "model_loader.log"
//! importer_level = "debug"  # 可选，单独设置导入器模块的日志级别
//!
//! [import]
//! prefix_texture_dir = true    # glTF 纹理名前加上模型所在目录
//! flip_v = true                # OBJ/FBX 的 V 坐标翻转（1.0 - v）
//! degenerate_uv = "propagate"  # propagate 或 skip
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};

/// 加载器配置
///
/// 可以从配置文件加载，也可以通过代码构建。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,

    /// 导入配置
    #[serde(default)]
    pub import: ImportConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// 导入器模块（`model_loader::geometry::loaders`）的日志级别
    ///
    /// 未设置时跟随 `level`。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importer_level: Option<LogLevel>,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// 导入配置
///
/// 在创建导入器时传入，影响所有格式共享的组装行为。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// 是否为 glTF 纹理 URI 加上模型文件所在目录
    #[serde(default = "default_prefix_texture_dir")]
    pub prefix_texture_dir: bool,

    /// OBJ / FBX 的 V 坐标是否翻转
    #[serde(default = "default_flip_v")]
    pub flip_v: bool,

    /// UV 退化三角形的切线处理策略
    #[serde(default)]
    pub degenerate_uv: DegenerateUvPolicy,
}

/// UV 退化三角形（UV 行列式为零）的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegenerateUvPolicy {
    /// 不做保护，非有限值会累加进切线
    #[default]
    Propagate,
    /// 跳过缩放因子非有限的三角形
    Skip,
}

// 默认值函数
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "model_loader.log".to_string() }
fn default_prefix_texture_dir() -> bool { true }
fn default_flip_v() -> bool { true }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
            importer_level: None,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            prefix_texture_dir: default_prefix_texture_dir(),
            flip_v: default_flip_v(),
            degenerate_uv: DegenerateUvPolicy::default(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    ///
    /// 成功返回 `Config` 实例，失败返回错误
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use model_loader::core::Config;
    ///
    /// let config = Config::from_file("config.toml")?;
    /// # Ok::<(), model_loader::core::ModelLoaderError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析配置
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--log-level <level>`: 设置日志级别
    /// - `--log-file <path>`: 输出日志到文件
    /// - `--importer-log-level <level>`: 单独设置导入器日志级别
    /// - `--skip-degenerate-uv`: 切线计算时跳过 UV 退化三角形
    /// - `--no-flip-v`: 不翻转 OBJ/FBX 的 V 坐标
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if let Some(idx) = args.iter().position(|a| a == "--log-level") {
            if let Some(level) = args.get(idx + 1).and_then(|s| LogLevel::parse(s)) {
                self.logging.level = level;
            }
        }

        if let Some(idx) = args.iter().position(|a| a == "--importer-log-level") {
            if let Some(level) = args.get(idx + 1).and_then(|s| LogLevel::parse(s)) {
                self.logging.importer_level = Some(level);
            }
        }

        if let Some(idx) = args.iter().position(|a| a == "--log-file") {
            if let Some(file) = args.get(idx + 1) {
                self.logging.file_output = true;
                self.logging.log_file = file.clone();
            }
        }

        if args.iter().any(|a| a == "--skip-degenerate-uv") {
            self.import.degenerate_uv = DegenerateUvPolicy::Skip;
        }

        if args.iter().any(|a| a == "--no-flip-v") {
            self.import.flip_v = false;
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.logging.file_output && self.logging.log_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.log_file".to_string(),
                reason: "Log file path must not be empty when file output is enabled".to_string(),
            }.into());
        }

        Ok(())
    }
}

impl LogLevel {
    /// 从字符串解析日志级别（大小写不敏感）
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// 对应的 `EnvFilter` 指令
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
