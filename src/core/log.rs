//! 日志系统模块
//!
//! 导入器内部直接使用 `tracing::{info, warn, debug}` 宏，这里负责根据
//! `LoggingConfig` 安装全局订阅者：控制台输出、可选的按天滚动日志文件，
//! 以及可以单独调高或调低的导入器日志级别。
//!
//! # 使用示例
//!
//! ```no_run
//! use model_loader::core::{log, LoggingConfig, LogLevel};
//!
//! let config = LoggingConfig {
//!     importer_level: Some(LogLevel::Debug),
//!     ..LoggingConfig::default()
//! };
//! log::init_logger(&config)?;
//!
//! tracing::info!(vertices = 24, "Mesh loaded");
//! # Ok::<(), model_loader::core::ModelLoaderError>(())
//! ```

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::config::LoggingConfig;
use super::error::{ConfigError, ModelLoaderError, Result};

/// 导入器所在模块的日志 target
pub const IMPORTER_TARGET: &str = "model_loader::geometry::loaders";

/// 根据配置生成 `EnvFilter` 指令
///
/// 全局级别在前，设置了 `importer_level` 时追加导入器模块的指令。
pub fn filter_directives(config: &LoggingConfig) -> String {
    let mut directives = config.level.as_filter().to_string();
    if let Some(level) = config.importer_level {
        directives.push_str(&format!(",{}={}", IMPORTER_TARGET, level.as_filter()));
    }
    directives
}

/// 构建过滤器，`RUST_LOG` 环境变量优先
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(filter_directives(config)).map_err(|e| {
        ConfigError::InvalidValue {
            field: "logging".to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// 按天滚动的日志文件
fn file_appender(log_file: &str) -> RollingFileAppender {
    let path = Path::new(log_file);
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("model_loader.log");

    RollingFileAppender::new(Rotation::DAILY, directory, filename)
}

/// 初始化日志系统
///
/// 全局订阅者只能安装一次；重复调用返回 `ModelLoaderError::Logging`，不会 panic。
pub fn init_logger(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let console_layer = fmt::layer().with_target(true).with_ansi(true);

    let file_layer = config.file_output.then(|| {
        fmt::layer()
            .with_target(true)
            .with_ansi(false) // 文件不需要 ANSI 颜色
            .with_writer(file_appender(&config.log_file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ModelLoaderError::Logging(e.to_string()))
}
