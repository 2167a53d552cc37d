//! 核心功能模块
//!
//! 本模块提供加载器的基础设施：日志、配置管理和错误处理。
//! 这些模块独立于具体的文件格式。
//!
//! # 模块组织
//!
//! - `log`：日志系统，基于 `tracing` 的结构化日志
//! - `config`：配置管理，支持从 TOML 文件加载日志与导入设置
//! - `error`：错误处理，定义统一的错误类型

pub mod log;
pub mod config;
pub mod error;

// 重新导出常用类型，方便使用
pub use error::{Result, ModelLoaderError, MeshLoadError, ConfigError};
pub use config::{Config, ImportConfig, LoggingConfig, LogLevel, DegenerateUvPolicy};
