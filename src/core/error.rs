//! 错误处理模块
//!
//! 定义了加载器中使用的统一错误类型，使用 `thiserror` 提供友好的错误消息。
//!
//! # 设计原则
//!
//! - 使用 `thiserror` 自动实现 `Error` trait
//! - 为每种错误类型提供清晰的上下文信息（总是带上出错的文件路径）
//! - 支持错误链（error source）
//! - 易于模式匹配和错误处理

use std::path::{Path, PathBuf};

/// 加载器统一的 Result 类型
///
/// 所有可能返回错误的函数都应该使用这个类型。
pub type Result<T> = std::result::Result<T, ModelLoaderError>;

/// 加载器的顶层错误类型
#[derive(Debug, thiserror::Error)]
pub enum ModelLoaderError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 网格加载错误
    #[error("Mesh loading error: {0}")]
    MeshLoading(#[from] MeshLoadError),

    /// 日志系统初始化失败（例如全局订阅者已被设置）
    #[error("Logger initialization failed: {0}")]
    Logging(String),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 配置相关的错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 配置文件未找到
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    /// 配置文件解析失败
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// 配置值无效
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 网格加载相关的错误
///
/// 三种错误对应导入流程中的三个阶段：
/// 分派（扩展名无对应导入器）、打开（原生解析器无法读取文件）、
/// 解析（文件可读但结构数据无效或缺少必需的数据流）。
#[derive(Debug, thiserror::Error)]
pub enum MeshLoadError {
    /// 扩展名没有注册的导入器
    #[error("Unsupported mesh format '.{extension}': {}", .path.display())]
    UnsupportedFormat { extension: String, path: PathBuf },

    /// 文件不存在或无法读取
    #[error("Mesh file not found or unreadable: {} ({reason})", .path.display())]
    FileNotFoundOrUnreadable { path: PathBuf, reason: String },

    /// 文件可以打开，但结构数据无效
    #[error("Malformed asset {}: {reason}", .path.display())]
    MalformedAsset { path: PathBuf, reason: String },
}

impl MeshLoadError {
    /// 构造 `UnsupportedFormat`
    pub fn unsupported(path: &Path, extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
            path: path.to_path_buf(),
        }
    }

    /// 构造 `FileNotFoundOrUnreadable`
    pub fn unreadable(path: &Path, reason: impl Into<String>) -> Self {
        Self::FileNotFoundOrUnreadable {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// 构造 `MalformedAsset`
    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedAsset {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl ModelLoaderError {
    /// 如果是网格加载错误，返回其内部错误，便于调用方按种类匹配
    pub fn as_mesh_error(&self) -> Option<&MeshLoadError> {
        match self {
            ModelLoaderError::MeshLoading(e) => Some(e),
            _ => None,
        }
    }
}
