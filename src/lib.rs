//! model_loader - 多格式3D模型加载库
//!
//! 把 OBJ、glTF 和 FBX 文件读入统一的 CPU 侧网格表示：
//! 去重后的顶点数组、三角形索引、纹理名称列表，以及计算好的切线。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（日志、配置、错误处理）
//! - `geometry`: 几何体模块（顶点、网格、切线计算、各格式导入器）
//!
//! # 使用示例
//!
//! ```no_run
//! use model_loader::geometry::ModelLoader;
//! use std::path::Path;
//!
//! let loader = ModelLoader::with_default_importers();
//! let mesh = loader.load_model(Path::new("assets/models/car.obj"))?;
//!
//! println!("{} 个顶点, {} 个三角形", mesh.vertex_count(), mesh.triangle_count());
//! # Ok::<(), model_loader::core::ModelLoaderError>(())
//! ```

pub mod core;
pub mod geometry;
