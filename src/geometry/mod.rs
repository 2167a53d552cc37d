/// 几何体加载和处理模块
///
/// 提供3D模型加载功能，支持多种文件格式（OBJ、glTF、FBX）。
/// 包含顶点定义、网格数据结构、切线空间后处理以及各格式的导入器。
///
/// # 模块结构
///
/// - `vertex`: 顶点数据结构与顶点身份（相等性、哈希）
/// - `mesh`: 网格、场景以及导入期间使用的去重组装器
/// - `tangent`: 切线空间后处理
/// - `loaders`: 导入器 trait、按扩展名分发的注册表和各格式实现
///
/// # 架构设计
///
/// ```text
/// 文件 (OBJ/glTF/FBX)
///     ↓
/// ModelLoader（按扩展名选择导入器）
///     ↓
/// ModelImporter → MeshAssembler（顶点去重）
///     ↓
/// TangentSpaceProcessor
///     ↓
/// Mesh / Scene (CPU侧数据)
/// ```
///
/// # 使用示例
///
/// ```rust,no_run
/// use model_loader::geometry::loaders::ModelLoader;
/// use std::path::Path;
///
/// let loader = ModelLoader::with_default_importers();
/// let scene = loader.load_scene(Path::new("model.gltf"))?;
///
/// for mesh in &scene {
///     println!("顶点数: {}", mesh.vertex_count());
///     println!("三角形数: {}", mesh.triangle_count());
/// }
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```

pub mod vertex;
pub mod mesh;
pub mod tangent;
pub mod loaders;

// 重新导出常用类型
pub use vertex::Vertex;
pub use mesh::{Mesh, MeshAssembler, Scene, TextureKind};
pub use tangent::TangentSpaceProcessor;
pub use loaders::{ModelImporter, ModelLoader};
