/// 模型加载器模块
///
/// 提供统一的导入接口、按扩展名分发的加载器注册表，以及各种格式的具体实现。
///
/// # 支持的格式
///
/// - **OBJ**: Wavefront OBJ 格式（使用 tobj crate）
/// - **glTF**: glTF 2.0 / GLB 格式（使用 gltf crate）
/// - **FBX**: Autodesk FBX 格式（使用 russimp/Assimp，需要启用 `fbx` feature）
///
/// # 使用示例
///
/// ```rust,no_run
/// use model_loader::geometry::loaders::ModelLoader;
/// use std::path::Path;
///
/// let loader = ModelLoader::with_default_importers();
/// let mesh = loader.load_model(Path::new("model.obj"))?;
/// println!("加载了 {} 个顶点", mesh.vertex_count());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
use crate::core::config::ImportConfig;
use crate::core::error::{MeshLoadError, Result};
use crate::geometry::mesh::{Mesh, Scene};
use crate::geometry::tangent::TangentSpaceProcessor;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

pub mod obj_loader;
pub mod gltf_loader;
pub mod fbx_loader;

// 重新导出导入器
pub use obj_loader::ObjImporter;
pub use gltf_loader::GltfImporter;
pub use fbx_loader::{FbxCorner, FbxMaterial, FbxMesh, FbxNode, FbxPolygon, FbxSceneGraph};
#[cfg(feature = "fbx")]
pub use fbx_loader::FbxImporter;

/// 模型导入器 trait
///
/// 每种文件格式实现一次，由 `ModelLoader` 按扩展名选择。
///
/// # 实现要求
///
/// - 导入器只生成 CPU 侧的 `Mesh` / `Scene`，切线由注册表统一计算
/// - 路径无法打开时返回 `FileNotFoundOrUnreadable`
/// - 原生解析器报告结构错误时返回 `MalformedAsset`
/// - 失败时不返回部分结果
pub trait ModelImporter {
    /// 支持的文件扩展名列表（小写，不含点号）
    fn extensions(&self) -> &'static [&'static str];

    /// 把整个文件的几何数据合并成一个网格
    fn load_model(&self, path: &Path) -> Result<Mesh>;

    /// 每个带几何数据的节点或图元生成一个网格，按源文件遍历顺序排列
    fn load_scene(&self, path: &Path) -> Result<Scene>;
}

/// 按扩展名分发的模型加载器
///
/// 注册表本身不硬编码任何扩展名，导入器通过 `register` 自行登记。
/// 每次加载完成后对结果中的所有网格执行一次切线空间后处理。
pub struct ModelLoader {
    importers: Vec<Box<dyn ModelImporter>>,
    by_extension: HashMap<String, usize>,
    tangents: TangentSpaceProcessor,
}

impl ModelLoader {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            importers: Vec::new(),
            by_extension: HashMap::new(),
            tangents: TangentSpaceProcessor::default(),
        }
    }

    /// 使用默认配置注册全部内置导入器
    pub fn with_default_importers() -> Self {
        Self::with_config(ImportConfig::default())
    }

    /// 使用指定配置注册全部内置导入器
    pub fn with_config(config: ImportConfig) -> Self {
        let mut loader = Self::new();
        loader.tangents = TangentSpaceProcessor::new(config.degenerate_uv);

        loader.register(Box::new(ObjImporter::new(config)));
        loader.register(Box::new(GltfImporter::new(config)));
        #[cfg(feature = "fbx")]
        loader.register(Box::new(FbxImporter::new(config)));

        loader
    }

    /// 注册一个导入器
    ///
    /// 扩展名已被占用时，后注册的导入器覆盖先前的映射。
    pub fn register(&mut self, importer: Box<dyn ModelImporter>) {
        let slot = self.importers.len();
        for ext in importer.extensions() {
            let ext = ext.to_ascii_lowercase();
            debug!(extension = %ext, "注册模型导入器");
            self.by_extension.insert(ext, slot);
        }
        self.importers.push(importer);
    }

    /// 是否有导入器处理该扩展名（大小写不敏感，不含点号）
    pub fn supports(&self, extension: &str) -> bool {
        self.by_extension.contains_key(&extension.to_ascii_lowercase())
    }

    /// 已注册的全部扩展名，按字母排序
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    /// 把文件加载为单个网格并计算切线
    pub fn load_model(&self, path: &Path) -> Result<Mesh> {
        let importer = self.importer_for(path)?;
        let mut mesh = importer.load_model(path)?;
        self.post_process(path, &mut mesh)?;

        info!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "模型加载完成"
        );

        Ok(mesh)
    }

    /// 把文件加载为场景并对每个网格计算切线
    pub fn load_scene(&self, path: &Path) -> Result<Scene> {
        let importer = self.importer_for(path)?;
        let mut scene = importer.load_scene(path)?;
        for mesh in scene.iter_mut() {
            self.post_process(path, mesh)?;
        }

        info!(path = %path.display(), meshes = scene.len(), "场景加载完成");

        Ok(scene)
    }

    /// 校验索引后计算切线
    ///
    /// 第三方导入器返回的网格未必经过 `MeshAssembler`，越界索引在这里报告为 `MalformedAsset`。
    fn post_process(&self, path: &Path, mesh: &mut Mesh) -> Result<()> {
        mesh.validate()
            .map_err(|reason| MeshLoadError::malformed(path, reason))?;
        self.tangents.process(mesh);
        Ok(())
    }

    fn importer_for(&self, path: &Path) -> Result<&dyn ModelImporter> {
        let extension = extension_of(path)
            .ok_or_else(|| MeshLoadError::unsupported(path, ""))?;

        match self.by_extension.get(&extension) {
            Some(&slot) => Ok(self.importers[slot].as_ref()),
            None => Err(MeshLoadError::unsupported(path, extension).into()),
        }
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::with_default_importers()
    }
}

/// 路径的扩展名：整个路径字符串中最后一个 `.` 之后的部分，转为小写
///
/// 路径中没有 `.` 时返回 `None`。
pub fn extension_of(path: &Path) -> Option<String> {
    let text = path.to_string_lossy();
    text.rfind('.').map(|dot| text[dot + 1..].to_lowercase())
}
