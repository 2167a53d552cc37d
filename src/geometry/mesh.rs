/// 网格数据结构模块
///
/// 定义CPU侧的网格数据容器 `Mesh`、场景 `Scene`，
/// 以及导入过程中负责顶点去重的 `MeshAssembler`。

use std::collections::HashMap;
use std::path::Path;

use super::vertex::Vertex;
use crate::core::error::{MeshLoadError, Result};

/// 纹理种类
///
/// 每种纹理在 `Mesh` 中对应一个独立的有序名称列表。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// 漫反射 / 基础颜色纹理
    Diffuse,
    /// PBR 纹理（金属度-粗糙度）
    Pbr,
    /// 法线贴图
    Normal,
}

/// CPU侧网格数据
///
/// 存储从文件加载的网格数据：去重后的顶点、三角形索引以及纹理名称。
/// 这是一个简单的数据持有者，不包含GPU资源。
///
/// `Mesh` 不实现 `Clone`：导入器创建后按值移交给调用方。
///
/// # 不变量
///
/// 由导入器产出的网格满足：
/// - 索引数量是 3 的倍数
/// - 所有索引都小于顶点数量
/// - 任意两个顶点互不相等
#[derive(Debug, Default)]
pub struct Mesh {
    /// 网格名称（可选）
    pub name: Option<String>,

    /// 顶点数组，按首次出现的顺序排列
    pub vertices: Vec<Vertex>,

    /// 索引数组，每3个索引定义一个三角形
    pub indices: Vec<u32>,

    /// 漫反射纹理名称
    pub diffuse_texture_names: Vec<String>,

    /// PBR 纹理名称
    pub pbr_texture_names: Vec<String>,

    /// 法线贴图名称
    pub normal_texture_names: Vec<String>,

    /// 材质是否使用透明混合
    pub is_transparent: bool,
}

impl Mesh {
    /// 创建一个空的网格数据
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建一个指定名称的空网格数据
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// 获取顶点数量
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// 获取索引数量
    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// 获取三角形数量
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// 指定种类的纹理名称列表
    pub fn texture_names(&self, kind: TextureKind) -> &[String] {
        match kind {
            TextureKind::Diffuse => &self.diffuse_texture_names,
            TextureKind::Pbr => &self.pbr_texture_names,
            TextureKind::Normal => &self.normal_texture_names,
        }
    }

    fn texture_names_mut(&mut self, kind: TextureKind) -> &mut Vec<String> {
        match kind {
            TextureKind::Diffuse => &mut self.diffuse_texture_names,
            TextureKind::Pbr => &mut self.pbr_texture_names,
            TextureKind::Normal => &mut self.normal_texture_names,
        }
    }

    /// 顶点数组的字节视图，可直接上传到顶点缓冲区
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// 索引数组的字节视图
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// 验证网格数据的有效性
    ///
    /// 检查：
    /// - 索引数量是3的倍数（每个三角形3个顶点）
    /// - 所有索引都在有效范围内
    ///
    /// # 返回
    ///
    /// - `Ok(())`: 数据有效
    /// - `Err(String)`: 数据无效，返回错误描述
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "index count must be a multiple of 3, got {}",
                self.indices.len()
            ));
        }

        let vertex_count = self.vertices.len();
        if let Some(i) = self
            .indices
            .iter()
            .position(|&index| index as usize >= vertex_count)
        {
            return Err(format!(
                "index {} at position {} is out of range (vertex count {})",
                self.indices[i], i, vertex_count
            ));
        }

        Ok(())
    }
}

/// 一次导入调用中的网格组装器
///
/// 持有正在填充的 `Mesh` 以及与顶点数组一一对应的哈希索引，
/// 用于 O(1) 查找已存在的顶点。组装器在导入调用开始时创建，
/// `finish` 后哈希索引随之丢弃，不会跨调用共享。
///
/// # 示例
///
/// ```rust
/// use model_loader::geometry::{MeshAssembler, Vertex};
///
/// let mut assembler = MeshAssembler::new();
/// let a = assembler.push_vertex(Vertex::at([0.0, 0.0, 0.0]));
/// let b = assembler.push_vertex(Vertex::at([0.0, 0.0, 0.0]));
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Default)]
pub struct MeshAssembler {
    mesh: Mesh,
    lookup: HashMap<Vertex, u32>,
}

impl MeshAssembler {
    /// 创建空组装器
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带名称的组装器
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            mesh: Mesh::with_name(name),
            lookup: HashMap::new(),
        }
    }

    /// 标记材质透明
    pub fn set_transparent(&mut self, transparent: bool) {
        self.mesh.is_transparent |= transparent;
    }

    /// 插入顶点，若已存在相等顶点则复用
    ///
    /// 返回该顶点在顶点数组中的索引。新顶点总是追加在末尾，
    /// 已有顶点既不会被移除也不会被重排。
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        let vertices = &mut self.mesh.vertices;
        *self.lookup.entry(vertex).or_insert_with(|| {
            let index = vertices.len() as u32;
            vertices.push(vertex);
            index
        })
    }

    /// 追加一个索引
    #[inline]
    pub fn push_index(&mut self, index: u32) {
        self.mesh.indices.push(index);
    }

    /// 插入一个三角形角点：去重插入顶点并追加其索引
    #[inline]
    pub fn push_corner(&mut self, vertex: Vertex) -> u32 {
        let index = self.push_vertex(vertex);
        self.push_index(index);
        index
    }

    /// 追加纹理名称
    pub fn add_texture(&mut self, kind: TextureKind, name: impl Into<String>) {
        self.mesh.texture_names_mut(kind).push(name.into());
    }

    /// 当前顶点数量
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertices.len()
    }

    /// 当前索引数量
    #[inline]
    pub fn index_count(&self) -> usize {
        self.mesh.indices.len()
    }

    /// 完成组装
    ///
    /// 校验索引不变量后返回网格；校验失败时返回 `MalformedAsset`，
    /// 不会交出部分填充的网格。
    pub fn finish(self, path: &Path) -> Result<Mesh> {
        self.mesh
            .validate()
            .map_err(|reason| MeshLoadError::malformed(path, reason))?;
        Ok(self.mesh)
    }
}

/// 场景：按源文件遍历顺序排列的网格集合
#[derive(Debug, Default)]
pub struct Scene {
    /// 网格列表
    pub meshes: Vec<Mesh>,
}

impl Scene {
    /// 创建空场景
    pub fn new() -> Self {
        Self::default()
    }

    /// 网格数量
    #[inline]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// 是否没有任何网格
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// 追加网格
    pub fn push(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    /// 遍历网格
    pub fn iter(&self) -> std::slice::Iter<'_, Mesh> {
        self.meshes.iter()
    }

    /// 可变遍历网格
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Mesh> {
        self.meshes.iter_mut()
    }
}

impl From<Vec<Mesh>> for Scene {
    fn from(meshes: Vec<Mesh>) -> Self {
        Self { meshes }
    }
}

impl IntoIterator for Scene {
    type Item = Mesh;
    type IntoIter = std::vec::IntoIter<Mesh>;

    fn into_iter(self) -> Self::IntoIter {
        self.meshes.into_iter()
    }
}

impl<'a> IntoIterator for &'a Scene {
    type Item = &'a Mesh;
    type IntoIter = std::slice::Iter<'a, Mesh>;

    fn into_iter(self) -> Self::IntoIter {
        self.meshes.iter()
    }
}
