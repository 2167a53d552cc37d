/// FBX 文件加载器
///
/// 分为两层：
///
/// - **场景图转换**（始终编译）：把与格式无关的 `FbxSceneGraph` 节点树组装成 `Mesh` / `Scene`
/// - **Assimp 适配器**（`fbx` feature）：使用 russimp 读取文件并构建 `FbxSceneGraph`
///
/// 遍历顺序为子节点优先：节点的所有子节点先于节点自身的网格输出。

use crate::core::config::ImportConfig;
use crate::core::error::{MeshLoadError, Result};
use crate::geometry::mesh::{Mesh, MeshAssembler, Scene, TextureKind};
use crate::geometry::vertex::Vertex;
use std::path::Path;
use tracing::debug;

/// FBX 场景图
///
/// 材质在场景级别存放，网格通过多边形的材质索引引用它们。
#[derive(Debug, Clone, Default)]
pub struct FbxSceneGraph {
    pub root: FbxNode,
    pub materials: Vec<FbxMaterial>,
}

/// 场景节点
#[derive(Debug, Clone, Default)]
pub struct FbxNode {
    pub name: String,
    /// 节点的网格属性；没有网格的节点（相机、灯光、空节点）为 `None`
    pub mesh: Option<FbxMesh>,
    pub children: Vec<FbxNode>,
}

/// 材质，只保留漫反射纹理
#[derive(Debug, Clone, Default)]
pub struct FbxMaterial {
    pub diffuse_texture: Option<String>,
}

/// 节点上的网格属性
#[derive(Debug, Clone, Default)]
pub struct FbxMesh {
    /// 控制点（位置）
    pub control_points: Vec<[f32; 3]>,
    pub polygons: Vec<FbxPolygon>,
    /// 每个多边形的材质索引；为空表示网格没有材质元素，此时不读取 UV
    pub material_indices: Vec<usize>,
}

/// 任意边数的多边形
#[derive(Debug, Clone, Default)]
pub struct FbxPolygon {
    pub corners: Vec<FbxCorner>,
}

/// 多边形顶点
#[derive(Debug, Clone, Default)]
pub struct FbxCorner {
    /// 控制点索引
    pub control_point: u32,
    pub normal: Option<[f32; 3]>,
    /// 每个 UV 集上的坐标，`None` 表示该集没有映射这个顶点
    pub uvs: Vec<Option<[f32; 2]>>,
}

impl FbxMesh {
    fn has_material_element(&self) -> bool {
        !self.material_indices.is_empty()
    }
}

impl FbxSceneGraph {
    /// 根节点直接子节点的网格合并为一个网格（不递归）
    pub fn to_model(&self, path: &Path, config: &ImportConfig) -> Result<Mesh> {
        let mut assembler = MeshAssembler::with_name(
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unnamed")
        );

        for child in &self.root.children {
            if let Some(mesh) = &child.mesh {
                append_mesh(path, config, mesh, &mut assembler)?;
            }
        }

        assembler.finish(path)
    }

    /// 从根节点的子节点开始递归遍历，每个带网格的节点生成一个 `Mesh`
    pub fn to_scene(&self, path: &Path, config: &ImportConfig) -> Result<Scene> {
        let mut scene = Scene::new();
        for child in &self.root.children {
            self.visit(path, config, child, &mut scene)?;
        }
        Ok(scene)
    }

    fn visit(&self, path: &Path, config: &ImportConfig, node: &FbxNode, scene: &mut Scene) -> Result<()> {
        for child in &node.children {
            self.visit(path, config, child, scene)?;
        }

        let Some(mesh) = &node.mesh else {
            return Ok(());
        };

        let mut assembler = MeshAssembler::with_name(node.name.as_str());
        append_mesh(path, config, mesh, &mut assembler)?;

        if let Some(texture) = self.diffuse_texture(mesh) {
            assembler.add_texture(TextureKind::Diffuse, texture);
        }

        let built = assembler.finish(path)?;
        debug!(node = %node.name, vertices = built.vertex_count(), "FBX 节点网格已组装");
        scene.push(built);

        Ok(())
    }

    /// 第一个多边形所用材质的漫反射纹理
    fn diffuse_texture(&self, mesh: &FbxMesh) -> Option<&str> {
        let material = *mesh.material_indices.first()?;
        self.materials.get(material)?.diffuse_texture.as_deref()
    }
}

/// 扇形三角化一个网格并追加到组装器
fn append_mesh(path: &Path, config: &ImportConfig, mesh: &FbxMesh, assembler: &mut MeshAssembler) -> Result<()> {
    let textured = mesh.has_material_element();

    for polygon in &mesh.polygons {
        let corners = &polygon.corners;
        for i in 1..corners.len().saturating_sub(1) {
            for corner in [&corners[0], &corners[i], &corners[i + 1]] {
                let vertex = corner_vertex(path, config, mesh, corner, textured)?;
                assembler.push_corner(vertex);
            }
        }
    }

    Ok(())
}

fn corner_vertex(
    path: &Path,
    config: &ImportConfig,
    mesh: &FbxMesh,
    corner: &FbxCorner,
    textured: bool,
) -> Result<Vertex> {
    let position = mesh
        .control_points
        .get(corner.control_point as usize)
        .ok_or_else(|| {
            MeshLoadError::malformed(
                path,
                format!(
                    "control point {} out of range ({} control points)",
                    corner.control_point,
                    mesh.control_points.len()
                ),
            )
        })?;

    let mut vertex = Vertex::at(*position);
    vertex.normal = corner.normal.unwrap_or([0.0; 3]);

    if textured {
        // 后面的 UV 集覆盖前面的
        for [u, v] in corner.uvs.iter().flatten() {
            vertex.texcoord = [*u, if config.flip_v { 1.0 - v } else { *v }];
        }
    }

    Ok(vertex)
}

#[cfg(feature = "fbx")]
pub use assimp::FbxImporter;

#[cfg(feature = "fbx")]
mod assimp {
    use super::*;
    use crate::geometry::loaders::ModelImporter;
    use russimp::material::{Material, PropertyTypeInfo, TextureType};
    use russimp::node::Node;
    use russimp::scene::{PostProcess, Scene as AiScene};
    use tracing::info;

    /// FBX 格式导入器
    ///
    /// 使用 Assimp 读取文件，缺失的法线由 Assimp 生成。
    ///
    /// # 使用示例
    ///
    /// ```rust,no_run
    /// use model_loader::geometry::loaders::{FbxImporter, ModelImporter};
    /// use std::path::Path;
    ///
    /// let scene = FbxImporter::default().load_scene(Path::new("model.fbx"))?;
    /// println!("加载了 {} 个网格", scene.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[derive(Debug, Clone, Default)]
    pub struct FbxImporter {
        config: ImportConfig,
    }

    impl FbxImporter {
        pub fn new(config: ImportConfig) -> Self {
            Self { config }
        }

        fn read(&self, path: &Path) -> Result<FbxSceneGraph> {
            if !path.exists() {
                return Err(MeshLoadError::unreadable(path, "file does not exist").into());
            }
            let path_str = path
                .to_str()
                .ok_or_else(|| MeshLoadError::unreadable(path, "path is not valid UTF-8"))?;

            let scene = AiScene::from_file(path_str, vec![PostProcess::GenerateNormals])
                .map_err(|e| MeshLoadError::malformed(path, e.to_string()))?;

            let root = scene
                .root
                .as_ref()
                .ok_or_else(|| MeshLoadError::malformed(path, "scene has no root node"))?;

            Ok(FbxSceneGraph {
                root: convert_node(&scene, root),
                materials: scene.materials.iter().map(convert_material).collect(),
            })
        }
    }

    impl ModelImporter for FbxImporter {
        fn extensions(&self) -> &'static [&'static str] {
            &["fbx"]
        }

        fn load_model(&self, path: &Path) -> Result<Mesh> {
            let mesh = self.read(path)?.to_model(path, &self.config)?;
            info!(
                path = %path.display(),
                vertices = mesh.vertex_count(),
                triangles = mesh.triangle_count(),
                "FBX 文件已加载"
            );
            Ok(mesh)
        }

        fn load_scene(&self, path: &Path) -> Result<Scene> {
            let scene = self.read(path)?.to_scene(path, &self.config)?;
            info!(path = %path.display(), meshes = scene.len(), "FBX 场景已加载");
            Ok(scene)
        }
    }

    fn convert_node(scene: &AiScene, node: &Node) -> FbxNode {
        let mesh = if node.meshes.is_empty() {
            None
        } else {
            Some(merge_meshes(scene, &node.meshes))
        };

        FbxNode {
            name: node.name.clone(),
            mesh,
            children: node
                .children
                .borrow()
                .iter()
                .map(|child| convert_node(scene, child))
                .collect(),
        }
    }

    /// 把节点引用的多个 Assimp 网格合并为一个网格属性
    fn merge_meshes(scene: &AiScene, mesh_indices: &[u32]) -> FbxMesh {
        let mut out = FbxMesh::default();

        for ai_mesh in mesh_indices.iter().filter_map(|&i| scene.meshes.get(i as usize)) {
            let base = out.control_points.len() as u32;
            out.control_points
                .extend(ai_mesh.vertices.iter().map(|v| [v.x, v.y, v.z]));

            for face in &ai_mesh.faces {
                let corners = face
                    .0
                    .iter()
                    .map(|&index| {
                        let i = index as usize;
                        FbxCorner {
                            control_point: base + index,
                            normal: ai_mesh.normals.get(i).map(|n| [n.x, n.y, n.z]),
                            uvs: ai_mesh
                                .texture_coords
                                .iter()
                                .map(|set| set.as_ref().and_then(|uvs| uvs.get(i)).map(|uv| [uv.x, uv.y]))
                                .collect(),
                        }
                    })
                    .collect();

                out.polygons.push(FbxPolygon { corners });
                if !scene.materials.is_empty() {
                    out.material_indices.push(ai_mesh.material_index as usize);
                }
            }
        }

        out
    }

    fn convert_material(material: &Material) -> FbxMaterial {
        let diffuse_texture = material
            .properties
            .iter()
            .filter(|p| p.key == "$tex.file" && matches!(p.semantic, TextureType::Diffuse))
            .find_map(|p| match &p.data {
                PropertyTypeInfo::String(file) => Some(file.clone()),
                _ => None,
            });

        FbxMaterial { diffuse_texture }
    }

}
