/// OBJ 文件加载器
///
/// 使用 tobj crate 解析 Wavefront OBJ 格式的3D模型，
/// 再通过 `MeshAssembler` 逐角点去重组装成 `Mesh`。
use super::ModelImporter;
use crate::core::config::ImportConfig;
use crate::core::error::{MeshLoadError, Result};
use crate::geometry::mesh::{Mesh, MeshAssembler, Scene, TextureKind};
use crate::geometry::vertex::{Vertex, WHITE};
use std::path::Path;
use tracing::{debug, info, warn};

/// OBJ 格式导入器
///
/// # 特性
///
/// - 多边形保持原样读入，由组装器按扇形三角化（P 边形生成 P-2 个三角形）
/// - UV 坐标翻转（V轴：1.0 - v，可通过配置关闭）
/// - 读取 `v x y z r g b` 形式的顶点颜色
/// - 缺失法线时使用零向量
/// - 每个对象的材质贡献一次漫反射 / 法线贴图名称
///
/// # 使用示例
///
/// ```rust,no_run
/// use model_loader::geometry::loaders::{ModelImporter, ObjImporter};
/// use std::path::Path;
///
/// let mesh = ObjImporter::default().load_model(Path::new("model.obj"))?;
/// println!("加载了 {} 个顶点", mesh.vertex_count());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObjImporter {
    config: ImportConfig,
}

impl ObjImporter {
    /// 使用指定的导入配置创建导入器
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// 调用 tobj 读取文件
    ///
    /// 材质文件缺失或损坏只记录警告，几何数据照常加载。
    fn read(&self, path: &Path) -> Result<(Vec<tobj::Model>, Vec<tobj::Material>)> {
        if !path.exists() {
            return Err(MeshLoadError::unreadable(path, "file does not exist").into());
        }

        let load_options = tobj::LoadOptions {
            triangulate: false,   // 由组装器做扇形三角化
            single_index: false,  // 保留每个角点独立的 位置/法线/UV 索引
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };

        let (models, materials) = tobj::load_obj(path, &load_options)
            .map_err(|e| map_load_error(path, e))?;

        let materials = materials.unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "OBJ 材质加载失败，忽略材质");
            Vec::new()
        });

        Ok((models, materials))
    }

    /// 把一个 tobj 对象的所有面追加到组装器
    fn append_model(
        &self,
        path: &Path,
        model: &tobj::Model,
        materials: &[tobj::Material],
        assembler: &mut MeshAssembler,
    ) -> Result<()> {
        let mesh = &model.mesh;
        let corner_count = mesh.indices.len();

        // face_arities 为空表示全部是三角形
        let triangles;
        let arities: &[u32] = if mesh.face_arities.is_empty() {
            if corner_count % 3 != 0 {
                return Err(MeshLoadError::malformed(
                    path,
                    format!("object '{}' has {} corners, not a triangle list", model.name, corner_count),
                ).into());
            }
            triangles = vec![3u32; corner_count / 3];
            &triangles
        } else {
            &mesh.face_arities
        };

        let mut start = 0usize;
        for &arity in arities {
            let arity = arity as usize;
            if start + arity > corner_count {
                return Err(MeshLoadError::malformed(
                    path,
                    format!("object '{}' face arity exceeds index data", model.name),
                ).into());
            }

            for i in 1..arity.saturating_sub(1) {
                for corner in [start, start + i, start + i + 1] {
                    let vertex = self.corner_vertex(path, mesh, corner)?;
                    assembler.push_corner(vertex);
                }
            }

            start += arity;
        }

        if let Some(material) = mesh.material_id.and_then(|id| materials.get(id)) {
            if let Some(texture) = material.diffuse_texture.as_deref().filter(|t| !t.is_empty()) {
                assembler.add_texture(TextureKind::Diffuse, texture);
            }
            if let Some(texture) = material.normal_texture.as_deref().filter(|t| !t.is_empty()) {
                assembler.add_texture(TextureKind::Normal, texture);
            }
            if material.dissolve.is_some_and(|d| d < 1.0) {
                assembler.set_transparent(true);
            }
        }

        debug!(
            object = %model.name,
            faces = arities.len(),
            vertices = assembler.vertex_count(),
            "OBJ 对象已组装"
        );

        Ok(())
    }

    /// 根据第 `corner` 个角点的索引三元组构造顶点
    fn corner_vertex(&self, path: &Path, mesh: &tobj::Mesh, corner: usize) -> Result<Vertex> {
        let position_index = mesh.indices[corner] as usize;
        let position = read3(&mesh.positions, position_index).ok_or_else(|| {
            MeshLoadError::malformed(path, format!("position index {} out of range", position_index))
        })?;

        // 没有 `v x y z r g b` 颜色时为白色
        let color = read3(&mesh.vertex_color, position_index).unwrap_or(WHITE);
        let mut vertex = Vertex::at(position).with_color(color);

        if let Some(normal) = mesh
            .normal_indices
            .get(corner)
            .and_then(|&n| read3(&mesh.normals, n as usize))
        {
            vertex.normal = normal;
        }

        if let Some([u, v]) = mesh
            .texcoord_indices
            .get(corner)
            .and_then(|&t| read2(&mesh.texcoords, t as usize))
        {
            vertex.texcoord = [u, if self.config.flip_v { 1.0 - v } else { v }];
        }

        Ok(vertex)
    }
}

impl ModelImporter for ObjImporter {
    fn extensions(&self) -> &'static [&'static str] {
        &["obj"]
    }

    fn load_model(&self, path: &Path) -> Result<Mesh> {
        let (models, materials) = self.read(path)?;

        if models.is_empty() {
            return Err(MeshLoadError::malformed(path, "OBJ file contains no objects").into());
        }

        let mut assembler = MeshAssembler::with_name(
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unnamed")
        );

        for model in &models {
            self.append_model(path, model, &materials, &mut assembler)?;
        }

        let mesh = assembler.finish(path)?;

        info!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "OBJ 文件已加载"
        );

        Ok(mesh)
    }

    fn load_scene(&self, path: &Path) -> Result<Scene> {
        let (models, materials) = self.read(path)?;

        let mut scene = Scene::new();
        for model in &models {
            let mut assembler = MeshAssembler::with_name(model.name.as_str());
            self.append_model(path, model, &materials, &mut assembler)?;
            scene.push(assembler.finish(path)?);
        }

        info!(path = %path.display(), meshes = scene.len(), "OBJ 场景已加载");

        Ok(scene)
    }
}

fn map_load_error(path: &Path, err: tobj::LoadError) -> MeshLoadError {
    match err {
        tobj::LoadError::OpenFileFailed | tobj::LoadError::ReadError => {
            MeshLoadError::unreadable(path, err.to_string())
        }
        _ => MeshLoadError::malformed(path, format!("tobj 解析失败: {}", err)),
    }
}

#[inline]
fn read3(data: &[f32], index: usize) -> Option<[f32; 3]> {
    data.get(index * 3..index * 3 + 3).map(|s| [s[0], s[1], s[2]])
}

#[inline]
fn read2(data: &[f32], index: usize) -> Option<[f32; 2]> {
    data.get(index * 2..index * 2 + 2).map(|s| [s[0], s[1]])
}
