/// glTF 文件加载器
///
/// 使用 gltf crate 读取 glTF 2.0 文档与缓冲区（`.gltf` / `.glb`），
/// 按语义属性（`POSITION`、`NORMAL`、`COLOR_0`、`TEXCOORD_0`）读取每个图元，
/// 再通过 `MeshAssembler` 去重组装。图片只记录名称，不解码。
use super::ModelImporter;
use crate::core::config::ImportConfig;
use crate::core::error::{MeshLoadError, Result};
use crate::geometry::mesh::{Mesh, MeshAssembler, Scene, TextureKind};
use crate::geometry::vertex::{Vertex, WHITE};
use gltf::mesh::Mode;
use std::path::Path;
use tracing::{debug, info, warn};

/// glTF 格式导入器
///
/// - `load_model`: 文档顺序下所有网格的所有图元合并为一个 `Mesh`
/// - `load_scene`: 每个三角形图元生成一个 `Mesh`，按文档顺序排列
///
/// 三角形条带与扇形在组装前展开为三角形列表；点和线图元会被跳过并记录警告。
#[derive(Debug, Clone, Default)]
pub struct GltfImporter {
    config: ImportConfig,
}

/// 已读入内存的 glTF 文档及其缓冲区
///
/// 生命周期限定在一次导入调用内。
struct GltfSource {
    document: gltf::Document,
    buffers: Vec<gltf::buffer::Data>,
    texture_dir: String,
}

impl GltfImporter {
    /// 使用指定的导入配置创建导入器
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// 打开文档并加载缓冲区
    fn read(&self, path: &Path) -> Result<GltfSource> {
        if !path.exists() {
            return Err(MeshLoadError::unreadable(path, "file does not exist").into());
        }

        let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(|e| match e {
            gltf::Error::Io(io) => MeshLoadError::unreadable(path, io.to_string()),
            other => MeshLoadError::malformed(path, other.to_string()),
        })?;

        let base = path.parent();
        let buffers = gltf::import_buffers(&document, base, blob)
            .map_err(|e| MeshLoadError::malformed(path, format!("failed to load buffers: {}", e)))?;

        let texture_dir = if self.config.prefix_texture_dir {
            texture_prefix(path)
        } else {
            String::new()
        };

        Ok(GltfSource {
            document,
            buffers,
            texture_dir,
        })
    }

    /// 把一个图元的三角形追加到组装器，并记录其材质纹理
    fn append_primitive(
        &self,
        path: &Path,
        source: &GltfSource,
        primitive: &gltf::Primitive<'_>,
        assembler: &mut MeshAssembler,
    ) -> Result<()> {
        let reader = primitive.reader(|buffer| {
            source.buffers.get(buffer.index()).map(|data| data.0.as_slice())
        });

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| MeshLoadError::malformed(path, "primitive has no POSITION attribute"))?
            .collect();

        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());
        let colors: Option<Vec<[f32; 3]>> = reader.read_colors(0).map(|c| c.into_rgb_f32().collect());
        let tex_coords: Option<Vec<[f32; 2]>> = reader.read_tex_coords(0).map(|tc| tc.into_f32().collect());

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let corners = triangle_list(primitive.mode(), &indices)
            .map_err(|reason| MeshLoadError::malformed(path, reason))?;

        for &index in &corners {
            let i = index as usize;
            let position = *positions.get(i).ok_or_else(|| {
                MeshLoadError::malformed(path, format!("index {} exceeds vertex count {}", index, positions.len()))
            })?;

            let color = colors.as_ref().and_then(|c| c.get(i)).copied().unwrap_or(WHITE);
            let mut vertex = Vertex::at(position).with_color(color);
            if let Some(normal) = normals.as_ref().and_then(|n| n.get(i)) {
                vertex.normal = *normal;
            }
            if let Some(uv) = tex_coords.as_ref().and_then(|t| t.get(i)) {
                vertex.texcoord = *uv;
            }

            assembler.push_corner(vertex);
        }

        self.capture_textures(source, primitive, assembler);

        Ok(())
    }

    /// 记录图元材质引用的纹理，每个图元每种纹理最多一次
    fn capture_textures(
        &self,
        source: &GltfSource,
        primitive: &gltf::Primitive<'_>,
        assembler: &mut MeshAssembler,
    ) {
        let material = primitive.material();
        if material.index().is_none() {
            return; // 默认材质
        }

        let pbr = material.pbr_metallic_roughness();

        if let Some(info) = pbr.base_color_texture() {
            assembler.add_texture(TextureKind::Diffuse, source.texture_name(&info.texture()));
        }
        if let Some(info) = pbr.metallic_roughness_texture() {
            assembler.add_texture(TextureKind::Pbr, source.texture_name(&info.texture()));
        }
        if let Some(normal) = material.normal_texture() {
            assembler.add_texture(TextureKind::Normal, source.texture_name(&normal.texture()));
        }

        if material.alpha_mode() == gltf::material::AlphaMode::Blend {
            assembler.set_transparent(true);
        }
    }
}

impl GltfSource {
    /// 纹理图片的名称：外部 URI（可带目录前缀），或内嵌图片的占位名
    fn texture_name(&self, texture: &gltf::Texture<'_>) -> String {
        let image = texture.source();
        match image.source() {
            gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
                format!("{}{}", self.texture_dir, uri)
            }
            _ => format!("<embedded:{}>", image.index()),
        }
    }
}

impl ModelImporter for GltfImporter {
    fn extensions(&self) -> &'static [&'static str] {
        &["gltf", "glb"]
    }

    fn load_model(&self, path: &Path) -> Result<Mesh> {
        let source = self.read(path)?;

        let mut assembler = MeshAssembler::with_name(
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unnamed")
        );

        for mesh in source.document.meshes() {
            for primitive in mesh.primitives() {
                if !has_triangles(path, &primitive) {
                    continue;
                }
                self.append_primitive(path, &source, &primitive, &mut assembler)?;
            }
        }

        let mesh = assembler.finish(path)?;

        info!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "glTF 文件已加载"
        );

        Ok(mesh)
    }

    fn load_scene(&self, path: &Path) -> Result<Scene> {
        let source = self.read(path)?;

        let primitive_count: usize = source.document.meshes().map(|m| m.primitives().len()).sum();
        let mut scene = Scene::from(Vec::with_capacity(primitive_count));

        for mesh in source.document.meshes() {
            let name = mesh
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("mesh_{}", mesh.index()));

            for primitive in mesh.primitives() {
                if !has_triangles(path, &primitive) {
                    continue;
                }

                let mut assembler = MeshAssembler::with_name(name.as_str());
                self.append_primitive(path, &source, &primitive, &mut assembler)?;
                let built = assembler.finish(path)?;

                debug!(
                    mesh = %name,
                    primitive = primitive.index(),
                    vertices = built.vertex_count(),
                    "glTF 图元已组装"
                );
                scene.push(built);
            }
        }

        info!(path = %path.display(), meshes = scene.len(), "glTF 场景已加载");

        Ok(scene)
    }
}

fn has_triangles(path: &Path, primitive: &gltf::Primitive<'_>) -> bool {
    match primitive.mode() {
        Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan => true,
        mode => {
            warn!(
                path = %path.display(),
                primitive = primitive.index(),
                mode = ?mode,
                "跳过点/线图元"
            );
            false
        }
    }
}

/// 把图元的索引展开为三角形列表
///
/// - 列表：索引数必须是 3 的倍数
/// - 条带：第 i 个三角形为 (i, i+1, i+2)，奇数 i 交换前两个角点以保持环绕方向
/// - 扇形：第 i 个三角形为 (0, i, i+1)
fn triangle_list(mode: Mode, indices: &[u32]) -> std::result::Result<Vec<u32>, String> {
    match mode {
        Mode::Triangles => {
            if indices.len() % 3 != 0 {
                return Err(format!(
                    "primitive index count {} is not a multiple of 3",
                    indices.len()
                ));
            }
            Ok(indices.to_vec())
        }
        Mode::TriangleStrip => Ok((0..indices.len().saturating_sub(2))
            .flat_map(|i| {
                if i % 2 == 0 {
                    [indices[i], indices[i + 1], indices[i + 2]]
                } else {
                    [indices[i + 1], indices[i], indices[i + 2]]
                }
            })
            .collect()),
        Mode::TriangleFan => Ok((1..indices.len().saturating_sub(1))
            .flat_map(|i| [indices[0], indices[i], indices[i + 1]])
            .collect()),
        other => Err(format!("primitive mode {:?} has no triangles", other)),
    }
}

/// 模型文件所在目录，带结尾分隔符；没有目录部分时为空
fn texture_prefix(path: &Path) -> String {
    match path.parent().map(|p| p.to_string_lossy()) {
        Some(dir) if !dir.is_empty() => format!("{}/", dir.trim_end_matches(['/', '\\'])),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// 一个单位三角形：位置、UV 与 u16 索引写入 tri.bin
    fn write_buffer(dir: &Path) {
        let mut bytes = Vec::new();
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        for uv in [[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]] {
            for c in uv {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        for i in [0u16, 1, 2] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0]); // 对齐到 4 字节
        fs::write(dir.join("tri.bin"), bytes).unwrap();
    }

    const BUFFER_JSON: &str = r#"
        "buffers": [{ "uri": "tri.bin", "byteLength": 68 }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 24 },
            { "buffer": 0, "byteOffset": 60, "byteLength": 6 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" },
            { "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]"#;

    fn write_gltf(dir: &Path, name: &str, body: &str) -> PathBuf {
        write_buffer(dir);
        let json = format!(
            "{{ \"asset\": {{ \"version\": \"2.0\" }}, {}, {} }}",
            BUFFER_JSON, body
        );
        let path = dir.join(name);
        fs::write(&path, json).unwrap();
        path
    }

    const TWO_PRIMITIVES: &str = r#"
        "images": [{ "uri": "albedo.png" }, { "uri": "normal.png" }],
        "textures": [{ "source": 0 }, { "source": 1 }],
        "materials": [{
            "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } },
            "normalTexture": { "index": 1 },
            "alphaMode": "BLEND"
        }],
        "meshes": [
            { "name": "Textured", "primitives": [
                { "attributes": { "POSITION": 0, "TEXCOORD_0": 1 }, "indices": 2, "material": 0 }
            ]},
            { "name": "Plain", "primitives": [
                { "attributes": { "POSITION": 0 }, "indices": 2 }
            ]}
        ]"#;

    #[test]
    fn test_supported_extensions() {
        let exts = GltfImporter::default().extensions();
        assert!(exts.contains(&"gltf"));
        assert!(exts.contains(&"glb"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let err = GltfImporter::default()
            .load_scene(Path::new("nonexistent.gltf"))
            .unwrap_err();
        assert!(matches!(
            err.as_mesh_error(),
            Some(MeshLoadError::FileNotFoundOrUnreadable { .. })
        ));
    }

    #[test]
    fn test_scene_one_mesh_per_primitive_in_document_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gltf(dir.path(), "scene.gltf", TWO_PRIMITIVES);

        let scene = GltfImporter::default().load_scene(&path).unwrap();

        assert_eq!(scene.len(), 2);
        assert_eq!(scene.meshes[0].name.as_deref(), Some("Textured"));
        assert_eq!(scene.meshes[1].name.as_deref(), Some("Plain"));

        let textured = &scene.meshes[0];
        assert_eq!(textured.vertex_count(), 3);
        assert_eq!(textured.indices, vec![0, 1, 2]);
        // glTF 不翻转 V
        assert_eq!(textured.vertices[2].texcoord, [0.0, 1.0]);
        assert_eq!(textured.diffuse_texture_names.len(), 1);
        assert!(textured.diffuse_texture_names[0].ends_with("albedo.png"));
        assert!(textured.normal_texture_names[0].ends_with("normal.png"));
        assert!(textured.pbr_texture_names.is_empty());
        assert!(textured.is_transparent);

        let plain = &scene.meshes[1];
        assert!(plain.diffuse_texture_names.is_empty());
        assert!(!plain.is_transparent);
        assert_eq!(plain.vertices[0].texcoord, [0.0, 0.0]);
    }

    #[test]
    fn test_texture_prefix_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gltf(dir.path(), "scene.gltf", TWO_PRIMITIVES);

        let config = ImportConfig { prefix_texture_dir: false, ..ImportConfig::default() };
        let scene = GltfImporter::new(config).load_scene(&path).unwrap();

        assert_eq!(scene.meshes[0].diffuse_texture_names, vec!["albedo.png".to_string()]);
    }

    #[test]
    fn test_load_model_merges_primitives() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gltf(dir.path(), "scene.gltf", TWO_PRIMITIVES);

        let mesh = GltfImporter::default().load_model(&path).unwrap();

        // 两个图元位置相同，但 UV 不同，只有顶点 0（UV 为零）可以共享
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 3, 4]);
        assert_eq!(mesh.name.as_deref(), Some("scene"));
    }

    #[test]
    fn test_missing_position_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gltf(
            dir.path(),
            "nopos.gltf",
            r#""meshes": [{ "primitives": [{ "attributes": { "TEXCOORD_0": 1 }, "indices": 2 }] }]"#,
        );

        let err = GltfImporter::default().load_scene(&path).unwrap_err();
        assert!(matches!(
            err.as_mesh_error(),
            Some(MeshLoadError::MalformedAsset { .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gltf");
        fs::write(&path, "{ not json").unwrap();

        let err = GltfImporter::default().load_model(&path).unwrap_err();
        assert!(matches!(
            err.as_mesh_error(),
            Some(MeshLoadError::MalformedAsset { .. })
        ));
    }

    #[test]
    fn test_non_triangle_primitive_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gltf(
            dir.path(),
            "points.gltf",
            r#""meshes": [{ "primitives": [
                { "attributes": { "POSITION": 0 }, "mode": 0 },
                { "attributes": { "POSITION": 0 }, "indices": 2 }
            ]}]"#,
        );

        let scene = GltfImporter::default().load_scene(&path).unwrap();
        assert_eq!(scene.len(), 1);
    }

    /// 单位正方形：位置、法线、颜色，u8 与 u32 两套索引，以及 4 字节内嵌图片，写入 quad.bin
    fn write_quad_buffer(dir: &Path) {
        let mut bytes = Vec::new();
        let floats = [
            [0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], // POSITION
            [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0],    // NORMAL
            [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0, 0.0],    // COLOR_0
        ];
        for v in floats {
            for c in v {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        bytes.extend_from_slice(&[0u8, 1, 2, 3]);
        for i in [0u32, 1, 2, 2, 1, 3] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        bytes.extend_from_slice(&[0x89, b'P', b'N', b'G']);
        assert_eq!(bytes.len(), 176);
        fs::write(dir.join("quad.bin"), bytes).unwrap();
    }

    const QUAD: &str = r#"{
        "asset": { "version": "2.0" },
        "buffers": [{ "uri": "quad.bin", "byteLength": 176 }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 48 },
            { "buffer": 0, "byteOffset": 48, "byteLength": 48 },
            { "buffer": 0, "byteOffset": 96, "byteLength": 48 },
            { "buffer": 0, "byteOffset": 144, "byteLength": 4 },
            { "buffer": 0, "byteOffset": 148, "byteLength": 24 },
            { "buffer": 0, "byteOffset": 172, "byteLength": 4 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 4, "type": "VEC3" },
            { "bufferView": 2, "componentType": 5126, "count": 4, "type": "VEC3" },
            { "bufferView": 3, "componentType": 5121, "count": 4, "type": "SCALAR" },
            { "bufferView": 4, "componentType": 5125, "count": 6, "type": "SCALAR" }
        ],
        "images": [{ "bufferView": 5, "mimeType": "image/png" }],
        "textures": [{ "source": 0 }],
        "materials": [{ "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } }],
        "meshes": [
            { "name": "Strip", "primitives": [
                { "attributes": { "POSITION": 0, "NORMAL": 1, "COLOR_0": 2 }, "indices": 3, "mode": 5 }
            ]},
            { "name": "Fan", "primitives": [
                { "attributes": { "POSITION": 0 }, "indices": 3, "mode": 6 }
            ]},
            { "name": "List", "primitives": [
                { "attributes": { "POSITION": 0, "NORMAL": 1, "COLOR_0": 2 }, "indices": 4, "material": 0 }
            ]}
        ]
    }"#;

    fn write_quad(dir: &Path) -> PathBuf {
        write_quad_buffer(dir);
        let path = dir.join("quad.gltf");
        fs::write(&path, QUAD).unwrap();
        path
    }

    #[test]
    fn test_strip_and_fan_are_expanded_to_triangle_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_quad(dir.path());

        let scene = GltfImporter::default().load_scene(&path).unwrap();
        assert_eq!(scene.len(), 3);

        let strip = &scene.meshes[0];
        assert_eq!(strip.name.as_deref(), Some("Strip"));
        assert_eq!(strip.indices, vec![0, 1, 2, 2, 1, 3]);

        let fan = &scene.meshes[1];
        assert_eq!(fan.name.as_deref(), Some("Fan"));
        assert_eq!(fan.indices, vec![0, 1, 2, 0, 2, 3]);

        // u32 索引
        let list = &scene.meshes[2];
        assert_eq!(list.indices, vec![0, 1, 2, 2, 1, 3]);
        assert_eq!(list.vertex_count(), 4);
    }

    #[test]
    fn test_normals_colors_and_embedded_texture() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_quad(dir.path());

        let scene = GltfImporter::default().load_scene(&path).unwrap();

        let strip = &scene.meshes[0];
        assert_eq!(strip.vertices[1].color, [0.0, 1.0, 0.0]);
        assert_eq!(strip.vertices[3].color, [1.0, 1.0, 0.0]);
        assert_eq!(strip.vertices[1].normal, [0.0, 0.0, 1.0]);

        // 没有 COLOR_0 时为白色
        let fan = &scene.meshes[1];
        assert!(fan.vertices.iter().all(|v| v.color == WHITE));

        let list = &scene.meshes[2];
        assert_eq!(list.diffuse_texture_names, vec!["<embedded:0>".to_string()]);
        assert!(scene.meshes[0].diffuse_texture_names.is_empty());
    }

    #[test]
    fn test_load_model_merges_strip_fan_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_quad(dir.path());

        let mesh = GltfImporter::default().load_model(&path).unwrap();

        // 条带与列表的顶点完全相同，扇形的顶点颜色不同
        assert_eq!(mesh.triangle_count(), 6);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(&mesh.indices[12..], &[0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn test_strip_without_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gltf(
            dir.path(),
            "strip.gltf",
            r#""meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "mode": 5 }] }]"#,
        );

        let mesh = GltfImporter::default().load_model(&path).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_triangle_list() {
        assert_eq!(
            triangle_list(Mode::TriangleStrip, &[0, 1, 2, 3, 4]).unwrap(),
            vec![0, 1, 2, 2, 1, 3, 2, 3, 4]
        );
        assert_eq!(
            triangle_list(Mode::TriangleFan, &[0, 1, 2, 3]).unwrap(),
            vec![0, 1, 2, 0, 2, 3]
        );
        assert_eq!(triangle_list(Mode::TriangleStrip, &[0, 1]).unwrap(), Vec::<u32>::new());
        assert!(triangle_list(Mode::Triangles, &[0, 1, 2, 3]).is_err());
        assert!(triangle_list(Mode::Lines, &[0, 1]).is_err());
    }

    #[test]
    fn test_texture_prefix() {
        assert_eq!(texture_prefix(Path::new("assets/models/a.gltf")), "assets/models/");
        assert_eq!(texture_prefix(Path::new("a.gltf")), "");
    }
}
