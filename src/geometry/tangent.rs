//! 切线空间后处理模块
//!
//! 根据三角形几何与 UV 梯度为每个顶点计算切线向量，用于法线贴图。
//! 与源文件格式无关，由加载器在导入完成后对每个网格调用一次。

use nalgebra::{Vector2, Vector3};

use super::mesh::Mesh;
use super::vertex::Vertex;
use crate::core::config::DegenerateUvPolicy;

/// 切线空间后处理器
///
/// # 算法
///
/// 1. 对于每个三角形 (v0, v1, v2)（按索引数组中的连续顺序）:
///    - 位置导数: e1 = p1 - p0, e2 = p2 - p0
///    - UV导数: d1 = uv1 - uv0, d2 = uv2 - uv0
///    - 缩放因子: r = 1.0 / (d1.x * d2.y - d1.y * d2.x)
///    - 切线: t = (e1 * d2.y - e2 * d1.y) * r
///    - 把 t 累加到三个顶点
///
/// 2. 归一化所有顶点的切线
///
/// 累加不会先清零：对同一网格重复调用会在已有切线上继续累加，
/// 因此每个网格只应在顶点和索引确定后处理一次。
///
/// # 示例
///
/// ```rust
/// use model_loader::geometry::{Mesh, TangentSpaceProcessor, Vertex};
///
/// let mut mesh = Mesh::new();
/// mesh.vertices = vec![
///     Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
///     Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
///     Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
/// ];
/// mesh.indices = vec![0, 1, 2];
///
/// TangentSpaceProcessor::default().process(&mut mesh);
/// assert!((mesh.vertices[0].tangent[0] - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TangentSpaceProcessor {
    policy: DegenerateUvPolicy,
}

impl TangentSpaceProcessor {
    /// 使用指定的 UV 退化策略创建处理器
    pub fn new(policy: DegenerateUvPolicy) -> Self {
        Self { policy }
    }

    /// 对网格执行完整的切线计算（累加 + 归一化）
    pub fn process(&self, mesh: &mut Mesh) {
        self.accumulate(&mut mesh.vertices, &mesh.indices);
        normalize_tangents(&mut mesh.vertices);
    }

    /// 把每个三角形的切线累加到其三个顶点上（不归一化）
    ///
    /// 索引数组末尾不足一个三角形的部分会被忽略。
    pub fn accumulate(&self, vertices: &mut [Vertex], indices: &[u32]) {
        for triangle in indices.chunks_exact(3) {
            let i0 = triangle[0] as usize;
            let i1 = triangle[1] as usize;
            let i2 = triangle[2] as usize;

            let (v0, v1, v2) = (&vertices[i0], &vertices[i1], &vertices[i2]);

            let e1 = Vector3::from(v1.position) - Vector3::from(v0.position);
            let e2 = Vector3::from(v2.position) - Vector3::from(v0.position);

            let d1 = Vector2::from(v1.texcoord) - Vector2::from(v0.texcoord);
            let d2 = Vector2::from(v2.texcoord) - Vector2::from(v0.texcoord);

            let r = 1.0 / (d1.x * d2.y - d1.y * d2.x);

            if !r.is_finite() && self.policy == DegenerateUvPolicy::Skip {
                continue;
            }

            let tangent = (e1 * d2.y - e2 * d1.y) * r;

            for &i in &[i0, i1, i2] {
                let accumulated = Vector3::from(vertices[i].tangent) + tangent;
                vertices[i].tangent = accumulated.into();
            }
        }
    }
}

/// 归一化所有顶点的切线
///
/// 长度为零的切线保持为零向量；非有限值原样传播。
pub fn normalize_tangents(vertices: &mut [Vertex]) {
    for vertex in vertices.iter_mut() {
        let tangent = Vector3::from(vertex.tangent);
        let length = tangent.norm();

        if length != 0.0 {
            vertex.tangent = (tangent / length).into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn length(v: [f32; 3]) -> f32 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    fn unit_triangle() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        ];
        mesh.indices = vec![0, 1, 2];
        mesh
    }

    #[test]
    fn test_unit_triangle_tangent_along_x() {
        let mut mesh = unit_triangle();
        let processor = TangentSpaceProcessor::default();

        processor.accumulate(&mut mesh.vertices, &mesh.indices);
        for vertex in &mesh.vertices {
            assert!((vertex.tangent[0] - 1.0).abs() < 1e-6, "{:?}", vertex.tangent);
            assert!(vertex.tangent[1].abs() < 1e-6);
            assert!(vertex.tangent[2].abs() < 1e-6);
        }

        normalize_tangents(&mut mesh.vertices);
        for vertex in &mesh.vertices {
            assert!((length(vertex.tangent) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_shared_vertex_accumulates() {
        // 两个三角形共享顶点 0 和 2，切线方向不同
        let mut mesh = Mesh::new();
        mesh.vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            Vertex::new([0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
        ];
        mesh.indices = vec![0, 1, 2, 0, 3, 2];

        TangentSpaceProcessor::default().accumulate(&mut mesh.vertices, &mesh.indices);

        // 第一个三角形贡献 +X，第二个贡献 +Z
        assert_eq!(mesh.vertices[0].tangent, [1.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[1].tangent, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[3].tangent, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_accumulate_is_not_idempotent() {
        let processor = TangentSpaceProcessor::default();

        let mut once = unit_triangle();
        processor.accumulate(&mut once.vertices, &once.indices);

        let mut twice = unit_triangle();
        processor.accumulate(&mut twice.vertices, &twice.indices);
        processor.accumulate(&mut twice.vertices, &twice.indices);

        for (a, b) in once.vertices.iter().zip(&twice.vertices) {
            assert_ne!(a.tangent, b.tangent);
            assert!(length(b.tangent) > length(a.tangent));
        }
    }

    #[test]
    fn test_degenerate_uv_propagates_by_default() {
        let mut mesh = unit_triangle();
        for vertex in &mut mesh.vertices {
            vertex.texcoord = [0.5, 0.5];
        }

        TangentSpaceProcessor::default().process(&mut mesh);

        assert!(mesh.vertices.iter().all(|v| v.tangent.iter().any(|c| !c.is_finite())));
    }

    #[test]
    fn test_degenerate_uv_skip_policy() {
        let mut mesh = unit_triangle();
        for vertex in &mut mesh.vertices {
            vertex.texcoord = [0.5, 0.5];
        }

        TangentSpaceProcessor::new(DegenerateUvPolicy::Skip).process(&mut mesh);

        for vertex in &mesh.vertices {
            assert_eq!(vertex.tangent, [0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_process_leaves_other_fields() {
        let mut mesh = unit_triangle();
        let before: Vec<_> = mesh.vertices.iter().map(|v| (v.position, v.normal, v.texcoord)).collect();

        TangentSpaceProcessor::default().process(&mut mesh);

        let after: Vec<_> = mesh.vertices.iter().map(|v| (v.position, v.normal, v.texcoord)).collect();
        assert_eq!(before, after);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }
}
