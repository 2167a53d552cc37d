/// 几何体顶点定义模块
///
/// 定义用于3D模型加载的完整顶点结构，包含位置、颜色、UV坐标、法线和切线向量，
/// 以及顶点去重所依赖的相等性与哈希定义。

use bytemuck::{Pod, Zeroable};
use std::hash::{Hash, Hasher};

/// 完整的3D顶点结构
///
/// 内存布局与GPU兼容，使用 `#[repr(C)]` 保证顺序和对齐。
///
/// # 内存布局
///
/// - position: 12 bytes (3 * f32)
/// - color: 12 bytes (3 * f32)
/// - texcoord: 8 bytes (2 * f32)
/// - normal: 12 bytes (3 * f32)
/// - tangent: 12 bytes (3 * f32)
/// - **总计**: 56 bytes
///
/// # 相等性
///
/// 两个顶点相等当且仅当五个属性的每个分量的 IEEE-754 位模式都相同。
/// 因此相同位模式的 NaN 彼此相等，而 `0.0` 与 `-0.0` 被视为不同顶点。
/// `Hash` 使用同样的位视图，保证 `a == b` 时哈希一致。
///
/// # 示例
///
/// ```rust
/// use model_loader::geometry::Vertex;
///
/// let a = Vertex::new([0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.5, 0.5]);
/// let b = a;
/// assert_eq!(a, b);
/// assert_eq!(a.color, [1.0, 1.0, 1.0]);
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    /// 顶点位置 (x, y, z)
    pub position: [f32; 3],

    /// 顶点颜色 (r, g, b)，默认白色
    pub color: [f32; 3],

    /// 纹理坐标 (u, v)
    pub texcoord: [f32; 2],

    /// 法线向量 (nx, ny, nz)
    ///
    /// 源文件没有法线时为零向量。
    pub normal: [f32; 3],

    /// 切线向量 (tx, ty, tz)
    ///
    /// 导入时为零，由切线空间后处理累加并归一化。
    pub tangent: [f32; 3],
}

/// 默认顶点颜色
pub const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// hash-combine 使用的黄金分割常量（64 位）
const GOLDEN_RATIO: u64 = 0x9e37_79b9_7f4a_7c15;

impl Vertex {
    /// 创建一个新的顶点（白色，切线为零）
    #[inline]
    pub fn new(position: [f32; 3], normal: [f32; 3], texcoord: [f32; 2]) -> Self {
        Self {
            position,
            color: WHITE,
            texcoord,
            normal,
            tangent: [0.0; 3],
        }
    }

    /// 只有位置的顶点，其余属性取默认值
    #[inline]
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// 设置颜色
    #[inline]
    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    /// 全部 14 个分量的位模式，按字段声明顺序排列
    #[inline]
    fn bits(&self) -> [u32; 14] {
        let mut out = [0u32; 14];
        let fields = self
            .position
            .iter()
            .chain(&self.color)
            .chain(&self.texcoord)
            .chain(&self.normal)
            .chain(&self.tangent);
        for (slot, value) in out.iter_mut().zip(fields) {
            *slot = value.to_bits();
        }
        out
    }

    /// 顶点身份哈希
    ///
    /// 经典 hash-combine：先把每个字段的分量折叠成字段哈希，
    /// 再按 position、color、texcoord、normal、tangent 的顺序依次折叠进种子。
    /// 折叠不满足交换律，字段顺序会影响结果。
    pub fn identity_hash(&self) -> u64 {
        let mut seed = 0u64;
        seed = hash_combine(seed, field_hash(&self.position));
        seed = hash_combine(seed, field_hash(&self.color));
        seed = hash_combine(seed, field_hash(&self.texcoord));
        seed = hash_combine(seed, field_hash(&self.normal));
        seed = hash_combine(seed, field_hash(&self.tangent));
        seed
    }
}

#[inline]
fn hash_combine(seed: u64, value: u64) -> u64 {
    seed ^ value
        .wrapping_add(GOLDEN_RATIO)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

#[inline]
fn field_hash(components: &[f32]) -> u64 {
    components
        .iter()
        .fold(0u64, |seed, c| hash_combine(seed, u64::from(c.to_bits())))
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            color: WHITE,
            texcoord: [0.0; 2],
            normal: [0.0; 3],
            tangent: [0.0; 3],
        }
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.identity_hash());
    }
}
