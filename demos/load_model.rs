/// 模型加载示例
///
/// 演示如何使用 model_loader 的 geometry 模块加载模型文件并查看结果。
///
/// 运行方式：
/// ```
/// cargo run --example load_model -- assets/models/car.obj
/// ```

use model_loader::geometry::{ModelLoader, TextureKind};
use std::path::PathBuf;

fn main() {
    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== model_loader 加载示例 ===\n");

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets/models/sphere.obj"));

    let loader = ModelLoader::with_default_importers();
    println!("支持的格式: {:?}", loader.extensions());
    println!("正在加载: {}", path.display());

    match loader.load_scene(&path) {
        Ok(scene) => {
            println!("\n✓ 加载成功！共 {} 个网格\n", scene.len());

            for (i, mesh) in scene.iter().enumerate() {
                println!("网格 {}:", i);
                println!("  名称: {}", mesh.name.as_deref().unwrap_or("未命名"));
                println!("  顶点数: {}", mesh.vertex_count());
                println!("  三角形数: {}", mesh.triangle_count());
                println!("  透明: {}", mesh.is_transparent);

                for name in mesh.texture_names(TextureKind::Diffuse) {
                    println!("  漫反射纹理: {}", name);
                }
                for name in mesh.texture_names(TextureKind::Normal) {
                    println!("  法线纹理: {}", name);
                }

                // 显示前几个顶点的数据
                for (j, vertex) in mesh.vertices.iter().take(3).enumerate() {
                    println!("  顶点 {}:", j);
                    println!("    位置: [{:.3}, {:.3}, {:.3}]",
                        vertex.position[0], vertex.position[1], vertex.position[2]);
                    println!("    UV: [{:.3}, {:.3}]",
                        vertex.texcoord[0], vertex.texcoord[1]);
                    println!("    切线: [{:.3}, {:.3}, {:.3}]",
                        vertex.tangent[0], vertex.tangent[1], vertex.tangent[2]);
                }

                if let Err(e) = mesh.validate() {
                    println!("  ✗ 验证失败: {}", e);
                }
                println!();
            }
        }
        Err(e) => {
            println!("\n✗ 加载失败: {}", e);
            std::process::exit(1);
        }
    }
}
