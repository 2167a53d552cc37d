//! model_loader 命令行工具
//!
//! 加载一个模型文件并打印每个网格的摘要（顶点数、三角形数、纹理名称）。
//!
//! # 使用方法
//!
//! ```bash
//! # 合并为单个网格
//! cargo run -- assets/models/car.obj
//!
//! # 按节点/图元拆分为场景
//! cargo run -- assets/models/car.gltf --scene
//!
//! # 指定配置文件与日志级别
//! cargo run -- model.obj --config my_config.toml --log-level debug
//! ```
//!
//! # 命令行参数
//!
//! - `<path>`: 模型文件路径（格式由扩展名决定）
//! - `--scene`: 以场景方式加载
//! - `--config <file>`: 配置文件（默认 `config.toml`，不存在时使用默认配置）
//! - `--log-level <level>` / `--log-file <path>`: 覆盖日志配置
//! - `--importer-log-level <level>`: 单独设置导入器的日志级别
//! - `--skip-degenerate-uv` / `--no-flip-v`: 覆盖导入配置

use anyhow::{bail, Context};
use model_loader::core::{log, Config};
use model_loader::geometry::{Mesh, ModelLoader, TextureKind};
use std::path::PathBuf;
use tracing::{error, info};

/// 带值的参数，解析位置参数时需要跳过它们的值
const VALUE_FLAGS: &[&str] = &["--config", "--log-level", "--importer-log-level", "--log-file"];

/// 解析后的命令行
struct CliArgs {
    model_path: Option<PathBuf>,
    config_path: PathBuf,
    scene: bool,
}

impl CliArgs {
    fn parse(args: &[String]) -> Self {
        let mut model_path = None;
        let mut config_path = PathBuf::from("config.toml");
        let mut scene = false;

        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--scene" => scene = true,
                "--config" => {
                    if let Some(path) = iter.next() {
                        config_path = PathBuf::from(path);
                    }
                }
                flag if VALUE_FLAGS.contains(&flag) => {
                    iter.next();
                }
                flag if flag.starts_with("--") => {}
                path => {
                    if model_path.is_none() {
                        model_path = Some(PathBuf::from(path));
                    }
                }
            }
        }

        Self {
            model_path,
            config_path,
            scene,
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let cli = CliArgs::parse(&args);

    // 1. 加载配置（在初始化日志之前）
    let mut config = Config::from_file_or_default(&cli.config_path);

    // 2. 应用命令行参数
    config.apply_args(&args);

    // 3. 验证配置
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    // 4. 初始化日志系统
    if let Err(e) = log::init_logger(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
    info!(version = env!("CARGO_PKG_VERSION"), "model_loader starting...");

    if let Err(e) = run(&cli, &config) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &CliArgs, config: &Config) -> anyhow::Result<()> {
    let Some(path) = cli.model_path.as_deref() else {
        bail!("usage: model_loader <path> [--scene] [--config <file>] [--log-level <level>]");
    };

    let loader = ModelLoader::with_config(config.import);
    info!(
        extensions = ?loader.extensions(),
        degenerate_uv = ?config.import.degenerate_uv,
        "Import configuration"
    );

    if cli.scene {
        let scene = loader
            .load_scene(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?;

        println!("{}: {} mesh(es)", path.display(), scene.len());
        for (i, mesh) in scene.iter().enumerate() {
            print_summary(i, mesh);
        }
    } else {
        let mesh = loader
            .load_model(path)
            .with_context(|| format!("failed to load model {}", path.display()))?;

        println!("{}:", path.display());
        print_summary(0, &mesh);
    }

    Ok(())
}

fn print_summary(index: usize, mesh: &Mesh) {
    println!(
        "  [{}] {}: {} vertices, {} triangles{}",
        index,
        mesh.name.as_deref().unwrap_or("<unnamed>"),
        mesh.vertex_count(),
        mesh.triangle_count(),
        if mesh.is_transparent { " (transparent)" } else { "" }
    );

    for (label, kind) in [
        ("diffuse", TextureKind::Diffuse),
        ("pbr", TextureKind::Pbr),
        ("normal", TextureKind::Normal),
    ] {
        for name in mesh.texture_names(kind) {
            println!("      {} texture: {}", label, name);
        }
    }
}
