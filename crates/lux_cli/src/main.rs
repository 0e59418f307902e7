//! `lux` - render a scene file to a PNG.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use lux_core::builtin::BUILTIN_SCENES;
use lux_core::{builtin_scene, SceneFile};
use lux_renderer::{render, RenderConfig};

const USAGE: &str = "\
Usage: lux --scene <file.json | builtin:NAME> [options]

Options:
  --samples N     Samples per pixel (default 8)
  --depth N       Maximum path depth (default 5)
  --wxh W H       Image resolution (default 512 512)
  --threads N     Worker threads (default: one per CPU)
  --seed N        Random seed (default: random)
  --output PATH   Output PNG (default render_<scene>_<samples>_<depth>_<w>x<h>.png)
  -v, --verbose   Debug logging
  -h, --help      Show this help";

/// Parsed command line. Unset options fall back to the scene file, then to defaults.
#[derive(Debug, Default, PartialEq)]
struct Args {
    scene: String,
    samples: Option<u32>,
    depth: Option<u32>,
    resolution: Option<(u32, u32)>,
    threads: Option<usize>,
    seed: Option<u64>,
    output: Option<PathBuf>,
    verbose: bool,
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = value.with_context(|| format!("missing value for {flag}"))?;
    value
        .parse()
        .with_context(|| format!("invalid value '{value}' for {flag}"))
}

/// Returns `None` when help was requested.
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<Args>> {
    let mut args = args.into_iter();
    let mut parsed = Args::default();
    let mut scene = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--scene" => scene = Some(parse_value::<String>("--scene", args.next())?),
            "--samples" => parsed.samples = Some(parse_value("--samples", args.next())?),
            "--depth" => parsed.depth = Some(parse_value("--depth", args.next())?),
            "--wxh" => {
                let width = parse_value("--wxh", args.next())?;
                let height = parse_value("--wxh", args.next())?;
                parsed.resolution = Some((width, height));
            }
            "--threads" => parsed.threads = Some(parse_value("--threads", args.next())?),
            "--seed" => parsed.seed = Some(parse_value("--seed", args.next())?),
            "--output" | "-o" => {
                let output: String = parse_value("--output", args.next())?;
                parsed.output = Some(PathBuf::from(output));
            }
            "-v" | "--verbose" => parsed.verbose = true,
            "-h" | "--help" => return Ok(None),
            other => bail!("unknown argument '{other}'"),
        }
    }

    parsed.scene = scene.context("missing --scene")?;
    Ok(Some(parsed))
}

/// Resolve `--scene` to a scene description and the directory its paths are relative to.
fn load_scene_file(scene: &str) -> Result<(SceneFile, PathBuf)> {
    if let Some(name) = scene.strip_prefix("builtin:") {
        let file = builtin_scene(name).with_context(|| {
            format!("unknown built-in scene '{name}' (available: {})", BUILTIN_SCENES.join(", "))
        })?;
        return Ok((file, PathBuf::from(".")));
    }

    let path = Path::new(scene);
    let file = SceneFile::load(path)
        .with_context(|| format!("failed to load scene {}", path.display()))?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok((file, base_dir))
}

/// Command-line flags win over the scene file's render settings.
fn render_config(args: &Args, file: &SceneFile) -> RenderConfig {
    let mut config = RenderConfig::from_settings(&file.render);
    if let Some(samples) = args.samples {
        config.samples_per_pixel = samples;
    }
    if let Some(depth) = args.depth {
        config.max_depth = depth;
    }
    if let Some((width, height)) = args.resolution {
        config.width = width;
        config.height = height;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config
}

fn default_output(scene_name: &str, config: &RenderConfig) -> PathBuf {
    PathBuf::from(format!(
        "render_{}_{}_{}_{}x{}.png",
        scene_name, config.samples_per_pixel, config.max_depth, config.width, config.height
    ))
}

fn run(args: Args) -> Result<()> {
    let (file, base_dir) = load_scene_file(&args.scene)?;
    let scene = file
        .build(&base_dir)
        .with_context(|| format!("failed to build scene '{}'", args.scene))?;

    let config = render_config(&args, &file);
    let camera = file.camera.to_camera(config.aspect());
    log::info!(
        "Rendering '{}' at {}x{}, {} spp, depth {}",
        scene.name,
        config.width,
        config.height,
        config.samples_per_pixel,
        config.max_depth
    );

    let result = render(&scene, &camera, &config)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&scene.name, &config));
    result
        .image
        .to_rgb8()
        .save(&output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    log::info!(
        "Wrote {} ({} triangles, {} BVH nodes, {:.2} s)",
        output.display(),
        result.stats.primitive_count,
        result.stats.bvh_nodes,
        result.stats.elapsed.as_secs_f64()
    );
    Ok(())
}

fn main() -> Result<()> {
    let Some(args) = parse_args(env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    run(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Option<Args>> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_full() {
        let parsed = args(&[
            "--scene", "builtin:cornell", "--samples", "16", "--depth", "3", "--wxh", "320", "240",
            "--threads", "2", "--seed", "42", "--output", "out.png", "-v",
        ])
        .unwrap()
        .unwrap();

        assert_eq!(
            parsed,
            Args {
                scene: "builtin:cornell".to_string(),
                samples: Some(16),
                depth: Some(3),
                resolution: Some((320, 240)),
                threads: Some(2),
                seed: Some(42),
                output: Some(PathBuf::from("out.png")),
                verbose: true,
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(args(&[]).is_err());
        assert!(args(&["--scene"]).is_err());
        assert!(args(&["--scene", "a.json", "--samples", "many"]).is_err());
        assert!(args(&["--scene", "a.json", "--wxh", "10"]).is_err());
        assert!(args(&["--scene", "a.json", "--bogus"]).is_err());
        assert!(args(&["--help"]).unwrap().is_none());
    }

    #[test]
    fn test_flags_override_scene_settings() {
        let mut file = SceneFile::default();
        file.render.width = Some(100);
        file.render.height = Some(50);
        file.render.samples = Some(2);

        let parsed = args(&["--scene", "x.json", "--samples", "9", "--seed", "1"]).unwrap().unwrap();
        let config = render_config(&parsed, &file);

        assert_eq!((config.width, config.height), (100, 50));
        assert_eq!(config.samples_per_pixel, 9);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.seed, Some(1));
        assert_eq!(
            default_output("cornell", &config),
            PathBuf::from("render_cornell_9_5_100x50.png")
        );
    }

    #[test]
    fn test_builtin_lookup() {
        let (file, base_dir) = load_scene_file("builtin:cornell").unwrap();
        assert_eq!(file.name.as_deref(), Some("cornell"));
        assert_eq!(base_dir, PathBuf::from("."));
        assert!(load_scene_file("builtin:nothing").is_err());
        assert!(load_scene_file("/nonexistent/scene.json").is_err());
    }
}
