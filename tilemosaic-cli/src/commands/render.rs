//! Render command - render a bounding box into a PNG file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use tracing::info;

use tilemosaic::config::{parse_color, ConfigFile, MosaicRequest};
use tilemosaic::coord::{GeoBox, PixelSize};
use tilemosaic::fetch::ReqwestClient;
use tilemosaic::logging::init_logging;
use tilemosaic::mosaic::MosaicRenderer;

use crate::error::CliError;

/// Arguments for the render command.
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// South-west corner latitude
    #[arg(long, allow_hyphen_values = true)]
    pub sw_lat: f64,

    /// South-west corner longitude
    #[arg(long, allow_hyphen_values = true)]
    pub sw_lng: f64,

    /// North-east corner latitude
    #[arg(long, allow_hyphen_values = true)]
    pub ne_lat: f64,

    /// North-east corner longitude
    #[arg(long, allow_hyphen_values = true)]
    pub ne_lng: f64,

    /// Output width in pixels
    #[arg(long)]
    pub width: u32,

    /// Output height in pixels
    #[arg(long)]
    pub height: u32,

    /// Tile URL template with {x}, {y}, {z} and optional {style} placeholders
    #[arg(long)]
    pub template: Option<String>,

    /// Value substituted for {style} in the template
    #[arg(long)]
    pub style: Option<String>,

    /// Tile edge length in pixels
    #[arg(long)]
    pub tile_size: Option<u32>,

    /// Fixed zoom level (0-18); selected automatically when omitted
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Don't fetch one zoom level deeper than selected
    #[arg(long)]
    pub no_retina: bool,

    /// Minimum pixel width the bounds must cover when selecting a zoom
    #[arg(long)]
    pub min_width: Option<u32>,

    /// Minimum pixel height the bounds must cover when selecting a zoom
    #[arg(long)]
    pub min_height: Option<u32>,

    /// Maximum tile downloads in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Fail the render if any tile cannot be fetched
    #[arg(long)]
    pub fail_on_tile_error: bool,

    /// Per-tile timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Grow the bounds to the output aspect ratio
    #[arg(long)]
    pub fit_aspect: bool,

    /// Fill for missing tiles: 'transparent', '#rrggbb' or '#rrggbbaa'
    #[arg(long)]
    pub background: Option<String>,

    /// Directory for intermediate images
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,

    /// Log how long each stage takes
    #[arg(long)]
    pub measure_timing: bool,

    /// Configuration file (default: ~/.tilemosaic/config.ini)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Output PNG path
    #[arg(long, short)]
    pub output: PathBuf,
}

/// Run the render command.
pub fn run(args: RenderArgs) -> Result<(), CliError> {
    let _logging_guard = init_logging(args.log_file.as_deref())
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let config = match &args.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    let request = build_request(&args, &config)?;

    info!("TileMosaic v{}", env!("CARGO_PKG_VERSION"));
    info!(
        bounds = %request.bounds,
        size = %request.size,
        template = %request.template,
        "Rendering"
    );

    let client = ReqwestClient::new().map_err(CliError::HttpClient)?;
    let renderer = MosaicRenderer::new(Arc::new(client));

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let started = Instant::now();
    let png = runtime.block_on(renderer.render(&request))?;

    write_output(&args.output, &png)?;
    info!(
        path = %args.output.display(),
        bytes = png.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Wrote mosaic"
    );

    Ok(())
}

/// Resolves a request from flags, the config file and defaults, in that order.
pub fn build_request(args: &RenderArgs, config: &ConfigFile) -> Result<MosaicRequest, CliError> {
    let template = args
        .template
        .clone()
        .or_else(|| config.source.template.clone())
        .ok_or_else(|| {
            CliError::Config(
                "No tile URL template. Pass --template or set template in [source] of config.ini"
                    .to_string(),
            )
        })?;
    let style = args.style.as_deref().or(config.source.style.as_deref());
    let template = substitute_style(&template, style)?;

    let bounds = GeoBox::new(args.sw_lat, args.sw_lng, args.ne_lat, args.ne_lng);
    let size = PixelSize::new(args.width, args.height);
    let mut request = config.apply(MosaicRequest::new(bounds, size, template));

    if let Some(v) = args.tile_size {
        request.tile_size = v;
    }
    if let Some(v) = args.zoom {
        request.zoom_level = Some(v);
    }
    if args.no_retina {
        request.retina = false;
    }
    if let Some(v) = args.min_width {
        request.min_width = v;
    }
    if let Some(v) = args.min_height {
        request.min_height = v;
    }
    if let Some(v) = args.concurrency {
        request.concurrency = v;
    }
    if args.fail_on_tile_error {
        request.fail_on_tile_error = true;
    }
    if let Some(secs) = args.timeout {
        request.tile_timeout = Duration::from_secs(secs);
    }
    if let Some(v) = &args.background {
        request.background = parse_color(v)
            .ok_or_else(|| CliError::Config(format!("Invalid --background '{}'", v)))?;
    }
    request.fit_aspect = args.fit_aspect;
    request.debug_dir = args.debug_dir.clone();
    request.measure_timing = args.measure_timing;

    Ok(request)
}

/// Replaces `{style}` in `template`.
///
/// A template containing `{style}` without a style to substitute is an error.
fn substitute_style(template: &str, style: Option<&str>) -> Result<String, CliError> {
    match style {
        Some(style) => Ok(template.replace("{style}", style)),
        None if template.contains("{style}") => Err(CliError::Config(
            "Template contains {style} but no style was given. Pass --style".to_string(),
        )),
        None => Ok(template.to_string()),
    }
}

fn write_output(path: &Path, png: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|error| CliError::FileWrite {
            path: path.to_path_buf(),
            error,
        })?;
    }
    std::fs::write(path, png).map_err(|error| CliError::FileWrite {
        path: path.to_path_buf(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        render: RenderArgs,
    }

    fn parse(extra: &[&str]) -> RenderArgs {
        let mut argv = vec![
            "tilemosaic",
            "--sw-lat",
            "-33.95",
            "--sw-lng",
            "18.40",
            "--ne-lat",
            "-33.90",
            "--ne-lng",
            "18.48",
            "--width",
            "800",
            "--height",
            "600",
            "--output",
            "out.png",
        ];
        argv.extend_from_slice(extra);
        TestCli::try_parse_from(argv).unwrap().render
    }

    #[test]
    fn test_parse_negative_coordinates() {
        let args = parse(&["--template", "https://t/{z}/{x}/{y}.png"]);
        assert_eq!(args.sw_lat, -33.95);
        assert_eq!(args.ne_lng, 18.48);
        assert_eq!(args.output, PathBuf::from("out.png"));
    }

    #[test]
    fn test_defaults_without_config() {
        let args = parse(&["--template", "https://t/{z}/{x}/{y}.png"]);
        let request = build_request(&args, &ConfigFile::default()).unwrap();

        assert_eq!(request.size, PixelSize::new(800, 600));
        assert_eq!(request.tile_size, 256);
        assert!(request.retina);
        assert_eq!(request.concurrency, 10);
        assert_eq!(request.zoom_level, None);
        assert!(!request.fail_on_tile_error);
    }

    #[test]
    fn test_flags_override_config() {
        let config: ConfigFile =
            "[source]\ntemplate = https://cfg/{z}/{x}/{y}.png\n[download]\nconcurrency = 3\n[render]\nmin_width = 100\n"
                .parse()
                .unwrap();
        let args = parse(&["--concurrency", "7", "--zoom", "12", "--no-retina"]);

        let request = build_request(&args, &config).unwrap();

        assert_eq!(request.template, "https://cfg/{z}/{x}/{y}.png");
        assert_eq!(request.concurrency, 7);
        assert_eq!(request.min_width, 100);
        assert_eq!(request.zoom_level, Some(12));
        assert!(!request.retina);
    }

    #[test]
    fn test_missing_template_is_config_error() {
        let args = parse(&[]);
        let result = build_request(&args, &ConfigFile::default());
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_style_substitution() {
        let args = parse(&[
            "--template",
            "https://t/{style}/{z}/{x}/{y}.png",
            "--style",
            "dark",
        ]);
        let request = build_request(&args, &ConfigFile::default()).unwrap();
        assert_eq!(request.template, "https://t/dark/{z}/{x}/{y}.png");
    }

    #[test]
    fn test_style_placeholder_without_style() {
        assert!(substitute_style("https://t/{style}/{z}/{x}/{y}.png", None).is_err());
        assert_eq!(
            substitute_style("https://t/{z}/{x}/{y}.png", None).unwrap(),
            "https://t/{z}/{x}/{y}.png"
        );
    }

    #[test]
    fn test_invalid_background() {
        let args = parse(&["--template", "https://t/{z}/{x}/{y}.png", "--background", "red"]);
        assert!(matches!(
            build_request(&args, &ConfigFile::default()),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_write_output_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.png");

        write_output(&path, b"png").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"png".to_vec());
    }
}
