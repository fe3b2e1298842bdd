//! Area Theme Tool
//!
//! Command line front end for the decoration theme engine: validate a theme
//! description, evaluate a position expression, or render one frame to PNG.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use area_theme::config::Config;
use area_theme::render::{RasterCanvas, TitleFont, TitleLayout};
use area_theme::shared::Rect;
use area_theme::theme::{
    loader, DrawInfo, Expression, FrameFlags, FrameType, StaticStyle, Theme,
};

const USAGE: &str = "\
Usage: area-theme <command> [options]

Commands:
  validate [THEME] [--json]       Load a theme and print a summary
  eval EXPR [--width N] [--height N] [--scale N]
                                  Evaluate a position expression
  render [THEME] --out FILE [--type T] [--focused] [--maximized] [--shaded]
         [--width N] [--height N] [--title TEXT]
                                  Render one frame to a PNG file

THEME defaults to theme.path in ~/.config/area/theme.toml";

/// Options that take a value
const VALUE_OPTIONS: &[&str] = &["--width", "--height", "--scale", "--out", "--type", "--title"];

/// Command line split into positionals, `--name value` options and switches
struct Args {
    positional: Vec<String>,
    options: Vec<(String, String)>,
    switches: Vec<String>,
}

impl Args {
    fn parse(raw: &[String]) -> Result<Self> {
        let mut args = Self {
            positional: Vec::new(),
            options: Vec::new(),
            switches: Vec::new(),
        };

        let mut iter = raw.iter();
        while let Some(arg) = iter.next() {
            if VALUE_OPTIONS.contains(&arg.as_str()) {
                let value = iter
                    .next()
                    .with_context(|| format!("Option {} needs a value", arg))?;
                args.options.push((arg.clone(), value.clone()));
            } else if arg.starts_with("--") {
                args.switches.push(arg.clone());
            } else {
                args.positional.push(arg.clone());
            }
        }

        Ok(args)
    }

    fn value(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn number(&self, name: &str, default: i32) -> Result<i32> {
        match self.value(name) {
            Some(v) => v
                .parse()
                .with_context(|| format!("Failed to parse {} value '{}'", name, v)),
            None => Ok(default),
        }
    }

    fn has(&self, switch: &str) -> bool {
        self.switches.iter().any(|s| s == switch)
    }
}

fn main() -> Result<()> {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    if raw.is_empty() || raw.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse(&raw[1..])?;
    debug!("Command '{}' with {:?}", raw[0], args.positional);

    match raw[0].as_str() {
        "validate" => validate(&config, &args),
        "eval" => eval(&args),
        "render" => render(&config, &args),
        other => bail!("Unknown command '{}', see --help", other),
    }
}

/// Theme file from the command line, falling back to the configured one
fn theme_path(config: &Config, args: &Args) -> Result<PathBuf> {
    match args.positional.first() {
        Some(path) => Ok(PathBuf::from(path)),
        None => config
            .theme
            .path
            .clone()
            .context("No theme given and no theme.path configured"),
    }
}

fn load_theme(config: &Config, path: &Path) -> Result<Theme> {
    let mut theme = loader::load(path, config.theme.format_version)
        .with_context(|| format!("Failed to load theme {:?}", path))?;
    theme.button_layout = config.render.button_layout();
    Ok(theme)
}

fn validate(config: &Config, args: &Args) -> Result<()> {
    let path = theme_path(config, args)?;
    let theme = load_theme(config, &path)?;
    let summary = theme.summary();

    if args.has("--json") {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{}", json);
        return Ok(());
    }

    println!(
        "{} ({}), format version {}",
        summary.name.as_deref().unwrap_or("unnamed"),
        summary.id,
        summary.format_version
    );
    println!("  constants:        {}", summary.constants);
    println!("  geometries:       {}", summary.geometries);
    println!("  draw op lists:    {}", summary.draw_ops);
    println!("  frame styles:     {}", summary.frame_styles);
    println!("  frame style sets: {}", summary.frame_style_sets);
    let types: Vec<&str> = summary.window_types.iter().map(|t| t.as_str()).collect();
    println!("  window types:     {}", types.join(", "));
    Ok(())
}

fn eval(args: &Args) -> Result<()> {
    let source = args
        .positional
        .first()
        .context("eval needs an expression, e.g. \"width / 2 - 4\"")?;

    let expr = Expression::parse(source)
        .with_context(|| format!("Failed to compile expression '{}'", source))?;

    let info = DrawInfo {
        scale: args.number("--scale", 1)?,
        ..DrawInfo::default()
    };
    let width = args.number("--width", 100)? as f64;
    let height = args.number("--height", 100)? as f64;
    let env = info.env_for(Rect::new(0.0, 0.0, width, height));

    let value = expr
        .evaluate(&env)
        .with_context(|| format!("Failed to evaluate expression '{}'", source))?;
    println!("{}", value);
    Ok(())
}

fn render(config: &Config, args: &Args) -> Result<()> {
    let path = theme_path(config, args)?;
    let out = args.value("--out").context("render needs --out FILE")?;
    let theme = load_theme(config, &path)?;

    let frame_type = match args.value("--type") {
        Some(t) => t.parse::<FrameType>()?,
        None => FrameType::Normal,
    };

    let mut flags = FrameFlags::default();
    for (switch, flag) in [
        ("--focused", FrameFlags::HAS_FOCUS),
        ("--maximized", FrameFlags::MAXIMIZED),
        ("--shaded", FrameFlags::SHADED),
    ] {
        flags.set(flag, args.has(switch));
    }

    let client_width = args.number("--width", 400)?;
    let client_height = args.number("--height", 300)?;

    // The frame style's title_scale applies on top of the configured size
    let title_scale = theme
        .resolve_frame_style(frame_type, flags)
        .map_or(1.0, |style| style.layout.title_scale);
    let title = title_layout(config, args.value("--title").unwrap_or("Area"), title_scale);

    let mut frame = config.render.frame_info();
    frame.title = title.as_ref();

    let geometry = theme
        .calc_geometry(frame_type, flags, frame.text_height(), client_width, client_height)
        .with_context(|| format!("Theme has no frame style for {} windows", frame_type))?;
    if geometry.width <= 0 || geometry.height <= 0 {
        bail!("Frame has no area ({}x{})", geometry.width, geometry.height);
    }

    let mut canvas = RasterCanvas::new(geometry.width as u32, geometry.height as u32)
        .context("Failed to allocate frame canvas")?;
    let provider = StaticStyle::default();
    theme.draw_frame(
        &mut canvas,
        &provider,
        frame_type,
        flags,
        client_width,
        client_height,
        &frame,
    );

    canvas
        .into_image()
        .save(out)
        .with_context(|| format!("Failed to write {}", out))?;

    info!("Rendered {}x{} {} frame to {}", geometry.width, geometry.height, frame_type, out);
    Ok(())
}

/// Title measured with the configured font; rendering goes on without a
/// title when no font can be found
fn title_layout(config: &Config, text: &str, scale: f64) -> Option<TitleLayout> {
    let size = (config.render.title_font_size * scale) as f32;
    match TitleFont::load_system(config.render.title_font.as_deref(), size) {
        Ok(font) => Some(font.layout(text)),
        Err(e) => {
            warn!("Titles will not be drawn: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_args_split() {
        let args = Args::parse(&strings(&[
            "Crux.toml",
            "--out",
            "frame.png",
            "--focused",
            "--width",
            "640",
        ]))
        .unwrap();
        assert_eq!(args.positional, vec!["Crux.toml"]);
        assert_eq!(args.value("--out"), Some("frame.png"));
        assert!(args.has("--focused"));
        assert!(!args.has("--shaded"));
        assert_eq!(args.number("--width", 400).unwrap(), 640);
        assert_eq!(args.number("--height", 300).unwrap(), 300);
    }

    #[test]
    fn test_args_errors() {
        assert!(Args::parse(&strings(&["--out"])).is_err());
        let args = Args::parse(&strings(&["--width", "wide"])).unwrap();
        assert!(args.number("--width", 1).is_err());
    }

    #[test]
    fn test_theme_path_falls_back_to_config() {
        let mut config = Config::default();
        let args = Args::parse(&[]).unwrap();
        assert!(theme_path(&config, &args).is_err());

        config.theme.path = Some(PathBuf::from("/themes/Crux.toml"));
        assert_eq!(
            theme_path(&config, &args).unwrap(),
            PathBuf::from("/themes/Crux.toml")
        );
    }
}
