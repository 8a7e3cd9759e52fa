use clap::{Parser, Subcommand};
use slide_gal::derivative::{DerivativeError, FileDerivativeResolver};
use slide_gal::field::FieldValue;
use slide_gal::imaging::RustBackend;
use slide_gal::style::GalleryStyle;
use slide_gal::types::{ImageReference, StyleName};
use slide_gal::{binder, config, gallery, output, render};
use std::path::PathBuf;

/// Shared flag for commands that may write derivatives.
#[derive(clap::Args, Clone)]
struct CreateArgs {
    /// Never write derivatives; report what they would be
    #[arg(long)]
    dont_create: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "slide-gal")]
#[command(about = "Slider and grid gallery formatter for image fields")]
#[command(long_about = "\
Slider and grid gallery formatter for image fields

Renders a field value (a list of images) as gallery markup. Every image is
resolved in three roles, each through a configurable image style:

  default      inline slide or grid cell
  thumbnail    pager strip and lightbox thumbnails
  fullscreen   lightbox full view

Derivatives are written on first use to
  <public_dir>/styles/<style>/public/<path>
and reused until the style definition changes.

Field file format:

  {
    \"entity_id\": 12,
    \"field_name\": \"field_gallery\",
    \"items\": [ { \"file\": \"public://photos/dawn.jpg\" },
               { \"media\": 7, \"image\": \"public://photos/dusk.jpg\" } ]
  }

Run 'slide-gal gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Override site.public_dir
    #[arg(long, global = true)]
    public_dir: Option<PathBuf>,

    /// Override site.base_url
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a field value as gallery markup
    Render {
        /// Field value JSON file
        field: PathBuf,
        /// Write markup to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Wrap the gallery in a standalone HTML page that loads the widgets
        #[arg(long)]
        page: bool,
        /// Print the view model as JSON instead of markup
        #[arg(long, conflicts_with = "page")]
        json: bool,
        #[command(flatten)]
        create: CreateArgs,
    },
    /// Resolve one image in a style (or the original) and print it as JSON
    Resolve {
        /// Image URI, e.g. public://photos/dawn.jpg
        uri: String,
        /// Image style; omit for the original image
        #[arg(long)]
        style: Option<String>,
        #[command(flatten)]
        create: CreateArgs,
    },
    /// Delete every derivative of an image style
    Flush {
        /// Image style name
        style: String,
    },
    /// Print the widget options used for a gallery style
    Widget {
        /// slider | grid | animated-grid | single-image
        style: String,
    },
    /// Print the formatter settings summary and available choices
    Summary,
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Print the client script bundle
    Script,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Render {
            ref field,
            output: ref out_path,
            page,
            json,
            ref create,
        } => {
            let site = load_site_config(&cli)?;
            let field = FieldValue::load(field)?;
            let resolver = open_resolver(&site, create.dont_create)?;

            let vm = gallery::build_view_model(&site.formatter, &field, &resolver);
            let body = if json {
                render::render_json(&vm)?
            } else if page {
                let title = format!("{} {}", field.field_name, field.entity_id);
                let script = binder::client_script()?;
                render::render_page(std::slice::from_ref(&vm), &title, &site.page, &script)
                    .into_string()
            } else {
                render::render_gallery(&vm).into_string()
            };

            match out_path {
                Some(path) => {
                    render::write_markup(path, &body)?;
                    output::print_render_output(&vm, &resolver.stats());
                    println!("Wrote {}", path.display());
                }
                None => {
                    println!("{}", body);
                    for line in output::format_render_output(&vm, &resolver.stats()) {
                        eprintln!("{}", line);
                    }
                }
            }
        }
        Command::Resolve {
            ref uri,
            ref style,
            ref create,
        } => {
            let site = load_site_config(&cli)?;
            let resolver = open_resolver(&site, create.dont_create)?;
            let image = ImageReference::new(uri.as_str());
            let variant = match style.as_deref().and_then(StyleName::from_setting) {
                Some(style) => resolver.try_resolve(&image, &style)?,
                None => resolver.try_describe_original(&image)?,
            };
            println!("{}", serde_json::to_string_pretty(&variant)?);
        }
        Command::Flush { ref style } => {
            let site = load_site_config(&cli)?;
            let resolver = FileDerivativeResolver::new(&site, RustBackend::new());
            let removed = resolver.flush_style(style)?;
            output::print_flush_output(style, removed);
        }
        Command::Widget { ref style } => {
            let parsed = GalleryStyle::parse(style).unwrap_or_else(|| {
                tracing::warn!(style = %style, "unknown gallery style, using grid");
                GalleryStyle::Grid
            });
            let plan = binder::widget_plan(parsed);
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::Summary => {
            let site = load_site_config(&cli)?;
            output::print_summary_output(&site);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Script => {
            print!("{}", binder::client_script()?);
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for markup and JSON.
fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();
}

/// Load `config.toml` and apply command-line overrides.
fn load_site_config(cli: &Cli) -> Result<config::SiteConfig, config::ConfigError> {
    let mut site = config::load_config(&cli.config_dir)?;
    if let Some(public_dir) = &cli.public_dir {
        site.site.public_dir = public_dir.to_string_lossy().to_string();
    }
    if let Some(base_url) = &cli.base_url {
        site.site.base_url = base_url.clone();
    }
    site.validate()?;
    Ok(site)
}

/// Resolver over the real backend, with stale styles flushed.
fn open_resolver(
    site: &config::SiteConfig,
    dont_create: bool,
) -> Result<FileDerivativeResolver<RustBackend>, DerivativeError> {
    let resolver =
        FileDerivativeResolver::new(site, RustBackend::new()).with_dont_create(dont_create);
    resolver.sync_styles()?;
    Ok(resolver)
}
