use clap::{Parser, Subcommand};
use photo_frame::caption::{AspectRatio, CaptionField, Theme};
use photo_frame::compose::{FrameRasterizer, ImageSource, build_composition};
use photo_frame::config;
use photo_frame::diagnostics::{self, Level};
use photo_frame::export::{self, DesktopCapabilities, Platform};
use photo_frame::fault::normalize_error;
use photo_frame::metadata::{ExifSource, ImageMetadata, MetadataSource};
use photo_frame::notice::Notice;
use photo_frame::output;
use photo_frame::session::{Photo, Session};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("PHOTO_FRAME_RELEASE");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("PHOTO_FRAME_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "photo-frame")]
#[command(about = "Frame a photo with its camera metadata")]
#[command(long_about = "\
Frame a photo with its camera metadata

The photo is placed on a colored card. Below it, a caption shows the
device, the lens, and the exposure settings read from the file's EXIF
tags. Any caption line can be overridden on the command line.

Where the framed PNG ends up depends on the platform:

  web       downloads folder
  android   gallery, then downloads folder
  ios       external storage → documents → cache + share → inline share
  desktop   same chain as ios, rooted in your home directory

Run 'photo-frame gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (stock defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Frame a photo and save the result
    Frame(FrameArgs),
    /// Print the metadata read from a photo
    Metadata {
        photo: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct FrameArgs {
    photo: PathBuf,

    /// Device line (replaces the one derived from metadata)
    #[arg(long)]
    device: Option<String>,
    /// System line, e.g. "iOS 17.4"
    #[arg(long)]
    system: Option<String>,
    /// Lens line
    #[arg(long)]
    lens: Option<String>,
    /// "Captured by" credit
    #[arg(long)]
    photographer: Option<String>,

    /// Color preset
    #[arg(long, value_enum)]
    theme: Option<Theme>,
    /// Frame padding in px (0-100)
    #[arg(long)]
    padding: Option<u32>,
    /// Photo aspect ratio: auto, 1:1, 4:5, 9:16, ...
    #[arg(long)]
    aspect: Option<AspectRatio>,
    #[arg(long)]
    no_shadow: bool,
    #[arg(long)]
    border: bool,

    #[arg(long)]
    hide_device: bool,
    #[arg(long)]
    hide_lens: bool,
    #[arg(long)]
    hide_specs: bool,

    /// Platform whose save chain to use
    #[arg(long, value_enum, default_value_t = Platform::detect())]
    platform: Platform,
    /// Downloads folder (overrides config)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Also save the diagnostic log next to the download
    #[arg(long)]
    export_logs: bool,
    /// Print the most recent diagnostic entries when done
    #[arg(long)]
    logs: bool,
    /// Only list entries at this level (debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<Level>,
    /// Only list entries in this category (Upload, Export, ...)
    #[arg(long, value_name = "NAME")]
    log_category: Option<String>,
    /// Empty the diagnostic log once it has been listed or exported
    #[arg(long)]
    clear_logs: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Frame(args) => {
            let app_config = config::load_config(cli.config.as_deref())?;
            if !frame(args, app_config)? {
                std::process::exit(1);
            }
        }
        Command::Metadata { photo } => {
            let photo = Photo::from_path(&photo)?;
            match ExifSource::new().read_tags(&photo.bytes) {
                Ok(tags) => {
                    let metadata = tags
                        .as_ref()
                        .map(ImageMetadata::from_tags)
                        .unwrap_or_default();
                    output::print_metadata(&metadata);
                }
                Err(e) => {
                    output::print_notice(&Notice::error(e.to_string()));
                    std::process::exit(1);
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Returns whether the photo was saved.
fn frame(
    args: FrameArgs,
    mut app_config: config::AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    if args.output.is_some() {
        app_config.export.download_dir = args.output.clone();
    }

    let mut session = Session::new(ExifSource::new(), app_config.caption.clone());
    for notice in session.upload_file(&args.photo)? {
        output::print_notice(&notice);
    }

    let overrides = [
        (CaptionField::Device, args.device),
        (CaptionField::System, args.system),
        (CaptionField::Lens, args.lens),
        (CaptionField::Photographer, args.photographer),
    ];
    for (field, value) in overrides {
        if let Some(value) = value {
            session.edit(field, value);
        }
    }

    let caption = session.caption_mut();
    if let Some(theme) = args.theme {
        caption.apply_theme(theme);
    }
    if let Some(padding) = args.padding {
        caption.set_padding(padding);
    }
    if let Some(aspect) = args.aspect {
        caption.aspect_ratio = aspect;
    }
    caption.shadow &= !args.no_shadow;
    caption.border |= args.border;
    caption.show_device &= !args.hide_device;
    caption.show_lens &= !args.hide_lens;
    caption.show_tech_specs &= !args.hide_specs;
    output::print_caption(session.caption());

    let Some(photo) = session.photo() else {
        return Ok(false);
    };
    let mut composition = build_composition(
        session.caption(),
        session.metadata(),
        ImageSource::Inline {
            mime: photo.mime.clone(),
            bytes: photo.bytes.clone(),
        },
        &photo.file_name,
    );

    let rasterizer = FrameRasterizer::from_config(&app_config.render)?;
    let capabilities = DesktopCapabilities::from_config(&app_config.export);
    let device = capabilities.device(args.platform);

    let result = export::export(
        &mut composition,
        &rasterizer,
        &device,
        &export::load_policy(&app_config.export),
        &export::raster_options(&app_config.export),
        export::now_millis(),
    );
    output::print_export_result(&result);

    if args.export_logs {
        let saved =
            diagnostics::with_global(|log| log.download(&capabilities.download, export::now_millis()));
        let notice = match saved {
            Ok(path) => Notice::success(format!("Logs saved to {}", path.display())),
            Err(fault) => Notice::error(normalize_error(&fault, "Log export failed")),
        };
        output::print_notice(&notice);
    }
    if args.logs || args.log_level.is_some() || args.log_category.is_some() {
        let (entries, categories) = diagnostics::with_global(|log| {
            (
                log.view(args.log_level, args.log_category.as_deref()),
                log.categories(),
            )
        });
        output::print_log_listing(&entries, &categories);
    }
    if args.clear_logs {
        diagnostics::with_global(|log| log.clear());
        output::print_notice(&Notice::info("Logs cleared"));
    }

    Ok(result.success)
}
