use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use qrshare_lib::export::{default_filename, ExportFormat};
use qrshare_lib::preview::Route;
use qrshare_lib::qrcode::RenderedQr;
use qrshare_lib::settings::{default_data_dir, SettingsManager};
use qrshare_lib::share::{ShareAction, ShareTarget};
use qrshare_lib::QrShare;

#[derive(Parser, Debug)]
#[command(name = "qrshare", version, about = "Generate, host and share QR codes")]
struct Cli {
    /// Directory holding settings.json and the database.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file to use instead of <data-dir>/settings.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// Foreground color (hex or CSS name).
    #[arg(long)]
    fg: Option<String>,

    /// Background color (hex or CSS name).
    #[arg(long)]
    bg: Option<String>,

    /// Use the 180px layout instead of 220px.
    #[arg(long)]
    compact: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a QR code and print its share link.
    Generate {
        content: String,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// Look up a hosted QR code by id, path or share URL.
    Show {
        id: String,
        /// Also save the preview in this format.
        #[arg(long, value_enum)]
        export: Option<FormatChoice>,
        /// Output directory for --export.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Save a QR code as PNG or PDF.
    Export {
        content: String,
        #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
        format: FormatChoice,
        /// Output directory.
        #[arg(long)]
        out: Option<PathBuf>,
        /// File name without extension.
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// Print the SVG preview.
    Svg {
        content: String,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// Build an outbound share link.
    Share {
        /// native, whatsapp, facebook, twitter, instagram or email.
        target: ShareTarget,
        content: String,
        /// Hosted share URL; defaults to the configured origin.
        #[arg(long)]
        url: Option<String>,
    },
    /// Launch the desktop window.
    #[cfg(feature = "desktop")]
    Desktop,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Pdf,
}

impl From<FormatChoice> for ExportFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Png => ExportFormat::Png,
            FormatChoice::Pdf => ExportFormat::Pdf,
        }
    }
}

fn open(cli: &Cli) -> anyhow::Result<QrShare> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let settings = match &cli.config {
        Some(path) => SettingsManager::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => SettingsManager::new(&data_dir),
    };
    QrShare::with_settings(settings, &data_dir).context("failed to initialize qrshare")
}

fn render(qrshare: &QrShare, content: &str, style: &StyleArgs) -> anyhow::Result<RenderedQr> {
    let size = qrshare.display_size(style.compact.then_some(true));
    Ok(qrshare.render(content, style.fg.as_deref(), style.bg.as_deref(), size)?)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let qrshare = open(&cli)?;

    match &cli.cmd {
        Command::Generate { content, style } => {
            let rendered = render(&qrshare, content, style)?;
            let generated = qrshare
                .generate(&rendered)
                .await
                .context("Failed to generate QR code. Please try again.")?;
            println!("QR code generated and hosted successfully!");
            println!("id:  {}", generated.id);
            println!("url: {}", generated.share_url);
        }
        Command::Show { id, export, out } => {
            let id = Route::id_from_input(id);
            let record = qrshare.resolve(&id).await?;
            println!("text:      {}", record.text);
            println!("image:     {}", record.image_url);
            println!("colors:    {} on {}", record.fg_color, record.bg_color);
            println!("created:   {}", record.timestamp.to_rfc3339());

            if let Some(format) = export {
                let rendered =
                    RenderedQr::from_record(&record, qrshare.preview_size(None))?;
                let path = qrshare.export(
                    &rendered,
                    (*format).into(),
                    out.as_deref(),
                    &default_filename(&record.id),
                )?;
                println!("saved:     {}", path.display());
            }
        }
        Command::Export {
            content,
            format,
            out,
            name,
            style,
        } => {
            let rendered = render(&qrshare, content, style)?;
            let name = name
                .clone()
                .unwrap_or_else(|| default_filename(chrono::Utc::now().timestamp_millis()));
            let path = qrshare.export(&rendered, (*format).into(), out.as_deref(), &name)?;
            println!("{}", path.display());
        }
        Command::Svg { content, style } => {
            println!("{}", render(&qrshare, content, style)?.to_svg());
        }
        Command::Share {
            target,
            content,
            url,
        } => match qrshare.share(*target, content, url.as_deref(), None, false) {
            ShareAction::Open { url } => println!("{}", url),
            ShareAction::CopyToClipboard { text, notice } => {
                // No clipboard in a terminal: print what would have been copied
                println!("{}", text);
                eprintln!("{}", notice);
            }
            ShareAction::Notice { message } => eprintln!("{}", message),
            ShareAction::NativeSheet { text, url, .. } => println!("{} {}", text, url),
        },
        #[cfg(feature = "desktop")]
        Command::Desktop => unreachable!("desktop is launched before the runtime starts"),
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Tauri drives its own async runtime
    #[cfg(feature = "desktop")]
    if matches!(cli.cmd, Command::Desktop) {
        qrshare_lib::run();
        return;
    }

    let result = tokio::runtime::Runtime::new()
        .context("failed to start async runtime")
        .and_then(|runtime| runtime.block_on(run(cli)));
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
