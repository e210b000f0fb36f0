//! deepdoc CLI - document to Markdown conversion tool

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use deepdoc::describe::AzureVisionClient;
use deepdoc::{
    ConvertOptions, Converter, DescribeOptions, DocumentType, FileInfo, ImageDescriber,
    ParseOptions,
};

#[derive(Parser)]
#[command(name = "deepdoc")]
#[command(version)]
#[command(about = "Convert PDF, DOCX, HTML and CSV documents to Markdown", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document to Markdown
    Convert {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Describe images and enhance the result
        #[arg(short, long)]
        advanced: bool,

        /// Print the full JSON response instead of Markdown
        #[arg(long)]
        json: bool,

        /// Skip unreadable PDF pages instead of failing
        #[arg(long)]
        lenient: bool,

        /// Font-size percentile above which PDF lines may be headings
        #[arg(long, default_value_t = 0.8)]
        heading_percentile: f32,

        /// Seconds to wait for each image description
        #[arg(long, default_value_t = 30)]
        vision_timeout: u64,

        /// Azure AI Vision endpoint
        #[arg(long, env = "VISION_ENDPOINT")]
        vision_endpoint: Option<String>,

        /// Azure AI Vision key
        #[arg(long, env = "VISION_KEY", hide_env_values = true)]
        vision_key: Option<String>,
    },

    /// Show document information
    Info {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            advanced,
            json,
            lenient,
            heading_percentile,
            vision_timeout,
            vision_endpoint,
            vision_key,
        } => {
            let mut parse = ParseOptions::new().with_heading_percentile(heading_percentile);
            if lenient {
                parse = parse.lenient();
            }
            let describe = DescribeOptions::default().with_timeout(Duration::from_secs(vision_timeout));
            cmd_convert(
                &input,
                output.as_deref(),
                advanced,
                json,
                parse,
                describer(vision_endpoint, vision_key, describe),
            )
        }
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Describer backed by Azure when both credentials are present.
fn describer(endpoint: Option<String>, key: Option<String>, options: DescribeOptions) -> ImageDescriber {
    let provider = match (endpoint, key) {
        (Some(endpoint), Some(key)) => match AzureVisionClient::new(endpoint, key) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn deepdoc::VisionProvider>),
            Err(e) => {
                log::warn!("Azure Vision client unavailable: {}", e);
                None
            }
        },
        _ => None,
    };
    ImageDescriber::with_options(provider, options)
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    advanced: bool,
    json: bool,
    parse: ParseOptions,
    describer: ImageDescriber,
) -> Result<(), Box<dyn std::error::Error>> {
    if advanced && !describer.has_provider() {
        eprintln!(
            "{} VISION_ENDPOINT/VISION_KEY not set; image descriptions will be unavailable",
            "Warning:".yellow().bold()
        );
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Converting {}...", input.display()));

    let options = ConvertOptions::new()
        .with_advanced(advanced)
        .with_parse_options(parse);
    let converter = Converter::new().with_describer(describer);
    let result = converter.convert_file(input, &options);
    pb.finish_and_clear();
    let result = result?;

    if let Some(reason) = &result.enhancement_fallback {
        log::warn!("Enhancement skipped: {}", reason);
    }

    let content = if json {
        result.to_json()?
    } else {
        result.markdown
    };

    match output {
        Some(path) => {
            write_output(path, &content)?;
            println!("{} {}", "Saved to".green(), path.display());
        }
        None => println!("{}", content),
    }

    Ok(())
}

fn write_output(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let info = deepdoc::document_info(input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), info.doc_type());
    println!("{}: {}", "Size".bold(), format_size(info.file_size()));

    match info {
        FileInfo::Prose {
            word_count,
            image_count,
            ..
        } => {
            println!("{}: {}", "Words".bold(), word_count);
            println!("{}: {}", "Images".bold(), image_count);
        }
        FileInfo::Tabular {
            row_count,
            col_count,
            ..
        } => {
            println!("{}: {}", "Rows".bold(), row_count);
            println!("{}: {}", "Columns".bold(), col_count);
        }
    }

    Ok(())
}

fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let size = bytes as f64;
    if size >= KB * KB {
        format!("{:.1} MB", size / (KB * KB))
    } else if size >= KB {
        format!("{:.1} KB", size / KB)
    } else {
        format!("{} bytes", bytes)
    }
}

fn cmd_version() {
    println!("{} {}", "deepdoc".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document to Markdown conversion tool");
    println!();
    let formats: Vec<&str> = DocumentType::ALL.iter().map(|t| t.label()).collect();
    println!("Formats: {}", formats.join(", "));
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_output_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.md");
        write_output(&path, "# Title").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Title");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_describer_without_credentials() {
        let describer = describer(None, Some("key".into()), DescribeOptions::default());
        assert!(!describer.has_provider());
    }

    #[test]
    fn test_cli_parses_convert() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
        let cli = Cli::try_parse_from(["deepdoc", "convert", "a.pdf", "--advanced", "-o", "a.md"]).unwrap();
        assert!(matches!(cli.command, Commands::Convert { advanced: true, .. }));
    }
}
