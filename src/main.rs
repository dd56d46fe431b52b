//! docxiq - Main Entry Point
//!
//! Command line front end for the HTML to Word export pipeline.

use clap::{Args, Parser, Subcommand};
use docxiq::config::{load_config, save_config_silent, Settings};
use docxiq::error::{Error, Result};
use docxiq::export::options::{ExportFormat, ExportOptions, SourceFormat};
use docxiq::export::pipeline::{open_exported, prepare_source};
use docxiq::export::{
    extract_equations, parse_to_nodes, DialogSaver, DirectorySaver, Exporter, FileSaver,
    SystemClipboard,
};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Application name constant.
const APP_NAME: &str = "docxiq";

#[derive(Parser, Debug)]
#[command(author, version, about = "Export HTML or markdown with LaTeX equations to Word")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a .docx file
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Output .docx path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Choose the destination with a native save dialog
        #[arg(long)]
        dialog: bool,

        /// Open the document after exporting
        #[arg(long)]
        open: bool,

        /// Use the equation document filename
        #[arg(long, conflicts_with = "output")]
        equation: bool,
    },
    /// Put the .docx package on the clipboard
    Copy {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print the assembled document as JSON
    Inspect {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the parsed node tree instead of paragraphs
        #[arg(long)]
        nodes: bool,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Input HTML (or markdown) file
    input: PathBuf,

    /// Treat the input as markdown regardless of its extension
    #[arg(long)]
    markdown: bool,

    /// Document title metadata (defaults to the configured title)
    #[arg(long)]
    title: Option<String>,
}

impl SourceArgs {
    /// The `--markdown` flag, then the file extension, then the configured source.
    fn format(&self, options: &ExportOptions) -> SourceFormat {
        if self.markdown {
            SourceFormat::Markdown
        } else {
            options.source_for(&self.input)
        }
    }

    /// Read the input and turn it into pipeline HTML.
    fn load_html(&self, options: &ExportOptions) -> Result<String> {
        let text = fs::read_to_string(&self.input).map_err(|source| Error::FileRead {
            path: self.input.clone(),
            source,
        })?;
        Ok(prepare_source(&text, self.format(options)).into_owned())
    }

    fn exporter(&self, options: &ExportOptions) -> Exporter {
        match options.title_or(self.title.as_deref()) {
            Some(title) => Exporter::default().with_title(title),
            None => Exporter::default(),
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("Starting {}", APP_NAME);

    let mut settings = load_config();
    match run(cli.command, &mut settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, settings: &mut Settings) -> Result<()> {
    match command {
        Command::Export {
            source,
            output,
            dialog,
            open,
            equation,
        } => {
            let options = settings.export.default_options.clone();
            let html = source.load_html(&options)?;
            let default_name = options.filename_for(equation).to_string();

            let (mut saver, filename): (Box<dyn FileSaver>, String) = match output {
                Some(path) => {
                    let dir = path
                        .parent()
                        .filter(|p| !p.as_os_str().is_empty())
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from("."));
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| default_name.clone());
                    (Box::new(DirectorySaver::new(dir)) as Box<dyn FileSaver>, name)
                }
                None if dialog || options.use_save_dialog => (
                    Box::new(DialogSaver::new(options.last_export_directory.clone()))
                        as Box<dyn FileSaver>,
                    default_name,
                ),
                None => {
                    let dir = options
                        .last_export_directory
                        .clone()
                        .unwrap_or_else(|| PathBuf::from("."));
                    (
                        Box::new(DirectorySaver::new(dir)) as Box<dyn FileSaver>,
                        default_name,
                    )
                }
            };

            let path = source
                .exporter(&options)
                .save_to(&html, &filename, saver.as_mut())
                .map_err(|e| Error::ExportFailed(e.to_string()))?;
            info!("{} saved to {}", ExportFormat::DocxFile.label(), path.display());

            settings.export.last_format = ExportFormat::DocxFile;
            settings.export.default_options.last_export_directory =
                path.parent().map(Path::to_path_buf);
            settings.add_recent_export(path.clone());
            save_config_silent(settings);

            if open || options.open_after_export {
                open_exported(&path);
            }
            Ok(())
        }
        Command::Copy { source } => {
            let options = &settings.export.default_options;
            let html = source.load_html(options)?;
            if !source
                .exporter(options)
                .copy(&html, &mut SystemClipboard::new())
            {
                return Err(Error::ExportFailed("document was not copied".to_string()));
            }
            info!("{} placed on the clipboard", ExportFormat::ClipboardDocx.label());
            settings.export.last_format = ExportFormat::ClipboardDocx;
            save_config_silent(settings);
            Ok(())
        }
        Command::Inspect { source, nodes } => {
            let options = &settings.export.default_options;
            let html = source.load_html(options)?;
            let json = if nodes {
                serde_json::to_string_pretty(&parse_to_nodes(&extract_equations(&html)))
            } else {
                serde_json::to_string_pretty(&source.exporter(options).build(&html))
            }
            .map_err(|e| Error::ExportFailed(e.to_string()))?;
            println!("{}", json);
            Ok(())
        }
    }
}
