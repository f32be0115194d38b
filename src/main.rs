use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use adresboek::correct::street::{StreetMatcher, DEFAULT_THRESHOLD};
use adresboek::export::json_export::{read_register, write_register};
use adresboek::export::ExportFormat;
use adresboek::extract::{HeuristicExtractor, RecordExtractor};
use adresboek::llm::{LlmExtractor, LlmSettings, OpenAiChatClient};
use adresboek::ocr::cleaner::ThresholdCleaner;
use adresboek::ocr::pdf_reader::PdfReader;
use adresboek::ocr::renderer::{PageRenderer, DEFAULT_DPI};
use adresboek::ocr::tesseract::TesseractEngine;
use adresboek::ocr::{write_document, OcrRunner};
use adresboek::pipeline::{export_register, load_document, run, PipelineConfig};
use adresboek::{Era, ExtractConfig};

#[derive(Parser, Debug)]
#[command(name = "adresboek")]
#[command(version, about = "Person records from OCR'ed historical address books", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract person records from an OCR document
    Extract {
        /// OCR document (JSON with year and per-page text)
        input: PathBuf,

        /// First page to read (1-based)
        #[arg(long, default_value_t = 1)]
        first: usize,

        /// Last page to read, inclusive (default: last page of the document)
        #[arg(long)]
        last: Option<usize>,

        /// Built-in rules for one edition of the address book
        #[arg(short, long, value_enum)]
        preset: Option<Preset>,

        /// Extraction config as JSON (takes precedence over --preset)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Year of the edition, if the document does not carry one
        #[arg(long)]
        year: Option<i32>,

        /// Output directory (default: ./<input_name>_register)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format(s) to generate
        #[arg(short, long, value_enum, default_values_t = vec![Format::Json])]
        format: Vec<Format>,

        /// Also write one JSON register per page
        #[arg(long)]
        per_page: bool,

        /// Extraction backend
        #[arg(short, long, value_enum, default_value_t = Backend::Heuristic)]
        backend: Backend,

        /// Base URL of an OpenAI-compatible API (llm backend)
        #[arg(long)]
        llm_url: Option<String>,

        /// Model name (llm backend)
        #[arg(long)]
        llm_model: Option<String>,

        /// API key (llm backend)
        #[arg(long)]
        llm_key: Option<String>,

        /// Process lines one at a time
        #[arg(long)]
        sequential: bool,

        /// Only print warnings and errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Rasterize and OCR a scanned PDF into an OCR document
    Ocr {
        /// Scanned PDF
        pdf: PathBuf,

        /// Output JSON path (default: ./<pdf_name>_ocr.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Year to store in the document
        #[arg(long)]
        year: Option<i32>,

        /// Rendering DPI
        #[arg(long, default_value_t = DEFAULT_DPI)]
        dpi: u32,

        /// Tesseract language
        #[arg(long, default_value = "nld")]
        lang: String,

        /// Tesseract page segmentation mode
        #[arg(long, default_value_t = 4)]
        psm: u8,

        /// Binarize pages before OCR
        #[arg(long)]
        clean: bool,

        /// Binarization threshold (with --clean)
        #[arg(long, default_value_t = 160)]
        threshold: u8,

        /// Fraction cut from each page edge (with --clean)
        #[arg(long, default_value_t = 0.0)]
        crop: f32,
    },

    /// Correct street names in a register against a list of known streets
    Correct {
        /// Register JSON produced by `extract`
        register: PathBuf,

        /// Street list, one per line
        #[arg(short, long)]
        streets: PathBuf,

        /// Minimum similarity (0-100) to accept a correction
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,

        /// Output path (default: <register>_corrected.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show information about a PDF or an OCR document
    Info {
        /// PDF or OCR document path
        input: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Preset {
    #[value(name = "1854")]
    Y1854,
    #[value(name = "1865")]
    Y1865,
    #[value(name = "1880")]
    Y1880,
    #[value(name = "1911")]
    Y1911,
}

impl From<Preset> for Era {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Y1854 => Era::Y1854,
            Preset::Y1865 => Era::Y1865,
            Preset::Y1880 => Era::Y1880,
            Preset::Y1911 => Era::Y1911,
        }
    }
}

#[derive(ValueEnum, Clone, Debug, PartialEq)]
enum Format {
    Json,
    Text,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Backend {
    Heuristic,
    Llm,
}

/// `--quiet` also lowers the default log level; `RUST_LOG` still wins.
fn default_log_level(command: &Commands) -> &'static str {
    match command {
        Commands::Extract { quiet: true, .. } => "warn",
        _ => "info",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = default_log_level(&cli.command);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    match cli.command {
        Commands::Extract {
            input,
            first,
            last,
            preset,
            config,
            year,
            output,
            format,
            per_page,
            backend,
            llm_url,
            llm_model,
            llm_key,
            sequential,
            quiet,
        } => {
            let extract = load_extract_config(preset, config.as_deref())?;
            let output_dir = output.unwrap_or_else(|| default_output(&input, "register"));
            let pipeline = PipelineConfig::new(input, output_dir, first, last)
                .with_extract(extract)
                .with_year(year)
                .with_parallel(!sequential);
            let formats = format
                .iter()
                .map(|f| match f {
                    Format::Json => ExportFormat::Json,
                    Format::Text => ExportFormat::Text,
                })
                .collect::<Vec<_>>();

            match backend {
                Backend::Heuristic => {
                    let extractor = HeuristicExtractor::new(&pipeline.extract)?;
                    extract_register(&pipeline, &extractor, &formats, per_page, quiet)
                }
                Backend::Llm => {
                    let defaults = LlmSettings::default();
                    let settings = LlmSettings {
                        base_url: llm_url.unwrap_or(defaults.base_url),
                        model: llm_model.unwrap_or(defaults.model),
                        api_key: llm_key.unwrap_or(defaults.api_key),
                        ..defaults
                    };
                    let extractor = LlmExtractor::new(OpenAiChatClient::new(&settings)?);
                    extract_register(&pipeline, &extractor, &formats, per_page, quiet)
                }
            }
        }
        Commands::Ocr {
            pdf,
            output,
            year,
            dpi,
            lang,
            psm,
            clean,
            threshold,
            crop,
        } => ocr_pdf(pdf, output, year, dpi, lang, psm, clean.then_some((threshold, crop))),
        Commands::Correct {
            register,
            streets,
            threshold,
            output,
        } => correct_streets(register, streets, threshold, output),
        Commands::Info { input } => show_info(input),
    }
}

fn load_extract_config(preset: Option<Preset>, path: Option<&Path>) -> Result<ExtractConfig> {
    match (path, preset) {
        (Some(path), _) => ExtractConfig::from_file(path),
        (None, Some(preset)) => {
            let era = Era::from(preset);
            info!(%era, "using edition preset");
            Ok(ExtractConfig::for_era(era))
        }
        (None, None) => Ok(ExtractConfig::default()),
    }
}

fn default_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "adresboek".to_string());
    PathBuf::from(format!("{stem}_{suffix}"))
}

fn extract_register(
    config: &PipelineConfig,
    extractor: &dyn RecordExtractor,
    formats: &[ExportFormat],
    per_page: bool,
    quiet: bool,
) -> Result<()> {
    if !quiet {
        println!("[*] Processing: {}", config.input.display());
        println!("[*] Output: {}", config.output.display());
    }

    let extraction = run(config, extractor)
        .with_context(|| format!("Failed to extract register: {}", config.input.display()))?;

    if !quiet {
        println!("[+] Exporting results...");
    }
    export_register(&extraction, &config.output, formats, per_page)?;

    if !quiet {
        let stats = &extraction.stats;
        println!("\n[✓] Done!");
        println!("    Year: {}", extraction.year);
        println!("    Lines: {}", stats.lines);
        println!("    Records: {}", stats.records);
        println!("    Rejected: {}", stats.rejected());
        println!("    Without house number: {}", stats.flagged_without_number);
    }

    Ok(())
}

fn ocr_pdf(
    pdf: PathBuf,
    output: Option<PathBuf>,
    year: Option<i32>,
    dpi: u32,
    lang: String,
    psm: u8,
    cleaning: Option<(u8, f32)>,
) -> Result<()> {
    let reader =
        PdfReader::new(pdf.clone()).with_context(|| format!("Failed to open PDF: {}", pdf.display()))?;
    let page_count = reader.page_count()?;

    let output = output.unwrap_or_else(|| default_output(&pdf, "ocr.json"));
    let work_dir = default_output(&pdf, "pages");

    println!("[*] Processing: {}", pdf.display());
    println!("[*] Pages: {page_count}, DPI: {dpi}");

    let renderer = PageRenderer::new(work_dir.clone(), dpi);
    let engine = TesseractEngine::default().with_lang(lang).with_psm(psm);
    let cleaner = cleaning.map(|(threshold, crop)| {
        ThresholdCleaner::new(work_dir.join("improved"))
            .with_threshold(threshold)
            .with_crop(crop)
    });

    let mut runner = OcrRunner::new(&renderer, &engine);
    if let Some(cleaner) = &cleaner {
        runner = runner.with_cleaner(cleaner);
    }
    let document = runner.run(reader.path(), page_count, year)?;
    write_document(&document, &output)?;

    println!("[✓] OCR document: {}", output.display());
    Ok(())
}

fn correct_streets(
    register_path: PathBuf,
    streets: PathBuf,
    threshold: f64,
    output: Option<PathBuf>,
) -> Result<()> {
    let register = read_register(&register_path)?;
    let matcher = StreetMatcher::load(&streets, threshold)?;
    let (corrected, report) = matcher.correct_register(&register);

    let output = output.unwrap_or_else(|| {
        let stem = default_output(&register_path, "corrected.json");
        register_path.with_file_name(stem)
    });
    write_register(&corrected, &output)?;

    println!("[*] Streets known: {}", matcher.len());
    println!("[✓] Corrected {} of {} address(es)", report.corrected, report.checked);
    println!("    Output: {}", output.display());
    Ok(())
}

fn show_info(input: PathBuf) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let is_pdf = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        let reader = PdfReader::new(input.clone())
            .with_context(|| format!("Failed to open PDF: {}", input.display()))?;
        let page_count = reader.page_count()?;

        println!("PDF Information");
        println!("===============");
        println!("File: {}", input.display());
        println!("Pages: {}", page_count);
        return Ok(());
    }

    let document = load_document(&input)?;
    let characters: usize = document.content.iter().map(|p| p.text.chars().count()).sum();

    println!("OCR Document");
    println!("============");
    println!("File: {}", input.display());
    match document.year {
        Some(year) => println!("Year: {year}"),
        None => println!("Year: unknown"),
    }
    println!("Pages: {}", document.content.len());
    if let (Some(first), Some(last)) = (document.content.first(), document.content.last()) {
        println!("Page numbers: {}-{}", first.page, last.page);
    }
    println!("Characters: {characters}");

    Ok(())
}
