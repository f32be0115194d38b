use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use pretty_assertions::assert_eq;

use adresboek::core::error::DocumentError;
use adresboek::core::model::{OcrDocument, Page, PersonRecord};
use adresboek::correct::StreetMatcher;
use adresboek::export::json_export::read_register;
use adresboek::export::ExportFormat;
use adresboek::extract::HeuristicExtractor;
use adresboek::llm::{ChatClient, LlmExtractor};
use adresboek::ocr::pdf_reader::PdfReader;
use adresboek::ocr::renderer::{PageRenderer, DEFAULT_DPI};
use adresboek::ocr::tesseract::TesseractEngine;
use adresboek::ocr::OcrRunner;
use adresboek::pipeline::{export_register, run, PipelineConfig};
use adresboek::{Era, ExtractConfig};

fn temp_output_dir(prefix: &str) -> PathBuf {
    let mut out = std::env::temp_dir();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis();
    let pid = std::process::id();
    out.push(format!("{prefix}-{pid}-{now}"));
    out
}

fn write_document(dir: &Path, year: Option<i32>, pages: &[(u32, &str)]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let document = OcrDocument {
        year,
        content: pages
            .iter()
            .map(|(page, text)| Page {
                page: *page,
                text: text.to_string(),
            })
            .collect(),
    };
    let path = dir.join("book.json");
    fs::write(&path, serde_json::to_string(&document)?)?;
    Ok(path)
}

/// Section headers carry the job; entries before the first header are dropped.
#[test]
fn test_marker_edition_end_to_end() -> Result<()> {
    let dir = temp_output_dir("adresboek-1854");
    let input = write_document(
        &dir,
        Some(1854),
        &[
            (1, "ADRESBOEK DER STAD\nVoorwoord 1853\nBOEKBINDERS.\nJansen A. Hoofdstraat 12.\nvan Dijk B. H. Kerkstraat 3"),
            (2, "Smit k, Vismarkt 1\nSMEDEN.\nBos O. Oosterstraat 40"),
        ],
    )?;

    let config = PipelineConfig::new(input, dir.join("out"), 1, None)
        .with_extract(ExtractConfig::for_era(Era::Y1854));
    let extractor = HeuristicExtractor::new(&config.extract)?;
    let extraction = run(&config, &extractor)?;

    assert_eq!(extraction.year, 1854);
    assert_eq!(
        extraction.register().register,
        vec![
            PersonRecord::new("A. Jansen", "Boekbinders", "Hoofdstraat 12"),
            PersonRecord::new("B. H. van Dijk", "Boekbinders", "Kerkstraat 3"),
            PersonRecord::new("k. Smit", "Boekbinders", "Vismarkt 1"),
            PersonRecord::new("O. Bos", "Smeden", "Oosterstraat 40"),
        ]
    );
    assert_eq!(extraction.pages[1].register.len(), 2);

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}

/// Entries spanning several OCR lines are joined before extraction.
#[test]
fn test_parenthesis_edition_end_to_end() -> Result<()> {
    let dir = temp_output_dir("adresboek-1911");
    let input = write_document(
        &dir,
        None,
        &[
            (120, "ADRESBOEK 1911\nBakker {A.B.}, koop-\nman, Kerkstraat 3, tel. 1234\nVries (J.), smid,\nVismarkt 1"),
            (121, "Berg (J H v d), schilder, Oude Ebbingestraat 12a"),
        ],
    )?;

    let output = dir.join("out");
    let config = PipelineConfig::new(input, output.clone(), 1, Some(2))
        .with_extract(ExtractConfig::for_era(Era::Y1911))
        .with_year(Some(1911));
    let extractor = HeuristicExtractor::new(&config.extract)?;
    let extraction = run(&config, &extractor)?;

    assert_eq!(
        extraction.register().register,
        vec![
            PersonRecord::new("A. B. Bakker", "Koopman", "Kerkstraat 3"),
            PersonRecord::new("J. Vries", "Smid", "Vismarkt 1"),
            PersonRecord::new("J. H. v d Berg", "Schilder", "Oude Ebbingestraat 12a"),
        ]
    );

    export_register(&extraction, &output, &[ExportFormat::Json, ExportFormat::Text], true)?;
    assert_eq!(read_register(&output.join("register.json"))?, extraction.register());
    assert!(output.join("pages/page_121.json").exists());
    let text = fs::read_to_string(output.join("register.txt"))?;
    assert!(text.contains("J. Vries | Smid | Vismarkt 1"));

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
fn test_invalid_inputs_fail_before_output() -> Result<()> {
    let dir = temp_output_dir("adresboek-invalid");
    let input = write_document(&dir, None, &[(1, "Jansen A. boekbinder Hoofdstraat 12")])?;
    let extractor = HeuristicExtractor::new(&ExtractConfig::default())?;

    let no_year = PipelineConfig::new(input.clone(), dir.join("out"), 1, None);
    let err = run(&no_year, &extractor).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DocumentError>(),
        Some(DocumentError::MissingYear)
    ));

    let bad_range = PipelineConfig::new(input, dir.join("out"), 3, Some(4)).with_year(Some(1880));
    let err = run(&bad_range, &extractor).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DocumentError>(),
        Some(DocumentError::PageRange { .. })
    ));
    assert!(!dir.join("out").exists());

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}

struct ScriptedModel;

impl ChatClient for ScriptedModel {
    fn complete(&self, _system: &str, user: &str) -> Result<String> {
        if user.contains("Bakker") {
            Ok(r#"[{"name": "A. B. Bakker", "jobTitle": "Koopman", "address": "Kerkstraat 3"},
                   {"name": "C. Bakker", "jobTitle": "", "address": "Kerkstraat 5"}]"#
                .to_string())
        } else {
            Ok("No entry found.".to_string())
        }
    }
}

#[test]
fn test_llm_backend_through_pipeline() -> Result<()> {
    let dir = temp_output_dir("adresboek-llm");
    let input = write_document(
        &dir,
        Some(1927),
        &[(1, "Bakker (A. B.), koopman, Kerkstraat 3 en C. Bakker, Kerkstraat 5\nVries (J.), smid, Vismarkt 1\nBos 2")],
    )?;

    let config = PipelineConfig::new(input, dir.join("out"), 1, None).with_parallel(false);
    let extraction = run(&config, &LlmExtractor::new(ScriptedModel))?;

    assert_eq!(extraction.register().register.len(), 2);
    assert_eq!(extraction.register().register[1].job_title, "None");
    assert_eq!(extraction.stats.unusable_reply, 1);
    assert_eq!(extraction.stats.out_of_bounds, 1);

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
fn test_street_correction_on_extracted_register() -> Result<()> {
    let dir = temp_output_dir("adresboek-streets");
    let input = write_document(
        &dir,
        Some(1880),
        &[(1, "Jansen A. boekbinder Hoofdstraal 12\nDijk B. koopman, Vismarkl 3")],
    )?;
    let config = PipelineConfig::new(input, dir.join("out"), 1, None);
    let extraction = run(&config, &HeuristicExtractor::new(&config.extract)?)?;

    let streets = dir.join("streets.txt");
    fs::write(&streets, "Hoofdstraat\nVismarkt\nKerkstraat\n")?;
    let matcher = StreetMatcher::load(&streets, 70.0)?;
    let (corrected, report) = matcher.correct_register(&extraction.register());

    assert_eq!(report.corrected, 2);
    assert_eq!(corrected.register[0].address, "Hoofdstraat 12");
    assert_eq!(corrected.register[1].address, "Vismarkt 3");

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
#[ignore] // Needs poppler-utils and tesseract with Dutch language data
fn test_ocr_sample_pdf() -> Result<()> {
    let pdf_path = PathBuf::from("test/sample.pdf");
    if !pdf_path.exists() {
        eprintln!("Skipping test: test/sample.pdf not found");
        return Ok(());
    }

    let work_dir = temp_output_dir("adresboek-ocr");
    let reader = PdfReader::new(pdf_path)?;
    let pages = reader.page_count()?.min(1);

    let renderer = PageRenderer::new(work_dir.clone(), DEFAULT_DPI);
    let engine = TesseractEngine::default();
    let document = OcrRunner::new(&renderer, &engine).run(reader.path(), pages, Some(1880))?;

    assert_eq!(document.content.len(), pages);
    assert!(document.content.iter().all(|p| p.page >= 1));

    let _ = fs::remove_dir_all(&work_dir);
    Ok(())
}
