use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::core::config::ExtractConfig;
use crate::core::error::DocumentError;
use crate::core::model::{
    ExtractStats, Extraction, LineOutcome, LogicalLine, OcrDocument, Page, PageRegister,
};
use crate::export::json_export::JsonExporter;
use crate::export::text_export::TextExporter;
use crate::export::{ExportFormat, Exporter};
use crate::extract::RecordExtractor;
use crate::text::Segmenter;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// 1-based, inclusive. No last page means up to the end of the document.
    pub first_page: usize,
    pub last_page: Option<usize>,
    /// Overrides the year stored in the document.
    pub year: Option<i32>,
    pub extract: ExtractConfig,
    pub parallel: bool,
}

impl PipelineConfig {
    pub fn new(input: PathBuf, output: PathBuf, first_page: usize, last_page: Option<usize>) -> Self {
        Self {
            input,
            output,
            first_page,
            last_page,
            year: None,
            extract: ExtractConfig::default(),
            parallel: true,
        }
    }

    pub fn with_extract(mut self, extract: ExtractConfig) -> Self {
        self.extract = extract;
        self
    }

    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

pub fn load_document(path: &Path) -> Result<OcrDocument, DocumentError> {
    let raw = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => DocumentError::Missing(path.to_path_buf()),
        _ => DocumentError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;
    serde_json::from_str(&raw).map_err(|source| DocumentError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Pages `first..=last` (1-based) of the document. A range running past the
/// end is clamped; one that starts past the end is an error.
pub fn select_pages(
    document: &OcrDocument,
    first: usize,
    last: usize,
) -> Result<&[Page], DocumentError> {
    let pages = document.content.len();
    if first == 0 || first > last || first > pages {
        return Err(DocumentError::PageRange { first, last, pages });
    }
    if last > pages {
        warn!(last, pages, "page range runs past the document, clamping");
    }
    Ok(&document.content[first - 1..last.min(pages)])
}

pub fn resolve_year(document: &OcrDocument, requested: Option<i32>) -> Result<i32, DocumentError> {
    requested
        .or(document.year)
        .ok_or(DocumentError::MissingYear)
}

pub fn build_register(
    pages: &[Page],
    year: i32,
    config: &ExtractConfig,
    extractor: &dyn RecordExtractor,
    parallel: bool,
) -> Result<Extraction> {
    let lines = Segmenter::new(config).segment(pages);
    debug!(lines = lines.len(), pages = pages.len(), "segmented pages");

    let outcomes: Vec<LineOutcome> = if parallel {
        lines
            .par_iter()
            .map(|line| extractor.extract_line(line))
            .collect::<Result<_>>()?
    } else {
        lines
            .iter()
            .map(|line| extractor.extract_line(line))
            .collect::<Result<_>>()?
    };

    let extraction = assemble_pages(pages, year, &lines, outcomes);
    let stats = &extraction.stats;
    info!(
        year,
        lines = stats.lines,
        records = stats.records,
        rejected = stats.rejected(),
        without_number = stats.flagged_without_number,
        "register built"
    );
    Ok(extraction)
}

fn assemble_pages(
    pages: &[Page],
    year: i32,
    lines: &[LogicalLine],
    outcomes: Vec<LineOutcome>,
) -> Extraction {
    let mut registers: Vec<PageRegister> = pages
        .iter()
        .map(|page| PageRegister {
            page: page.page,
            register: Vec::new(),
        })
        .collect();
    let mut stats = ExtractStats::default();

    for (line, outcome) in lines.iter().zip(outcomes) {
        stats.record_outcome(&outcome);
        match outcome {
            LineOutcome::Records(records) => {
                match registers.iter_mut().find(|r| r.page == line.source_page) {
                    Some(register) => register.register.extend(records),
                    None => registers.push(PageRegister {
                        page: line.source_page,
                        register: records,
                    }),
                }
            }
            LineOutcome::Rejected(reason) => {
                debug!(page = line.source_page, ?reason, line = %line.text, "line rejected");
            }
        }
    }

    Extraction {
        year,
        pages: registers,
        stats,
    }
}

pub fn run(config: &PipelineConfig, extractor: &dyn RecordExtractor) -> Result<Extraction> {
    let document = load_document(&config.input)?;
    let year = resolve_year(&document, config.year)?;
    let last_page = config.last_page.unwrap_or(document.content.len());
    let pages = select_pages(&document, config.first_page, last_page)?;
    build_register(pages, year, &config.extract, extractor, config.parallel)
}

pub fn export_register(
    extraction: &Extraction,
    output: &Path,
    formats: &[ExportFormat],
    per_page: bool,
) -> Result<()> {
    for format in formats {
        match format {
            ExportFormat::Json => JsonExporter::new(output.to_path_buf())
                .with_per_page(per_page)
                .export(extraction)?,
            ExportFormat::Text => TextExporter::new(output.to_path_buf()).export(extraction)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{PersonRecord, Rejection};
    use crate::extract::HeuristicExtractor;
    use pretty_assertions::assert_eq;
    use std::time::{SystemTime, UNIX_EPOCH};

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

    fn document(year: Option<i32>, texts: &[&str]) -> OcrDocument {
        OcrDocument {
            year,
            content: texts
                .iter()
                .enumerate()
                .map(|(idx, text)| Page {
                    page: idx as u32 + 1,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn page_range_is_one_based_and_clamped() {
        let doc = document(None, &["a", "b", "c"]);
        let pages = select_pages(&doc, 2, 9).unwrap();
        assert_eq!(pages.iter().map(|p| p.page).collect::<Vec<_>>(), vec![2, 3]);

        assert!(matches!(
            select_pages(&doc, 0, 2),
            Err(DocumentError::PageRange { .. })
        ));
        assert!(matches!(
            select_pages(&doc, 3, 2),
            Err(DocumentError::PageRange { .. })
        ));
        assert!(matches!(
            select_pages(&doc, 4, 5),
            Err(DocumentError::PageRange { pages: 3, .. })
        ));
    }

    #[test]
    fn year_prefers_request_then_document() {
        assert_eq!(resolve_year(&document(Some(1854), &[]), Some(1880)).unwrap(), 1880);
        assert_eq!(resolve_year(&document(Some(1854), &[]), None).unwrap(), 1854);
        assert!(matches!(
            resolve_year(&document(None, &[]), None),
            Err(DocumentError::MissingYear)
        ));
    }

    #[test]
    fn missing_and_corrupt_documents() -> Result<()> {
        let dir = temp_output_dir("adresboek-load");
        fs::create_dir_all(&dir)?;

        assert!(matches!(
            load_document(&dir.join("absent.json")),
            Err(DocumentError::Missing(_))
        ));

        let corrupt = dir.join("corrupt.json");
        fs::write(&corrupt, "{\"content\": 12}")?;
        assert!(matches!(
            load_document(&corrupt),
            Err(DocumentError::Corrupt { .. })
        ));

        let _ = fs::remove_dir_all(&dir);
        Ok(())
    }

    #[test]
    fn parallel_and_sequential_agree() -> Result<()> {
        let doc = document(
            Some(1880),
            &[
                "Jansen A. boekbinder Hoofdstraat 12\nADRESBOEK\nvan Dijk A.B. kantoorbediende Kerkstraat 3",
                "Jansen A. boekbinder\nBos K. wed., Vismarkt, Oude Ebbingestraat 5",
            ],
        );
        let config = ExtractConfig::default();
        let extractor = HeuristicExtractor::new(&config)?;

        let parallel = build_register(&doc.content, 1880, &config, &extractor, true)?;
        let sequential = build_register(&doc.content, 1880, &config, &extractor, false)?;

        assert_eq!(parallel.pages, sequential.pages);
        assert_eq!(parallel.stats, sequential.stats);
        assert_eq!(
            parallel.register().register,
            vec![
                PersonRecord::new("A. Jansen", "Boekbinder", "Hoofdstraat 12"),
                PersonRecord::new("A. B. van Dijk", "Kantoorbediende", "Kerkstraat 3"),
                PersonRecord::new("K. Bos", "Wed", "Oude Ebbingestraat 5"),
            ]
        );
        assert_eq!(parallel.pages[1].register.len(), 1);
        assert_eq!(parallel.stats.lines, 5);
        assert_eq!(parallel.stats.no_boundary, 1);
        assert_eq!(parallel.stats.no_house_number, 1);
        Ok(())
    }

    #[test]
    fn extractor_errors_abort_the_run() {
        struct Broken;
        impl RecordExtractor for Broken {
            fn extract_line(&self, _line: &LogicalLine) -> Result<LineOutcome> {
                anyhow::bail!("backend down")
            }
        }
        let doc = document(Some(1911), &["Jansen A. 12"]);
        let result = build_register(&doc.content, 1911, &ExtractConfig::default(), &Broken, true);
        assert!(result.is_err());
    }

    #[test]
    fn rejections_are_counted_not_emitted() -> Result<()> {
        struct RejectAll;
        impl RecordExtractor for RejectAll {
            fn extract_line(&self, _line: &LogicalLine) -> Result<LineOutcome> {
                Ok(LineOutcome::Rejected(Rejection::UnusableReply))
            }
        }
        let doc = document(Some(1911), &["one\ntwo", "three"]);
        let extraction = build_register(&doc.content, 1911, &ExtractConfig::default(), &RejectAll, false)?;
        assert_eq!(extraction.stats.unusable_reply, 3);
        assert!(extraction.register().register.is_empty());
        assert_eq!(extraction.pages.len(), 2);
        Ok(())
    }

    #[test]
    fn export_writes_requested_formats() -> Result<()> {
        let output = temp_output_dir("adresboek-pipeline");
        let extraction = Extraction {
            year: 1880,
            pages: vec![PageRegister {
                page: 1,
                register: vec![PersonRecord::new("A. Jansen", "Boekbinder", "Hoofdstraat 12")],
            }],
            stats: ExtractStats::default(),
        };

        export_register(&extraction, &output, &[ExportFormat::Json, ExportFormat::Text], false)?;

        assert!(output.join("register.json").exists());
        assert!(output.join("register.txt").exists());

        let _ = fs::remove_dir_all(&output);
        Ok(())
    }
}
