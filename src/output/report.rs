use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use clap::ValueEnum;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use super::formatter::format_grade;
use crate::evaluation::EvaluationRecord;
use crate::rubric::Rubric;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Markdown,
    Text,
}

impl ReportFormat {
    /// Guess the format from a file extension, falling back to Markdown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("txt") => ReportFormat::Text,
            _ => ReportFormat::Markdown,
        }
    }
}

/// Render a printable report for one evaluation.
pub fn render_report(
    record: &EvaluationRecord,
    rubric: &Rubric,
    institution: Option<&str>,
    format: ReportFormat,
) -> String {
    match format {
        ReportFormat::Markdown => render_markdown(record, rubric, institution),
        ReportFormat::Text => render_text(record, rubric, institution),
    }
}

/// Rubric rows for the record: (title, level name, points)
fn indicator_rows<'a>(
    record: &'a EvaluationRecord,
    rubric: &'a Rubric,
) -> impl Iterator<Item = (&'a str, &'a str, u8)> {
    rubric.indicators().iter().filter_map(|indicator| {
        record.scores().get(&indicator.id).map(|points| {
            (
                indicator.title.as_str(),
                indicator.level_name(points),
                points.value(),
            )
        })
    })
}

fn render_markdown(record: &EvaluationRecord, rubric: &Rubric, institution: Option<&str>) -> String {
    let mut out = String::new();
    let max_total = rubric.len() * 4;

    let _ = writeln!(out, "# Presentation evaluation");
    if let Some(name) = institution {
        let _ = writeln!(out, "\n_{}_", name);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Student:** {}", record.student_name());
    let _ = writeln!(out, "- **Course:** {}", record.course());
    let _ = writeln!(out, "- **Date:** {}", record.evaluation_date().format("%Y-%m-%d"));
    let _ = writeln!(out);

    let _ = writeln!(out, "## Scores\n");
    let _ = writeln!(out, "| Indicator | Level | Points |");
    let _ = writeln!(out, "|---|---|---:|");
    for (title, level, points) in indicator_rows(record, rubric) {
        let _ = writeln!(out, "| {} | {} | {} |", title, level, points);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "**Total score:** {}/{}  ", record.total_score(), max_total);
    let _ = writeln!(out, "**Final grade:** {}", format_grade(record.final_grade()));
    let _ = writeln!(out);

    let _ = writeln!(out, "## Feedback\n");
    let _ = writeln!(out, "{}", record.feedback().trim());

    if let Some(grounding) = record.grounding() {
        if !grounding.attributions.is_empty() {
            let _ = writeln!(out, "\n## Sources\n");
            for source in &grounding.attributions {
                let title = if source.title.is_empty() {
                    &source.uri
                } else {
                    &source.title
                };
                let _ = writeln!(out, "- [{}]({})", title, source.uri);
            }
        }
        if !grounding.web_search_queries.is_empty() {
            let _ = writeln!(out, "\n## Search queries\n");
            for query in &grounding.web_search_queries {
                let _ = writeln!(out, "- {}", query);
            }
        }
    }

    out
}

fn render_text(record: &EvaluationRecord, rubric: &Rubric, institution: Option<&str>) -> String {
    let mut out = String::new();
    let max_total = rubric.len() * 4;
    let rule = "=".repeat(60);

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "PRESENTATION EVALUATION");
    if let Some(name) = institution {
        let _ = writeln!(out, "{}", name);
    }
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Student: {}", record.student_name());
    let _ = writeln!(out, "Course:  {}", record.course());
    let _ = writeln!(out, "Date:    {}", record.evaluation_date().format("%Y-%m-%d"));
    let _ = writeln!(out);

    for (title, level, points) in indicator_rows(record, rubric) {
        let _ = writeln!(out, "{}", title);
        let _ = writeln!(out, "    {} ({} pts)", level, points);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Total score: {}/{}", record.total_score(), max_total);
    let _ = writeln!(out, "Final grade: {}", format_grade(record.final_grade()));
    let _ = writeln!(out);

    let _ = writeln!(out, "FEEDBACK");
    let _ = writeln!(out, "{}", "-".repeat(60));
    let _ = writeln!(out, "{}", record.feedback().trim());

    if let Some(grounding) = record.grounding() {
        if !grounding.attributions.is_empty() {
            let _ = writeln!(out, "\nSOURCES");
            for source in &grounding.attributions {
                if source.title.is_empty() {
                    let _ = writeln!(out, "  - {}", source.uri);
                } else {
                    let _ = writeln!(out, "  - {} <{}>", source.title, source.uri);
                }
            }
        }
        if !grounding.web_search_queries.is_empty() {
            let _ = writeln!(out, "\nSEARCH QUERIES");
            for query in &grounding.web_search_queries {
                let _ = writeln!(out, "  - {}", query);
            }
        }
    }

    out
}

/// Render and write a report atomically, creating parent directories
pub fn export_report(
    path: &Path,
    record: &EvaluationRecord,
    rubric: &Rubric,
    institution: Option<&str>,
    format: ReportFormat,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let report = render_report(record, rubric, institution, format);
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;
    file.write_all(report.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save report to {}", path.display()))?;

    tracing::info!("Exported report for {} to {}", record.student_name(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{
        BuildMode, GroundingMetadata, RecordBuilder, RecordDraft, SourceAttribution,
    };
    use crate::rubric::{reference_rubric, ScorePoints, ScoreSet, REFERENCE_COURSES};
    use crate::scoring::{GradingConfig, GradingScale};
    use chrono::NaiveDate;

    fn record(grounding: Option<GroundingMetadata>) -> EvaluationRecord {
        let rubric = reference_rubric();
        let courses: Vec<String> = REFERENCE_COURSES.iter().map(|c| c.to_string()).collect();
        let builder = RecordBuilder::new(
            &rubric,
            &courses,
            GradingScale::for_rubric(rubric.len(), &GradingConfig::default()),
        );
        let scores: ScoreSet = rubric
            .ids()
            .map(|id| (id.to_string(), ScorePoints::new(3).unwrap()))
            .collect();
        builder
            .build(
                RecordDraft {
                    student_name: "Ana Pérez".to_string(),
                    course: "3ºA".to_string(),
                    evaluation_date: NaiveDate::from_ymd_opt(2024, 5, 17),
                    scores,
                    feedback: Some("Buen trabajo, Ana.".to_string()),
                    grounding,
                    ..RecordDraft::default()
                },
                BuildMode::Draft,
            )
            .unwrap()
    }

    fn grounding() -> GroundingMetadata {
        GroundingMetadata {
            web_search_queries: vec!["técnicas de oratoria".to_string()],
            attributions: vec![SourceAttribution {
                uri: "https://example.org/oratoria".to_string(),
                title: "Guía de oratoria".to_string(),
            }],
        }
    }

    #[test]
    fn test_markdown_report() {
        let report = render_report(
            &record(None),
            &reference_rubric(),
            Some("Liceo Ejemplo"),
            ReportFormat::Markdown,
        );
        assert!(report.starts_with("# Presentation evaluation"));
        assert!(report.contains("_Liceo Ejemplo_"));
        assert!(report.contains("- **Student:** Ana Pérez"));
        assert!(report.contains("- **Date:** 2024-05-17"));
        assert!(report.contains("| Desarrollo Satisfactorio | 3 |"));
        assert!(report.contains("**Total score:** 39/52"));
        assert!(report.contains("**Final grade:** 5.1"));
        assert!(report.contains("Buen trabajo, Ana."));
        assert!(!report.contains("## Sources"));
    }

    #[test]
    fn test_markdown_report_with_sources() {
        let report = render_report(
            &record(Some(grounding())),
            &reference_rubric(),
            None,
            ReportFormat::Markdown,
        );
        assert!(report.contains("## Sources"));
        assert!(report.contains("- [Guía de oratoria](https://example.org/oratoria)"));
        assert!(report.contains("## Search queries"));
        assert!(report.contains("- técnicas de oratoria"));
    }

    #[test]
    fn test_text_report() {
        let report = render_report(
            &record(Some(grounding())),
            &reference_rubric(),
            Some("Liceo Ejemplo"),
            ReportFormat::Text,
        );
        assert!(report.contains("PRESENTATION EVALUATION"));
        assert!(report.contains("Student: Ana Pérez"));
        assert!(report.contains("    Desarrollo Satisfactorio (3 pts)"));
        assert!(report.contains("Final grade: 5.1"));
        assert!(report.contains("  - Guía de oratoria <https://example.org/oratoria>"));
        assert!(!report.contains('|'));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ReportFormat::from_path(Path::new("a/b.txt")), ReportFormat::Text);
        assert_eq!(ReportFormat::from_path(Path::new("a/b.md")), ReportFormat::Markdown);
        assert_eq!(ReportFormat::from_path(Path::new("report")), ReportFormat::Markdown);
    }

    #[test]
    fn test_export_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("ana.md");
        export_report(
            &path,
            &record(None),
            &reference_rubric(),
            None,
            ReportFormat::Markdown,
        )
        .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Ana Pérez"));
    }
}
