pub mod formatter;
pub mod report;

pub use formatter::{
    format_dashboard, format_grade, format_grade_chart, format_grade_summary,
    format_record_table, format_rubric, format_tsv, should_use_colors,
};
pub use report::{export_report, render_report, ReportFormat};
