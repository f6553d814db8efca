use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::dashboard::{DashboardStats, StudentGrade};
use crate::evaluation::EvaluationRecord;
use crate::rubric::Rubric;
use crate::scoring::{GradeResult, GradingScale};

const BAR_WIDTH: usize = 30;
const SHORT_ID_LEN: usize = 8;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// One decimal, the way grades are reported
pub fn format_grade(grade: f64) -> String {
    format!("{:.1}", grade)
}

fn colored_grade(grade: f64, scale: &GradingScale, use_colors: bool) -> String {
    let text = format_grade(grade);
    if !use_colors {
        text
    } else if scale.is_passing(grade) {
        text.green().bold().to_string()
    } else {
        text.red().bold().to_string()
    }
}

/// "Total: 39/52  Grade: 5.2 (passing)"
pub fn format_grade_summary(result: &GradeResult, scale: &GradingScale, use_colors: bool) -> String {
    let status = if scale.is_passing(result.final_grade) {
        "passing"
    } else {
        "failing"
    };
    format!(
        "Total: {}/{}  Grade: {} ({})",
        result.total_score,
        scale.max_total,
        colored_grade(result.final_grade, scale, use_colors),
        status
    )
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, counting chars rather than bytes
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

/// Saved evaluations, one per line: index, date, course, grade, student, id
pub fn format_record_table(
    records: &[EvaluationRecord],
    scale: &GradingScale,
    use_colors: bool,
) -> String {
    if records.is_empty() {
        return "No evaluations found.".to_string();
    }

    let term_width = get_terminal_width();
    let course_width = records
        .iter()
        .map(|r| r.course().chars().count())
        .max()
        .unwrap_or(0);
    let separator = "  ";

    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let index_str = format!("{:>3}.", idx + 1);
            let date = record.evaluation_date().format("%Y-%m-%d").to_string();
            let course = format!("{:<width$}", record.course(), width = course_width);
            let grade = colored_grade(record.final_grade(), scale, use_colors);
            let id = short_id(record.id());

            // index + date + course + grade(3) + id, plus separators
            let fixed_width =
                4 + 1 + date.len() + course_width + 3 + id.len() + separator.len() * 4;
            let student = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_text(record.student_name(), width - fixed_width)
                }
                Some(_) => truncate_text(record.student_name(), 20),
                None => record.student_name().to_string(),
            };

            if use_colors {
                format!(
                    "{} {}{sep}{}{sep}{}{sep}{}{sep}{}",
                    index_str.dimmed(),
                    date,
                    course.cyan(),
                    grade,
                    student,
                    id.dimmed(),
                    sep = separator
                )
            } else {
                format!(
                    "{} {}{sep}{}{sep}{}{sep}{}{sep}{}",
                    index_str,
                    date,
                    course,
                    grade,
                    student,
                    id,
                    sep = separator
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tab-separated values for scripting
/// Columns: id, date, course, student, total, grade (no headers, no colors)
pub fn format_tsv(records: &[EvaluationRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                r.id(),
                r.evaluation_date().format("%Y-%m-%d"),
                r.course(),
                r.student_name(),
                r.total_score(),
                format_grade(r.final_grade())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every indicator with its four levels
pub fn format_rubric(rubric: &Rubric, use_colors: bool) -> String {
    let mut lines = Vec::new();
    for (idx, indicator) in rubric.indicators().iter().enumerate() {
        if idx > 0 {
            lines.push(String::new());
        }
        let heading = format!("{} ({})", indicator.title, indicator.id);
        if use_colors {
            lines.push(heading.bold().to_string());
        } else {
            lines.push(heading);
        }
        for level in &indicator.levels {
            let name = format!("{} {}", level.points, level.level_name);
            if use_colors {
                lines.push(format!("  {}: {}", name.yellow(), level.description));
            } else {
                lines.push(format!("  {}: {}", name, level.description));
            }
        }
    }
    lines.join("\n")
}

/// Filled cells for `value` in `[min, max]` on a bar of `width` cells
fn bar_cells(value: f64, min: f64, max: f64, width: usize) -> usize {
    if max <= min {
        return 0;
    }
    let ratio = ((value - min) / (max - min)).clamp(0.0, 1.0);
    (ratio * width as f64).round() as usize
}

fn render_bar(filled: usize, width: usize, marker: Option<usize>) -> String {
    (0..width)
        .map(|i| match (i < filled, marker == Some(i)) {
            (_, true) => '│',
            (true, false) => '█',
            (false, false) => '░',
        })
        .collect()
}

/// Course summary: counts, averages, per-indicator bars and top students
pub fn format_dashboard(
    stats: &DashboardStats,
    scale: &GradingScale,
    course_label: &str,
    use_colors: bool,
) -> String {
    if stats.evaluation_count == 0 {
        return format!("No evaluations found for {}.", course_label);
    }

    let mut lines = Vec::new();
    let title = format!("Dashboard: {}", course_label);
    lines.push(if use_colors {
        title.bold().to_string()
    } else {
        title
    });
    lines.push(format!("  Evaluations:   {}", stats.evaluation_count));
    lines.push(format!(
        "  Passing:       {}/{}",
        stats.passing_count, stats.evaluation_count
    ));
    lines.push(format!(
        "  Average grade: {}",
        colored_grade(stats.average_grade, scale, use_colors)
    ));
    lines.push(format!(
        "  Average score: {:.2} / 4",
        stats.overall_average_score
    ));

    lines.push(String::new());
    lines.push("Indicator averages".to_string());
    let title_width = stats
        .indicator_averages
        .iter()
        .map(|a| a.title.chars().count())
        .max()
        .unwrap_or(0)
        .min(40);
    for avg in &stats.indicator_averages {
        let filled = bar_cells(avg.average, 0.0, 4.0, BAR_WIDTH / 2);
        let title = truncate_text(&avg.title, title_width);
        let padding = title_width.saturating_sub(title.chars().count());
        lines.push(format!(
            "  {}{}  {}  {:.2}",
            title,
            " ".repeat(padding),
            render_bar(filled, BAR_WIDTH / 2, None),
            avg.average
        ));
    }

    if !stats.top_students.is_empty() {
        lines.push(String::new());
        lines.push("Top students".to_string());
        for (idx, student) in stats.top_students.iter().enumerate() {
            lines.push(format!(
                "  {}. {}  {}",
                idx + 1,
                student.student_name,
                colored_grade(student.final_grade, scale, use_colors)
            ));
        }
    }

    lines.join("\n")
}

/// Horizontal bar per student on the grade range, with the passing grade
/// marked by `│`
pub fn format_grade_chart(rows: &[StudentGrade], scale: &GradingScale, use_colors: bool) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let name_width = rows
        .iter()
        .map(|r| r.student_name.chars().count())
        .max()
        .unwrap_or(0)
        .min(30);
    let marker = bar_cells(scale.passing_grade, scale.min_grade, scale.max_grade, BAR_WIDTH)
        .min(BAR_WIDTH - 1);

    rows.iter()
        .map(|row| {
            let name = truncate_text(&row.student_name, name_width);
            let padding = name_width.saturating_sub(name.chars().count());
            let filled = bar_cells(row.final_grade, scale.min_grade, scale.max_grade, BAR_WIDTH);
            let bar = render_bar(filled, BAR_WIDTH, Some(marker));
            let bar = if !use_colors {
                bar
            } else if scale.is_passing(row.final_grade) {
                bar.green().to_string()
            } else {
                bar.red().to_string()
            };
            format!(
                "{}{}  {}  {}",
                name,
                " ".repeat(padding),
                bar,
                format_grade(row.final_grade)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
