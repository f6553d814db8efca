use std::collections::HashMap;

use crate::evaluation::EvaluationRecord;
use crate::rubric::Rubric;
use crate::scoring::GradingScale;

const TOP_STUDENT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseFilter {
    All,
    Course(String),
}

impl CourseFilter {
    /// `None` or "all" (any case) selects every course
    pub fn from_option(course: Option<&str>) -> Self {
        match course {
            None => CourseFilter::All,
            Some(c) if c.eq_ignore_ascii_case("all") => CourseFilter::All,
            Some(c) => CourseFilter::Course(c.to_string()),
        }
    }

    pub fn matches(&self, record: &EvaluationRecord) -> bool {
        match self {
            CourseFilter::All => true,
            CourseFilter::Course(c) => record.course() == c,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorAverage {
    pub indicator_id: String,
    pub title: String,
    /// Mean awarded points, 0.0 when no record scored the indicator
    pub average: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentGrade {
    pub student_name: String,
    pub final_grade: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub evaluation_count: usize,
    pub indicator_averages: Vec<IndicatorAverage>,
    /// Mean points per scored indicator across all records
    pub overall_average_score: f64,
    pub average_grade: f64,
    pub passing_count: usize,
    /// Best grade per student, highest first
    pub top_students: Vec<StudentGrade>,
}

/// Aggregate saved evaluations for the dashboard.
pub fn compute_stats(
    records: &[EvaluationRecord],
    rubric: &Rubric,
    scale: &GradingScale,
    filter: &CourseFilter,
) -> DashboardStats {
    let filtered: Vec<&EvaluationRecord> = records.iter().filter(|r| filter.matches(r)).collect();

    let mut sums: HashMap<&str, (u32, usize)> = rubric.ids().map(|id| (id, (0, 0))).collect();
    for record in &filtered {
        for (id, points) in record.scores().iter() {
            if let Some(entry) = sums.get_mut(id) {
                entry.0 += u32::from(points.value());
                entry.1 += 1;
            }
        }
    }

    let indicator_averages: Vec<IndicatorAverage> = rubric
        .indicators()
        .iter()
        .map(|indicator| {
            let (sum, count) = sums.get(indicator.id.as_str()).copied().unwrap_or((0, 0));
            IndicatorAverage {
                indicator_id: indicator.id.clone(),
                title: indicator.title.clone(),
                average: if count > 0 {
                    f64::from(sum) / count as f64
                } else {
                    0.0
                },
                count,
            }
        })
        .collect();

    let total_count: usize = indicator_averages.iter().map(|a| a.count).sum();
    let overall_average_score = if total_count > 0 {
        indicator_averages
            .iter()
            .map(|a| a.average * a.count as f64)
            .sum::<f64>()
            / total_count as f64
    } else {
        0.0
    };

    let average_grade = if filtered.is_empty() {
        0.0
    } else {
        filtered.iter().map(|r| r.final_grade()).sum::<f64>() / filtered.len() as f64
    };

    let passing_count = filtered
        .iter()
        .filter(|r| scale.is_passing(r.final_grade()))
        .count();

    DashboardStats {
        evaluation_count: filtered.len(),
        indicator_averages,
        overall_average_score,
        average_grade,
        passing_count,
        top_students: top_students(&filtered),
    }
}

fn top_students(records: &[&EvaluationRecord]) -> Vec<StudentGrade> {
    let mut best: HashMap<&str, f64> = HashMap::new();
    for record in records {
        let entry = best.entry(record.student_name()).or_insert(f64::MIN);
        if record.final_grade() > *entry {
            *entry = record.final_grade();
        }
    }

    let mut students: Vec<StudentGrade> = best
        .into_iter()
        .map(|(name, grade)| StudentGrade {
            student_name: name.to_string(),
            final_grade: grade,
        })
        .collect();

    // Highest grade first, then alphabetical for ties
    students.sort_by(|a, b| {
        b.final_grade
            .partial_cmp(&a.final_grade)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.student_name.cmp(&b.student_name))
    });
    students.truncate(TOP_STUDENT_LIMIT);
    students
}

/// One bar per evaluation, sorted by student name
pub fn grade_chart(records: &[EvaluationRecord], filter: &CourseFilter) -> Vec<StudentGrade> {
    let mut rows: Vec<StudentGrade> = records
        .iter()
        .filter(|r| filter.matches(r))
        .map(|r| StudentGrade {
            student_name: r.student_name().to_string(),
            final_grade: r.final_grade(),
        })
        .collect();
    rows.sort_by(|a, b| a.student_name.cmp(&b.student_name));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{BuildMode, RecordBuilder, RecordDraft};
    use crate::rubric::{reference_rubric, ScorePoints, ScoreSet, REFERENCE_COURSES};
    use crate::scoring::GradingConfig;

    fn scale() -> GradingScale {
        GradingScale::for_rubric(13, &GradingConfig::default())
    }

    fn record(student: &str, course: &str, points: u8) -> EvaluationRecord {
        let courses: Vec<String> = REFERENCE_COURSES.iter().map(|c| c.to_string()).collect();
        let builder = RecordBuilder::new(&reference_rubric(), &courses, scale());
        let points = ScorePoints::new(points).unwrap();
        let scores: ScoreSet = reference_rubric()
            .ids()
            .map(|id| (id.to_string(), points))
            .collect();
        builder
            .build(
                RecordDraft {
                    student_name: student.to_string(),
                    course: course.to_string(),
                    scores,
                    ..RecordDraft::default()
                },
                BuildMode::Draft,
            )
            .unwrap()
    }

    #[test]
    fn test_empty_stats() {
        let stats = compute_stats(&[], &reference_rubric(), &scale(), &CourseFilter::All);
        assert_eq!(stats.evaluation_count, 0);
        assert_eq!(stats.overall_average_score, 0.0);
        assert_eq!(stats.average_grade, 0.0);
        assert_eq!(stats.indicator_averages.len(), 13);
        assert!(stats.indicator_averages.iter().all(|a| a.average == 0.0 && a.count == 0));
        assert!(stats.top_students.is_empty());
    }

    #[test]
    fn test_averages_and_passing() {
        let records = vec![
            record("Ana", "3ºA", 4),      // 52 -> 7.0
            record("Benjamín", "3ºA", 1), // 13 -> 2.0
        ];
        let stats = compute_stats(&records, &reference_rubric(), &scale(), &CourseFilter::All);

        assert_eq!(stats.evaluation_count, 2);
        assert_eq!(stats.indicator_averages[0].average, 2.5);
        assert_eq!(stats.indicator_averages[0].count, 2);
        assert_eq!(stats.overall_average_score, 2.5);
        assert_eq!(stats.average_grade, 4.5);
        assert_eq!(stats.passing_count, 1);
    }

    #[test]
    fn test_course_filter() {
        let records = vec![
            record("Ana", "3ºA", 4),
            record("Benjamín", "3ºB", 1),
            record("Carla", "3ºB", 3),
        ];
        let filter = CourseFilter::from_option(Some("3ºB"));
        let stats = compute_stats(&records, &reference_rubric(), &scale(), &filter);

        assert_eq!(stats.evaluation_count, 2);
        assert_eq!(stats.overall_average_score, 2.0);
        assert!(stats.top_students.iter().all(|s| s.student_name != "Ana"));

        assert_eq!(CourseFilter::from_option(Some("ALL")), CourseFilter::All);
        assert_eq!(CourseFilter::from_option(None), CourseFilter::All);
    }

    #[test]
    fn test_top_students_use_best_grade() {
        let records = vec![
            record("Ana", "3ºA", 2),
            record("Ana", "3ºA", 4),
            record("Benjamín", "3ºA", 3),
            record("Carla", "3ºA", 1),
            record("Diego", "3ºA", 2),
            record("Elena", "3ºA", 2),
            record("Franco", "3ºA", 1),
        ];
        let stats = compute_stats(&records, &reference_rubric(), &scale(), &CourseFilter::All);

        assert_eq!(stats.top_students.len(), 5);
        assert_eq!(stats.top_students[0].student_name, "Ana");
        assert_eq!(stats.top_students[0].final_grade, 7.0);
        assert_eq!(stats.top_students[1].student_name, "Benjamín");
        // Ties sorted alphabetically: Diego and Elena before Carla and Franco
        assert_eq!(stats.top_students[2].student_name, "Diego");
        assert_eq!(stats.top_students[3].student_name, "Elena");
        assert_eq!(stats.top_students[4].student_name, "Carla");
    }

    #[test]
    fn test_grade_chart_sorted_by_name() {
        let records = vec![
            record("Zoe", "3ºA", 4),
            record("Ana", "3ºA", 1),
            record("Marco", "3ºC", 3),
        ];
        let rows = grade_chart(&records, &CourseFilter::All);
        let names: Vec<&str> = rows.iter().map(|r| r.student_name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Marco", "Zoe"]);

        let rows = grade_chart(&records, &CourseFilter::Course("3ºC".to_string()));
        assert_eq!(rows.len(), 1);
    }
}
