pub mod stats;

pub use stats::{
    compute_stats, grade_chart, CourseFilter, DashboardStats, IndicatorAverage, StudentGrade,
};
