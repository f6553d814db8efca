use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use rubric_grader::config::Config;
use rubric_grader::dashboard::{compute_stats, grade_chart, CourseFilter};
use rubric_grader::evaluation::{RecordBuilder, ValidationError};
use rubric_grader::feedback::GeminiClient;
use rubric_grader::output::{self, ReportFormat};
use rubric_grader::rubric::{parse_score_assignment, ScorePoints, ScoreSet};
use rubric_grader::session::{EvaluationSession, SessionError};
use rubric_grader::store::{EvaluationStore, JsonFileStore, StoredEvaluation};

const EXIT_SUCCESS: i32 = 0;
const EXIT_VALIDATION: i32 = 1;
const EXIT_FEEDBACK: i32 = 2;
const EXIT_STORE: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a config file interactively
    Init,
    /// Print the active rubric
    Rubric,
    /// Compute the grade for a total or a set of scores
    Grade {
        /// Raw total score
        #[arg(long, conflicts_with_all = ["scores", "score"])]
        total: Option<u32>,
        /// YAML or JSON file mapping indicator ids to points
        #[arg(long)]
        scores: Option<PathBuf>,
        /// Single score as ID=POINTS (repeatable)
        #[arg(long = "score", value_name = "ID=POINTS")]
        score: Vec<String>,
    },
    /// Grade one student, optionally generating feedback, saving and exporting
    Evaluate {
        #[arg(long)]
        student: String,
        #[arg(long)]
        course: String,
        /// YAML or JSON file mapping indicator ids to points
        #[arg(long)]
        scores: Option<PathBuf>,
        /// Single score as ID=POINTS (repeatable)
        #[arg(long = "score", value_name = "ID=POINTS")]
        score: Vec<String>,
        /// Generate feedback with the configured model
        #[arg(long, conflicts_with = "feedback_file")]
        feedback: bool,
        /// Use feedback text from a file instead of generating it
        #[arg(long)]
        feedback_file: Option<PathBuf>,
        /// Save the evaluation to the store
        #[arg(long)]
        save: bool,
        /// Write a report to this path
        #[arg(long)]
        report: Option<PathBuf>,
        /// Report format (defaults from the report file extension)
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
    },
    /// List saved evaluations (newest first)
    List {
        #[arg(long)]
        course: Option<String>,
        #[arg(long)]
        student: Option<String>,
        /// Tab-separated output for scripting
        #[arg(long)]
        tsv: bool,
    },
    /// Summary statistics over saved evaluations
    Dashboard {
        /// Course label, or "all"
        #[arg(long)]
        course: Option<String>,
    },
    /// Write the report for a saved evaluation
    Export {
        /// Evaluation id (or a unique prefix)
        id: String,
        #[arg(long, short)]
        output: PathBuf,
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
    },
    /// Delete a saved evaluation
    Delete {
        /// Evaluation id (or a unique prefix)
        id: String,
    },
    /// Delete every saved evaluation
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "rubric-grader")]
#[command(about = "Rubric-based presentation grading CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/rubric-grader/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// RUST_LOG wins; otherwise `-v` turns on debug output for this crate
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "rubric_grader=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    rubric_grader::install_crypto_provider();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.map(PathBuf::from);

    if let Commands::Init = cli.command {
        if let Err(e) = rubric_grader::config::init::run_init_wizard(config_path) {
            eprintln!("Init failed: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    let config = match rubric_grader::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate config at startup
    if let Err(errors) = rubric_grader::scoring::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let use_colors = output::should_use_colors();
    let code = match cli.command {
        Commands::Init => EXIT_SUCCESS,
        Commands::Rubric => {
            println!("{}", output::format_rubric(&config.rubric(), use_colors));
            EXIT_SUCCESS
        }
        Commands::Grade {
            total,
            scores,
            score,
        } => run_grade(&config, total, scores.as_deref(), &score, use_colors),
        Commands::Evaluate {
            student,
            course,
            scores,
            score,
            feedback,
            feedback_file,
            save,
            report,
            format,
        } => {
            let options = EvaluateOptions {
                student,
                course,
                scores_file: scores,
                score_args: score,
                generate_feedback: feedback,
                feedback_file,
                save,
                report,
                format,
            };
            run_evaluate(&config, options, use_colors).await
        }
        Commands::List {
            course,
            student,
            tsv,
        } => run_list(&config, course.as_deref(), student.as_deref(), tsv, use_colors),
        Commands::Dashboard { course } => run_dashboard(&config, course.as_deref(), use_colors),
        Commands::Export { id, output, format } => run_export(&config, &id, &output, format),
        Commands::Delete { id } => run_delete(&config, &id),
        Commands::Clear { yes } => run_clear(&config, yes),
    };

    std::process::exit(code);
}

/// Merge a scores file with `ID=POINTS` arguments; arguments win
fn collect_scores(file: Option<&Path>, assignments: &[String]) -> anyhow::Result<ScoreSet> {
    let mut scores = match file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read scores file {}", path.display()))?;
            serde_saphyr::from_str::<ScoreSet>(&content)
                .with_context(|| format!("Invalid scores file {}", path.display()))?
        }
        None => ScoreSet::new(),
    };
    for assignment in assignments {
        let (id, points) = parse_score_assignment(assignment)?;
        scores.set(id, points);
    }
    Ok(scores)
}

fn run_grade(
    config: &Config,
    total: Option<u32>,
    scores_file: Option<&Path>,
    score_args: &[String],
    use_colors: bool,
) -> i32 {
    let builder = RecordBuilder::from_config(config);
    let engine = builder.engine();

    let result = if let Some(total) = total {
        rubric_grader::scoring::GradeResult {
            total_score: total,
            final_grade: engine.compute_final_grade(total),
        }
    } else {
        let scores = match collect_scores(scores_file, score_args) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{:#}", e);
                return EXIT_VALIDATION;
            }
        };
        let rubric = config.rubric();
        if let Some((id, _)) = scores.iter().find(|(id, _)| rubric.get(id).is_none()) {
            eprintln!("Unknown indicator '{}'", id);
            return EXIT_VALIDATION;
        }
        if scores.scored_count() < rubric.len() {
            eprintln!(
                "Note: {} of {} indicators scored",
                scores.scored_count(),
                rubric.len()
            );
        }
        engine.grade(&scores)
    };

    println!(
        "{}",
        output::format_grade_summary(&result, engine.scale(), use_colors)
    );
    EXIT_SUCCESS
}

struct EvaluateOptions {
    student: String,
    course: String,
    scores_file: Option<PathBuf>,
    score_args: Vec<String>,
    generate_feedback: bool,
    feedback_file: Option<PathBuf>,
    save: bool,
    report: Option<PathBuf>,
    format: Option<ReportFormat>,
}

async fn run_evaluate(config: &Config, options: EvaluateOptions, use_colors: bool) -> i32 {
    let rubric = config.rubric();
    let builder = RecordBuilder::from_config(config);
    let scale = *builder.engine().scale();
    let mut session = EvaluationSession::new(builder, rubric);
    session.set_student_name(options.student);
    session.set_course(options.course);

    let scores = match collect_scores(options.scores_file.as_deref(), &options.score_args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{:#}", e);
            return EXIT_VALIDATION;
        }
    };
    let assigned: Vec<(String, ScorePoints)> = scores
        .iter()
        .map(|(id, points)| (id.to_string(), points))
        .collect();
    for (id, points) in assigned {
        if let Err(e) = session.set_score(&id, points) {
            eprintln!("{}", e);
            return EXIT_VALIDATION;
        }
    }

    let grade = match session.calculate_grade() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("{}", e);
            return EXIT_VALIDATION;
        }
    };
    println!("{}", output::format_grade_summary(&grade, &scale, use_colors));

    if let Some(path) = &options.feedback_file {
        match std::fs::read_to_string(path) {
            Ok(text) => session.set_feedback(text.trim()),
            Err(e) => {
                eprintln!("Failed to read feedback file {}: {}", path.display(), e);
                return EXIT_VALIDATION;
            }
        }
    } else if options.generate_feedback {
        let feedback_config = config.feedback();
        let api_key = match rubric_grader::credentials::resolve_api_key(
            feedback_config.api_key_env(),
        ) {
            Ok(k) => k,
            Err(e) => {
                eprintln!("{}", e);
                return EXIT_FEEDBACK;
            }
        };
        let client = match GeminiClient::new(api_key, feedback_config, config.institution.clone())
        {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to create feedback client: {:#}", e);
                return EXIT_FEEDBACK;
            }
        };
        match session.generate_feedback(&client).await {
            Ok(_) => {}
            Err(SessionError::Validation(e)) => {
                eprintln!("{}", e);
                return EXIT_VALIDATION;
            }
            Err(SessionError::Feedback(e)) => {
                eprintln!("{}", e);
                return EXIT_FEEDBACK;
            }
        }
    }

    if let Some(feedback) = session.feedback() {
        println!();
        println!("{}", feedback.text);
    }

    if !options.save && options.report.is_none() {
        return EXIT_SUCCESS;
    }

    let record = if options.save {
        let mut store = JsonFileStore::new(config.store_path());
        match session.save(&mut store) {
            Ok(record) => {
                println!();
                println!("Saved evaluation {}", record.id());
                record
            }
            Err(e) => {
                eprintln!("{:#}", e);
                return if e.downcast_ref::<ValidationError>().is_some() {
                    EXIT_VALIDATION
                } else {
                    EXIT_STORE
                };
            }
        }
    } else {
        match session.finalize() {
            Ok(record) => record,
            Err(e) => {
                eprintln!("{}", e);
                return EXIT_VALIDATION;
            }
        }
    };

    if let Some(path) = &options.report {
        let format = options
            .format
            .unwrap_or_else(|| ReportFormat::from_path(path));
        if let Err(e) = output::export_report(
            path,
            &record,
            session.rubric(),
            config.institution.as_deref(),
            format,
        ) {
            eprintln!("{:#}", e);
            return EXIT_STORE;
        }
        println!("Report written to {}", path.display());
    }

    EXIT_SUCCESS
}

fn run_list(
    config: &Config,
    course: Option<&str>,
    student: Option<&str>,
    tsv: bool,
    use_colors: bool,
) -> i32 {
    let store = JsonFileStore::new(config.store_path());
    let stored = match student {
        Some(name) => store.list_by_student(name),
        None => store.list_all(),
    };
    let stored = match stored {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{:#}", e);
            return EXIT_STORE;
        }
    };

    let filter = CourseFilter::from_option(course);
    let records: Vec<_> = stored
        .into_iter()
        .map(|s| s.record)
        .filter(|r| filter.matches(r))
        .collect();

    if tsv {
        let out = output::format_tsv(&records);
        if !out.is_empty() {
            println!("{}", out);
        }
    } else {
        println!(
            "{}",
            output::format_record_table(&records, &config.grading_scale(), use_colors)
        );
    }
    EXIT_SUCCESS
}

fn run_dashboard(config: &Config, course: Option<&str>, use_colors: bool) -> i32 {
    let store = JsonFileStore::new(config.store_path());
    let records: Vec<_> = match store.list_all() {
        Ok(s) => s.into_iter().map(|s| s.record).collect(),
        Err(e) => {
            eprintln!("{:#}", e);
            return EXIT_STORE;
        }
    };

    let filter = CourseFilter::from_option(course);
    let label = match &filter {
        CourseFilter::All => "all courses".to_string(),
        CourseFilter::Course(c) => c.clone(),
    };
    let scale = config.grading_scale();
    let stats = compute_stats(&records, &config.rubric(), &scale, &filter);

    println!(
        "{}",
        output::format_dashboard(&stats, &scale, &label, use_colors)
    );
    let chart = output::format_grade_chart(&grade_chart(&records, &filter), &scale, use_colors);
    if !chart.is_empty() {
        println!();
        println!("{}", chart);
    }
    EXIT_SUCCESS
}

/// Find a saved evaluation by exact id, or by a prefix matching exactly one
fn find_evaluation(store: &JsonFileStore, id: &str) -> anyhow::Result<StoredEvaluation> {
    if let Some(found) = store.get(id)? {
        return Ok(found);
    }
    let mut matches: Vec<StoredEvaluation> = store
        .list_all()?
        .into_iter()
        .filter(|e| e.record.id().starts_with(id))
        .collect();
    match matches.len() {
        0 => anyhow::bail!("No evaluation with id '{}'", id),
        1 => Ok(matches.remove(0)),
        n => anyhow::bail!("Id prefix '{}' matches {} evaluations", id, n),
    }
}

fn run_export(config: &Config, id: &str, path: &Path, format: Option<ReportFormat>) -> i32 {
    let store = JsonFileStore::new(config.store_path());
    let stored = match find_evaluation(&store, id) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{:#}", e);
            return EXIT_STORE;
        }
    };

    let format = format.unwrap_or_else(|| ReportFormat::from_path(path));
    if let Err(e) = output::export_report(
        path,
        &stored.record,
        &config.rubric(),
        config.institution.as_deref(),
        format,
    ) {
        eprintln!("{:#}", e);
        return EXIT_STORE;
    }
    println!("Report written to {}", path.display());
    EXIT_SUCCESS
}

fn run_delete(config: &Config, id: &str) -> i32 {
    let mut store = JsonFileStore::new(config.store_path());
    let result = find_evaluation(&store, id).and_then(|found| {
        store.delete(found.record.id())?;
        Ok(found)
    });
    match result {
        Ok(found) => {
            println!(
                "Deleted evaluation {} ({})",
                found.record.id(),
                found.record.student_name()
            );
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("{:#}", e);
            EXIT_STORE
        }
    }
}

fn run_clear(config: &Config, yes: bool) -> i32 {
    let mut store = JsonFileStore::new(config.store_path());
    if !yes {
        match confirm("Delete every saved evaluation? [y/N]: ") {
            Ok(true) => {}
            Ok(false) => {
                println!("Aborted.");
                return EXIT_SUCCESS;
            }
            Err(e) => {
                eprintln!("{:#}", e);
                return EXIT_STORE;
            }
        }
    }
    match store.delete_all() {
        Ok(count) => {
            println!("Deleted {} evaluations", count);
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("{:#}", e);
            EXIT_STORE
        }
    }
}

fn confirm(message: &str) -> anyhow::Result<bool> {
    use std::io::{BufRead, Write};
    print!("{}", message);
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
