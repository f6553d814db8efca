use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_config_path, Config, StoreConfig};
use crate::feedback::config::{DEFAULT_API_KEY_ENV, DEFAULT_LANGUAGE, DEFAULT_MODEL};
use crate::feedback::FeedbackConfig;
use crate::rubric::REFERENCE_COURSES;
use crate::scoring::{
    validate_config, GradingConfig, DEFAULT_MAX_GRADE, DEFAULT_MIN_GRADE, DEFAULT_PASSING_GRADE,
    DEFAULT_PASSING_RATIO,
};
use crate::store::get_store_path;

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes" || input == "s" || input == "si" || input == "sí")
    }
}

/// Keep prompting until the input parses as a number accepted by `check`.
fn prompt_number(message: &str, default: f64, check: impl Fn(f64) -> Result<(), String>) -> Result<f64> {
    loop {
        let input = prompt_with_default(message, &default.to_string())?;
        match parse_number(&input) {
            Ok(v) => match check(v) {
                Ok(()) => return Ok(v),
                Err(e) => println!("  Invalid: {}. Try again.", e),
            },
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    }
}

/// Parse a finite number; "nan" and "inf" parse as f64 but are rejected
fn parse_number(input: &str) -> Result<f64, String> {
    match input.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err("must be a finite number".to_string()),
        Err(_) => Err("must be a number".to_string()),
    }
}

/// Split a comma-separated list, dropping blanks
fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Print text with a typewriter effect, one character at a time.
fn typewriter(text: &str) {
    use std::thread;
    use std::time::Duration;
    for c in text.chars() {
        print!("{}", c);
        std::io::stdout().flush().ok();
        thread::sleep(Duration::from_millis(18));
    }
    println!();
}

fn ask_grading() -> Result<GradingConfig> {
    typewriter("Grades run from a minimum to a maximum, with a passing grade in between.");
    let min_grade = prompt_number("Minimum grade", DEFAULT_MIN_GRADE, |_| Ok(()))?;
    let max_grade = prompt_number("Maximum grade", DEFAULT_MAX_GRADE, |v| {
        if v > min_grade {
            Ok(())
        } else {
            Err(format!("must be greater than {}", min_grade))
        }
    })?;
    let passing_grade = prompt_number("Passing grade", DEFAULT_PASSING_GRADE, |v| {
        if v >= min_grade && v <= max_grade {
            Ok(())
        } else {
            Err(format!("must be between {} and {}", min_grade, max_grade))
        }
    })?;

    println!();
    typewriter("The passing ratio is the share of the maximum total score that earns the passing grade.");
    let passing_ratio = prompt_number("Passing ratio", DEFAULT_PASSING_RATIO, |v| {
        if v > 0.0 && v <= 1.0 {
            Ok(())
        } else {
            Err("must be greater than 0 and at most 1".to_string())
        }
    })?;

    Ok(GradingConfig {
        min_grade: Some(min_grade),
        passing_grade: Some(passing_grade),
        max_grade: Some(max_grade),
        passing_threshold: None,
        passing_ratio: Some(passing_ratio),
    })
}

fn ask_feedback() -> Result<FeedbackConfig> {
    typewriter("Feedback is written by a generative model. The API key is read from an environment variable.");
    let model = prompt_with_default("Model", DEFAULT_MODEL)?;
    let api_key_env = prompt_with_default("API key environment variable", DEFAULT_API_KEY_ENV)?;
    let language = prompt_with_default("Feedback language", DEFAULT_LANGUAGE)?;

    // Leave defaults unset so later releases can change them
    let keep = |value: String, default: &str| (value != default).then_some(value);
    Ok(FeedbackConfig {
        model: keep(model, DEFAULT_MODEL),
        api_key_env: keep(api_key_env, DEFAULT_API_KEY_ENV),
        language: keep(language, DEFAULT_LANGUAGE),
        ..FeedbackConfig::default()
    })
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    typewriter("Rubric Grader Configuration Wizard");
    println!("==================================");
    println!();

    // 1. Institution and courses
    let institution = prompt("Institution name (optional): ")?;
    let institution = (!institution.is_empty()).then_some(institution);

    let default_courses = REFERENCE_COURSES.join(", ");
    let courses = loop {
        let input = prompt_with_default("Courses, comma separated", &default_courses)?;
        let courses = parse_list(&input);
        if !courses.is_empty() {
            break courses;
        }
        println!("  At least one course is required.");
    };

    // 2. Grading scale
    println!();
    let grading = if prompt_yes_no("Configure the grading scale? (n accepts defaults)", false)? {
        println!();
        Some(ask_grading()?)
    } else {
        None
    };

    // 3. Feedback
    println!();
    let feedback = if prompt_yes_no("Configure feedback generation? (n accepts defaults)", false)? {
        println!();
        Some(ask_feedback()?)
    } else {
        None
    };

    // 4. Store location
    println!();
    let default_store = get_store_path();
    let store_str = prompt_with_default(
        "Where should evaluations be stored?",
        &default_store.display().to_string(),
    )?;
    let store_path = PathBuf::from(&store_str);
    let store = (store_path != default_store).then(|| StoreConfig {
        path: Some(store_path),
    });

    // 5. Config path
    let default_config_path = default_path.unwrap_or_else(get_config_path);
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 6. Write config
    let config = Config {
        institution,
        courses,
        rubric: None,
        grading,
        feedback,
        store,
    };

    if let Err(errors) = validate_config(&config) {
        anyhow::bail!("Generated config is invalid:\n  {}", errors.join("\n  "));
    }

    let yaml = serde_saphyr::to_string(&config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(&config_path, &yaml)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!();
    println!("Config written to {}", config_path.display());
    typewriter("The built-in 13-indicator rubric is active. Add a `rubric:` section to the config to replace it.");
    println!("Run `rubric-grader rubric` to review it.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("3ºA, 3ºB,,  3ºC "), vec!["3ºA", "3ºB", "3ºC"]);
        assert!(parse_list(" , ").is_empty());
    }

    #[test]
    fn test_parse_number_rejects_non_finite() {
        assert_eq!(parse_number(" 4.5 "), Ok(4.5));
        assert_eq!(parse_number("nan"), Err("must be a finite number".to_string()));
        assert_eq!(parse_number("inf"), Err("must be a finite number".to_string()));
        assert_eq!(parse_number("-infinity"), Err("must be a finite number".to_string()));
        assert_eq!(parse_number("four"), Err("must be a number".to_string()));
    }

    #[test]
    fn test_wizard_config_serializes() {
        let config = Config {
            institution: Some("Liceo Ejemplo".to_string()),
            courses: parse_list("4ºA, 4ºB"),
            rubric: None,
            grading: Some(GradingConfig {
                min_grade: Some(1.0),
                passing_grade: Some(4.0),
                max_grade: Some(7.0),
                passing_threshold: None,
                passing_ratio: Some(0.5),
            }),
            feedback: None,
            store: None,
        };
        assert!(validate_config(&config).is_ok());

        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: Config = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
