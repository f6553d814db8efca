use std::fmt::Write;

use crate::rubric::{Rubric, ScoreSet};

/// System instruction and user message sent to the language model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system_instruction: String,
    pub user_prompt: String,
}

/// Build the feedback prompt for one student.
///
/// Indicators are listed in rubric order; unscored indicators are skipped.
pub fn build_prompt(
    student_name: &str,
    scores: &ScoreSet,
    rubric: &Rubric,
    institution: Option<&str>,
    language: &str,
) -> Prompt {
    let evaluator = match institution {
        Some(name) => format!("for {}", name),
        None => "for a technical high school".to_string(),
    };
    let system_instruction = format!(
        "You are an AI assistant specialised in pedagogical assessment {}. \
You are evaluating a student's dual-training presentation. \
Your task is to write constructive, personalised and professional feedback.",
        evaluator
    );

    let mut details = String::new();
    let _ = writeln!(details, "Student name: {}", student_name);
    let _ = writeln!(details);
    let _ = writeln!(details, "--- RUBRIC AND AWARDED SCORES ---");

    for indicator in rubric.indicators() {
        let Some(points) = scores.get(&indicator.id) else {
            continue;
        };
        let achieved = indicator
            .level(points)
            .map(|l| l.description.as_str())
            .unwrap_or("Unknown description");

        let _ = writeln!(details);
        let _ = writeln!(details, "Indicator: {}", indicator.title);
        let _ = writeln!(
            details,
            "Awarded score: {} ({})",
            points,
            indicator.level_name(points)
        );
        let _ = writeln!(details, "Achieved level description: {}", achieved);
        let _ = writeln!(details, "Rubric levels:");
        for level in &indicator.levels {
            let _ = writeln!(
                details,
                "  - {} ({} pt): {}",
                level.level_name, level.points, level.description
            );
        }
    }

    let user_prompt = format!(
        "{details}
--- FEEDBACK INSTRUCTIONS ---
Based on the rubric and scores above, write feedback for the student in {language}. The feedback must:
1. Open with a warm, personalised greeting addressed to {student_name}.
2. Identify the key strengths (2-3 indicators with high scores), briefly explaining what the student did well with reference to the achieved level description.
3. Tactfully identify the areas for improvement (2-3 indicators with the lowest scores), describing what needs development based on the achieved level and the higher levels not yet reached.
4. Give 1-2 specific, actionable recommendations for each area for improvement.
5. Include a general recognition of the student's effort and participation.
6. Offer 1-2 general tips for future presentations.
7. Close with a note of encouragement and motivation.
Keep a professional, empathetic, encouraging and constructive tone.
Write coherent, well-structured prose. Avoid heavy markdown: plain paragraphs and simple lists only.
"
    );

    Prompt {
        system_instruction,
        user_prompt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::{reference_rubric, ScorePoints};

    #[test]
    fn test_prompt_lists_scored_indicators_in_rubric_order() {
        let rubric = reference_rubric();
        let mut scores = ScoreSet::new();
        scores.set("indicador9", ScorePoints::new(4).unwrap());
        scores.set("indicador1", ScorePoints::new(2).unwrap());

        let prompt = build_prompt("Diego", &scores, &rubric, None, "Spanish");

        let first = prompt.user_prompt.find("Presentación personal").unwrap();
        let ninth = prompt.user_prompt.find("Expresión oral").unwrap();
        assert!(first < ninth);
        assert!(prompt.user_prompt.contains("Awarded score: 2 (Desarrollo Incipiente)"));
        assert!(prompt.user_prompt.contains("Awarded score: 4 (Desarrollo Avanzado)"));
        assert!(!prompt.user_prompt.contains("Normas de Seguridad"));
    }

    #[test]
    fn test_prompt_names_student_language_and_institution() {
        let rubric = reference_rubric();
        let prompt = build_prompt(
            "Valentina",
            &ScoreSet::new(),
            &rubric,
            Some("Liceo Industrial de Recoleta"),
            "Spanish",
        );
        assert!(prompt.user_prompt.starts_with("Student name: Valentina"));
        assert!(prompt.user_prompt.contains("in Spanish"));
        assert!(prompt.user_prompt.contains("addressed to Valentina"));
        assert!(prompt.system_instruction.contains("Liceo Industrial de Recoleta"));
    }

    #[test]
    fn test_prompt_includes_all_levels_of_scored_indicator() {
        let rubric = reference_rubric();
        let mut scores = ScoreSet::new();
        scores.set("indicador11", ScorePoints::new(3).unwrap());

        let prompt = build_prompt("Ana", &scores, &rubric, None, "Spanish");
        assert!(prompt.user_prompt.contains("Desarrollo Débil (1 pt): Menos de 6 minutos"));
        assert!(prompt
            .user_prompt
            .contains("Desarrollo Avanzado (4 pt): 10-12 minutos, profundidad en todos los elementos"));
    }
}
