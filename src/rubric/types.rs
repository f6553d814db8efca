use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Points awarded for one indicator. Always one of 1, 2, 3 or 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ScorePoints(u8);

impl ScorePoints {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(points: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&points).then_some(Self(points))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// All valid point values, lowest first
    pub fn all() -> impl Iterator<Item = ScorePoints> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidScore(pub u8);

impl fmt::Display for InvalidScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "score {} is out of range (expected {}-{})",
            self.0,
            ScorePoints::MIN,
            ScorePoints::MAX
        )
    }
}

impl std::error::Error for InvalidScore {}

impl TryFrom<u8> for ScorePoints {
    type Error = InvalidScore;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        ScorePoints::new(value).ok_or(InvalidScore(value))
    }
}

impl From<ScorePoints> for u8 {
    fn from(points: ScorePoints) -> u8 {
        points.0
    }
}

impl fmt::Display for ScorePoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One achievement level of an indicator
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoreLevel {
    pub points: ScorePoints,
    pub level_name: String,
    pub description: String,
}

/// A scored dimension of the rubric, with its four achievement levels
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RubricIndicator {
    pub id: String,
    pub title: String,
    pub levels: Vec<ScoreLevel>,
}

impl RubricIndicator {
    /// Find the level matching the awarded points
    pub fn level(&self, points: ScorePoints) -> Option<&ScoreLevel> {
        self.levels.iter().find(|l| l.points == points)
    }

    /// Level name for the awarded points, or "Unknown level" if the rubric lacks it
    pub fn level_name(&self, points: ScorePoints) -> &str {
        self.level(points)
            .map(|l| l.level_name.as_str())
            .unwrap_or("Unknown level")
    }
}

/// The active rubric: an ordered, read-only list of indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct Rubric {
    indicators: Vec<RubricIndicator>,
}

impl Rubric {
    pub fn new(indicators: Vec<RubricIndicator>) -> Self {
        Self { indicators }
    }

    pub fn indicators(&self) -> &[RubricIndicator] {
        &self.indicators
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RubricIndicator> {
        self.indicators.iter().find(|i| i.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.indicators.iter().map(|i| i.id.as_str())
    }
}

/// Awarded points per indicator id. Absent keys are not yet scored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSet(BTreeMap<String, ScorePoints>);

impl ScoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Award points for an indicator, replacing any previous value
    pub fn set(&mut self, indicator_id: impl Into<String>, points: ScorePoints) {
        self.0.insert(indicator_id.into(), points);
    }

    /// Remove the score for an indicator.
    /// Returns true if the indicator had been scored.
    pub fn clear(&mut self, indicator_id: &str) -> bool {
        self.0.remove(indicator_id).is_some()
    }

    pub fn get(&self, indicator_id: &str) -> Option<ScorePoints> {
        self.0.get(indicator_id).copied()
    }

    pub fn contains(&self, indicator_id: &str) -> bool {
        self.0.contains_key(indicator_id)
    }

    /// Number of indicators with a defined score
    pub fn scored_count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ScorePoints)> {
        self.0.iter().map(|(id, points)| (id.as_str(), *points))
    }
}

impl FromIterator<(String, ScorePoints)> for ScoreSet {
    fn from_iter<T: IntoIterator<Item = (String, ScorePoints)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parse a command-line score assignment of the form `indicator=points`.
pub fn parse_score_assignment(s: &str) -> Result<(String, ScorePoints)> {
    let Some((id, points)) = s.split_once('=') else {
        bail!("expected ID=POINTS, got '{}'", s);
    };
    let id = id.trim();
    if id.is_empty() {
        bail!("indicator id is empty in '{}'", s);
    }
    let raw: u8 = points
        .trim()
        .parse()
        .with_context(|| format!("invalid points in '{}'", s))?;
    let points = ScorePoints::try_from(raw)?;
    Ok((id.to_string(), points))
}
