use serde::{Deserialize, Serialize};

/// Bounds every stored profile dimension is conventionally clamped to.
pub const DIMENSION_MIN: f64 = 0.0;
pub const DIMENSION_MAX: f64 = 10.0;

/// The nine personality axes measured by a completed trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Determination,
    Courage,
    Stability,
    Focus,
    Honesty,
    Kindness,
    Greed,
    Impatience,
    Manipulation,
}

impl Dimension {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::Determination,
            Self::Courage,
            Self::Stability,
            Self::Focus,
            Self::Honesty,
            Self::Kindness,
            Self::Greed,
            Self::Impatience,
            Self::Manipulation,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Determination => "determination",
            Self::Courage => "courage",
            Self::Stability => "stability",
            Self::Focus => "focus",
            Self::Honesty => "honesty",
            Self::Kindness => "kindness",
            Self::Greed => "greed",
            Self::Impatience => "impatience",
            Self::Manipulation => "manipulation",
        }
    }
}

/// Nine-dimensional personality measurement derived from one completed trial.
///
/// A profile is produced fresh per session and never mutated afterwards;
/// scoring code builds deltas with the same shape and folds them together
/// before handing the final, clamped profile downstream.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonalityProfile {
    pub determination: f64,
    pub courage: f64,
    pub stability: f64,
    pub focus: f64,
    pub honesty: f64,
    pub kindness: f64,
    pub greed: f64,
    pub impatience: f64,
    pub manipulation: f64,
}

impl PersonalityProfile {
    pub const fn zero() -> Self {
        Self::splat(0.0)
    }

    /// Baseline profile sitting at the midpoint of every axis.
    pub const fn neutral() -> Self {
        Self::splat(5.0)
    }

    pub const fn splat(value: f64) -> Self {
        Self {
            determination: value,
            courage: value,
            stability: value,
            focus: value,
            honesty: value,
            kindness: value,
            greed: value,
            impatience: value,
            manipulation: value,
        }
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Determination => self.determination,
            Dimension::Courage => self.courage,
            Dimension::Stability => self.stability,
            Dimension::Focus => self.focus,
            Dimension::Honesty => self.honesty,
            Dimension::Kindness => self.kindness,
            Dimension::Greed => self.greed,
            Dimension::Impatience => self.impatience,
            Dimension::Manipulation => self.manipulation,
        }
    }

    pub fn set(&mut self, dimension: Dimension, value: f64) {
        match dimension {
            Dimension::Determination => self.determination = value,
            Dimension::Courage => self.courage = value,
            Dimension::Stability => self.stability = value,
            Dimension::Focus => self.focus = value,
            Dimension::Honesty => self.honesty = value,
            Dimension::Kindness => self.kindness = value,
            Dimension::Greed => self.greed = value,
            Dimension::Impatience => self.impatience = value,
            Dimension::Manipulation => self.manipulation = value,
        }
    }

    pub fn nudge(&mut self, dimension: Dimension, delta: f64) {
        self.set(dimension, self.get(dimension) + delta);
    }

    /// Component-wise accumulation of another profile-shaped delta.
    pub fn accumulate(&mut self, delta: &Self) {
        for dimension in Dimension::ordered() {
            self.nudge(dimension, delta.get(dimension));
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        let mut scaled = *self;
        for dimension in Dimension::ordered() {
            scaled.set(dimension, self.get(dimension) * factor);
        }
        scaled
    }

    /// Copy with every dimension clamped into the conventional [0, 10] range.
    pub fn clamped(&self) -> Self {
        let mut clamped = *self;
        for dimension in Dimension::ordered() {
            clamped.set(
                dimension,
                self.get(dimension).clamp(DIMENSION_MIN, DIMENSION_MAX),
            );
        }
        clamped
    }

    /// Euclidean distance across all nine dimensions.
    pub fn distance(&self, other: &Self) -> f64 {
        Dimension::ordered()
            .iter()
            .map(|dimension| {
                let gap = self.get(*dimension) - other.get(*dimension);
                gap * gap
            })
            .sum::<f64>()
            .sqrt()
    }

    pub fn values(&self) -> [f64; 9] {
        Dimension::ordered().map(|dimension| self.get(dimension))
    }
}
