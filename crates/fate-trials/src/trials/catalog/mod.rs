//! Registry of trial packages.
//!
//! Packages are declared statically in [`builtin`] and validated once at
//! load time; a malformed package is a deployment mistake and refuses to
//! boot rather than surfacing mid-trial. Operators can disable a package
//! at runtime without restarting.

mod builtin;
mod domain;

pub use builtin::INDUCTION_KEY;
pub use domain::{
    ChoiceOption, MergeWeights, PackageKind, PackageScoring, Question, QuestionKind, RewardBands,
    TriggerConditions, TrialPackage, UserState, QUESTIONS_PER_TRIAL,
};

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate package key '{0}'")]
    DuplicateKey(&'static str),
    #[error("package '{key}' must carry exactly {expected} questions, found {found}")]
    WrongQuestionCount {
        key: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("package '{key}' question '{question}' offers no options")]
    EmptyOptions {
        key: &'static str,
        question: &'static str,
    },
    #[error("package '{key}' question '{question}' labels must run A, B, C.. in order")]
    UnorderedLabels {
        key: &'static str,
        question: &'static str,
    },
    #[error("package '{key}' trigger chance {found} falls outside [0, 1]")]
    InvalidTriggerChance { key: &'static str, found: f64 },
    #[error("package '{key}' merge weights must be non-negative and sum above zero")]
    InvalidWeights { key: &'static str },
    #[error("unknown package '{0}'")]
    UnknownPackage(String),
}

/// In-memory package registry with a runtime enable/disable overlay.
#[derive(Debug)]
pub struct TrialCatalog {
    by_key: HashMap<&'static str, Arc<TrialPackage>>,
    /// Tag to package keys, built once at load; keys stay in sorted order.
    by_tag: HashMap<&'static str, Vec<&'static str>>,
    disabled: Mutex<HashSet<&'static str>>,
}

impl TrialCatalog {
    /// Loads the built-in packages shipped with the engine.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::from_packages(builtin::standard_packages())
    }

    pub fn from_packages(packages: Vec<TrialPackage>) -> Result<Self, CatalogError> {
        let mut by_key = HashMap::with_capacity(packages.len());
        let mut by_tag: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        for package in packages {
            validate(&package)?;
            let key = package.key;
            for tag in package.tags {
                by_tag.entry(tag).or_default().push(key);
            }
            if by_key.insert(key, Arc::new(package)).is_some() {
                return Err(CatalogError::DuplicateKey(key));
            }
        }
        for keys in by_tag.values_mut() {
            keys.sort_unstable();
        }
        Ok(Self {
            by_key,
            by_tag,
            disabled: Mutex::new(HashSet::new()),
        })
    }

    /// Looks a package up regardless of its enabled state.
    pub fn get(&self, key: &str) -> Option<Arc<TrialPackage>> {
        self.by_key.get(key).cloned()
    }

    /// Looks a package up, returning `None` when the key is unknown or the
    /// package is currently disabled.
    pub fn get_enabled(&self, key: &str) -> Option<Arc<TrialPackage>> {
        if !self.is_enabled(key) {
            return None;
        }
        self.get(key)
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        !self
            .disabled
            .lock()
            .expect("catalog mutex poisoned")
            .contains(key)
    }

    pub fn set_enabled(&self, key: &str, enabled: bool) -> Result<(), CatalogError> {
        let Some(package) = self.by_key.get(key) else {
            return Err(CatalogError::UnknownPackage(key.to_string()));
        };
        let mut disabled = self.disabled.lock().expect("catalog mutex poisoned");
        if enabled {
            disabled.remove(package.key);
        } else {
            disabled.insert(package.key);
        }
        Ok(())
    }

    /// All enabled packages carrying the tag, in key order.
    pub fn tagged(&self, tag: &str) -> Vec<Arc<TrialPackage>> {
        let Some(keys) = self.by_tag.get(tag) else {
            return Vec::new();
        };
        keys.iter()
            .copied()
            .filter(|key| self.is_enabled(key))
            .filter_map(|key| self.by_key.get(key).cloned())
            .collect()
    }

    /// Enabled packages whose trigger conditions admit the given player.
    pub fn available_for(&self, state: &UserState) -> Vec<Arc<TrialPackage>> {
        let mut hits: Vec<_> = self
            .by_key
            .values()
            .filter(|p| self.is_enabled(p.key) && p.conditions.matches(state))
            .cloned()
            .collect();
        hits.sort_by_key(|p| p.key);
        hits
    }

    /// Every registered package in key order, enabled or not.
    pub fn packages(&self) -> Vec<Arc<TrialPackage>> {
        let mut all: Vec<_> = self.by_key.values().cloned().collect();
        all.sort_by_key(|p| p.key);
        all
    }

    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.by_key.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

fn validate(package: &TrialPackage) -> Result<(), CatalogError> {
    if package.questions.len() != QUESTIONS_PER_TRIAL {
        return Err(CatalogError::WrongQuestionCount {
            key: package.key,
            expected: QUESTIONS_PER_TRIAL,
            found: package.questions.len(),
        });
    }
    if !(0.0..=1.0).contains(&package.trigger_chance) {
        return Err(CatalogError::InvalidTriggerChance {
            key: package.key,
            found: package.trigger_chance,
        });
    }
    let weights = &package.scoring.weights;
    if weights.choice < 0.0 || weights.text < 0.0 || weights.choice + weights.text <= 0.0 {
        return Err(CatalogError::InvalidWeights { key: package.key });
    }
    for question in &package.questions {
        let QuestionKind::Choice { options } = &question.kind else {
            continue;
        };
        if options.is_empty() {
            return Err(CatalogError::EmptyOptions {
                key: package.key,
                question: question.id,
            });
        }
        for (i, option) in options.iter().enumerate() {
            let expected = (b'A' + i as u8) as char;
            if option.label != expected {
                return Err(CatalogError::UnorderedLabels {
                    key: package.key,
                    question: question.id,
                });
            }
        }
    }
    Ok(())
}
