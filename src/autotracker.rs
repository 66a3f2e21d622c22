use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("autotracker rule for project {0} has an empty term")]
    EmptyTerm(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutotrackerRule {
    pub term: String,
    pub project_id: u64,
}

impl AutotrackerRule {
    pub fn new(term: impl Into<String>, project_id: u64) -> Self {
        Self {
            term: term.into(),
            project_id,
        }
    }

    /// An empty term would occur in every title, so such rules are refused.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.term.is_empty() {
            return Err(RuleError::EmptyTerm(self.project_id));
        }
        Ok(())
    }
}

impl fmt::Display for AutotrackerRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "term={} pid={}", self.term, self.project_id)
    }
}

/// What the desktop was showing at one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivitySample {
    pub title: String,
    pub filename: String,
}

impl ActivitySample {
    pub fn new(title: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            filename: filename.into(),
        }
    }
}

/// Infers a project from window titles. Earlier rules take precedence.
#[derive(Debug, Clone, Default)]
pub struct Autotracker {
    rules: Vec<AutotrackerRule>,
}

impl Autotracker {
    /// Builds a tracker from stored rules, dropping any that fail validation.
    pub fn new(rules: Vec<AutotrackerRule>) -> Self {
        let rules = rules
            .into_iter()
            .filter(|rule| match rule.validate() {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, "skipping autotracker rule");
                    false
                }
            })
            .collect();
        Self { rules }
    }

    pub fn add_rule(&mut self, rule: AutotrackerRule) -> Result<(), RuleError> {
        rule.validate()?;
        self.rules.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> &[AutotrackerRule] {
        &self.rules
    }

    /// Project of the first rule whose term occurs in the sample title, case-sensitively.
    pub fn find_project_id(&self, sample: &ActivitySample) -> Option<u64> {
        self.rules
            .iter()
            .find(|rule| sample.title.contains(rule.term.as_str()))
            .map(|rule| rule.project_id)
    }
}
