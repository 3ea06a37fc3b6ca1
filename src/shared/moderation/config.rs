//! Moderation Configuration
//!
//! The admin-tunable settings that drive the moderation pipeline: per-category
//! severity thresholds, the keyword blocklist, and one tier profile per
//! workflow. The config is a single logical document; admins update it with a
//! [`ModerationConfigPatch`] which is merged field by field.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;

/// Highest severity the classifier reports
pub const MAX_SEVERITY: u8 = 6;

/// Threshold applied to every category until an admin changes it
pub const DEFAULT_THRESHOLD: u8 = 4;

/// Harm category scored by the AI classifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Hate,
    Sexual,
    Violence,
    SelfHarm,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Hate,
        Category::Sexual,
        Category::Violence,
        Category::SelfHarm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hate => "hate",
            Category::Sexual => "sexual",
            Category::Violence => "violence",
            Category::SelfHarm => "selfHarm",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category severity at or above which content violates policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub hate: u8,
    pub sexual: u8,
    pub violence: u8,
    pub self_harm: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            hate: DEFAULT_THRESHOLD,
            sexual: DEFAULT_THRESHOLD,
            violence: DEFAULT_THRESHOLD,
            self_harm: DEFAULT_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub fn get(&self, category: Category) -> u8 {
        match category {
            Category::Hate => self.hate,
            Category::Sexual => self.sexual,
            Category::Violence => self.violence,
            Category::SelfHarm => self.self_harm,
        }
    }

    fn set(&mut self, category: Category, value: u8) {
        match category {
            Category::Hate => self.hate = value,
            Category::Sexual => self.sexual = value,
            Category::Violence => self.violence = value,
            Category::SelfHarm => self.self_harm = value,
        }
    }

    /// Check every threshold is on the classifier's severity scale
    pub fn validate(&self) -> Result<(), SharedError> {
        for category in Category::ALL {
            check_severity(category, self.get(category))?;
        }
        Ok(())
    }
}

fn check_severity(category: Category, value: u8) -> Result<(), SharedError> {
    if value > MAX_SEVERITY {
        return Err(SharedError::validation(
            format!("thresholds.{}", category.as_str()),
            format!("severity must be between 0 and {}, got {}", MAX_SEVERITY, value),
        ));
    }
    Ok(())
}

/// Partial threshold update; absent categories keep their current value
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hate: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sexual: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violence: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_harm: Option<u8>,
}

impl ThresholdsPatch {
    fn entries(&self) -> [(Category, Option<u8>); 4] {
        [
            (Category::Hate, self.hate),
            (Category::Sexual, self.sexual),
            (Category::Violence, self.violence),
            (Category::SelfHarm, self.self_harm),
        ]
    }
}

/// Named policy profile a caller moderates under
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    /// Public community feed and chat
    Community,
    /// Group channels and group posts
    Groups,
    /// Event descriptions and event comments
    Events,
    /// Staff and other trusted posters
    Trusted,
}

impl Workflow {
    pub const ALL: [Workflow; 4] = [
        Workflow::Community,
        Workflow::Groups,
        Workflow::Events,
        Workflow::Trusted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Workflow::Community => "community",
            Workflow::Groups => "groups",
            Workflow::Events => "events",
            Workflow::Trusted => "trusted",
        }
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Workflow::Community
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens when the AI classifier flags content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tier3Action {
    /// Reject immediately
    Reject,
    /// Hold the content and queue it for a human moderator
    Review,
}

impl Default for Tier3Action {
    fn default() -> Self {
        Tier3Action::Review
    }
}

/// How blocklist terms are located in text
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    /// Term must not be flanked by letters or digits ("ass" does not match "class")
    WholeWord,
    /// Plain containment ("ass" matches "class")
    Substring,
}

impl Default for MatchMode {
    fn default() -> Self {
        MatchMode::WholeWord
    }
}

/// Which tiers run for a workflow, and how tier 3 violations are handled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowProfile {
    pub tier1_enabled: bool,
    pub tier2_enabled: bool,
    pub tier3_enabled: bool,
    #[serde(default)]
    pub tier3_action: Tier3Action,
}

impl WorkflowProfile {
    /// Every tier on
    pub fn all_tiers(tier3_action: Tier3Action) -> Self {
        Self {
            tier1_enabled: true,
            tier2_enabled: true,
            tier3_enabled: true,
            tier3_action,
        }
    }

    /// Every tier off; content is always allowed
    pub fn disabled() -> Self {
        Self {
            tier1_enabled: false,
            tier2_enabled: false,
            tier3_enabled: false,
            tier3_action: Tier3Action::default(),
        }
    }

    /// Profile a workflow gets before any admin edits it
    pub fn default_for(workflow: Workflow) -> Self {
        match workflow {
            Workflow::Trusted => Self::disabled(),
            Workflow::Community | Workflow::Groups | Workflow::Events => {
                Self::all_tiers(Tier3Action::Review)
            }
        }
    }

    fn apply(&mut self, patch: &WorkflowProfilePatch) {
        if let Some(enabled) = patch.tier1_enabled {
            self.tier1_enabled = enabled;
        }
        if let Some(enabled) = patch.tier2_enabled {
            self.tier2_enabled = enabled;
        }
        if let Some(enabled) = patch.tier3_enabled {
            self.tier3_enabled = enabled;
        }
        if let Some(action) = patch.tier3_action {
            self.tier3_action = action;
        }
    }
}

/// Partial profile update for one workflow
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier1_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier2_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier3_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier3_action: Option<Tier3Action>,
}

fn default_workflows() -> BTreeMap<Workflow, WorkflowProfile> {
    Workflow::ALL
        .into_iter()
        .map(|workflow| (workflow, WorkflowProfile::default_for(workflow)))
        .collect()
}

/// The singleton moderation configuration document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModerationConfig {
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Normalized (trimmed, lowercase, non-empty) prohibited terms
    #[serde(default)]
    pub blocklist_terms: BTreeSet<String>,
    #[serde(default)]
    pub blocklist_match_mode: MatchMode,
    #[serde(default = "default_workflows")]
    pub workflows: BTreeMap<Workflow, WorkflowProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            blocklist_terms: BTreeSet::new(),
            blocklist_match_mode: MatchMode::default(),
            workflows: default_workflows(),
            updated_at: None,
            updated_by: None,
        }
    }
}

impl ModerationConfig {
    /// Profile for `workflow`, falling back to the built-in default when the
    /// stored document has no entry for it
    pub fn profile(&self, workflow: Workflow) -> WorkflowProfile {
        self.workflows
            .get(&workflow)
            .copied()
            .unwrap_or_else(|| WorkflowProfile::default_for(workflow))
    }

    /// Merge `patch` into this config.
    ///
    /// The patch is validated in full before anything is changed, so a
    /// rejected patch leaves the config untouched.
    pub fn apply(&mut self, patch: &ModerationConfigPatch) -> Result<(), SharedError> {
        if let Some(thresholds) = &patch.thresholds {
            for (category, value) in thresholds.entries() {
                if let Some(value) = value {
                    check_severity(category, value)?;
                }
            }
        }

        if let Some(thresholds) = &patch.thresholds {
            for (category, value) in thresholds.entries() {
                if let Some(value) = value {
                    self.thresholds.set(category, value);
                }
            }
        }
        if let Some(terms) = &patch.blocklist_terms {
            self.blocklist_terms = normalize_terms(terms);
        }
        if let Some(mode) = patch.blocklist_match_mode {
            self.blocklist_match_mode = mode;
        }
        if let Some(workflows) = &patch.workflows {
            for (workflow, profile_patch) in workflows {
                let mut profile = self.profile(*workflow);
                profile.apply(profile_patch);
                self.workflows.insert(*workflow, profile);
            }
        }
        Ok(())
    }

    /// Repair a config read back from storage: re-normalize the blocklist and
    /// clamp thresholds that fall off the severity scale.
    pub fn sanitized(mut self) -> Self {
        self.blocklist_terms = normalize_terms(&self.blocklist_terms);
        for category in Category::ALL {
            let value = self.thresholds.get(category);
            if value > MAX_SEVERITY {
                self.thresholds.set(category, MAX_SEVERITY);
            }
        }
        self
    }
}

/// Admin update to the moderation config; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModerationConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdsPatch>,
    /// Replaces the whole term list when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocklist_terms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocklist_match_mode: Option<MatchMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflows: Option<BTreeMap<Workflow, WorkflowProfilePatch>>,
}

/// Trim, lowercase and drop blank terms
pub fn normalize_terms<'a, I>(terms: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    terms
        .into_iter()
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}
