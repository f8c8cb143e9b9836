//! Keyword-based retrieval planning.
//!
//! A query is lowercased and tested against an ordered rule table; the first
//! intent with a matching keyword wins, so a question mentioning both a repo
//! and a resume is treated as coding. The intent picks which source
//! categories are eligible and how many results to ask the store for.

use crate::types::SourceTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// What a question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Coding,
    Career,
    Branding,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Coding => "coding",
            Intent::Career => "career",
            Intent::Branding => "branding",
            Intent::General => "general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluated top to bottom; keywords are matched as substrings.
const INTENT_RULES: &[(Intent, &[&str])] = &[
    (
        Intent::Coding,
        &[
            "code",
            "coding",
            "repo",
            "github",
            "gitlab",
            "commit",
            "pull request",
            "programming",
            "debug",
            "refactor",
            "open source",
            "rust",
            "python",
            "javascript",
            "typescript",
            "library",
            "framework",
            "algorithm",
        ],
    ),
    (
        Intent::Career,
        &[
            "career",
            "resume",
            "résumé",
            "cover letter",
            "job",
            "interview",
            "hiring",
            "salary",
            "promotion",
            "recruiter",
            "experience",
            "skills",
        ],
    ),
    (
        Intent::Branding,
        &[
            "brand",
            "social",
            "twitter",
            "tweet",
            "linkedin",
            "mastodon",
            "audience",
            "followers",
            "blog",
            "newsletter",
            "headline",
            "bio",
        ],
    ),
];

/// Terms that ask for the freshest data.
pub const RECENCY_TERMS: &[&str] = &[
    "latest",
    "recent",
    "today",
    "yesterday",
    "this week",
    "this month",
    "this year",
    "current",
    "newest",
    "up to date",
    "up-to-date",
    "right now",
];

/// Classify free text into an intent. Never fails; falls back to `General`.
pub fn classify_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();
    INTENT_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::General)
}

/// Whether the text asks for fresh data.
pub fn wants_fresh(text: &str) -> bool {
    let lower = text.to_lowercase();
    RECENCY_TERMS.iter().any(|term| lower.contains(term))
}

/// Retrieval parameters for one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPolicy {
    pub categories: Vec<SourceTag>,
    pub max_results: i64,
}

impl IntentPolicy {
    fn new(categories: &[SourceTag], max_results: i64) -> Self {
        Self {
            categories: categories.to_vec(),
            max_results,
        }
    }
}

/// Intent to retrieval parameters. Usually read from the index config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerPolicy {
    pub coding: IntentPolicy,
    pub career: IntentPolicy,
    pub branding: IntentPolicy,
    pub general: IntentPolicy,
}

impl Default for PlannerPolicy {
    fn default() -> Self {
        use SourceTag::*;
        Self {
            coding: IntentPolicy::new(&[ProfileHost, Document], 15),
            career: IntentPolicy::new(&[Document, ProfileHost], 10),
            branding: IntentPolicy::new(&[Social, Feed], 20),
            general: IntentPolicy::new(&SourceTag::ALL, 10),
        }
    }
}

impl PlannerPolicy {
    pub fn for_intent(&self, intent: Intent) -> &IntentPolicy {
        match intent {
            Intent::Coding => &self.coding,
            Intent::Career => &self.career,
            Intent::Branding => &self.branding,
            Intent::General => &self.general,
        }
    }
}

/// The retrieval plan for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub intent: Intent,
    pub eligible_categories: BTreeSet<SourceTag>,
    pub max_results: i64,
    pub force_fresh: bool,
}

/// Stateless planner over a policy table.
#[derive(Debug, Clone, Default)]
pub struct RetrievalPlanner {
    policy: PlannerPolicy,
}

impl RetrievalPlanner {
    pub fn new(policy: PlannerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PlannerPolicy {
        &self.policy
    }

    pub fn make_plan(&self, text: &str) -> Plan {
        let intent = classify_intent(text);
        let policy = self.policy.for_intent(intent);

        let plan = Plan {
            intent,
            eligible_categories: policy.categories.iter().copied().collect(),
            max_results: policy.max_results,
            force_fresh: wants_fresh(text),
        };

        tracing::debug!(
            intent = %plan.intent,
            max_results = plan.max_results,
            force_fresh = plan.force_fresh,
            "Planned retrieval"
        );
        plan
    }
}

/// Plan with the default policy table.
pub fn make_plan(text: &str) -> Plan {
    RetrievalPlanner::default().make_plan(text)
}
