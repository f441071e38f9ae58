//! Topic labels for discovered documents

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// What kind of provider rule a document probably contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentTopic {
    PriorAuthorization,
    TimelyFiling,
    Appeals,
    Claims,
    Manual,
}

impl DocumentTopic {
    pub const ALL: [DocumentTopic; 5] = [
        DocumentTopic::PriorAuthorization,
        DocumentTopic::TimelyFiling,
        DocumentTopic::Appeals,
        DocumentTopic::Claims,
        DocumentTopic::Manual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentTopic::PriorAuthorization => "prior_authorization",
            DocumentTopic::TimelyFiling => "timely_filing",
            DocumentTopic::Appeals => "appeals",
            DocumentTopic::Claims => "claims",
            DocumentTopic::Manual => "manual",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            DocumentTopic::PriorAuthorization => &[
                "prior auth",
                "preauth",
                "pre auth",
                "precert",
                "authorization",
            ],
            DocumentTopic::TimelyFiling => &["timely filing", "filing limit", "deadline"],
            DocumentTopic::Appeals => &["appeal", "dispute", "grievance", "reconsideration"],
            DocumentTopic::Claims => &["claim", "billing", "reimbursement"],
            DocumentTopic::Manual => &["manual", "guide", "handbook"],
        }
    }
}

impl fmt::Display for DocumentTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a link by the rule topics its anchor text and URL mention
///
/// Hyphens and underscores in the URL are read as spaces, so
/// `prior-auth-list.pdf` counts as "prior auth".
pub fn classify_topics(anchor_text: &str, url: &str) -> BTreeSet<DocumentTopic> {
    let haystack: String = format!("{} {}", anchor_text, url)
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect();

    DocumentTopic::ALL
        .into_iter()
        .filter(|topic| topic.keywords().iter().any(|kw| haystack.contains(kw)))
        .collect()
}
