use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for one quiz session.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a fresh random `SessionId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID
    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of one of the bundled question banks.
///
/// The catalog is fixed; each entry maps to one source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BankId {
    Full,
    Test002,
    Test003,
    Test004,
    Test005,
    Test006,
    Questions,
}

impl BankId {
    /// Every bank in catalog order.
    pub const ALL: [BankId; 7] = [
        BankId::Full,
        BankId::Test002,
        BankId::Test003,
        BankId::Test004,
        BankId::Test005,
        BankId::Test006,
        BankId::Questions,
    ];

    /// Short identifier used on the command line and in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BankId::Full => "full",
            BankId::Test002 => "test002",
            BankId::Test003 => "test003",
            BankId::Test004 => "test004",
            BankId::Test005 => "test005",
            BankId::Test006 => "test006",
            BankId::Questions => "questions",
        }
    }

    /// Name of the JSON document holding this bank.
    #[must_use]
    pub fn document_name(self) -> &'static str {
        match self {
            BankId::Full => "full_questions.json",
            BankId::Test002 => "test002_questions.json",
            BankId::Test003 => "test003_questions.json",
            BankId::Test004 => "test004_questions.json",
            BankId::Test005 => "test005_questions.json",
            BankId::Test006 => "test006_questions.json",
            BankId::Questions => "questions.json",
        }
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing an identifier from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
    raw: String,
}

impl ParseIdError {
    pub(crate) fn new(kind: &'static str, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
        }
    }

    /// The rejected input.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized {}: {}", self.kind, self.raw)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for SessionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(SessionId::from_uuid)
            .map_err(|_| ParseIdError {
                kind: "session id",
                raw: s.to_string(),
            })
    }
}

impl FromStr for BankId {
    type Err = ParseIdError;

    /// Accepts either the short id (`test003`) or the document name
    /// (`test003_questions.json`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        BankId::ALL
            .into_iter()
            .find(|id| id.as_str() == needle || id.document_name() == needle)
            .ok_or_else(|| ParseIdError {
                kind: "bank id",
                raw: s.to_string(),
            })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
