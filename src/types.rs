use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Status code recorded when no response was received.
pub const TRANSPORT_FAILURE: i32 = -1;

/// Kind of timed call. Rendered as SCREAMING_SNAKE_CASE in every artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Insert,
    Query,
    InsertComment,
    QueryPost,
    InsertReaction,
    Sync,
}

impl OperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Insert => "INSERT",
            OperationType::Query => "QUERY",
            OperationType::InsertComment => "INSERT_COMMENT",
            OperationType::QueryPost => "QUERY_POST",
            OperationType::InsertReaction => "INSERT_REACTION",
            OperationType::Sync => "SYNC",
        }
    }

    /// Write-path operation (the "command" side of CQRS).
    pub fn is_command(self) -> bool {
        matches!(
            self,
            OperationType::Insert | OperationType::InsertComment | OperationType::InsertReaction
        )
    }

    /// Read-path operation (the "query" side of CQRS).
    pub fn is_query(self) -> bool {
        matches!(self, OperationType::Query | OperationType::QueryPost)
    }

    /// Status codes counted as success.
    pub fn accepts(self, status: u16) -> bool {
        if self.is_command() {
            status == 200 || status == 201
        } else {
            status == 200
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSERT" => Ok(OperationType::Insert),
            "QUERY" => Ok(OperationType::Query),
            "INSERT_COMMENT" => Ok(OperationType::InsertComment),
            "QUERY_POST" => Ok(OperationType::QueryPost),
            "INSERT_REACTION" => Ok(OperationType::InsertReaction),
            "SYNC" => Ok(OperationType::Sync),
            other => Err(format!("unknown operation type '{}'", other)),
        }
    }
}

/// One timed call. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult {
    pub operation_type: OperationType,
    pub operation_number: usize,
    pub duration_ms: f64,
    pub success: bool,
    pub status_code: i32,
    pub post_id: Option<String>,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
}

/// Endpoint family exercised by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// POST /post then GET /post/{id}
    #[default]
    Posts,
    /// POST /post/{id}/comment on one base post, then GET that post
    Comments,
    /// post -> comment -> reaction chains, then GET the chained posts
    Reactions,
}

impl Scenario {
    /// Operation types of the command and query phases.
    pub fn phases(self) -> (OperationType, OperationType) {
        match self {
            Scenario::Posts => (OperationType::Insert, OperationType::Query),
            Scenario::Comments => (OperationType::InsertComment, OperationType::QueryPost),
            Scenario::Reactions => (OperationType::InsertReaction, OperationType::QueryPost),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scenario::Posts => "posts",
            Scenario::Comments => "comments",
            Scenario::Reactions => "reactions",
        };
        f.write_str(name)
    }
}
