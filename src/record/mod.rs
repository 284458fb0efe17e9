//! Record Module
//!
//! Typed rows for the three tables and their line format.
//!
//! ## Line Format
//! ```text
//! users        id,username,location
//! posts        id,content,username,views
//! engagements  id,postId,username,type,comment,timestamp
//! ```
//!
//! Every file starts with one header line that is skipped on read and
//! copied verbatim on rewrite. There is no quoting: a value containing the
//! delimiter cannot be stored.

mod parser;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use parser::{
    parse_int, parse_line, replace_field, split_fields, validate_field, FIELD_DELIMITER,
};

/// Primary key type shared by all three tables
pub type RecordId = i32;

// =============================================================================
// Table Identity
// =============================================================================

/// One of the three tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Users,
    Posts,
    Engagements,
}

impl TableKind {
    /// All tables, in lock acquisition order
    pub const ALL: [TableKind; 3] = [TableKind::Users, TableKind::Posts, TableKind::Engagements];

    /// Number of fields in a row
    pub fn arity(self) -> usize {
        match self {
            TableKind::Users => 3,
            TableKind::Posts => 4,
            TableKind::Engagements => 6,
        }
    }

    /// Header line written when a table file is created
    pub fn header(self) -> &'static str {
        match self {
            TableKind::Users => "id,username,location",
            TableKind::Posts => "id,content,username,views",
            TableKind::Engagements => "id,postId,username,type,comment,timestamp",
        }
    }

    pub fn default_file_name(self) -> &'static str {
        match self {
            TableKind::Users => "users.csv",
            TableKind::Posts => "posts.csv",
            TableKind::Engagements => "engagements.csv",
        }
    }

    /// Column holding the denormalized username
    pub fn username_column(self) -> usize {
        match self {
            TableKind::Users => 1,
            TableKind::Posts => 2,
            TableKind::Engagements => 2,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::Users => "users",
            TableKind::Posts => "posts",
            TableKind::Engagements => "engagements",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Record Trait
// =============================================================================

/// A row type that can be read from and written to its table file
pub trait Record: Sized + Send {
    /// Table this record lives in
    const TABLE: TableKind;

    /// Primary key
    fn id(&self) -> RecordId;

    /// Build a record from exactly `TABLE.arity()` trimmed fields.
    /// Returns `None` if a numeric field does not parse.
    fn from_fields(fields: &[&str]) -> Option<Self>;

    /// Serialize to one line, without the trailing newline
    fn to_line(&self) -> String;
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub location: String,
}

impl User {
    pub fn new(id: RecordId, username: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            location: location.into(),
        }
    }
}

impl Record for User {
    const TABLE: TableKind = TableKind::Users;

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        Some(Self::new(parse_int(fields[0])?, fields[1], fields[2]))
    }

    fn to_line(&self) -> String {
        let d = FIELD_DELIMITER;
        format!("{}{d}{}{d}{}", self.id, self.username, self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: RecordId,
    pub content: String,
    pub username: String,
    /// Never negative
    pub views: i32,
}

impl Post {
    pub fn new(
        id: RecordId,
        content: impl Into<String>,
        username: impl Into<String>,
        views: i32,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            username: username.into(),
            views,
        }
    }
}

impl Record for Post {
    const TABLE: TableKind = TableKind::Posts;

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let id = parse_int(fields[0])?;
        // a negative count on disk loads as zero
        let views = parse_int(fields[3])?.max(0);
        Some(Self::new(id, fields[1], fields[2], views))
    }

    fn to_line(&self) -> String {
        let d = FIELD_DELIMITER;
        format!(
            "{}{d}{}{d}{}{d}{}",
            self.id, self.content, self.username, self.views
        )
    }
}

/// Engagement type column
///
/// Only `like` and `comment` are counted by queries; anything else is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EngagementKind {
    Like,
    Comment,
    Other(String),
}

impl EngagementKind {
    pub fn as_str(&self) -> &str {
        match self {
            EngagementKind::Like => "like",
            EngagementKind::Comment => "comment",
            EngagementKind::Other(s) => s,
        }
    }
}

impl From<&str> for EngagementKind {
    fn from(s: &str) -> Self {
        match s {
            "like" => EngagementKind::Like,
            "comment" => EngagementKind::Comment,
            other => EngagementKind::Other(other.to_string()),
        }
    }
}

impl From<String> for EngagementKind {
    fn from(s: String) -> Self {
        EngagementKind::from(s.as_str())
    }
}

impl From<EngagementKind> for String {
    fn from(kind: EngagementKind) -> Self {
        match kind {
            EngagementKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EngagementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub id: RecordId,
    pub post_id: RecordId,
    pub username: String,
    pub kind: EngagementKind,
    pub comment: String,
    pub timestamp: i32,
}

impl Engagement {
    pub fn new(
        id: RecordId,
        post_id: RecordId,
        username: impl Into<String>,
        kind: impl Into<EngagementKind>,
        comment: impl Into<String>,
        timestamp: i32,
    ) -> Self {
        Self {
            id,
            post_id,
            username: username.into(),
            kind: kind.into(),
            comment: comment.into(),
            timestamp,
        }
    }
}

impl Record for Engagement {
    const TABLE: TableKind = TableKind::Engagements;

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_fields(fields: &[&str]) -> Option<Self> {
        let id = parse_int(fields[0])?;
        let post_id = parse_int(fields[1])?;
        let timestamp = parse_int(fields[5])?;
        Some(Self::new(
            id,
            post_id,
            fields[2],
            fields[3],
            fields[4],
            timestamp,
        ))
    }

    fn to_line(&self) -> String {
        let d = FIELD_DELIMITER;
        format!(
            "{}{d}{}{d}{}{d}{}{d}{}{d}{}",
            self.id, self.post_id, self.username, self.kind, self.comment, self.timestamp
        )
    }
}

/// A table: rows keyed by primary key
pub type Table<R> = BTreeMap<RecordId, R>;
