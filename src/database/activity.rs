use chrono::{DateTime, Utc};

/// Kind of mutation an audit entry records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionType {
    Create,
    Update,
    Delete,
    /// Free-form action recorded by a collaborator.
    #[default]
    Custom,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ActionType {
    type Error = std::convert::Infallible;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(match value.as_str() {
            "create" => Self::Create,
            "update" => Self::Update,
            "delete" => Self::Delete,
            _ => Self::Custom,
        })
    }
}

/// Append-only audit log entry with before/after snapshots of the mutated
/// record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Model {
    /// The unique identifier for the activity.
    pub id: i64,
    /// The business the activity belongs to.
    pub business_id: i64,
    /// The acting user. Null when the actor account has been removed.
    pub actor_id: Option<i64>,
    #[sqlx(try_from = "String")]
    pub action_type: ActionType,
    /// Name of the mutated model, e.g. `expense`.
    pub model_name: String,
    /// Identifier of the mutated object, kept as text.
    pub object_id: String,
    /// Snapshot before the mutation, normalized to plain JSON numbers.
    pub before: Option<serde_json::Value>,
    /// Snapshot after the mutation, normalized to plain JSON numbers.
    pub after: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}
