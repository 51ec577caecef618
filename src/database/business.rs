use chrono::{DateTime, Utc};

/// A tenant. All data and channels are scoped to exactly one business.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Model {
    /// The unique identifier for the business.
    pub id: i64,
    /// Display name of the business.
    pub name: String,
    /// Businesses are deactivated, never hard-deleted. Deactivation
    /// cascades to the member users.
    pub is_active: bool,
    /// The time the business was created.
    pub created_at: DateTime<Utc>,
}
