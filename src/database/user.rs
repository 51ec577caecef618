use chrono::{DateTime, Utc};

/// Role of a user inside its business, strongest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    Owner,
    Manager,
    Accountant,
    #[default]
    Staff,
}

impl Role {
    /// Position in the hierarchy, higher outranks lower.
    pub fn level(&self) -> u8 {
        match self {
            Self::Owner => 3,
            Self::Manager => 2,
            Self::Accountant => 1,
            Self::Staff => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Manager => "manager",
            Self::Accountant => "accountant",
            Self::Staff => "staff",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Role {
    type Error = std::convert::Infallible;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(match value.as_str() {
            "owner" => Self::Owner,
            "manager" => Self::Manager,
            "accountant" => Self::Accountant,
            _ => Self::Staff,
        })
    }
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Model {
    /// The unique identifier for the user.
    pub id: i64,
    /// The business the user belongs to. Superuser-equivalent accounts
    /// have no business and may act across tenants.
    pub business_id: Option<i64>,
    /// Unique email address, doubles as the login identity.
    pub email: String,
    /// Role inside the business.
    #[sqlx(try_from = "String")]
    pub role: Role,
    /// Cross-tenant administrative account.
    pub is_superuser: bool,
    /// Deactivated users keep their rows but cannot authenticate.
    pub is_active: bool,
    /// The time the user was created.
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Whether the user may attach to channels of `business_id`.
    pub fn is_member_of(&self, business_id: i64) -> bool {
        self.is_superuser || self.business_id == Some(business_id)
    }
}
