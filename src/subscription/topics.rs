/// The broadcast groups a connection can subscribe to.
///
/// The rendered names are part of the wire contract with external tooling
/// and must not change shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionTopic {
    /// Private per-user notification channel.
    UserNotifications(i64),
    /// Business-wide notification broadcast channel.
    BusinessNotifications(i64),
    /// Business audit feed channel.
    BusinessActivity(i64),
    /// Business chat room channel.
    BusinessChat(i64),
}

impl std::fmt::Display for SubscriptionTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotifications(user_id) => write!(f, "user_{user_id}_notifications"),
            Self::BusinessNotifications(business_id) => {
                write!(f, "business_{business_id}_notifications")
            }
            Self::BusinessActivity(business_id) => write!(f, "business_{business_id}_activity"),
            Self::BusinessChat(business_id) => write!(f, "business_{business_id}_chat"),
        }
    }
}
