/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Raw verdict returned by an AML provider for a single identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckResult {
    pub is_suspicious: bool,
    pub risk_score: f64,
    pub details: String,
}

/// Address verdict as rendered to the chat.
#[derive(Clone, Debug, PartialEq)]
pub struct AmlResult {
    pub address: String,
    pub is_suspicious: bool,
    pub risk_score: f64,
    pub details: Vec<String>,
}

/// Transaction verdict as rendered to the chat.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionResult {
    pub transaction_id: String,
    pub is_suspicious: bool,
    pub risk_score: f64,
    pub details: Vec<String>,
}
