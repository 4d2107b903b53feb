/// The text sent to the completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    /// Prefix the visitor's message with the static site context.
    pub fn build(context: &str, message: &str) -> Self {
        Self(format!("Context:{context}\nUser question: {message}\n"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One question and its answer. Lives for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatExchange {
    pub message: String,
    pub reply: String,
}
