#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Ready,
    Submitting,
    Submitted,
    Failed,
    Issues,
}

#[derive(Debug, Clone)]
pub struct StatusLine {
    kind: StatusKind,
    message: String,
}

pub const READY_STATUS: &str = "Ready.";

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            kind: StatusKind::Ready,
            message: READY_STATUS.to_string(),
        }
    }
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready(&mut self) {
        self.kind = StatusKind::Ready;
        self.message = READY_STATUS.to_string();
    }

    pub fn submitting(&mut self, message: &str) {
        self.kind = StatusKind::Submitting;
        self.message = message.to_string();
    }

    pub fn submitted(&mut self, message: &str) {
        self.kind = StatusKind::Submitted;
        self.message = message.to_string();
    }

    pub fn failed(&mut self, message: &str) {
        self.kind = StatusKind::Failed;
        self.message = message.to_string();
    }

    pub fn issues_remaining(&mut self, count: usize) {
        self.kind = StatusKind::Issues;
        self.message = format!("{count} issue(s) remaining");
    }

    pub fn kind(&self) -> StatusKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
