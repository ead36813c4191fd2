use serde::{Deserialize, Serialize};

/// governance settings for the ledger poster and reference generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingConfig {
    /// how many days before "today" an entry may be dated without approval
    pub backdate_window_days: u32,
    /// role named in governance rejections so the caller can route approval
    pub approver_role: String,
    /// bounded retries when claiming a reference collides
    pub reference_max_retries: u32,
}

impl PostingConfig {
    pub fn new(backdate_window_days: u32) -> Self {
        Self {
            backdate_window_days,
            ..Self::default()
        }
    }

    pub fn with_approver_role(mut self, role: impl Into<String>) -> Self {
        self.approver_role = role.into();
        self
    }

    pub fn with_reference_max_retries(mut self, retries: u32) -> Self {
        self.reference_max_retries = retries;
        self
    }
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            backdate_window_days: 3,
            approver_role: "accounting supervisor".to_string(),
            reference_max_retries: 5,
        }
    }
}
