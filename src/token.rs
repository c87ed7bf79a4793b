//! Optional personal access token, kept in client storage until cleared.
//!
//! The token leaves the process only as an `Authorization` header on search
//! requests. [`is_likely_github_token`] checks its shape, it does not
//! authenticate it.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::storage::Storage;

pub const TOKEN_KEY: &str = "gh:pat";

const REDACTION_MASK: &str = "••••••••••••••••";
const CLASSIC_PREFIXES: [&str; 5] = ["ghp_", "gho_", "ghu_", "ghs_", "ghr_"];

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Advisory shape check: fine-grained (`github_pat_…`) and classic (`ghp_…`)
/// tokens, or any long run of token characters.
pub fn is_likely_github_token(value: &str) -> bool {
    let value = value.trim();

    if let Some(rest) = value.strip_prefix("github_pat_") {
        return rest.chars().take_while(|c| is_token_char(*c)).count() >= 22;
    }
    if let Some(rest) = CLASSIC_PREFIXES.iter().find_map(|p| value.strip_prefix(p)) {
        return rest.chars().take_while(char::is_ascii_alphanumeric).count() >= 30;
    }
    value.chars().count() >= 40 && value.chars().all(is_token_char)
}

/// A fixed-width mask plus the last four characters, or empty for no token.
pub fn redact_token(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    let last4: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}{}", REDACTION_MASK, last4)
}

/// An empty draft is acceptable: saving it clears the token.
pub fn is_valid_draft(draft: &str) -> bool {
    draft.trim().is_empty() || is_likely_github_token(draft)
}

pub struct TokenStore {
    storage: Arc<dyn Storage>,
    token: String,
}

impl TokenStore {
    /// Loads the persisted token, or starts empty if there is none or storage fails.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let token = match storage.get(TOKEN_KEY) {
            Ok(token) => token.unwrap_or_default(),
            Err(e) => {
                warn!("Could not read saved token: {}", e);
                String::new()
            }
        };
        Self { storage, token }
    }

    pub fn read(&self) -> &str {
        &self.token
    }

    pub fn is_set(&self) -> bool {
        !self.token.is_empty()
    }

    /// Trims and persists `value`; an empty value removes the stored entry.
    pub fn save(&mut self, value: &str) {
        let value = value.trim();
        self.token = value.to_string();
        let result = if value.is_empty() {
            self.storage.remove(TOKEN_KEY)
        } else {
            self.storage.set(TOKEN_KEY, value)
        };
        match result {
            Ok(()) => debug!("Saved token {}", redact_token(value)),
            Err(e) => warn!("Could not persist token: {}", e),
        }
    }

    pub fn clear(&mut self) {
        self.token.clear();
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            warn!("Could not remove saved token: {}", e);
        }
    }

    pub fn redacted(&self) -> String {
        redact_token(&self.token)
    }
}
