//! Request helpers shared by the DTOs
//!
//! Pagination defaults and normalizing deserializers.

use serde::{Deserialize, Deserializer};

/// Page/limit pair after validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    /// 1-based page number
    pub page: u32,
    /// Items per page
    pub limit: u32,
}

impl PageParams {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit,
        }
    }

    /// Row offset for storage queries
    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1)) as u64 * self.limit as u64
    }
}

pub fn default_page() -> u32 {
    1
}

/// Deserialize a string and trim surrounding whitespace
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(s.trim().to_string())
}

/// Deserialize an optional string, trimming it and mapping blank to `None`
pub fn trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "trimmed")]
        name: String,
        #[serde(default, deserialize_with = "trimmed_opt")]
        note: Option<String>,
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageParams::new(1, 10).offset(), 0);
        assert_eq!(PageParams::new(3, 20).offset(), 40);
        assert_eq!(PageParams::new(0, 20).page, 1);
    }

    #[test]
    fn test_trimmed() {
        let p: Probe = serde_json::from_str(r#"{"name":"  pot  ","note":"   "}"#).unwrap();
        assert_eq!(p.name, "pot");
        assert_eq!(p.note, None);

        let p: Probe = serde_json::from_str(r#"{"name":"pot"}"#).unwrap();
        assert_eq!(p.note, None);

        let p: Probe = serde_json::from_str(r#"{"name":"pot","note":" fragile "}"#).unwrap();
        assert_eq!(p.note.as_deref(), Some("fragile"));
    }
}
