//! Endpoint paths and save behavior for the course services.

use serde::{Deserialize, Serialize};

/// What the store does when a save request fails after the optimistic
/// update was pushed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SavePolicy {
    /// Keep the optimistic value. The failure only reaches the save stream.
    #[default]
    Optimistic,
    /// Restore the course as it was before the save, then report the failure.
    RollbackOnFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub courses_path: String,
    pub lessons_path: String,
    pub save_policy: SavePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            courses_path: "/api/courses".to_string(),
            lessons_path: "/api/lessons".to_string(),
            save_policy: SavePolicy::default(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn with_save_policy(mut self, save_policy: SavePolicy) -> Self {
        self.save_policy = save_policy;
        self
    }

    /// Path of one course resource.
    #[must_use]
    pub fn course_path(&self, id: u32) -> String {
        format!("{}/{id}", self.courses_path.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_course_path() {
        let config = StoreConfig::default();
        assert_eq!(config.course_path(12), "/api/courses/12");
        assert_eq!(config.save_policy, SavePolicy::Optimistic);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"save_policy": "rollback-on-failure"}"#).expect("config");
        assert_eq!(config.save_policy, SavePolicy::RollbackOnFailure);
        assert_eq!(config.courses_path, "/api/courses");
    }
}
