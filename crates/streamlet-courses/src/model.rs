//! Wire types for the course API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StoreError};

pub const BEGINNER: &str = "beginner";
pub const ADVANCED: &str = "advanced";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    pub id: u32,
    pub description: String,
    pub icon_url: String,
    pub course_list_icon: String,
    pub long_description: String,
    pub category: String,
    pub lessons_count: u32,
}

impl Course {
    /// Category match, ignoring ASCII case.
    #[must_use]
    pub fn is_in_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category)
    }

    /// A copy with the fields of `changes` (a JSON object) laid over this
    /// course. Unknown keys are ignored; `id` never changes.
    pub fn merged_with(&self, changes: &Value) -> Result<Course> {
        let Value::Object(changes) = changes else {
            return Err(StoreError::invalid_changes("changes must be a JSON object"));
        };
        let mut merged = serde_json::to_value(self)
            .map_err(|err| StoreError::invalid_changes(err.to_string()))?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in changes {
                fields.insert(key.clone(), value.clone());
            }
        }
        let mut course: Course = serde_json::from_value(merged)
            .map_err(|err| StoreError::invalid_changes(err.to_string()))?;
        course.id = self.id;
        Ok(course)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lesson {
    pub id: u32,
    pub description: String,
    pub duration: String,
    pub seq_no: u32,
    pub course_id: u32,
}

/// Body of `GET /api/courses`: courses keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoursesPayload {
    #[serde(default)]
    pub payload: BTreeMap<String, Course>,
}

impl CoursesPayload {
    /// The courses ordered by id.
    #[must_use]
    pub fn into_courses(self) -> Vec<Course> {
        let mut courses: Vec<Course> = self.payload.into_values().collect();
        courses.sort_by_key(|course| course.id);
        courses
    }
}

/// Body of `GET /api/lessons`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LessonsPayload {
    #[serde(default)]
    pub payload: Vec<Lesson>,
}

/// Courses whose category matches `category`, ignoring case.
#[must_use]
pub fn in_category(courses: &[Course], category: &str) -> Vec<Course> {
    courses
        .iter()
        .filter(|course| course.is_in_category(category))
        .cloned()
        .collect()
}
