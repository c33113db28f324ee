//! Course edit dialog: saving form changes as they happen or on click.

use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use streamlet_core::{BehaviorSubject, Stream};
use streamlet_http::{HttpClient, HttpError, HttpResponse};

use crate::config::StoreConfig;
use crate::model::Course;

/// The editable fields of a course, as the dialog form holds them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseChanges {
    pub description: String,
    pub category: String,
    pub released_at: String,
    pub long_description: String,
}

impl CourseChanges {
    /// The form as first shown for `course`.
    #[must_use]
    pub fn for_course(course: &Course, released_at: impl Into<String>) -> Self {
        Self {
            description: course.description.clone(),
            category: course.category.clone(),
            released_at: released_at.into(),
            long_description: course.long_description.clone(),
        }
    }

    /// Every field is filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [
            &self.description,
            &self.category,
            &self.released_at,
            &self.long_description,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

/// How overlapping saves are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveStrategy {
    /// One save at a time, in the order the changes were made.
    #[default]
    Concat,
    /// Every save runs as soon as its change arrives.
    Merge,
    /// A new change cancels the save in progress.
    Switch,
    /// Changes arriving during a save are dropped.
    Exhaust,
}

#[derive(Debug, Clone)]
pub struct CourseEditor {
    client: HttpClient,
    path: String,
}

impl CourseEditor {
    pub fn new(client: HttpClient, config: &StoreConfig, course_id: u32) -> Self {
        Self {
            client,
            path: config.course_path(course_id),
        }
    }

    /// `PUT` the changes. Nothing is sent until subscribe.
    pub fn save(&self, changes: &CourseChanges) -> Stream<HttpResponse, HttpError> {
        self.client.put_json(&self.path, changes)
    }

    /// Save each complete form value; incomplete ones are skipped.
    pub fn autosave(
        &self,
        changes: Stream<CourseChanges, Infallible>,
        strategy: SaveStrategy,
    ) -> Stream<HttpResponse, HttpError> {
        let editor = self.clone();
        let save = move |value: CourseChanges| editor.save(&value);
        let changes = changes
            .map_err(|never: Infallible| match never {})
            .filter(|value: &CourseChanges| value.is_complete());
        match strategy {
            SaveStrategy::Concat => changes.concat_map(save),
            SaveStrategy::Merge => changes.merge_map(save),
            SaveStrategy::Switch => changes.switch_map(save),
            SaveStrategy::Exhaust => changes.exhaust_map(save),
        }
    }

    /// Save the current form on each click. Clicks during a save are
    /// ignored.
    pub fn save_on_click(
        &self,
        clicks: Stream<(), Infallible>,
        form: &BehaviorSubject<CourseChanges>,
    ) -> Stream<HttpResponse, HttpError> {
        let editor = self.clone();
        let form = form.clone();
        clicks
            .map_err(|never: Infallible| match never {})
            .exhaust_map(move |()| editor.save(&form.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamlet_core::Subject;
    use streamlet_core::testing::Recorder;
    use streamlet_http::{HttpConfig, Method, MockTransport};

    fn editor(mock: &MockTransport) -> CourseEditor {
        let client = HttpClient::new(mock.clone(), HttpConfig::default());
        CourseEditor::new(client, &StoreConfig::default(), 5)
    }

    fn changes(description: &str) -> CourseChanges {
        CourseChanges {
            description: description.to_string(),
            category: "BEGINNER".to_string(),
            released_at: "2024-01-01".to_string(),
            long_description: "Long".to_string(),
        }
    }

    fn sent_descriptions(mock: &MockTransport) -> Vec<String> {
        mock.requests()
            .iter()
            .filter_map(|request| request.body.as_deref())
            .filter_map(|body| serde_json::from_slice::<CourseChanges>(body).ok())
            .map(|changes| changes.description)
            .collect()
    }

    fn run(strategy: SaveStrategy) -> (MockTransport, Recorder<HttpResponse, HttpError>) {
        let mock = MockTransport::new();
        let form = Subject::<CourseChanges>::new();
        let recorder = Recorder::new();
        recorder.record(&editor(&mock).autosave(form.as_stream(), strategy));
        form.next(changes("a"));
        form.next(changes(""));
        form.next(changes("b"));
        (mock, recorder)
    }

    #[test]
    fn completeness_requires_every_field() {
        let mut incomplete = changes("x");
        assert!(incomplete.is_complete());
        incomplete.long_description = "  ".into();
        assert!(!incomplete.is_complete());
    }

    #[test]
    fn concat_saves_one_at_a_time_in_order() {
        let (mock, recorder) = run(SaveStrategy::Concat);
        assert_eq!(sent_descriptions(&mock), vec!["a"]);
        assert!(mock.resolve_next(200, ""));
        assert_eq!(sent_descriptions(&mock), vec!["a", "b"]);
        assert!(mock.resolve_next(200, ""));
        assert_eq!(recorder.values().len(), 2);
    }

    #[test]
    fn merge_saves_in_parallel() {
        let (mock, recorder) = run(SaveStrategy::Merge);
        assert_eq!(sent_descriptions(&mock), vec!["a", "b"]);
        assert_eq!(mock.held().len(), 2);
        mock.resolve_next(200, "");
        mock.resolve_next(200, "");
        assert_eq!(recorder.values().len(), 2);
    }

    #[test]
    fn switch_cancels_stale_save() {
        let (mock, recorder) = run(SaveStrategy::Switch);
        assert_eq!(sent_descriptions(&mock), vec!["a", "b"]);
        assert_eq!(mock.cancelled(), 1);
        mock.resolve_next(200, "");
        assert_eq!(recorder.values().len(), 1);
    }

    #[test]
    fn exhaust_drops_changes_during_save() {
        let (mock, _recorder) = run(SaveStrategy::Exhaust);
        assert_eq!(sent_descriptions(&mock), vec!["a"]);
    }

    #[test]
    fn clicks_during_save_are_ignored() {
        let mock = MockTransport::new();
        let clicks = Subject::<()>::new();
        let form = BehaviorSubject::new(changes("first"));
        let recorder = Recorder::new();
        recorder.record(&editor(&mock).save_on_click(clicks.as_stream(), &form));

        clicks.next(());
        form.next(changes("second"));
        clicks.next(());
        clicks.next(());
        assert_eq!(sent_descriptions(&mock), vec!["first"]);

        mock.resolve_next(200, "");
        clicks.next(());
        assert_eq!(sent_descriptions(&mock), vec!["first", "second"]);
        assert_eq!(mock.requests()[1].url, "http://localhost:9000/api/courses/5");
        assert_eq!(mock.requests()[1].method, Method::Put);
        assert_eq!(recorder.values().len(), 1);
    }
}
