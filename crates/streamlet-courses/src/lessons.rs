//! Course screen: the course itself and a search-as-you-type lesson list.

use std::convert::Infallible;

use streamlet_core::Stream;
use streamlet_http::{HttpClient, HttpError};

use crate::config::StoreConfig;
use crate::model::{Course, Lesson, LessonsPayload};

const PAGE_SIZE: &str = "100";

#[derive(Debug, Clone)]
pub struct LessonSearch {
    client: HttpClient,
    config: StoreConfig,
    course_id: u32,
}

impl LessonSearch {
    pub fn new(client: HttpClient, config: StoreConfig, course_id: u32) -> Self {
        Self {
            client,
            config,
            course_id,
        }
    }

    #[must_use]
    pub fn course_id(&self) -> u32 {
        self.course_id
    }

    pub fn course(&self) -> Stream<Course, HttpError> {
        self.client
            .get_json::<Course>(&self.config.course_path(self.course_id))
    }

    /// First page of lessons matching `search`. An empty search matches all.
    pub fn load_lessons(&self, search: &str) -> Stream<Vec<Lesson>, HttpError> {
        let course_id = self.course_id.to_string();
        self.client
            .get_json_with_query::<LessonsPayload>(
                &self.config.lessons_path,
                &[
                    ("courseId", course_id.as_str()),
                    ("pageSize", PAGE_SIZE),
                    ("filter", search),
                ],
            )
            .map(|body: LessonsPayload| body.payload)
    }

    /// Lessons for each search term typed.
    ///
    /// Starts with the unfiltered list, skips a term equal to the previous
    /// one, and drops the request for a term as soon as a newer term
    /// arrives.
    pub fn search(&self, terms: Stream<String, Infallible>) -> Stream<Vec<Lesson>, HttpError> {
        let search = self.clone();
        terms
            .map_err(|never: Infallible| match never {})
            .start_with(String::new())
            .distinct_until_changed()
            .switch_map(move |term: String| search.load_lessons(&term))
    }
}
