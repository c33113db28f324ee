//! Home-screen catalog: one shared course request split into views.

use streamlet_core::{Stream, Subscription};
use streamlet_http::{HttpClient, HttpError};

use crate::config::StoreConfig;
use crate::model::{ADVANCED, BEGINNER, Course, CoursesPayload, in_category};

/// What subscribers see when the course request fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Recovery {
    /// Deliver the error.
    #[default]
    Propagate,
    /// Deliver this list instead, then complete.
    Fallback(Vec<Course>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogOptions {
    pub recovery: Recovery,
    /// Extra attempts after a failed request.
    pub retries: usize,
}

/// Course list fetched once and shared by every view.
///
/// The request is sent by the first subscription to any view. Later
/// subscribers, including late ones, get the recorded list. A failed
/// request is retried on the next subscription.
#[derive(Debug, Clone)]
pub struct Catalog {
    courses: Stream<Vec<Course>, HttpError>,
}

impl Catalog {
    pub fn new(client: &HttpClient, config: &StoreConfig, options: CatalogOptions) -> Self {
        let CatalogOptions { recovery, retries } = options;
        let courses = client
            .get_json::<CoursesPayload>(&config.courses_path)
            .retry(retries)
            .map(CoursesPayload::into_courses)
            .tap(|courses: &Vec<Course>| tracing::debug!(count = courses.len(), "catalog loaded"))
            .share_replay()
            .catch_error(move |error: HttpError| match &recovery {
                Recovery::Propagate => Stream::throw(error),
                Recovery::Fallback(fallback) => {
                    tracing::warn!(%error, "catalog unavailable, showing fallback");
                    Stream::of(fallback.clone())
                }
            })
            .finalize(|| tracing::debug!("catalog view finished"));
        Self { courses }
    }

    pub fn courses(&self) -> Stream<Vec<Course>, HttpError> {
        self.courses.clone()
    }

    pub fn beginner_courses(&self) -> Stream<Vec<Course>, HttpError> {
        self.category(BEGINNER)
    }

    pub fn advanced_courses(&self) -> Stream<Vec<Course>, HttpError> {
        self.category(ADVANCED)
    }

    fn category(&self, category: &'static str) -> Stream<Vec<Course>, HttpError> {
        self.courses()
            .map(move |courses: Vec<Course>| in_category(&courses, category))
    }

    /// Start the shared request without rendering anything.
    pub fn prefetch(&self) -> Subscription {
        self.courses.subscribe_next(|_| {})
    }
}
