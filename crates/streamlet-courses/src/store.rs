//! Latest-value course store.
//!
//! # Design
//!
//! The store owns a [`BehaviorSubject`] holding the current course list.
//! Readers only ever see [`CourseStore::courses`] (or one of the filtered
//! views derived from it), which replays the current list on subscribe and
//! then follows every later push. Writes go through [`CourseStore::init`]
//! and [`CourseStore::save_course`].
//!
//! Saving is optimistic: the merged course is pushed before the request is
//! sent. [`SavePolicy`] decides what happens when the request then fails.
//! Under [`SavePolicy::RollbackOnFailure`] every subscription to the save
//! stream puts the merged course back first, so a failed attempt that was
//! rolled back and then retried ends with the saved course in the store.

use std::convert::Infallible;

use serde_json::Value;
use streamlet_core::{BehaviorSubject, Stream, Subscriber, Subscription};
use streamlet_http::{HttpClient, HttpError, HttpResponse};

use crate::config::{SavePolicy, StoreConfig};
use crate::error::StoreError;
use crate::model::{ADVANCED, BEGINNER, Course, CoursesPayload, in_category};

/// Shared handle to the course list. Clones see the same state.
#[derive(Debug, Clone)]
pub struct CourseStore {
    client: HttpClient,
    config: StoreConfig,
    courses: BehaviorSubject<Vec<Course>>,
}

impl CourseStore {
    /// A store starting from an empty list.
    pub fn new(client: HttpClient, config: StoreConfig) -> Self {
        Self::with_courses(client, config, Vec::new())
    }

    /// A store starting from `initial`.
    pub fn with_courses(client: HttpClient, config: StoreConfig, initial: Vec<Course>) -> Self {
        Self {
            client,
            config,
            courses: BehaviorSubject::new(initial),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Load the course list and push it.
    ///
    /// A failed load is logged and leaves the current list in place. The
    /// returned subscription cancels a load still in flight.
    pub fn init(&self) -> Subscription {
        let courses = self.courses.clone();
        let path = self.config.courses_path.clone();
        self.client
            .get_json::<CoursesPayload>(&self.config.courses_path)
            .map(CoursesPayload::into_courses)
            .subscribe_with(
                move |loaded: Vec<Course>| {
                    tracing::debug!(count = loaded.len(), "courses loaded");
                    courses.next(loaded);
                },
                move |error: HttpError| {
                    tracing::warn!(path = %path, %error, "loading courses failed");
                },
                || {},
            )
    }

    /// Read-only view: the current list on subscribe, then every update.
    pub fn courses(&self) -> Stream<Vec<Course>, Infallible> {
        self.courses.as_stream()
    }

    /// The list as it is right now.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Course> {
        self.courses.value()
    }

    pub fn select_beginner_courses(&self) -> Stream<Vec<Course>, Infallible> {
        self.filter_by_category(BEGINNER)
    }

    pub fn select_advanced_courses(&self) -> Stream<Vec<Course>, Infallible> {
        self.filter_by_category(ADVANCED)
    }

    /// Courses in `category` (case-insensitive), updated with the store.
    pub fn filter_by_category(&self, category: &str) -> Stream<Vec<Course>, Infallible> {
        let category = category.to_string();
        self.courses()
            .map(move |courses: Vec<Course>| in_category(&courses, &category))
    }

    /// Apply `changes` to course `id` now, and save them when the returned
    /// stream is subscribed.
    ///
    /// An unknown id or changes that do not fit a course leave the store
    /// untouched and yield a failing stream.
    pub fn save_course(&self, id: u32, changes: Value) -> Stream<HttpResponse, StoreError> {
        let found = self
            .courses
            .with(|courses| courses.iter().find(|course| course.id == id).cloned());
        let Some(previous) = found else {
            return Stream::throw(StoreError::UnknownCourse { id });
        };
        let updated = match previous.merged_with(&changes) {
            Ok(course) => course,
            Err(error) => return Stream::throw(error),
        };
        let local = updated.clone();
        self.courses.update(move |courses| replace(courses, local));
        tracing::debug!(course = id, "course updated locally");

        let save = self
            .client
            .put_json(&self.config.course_path(id), &changes)
            .map_err(StoreError::from);
        match self.config.save_policy {
            SavePolicy::Optimistic => save,
            SavePolicy::RollbackOnFailure => {
                let reapply = self.courses.clone();
                let attempt = Stream::new(
                    move |subscriber: Subscriber<HttpResponse, StoreError>| {
                        let stale = reapply.with(|courses| {
                            courses.iter().any(|course| course.id == id && *course != updated)
                        });
                        if stale {
                            reapply.update(|current| replace(current, updated.clone()));
                        }
                        subscriber.add(save.subscribe(subscriber.clone()));
                    },
                );
                let courses = self.courses.clone();
                attempt.catch_error(move |error: StoreError| {
                    tracing::warn!(course = id, %error, "save failed, restoring course");
                    courses.update(|current| replace(current, previous.clone()));
                    Stream::throw(error)
                })
            }
        }
    }
}

fn replace(courses: &[Course], course: Course) -> Vec<Course> {
    courses
        .iter()
        .map(|existing| {
            if existing.id == course.id {
                course.clone()
            } else {
                existing.clone()
            }
        })
        .collect()
}
