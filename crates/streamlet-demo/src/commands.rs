use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use clap::{Args, ValueEnum};
use serde::Serialize;
use serde_json::{Map, Value};
use streamlet_core::Subject;
use streamlet_courses::{
    Catalog, CatalogOptions, Course, CourseStore, CoursesPayload, Lesson, LessonSearch,
    SavePolicy, StoreConfig, StoreError,
};
use streamlet_http::HttpError;

use crate::error::{DemoError, Result};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Category {
    Beginner,
    Advanced,
}

#[derive(Debug, Clone, Args)]
pub struct CoursesArgs {
    /// Only list this category. Both are listed otherwise, from one request.
    #[arg(long, value_enum)]
    pub category: Option<Category>,

    /// Extra attempts when the request fails.
    #[arg(long, default_value_t = 0)]
    pub retries: usize,
}

#[derive(Debug, Clone, Args)]
pub struct CourseArgs {
    pub id: u32,
}

#[derive(Debug, Clone, Args)]
pub struct LessonsArgs {
    pub course_id: u32,

    /// Search terms, applied in order as if typed one after another.
    #[arg(long = "search")]
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct SaveArgs {
    pub id: u32,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long = "long-description")]
    pub long_description: Option<String>,

    /// Restore the course locally if the server rejects the change.
    #[arg(long)]
    pub rollback: bool,
}

impl SaveArgs {
    fn changes(&self) -> Result<Value> {
        let mut changes = Map::new();
        let fields = [
            ("description", &self.description),
            ("category", &self.category),
            ("longDescription", &self.long_description),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                changes.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        if changes.is_empty() {
            return Err(DemoError::invalid(
                "nothing to save: pass --description, --category or --long-description",
            ));
        }
        Ok(Value::Object(changes))
    }
}

/// Output shape shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    fn emit<T: Serialize>(
        self,
        out: &mut dyn Write,
        value: &T,
        text: impl FnOnce(&mut dyn Write) -> std::io::Result<()>,
    ) -> Result<()> {
        if self.json {
            writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
        } else {
            text(out)?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Listing<'a> {
    beginner: &'a [Course],
    advanced: &'a [Course],
}

fn write_courses(out: &mut dyn Write, title: &str, courses: &[Course]) -> std::io::Result<()> {
    writeln!(out, "{title} ({})", courses.len())?;
    for course in courses {
        writeln!(out, "  #{:<4} {:<10} {}", course.id, course.category, course.description)?;
    }
    Ok(())
}

pub fn run_courses(
    session: &Session,
    config: &StoreConfig,
    args: CoursesArgs,
    output: Output,
    out: &mut dyn Write,
) -> Result<()> {
    let catalog = Catalog::new(
        session.client(),
        config,
        CatalogOptions {
            retries: args.retries,
            ..CatalogOptions::default()
        },
    );
    match args.category {
        Some(Category::Beginner) => {
            let courses = session.first(&catalog.beginner_courses(), "beginner courses")?;
            output.emit(out, &courses, |out| write_courses(out, "Beginner", &courses))
        }
        Some(Category::Advanced) => {
            let courses = session.first(&catalog.advanced_courses(), "advanced courses")?;
            output.emit(out, &courses, |out| write_courses(out, "Advanced", &courses))
        }
        None => {
            let beginner = session.first(&catalog.beginner_courses(), "beginner courses")?;
            let advanced = session.first(&catalog.advanced_courses(), "advanced courses")?;
            let both = Listing {
                beginner: &beginner,
                advanced: &advanced,
            };
            output.emit(out, &both, |out| {
                write_courses(out, "Beginner", &beginner)?;
                write_courses(out, "Advanced", &advanced)
            })
        }
    }
}

pub fn run_course(
    session: &Session,
    config: &StoreConfig,
    args: CourseArgs,
    output: Output,
    out: &mut dyn Write,
) -> Result<()> {
    let search = LessonSearch::new(session.client().clone(), config.clone(), args.id);
    let course = session.first(&search.course(), "course")?;
    output.emit(out, &course, |out| {
        writeln!(out, "#{} {} [{}]", course.id, course.description, course.category)?;
        if !course.long_description.is_empty() {
            writeln!(out, "{}", course.long_description)?;
        }
        Ok(())
    })
}

pub fn run_lessons(
    session: &Session,
    config: &StoreConfig,
    args: LessonsArgs,
    output: Output,
    out: &mut dyn Write,
) -> Result<()> {
    let search = LessonSearch::new(session.client().clone(), config.clone(), args.course_id);
    let terms = Subject::<String>::new();

    let latest: Rc<RefCell<Option<std::result::Result<Vec<Lesson>, HttpError>>>> =
        Rc::new(RefCell::new(None));
    let slot = Rc::clone(&latest);
    let failed = Rc::clone(&latest);
    let subscription = search.search(terms.as_stream()).subscribe_with(
        move |lessons: Vec<Lesson>| *slot.borrow_mut() = Some(Ok(lessons)),
        move |error: HttpError| *failed.borrow_mut() = Some(Err(error)),
        || {},
    );
    session.settle();
    for term in args.terms {
        tracing::info!(term = %term, "searching");
        terms.next(term);
        session.settle();
    }
    subscription.unsubscribe();

    let result = latest.borrow_mut().take();
    let lessons = match result {
        Some(result) => result?,
        None => {
            return Err(DemoError::NoAnswer {
                what: "lessons".to_string(),
            });
        }
    };
    output.emit(out, &lessons, |out| {
        writeln!(out, "Lessons ({})", lessons.len())?;
        for lesson in &lessons {
            writeln!(out, "  {:>3}. {} ({})", lesson.seq_no, lesson.description, lesson.duration)?;
        }
        Ok(())
    })
}

pub fn run_save(
    session: &Session,
    config: &StoreConfig,
    args: SaveArgs,
    output: Output,
    out: &mut dyn Write,
) -> Result<()> {
    let changes = args.changes()?;
    let policy = if args.rollback {
        SavePolicy::RollbackOnFailure
    } else {
        SavePolicy::Optimistic
    };
    // Loaded here rather than through `init`, which only logs a failure.
    let loaded = session.first(
        &session.client().get_json::<CoursesPayload>(&config.courses_path),
        "courses",
    )?;
    let store = CourseStore::with_courses(
        session.client().clone(),
        config.clone().with_save_policy(policy),
        loaded.into_courses(),
    );

    let response = session.first(&store.save_course(args.id, changes), "save")?;
    tracing::info!(course = args.id, status = response.status, "course saved");

    let saved = store
        .snapshot()
        .into_iter()
        .find(|course| course.id == args.id)
        .ok_or_else(|| DemoError::from(StoreError::UnknownCourse { id: args.id }))?;
    output.emit(out, &saved, |out| {
        writeln!(out, "saved #{} ({}): {}", saved.id, response.status, saved.description)
    })
}
