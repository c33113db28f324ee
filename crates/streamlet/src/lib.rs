#![forbid(unsafe_code)]

//! Streamlet public facade crate.
//!
//! The prelude carries the member crates under short names together with
//! the types most code needs.

pub mod prelude {
    pub use streamlet_core as core;
    #[cfg(feature = "courses")]
    pub use streamlet_courses as courses;
    #[cfg(feature = "http")]
    pub use streamlet_http as http;

    pub use streamlet_core::{
        AsyncSubject, BehaviorSubject, LogLevel, Notification, Observer, ReplaySubject, Stream,
        StreamState, Subject, Subscriber, Subscription, SubscriptionGuard,
    };

    #[cfg(feature = "courses")]
    pub use streamlet_courses::{
        Catalog, Course, CourseEditor, CourseStore, Emitter, LessonSearch, StoreConfig, StoreError,
    };
    #[cfg(feature = "http")]
    pub use streamlet_http::{
        EventLoop, HttpClient, HttpConfig, HttpError, ReqwestTransport, Transport,
    };
}
