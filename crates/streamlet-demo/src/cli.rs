use std::io::Write;

use clap::{Args, Parser, Subcommand};
use streamlet_courses::StoreConfig;
use streamlet_http::HttpConfig;

use crate::commands::{
    CourseArgs, CoursesArgs, LessonsArgs, Output, SaveArgs, run_course, run_courses, run_lessons,
    run_save,
};
use crate::error::Result;
use crate::logging;
use crate::session::{Session, TransportKind};

#[derive(Debug, Parser)]
#[command(
    name = "streamlet-demo",
    about = "Browse and edit courses on a course API server through Streamlet streams",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Server base URL. Falls back to STREAMLET_BASE_URL, then http://localhost:9000.
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout. Falls back to STREAMLET_TIMEOUT_MS.
    #[arg(long = "timeout-ms", global = true)]
    pub timeout_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = TransportKind::Inline, global = true)]
    pub transport: TransportKind,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long = "log", default_value = "info", global = true)]
    pub log_filter: String,
}

impl GlobalArgs {
    /// Environment-backed config with the command-line overrides applied.
    pub fn http_config(&self) -> Result<HttpConfig> {
        let mut config = HttpConfig::from_env()?;
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_timeout_ms(timeout_ms);
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List courses by category.
    Courses(CoursesArgs),

    /// Show one course.
    Course(CourseArgs),

    /// List a course's lessons, optionally searching.
    Lessons(LessonsArgs),

    /// Change a course and save it to the server.
    Save(SaveArgs),
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.global.log_filter)?;
    let session = Session::connect(cli.global.http_config()?, cli.global.transport)?;
    let mut stdout = std::io::stdout().lock();
    run(&session, cli, &mut stdout)
}

pub fn run(session: &Session, cli: Cli, out: &mut dyn Write) -> Result<()> {
    let config = StoreConfig::default();
    let output = Output {
        json: cli.global.json,
    };
    match cli.command {
        Commands::Courses(args) => run_courses(session, &config, args, output, out),
        Commands::Course(args) => run_course(session, &config, args, output, out),
        Commands::Lessons(args) => run_lessons(session, &config, args, output, out),
        Commands::Save(args) => run_save(session, &config, args, output, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamlet_http::{HttpClient, Method, MockTransport};

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "streamlet-demo",
            "courses",
            "--category",
            "advanced",
            "--json",
            "--transport",
            "event-loop",
            "--base-url",
            "http://127.0.0.1:8080",
        ])
        .expect("parses");
        assert!(cli.global.json);
        assert_eq!(cli.global.transport, TransportKind::EventLoop);
        assert_eq!(cli.global.base_url.as_deref(), Some("http://127.0.0.1:8080"));
        assert!(matches!(cli.command, Commands::Courses(_)));
    }

    #[test]
    fn lessons_accepts_repeated_search() {
        let cli = Cli::try_parse_from([
            "streamlet-demo",
            "lessons",
            "4",
            "--search",
            "a",
            "--search",
            "ab",
        ])
        .expect("parses");
        let Commands::Lessons(args) = cli.command else {
            panic!("expected lessons");
        };
        assert_eq!(args.course_id, 4);
        assert_eq!(args.terms, vec!["a", "ab"]);
    }

    #[test]
    fn bad_base_url_is_a_config_error() {
        let global = GlobalArgs {
            base_url: Some("ftp://example.com".into()),
            timeout_ms: None,
            transport: TransportKind::Inline,
            json: false,
            log_filter: "info".into(),
        };
        let error = global.http_config().expect_err("rejected");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn run_dispatches_to_the_command() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "/api/courses/2", 200, r#"{"id":2,"description":"Rx"}"#);
        let session = Session::with_client(HttpClient::new(mock.clone(), HttpConfig::default()));
        let cli = Cli::try_parse_from(["streamlet-demo", "course", "2"]).expect("parses");
        let mut out = Vec::new();
        run(&session, cli, &mut out).expect("runs");
        assert_eq!(String::from_utf8(out).expect("utf-8"), "#2 Rx []\n");
    }
}
