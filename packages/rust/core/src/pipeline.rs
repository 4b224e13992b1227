//! End-to-end export pipeline: config → wallabag → filter → render → assemble → EPUB.

use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use wallabook_epub::{BookWriter, EpubWriter};
use wallabook_shared::{
    Deployment, ExportConfig, ExportOutcome, Result, StoreConfig, load_config_from,
};
use wallabook_store::{ArticleStore, WallabagClient};

use crate::assembler::BookAssembler;
use crate::filter::{Decision, ExportFilter, SkippedEntry};
use crate::render::render_section;

/// Where a run currently is. Any failure jumps straight to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Init,
    ConfigLoaded,
    StoreQueried,
    Processing,
    Assembled,
    Written,
    Done,
    Failed,
}

/// Inputs for [`run`], resolved once by the caller.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Config file to load.
    pub config_path: PathBuf,
    /// Deployment profile supplying the default output path.
    pub deployment: Deployment,
    /// Output path override (takes precedence over the config file).
    pub output: Option<PathBuf>,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the store has reported its article count.
    fn article_count(&self, total: u64);
    /// Called when the filter rejects an entry.
    fn entry_skipped(&self, skipped: &SkippedEntry);
    /// Called after an entry was rendered into the book.
    fn section_added(&self, heading: &str, current: usize, total: usize);
    /// Called when the book has been written.
    fn done(&self, outcome: &ExportOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn article_count(&self, _total: u64) {}
    fn entry_skipped(&self, _skipped: &SkippedEntry) {}
    fn section_added(&self, _heading: &str, _current: usize, _total: usize) {}
    fn done(&self, _outcome: &ExportOutcome) {}
}

/// Tracks and logs stage transitions.
struct StageLog {
    current: Stage,
}

impl StageLog {
    fn new() -> Self {
        Self {
            current: Stage::Init,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = ?self.current, to = ?next, "pipeline stage");
        self.current = next;
    }

    /// Pass `result` through, moving to `Failed` on error.
    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            debug!(stage = ?self.current, error = %e, "pipeline failed");
            self.current = Stage::Failed;
        }
        result
    }
}

/// Run a full export.
///
/// 1. Load the configuration file
/// 2. Authenticate against wallabag
/// 3. Export every qualifying entry into an EPUB (see [`export_articles`])
#[instrument(skip_all, fields(config = %options.config_path.display()))]
pub async fn run(options: &RunOptions, progress: &dyn ProgressReporter) -> Result<ExportOutcome> {
    let mut stages = StageLog::new();

    // --- Step 1: Config ---
    progress.phase("Reading config");
    debug!(path = %options.config_path.display(), "reading config");
    let app_config = stages.check(load_config_from(&options.config_path))?;
    let store_config = stages.check(StoreConfig::try_from(&app_config))?;
    let export_config =
        ExportConfig::resolve(&app_config, options.deployment, options.output.as_deref());
    stages.advance(Stage::ConfigLoaded);

    // --- Step 2: Connect ---
    progress.phase("Connecting to wallabag");
    let store = stages.check(WallabagClient::connect(&store_config).await)?;

    export_staged(&store, &EpubWriter::default(), &export_config, progress, stages).await
}

/// Export all qualifying entries from `store` into a book written by `writer`.
///
/// Entries are processed strictly in store order; skipped entries are
/// reported and never abort the run. Store and write failures are terminal.
pub async fn export_articles(
    store: &dyn ArticleStore,
    writer: &dyn BookWriter,
    config: &ExportConfig,
    progress: &dyn ProgressReporter,
) -> Result<ExportOutcome> {
    let mut stages = StageLog::new();
    stages.advance(Stage::ConfigLoaded);
    export_staged(store, writer, config, progress, stages).await
}

#[instrument(skip_all, fields(output = %config.output_path.display()))]
async fn export_staged(
    store: &dyn ArticleStore,
    writer: &dyn BookWriter,
    config: &ExportConfig,
    progress: &dyn ProgressReporter,
    mut stages: StageLog,
) -> Result<ExportOutcome> {
    // --- Step 3: Query store ---
    progress.phase("Counting articles");
    let reported_total = stages.check(store.total_count().await)?;
    info!(total = reported_total, "There are {reported_total} articles");
    progress.article_count(reported_total);

    progress.phase("Fetching articles");
    let entries = stages.check(store.all_entries().await)?;
    stages.advance(Stage::StoreQueried);

    // --- Step 4: Filter, render, assemble ---
    stages.advance(Stage::Processing);
    progress.phase("Building book");
    let filter = ExportFilter::new(config.min_content_length);
    let mut assembler = BookAssembler::new(config.title.as_str(), config.author.as_str());
    let mut skipped = 0usize;
    let considered = entries.len();

    for (i, entry) in entries.iter().enumerate() {
        match filter.evaluate(entry) {
            Decision::Accept => {
                let section = render_section(entry);
                progress.section_added(&section.heading, i + 1, considered);
                assembler.append(section);
            }
            Decision::Skip(skip) => {
                warn!(
                    id = skip.id,
                    length = skip.content_len,
                    "Skipping {}, too short ({})",
                    skip.title,
                    skip.content_len
                );
                progress.entry_skipped(&skip);
                skipped += 1;
            }
        }
    }

    let book = assembler.finish();
    stages.advance(Stage::Assembled);

    if book.is_empty() {
        warn!(considered, "no entries qualified, writing an empty book");
    }

    // --- Step 5: Write ---
    progress.phase("Writing EPUB");
    stages.check(writer.write(&book, &config.output_path))?;
    stages.advance(Stage::Written);

    let outcome = ExportOutcome {
        reported_total,
        considered,
        accepted: book.len(),
        skipped,
        output_path: config.output_path.clone(),
    };

    progress.done(&outcome);
    stages.advance(Stage::Done);

    info!(
        considered = outcome.considered,
        accepted = outcome.accepted,
        skipped = outcome.skipped,
        path = %outcome.output_path.display(),
        "export complete"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use wallabook_shared::{Book, Entry, WallabookError};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    struct FakeStore {
        entries: Option<Vec<Entry>>,
        count_fails: bool,
    }

    impl FakeStore {
        fn with(entries: Vec<Entry>) -> Self {
            Self {
                entries: Some(entries),
                count_fails: false,
            }
        }
    }

    #[async_trait]
    impl ArticleStore for FakeStore {
        async fn total_count(&self) -> Result<u64> {
            if self.count_fails {
                return Err(WallabookError::store("HTTP 401 Unauthorized"));
            }
            Ok(self.entries.as_ref().map_or(0, |e| e.len() as u64))
        }

        async fn all_entries(&self) -> Result<Vec<Entry>> {
            self.entries
                .clone()
                .ok_or_else(|| WallabookError::store("connection reset"))
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        written: Mutex<Option<(Book, PathBuf)>>,
        fail: bool,
    }

    impl BookWriter for RecordingWriter {
        fn write(&self, book: &Book, path: &Path) -> Result<()> {
            if self.fail {
                return Err(WallabookError::write(path, "disk full"));
            }
            *self.written.lock().unwrap() = Some((book.clone(), path.to_path_buf()));
            Ok(())
        }
    }

    impl RecordingWriter {
        fn book(&self) -> Option<Book> {
            self.written.lock().unwrap().as_ref().map(|(b, _)| b.clone())
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        skipped: Mutex<Vec<(String, usize)>>,
        added: Mutex<Vec<String>>,
        count: Mutex<Option<u64>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, _name: &str) {}
        fn article_count(&self, total: u64) {
            *self.count.lock().unwrap() = Some(total);
        }
        fn entry_skipped(&self, skipped: &SkippedEntry) {
            self.skipped
                .lock()
                .unwrap()
                .push((skipped.title.clone(), skipped.content_len));
        }
        fn section_added(&self, heading: &str, _current: usize, _total: usize) {
            self.added.lock().unwrap().push(heading.to_string());
        }
        fn done(&self, _outcome: &ExportOutcome) {}
    }

    fn entry(id: u64, title: &str, len: usize) -> Entry {
        Entry {
            id,
            title: title.into(),
            content: "x".repeat(len),
        }
    }

    fn export_config() -> ExportConfig {
        ExportConfig {
            title: "Wallabooks".into(),
            author: "Wallabook".into(),
            min_content_length: 500,
            output_path: PathBuf::from("result.epub"),
        }
    }

    // -----------------------------------------------------------------------
    // export_articles
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn mixed_entries_keep_only_long_ones() {
        let store = FakeStore::with(vec![entry(1, "Short", 50), entry(2, "Long", 600)]);
        let writer = RecordingWriter::default();
        let progress = RecordingProgress::default();

        let outcome = export_articles(&store, &writer, &export_config(), &progress)
            .await
            .unwrap();

        let book = writer.book().expect("book written");
        assert_eq!(book.len(), 1);
        assert_eq!(book.sections[0].heading, "Long");
        assert!(book.sections[0].body.starts_with("<h1>Long</h1>\n"));
        assert!(book.sections[0].body.ends_with(&"x".repeat(600)));

        assert_eq!(*progress.skipped.lock().unwrap(), vec![("Short".to_string(), 50)]);
        assert_eq!(outcome.considered, 2);
        assert_eq!(outcome.accepted, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.reported_total, 2);
    }

    #[tokio::test]
    async fn all_rejected_writes_empty_book() {
        let store = FakeStore::with(vec![entry(1, "A", 10), entry(2, "B", 10)]);
        let writer = RecordingWriter::default();
        let progress = RecordingProgress::default();

        let outcome = export_articles(&store, &writer, &export_config(), &progress)
            .await
            .unwrap();

        assert!(writer.book().expect("book written").is_empty());
        assert_eq!(progress.skipped.lock().unwrap().len(), 2);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.accepted, 0);
    }

    #[tokio::test]
    async fn empty_store_succeeds() {
        let store = FakeStore::with(vec![]);
        let writer = RecordingWriter::default();

        let outcome = export_articles(&store, &writer, &export_config(), &SilentProgress)
            .await
            .unwrap();

        let book = writer.book().expect("book written");
        assert!(book.is_empty());
        assert_eq!(book.title, "Wallabooks");
        assert_eq!(outcome.considered, 0);
    }

    #[tokio::test]
    async fn accepted_entries_keep_store_order() {
        let store = FakeStore::with(vec![
            entry(5, "e", 700),
            entry(4, "d", 3),
            entry(3, "c", 501),
            entry(2, "b", 500),
            entry(1, "a", 900),
        ]);
        let writer = RecordingWriter::default();
        let progress = RecordingProgress::default();

        export_articles(&store, &writer, &export_config(), &progress)
            .await
            .unwrap();

        let book = writer.book().unwrap();
        let headings: Vec<&str> = book.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["e", "c", "a"]);
        assert_eq!(*progress.added.lock().unwrap(), vec!["e", "c", "a"]);
    }

    #[tokio::test]
    async fn store_failure_is_terminal_and_writes_nothing() {
        let store = FakeStore {
            entries: None,
            count_fails: false,
        };
        let writer = RecordingWriter::default();
        let progress = RecordingProgress::default();

        let err = export_articles(&store, &writer, &export_config(), &progress)
            .await
            .unwrap_err();

        assert!(matches!(err, WallabookError::StoreQuery(_)));
        assert!(writer.book().is_none());
        assert!(progress.skipped.lock().unwrap().is_empty());
        assert!(progress.added.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn count_failure_is_terminal() {
        let store = FakeStore {
            entries: Some(vec![entry(1, "Long", 600)]),
            count_fails: true,
        };
        let writer = RecordingWriter::default();
        let progress = RecordingProgress::default();

        let err = export_articles(&store, &writer, &export_config(), &progress)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("401"));
        assert!(progress.count.lock().unwrap().is_none());
        assert!(writer.book().is_none());
    }

    #[tokio::test]
    async fn write_failure_propagates() {
        let store = FakeStore::with(vec![entry(1, "Long", 600)]);
        let writer = RecordingWriter {
            fail: true,
            ..Default::default()
        };

        let err = export_articles(&store, &writer, &export_config(), &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, WallabookError::Write { .. }));
    }

    #[tokio::test]
    async fn threshold_comes_from_config() {
        let store = FakeStore::with(vec![entry(1, "tiny", 20)]);
        let writer = RecordingWriter::default();
        let config = ExportConfig {
            min_content_length: 10,
            ..export_config()
        };

        export_articles(&store, &writer, &config, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(writer.book().unwrap().len(), 1);
    }

    // -----------------------------------------------------------------------
    // run
    // -----------------------------------------------------------------------

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wb-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn run_with_missing_config_fails_before_network() {
        let tmp = temp_dir();
        let options = RunOptions {
            config_path: tmp.join("absent.json"),
            deployment: Deployment::Desktop,
            output: Some(tmp.join("result.epub")),
        };

        let err = run(&options, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, WallabookError::Config { .. }));
        assert!(!tmp.join("result.epub").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn run_exports_from_wallabag() {
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"access_token":"tok"}"#),
            )
            .mount(&server)
            .await;

        let long = "y".repeat(600);
        let page = format!(
            r#"{{"page":1,"limit":100,"pages":1,"total":2,"_embedded":{{"items":[
                {{"id":2,"title":"Short","content":"<p>stub</p>"}},
                {{"id":1,"title":"Long","content":"{long}"}}
            ]}}}}"#
        );
        Mock::given(method("GET"))
            .and(path("/api/entries.json"))
            .and(query_param("perPage", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"page":1,"limit":1,"pages":2,"total":2,"_embedded":{"items":[]}}"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/entries.json"))
            .and(query_param("perPage", "100"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let tmp = temp_dir();
        let config_path = tmp.join("wallabook.toml");
        let output = tmp.join("out").join("result.epub");
        std::fs::write(
            &config_path,
            format!(
                r#"
[wallabag]
url = "{}"
client_id = "1_client"
client_secret = "secret"
username = "reader"
password = "pw"

[export]
output = "{}"
"#,
                server.uri(),
                output.display()
            ),
        )
        .unwrap();

        let options = RunOptions {
            config_path,
            deployment: Deployment::Desktop,
            output: None,
        };
        let progress = RecordingProgress::default();
        let outcome = run(&options, &progress).await.unwrap();

        assert_eq!(outcome.reported_total, 2);
        assert_eq!(outcome.accepted, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.output_path, output);
        assert_eq!(*progress.count.lock().unwrap(), Some(2));

        let file = std::fs::File::open(&output).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        assert!(archive.by_name("EPUB/xhtml/section0001.xhtml").is_ok());
        assert!(archive.by_name("EPUB/xhtml/section0002.xhtml").is_err());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
