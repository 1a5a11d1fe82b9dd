//! Import orchestration: file import, content import and projection.

use std::fs;
use std::io::Read;
use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::catalog::core::config::{
    ContentJobConfig, ConversionLimits, FileJobConfig, ImportConfig, JobConfig,
    ProjectionJobConfig,
};
use crate::catalog::core::errors::{ImportError, ImportResult};
use crate::catalog::core::hierarchy::Hierarchy;
use crate::catalog::core::ids::CategoryId;
use crate::catalog::engine::report::{CategoryTree, RunSummary};
use crate::catalog::ingest::{
    ByteTransfer, EnumerationRules, HierarchyMaterializer, RunState, UploadsDir, content_type_for,
    enumerate_sources,
};
use crate::catalog::normalize::{
    ContentNormalizer, ContentOutcome, NameNormalizer, RichTextConverter, SkipReason,
    SourceFormat, with_title_heading,
};
use crate::catalog::reconcile::{build_path_index, mirror_hierarchy, reconcile};
use crate::catalog::storage::{
    CategoryStore, DocumentPayload, DocumentStore, FileMeta, NewDocument, SqliteCatalog,
    ensure_schema, now_timestamp,
};

/// Everything a finished job reports.
#[derive(Clone, Debug)]
pub struct JobReport {
    /// Job name.
    pub job: String,
    /// Hierarchy written to.
    pub hierarchy: Hierarchy,
    /// Counters.
    pub summary: RunSummary,
    /// Target hierarchy after the run.
    pub tree: CategoryTree,
}

/// Runs configured import jobs against a catalog database.
pub struct ImportEngine {
    config: ImportConfig,
    content: ContentNormalizer,
}

impl ImportEngine {
    /// Create an engine with the bundled converters.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ImportConfig) -> ImportResult<Self> {
        config.validate()?;
        let content = ContentNormalizer::new(config.limits.clone())?;
        Ok(Self { config, content })
    }

    /// Create an engine with a custom rich-text converter.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_rich_text(
        config: ImportConfig,
        rich_text: Box<dyn RichTextConverter>,
    ) -> ImportResult<Self> {
        config.validate()?;
        let content = ContentNormalizer::with_rich_text(config.limits.clone(), rich_text)?;
        Ok(Self { config, content })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Run a named job in one transaction, committed only on success.
    ///
    /// # Errors
    /// Returns an error if the job is unknown or hits a fatal failure; the
    /// transaction is rolled back in that case.
    pub fn run_job(&self, conn: &mut Connection, name: &str) -> ImportResult<JobReport> {
        let job = self.config.job(name)?;
        let hierarchy = job.target();
        info!(job = name, %hierarchy, "starting import job");

        if let JobConfig::Projection(projection) = job {
            if !projection.uploads_dir.is_dir() {
                return Err(ImportError::MissingSource(projection.uploads_dir.clone()));
            }
        }

        let tx = conn.transaction()?;
        let summary = match job {
            JobConfig::Files(files) => {
                let uploads = UploadsDir::create(&files.uploads_dir)?;
                self.run_file_import(&tx, files, &uploads)?
            }
            JobConfig::Content(content) => self.run_content_import(&tx, content)?,
            JobConfig::Projection(projection) => self.run_projection(&tx, projection)?,
        };
        let tree = CategoryTree::load(&SqliteCatalog::new(&tx, hierarchy))?;
        tx.commit()?;

        info!(
            job = name,
            imported = summary.imported,
            skipped = summary.skipped,
            failed = summary.failed,
            "import job committed"
        );
        Ok(JobReport {
            job: name.to_string(),
            hierarchy,
            summary,
            tree,
        })
    }

    /// Copy files into the uploads directory and record them in the job's
    /// hierarchy.
    ///
    /// # Errors
    /// Returns an error on fatal failures (missing root, storage errors other
    /// than per-document uniqueness).
    pub fn run_file_import(
        &self,
        conn: &Connection,
        job: &FileJobConfig,
        transfer: &dyn ByteTransfer,
    ) -> ImportResult<RunSummary> {
        ensure_schema(conn, job.hierarchy)?;
        let rules = EnumerationRules::new(&self.config.naming.skip_dir_patterns, &job.include_extensions)?;
        let items = enumerate_sources(&job.source_dir, &rules)?;
        info!(root = %job.source_dir.display(), files = items.len(), "enumerated source files");

        let store = SqliteCatalog::new(conn, job.hierarchy);
        if job.reset_existing {
            store.clear_hierarchy()?;
            info!(hierarchy = %job.hierarchy, "cleared existing rows");
        }

        let names = self.names(job.use_aliases)?;
        let materializer = HierarchyMaterializer::new(&store, &names);
        let mut state = RunState::new();
        let mut summary = RunSummary::default();
        let timestamp = now_timestamp();

        for item in &items {
            let category = materializer.resolve_path(&item.relative_path, &mut state.category_orders)?;
            let file_name = item.file_name();

            let file_size = match fs::metadata(&item.absolute_path) {
                Ok(meta) => meta.len(),
                Err(err) => {
                    warn!(path = %item.absolute_path.display(), "cannot stat source file: {err}");
                    summary.failed += 1;
                    continue;
                }
            };

            let title = state
                .titles
                .reserve(&store, &names.clean_title(&file_name), category)?;
            let sort_order = state.next_document_order(&store, category)?;
            let document = NewDocument {
                title: title.clone(),
                category,
                sort_order,
                payload: DocumentPayload::File(FileMeta {
                    file_name: file_name.clone(),
                    content_type: content_type_for(&item.absolute_path),
                    file_size,
                }),
                timestamp: timestamp.clone(),
            };

            let id = match store.create_pending(&document) {
                Ok(id) => id,
                Err(err) if err.is_constraint_violation() => {
                    warn!(%title, %category, "duplicate document: {err}");
                    state.release_document(category, &title, sort_order);
                    summary.failed += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };

            match transfer.store(id, &item.absolute_path, &file_name) {
                Ok(stored) => {
                    store.finalize(id, &stored)?;
                    debug!(document = %id, %stored, "imported file");
                    summary.imported += 1;
                }
                Err(err) => {
                    warn!(path = %item.absolute_path.display(), "copy failed: {err}");
                    store.discard(id)?;
                    state.release_document(category, &title, sort_order);
                    summary.failed += 1;
                }
            }
        }

        fill_category_counts(&store, &mut summary)?;
        Ok(summary)
    }

    /// Convert files to HTML and store the bodies in the job's hierarchy.
    ///
    /// # Errors
    /// Returns an error on fatal failures (missing root, storage errors other
    /// than per-document uniqueness).
    pub fn run_content_import(
        &self,
        conn: &Connection,
        job: &ContentJobConfig,
    ) -> ImportResult<RunSummary> {
        ensure_schema(conn, job.hierarchy)?;
        let rules = EnumerationRules::new(&self.config.naming.skip_dir_patterns, &job.include_extensions)?;
        let items = enumerate_sources(&job.source_dir, &rules)?;
        info!(root = %job.source_dir.display(), files = items.len(), "enumerated source files");

        let store = SqliteCatalog::new(conn, job.hierarchy);
        let names = self.names(job.use_aliases)?;
        let materializer = HierarchyMaterializer::new(&store, &names);
        let mut state = RunState::new();
        let mut summary = RunSummary::default();
        let timestamp = now_timestamp();

        for item in &items {
            let category = materializer.resolve_path(&item.relative_path, &mut state.category_orders)?;
            let candidate = names.clean_title(&item.file_name());

            let html = match self.convert_path(&item.absolute_path, &item.format) {
                Ok(ContentOutcome::Html(html)) => html,
                Ok(ContentOutcome::NoContent(reason)) => {
                    debug!(path = %item.relative_path.display(), %reason, "skipped");
                    summary.skipped += 1;
                    continue;
                }
                Err(err) => {
                    warn!(path = %item.absolute_path.display(), "cannot read source file: {err}");
                    summary.failed += 1;
                    continue;
                }
            };

            let title = state.titles.reserve(&store, &candidate, category)?;
            let heading = title.clone();
            if store_html(&store, &mut state, category, title, &heading, &html, &timestamp)? {
                summary.imported += 1;
            } else {
                summary.failed += 1;
            }
        }

        fill_category_counts(&store, &mut summary)?;
        Ok(summary)
    }

    /// Convert the uploaded files of one hierarchy into HTML documents of
    /// another, matching categories by path.
    ///
    /// # Errors
    /// Returns an error on fatal storage failures.
    pub fn run_projection(
        &self,
        conn: &Connection,
        job: &ProjectionJobConfig,
    ) -> ImportResult<RunSummary> {
        ensure_schema(conn, job.source)?;
        ensure_schema(conn, job.target)?;
        let source = SqliteCatalog::new(conn, job.source);
        let target = SqliteCatalog::new(conn, job.target);
        let names = NameNormalizer::without_aliases()?;
        let materializer = HierarchyMaterializer::new(&target, &names);
        let mut state = RunState::new();

        let source_nodes = source.load_categories()?;
        if job.mirror_categories {
            let mirrored = mirror_hierarchy(&source_nodes, &materializer, &mut state.category_orders)?;
            info!(categories = mirrored.len(), "mirrored source categories");
        }

        if job.replace_existing {
            let cleared = target.clear_documents()?;
            state.reset();
            info!(hierarchy = %job.target, cleared, "cleared existing documents");
        }

        let mapping = reconcile(
            &build_path_index(&source_nodes),
            &build_path_index(&target.load_categories()?),
        );
        info!(
            mapped = mapping.mapping.len(),
            unmapped = mapping.unmapped.len(),
            "reconciled categories"
        );

        let documents = source.list_file_documents()?;
        info!(documents = documents.len(), "projecting stored files");
        let mut summary = RunSummary::default();
        let mut unmapped = 0;
        let timestamp = now_timestamp();

        for document in &documents {
            let Some(category) = mapping.target_of(document.category) else {
                unmapped += 1;
                continue;
            };

            let format = SourceFormat::from_path(Path::new(&document.file_name));
            if !format.is_convertible() {
                summary.skipped += 1;
                continue;
            }

            let path = job.uploads_dir.join(&document.stored_file_name);
            if document.stored_file_name.is_empty() || !path.is_file() {
                warn!(document = %document.id, path = %path.display(), "stored file missing");
                summary.failed += 1;
                continue;
            }

            let html = match self.convert_path(&path, &format) {
                Ok(ContentOutcome::Html(html)) => html,
                Ok(ContentOutcome::NoContent(reason)) => {
                    debug!(document = %document.id, %reason, "skipped");
                    summary.skipped += 1;
                    continue;
                }
                Err(err) => {
                    warn!(path = %path.display(), "cannot read stored file: {err}");
                    summary.failed += 1;
                    continue;
                }
            };

            let title = state.titles.reserve(&target, &document.title, category)?;
            if store_html(&target, &mut state, category, title, &document.title, &html, &timestamp)? {
                summary.imported += 1;
            } else {
                summary.failed += 1;
            }
        }

        summary.unmapped_categories = Some(unmapped);
        fill_category_counts(&target, &mut summary)?;
        Ok(summary)
    }

    fn names(&self, use_aliases: bool) -> ImportResult<NameNormalizer> {
        let names = if use_aliases {
            NameNormalizer::new(self.config.naming.aliases.clone())?
        } else {
            NameNormalizer::without_aliases()?
        };
        Ok(names)
    }

    /// Read within the size ceiling, normalize, then apply the minimum body
    /// length.
    fn convert_path(&self, path: &Path, format: &SourceFormat) -> std::io::Result<ContentOutcome> {
        if !format.is_convertible() {
            return Ok(ContentOutcome::NoContent(SkipReason::UnsupportedFormat));
        }
        let Some(payload) = read_bounded(path, self.content.limits())? else {
            return Ok(ContentOutcome::NoContent(SkipReason::TooLarge));
        };
        Ok(self.content.normalize(&payload, format).require_min_body())
    }
}

/// Read a whole file unless it exceeds the input ceiling.
fn read_bounded(path: &Path, limits: &ConversionLimits) -> std::io::Result<Option<Vec<u8>>> {
    let file = fs::File::open(path)?;
    if file.metadata()?.len() > limits.max_input_bytes {
        return Ok(None);
    }

    let mut payload = Vec::new();
    file.take(limits.max_input_bytes.saturating_add(1))
        .read_to_end(&mut payload)?;
    if u64::try_from(payload.len()).map_or(true, |len| len > limits.max_input_bytes) {
        return Ok(None);
    }
    Ok(Some(payload))
}

/// Insert one HTML document under `title`, headed by `heading`.
///
/// Returns `false` when the title collides with a persisted row.
fn store_html(
    store: &SqliteCatalog<'_>,
    state: &mut RunState,
    category: CategoryId,
    title: String,
    heading: &str,
    html: &str,
    timestamp: &str,
) -> ImportResult<bool> {
    let sort_order = state.next_document_order(store, category)?;
    let document = NewDocument {
        title,
        category,
        sort_order,
        payload: DocumentPayload::Html(with_title_heading(heading, html)),
        timestamp: timestamp.to_string(),
    };

    match store.create_pending(&document) {
        Ok(id) => {
            debug!(document = %id, title = %document.title, "stored document");
            Ok(true)
        }
        Err(err) if err.is_constraint_violation() => {
            warn!(title = %document.title, %category, "duplicate document: {err}");
            state.release_document(category, &document.title, sort_order);
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

fn fill_category_counts(store: &SqliteCatalog<'_>, summary: &mut RunSummary) -> ImportResult<()> {
    let (total, roots) = store.category_counts()?;
    summary.categories_total = total;
    summary.categories_root = roots;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::{Cursor, Write};
    use std::path::PathBuf;

    use super::*;
    use crate::catalog::core::ids::DocumentId;
    use crate::catalog::storage::ensure_all;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_all(&conn).unwrap();
        conn
    }

    fn write(root: &Path, relative: &str, bytes: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn docx(paragraph: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{paragraph}</w:t></w:r></w:p></w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn legacy(text: &str) -> Vec<u8> {
        let mut payload = vec![0u8; 16];
        payload.extend_from_slice(text.as_bytes());
        payload.extend(vec![0u8; 16]);
        payload
    }

    fn config_with_aliases() -> ImportConfig {
        let mut config = ImportConfig::default();
        let mut aliases = BTreeMap::new();
        aliases.insert("FINANCE PROTOCOLs".to_string(), "Finance".to_string());
        config.naming.aliases = aliases;
        config
    }

    fn file_job(source: &Path, uploads: &Path) -> FileJobConfig {
        FileJobConfig {
            source_dir: source.to_path_buf(),
            uploads_dir: uploads.to_path_buf(),
            ..FileJobConfig::default()
        }
    }

    struct FailingTransfer;

    impl ByteTransfer for FailingTransfer {
        fn store(&self, _id: DocumentId, _source: &Path, _file_name: &str) -> ImportResult<String> {
            Err(ImportError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn test_file_import_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("DOCUMENTS");
        write(&source, "Finance/02 Budgets/plan.pdf", b"%PDF");
        write(&source, "Finance/02 Budgets/plan.docx", b"PK");
        write(&source, "Finance/zz archive/old.pdf", b"%PDF");
        write(&source, "~$lock.docx", b"");
        write(&source, "intake_form.pdf", b"%PDF");
        write(&source, "notes.exe", b"MZ");

        let uploads = UploadsDir::create(dir.path().join("uploads")).unwrap();
        let engine = ImportEngine::new(ImportConfig::default()).unwrap();
        let conn = open();
        let job = file_job(&source, uploads.root());

        let summary = engine.run_file_import(&conn, &job, &uploads).unwrap();
        assert_eq!(summary.imported, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.categories_total, 3);
        assert_eq!(summary.categories_root, 2);

        let store = SqliteCatalog::new(&conn, Hierarchy::Documents);
        let files = store.list_file_documents().unwrap();
        let titles: Vec<&str> = files.iter().map(|f| f.title.as_str()).collect();
        assert!(titles.contains(&"plan"));
        assert!(titles.contains(&"plan (2)"));
        assert!(titles.contains(&"intake form"));
        for file in &files {
            assert_eq!(file.stored_file_name, format!("{}_{}", file.id, file.file_name));
            assert!(uploads.path_of(&file.stored_file_name).is_file());
        }

        let again = engine.run_file_import(&conn, &job, &uploads).unwrap();
        assert_eq!(again.categories_total, 3);
        assert_eq!(again.imported, 3);
        let titles: Vec<String> = store
            .list_file_documents()
            .unwrap()
            .into_iter()
            .map(|f| f.title)
            .collect();
        assert!(titles.contains(&"plan (3)".to_string()));
    }

    #[test]
    fn test_positions_follow_enumeration_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("DOCUMENTS");
        write(&source, "A/1.txt", b"one");
        write(&source, "A/2.txt", b"two");
        write(&source, "B/3.txt", b"three");

        let uploads = UploadsDir::create(dir.path().join("uploads")).unwrap();
        let engine = ImportEngine::new(ImportConfig::default()).unwrap();
        let conn = open();
        let summary = engine
            .run_file_import(&conn, &file_job(&source, uploads.root()), &uploads)
            .unwrap();
        assert_eq!(summary.imported, 3);

        let store = SqliteCatalog::new(&conn, Hierarchy::Documents);
        let roots: Vec<(String, i64)> = store
            .load_categories()
            .unwrap()
            .into_iter()
            .filter(|node| node.parent.is_none())
            .map(|node| (node.name, node.sort_order))
            .collect();
        assert_eq!(roots, vec![("A".to_string(), 0), ("B".to_string(), 1)]);

        let mut positions: Vec<(String, i64)> = store
            .list_file_documents()
            .unwrap()
            .into_iter()
            .map(|file| (file.title, file.sort_order))
            .collect();
        positions.sort();
        assert_eq!(
            positions,
            vec![
                ("1".to_string(), 0),
                ("2".to_string(), 1),
                ("3".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_file_import_reset_existing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("PROTOCOLS");
        write(&source, "FINANCE PROTOCOLs/budget.xlsx", b"PK");

        let uploads = UploadsDir::create(dir.path().join("sop-uploads")).unwrap();
        let engine = ImportEngine::new(config_with_aliases()).unwrap();
        let conn = open();
        let job = FileJobConfig {
            hierarchy: Hierarchy::SopFiles,
            use_aliases: true,
            reset_existing: true,
            ..file_job(&source, uploads.root())
        };

        engine.run_file_import(&conn, &job, &uploads).unwrap();
        let summary = engine.run_file_import(&conn, &job, &uploads).unwrap();
        assert_eq!(summary.imported, 1);

        let store = SqliteCatalog::new(&conn, Hierarchy::SopFiles);
        let files = store.list_file_documents().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].title, "budget");
        assert!(store.find_category("Finance", None).unwrap().is_some());
        assert_eq!(files[0].sort_order, 0);
    }

    #[test]
    fn test_failed_transfer_leaves_no_row() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("DOCUMENTS");
        write(&source, "a.pdf", b"%PDF");
        write(&source, "b.pdf", b"%PDF");

        let engine = ImportEngine::new(ImportConfig::default()).unwrap();
        let conn = open();
        let job = file_job(&source, &dir.path().join("unused"));

        let summary = engine.run_file_import(&conn, &job, &FailingTransfer).unwrap();
        assert_eq!(summary.imported, 0);
        assert_eq!(summary.failed, 2);

        let store = SqliteCatalog::new(&conn, Hierarchy::Documents);
        assert!(store.list_file_documents().unwrap().is_empty());
        let general = store.find_category("General", None).unwrap().unwrap();
        assert_eq!(store.next_document_sort_order(general).unwrap(), 0);
    }

    #[test]
    fn test_content_import() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("PROTOCOLS");
        write(&source, "FINANCE PROTOCOLs/Policy.docx", &docx("Receipts go in the blue folder."));
        write(&source, "FINANCE PROTOCOLs/Policy.doc", &legacy(&"Legacy policy text about receipts. ".repeat(3)));
        write(&source, "FINANCE PROTOCOLs/Policy.xlsx", b"not a workbook");
        write(&source, "FINANCE PROTOCOLs/empty.docx", &docx(""));
        write(&source, "z old/hidden.docx", &docx("never seen"));

        let engine = ImportEngine::new(config_with_aliases()).unwrap();
        let conn = open();
        let job = ContentJobConfig {
            source_dir: source,
            ..ContentJobConfig::default()
        };

        let summary = engine.run_content_import(&conn, &job).unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.categories_total, 1);

        let store = SqliteCatalog::new(&conn, Hierarchy::Protocols);
        let finance = store.find_category("Finance", None).unwrap().unwrap();
        let mut titles = store.titles_in_category(finance).unwrap();
        titles.sort();
        assert_eq!(titles, vec!["Policy".to_string(), "Policy (2)".to_string()]);

        let body: String = conn
            .query_row(
                "SELECT HtmlContent FROM Documents WHERE Title = 'Policy'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(body.starts_with("<h1>Policy</h1>\n<p>Legacy policy text"));

        let second: String = conn
            .query_row(
                "SELECT HtmlContent FROM Documents WHERE Title = 'Policy (2)'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(second.starts_with("<h1>Policy (2)</h1>\n<p>Receipts go"));
    }

    #[test]
    fn test_projection_maps_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadsDir::create(dir.path().join("uploads")).unwrap();
        let conn = open();

        let source = SqliteCatalog::new(&conn, Hierarchy::Documents);
        let finance = source.insert_category("Finance", None, 0).unwrap();
        let budgets = source.insert_category("Budgets", Some(finance), 0).unwrap();
        let taxes = source.insert_category("Taxes", Some(finance), 1).unwrap();

        let add = |title: &str, file_name: &str, category: CategoryId, bytes: Option<&[u8]>| {
            let id = source
                .create_pending(&NewDocument {
                    title: title.to_string(),
                    category,
                    sort_order: 0,
                    payload: DocumentPayload::File(FileMeta {
                        file_name: file_name.to_string(),
                        content_type: content_type_for(Path::new(file_name)),
                        file_size: 0,
                    }),
                    timestamp: now_timestamp(),
                })
                .unwrap();
            let stored = format!("{id}_{file_name}");
            if let Some(bytes) = bytes {
                fs::write(uploads.path_of(&stored), bytes).unwrap();
            }
            source.finalize(id, &stored).unwrap();
        };
        add("Plan <2024>", "plan.docx", budgets, Some(docx("Spend less than we earn.").as_slice()));
        add("Scan", "scan.pdf", budgets, Some(b"%PDF".as_slice()));
        add("Gone", "gone.docx", budgets, None);
        add("Filing", "filing.docx", taxes, Some(docx("File before April.").as_slice()));

        let target = SqliteCatalog::new(&conn, Hierarchy::WebDocs);
        let web_finance = target.insert_category("Finance", None, 0).unwrap();
        target.insert_category("Budgets", Some(web_finance), 0).unwrap();

        let engine = ImportEngine::new(ImportConfig::default()).unwrap();
        let job = ProjectionJobConfig {
            uploads_dir: uploads.root().to_path_buf(),
            mirror_categories: false,
            ..ProjectionJobConfig::default()
        };
        let summary = engine.run_projection(&conn, &job).unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.unmapped_categories, Some(1));

        let body: String = conn
            .query_row("SELECT HtmlContent FROM WebDocuments", [], |row| row.get(0))
            .unwrap();
        assert!(body.starts_with("<h1>Plan &lt;2024&gt;</h1>\n<p>Spend less"));

        let mirrored = ProjectionJobConfig {
            mirror_categories: true,
            ..job
        };
        let summary = engine.run_projection(&conn, &mirrored).unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.unmapped_categories, Some(0));
        assert_eq!(summary.categories_total, 3);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM WebDocuments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_run_job_commits_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("DOCUMENTS");
        write(&source, "Forms/intake.pdf", b"%PDF");

        let mut config = ImportConfig::default();
        config.jobs.insert(
            "documents".to_string(),
            JobConfig::Files(file_job(&source, &dir.path().join("uploads"))),
        );
        let engine = ImportEngine::new(config).unwrap();
        let mut conn = open();

        let report = engine.run_job(&mut conn, "documents").unwrap();
        assert_eq!(report.hierarchy, Hierarchy::Documents);
        assert_eq!(report.summary.imported, 1);
        assert_eq!(report.tree.render(), "  Forms (1 docs)\n");

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM OfficeDocuments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_run_job_rolls_back_on_fatal_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ImportConfig::default();
        config.jobs.insert(
            "sops".to_string(),
            JobConfig::Content(ContentJobConfig {
                source_dir: dir.path().join("missing"),
                ..ContentJobConfig::default()
            }),
        );
        let engine = ImportEngine::new(config).unwrap();
        let mut conn = open();

        let err = engine.run_job(&mut conn, "sops").unwrap_err();
        assert!(matches!(err, ImportError::MissingSource(_)));
        assert!(matches!(
            engine.run_job(&mut conn, "nope"),
            Err(ImportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_projection_requires_uploads_dir() {
        let mut config = ImportConfig::default();
        config.jobs.insert(
            "webdocs".to_string(),
            JobConfig::Projection(ProjectionJobConfig {
                uploads_dir: PathBuf::from("/definitely/not/here"),
                ..ProjectionJobConfig::default()
            }),
        );
        let engine = ImportEngine::new(config).unwrap();
        let mut conn = open();
        assert!(matches!(
            engine.run_job(&mut conn, "webdocs"),
            Err(ImportError::MissingSource(_))
        ));
    }

    #[test]
    fn test_read_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        fs::write(&path, vec![b'a'; 32]).unwrap();
        let small = ConversionLimits {
            max_input_bytes: 16,
            ..ConversionLimits::default()
        };
        assert!(read_bounded(&path, &small).unwrap().is_none());
        assert_eq!(
            read_bounded(&path, &ConversionLimits::default()).unwrap().map(|p| p.len()),
            Some(32)
        );
    }
}
