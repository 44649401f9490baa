//! The recreation pipeline.
//!
//! [`Recreator`] copies every entry of a source archive into a new archive:
//!
//! 1. **Opened**: the source archive is available.
//! 2. **Planned**: entries are ordered by the cluster holding them
//!    ([`plan_cluster_order`]), so content the source compressed together is
//!    fed to the target together.
//! 3. **Creating**: each entry is wrapped in an [`EntryAdapter`] and added
//!    to the target, except entries of the generated index namespaces
//!    (`X`, `Z`), which the target regenerates itself.
//! 4. **Finished**: the target is finalized with the source's main and
//!    layout pages.
//!
//! Any error aborts the run; the output file is then incomplete and should
//! be discarded.
//!
//! # Example
//!
//! ```rust,no_run
//! use zimrecreate::progress::NoProgress;
//! use zimrecreate::read::Archive;
//! use zimrecreate::recreate::{RecreateOptions, Recreator};
//! use zimrecreate::Compression;
//!
//! let source = Archive::open_path("wikipedia.zim")?;
//! let options = RecreateOptions::new().compression(Compression::Zstd);
//! let mut recreator = Recreator::new(source, &options);
//! let result = recreator.run("wikipedia-zstd.zim".as_ref(), NoProgress)?;
//! println!("{} entries copied", result.entries_submitted);
//! # Ok::<(), zimrecreate::Error>(())
//! ```

mod adapter;
mod plan;

#[cfg(test)]
pub(crate) mod fixtures;

pub use adapter::{EntryAdapter, is_compressible_mime, is_indexable_mime};
pub use plan::{OrderedIndexList, PlannedEntry, plan_cluster_order};

use std::fmt;
use std::path::Path;

use crate::codec::Compression;
use crate::format::namespace;
use crate::progress::{Phase, ProgressReporter};
use crate::read::Archive;
use crate::source::{SourceArchive, SourceEntry};
use crate::write::{ArchiveBuilder, CreateResult, Creator, CreatorOptions, EntryUrl, SpecialPages};
use crate::{Error, Result};

/// Language of the title index built for recreated archives.
pub const DEFAULT_INDEXING_LANGUAGE: &str = "eng";

/// Cluster fill threshold used for recreated archives, in KiB.
pub const RECREATE_MIN_CHUNK_SIZE: u32 = 2048;

/// Options of a recreation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecreateOptions {
    /// Codec of the target's compressed clusters.
    pub compression: Compression,
    /// Title index language; `None` disables indexing.
    pub indexing: Option<String>,
    /// Cluster fill threshold in KiB.
    pub min_chunk_size: u32,
}

impl Default for RecreateOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Lzma,
            indexing: Some(DEFAULT_INDEXING_LANGUAGE.to_owned()),
            min_chunk_size: RECREATE_MIN_CHUNK_SIZE,
        }
    }
}

impl RecreateOptions {
    /// Creates the default options: xz, indexing in English, 2 MiB clusters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the codec.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Sets or disables the title index language.
    pub fn indexing(mut self, language: Option<String>) -> Self {
        self.indexing = language;
        self
    }

    /// Sets the cluster fill threshold in KiB.
    pub fn min_chunk_size(mut self, kib: u32) -> Self {
        self.min_chunk_size = kib;
        self
    }

    /// Returns the matching writer options.
    pub fn creator_options(&self) -> CreatorOptions {
        CreatorOptions {
            indexing: self.indexing.clone(),
            ..CreatorOptions::default()
        }
        .min_chunk_size(self.min_chunk_size)
    }
}

/// Stage reached by a [`Recreator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecreateState {
    /// Source opened, nothing done yet.
    Opened,
    /// Emission order computed.
    Planned,
    /// Target started; entries being submitted.
    Creating,
    /// Target finalized.
    Finished,
}

impl fmt::Display for RecreateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Opened => "opened",
            Self::Planned => "planned",
            Self::Creating => "creating",
            Self::Finished => "finished",
        })
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecreateResult<T> {
    /// Entries in the plan (all source entries).
    pub entries_planned: u32,
    /// Entries handed to the target.
    pub entries_submitted: u32,
    /// Generated index entries left out.
    pub entries_skipped: u32,
    /// What the target builder reported.
    pub summary: T,
}

/// Main and layout pages of a source archive, as URLs.
#[derive(Debug)]
pub struct SourcePages<'a, S> {
    source: &'a S,
}

impl<'a, S: SourceArchive> SourcePages<'a, S> {
    /// Wraps a source archive.
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    fn page_url(&self, index: Option<u32>) -> Result<Option<EntryUrl>> {
        index
            .map(|index| {
                let entry = self.source.entry(index)?;
                Ok(EntryUrl::new(entry.namespace(), entry.url()))
            })
            .transpose()
    }
}

impl<S: SourceArchive> SpecialPages for SourcePages<'_, S> {
    fn main_url(&self) -> Result<Option<EntryUrl>> {
        self.page_url(self.source.main_page())
    }

    fn layout_url(&self) -> Result<Option<EntryUrl>> {
        self.page_url(self.source.layout_page())
    }
}

/// Drives one recreation from a source archive into a target builder.
#[derive(Debug)]
pub struct Recreator<S, B> {
    source: S,
    builder: B,
    compression: Compression,
    state: RecreateState,
}

impl<S: SourceArchive> Recreator<S, Creator> {
    /// Recreates `source` with the ZIM [`Creator`] configured by `options`.
    pub fn new(source: S, options: &RecreateOptions) -> Self {
        Self::with_builder(
            source,
            Creator::new(options.creator_options()),
            options.compression,
        )
    }
}

impl<S: SourceArchive, B: ArchiveBuilder> Recreator<S, B> {
    /// Recreates `source` into an arbitrary builder.
    pub fn with_builder(source: S, builder: B, compression: Compression) -> Self {
        log::debug!("Recreation opened: {} entries", source.entry_count());
        Self {
            source,
            builder,
            compression,
            state: RecreateState::Opened,
        }
    }

    /// Returns the stage reached so far.
    pub fn state(&self) -> RecreateState {
        self.state
    }

    /// Returns the source archive.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the target builder.
    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Releases the source and the builder.
    pub fn into_parts(self) -> (S, B) {
        (self.source, self.builder)
    }

    fn advance(&mut self, next: RecreateState) {
        log::info!("Recreation {} -> {}", self.state, next);
        self.state = next;
    }

    /// Runs the whole pipeline, writing the target to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if this recreator already ran, and
    /// otherwise the first error of the source or the builder. The run stops
    /// at that error; [`state`](Self::state) tells how far it got.
    pub fn run<P: ProgressReporter>(
        &mut self,
        output: &Path,
        mut progress: P,
    ) -> Result<RecreateResult<B::Summary>> {
        if self.state != RecreateState::Opened {
            return Err(Error::InvalidState("a recreator runs only once"));
        }

        let plan = plan_cluster_order(&self.source, &mut progress)?;
        self.advance(RecreateState::Planned);

        progress.on_phase(Phase::Creating);
        self.builder.start_creation(output, self.compression)?;
        self.advance(RecreateState::Creating);

        let total = plan.len() as u32;
        let (mut submitted, mut skipped) = (0u32, 0u32);
        for (done, planned) in plan.iter().enumerate() {
            let entry = self.source.entry(planned.index)?;
            if namespace::is_generated_index(entry.namespace()) {
                log::debug!(
                    "Skipping generated entry {}/{}",
                    entry.namespace(),
                    entry.url()
                );
                skipped += 1;
            } else {
                self.builder.add_entry(&EntryAdapter::new(entry))?;
                submitted += 1;
            }
            progress.on_entry_submitted(done as u32 + 1, total);
        }

        progress.on_phase(Phase::Finishing);
        let summary = self
            .builder
            .finish_creation(&SourcePages::new(&self.source))?;
        self.advance(RecreateState::Finished);

        Ok(RecreateResult {
            entries_planned: total,
            entries_submitted: submitted,
            entries_skipped: skipped,
            summary,
        })
    }
}

/// Opens `origin` and recreates it at `output`.
///
/// # Errors
///
/// Returns any error opening the source or running the pipeline.
pub fn recreate<P: ProgressReporter>(
    origin: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &RecreateOptions,
    progress: P,
) -> Result<RecreateResult<CreateResult>> {
    let source = Archive::open_path(origin)?;
    Recreator::new(source, options).run(output.as_ref(), progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{NoProgress, StatisticsProgress};
    use super::fixtures::{MockArchive, MockEntry, Recording, RecordingBuilder};
    use std::path::PathBuf;

    type RecordingRun = (
        Recreator<MockArchive, RecordingBuilder>,
        Result<RecreateResult<Recording>>,
    );

    fn run(source: MockArchive) -> RecordingRun {
        let mut recreator =
            Recreator::with_builder(source, RecordingBuilder::default(), Compression::Zstd);
        let result = recreator.run(Path::new("out.zim"), NoProgress);
        (recreator, result)
    }

    #[test]
    fn test_options_default() {
        let options = RecreateOptions::default();
        assert_eq!(options.compression, Compression::Lzma);
        assert_eq!(options.indexing.as_deref(), Some("eng"));
        assert_eq!(options.min_chunk_size, 2048);

        let creator = options.creator_options();
        assert_eq!(creator.min_chunk_size, 2048);
        assert_eq!(creator.indexing.as_deref(), Some("eng"));
        assert_eq!(creator.compression_level, None);
    }

    #[test]
    fn test_three_entry_scenario() {
        let source = MockArchive::new(vec![
            MockEntry::redirect('C', "c", 1).in_cluster(1),
            MockEntry::content('C', "a", "text/html", 0),
            MockEntry::content('C', "b", "image/png", 0),
        ]);
        let (recreator, result) = run(source);
        let result = result.unwrap();
        assert_eq!(recreator.state(), RecreateState::Finished);
        assert_eq!(result.entries_planned, 3);
        assert_eq!(result.entries_submitted, 3);

        let recording = result.summary;
        assert_eq!(
            recording.started,
            Some((PathBuf::from("out.zim"), Compression::Zstd))
        );
        let urls: Vec<String> = recording.entries.iter().map(|e| e.url.to_string()).collect();
        assert_eq!(urls, ["C/a", "C/b", "C/c"]);

        let (a, b, c) = (&recording.entries[0], &recording.entries[1], &recording.entries[2]);
        assert!(a.compress && a.index);
        assert_eq!(a.data, b"payload of a");
        assert!(!b.compress && !b.index);
        assert_eq!(c.redirect, Some(EntryUrl::new('C', "a")));
        assert_eq!(c.mime_type, "");
    }

    #[test]
    fn test_generated_namespaces_skipped() {
        let source = MockArchive::new(vec![
            MockEntry::content('X', "fulltext/xapian", "application/octet-stream+xapian", 0),
            MockEntry::content('A', "Main", "text/html", 0),
            MockEntry::content('Z', "/fulltextIndex/xapian", "application/octet-stream", 1),
            MockEntry::content('M', "Title", "text/plain", 1),
        ]);
        let (_, result) = run(source);
        let result = result.unwrap();
        assert_eq!(result.entries_submitted, 2);
        assert_eq!(result.entries_skipped, 2);
        let urls: Vec<String> = result.summary.entries.iter().map(|e| e.url.to_string()).collect();
        assert_eq!(urls, ["A/Main", "M/Title"]);
    }

    #[test]
    fn test_special_pages_passed_through() {
        let mut source = MockArchive::new(vec![
            MockEntry::content('-', "style.css", "text/css", 0),
            MockEntry::content('A', "Home", "text/html", 0),
        ]);
        source.main_page = Some(1);
        source.layout_page = Some(0);
        let (_, result) = run(source);
        let recording = result.unwrap().summary;
        assert_eq!(recording.main, Some(EntryUrl::new('A', "Home")));
        assert_eq!(recording.layout, Some(EntryUrl::new('-', "style.css")));
    }

    #[test]
    fn test_no_special_pages() {
        let source = MockArchive::new(vec![MockEntry::content('A', "Home", "text/html", 0)]);
        let recording = run(source).1.unwrap().summary;
        assert_eq!(recording.main, None);
        assert_eq!(recording.layout, None);
    }

    #[test]
    fn test_empty_source_still_finishes() {
        let mut progress = StatisticsProgress::new();
        let mut recreator = Recreator::with_builder(
            MockArchive::default(),
            RecordingBuilder::default(),
            Compression::Lzma,
        );
        let result = recreator.run(Path::new("empty.zim"), &mut progress).unwrap();
        assert_eq!(result.entries_planned, 0);
        assert!(result.summary.started.is_some());
        assert!(result.summary.entries.is_empty());
        assert_eq!(
            progress.phases,
            vec![
                Phase::Enumerating,
                Phase::Sorting,
                Phase::Creating,
                Phase::Finishing
            ]
        );
    }

    #[test]
    fn test_builder_error_aborts_run() {
        let source = MockArchive::new(vec![
            MockEntry::content('A', "one", "text/html", 0),
            MockEntry::content('A', "two", "text/html", 0),
        ]);
        let builder = RecordingBuilder {
            fail_at: Some(1),
            ..Default::default()
        };
        let mut recreator = Recreator::with_builder(source, builder, Compression::Zstd);
        let err = recreator.run(Path::new("out.zim"), NoProgress).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(recreator.state(), RecreateState::Creating);
        let (_, builder) = recreator.into_parts();
        assert_eq!(builder.recording.entries.len(), 1);
        assert_eq!(builder.recording.main, None);
    }

    #[test]
    fn test_runs_only_once() {
        let (mut recreator, result) = run(MockArchive::default());
        result.unwrap();
        assert!(matches!(
            recreator.run(Path::new("again.zim"), NoProgress),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_bad_main_page_index_fails() {
        let mut source = MockArchive::new(vec![MockEntry::content('A', "Home", "text/html", 0)]);
        source.main_page = Some(7);
        let (recreator, result) = run(source);
        assert!(matches!(
            result,
            Err(Error::EntryIndexOutOfRange { index: 7, .. })
        ));
        assert_eq!(recreator.state(), RecreateState::Creating);
    }
}
