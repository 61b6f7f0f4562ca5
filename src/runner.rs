use thiserror::Error;
use tracing::debug;

use crate::classify::{FilterLevel, Taxonomy};
use crate::dataset::{self, DatasetError, DatasetSource, Entry};
use crate::output::{self, CatalogRecord};
use crate::viewer::{DetailView, ViewerState};

pub const DEFAULT_TITLE: &str = "常見濫用管制藥品";

#[derive(Clone, Debug)]
pub enum EntrySource {
    Dataset(DatasetSource),
    Inline(Vec<Entry>),
}

#[derive(Clone, Debug)]
pub struct Options {
    pub source: EntrySource,
    pub taxonomy: Taxonomy,
    pub level: Option<FilterLevel>,
    pub title: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            source: EntrySource::Dataset(DatasetSource::default()),
            taxonomy: Taxonomy::Graded,
            level: None,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{source}")]
    Dataset {
        #[from]
        source: DatasetError,
    },

    #[error("no entry named '{name}'")]
    UnknownEntry { name: String },
}

/// A loaded and grouped catalog ready to render.
#[derive(Clone, Debug)]
pub struct CatalogView {
    title: String,
    state: ViewerState,
}

impl CatalogView {
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ViewerState {
        &mut self.state
    }

    pub fn record(&self) -> CatalogRecord {
        output::build_records(
            &self.title,
            self.state.taxonomy(),
            self.state.active(),
            &self.state.sections(),
        )
    }

    pub fn detail(&self, name: &str) -> Result<DetailView<'_>, RunnerError> {
        self.state
            .detail(name)
            .ok_or_else(|| RunnerError::UnknownEntry {
                name: name.trim().to_string(),
            })
    }
}

pub struct Runner {
    options: Options,
}

impl Runner {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn run(&self) -> Result<CatalogView, RunnerError> {
        let entries = match &self.options.source {
            EntrySource::Dataset(source) => dataset::load_dataset(source).await?,
            EntrySource::Inline(entries) => entries.clone(),
        };
        Ok(self.view(&entries))
    }

    /// Groups already loaded entries with this runner's settings.
    pub fn view(&self, entries: &[Entry]) -> CatalogView {
        let mut state = ViewerState::new(self.options.taxonomy, entries);
        state.set_filter(self.options.level);
        debug!(
            taxonomy = self.options.taxonomy.name(),
            listed = state.entries().len(),
            "catalog grouped"
        );
        CatalogView {
            title: self.options.title.clone(),
            state,
        }
    }
}
