//! One pass of the whole system: collect, curate, extract, synthesize, write
//! the run artifacts and finally commit the selected URLs to state.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    collector::{Collector, HttpEntrySource},
    config::Config,
    curator::{CurationConfig, Curator},
    entities::{Item, ItemStatus},
    extractor::{ArticleStore, Extractor},
    fetcher::HttpFetcher,
    sources::SourceRegistry,
    state::StateStore,
    synthesis::SynthesisStrategy,
};

pub const ITEMS_FILE: &str = "items.json";
pub const SELECTED_FILE: &str = "selected.json";
pub const DIGEST_FILE: &str = "digest.md";
pub const RUN_FILE: &str = "run.json";
pub const ARTICLES_DIR: &str = "articles";

/// Accounting for one run, written to `run.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub date: String,
    pub items_discovered: usize,
    pub items_selected: usize,
    pub items_extracted: usize,
    pub items_failed: usize,
    pub digest_generated: bool,
    pub adapter_used: String,
    pub run_started: DateTime<Utc>,
    pub run_completed: Option<DateTime<Utc>>,
    pub errors: Vec<String>,
}

impl RunSummary {
    pub fn new(date: NaiveDate, adapter: String) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            date: date.format("%Y-%m-%d").to_string(),
            items_discovered: 0,
            items_selected: 0,
            items_extracted: 0,
            items_failed: 0,
            digest_generated: false,
            adapter_used: adapter,
            run_started: Utc::now(),
            run_completed: None,
            errors: Vec::new(),
        }
    }
}

pub struct Pipeline {
    collector: Collector,
    curator: Curator,
    fetcher: HttpFetcher,
    synthesis: SynthesisStrategy,
    data_dir: PathBuf,
    extract_concurrency: usize,
}

impl Pipeline {
    pub fn new(
        collector: Collector,
        curator: Curator,
        fetcher: HttpFetcher,
        synthesis: SynthesisStrategy,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            collector,
            curator,
            fetcher,
            synthesis,
            data_dir: data_dir.into(),
            extract_concurrency: 1,
        }
    }

    /// Wire every component from configuration. Missing config files give an
    /// empty registry and default curation rules.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher =
            HttpFetcher::new(config.fetch_timeout()).context("failed to build http client")?;
        let registry = SourceRegistry::load(config.sources_path());
        let state = StateStore::load(config.state_path());
        let collector = Collector::new(
            registry,
            state,
            Arc::new(HttpEntrySource::new(fetcher.clone())),
        )
        .with_lookback_days(config.lookback_days());
        let curator = Curator::new(CurationConfig::load(config.curation_path()));

        Ok(Self::new(
            collector,
            curator,
            fetcher,
            SynthesisStrategy::from_config(config),
            config.data_dir(),
        )
        .with_extract_concurrency(config.extract_concurrency()))
    }

    pub fn with_extract_concurrency(mut self, concurrency: usize) -> Self {
        self.extract_concurrency = concurrency.max(1);
        self
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// Directory holding the artifacts of the run for `date`.
    pub fn run_dir(&self, date: NaiveDate) -> PathBuf {
        self.data_dir.join(date.format("%Y-%m-%d").to_string())
    }

    /// Run once for `date`. Source, extraction and synthesis failures are
    /// absorbed into the summary; only artifact and state write failures are
    /// returned.
    pub async fn run(&mut self, date: NaiveDate) -> Result<RunSummary> {
        let mut summary = RunSummary::new(date, self.synthesis.name());
        let run_dir = self.run_dir(date);
        fs::create_dir_all(&run_dir)
            .with_context(|| format!("failed to create {}", run_dir.display()))?;
        info!(run_id = %summary.run_id, date = %summary.date, "pipeline run started");

        info!("stage 1: collecting items");
        let items = self.collector.collect().await;
        summary.items_discovered = items.len();
        write_json(&run_dir.join(ITEMS_FILE), &items)?;

        if items.is_empty() {
            warn!("no new items discovered");
            return finish(summary, &run_dir);
        }

        info!("stage 2: curating items");
        let mut selected = self.curator.curate(items);
        for item in &mut selected {
            item.status = ItemStatus::Selected;
        }
        summary.items_selected = selected.len();

        if selected.is_empty() {
            warn!("no items selected");
            write_json(&run_dir.join(SELECTED_FILE), &selected)?;
            return finish(summary, &run_dir);
        }

        info!("stage 3: extracting article content");
        let extractor = Extractor::new(
            self.fetcher.clone(),
            ArticleStore::new(run_dir.join(ARTICLES_DIR)),
        )
        .with_concurrency(self.extract_concurrency);
        let articles = extractor.extract_all(&mut selected).await;
        summary.items_extracted = articles.iter().filter(|a| a.success).count();
        summary.items_failed = articles.len() - summary.items_extracted;
        summary.errors.extend(
            articles
                .iter()
                .filter_map(|a| a.error.as_ref().map(|e| format!("{}: {}", a.url, e))),
        );
        write_json(&run_dir.join(SELECTED_FILE), &selected)?;

        info!("stage 4: synthesizing digest");
        let digest = self.synthesis.produce(&selected, &articles).await;
        summary.digest_generated = !digest.trim().is_empty();
        let digest_path = run_dir.join(DIGEST_FILE);
        fs::write(&digest_path, &digest)
            .with_context(|| format!("failed to write {}", digest_path.display()))?;

        self.commit(&selected, &mut summary, &run_dir)?;
        finish(summary, &run_dir)
    }

    /// Mark the selected items processed and save state. On failure the run
    /// summary is still written before the error is returned.
    fn commit(
        &mut self,
        selected: &[Item],
        summary: &mut RunSummary,
        run_dir: &Path,
    ) -> Result<()> {
        self.collector.mark_processed(selected);
        if let Err(e) = self.collector.save_state() {
            error!("failed to save state: {}", e);
            summary.errors.push(format!("state save failed: {e}"));
            summary.run_completed = Some(Utc::now());
            write_json(&run_dir.join(RUN_FILE), summary)?;
            return Err(e).context("failed to save pipeline state");
        }
        Ok(())
    }
}

fn finish(mut summary: RunSummary, run_dir: &Path) -> Result<RunSummary> {
    summary.run_completed = Some(Utc::now());
    write_json(&run_dir.join(RUN_FILE), &summary)?;
    info!(
        discovered = summary.items_discovered,
        selected = summary.items_selected,
        extracted = summary.items_extracted,
        failed = summary.items_failed,
        digest = summary.digest_generated,
        "pipeline run complete"
    );
    Ok(summary)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}
