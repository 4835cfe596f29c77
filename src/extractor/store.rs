use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::extractor::model::ExtractionResult;

/// Directory of per-item artifacts: `<slug>.md` for extracted text and
/// `<slug>.meta.json` for every attempt.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    dir: PathBuf,
}

impl ArticleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn text_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{slug}.md"))
    }

    pub fn meta_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{slug}.meta.json"))
    }

    pub fn save(&self, result: &ExtractionResult) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        if result.success {
            fs::write(self.text_path(&result.slug), &result.text)?;
        }
        let meta = serde_json::to_string_pretty(&result.meta()).map_err(io::Error::other)?;
        fs::write(self.meta_path(&result.slug), meta)?;
        debug!(slug = %result.slug, success = result.success, "saved article artifacts");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Item;

    #[test]
    fn failed_results_only_write_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(dir.path().join("articles"));
        let item = Item::new("A failed article", "https://example.com/gone", "s", "g");
        let mut result = ExtractionResult::for_item(&item, "gone".to_string());
        result.fail("fetch failed: http error 404 Not Found");

        store.save(&result).unwrap();

        assert!(!store.text_path("gone").exists());
        let meta: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.meta_path("gone")).unwrap()).unwrap();
        assert_eq!(meta["success"], false);
        assert_eq!(meta["url"], "https://example.com/gone");
        assert_eq!(meta["error"], "fetch failed: http error 404 Not Found");
        assert_eq!(meta["word_count"], 0);
    }
}
