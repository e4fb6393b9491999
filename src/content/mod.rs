//! Lesson and tutorial content.
//!
//! Content is parsed once at startup into an immutable `ContentStore` that is
//! shared by reference. The built-in lessons are embedded TOML; a content
//! directory can replace either file.

mod types;

pub use types::{
    Difficulty, Level, LevelProgress, LevelSummary, Progress, Question, Tutorial,
    TutorialExample, TutorialSummary,
};

use crate::error::{Result, TutorError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

const BUILTIN_LEVELS: &str = include_str!("levels.toml");
const BUILTIN_TUTORIALS: &str = include_str!("tutorials.toml");

#[derive(Deserialize)]
struct LevelsFile {
    #[serde(default)]
    levels: Vec<Level>,
}

#[derive(Deserialize)]
struct TutorialsFile {
    #[serde(default)]
    tutorials: Vec<Tutorial>,
}

/// Read-only lookup tables for levels and tutorials, ordered by ID.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    levels: BTreeMap<u32, Level>,
    tutorials: BTreeMap<u32, Tutorial>,
}

impl ContentStore {
    /// Builds a store from already-parsed records, validating IDs.
    pub fn new(levels: Vec<Level>, tutorials: Vec<Tutorial>) -> Result<Self> {
        Ok(Self {
            levels: index_by_id(levels, |l| l.id, "level")?,
            tutorials: index_by_id(tutorials, |t| t.id, "tutorial")?,
        })
    }

    /// Loads the embedded lessons and tutorials.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_LEVELS, BUILTIN_TUTORIALS)
    }

    /// Parses levels and tutorials from TOML documents.
    pub fn from_toml(levels: &str, tutorials: &str) -> Result<Self> {
        let levels: LevelsFile = toml::from_str(levels)
            .map_err(|e| TutorError::content(format!("Invalid levels content: {e}")))?;
        let tutorials: TutorialsFile = toml::from_str(tutorials)
            .map_err(|e| TutorError::content(format!("Invalid tutorials content: {e}")))?;
        Self::new(levels.levels, tutorials.tutorials)
    }

    /// Loads `levels.toml` and `tutorials.toml` from a directory.
    ///
    /// A file missing from the directory falls back to the built-in one.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let levels = read_or_builtin(&dir.join("levels.toml"), BUILTIN_LEVELS)?;
        let tutorials = read_or_builtin(&dir.join("tutorials.toml"), BUILTIN_TUTORIALS)?;
        let store = Self::from_toml(&levels, &tutorials)?;
        info!(
            "Loaded {} levels and {} tutorials from {}",
            store.levels.len(),
            store.tutorials.len(),
            dir.display()
        );
        Ok(store)
    }

    /// Loads from `dir` when given, otherwise the built-in content.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::load_dir(dir),
            None => Self::builtin(),
        }
    }

    pub fn level(&self, id: u32) -> Option<&Level> {
        self.levels.get(&id)
    }

    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.levels.values()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn tutorial(&self, id: u32) -> Option<&Tutorial> {
        self.tutorials.get(&id)
    }

    pub fn tutorials(&self) -> impl Iterator<Item = &Tutorial> {
        self.tutorials.values()
    }

    pub fn tutorial_count(&self) -> usize {
        self.tutorials.len()
    }

    /// Resolves a question.
    ///
    /// Question IDs repeat across levels. With `level_id` the lookup is scoped
    /// to that level; without it the first match in ascending level order wins.
    pub fn question(&self, question_id: u32, level_id: Option<u32>) -> Option<&Question> {
        match level_id {
            Some(level_id) => self.level(level_id)?.question(question_id),
            None => self.levels().find_map(|level| level.question(question_id)),
        }
    }

    pub fn level_summaries(&self) -> Vec<LevelSummary> {
        self.levels().map(LevelSummary::from).collect()
    }

    pub fn tutorial_summaries(&self) -> Vec<TutorialSummary> {
        self.tutorials().map(TutorialSummary::from).collect()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: 0,
            total: self.levels.len(),
            levels: self
                .levels()
                .map(|level| LevelProgress {
                    id: level.id,
                    name: level.name.clone(),
                    completed: 0,
                })
                .collect(),
        }
    }
}

fn read_or_builtin(path: &Path, builtin: &str) -> Result<String> {
    if !path.exists() {
        return Ok(builtin.to_string());
    }
    std::fs::read_to_string(path)
        .map_err(|e| TutorError::content(format!("Failed to read {}: {e}", path.display())))
}

fn index_by_id<T>(items: Vec<T>, id: impl Fn(&T) -> u32, kind: &str) -> Result<BTreeMap<u32, T>> {
    let mut map = BTreeMap::new();
    for item in items {
        let item_id = id(&item);
        if item_id == 0 {
            return Err(TutorError::content(format!("{kind} IDs must be positive")));
        }
        if map.insert(item_id, item).is_some() {
            return Err(TutorError::content(format!("duplicate {kind} ID {item_id}")));
        }
    }
    Ok(map)
}
