use std::{
    fmt::Debug,
    ops::Range,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;
use ustr::Ustr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Filename(Ustr);

impl Filename {
    pub fn new(str: &str) -> Self {
        Self(Ustr::from(str))
    }

    pub fn as_str(&self) -> &'static str {
        self.0.as_str()
    }
}

/// A byte range in one proof file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    filename: Filename,
    start: usize,
    end: usize,
}

impl Span {
    pub fn new(filename: Filename, range: Range<usize>) -> Self {
        Self {
            filename,
            start: range.start,
            end: range.end,
        }
    }

    pub fn file(&self) -> Filename {
        self.filename
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Proof file texts, named relative to the directory the checker runs in.
pub struct SourceCache {
    root: PathBuf,
    files: FxHashMap<Filename, String>,
}

impl SourceCache {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            files: FxHashMap::default(),
        }
    }

    fn get_name(&self, path: &Path) -> Filename {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        Filename::new(&relative.to_string_lossy())
    }

    pub fn add_path(&mut self, path: &Path) -> std::io::Result<Filename> {
        let text = std::fs::read_to_string(path)?;
        let filename = self.get_name(path);
        self.files.insert(filename, text);
        Ok(filename)
    }

    pub fn add_text(&mut self, filename: Filename, text: String) {
        self.files.insert(filename, text);
    }

    pub fn get_text(&self, filename: Filename) -> &str {
        self.files.get(&filename).map_or("", |s| s.as_str())
    }
}
