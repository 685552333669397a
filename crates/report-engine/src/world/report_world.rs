//! In-memory Typst world for report compilation
//!
//! The world holds exactly one source file (the report template) and no
//! binary files. Report data reaches the template through `sys.inputs`.

use chrono::{DateTime, Datelike, Timelike, Utc};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Array, Bytes, Datetime, Dict, Value};
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, World};

use super::fonts::{global_font_cache, FontCache};
use crate::compiler::ReportError;

const MAIN_PATH: &str = "/report.typ";

pub struct ReportWorld {
    main: Source,
    font_cache: &'static FontCache,
    inputs: Dict,
    /// Fixed clock so the same report renders the same bytes
    time: DateTime<Utc>,
    library: LazyHash<Library>,
}

impl ReportWorld {
    /// Create a world around `source` with `inputs` exposed as `sys.inputs`
    pub fn new(
        source: &str,
        inputs: serde_json::Map<String, serde_json::Value>,
        time: DateTime<Utc>,
    ) -> Result<Self, ReportError> {
        let id = FileId::new(None, VirtualPath::new(MAIN_PATH));

        let mut dict = Dict::new();
        for (key, value) in &inputs {
            dict.insert(key.as_str().into(), json_to_typst_value(value)?);
        }

        let library = Library::builder().with_inputs(dict.clone()).build();

        Ok(Self {
            main: Source::new(id, source.to_string()),
            font_cache: global_font_cache(),
            inputs: dict,
            time,
            library: LazyHash::new(library),
        })
    }

    pub fn inputs(&self) -> &Dict {
        &self.inputs
    }
}

/// Convert a JSON value to a Typst value
pub fn json_to_typst_value(json: &serde_json::Value) -> Result<Value, ReportError> {
    match json {
        serde_json::Value::Null => Ok(Value::None),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(ReportError::InvalidInput(format!("Invalid number: {}", n)))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s.as_str().into())),
        serde_json::Value::Array(arr) => {
            let items = arr
                .iter()
                .map(json_to_typst_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(Array::from(items.as_slice())))
        }
        serde_json::Value::Object(obj) => {
            let mut dict = Dict::new();
            for (k, v) in obj {
                dict.insert(k.as_str().into(), json_to_typst_value(v)?);
            }
            Ok(Value::Dict(dict))
        }
    }
}

impl World for ReportWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        self.font_cache.book()
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.font_cache.font(index)
    }

    fn today(&self, offset: Option<i64>) -> Option<Datetime> {
        let adjusted = self.time + chrono::Duration::hours(offset.unwrap_or(0));

        Datetime::from_ymd_hms(
            adjusted.year(),
            adjusted.month() as u8,
            adjusted.day() as u8,
            adjusted.hour() as u8,
            adjusted.minute() as u8,
            adjusted.second() as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    #[test]
    fn test_main_source_resolves() {
        let world = ReportWorld::new("Hello", serde_json::Map::new(), time()).unwrap();
        let source = world.source(world.main()).unwrap();
        assert_eq!(source.text(), "Hello");
    }

    #[test]
    fn test_other_files_not_found() {
        let world = ReportWorld::new("Hello", serde_json::Map::new(), time()).unwrap();
        let other = FileId::new(None, VirtualPath::new("/secret.typ"));
        assert!(world.source(other).is_err());
        assert!(world.file(other).is_err());
    }

    #[test]
    fn test_nested_inputs() {
        let mut inputs = serde_json::Map::new();
        inputs.insert(
            "report".to_string(),
            json!({ "title": "T", "sections": [{ "lines": [] }], "score": 42, "ratio": 0.5 }),
        );
        let world = ReportWorld::new("", inputs, time()).unwrap();
        assert!(world.inputs().contains("report"));
    }

    #[test]
    fn test_today_uses_fixed_clock() {
        let world = ReportWorld::new("", serde_json::Map::new(), time()).unwrap();
        let today = world.today(None).unwrap();
        assert_eq!(today.year(), Some(2024));
        assert_eq!(today.month(), Some(5));
        assert_eq!(today.day(), Some(6));
    }
}
