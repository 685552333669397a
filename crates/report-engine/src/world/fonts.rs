//! Embedded font cache
//!
//! Fonts come from `typst-assets` only so reports render identically on
//! every host.

use std::sync::OnceLock;

use typst::foundations::Bytes;
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;

/// Body font set by the report template
pub const REPORT_FONT_FAMILY: &str = "Libertinus Serif";

static FONT_CACHE: OnceLock<FontCache> = OnceLock::new();

/// Process-wide cache, loaded on first report
pub fn global_font_cache() -> &'static FontCache {
    FONT_CACHE.get_or_init(FontCache::embedded)
}

/// Fonts available to report compilation
#[derive(Debug)]
pub struct FontCache {
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
}

impl FontCache {
    /// Every face bundled with `typst-assets`
    pub fn embedded() -> Self {
        let fonts: Vec<Font> = typst_assets::fonts()
            .flat_map(|data| Font::iter(Bytes::from_static(data)))
            .collect();
        let book = FontBook::from_fonts(&fonts);

        tracing::debug!(faces = fonts.len(), "report fonts loaded");

        Self {
            book: LazyHash::new(book),
            fonts,
        }
    }

    pub fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    pub fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Whether any face belongs to `family` (case-insensitive)
    pub fn has_family(&self, family: &str) -> bool {
        self.book
            .families()
            .any(|(name, _)| name.eq_ignore_ascii_case(family))
    }
}
