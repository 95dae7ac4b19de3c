//! Caption font lookup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::CaptionStyle;
use crate::foundation::error::{NarrationError, NarrationResult};

/// Usual location of DejaVu Sans on Debian-derived systems.
pub const DEJAVU_SANS_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Raw font bytes plus the face index inside the file.
#[derive(Clone)]
pub struct CaptionFont {
    /// Human-readable origin, for logs.
    pub source: String,
    /// Whole font file.
    pub bytes: Arc<Vec<u8>>,
    /// Face index for collections (`.ttc`).
    pub index: u32,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont")
            .field("source", &self.source)
            .field("len", &self.bytes.len())
            .field("index", &self.index)
            .finish()
    }
}

/// Resolve the caption font: configured path, then DejaVu Sans, then any system sans-serif face.
pub fn load_caption_font(style: &CaptionStyle) -> NarrationResult<CaptionFont> {
    if let Some(p) = &style.font_path {
        return read_font_file(p).map_err(|e| {
            NarrationError::config(format!("caption font '{}': {e}", p.display()))
        });
    }

    let dejavu = PathBuf::from(DEJAVU_SANS_PATH);
    if dejavu.is_file()
        && let Ok(font) = read_font_file(&dejavu)
    {
        return Ok(font);
    }

    find_system_font().ok_or_else(|| {
        NarrationError::config("no usable caption font found (set caption.font_path)")
    })
}

/// First sans-serif face known to the system font database.
pub fn find_system_font() -> Option<CaptionFont> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();

    let families = [usvg::fontdb::Family::SansSerif];
    let query = usvg::fontdb::Query {
        families: &families,
        ..Default::default()
    };
    let id = db.query(&query).or_else(|| db.faces().next().map(|f| f.id))?;
    let source = db
        .face(id)
        .map(|f| format!("system font '{}'", f.post_script_name))
        .unwrap_or_else(|| "system font".to_string());

    db.with_face_data(id, |data, index| CaptionFont {
        source,
        bytes: Arc::new(data.to_vec()),
        index,
    })
}

fn read_font_file(path: &Path) -> std::io::Result<CaptionFont> {
    let bytes = std::fs::read(path)?;
    if bytes.len() < 12 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "file too small to be a font",
        ));
    }
    Ok(CaptionFont {
        source: path.display().to_string(),
        bytes: Arc::new(bytes),
        index: 0,
    })
}
