//! Palette memory on disk, one file per mask

use std::path::{Path, PathBuf};

use super::AnnotationStore;
use crate::palette::PaletteMemory;
use crate::viewport::scene::Scene;

/// File name for a mask link: anything outside `[A-Za-z0-9._-]` becomes `_`
fn sanitize(mask_link: &str) -> String {
    mask_link
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl<S: Scene> AnnotationStore<S> {
    /// Palette file for a mask
    pub fn palette_path(mask_link: &str) -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "cell-editor", "cell-editor").map(|dirs| {
            dirs.data_dir()
                .join("palettes")
                .join(format!("{}.json", sanitize(mask_link)))
        })
    }

    /// Remember the colors of this mask for the next session
    pub fn save_palette(&self, mask_link: &str) {
        if let Some(path) = Self::palette_path(mask_link) {
            if let Err(e) = self.write_palette(&path) {
                tracing::warn!("Could not save palette {}: {e}", path.display());
            }
        }
    }

    /// Restore remembered colors; returns whether anything was found
    pub fn load_palette(&mut self, mask_link: &str) -> bool {
        Self::palette_path(mask_link).is_some_and(|path| self.read_palette(&path))
    }

    pub fn write_palette(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&self.palette)?;
        std::fs::write(path, json)
    }

    pub fn read_palette(&mut self, path: &Path) -> bool {
        let Ok(json) = std::fs::read_to_string(path) else {
            return false;
        };
        match serde_json::from_str::<PaletteMemory>(&json) {
            Ok(memory) => {
                tracing::debug!("Restored {} palette slots", memory.len());
                self.palette = memory;
                true
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed palette {}: {e}", path.display());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{object_info, store_with_cells};
    use crate::state::store::Membership;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join("cell-editor-tests")
            .join(format!("{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("s3://bucket/mask 1.tif"), "s3___bucket_mask_1.tif");
    }

    #[test]
    fn test_palette_restored_in_new_store() {
        let path = temp_path();
        let store = store_with_cells(&[10, 20, 30]);
        let slot = store.palette().get(30).unwrap();
        store.write_palette(&path).unwrap();

        let mut fresh = store_with_cells(&[]);
        assert!(fresh.read_palette(&path));
        fresh.insert_object(&object_info(30), Membership::Active).unwrap();
        assert_eq!(fresh.get(30).unwrap().color_index, slot);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_or_malformed_file() {
        let path = temp_path();
        let mut store = store_with_cells(&[]);
        assert!(!store.read_palette(&path));

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();
        assert!(!store.read_palette(&path));
        let _ = std::fs::remove_file(&path);
    }
}
