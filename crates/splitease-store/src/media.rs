//! # Media Settings
//!
//! Menu presentation media: a hero video for the menu page and an optional
//! asset per menu item. Stored as `splitease_settings.json` next to the
//! order and bill snapshots.
//!
//! Assets are referenced by streaming playback id plus an optional poster
//! image; the store never touches the media bytes themselves.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::snapshot::{SnapshotError, SnapshotResult};

/// Settings file name.
pub const SETTINGS_FILE: &str = "splitease_settings.json";

/// A streamable media asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    /// Playback id on the streaming provider.
    pub playback_id: String,

    /// Poster image shown before playback starts.
    pub poster_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MediaSettings {
    /// Hero video on the menu landing page.
    hero: Option<MediaAsset>,

    /// Per-menu-item assets, keyed by catalog id.
    items: HashMap<String, MediaAsset>,
}

/// Media settings store.
#[derive(Debug)]
pub struct MediaLibrary {
    path: PathBuf,
    settings: Mutex<MediaSettings>,
}

impl MediaLibrary {
    /// Loads settings from `dir`, or starts empty if the file is missing.
    /// A present-but-unparseable file is a [`SnapshotError::Corrupted`].
    pub fn load(dir: impl AsRef<Path>) -> SnapshotResult<Self> {
        let path = dir.as_ref().join(SETTINGS_FILE);
        let settings = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| {
                SnapshotError::Corrupted {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => MediaSettings::default(),
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };
        Ok(MediaLibrary {
            path,
            settings: Mutex::new(settings),
        })
    }

    pub fn hero(&self) -> Option<MediaAsset> {
        self.settings.lock().unwrap().hero.clone()
    }

    pub fn set_hero(&self, asset: Option<MediaAsset>) -> SnapshotResult<()> {
        self.settings.lock().unwrap().hero = asset;
        self.save()
    }

    /// Asset for one menu item, if configured.
    pub fn asset_for(&self, menu_item_id: &str) -> Option<MediaAsset> {
        self.settings.lock().unwrap().items.get(menu_item_id).cloned()
    }

    pub fn set_asset(&self, menu_item_id: &str, asset: MediaAsset) -> SnapshotResult<()> {
        self.settings
            .lock()
            .unwrap()
            .items
            .insert(menu_item_id.to_string(), asset);
        self.save()
    }

    pub fn remove_asset(&self, menu_item_id: &str) -> SnapshotResult<()> {
        self.settings.lock().unwrap().items.remove(menu_item_id);
        self.save()
    }

    fn save(&self) -> SnapshotResult<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| SnapshotError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = {
            let settings = self.settings.lock().unwrap();
            serde_json::to_vec_pretty(&*settings).map_err(|source| SnapshotError::Corrupted {
                path: self.path.clone(),
                source,
            })?
        };
        fs::write(&self.path, &json).map_err(|source| SnapshotError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "Media settings written");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("splitease-media-{}", uuid::Uuid::new_v4()))
    }

    fn asset(id: &str) -> MediaAsset {
        MediaAsset {
            playback_id: id.to_string(),
            poster_url: Some(format!("https://img.example/{id}.jpg")),
        }
    }

    #[test]
    fn test_missing_settings_start_empty() {
        let library = MediaLibrary::load(temp_dir()).unwrap();
        assert!(library.hero().is_none());
        assert!(library.asset_for("margherita").is_none());
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = temp_dir();
        {
            let library = MediaLibrary::load(&dir).unwrap();
            library.set_hero(Some(asset("hero-1"))).unwrap();
            library.set_asset("margherita", asset("pizza-1")).unwrap();
        }

        let reloaded = MediaLibrary::load(&dir).unwrap();
        assert_eq!(reloaded.hero(), Some(asset("hero-1")));
        assert_eq!(reloaded.asset_for("margherita"), Some(asset("pizza-1")));

        reloaded.remove_asset("margherita").unwrap();
        assert!(reloaded.asset_for("margherita").is_none());
    }

    #[test]
    fn test_corrupted_settings_are_a_loud_error() {
        let dir = temp_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SETTINGS_FILE), b"[oops").unwrap();

        let err = MediaLibrary::load(&dir);
        assert!(matches!(err, Err(SnapshotError::Corrupted { .. })));
    }
}
