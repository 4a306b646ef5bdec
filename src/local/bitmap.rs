use config::LocalBitmapsConfig;
use data::{Uuid, IMG_DEFAULT};
use decode::{self, ImageFormat};
use local::replace::{replace_ids, Replacement};
use local::{LocalBitmapError, ViewerState};
use slog::Logger;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    /// The file is watched for changes.
    Active,
    /// The file vanished or could not be decoded too many times; the unit
    /// will not update anymore.
    Broken,
}

/// One watched image file.
///
/// While the unit lives its current texture is registered in the texture
/// list. Dropping the unit removes the texture again, and if configured,
/// first points everything using it back at the default texture.
pub struct LocalBitmap {
    filename: PathBuf,
    short_name: String,
    format: ImageFormat,

    /// Stable id for the UI, independent of the texture id.
    tracking_id: Uuid,

    /// The id the current texture is registered under.
    world_id: Option<Uuid>,

    last_modified: Option<SystemTime>,
    link_status: LinkStatus,
    update_retries: u32,

    settings: LocalBitmapsConfig,
    viewer: ViewerState,
    log: Logger,
}

impl LocalBitmap {
    /// Starts watching `filename` and publishes its current content.
    ///
    /// Fails if the format is not supported or the first decode fails, in
    /// which case nothing stays registered.
    pub fn new<P: Into<PathBuf>>(
        filename: P,
        viewer: ViewerState,
        settings: &LocalBitmapsConfig,
        log: &Logger,
    ) -> Result<LocalBitmap, LocalBitmapError> {
        let filename = filename.into();
        let format = ImageFormat::from_path(&filename)
            .ok_or_else(|| LocalBitmapError::UnsupportedFormat(filename.display().to_string()))?;
        let short_name = filename
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut unit = LocalBitmap {
            log: log.new(o!("unit" => short_name.clone())),
            filename,
            short_name,
            format,
            tracking_id: Uuid::new_v4(),
            world_id: None,
            last_modified: None,
            link_status: LinkStatus::Active,
            update_retries: settings.update_retries,
            settings: settings.clone(),
            viewer,
        };

        // Like any other update, except there is nothing to replace yet.
        unit.try_update(true)?;
        Ok(unit)
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn short_name(&self) -> &str {
        self.short_name.as_str()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn tracking_id(&self) -> Uuid {
        self.tracking_id
    }

    pub fn world_id(&self) -> Option<Uuid> {
        self.world_id
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    pub fn link_status(&self) -> LinkStatus {
        self.link_status
    }

    pub fn update_retries(&self) -> u32 {
        self.update_retries
    }

    /// Checks the file for changes and republishes it if it was modified.
    ///
    /// Returns what the replacement of the previous texture touched if a new
    /// texture was published, `None` otherwise.
    pub fn update_self(&mut self) -> Option<Replacement> {
        match self.try_update(false) {
            Ok(replacement) => replacement,
            Err(LocalBitmapError::Broken) => None,
            Err(e) => {
                if self.link_status == LinkStatus::Broken {
                    warn!(self.log, "local bitmap link broken"; "error" => %e);
                } else {
                    debug!(self.log, "local bitmap update failed";
                        "error" => %e, "retries" => self.update_retries);
                }
                None
            }
        }
    }

    fn try_update(
        &mut self,
        first_update: bool,
    ) -> Result<Option<Replacement>, LocalBitmapError> {
        if self.link_status == LinkStatus::Broken {
            return Err(LocalBitmapError::Broken);
        }

        let modified = match fs::metadata(&self.filename).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(error) => {
                self.link_status = LinkStatus::Broken;
                return Err(LocalBitmapError::Missing {
                    path: self.filename.display().to_string(),
                    error,
                });
            }
        };
        if self.last_modified == Some(modified) {
            return Ok(None);
        }

        let max_size = self.settings.max_image_size;
        let raw = match decode::decode_bitmap(&self.filename, self.format, max_size) {
            Ok(raw) => raw,
            Err(error) => {
                if self.update_retries > 0 {
                    self.update_retries -= 1;
                } else {
                    self.link_status = LinkStatus::Broken;
                }
                return Err(LocalBitmapError::Decode {
                    path: self.filename.display().to_string(),
                    error,
                });
            }
        };

        let old_id = if first_update { None } else { self.world_id };
        let new_id = Uuid::new_v4();
        let url = format!("file://{}", self.filename.display());
        self.viewer.textures.write().add_image(new_id, url, raw);
        self.world_id = Some(new_id);
        self.last_modified = Some(modified);
        info!(self.log, "published local bitmap"; "world_id" => %new_id);

        let replacement = match old_id {
            Some(old_id) => {
                let replacement =
                    replace_ids(&mut self.viewer.world.write(), old_id, new_id, &self.log);
                self.release_texture(old_id);
                replacement
            }
            None => Replacement::default(),
        };
        Ok(Some(replacement))
    }

    fn release_texture(&self, id: Uuid) {
        let mut textures = self.viewer.textures.write();
        textures.unref(&id);
        textures.delete_image(&id);
    }
}

impl Drop for LocalBitmap {
    fn drop(&mut self) {
        let world_id = match self.world_id.take() {
            Some(id) => id,
            None => return,
        };

        if self.settings.replace_on_delete {
            let mut world = self.viewer.world.write();
            let replacement = replace_ids(&mut world, world_id, IMG_DEFAULT, &self.log);
            if replacement.needs_rebake() {
                world.avatar.force_bake_all_textures(self.settings.slam_rebake);
            }
        }
        self.release_texture(world_id);
        debug!(self.log, "released local bitmap"; "world_id" => %world_id);
    }
}
