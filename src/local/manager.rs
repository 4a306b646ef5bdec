use config::LocalBitmapsConfig;
use data::Uuid;
use local::bitmap::LocalBitmap;
use local::timer::HeartbeatTimer;
use local::ViewerState;
use slog::Logger;
use std::mem;
use std::path::{Path, PathBuf};

/// One row of the local bitmap list shown to the user.
#[derive(Clone, Debug, PartialEq)]
pub struct ListEntry {
    pub name: String,
    pub tracking_id: Uuid,
}

/// Owns all local bitmap units and keeps them up to date.
///
/// The host polls `tick` from its event loop; when the heartbeat is due all
/// units are checked in the order they were added, and the avatar is baked
/// once at the end of the pass if any wearable changed.
pub struct LocalBitmapManager {
    bitmaps: Vec<LocalBitmap>,
    timer: HeartbeatTimer,
    needs_rebake: bool,
    config: LocalBitmapsConfig,
    viewer: ViewerState,
    log: Logger,
}

impl LocalBitmapManager {
    /// Creates the manager with a running heartbeat.
    pub fn new(config: LocalBitmapsConfig, viewer: ViewerState, log: Logger) -> Self {
        let mut timer = HeartbeatTimer::new(config.heartbeat());
        timer.start();
        LocalBitmapManager {
            bitmaps: Vec::new(),
            timer,
            needs_rebake: false,
            config,
            viewer,
            log,
        }
    }

    /// Adds a unit for each of the picked files.
    ///
    /// Files which can't be used are dropped. Returns true if at least one
    /// unit was added.
    pub fn add_units<I, P>(&mut self, filenames: I) -> bool
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut add_successful = false;
        self.timer.stop();
        for filename in filenames {
            let filename = filename.into();
            match LocalBitmap::new(filename.clone(), self.viewer.clone(), &self.config, &self.log) {
                Ok(unit) => {
                    info!(self.log, "added local bitmap";
                        "path" => %filename.display(), "tracking_id" => %unit.tracking_id());
                    self.bitmaps.push(unit);
                    add_successful = true;
                }
                Err(e) => {
                    warn!(self.log, "rejected local bitmap";
                        "path" => %filename.display(), "error" => %e);
                }
            }
        }
        self.timer.start();
        add_successful
    }

    /// Removes every unit with the given tracking id.
    pub fn del_unit(&mut self, tracking_id: &Uuid) {
        if self.bitmaps.is_empty() {
            return;
        }

        let bitmaps = mem::replace(&mut self.bitmaps, Vec::new());
        let (removed, kept): (Vec<_>, Vec<_>) = bitmaps
            .into_iter()
            .partition(|unit| unit.tracking_id() == *tracking_id);
        self.bitmaps = kept;

        for unit in removed {
            info!(self.log, "removing local bitmap"; "path" => %unit.filename().display());
            // Dropping restores defaults and rebakes if needed.
            drop(unit);
        }
    }

    /// The texture id currently published for the unit.
    pub fn world_id(&self, tracking_id: &Uuid) -> Option<Uuid> {
        self.find(tracking_id).and_then(|unit| unit.world_id())
    }

    pub fn filename(&self, tracking_id: &Uuid) -> Option<&Path> {
        self.find(tracking_id).map(|unit| unit.filename())
    }

    pub fn unit(&self, tracking_id: &Uuid) -> Option<&LocalBitmap> {
        self.find(tracking_id)
    }

    fn find(&self, tracking_id: &Uuid) -> Option<&LocalBitmap> {
        self.bitmaps
            .iter()
            .rev()
            .find(|unit| unit.tracking_id() == *tracking_id)
    }

    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }

    /// Rows for the local bitmap list, in display order.
    pub fn list_entries(&self) -> Vec<ListEntry> {
        self.bitmaps
            .iter()
            .map(|unit| ListEntry {
                name: unit.short_name().to_string(),
                tracking_id: unit.tracking_id(),
            })
            .collect()
    }

    pub fn timer(&self) -> &HeartbeatTimer {
        &self.timer
    }

    /// Runs an update pass if the heartbeat is due, returns whether it did.
    pub fn tick(&mut self) -> bool {
        if self.timer.poll() {
            self.do_updates();
            true
        } else {
            false
        }
    }

    /// Checks every unit for changes.
    ///
    /// The heartbeat is paused for the duration of the pass so passes never
    /// overlap.
    pub fn do_updates(&mut self) {
        self.timer.stop();
        self.needs_rebake = false;

        for unit in self.bitmaps.iter_mut() {
            if let Some(replacement) = unit.update_self() {
                if replacement.needs_rebake() {
                    self.needs_rebake = true;
                }
            }
        }

        self.do_rebake();
        self.timer.start();
    }

    pub fn set_needs_rebake(&mut self) {
        self.needs_rebake = true;
    }

    pub fn needs_rebake(&self) -> bool {
        self.needs_rebake
    }

    /// Bakes the avatar if a wearable layer changed since the last bake.
    pub fn do_rebake(&mut self) {
        if self.needs_rebake {
            debug!(self.log, "rebaking avatar textures"; "slam" => self.config.slam_rebake);
            self.viewer
                .world
                .write()
                .avatar
                .force_bake_all_textures(self.config.slam_rebake);
            self.needs_rebake = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data::avatar::{BakedTexture, LocalTexture, Wearable, WearableType};
    use data::object::{Face, ViewerObject};
    use data::IMG_DEFAULT;
    use image::{Rgb, RgbImage};
    use slog::Discard;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn manager(viewer: &ViewerState) -> LocalBitmapManager {
        LocalBitmapManager::new(
            LocalBitmapsConfig::default(),
            viewer.clone(),
            Logger::root(Discard, o!()),
        )
    }

    fn write_png(dir: &TempDir, name: &str, color: u8) -> PathBuf {
        let path = dir.path().join(name);
        RgbImage::from_pixel(4, 4, Rgb([color, 0, 0])).save(&path).unwrap();
        path
    }

    fn touch(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(secs)).unwrap();
    }

    #[test]
    fn add_skips_invalid_files() {
        let dir = TempDir::new().unwrap();
        let good = write_png(&dir, "good.png", 1);
        let gif = dir.path().join("anim.gif");
        fs::write(&gif, b"GIF89a").unwrap();
        let viewer = ViewerState::default();
        let mut mgr = manager(&viewer);

        assert!(!mgr.add_units(vec![gif.clone(), dir.path().join("missing.png")]));
        assert!(mgr.is_empty());

        assert!(mgr.add_units(vec![gif, good.clone()]));
        assert_eq!(mgr.len(), 1);
        assert!(mgr.timer().is_running());

        let entries = mgr.list_entries();
        assert_eq!(entries[0].name, "good");
        assert_eq!(mgr.filename(&entries[0].tracking_id), Some(good.as_path()));
        assert!(mgr.world_id(&entries[0].tracking_id).is_some());
        assert_eq!(viewer.textures.read().len(), 1);
    }

    #[test]
    fn lookups_of_unknown_ids_are_empty() {
        let viewer = ViewerState::default();
        let mut mgr = manager(&viewer);
        let id = Uuid::new_v4();
        assert_eq!(mgr.world_id(&id), None);
        assert_eq!(mgr.filename(&id), None);
        mgr.del_unit(&id);
        assert!(mgr.list_entries().is_empty());
    }

    #[test]
    fn list_keeps_insertion_order() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            write_png(&dir, "c.png", 1),
            write_png(&dir, "a.png", 2),
            write_png(&dir, "b.png", 3),
        ];
        let viewer = ViewerState::default();
        let mut mgr = manager(&viewer);
        mgr.add_units(paths);

        let names: Vec<_> = mgr.list_entries().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn del_unit_releases_and_restores_default() {
        let dir = TempDir::new().unwrap();
        let viewer = ViewerState::default();
        let mut mgr = manager(&viewer);
        mgr.add_units(vec![write_png(&dir, "a.png", 1), write_png(&dir, "b.png", 2)]);
        let entries = mgr.list_entries();
        let world_id = mgr.world_id(&entries[0].tracking_id).unwrap();
        let obj = Uuid::new_v4();
        viewer
            .world
            .write()
            .objects
            .add(ViewerObject::new(obj, vec![Face::with_texture(world_id)]));

        mgr.del_unit(&entries[0].tracking_id);
        assert_eq!(mgr.len(), 1);
        assert_eq!(mgr.list_entries()[0], entries[1]);
        assert_eq!(viewer.textures.read().len(), 1);
        assert!(!viewer.textures.read().contains(&world_id));
        assert_eq!(
            viewer.world.read().objects.get(&obj).unwrap().faces[0].texture,
            Some(IMG_DEFAULT)
        );
    }

    #[test]
    fn update_pass_rebakes_once_for_wearable_changes() {
        let dir = TempDir::new().unwrap();
        let a = write_png(&dir, "a.png", 1);
        let b = write_png(&dir, "b.png", 2);
        let c = write_png(&dir, "c.png", 3);
        let viewer = ViewerState::default();
        let mut mgr = manager(&viewer);
        mgr.add_units(vec![a.clone(), b.clone(), c]);
        let entries = mgr.list_entries();
        let id_a = mgr.world_id(&entries[0].tracking_id).unwrap();
        let id_b = mgr.world_id(&entries[1].tracking_id).unwrap();
        {
            let mut world = viewer.world.write();
            world.wearables.wear(Wearable::new(
                WearableType::Shirt,
                vec![LocalTexture { id: id_a, baked: BakedTexture::Upper }],
            ));
            world.wearables.wear(Wearable::new(
                WearableType::Pants,
                vec![LocalTexture { id: id_b, baked: BakedTexture::Lower }],
            ));
        }

        // Nothing changed, nothing to bake.
        mgr.do_updates();
        assert_eq!(viewer.world.read().avatar.bake_count(), 0);

        touch(&a, 10);
        touch(&b, 10);
        mgr.do_updates();
        assert_eq!(viewer.world.read().avatar.bake_count(), 1);
        assert!(!mgr.needs_rebake());
        assert!(mgr.timer().is_running());
        assert_ne!(mgr.world_id(&entries[0].tracking_id), Some(id_a));
        assert_ne!(mgr.world_id(&entries[1].tracking_id), Some(id_b));
    }

    #[test]
    fn update_pass_without_wearables_does_not_rebake() {
        let dir = TempDir::new().unwrap();
        let a = write_png(&dir, "a.png", 1);
        let viewer = ViewerState::default();
        let mut mgr = manager(&viewer);
        mgr.add_units(vec![a.clone()]);
        let world_id = mgr.world_id(&mgr.list_entries()[0].tracking_id).unwrap();
        let obj = Uuid::new_v4();
        viewer
            .world
            .write()
            .objects
            .add(ViewerObject::new(obj, vec![Face::with_texture(world_id)]));

        touch(&a, 10);
        mgr.do_updates();
        let world = viewer.world.read();
        assert_eq!(world.avatar.bake_count(), 0);
        assert_ne!(world.objects.get(&obj).unwrap().faces[0].texture, Some(world_id));
    }

    #[test]
    fn do_rebake_only_when_flagged() {
        let viewer = ViewerState::default();
        let mut mgr = manager(&viewer);
        mgr.do_rebake();
        assert_eq!(viewer.world.read().avatar.bake_count(), 0);

        mgr.set_needs_rebake();
        mgr.do_rebake();
        mgr.do_rebake();
        assert_eq!(viewer.world.read().avatar.bake_count(), 1);
        assert_eq!(viewer.world.read().avatar.last_bake_slammed(), Some(true));
    }
}
