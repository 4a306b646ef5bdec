//! Local bitmaps are image files on the user's disk which are used in place of
//! grid textures, for previewing textures before uploading them.
//!
//! Every watched file is a `LocalBitmap` unit. The `LocalBitmapManager` checks
//! all units on a heartbeat, and a unit whose file changed decodes it again,
//! publishes it under a fresh texture id and points everything that used the
//! previous id at the new one (see `replace`).

use data::texture::TextureList;
use data::World;
use decode::DecodeError;
use parking_lot::RwLock;
use std::io;
use std::sync::Arc;

pub mod bitmap;
pub mod manager;
pub mod replace;
pub mod timer;

pub use self::bitmap::{LinkStatus, LocalBitmap};
pub use self::manager::{ListEntry, LocalBitmapManager};
pub use self::replace::{replace_ids, Replacement};
pub use self::timer::HeartbeatTimer;

/// Handles to the parts of the viewer local bitmaps read and modify.
///
/// Units and the manager lock these only for the duration of a single
/// operation, so callers must not hold a lock while calling into them.
#[derive(Clone, Default)]
pub struct ViewerState {
    pub textures: Arc<RwLock<TextureList>>,
    pub world: Arc<RwLock<World>>,
}

impl ViewerState {
    pub fn new(textures: TextureList, world: World) -> Self {
        ViewerState {
            textures: Arc::new(RwLock::new(textures)),
            world: Arc::new(RwLock::new(world)),
        }
    }
}

#[derive(Debug, Fail)]
pub enum LocalBitmapError {
    #[fail(display = "Unsupported image file: {}", _0)]
    UnsupportedFormat(String),

    #[fail(display = "Local file {} is not accessible: {}", path, error)]
    Missing {
        path: String,
        #[cause]
        error: io::Error,
    },

    #[fail(display = "Decoding {} failed: {}", path, error)]
    Decode {
        path: String,
        #[cause]
        error: DecodeError,
    },

    #[fail(display = "The link to the local file is broken.")]
    Broken,
}
