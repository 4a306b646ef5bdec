//! Local bitmaps: watch image files on disk and use them as textures in the
//! world, on prims, sculpts and on the client avatar's wearables, without
//! uploading them to the grid.

extern crate crossbeam_channel;
#[macro_use]
extern crate failure;
extern crate image;
#[macro_use]
extern crate lazy_static;
extern crate parking_lot;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate slog;
extern crate toml;
extern crate uuid;

#[cfg(test)]
extern crate tempfile;

pub mod config;
pub mod data;
pub mod decode;
pub mod local;

pub use local::{LinkStatus, LocalBitmap, LocalBitmapError, LocalBitmapManager, ViewerState};
