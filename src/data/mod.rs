//! This module contains the types which represent the state of the viewer
//! that local bitmaps are plugged into: the texture list, the objects in
//! the world and the wearables of the client avatar.

pub use uuid::Uuid;

pub mod avatar;
pub mod object;
pub mod texture;

use self::avatar::{AgentWearables, AvatarAppearance};
use self::object::ObjectList;

/// Fallback texture of the viewer.
pub const IMG_DEFAULT: Uuid = Uuid::from_u128(0xd2114404_dd59_4a4d_8e6c_49359e91bbf0);

/// Fallback texture for avatar texture layers.
pub const IMG_DEFAULT_AVATAR: Uuid = Uuid::from_u128(0xc228d1cf_4b5d_4ba8_84f4_899a0796aa97);

/// Everything in the world a local texture can end up being used by.
#[derive(Debug, Default)]
pub struct World {
    pub objects: ObjectList,
    pub wearables: AgentWearables,
    pub avatar: AvatarAppearance,
}

impl World {
    pub fn new() -> Self {
        World::default()
    }
}
