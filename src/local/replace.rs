//! Swapping one texture id for another everywhere the client can change it:
//! on prim faces, on sculpts and in the local textures of the avatar's
//! wearables.

use data::avatar::{texture_channel, AgentWearables, AvatarAppearance, WearableType};
use data::object::ObjectList;
use data::{Uuid, World, IMG_DEFAULT, IMG_DEFAULT_AVATAR};
use slog::Logger;

/// What a replacement touched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Replacement {
    /// Faces rebound to the new texture.
    pub faces: usize,
    /// Objects a texture entry update was sent for.
    pub objects: usize,
    pub sculpts: usize,
    /// Wearable texture slots moved to the new texture.
    pub layers: usize,
}

impl Replacement {
    pub fn is_empty(&self) -> bool {
        *self == Replacement::default()
    }

    /// Wearable layers changed, so the avatar has to be baked again.
    pub fn needs_rebake(&self) -> bool {
        self.layers > 0
    }
}

/// Points everything using `old_id` at `new_id`.
///
/// Wearables never get `IMG_DEFAULT`, they get `IMG_DEFAULT_AVATAR` instead.
/// No rebake is done here, callers check `Replacement::needs_rebake`.
pub fn replace_ids(world: &mut World, old_id: Uuid, new_id: Uuid, log: &Logger) -> Replacement {
    let mut replacement = Replacement::default();
    if old_id == new_id {
        return replacement;
    }

    update_user_prims(&mut world.objects, old_id, new_id, &mut replacement);
    update_user_sculpts(&mut world.objects, old_id, new_id, &mut replacement);

    let layer_id = if new_id == IMG_DEFAULT {
        IMG_DEFAULT_AVATAR
    } else {
        new_id
    };
    for &wearable_type in WearableType::ALL.iter() {
        update_user_layers(
            &mut world.wearables,
            &mut world.avatar,
            old_id,
            layer_id,
            wearable_type,
            &mut replacement,
            log,
        );
    }

    if !replacement.is_empty() {
        debug!(log, "replaced texture";
            "old" => %old_id, "new" => %new_id,
            "faces" => replacement.faces, "objects" => replacement.objects,
            "sculpts" => replacement.sculpts, "layers" => replacement.layers);
    }
    replacement
}

fn update_user_prims(objects: &mut ObjectList, old_id: Uuid, new_id: Uuid, rep: &mut Replacement) {
    let mut updated = Vec::new();
    for object in objects.iter_mut() {
        let mut update_obj = false;
        for face in object.faces.iter_mut() {
            if face.texture == Some(old_id) {
                face.texture = Some(new_id);
                update_obj = true;
                rep.faces += 1;
            }
        }
        if update_obj {
            updated.push(*object.id());
        }
    }

    // One update per object, it carries all faces.
    rep.objects += updated.len();
    for id in updated {
        objects.send_te_update(id);
    }
}

fn update_user_sculpts(
    objects: &mut ObjectList,
    old_id: Uuid,
    new_id: Uuid,
    rep: &mut Replacement,
) {
    let mut updated = Vec::new();
    for object in objects.iter_mut() {
        let id = *object.id();
        if let Some(ref mut sculpt) = object.sculpt {
            if sculpt.texture == old_id {
                sculpt.texture = new_id;
                updated.push(id);
            }
        }
    }

    rep.sculpts += updated.len();
    for id in updated {
        objects.send_sculpt_update(id);
    }
}

fn update_user_layers(
    wearables: &mut AgentWearables,
    avatar: &mut AvatarAppearance,
    old_id: Uuid,
    new_id: Uuid,
    wearable_type: WearableType,
    rep: &mut Replacement,
    log: &Logger,
) {
    for index in 0..wearables.wearable_count(wearable_type) {
        let wearable = match wearables.wearable_mut(wearable_type, index) {
            Some(wearable) => wearable,
            None => {
                debug!(log, "skipping missing wearable";
                    "type" => ?wearable_type, "index" => index);
                return;
            }
        };

        for lto in wearable.local_textures.iter_mut() {
            if lto.id != old_id {
                continue;
            }
            let channel = match texture_channel(wearable_type, lto.baked) {
                Some(channel) => channel,
                None => {
                    debug!(log, "no texture channel for wearable layer";
                        "type" => ?wearable_type, "baked" => ?lto.baked);
                    continue;
                }
            };

            lto.id = new_id;
            avatar.set_local_texture(channel, new_id, index);
            avatar.wearable_updated(wearable_type);
            rep.layers += 1;
        }
    }
}
