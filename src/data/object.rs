//! Objects in the world as far as textures are concerned.

use data::Uuid;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Face {
    /// The texture bound to this face, if any.
    pub texture: Option<Uuid>,
}

impl Face {
    pub fn with_texture(texture: Uuid) -> Self {
        Face {
            texture: Some(texture),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SculptParams {
    /// Texture encoding the sculpted shape.
    pub texture: Uuid,
    pub sculpt_type: u8,
}

#[derive(Clone, Debug)]
pub struct ViewerObject {
    id: Uuid,
    pub faces: Vec<Face>,
    pub sculpt: Option<SculptParams>,
}

impl ViewerObject {
    pub fn new(id: Uuid, faces: Vec<Face>) -> Self {
        ViewerObject {
            id,
            faces,
            sculpt: None,
        }
    }

    pub fn sculpted(id: Uuid, faces: Vec<Face>, sculpt: SculptParams) -> Self {
        ViewerObject {
            id,
            faces,
            sculpt: Some(sculpt),
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }
}

/// Changes to an object which have to be sent to the simulator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectUpdate {
    /// The texture entry (all face textures) of the object changed.
    TextureEntry(Uuid),
    /// The sculpt parameter block of the object changed.
    SculptParams(Uuid),
}

/// All objects currently loaded by the viewer.
#[derive(Debug, Default)]
pub struct ObjectList {
    objects: Vec<ViewerObject>,
    pending_updates: Vec<ObjectUpdate>,
}

impl ObjectList {
    pub fn new() -> Self {
        ObjectList::default()
    }

    pub fn add(&mut self, object: ViewerObject) {
        self.objects.push(object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<&ViewerObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewerObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ViewerObject> {
        self.objects.iter_mut()
    }

    /// Queues an update of the object's texture entry for the simulator.
    pub fn send_te_update(&mut self, id: Uuid) {
        self.pending_updates.push(ObjectUpdate::TextureEntry(id));
    }

    /// Queues an update of the object's sculpt parameters for the simulator.
    pub fn send_sculpt_update(&mut self, id: Uuid) {
        self.pending_updates.push(ObjectUpdate::SculptParams(id));
    }

    pub fn pending_updates(&self) -> &[ObjectUpdate] {
        &self.pending_updates[..]
    }

    /// Hands the queued updates to the networking code.
    pub fn take_pending_updates(&mut self) -> Vec<ObjectUpdate> {
        ::std::mem::replace(&mut self.pending_updates, Vec::new())
    }
}
