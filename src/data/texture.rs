use data::Uuid;
use decode::RawImage;
use std::collections::HashMap;
use std::sync::Arc;

/// A texture known to the renderer.
#[derive(Debug)]
pub struct Texture {
    id: Uuid,

    /// Where the pixel data came from, `file://...` for local files.
    url: String,

    raw: Arc<RawImage>,
    refs: usize,
}

impl Texture {
    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Shared handle to the pixel data, valid even after the texture has been
    /// removed from the list.
    pub fn raw(&self) -> Arc<RawImage> {
        Arc::clone(&self.raw)
    }

    pub fn ref_count(&self) -> usize {
        self.refs
    }
}

/// The texture list owns all textures the renderer can bind, indexed by id.
#[derive(Debug, Default)]
pub struct TextureList {
    textures: HashMap<Uuid, Texture>,
}

impl TextureList {
    pub fn new() -> Self {
        TextureList::default()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Registers a texture holding a single reference for the caller.
    ///
    /// An existing texture with the same id is replaced.
    pub fn add_image(&mut self, id: Uuid, url: String, raw: RawImage) {
        let texture = Texture {
            id,
            url,
            raw: Arc::new(raw),
            refs: 1,
        };
        self.textures.insert(id, texture);
    }

    pub fn find_image(&self, id: &Uuid) -> Option<&Texture> {
        self.textures.get(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.textures.contains_key(id)
    }

    /// Drops one reference, returns the remaining count.
    pub fn unref(&mut self, id: &Uuid) -> Option<usize> {
        self.textures.get_mut(id).map(|t| {
            t.refs = t.refs.saturating_sub(1);
            t.refs
        })
    }

    /// Removes the texture from the list regardless of outstanding references.
    pub fn delete_image(&mut self, id: &Uuid) -> Option<Texture> {
        self.textures.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_find_delete() {
        let mut list = TextureList::new();
        let id = Uuid::new_v4();
        list.add_image(id, "file:///tmp/a.png".to_string(), RawImage::new());
        assert_eq!(list.len(), 1);
        assert_eq!(list.find_image(&id).map(|t| t.ref_count()), Some(1));
        assert_eq!(list.find_image(&id).map(|t| t.url()), Some("file:///tmp/a.png"));

        assert_eq!(list.unref(&id), Some(0));
        assert_eq!(list.unref(&id), Some(0));

        let removed = list.delete_image(&id).unwrap();
        assert_eq!(removed.id(), &id);
        assert!(list.is_empty());
        assert_eq!(list.unref(&id), None);
    }
}
