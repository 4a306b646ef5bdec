//! The client avatar's wearables and the texture channels they feed.

use data::Uuid;
use std::collections::{HashMap, HashSet};

/// Wearable categories which carry local textures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WearableType {
    Alpha,
    Eyes,
    Gloves,
    Jacket,
    Pants,
    Shirt,
    Shoes,
    Skin,
    Skirt,
    Socks,
    Tattoo,
    Underpants,
    Undershirt,
}

impl WearableType {
    pub const ALL: [WearableType; 13] = [
        WearableType::Alpha,
        WearableType::Eyes,
        WearableType::Gloves,
        WearableType::Jacket,
        WearableType::Pants,
        WearableType::Shirt,
        WearableType::Shoes,
        WearableType::Skin,
        WearableType::Skirt,
        WearableType::Socks,
        WearableType::Tattoo,
        WearableType::Underpants,
        WearableType::Undershirt,
    ];
}

/// Body regions which are composited into one baked texture each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BakedTexture {
    Head,
    Upper,
    Lower,
    Eyes,
    Skirt,
    Hair,
}

/// Per layer texture channels of the avatar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AvatarTexture {
    HeadBodypaint,
    UpperShirt,
    LowerPants,
    EyesIris,
    UpperBodypaint,
    LowerBodypaint,
    LowerShoes,
    LowerSocks,
    UpperJacket,
    LowerJacket,
    UpperGloves,
    UpperUndershirt,
    LowerUnderpants,
    Skirt,
    LowerAlpha,
    UpperAlpha,
    HeadAlpha,
    EyesAlpha,
    HairAlpha,
    HeadTattoo,
    UpperTattoo,
    LowerTattoo,
}

/// Which channel a local texture of a wearable type ends up in, depending on
/// the baked texture its layer belongs to.
pub static WEARABLE_TEXTURE_CHANNELS: &[(WearableType, BakedTexture, AvatarTexture)] = &[
    (WearableType::Alpha, BakedTexture::Eyes, AvatarTexture::EyesAlpha),
    (WearableType::Alpha, BakedTexture::Hair, AvatarTexture::HairAlpha),
    (WearableType::Alpha, BakedTexture::Head, AvatarTexture::HeadAlpha),
    (WearableType::Alpha, BakedTexture::Lower, AvatarTexture::LowerAlpha),
    (WearableType::Alpha, BakedTexture::Upper, AvatarTexture::UpperAlpha),
    (WearableType::Eyes, BakedTexture::Eyes, AvatarTexture::EyesIris),
    (WearableType::Gloves, BakedTexture::Upper, AvatarTexture::UpperGloves),
    (WearableType::Jacket, BakedTexture::Lower, AvatarTexture::LowerJacket),
    (WearableType::Jacket, BakedTexture::Upper, AvatarTexture::UpperJacket),
    (WearableType::Pants, BakedTexture::Lower, AvatarTexture::LowerPants),
    (WearableType::Shirt, BakedTexture::Upper, AvatarTexture::UpperShirt),
    (WearableType::Shoes, BakedTexture::Lower, AvatarTexture::LowerShoes),
    (WearableType::Skin, BakedTexture::Head, AvatarTexture::HeadBodypaint),
    (WearableType::Skin, BakedTexture::Lower, AvatarTexture::LowerBodypaint),
    (WearableType::Skin, BakedTexture::Upper, AvatarTexture::UpperBodypaint),
    (WearableType::Skirt, BakedTexture::Skirt, AvatarTexture::Skirt),
    (WearableType::Socks, BakedTexture::Lower, AvatarTexture::LowerSocks),
    (WearableType::Tattoo, BakedTexture::Head, AvatarTexture::HeadTattoo),
    (WearableType::Tattoo, BakedTexture::Lower, AvatarTexture::LowerTattoo),
    (WearableType::Tattoo, BakedTexture::Upper, AvatarTexture::UpperTattoo),
    (WearableType::Underpants, BakedTexture::Lower, AvatarTexture::LowerUnderpants),
    (WearableType::Undershirt, BakedTexture::Upper, AvatarTexture::UpperUndershirt),
];

lazy_static! {
    static ref CHANNEL_INDEX: HashMap<(WearableType, BakedTexture), AvatarTexture> =
        WEARABLE_TEXTURE_CHANNELS
            .iter()
            .map(|&(wt, baked, tex)| ((wt, baked), tex))
            .collect();
}

/// Looks up the avatar texture channel for a wearable type and baked texture.
///
/// `None` means the combination does not exist, i.e. the wearable data is
/// inconsistent.
pub fn texture_channel(wearable_type: WearableType, baked: BakedTexture) -> Option<AvatarTexture> {
    CHANNEL_INDEX.get(&(wearable_type, baked)).cloned()
}

/// A texture slot of a wearable.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalTexture {
    pub id: Uuid,
    /// Baked texture of the first layer this slot is composited into.
    pub baked: BakedTexture,
}

#[derive(Clone, Debug)]
pub struct Wearable {
    wearable_type: WearableType,
    pub local_textures: Vec<LocalTexture>,
}

impl Wearable {
    pub fn new(wearable_type: WearableType, local_textures: Vec<LocalTexture>) -> Self {
        Wearable {
            wearable_type,
            local_textures,
        }
    }

    pub fn wearable_type(&self) -> WearableType {
        self.wearable_type
    }
}

/// The wearables worn by the client avatar, by type and in wearing order.
///
/// A slot can be empty (`None`) while its asset is still being fetched.
#[derive(Debug, Default)]
pub struct AgentWearables {
    worn: HashMap<WearableType, Vec<Option<Wearable>>>,
}

impl AgentWearables {
    pub fn new() -> Self {
        AgentWearables::default()
    }

    /// Adds a wearable on top of the others of its type, returns its index.
    pub fn wear(&mut self, wearable: Wearable) -> usize {
        self.push(wearable.wearable_type(), Some(wearable))
    }

    /// Adds a slot for a wearable which is not available yet.
    pub fn wear_pending(&mut self, wearable_type: WearableType) -> usize {
        self.push(wearable_type, None)
    }

    fn push(&mut self, wearable_type: WearableType, wearable: Option<Wearable>) -> usize {
        let list = self.worn.entry(wearable_type).or_insert_with(Vec::new);
        list.push(wearable);
        list.len() - 1
    }

    pub fn wearable_count(&self, wearable_type: WearableType) -> usize {
        self.worn.get(&wearable_type).map(|l| l.len()).unwrap_or(0)
    }

    pub fn wearable(&self, wearable_type: WearableType, index: usize) -> Option<&Wearable> {
        self.worn
            .get(&wearable_type)
            .and_then(|l| l.get(index))
            .and_then(|w| w.as_ref())
    }

    pub fn wearable_mut(
        &mut self,
        wearable_type: WearableType,
        index: usize,
    ) -> Option<&mut Wearable> {
        self.worn
            .get_mut(&wearable_type)
            .and_then(|l| l.get_mut(index))
            .and_then(|w| w.as_mut())
    }
}

/// Texture state of the client avatar as seen by the baking code.
#[derive(Debug, Default)]
pub struct AvatarAppearance {
    /// Channel assignments per (channel, wearable index).
    local_textures: HashMap<(AvatarTexture, usize), Uuid>,
    updated_wearables: HashSet<WearableType>,
    bake_count: usize,
    last_slam: Option<bool>,
}

impl AvatarAppearance {
    pub fn new() -> Self {
        AvatarAppearance::default()
    }

    pub fn set_local_texture(
        &mut self,
        channel: AvatarTexture,
        texture: Uuid,
        wearable_index: usize,
    ) {
        self.local_textures.insert((channel, wearable_index), texture);
    }

    pub fn local_texture(&self, channel: AvatarTexture, wearable_index: usize) -> Option<&Uuid> {
        self.local_textures.get(&(channel, wearable_index))
    }

    /// Marks the layers of a wearable type as needing to be composited again.
    pub fn wearable_updated(&mut self, wearable_type: WearableType) {
        self.updated_wearables.insert(wearable_type);
    }

    pub fn is_wearable_updated(&self, wearable_type: WearableType) -> bool {
        self.updated_wearables.contains(&wearable_type)
    }

    /// Requests all baked textures to be recomposited.
    ///
    /// `slam` also throws away the current bakes before rebuilding them.
    pub fn force_bake_all_textures(&mut self, slam: bool) {
        self.bake_count += 1;
        self.last_slam = Some(slam);
        self.updated_wearables.clear();
    }

    /// Number of full rebakes requested so far.
    pub fn bake_count(&self) -> usize {
        self.bake_count
    }

    pub fn last_bake_slammed(&self) -> Option<bool> {
        self.last_slam
    }
}
