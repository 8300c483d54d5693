/// Named texture slots with placeholder-until-loaded semantics
///
/// A slot is reserved at load time with a 1x1 placeholder so that every draw
/// has something valid to sample. When the streamed image arrives the slot's
/// texture is swapped for the decoded one; nodes keep their `TextureKey`.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, Texture, TextureDesc};

new_key_type! {
    pub struct TextureKey;
}

/// Texel shown until a streamed image is resident
pub const PLACEHOLDER_RGBA: [u8; 4] = [0, 0, 255, 255];

/// Texel bound for untextured nodes
pub const WHITE_RGBA: [u8; 4] = [255, 255, 255, 255];

struct TextureSlot {
    name: String,
    texture: Arc<dyn Texture>,
    resident: bool,
}

pub struct TextureSlots {
    slots: SlotMap<TextureKey, TextureSlot>,
    by_name: FxHashMap<String, TextureKey>,
    white: Arc<dyn Texture>,
}

impl TextureSlots {
    pub fn new(device: &mut dyn GraphicsDevice) -> Result<Self> {
        let white = device.create_texture(TextureDesc::solid_color("white", WHITE_RGBA))?;
        Ok(Self {
            slots: SlotMap::with_key(),
            by_name: FxHashMap::default(),
            white,
        })
    }

    /// Reserve a slot holding the placeholder; an existing name returns its key
    pub fn reserve(&mut self, device: &mut dyn GraphicsDevice, name: &str) -> Result<TextureKey> {
        if let Some(&key) = self.by_name.get(name) {
            return Ok(key);
        }
        let texture = device.create_texture(TextureDesc::solid_color(
            format!("{}.placeholder", name),
            PLACEHOLDER_RGBA,
        ))?;
        let key = self.slots.insert(TextureSlot {
            name: name.to_string(),
            texture,
            resident: false,
        });
        self.by_name.insert(name.to_string(), key);
        Ok(key)
    }

    /// Upload decoded RGBA pixels and swap them into the slot
    ///
    /// Unknown keys are ignored (the slot was released by an unload).
    pub fn replace(
        &mut self,
        device: &mut dyn GraphicsDevice,
        key: TextureKey,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<bool> {
        let Some(slot) = self.slots.get_mut(key) else {
            return Ok(false);
        };
        slot.texture = device.create_texture(TextureDesc::rgba8(slot.name.clone(), width, height, pixels))?;
        slot.resident = true;
        Ok(true)
    }

    pub fn key(&self, name: &str) -> Option<TextureKey> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, key: TextureKey) -> Option<&str> {
        self.slots.get(key).map(|slot| slot.name.as_str())
    }

    /// Current texture of a slot, the white texture for unknown keys
    pub fn texture(&self, key: TextureKey) -> &Arc<dyn Texture> {
        self.slots.get(key).map(|slot| &slot.texture).unwrap_or(&self.white)
    }

    pub fn is_resident(&self, key: TextureKey) -> bool {
        self.slots.get(key).is_some_and(|slot| slot.resident)
    }

    pub fn white(&self) -> &Arc<dyn Texture> {
        &self.white
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
#[path = "texture_slots_tests.rs"]
mod tests;
