//! CPU-side list of sprite instances for one draw.

use crate::coords::{ColorRgba, Rect};

use super::atlas::AtlasRegion;
use super::layout::SpriteInstance;

/// Upper bound used by `SpriteBatch::default()`.
pub const DEFAULT_MAX_INSTANCES: usize = 16_384;

/// Host-friendly description of one sprite.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sprite {
    /// Occupied world rectangle.
    pub rect: Rect,
    pub region: AtlasRegion,
    pub tint: ColorRgba,
}

impl Sprite {
    /// Untinted sprite showing the whole atlas.
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            region: AtlasRegion::FULL,
            tint: ColorRgba::WHITE,
        }
    }

    pub fn region(mut self, region: AtlasRegion) -> Self {
        self.region = region;
        self
    }

    pub fn tint(mut self, tint: ColorRgba) -> Self {
        self.tint = tint;
        self
    }
}

impl From<Sprite> for SpriteInstance {
    fn from(s: Sprite) -> Self {
        Self {
            position: s.rect.origin.to_array(),
            size: s.rect.size.to_array(),
            uv_offset: s.region.uv_offset,
            uv_size: s.region.uv_size,
            color: s.tint.to_array(),
        }
    }
}

/// Bounded instance list, drawn by `SpriteRenderer` as a single instanced call.
///
/// Sprites pushed past `max_instances` are dropped and counted; the first
/// overflow is logged once per batch.
#[derive(Debug, Clone)]
pub struct SpriteBatch {
    instances: Vec<SpriteInstance>,
    max_instances: usize,
    dropped: usize,
    warned_full: bool,
}

impl SpriteBatch {
    pub fn new(max_instances: usize) -> Self {
        Self {
            instances: Vec::with_capacity(max_instances.min(DEFAULT_MAX_INSTANCES)),
            max_instances,
            dropped: 0,
            warned_full: false,
        }
    }

    /// Appends a sprite. Returns `false` if the batch is full.
    pub fn push(&mut self, sprite: Sprite) -> bool {
        self.push_instance(sprite.into())
    }

    /// Appends a raw instance record. Returns `false` if the batch is full.
    pub fn push_instance(&mut self, instance: SpriteInstance) -> bool {
        if self.instances.len() >= self.max_instances {
            self.dropped += 1;
            if !self.warned_full {
                log::warn!(
                    "SpriteBatch: limit of {} instances reached; extra sprites are dropped",
                    self.max_instances
                );
                self.warned_full = true;
            }
            return false;
        }
        self.instances.push(instance);
        true
    }

    /// Removes all instances and resets the dropped counter.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.dropped = 0;
    }

    pub fn instances(&self) -> &[SpriteInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    /// Sprites rejected since the last `clear`.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Default for SpriteBatch {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INSTANCES)
    }
}

impl Extend<Sprite> for SpriteBatch {
    fn extend<I: IntoIterator<Item = Sprite>>(&mut self, iter: I) {
        for sprite in iter {
            if !self.push(sprite) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite(x: f32) -> Sprite {
        Sprite::new(Rect::new(x, 0.0, 8.0, 8.0))
    }

    #[test]
    fn sprite_converts_to_instance_record() {
        let s = Sprite::new(Rect::new(10.0, 20.0, 4.0, 6.0))
            .region(AtlasRegion { uv_offset: [0.25, 0.5], uv_size: [0.25, 0.25] })
            .tint(ColorRgba::new(1.0, 0.5, 0.0, 1.0));
        let inst = SpriteInstance::from(s);
        assert_eq!(inst.position, [10.0, 20.0]);
        assert_eq!(inst.size, [4.0, 6.0]);
        assert_eq!(inst.uv_offset, [0.25, 0.5]);
        assert_eq!(inst.uv_size, [0.25, 0.25]);
        assert_eq!(inst.color, [1.0, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn push_respects_the_limit() {
        let mut batch = SpriteBatch::new(2);
        assert!(batch.push(sprite(0.0)));
        assert!(batch.push(sprite(1.0)));
        assert!(!batch.push(sprite(2.0)));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.dropped(), 1);
        assert_eq!(batch.instances()[1].position, [1.0, 0.0]);
    }

    #[test]
    fn clear_empties_and_resets_counter() {
        let mut batch = SpriteBatch::new(1);
        batch.extend([sprite(0.0), sprite(1.0)]);
        assert_eq!(batch.dropped(), 1);
        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.dropped(), 0);
        assert!(batch.push(sprite(3.0)));
    }

    #[test]
    fn instances_keep_push_order() {
        let mut batch = SpriteBatch::default();
        batch.extend((0..5).map(|i| sprite(i as f32)));
        let xs: Vec<f32> = batch.instances().iter().map(|i| i.position[0]).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }
}
