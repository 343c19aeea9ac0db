//! Bake-once layers for everything that stops changing.
//!
//! One [`RenderCache`] lives for one surface size. Its layers only ever grow
//! by appended primitives; a resize throws the whole cache away and starts a
//! fresh one, which also gives every layer a new identity.

use crate::{paint::Layer, tree::Tree};
use glam::Vec2;

#[derive(Clone, Debug)]
pub struct RenderCache {
    size: Vec2,
    tree: Option<Layer>,
    blossoms: Layer,
    stars: Layer,
}

impl RenderCache {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            tree: None,
            blossoms: Layer::new(size),
            stars: Layer::new(size),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Growth at which the tree is considered done and can be snapshotted.
    pub fn tree_threshold(tree: &Tree) -> f32 {
        tree.fully_grown_at().max(1.0)
    }

    /// Records the whole tree into a layer the first time `growth` reaches
    /// its threshold. Later calls are no-ops.
    ///
    /// ### Returns
    /// `true` if this call took the snapshot.
    pub fn bake_tree(&mut self, tree: &Tree, growth: f32, samples: usize) -> bool {
        if self.tree.is_some() || growth < Self::tree_threshold(tree) {
            return false;
        }
        let mut layer = Layer::new(self.size);
        tree.draw(growth, samples, &mut layer);
        log::debug!(
            "tree snapshot taken at growth {growth:.3}: {} strokes",
            layer.len()
        );
        self.tree = Some(layer);
        true
    }

    /// The tree snapshot, once taken.
    pub fn tree(&self) -> Option<&Layer> {
        self.tree.as_ref()
    }

    pub fn blossoms(&self) -> &Layer {
        &self.blossoms
    }

    pub fn blossoms_mut(&mut self) -> &mut Layer {
        &mut self.blossoms
    }

    pub fn stars(&self) -> &Layer {
        &self.stars
    }

    pub fn stars_mut(&mut self) -> &mut Layer {
        &mut self.stars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use rand::{SeedableRng, rngs::StdRng};

    fn tree() -> Tree {
        let mut rng = StdRng::seed_from_u64(21);
        Tree::generate(Vec2::new(800.0, 600.0), &TreeConfig::default(), 1.2, &mut rng)
    }

    #[test]
    fn tree_is_snapshotted_once_after_full_growth() {
        let tree = tree();
        let mut cache = RenderCache::new(Vec2::new(800.0, 600.0));

        assert!(!cache.bake_tree(&tree, 0.5, 6));
        assert!(cache.tree().is_none());

        let threshold = RenderCache::tree_threshold(&tree);
        assert!(threshold >= 1.0);
        assert!(cache.bake_tree(&tree, threshold, 6));
        let id = cache.tree().map(Layer::id);
        assert_eq!(cache.tree().map(Layer::len), Some(tree.len()));

        assert!(!cache.bake_tree(&tree, 1.6, 6));
        assert_eq!(cache.tree().map(Layer::id), id);
    }

    #[test]
    fn fresh_caches_get_fresh_layer_ids() {
        let a = RenderCache::new(Vec2::splat(10.0));
        let b = RenderCache::new(Vec2::splat(10.0));
        assert_ne!(a.blossoms().id(), b.blossoms().id());
        assert_ne!(a.stars().id(), b.stars().id());
        assert_ne!(a.blossoms().id(), a.stars().id());
    }

    #[test]
    fn empty_tree_snapshot_is_empty() {
        let mut cache = RenderCache::new(Vec2::ZERO);
        assert!(cache.bake_tree(&Tree::default(), 1.0, 6));
        assert_eq!(cache.tree().map(Layer::len), Some(0));
    }
}
