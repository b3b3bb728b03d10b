// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer settings.

use crate::types::{Color, MaterialId};

/// Texture sampling of draw items.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TextureFilter {
    /// Inherit from the parent.
    #[default]
    ParentNode,
    /// Nearest neighbor.
    Nearest,
    /// Bilinear.
    Linear,
}

/// Texture wrapping of draw items.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TextureRepeat {
    /// Inherit from the parent.
    #[default]
    ParentNode,
    /// Clamp.
    Disabled,
    /// Repeat.
    Enabled,
    /// Mirrored repeat.
    Mirror,
}

/// Whether debug shapes of a subsystem are drawn.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DebugVisibility {
    /// Follow [`LayerConfig::debug_overlay`].
    #[default]
    Default,
    /// Always draw.
    ForceShow,
    /// Never draw.
    ForceHide,
}

impl DebugVisibility {
    /// Resolve against the overlay toggle.
    pub fn is_shown(self, debug_overlay: bool) -> bool {
        match self {
            Self::Default => debug_overlay,
            Self::ForceShow => true,
            Self::ForceHide => false,
        }
    }
}

/// Settings of one layer. Each field has a matching setter on
/// [`TileLayer`](crate::TileLayer) that marks the right aspects dirty.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerConfig {
    /// Disabled layers release every backend object.
    pub enabled: bool,
    /// Hidden layers release draw items and occluders but keep physics.
    pub visible: bool,
    /// Side of a rendering quadrant in cells.
    pub rendering_quadrant_size: i32,
    /// Draw tiles in Y order instead of batching by quadrant.
    pub y_sort_enabled: bool,
    /// Offset added to every tile's Y-sort position.
    pub y_sort_origin: i32,
    /// Z-index of the layer.
    pub z_index: i32,
    /// Light mask of draw items and occluders.
    pub light_mask: i32,
    /// Texture filter of draw items.
    pub texture_filter: TextureFilter,
    /// Texture repeat of draw items.
    pub texture_repeat: TextureRepeat,
    /// Tint of the tiles.
    pub self_modulate: Color,
    /// Material of the layer; tiles without a material inherit it.
    pub material: Option<MaterialId>,
    /// Create kinematic bodies so moving the layer pushes other bodies.
    pub collision_animatable: bool,
    /// Debug drawing of collision shapes.
    pub collision_visibility: DebugVisibility,
    /// Create navigation regions.
    pub navigation_enabled: bool,
    /// Debug drawing of navigation meshes.
    pub navigation_visibility: DebugVisibility,
    /// Position in the owning group; layer 0 shares the world navigation map.
    pub layer_index: usize,
    /// Draw the debug overlay.
    pub debug_overlay: bool,
    /// Seed of the terrain painting random generator.
    pub random_seed: u64,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            visible: true,
            rendering_quadrant_size: 16,
            y_sort_enabled: false,
            y_sort_origin: 0,
            z_index: 0,
            light_mask: 1,
            texture_filter: TextureFilter::default(),
            texture_repeat: TextureRepeat::default(),
            self_modulate: Color::WHITE,
            material: None,
            collision_animatable: false,
            collision_visibility: DebugVisibility::default(),
            navigation_enabled: true,
            navigation_visibility: DebugVisibility::default(),
            layer_index: 0,
            debug_overlay: false,
            random_seed: 0x5EED,
        }
    }
}

impl LayerConfig {
    /// Whether the debug pass has anything to draw.
    pub fn debug_active(&self) -> bool {
        self.debug_overlay
            || self.collision_visibility == DebugVisibility::ForceShow
            || self.navigation_visibility == DebugVisibility::ForceShow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_visibility_follows_overlay() {
        let mut config = LayerConfig::default();
        assert!(!config.debug_active());
        config.collision_visibility = DebugVisibility::ForceShow;
        assert!(config.debug_active());
        assert!(DebugVisibility::Default.is_shown(true));
        assert!(!DebugVisibility::ForceHide.is_shown(true));
    }
}
