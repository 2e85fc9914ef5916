//! Static container placement.
//!
//! The resting box — side margins, height cap, vertical centering — is
//! solved with taffy. Everything dynamic (intro slide, keyboard shift,
//! elastic swipe offset) is applied by the controllers as a vertical
//! translation on top of the solved rect.

use overdrop_core::{Rect, Size};
use taffy::prelude::*;

use crate::host::ContentPanel;

pub(crate) const SIDE_MARGIN: f32 = 16.0;
pub(crate) const VERTICAL_MARGIN: f32 = 16.0;

/// Resting frame of the rounded container on `screen`: full width minus the
/// side margins, height capped to the screen minus the vertical margins,
/// centered vertically.
pub fn resting_container(screen: Size, content: &dyn ContentPanel) -> Rect {
    let avail = Size::new(
        (screen.width - 2.0 * SIDE_MARGIN).max(0.0),
        (screen.height - 2.0 * VERTICAL_MARGIN).max(0.0),
    );
    let preferred = content.preferred_size(avail);

    let mut tree: TaffyTree<()> = TaffyTree::new();
    let container = tree
        .new_leaf(Style {
            size: taffy::geometry::Size {
                width: length(avail.width),
                height: length(preferred.height.min(avail.height)),
            },
            ..Default::default()
        })
        .unwrap();
    let root = tree
        .new_with_children(
            Style {
                size: taffy::geometry::Size {
                    width: length(screen.width),
                    height: length(screen.height),
                },
                display: Display::Flex,
                flex_direction: FlexDirection::Column,
                align_items: Some(AlignItems::Center),
                justify_content: Some(JustifyContent::Center),
                ..Default::default()
            },
            &[container],
        )
        .unwrap();
    tree.compute_layout(
        root,
        taffy::geometry::Size {
            width: AvailableSpace::Definite(screen.width),
            height: AvailableSpace::Definite(screen.height),
        },
    )
    .unwrap();

    let l = tree.layout(container).unwrap();
    Rect {
        x: l.location.x,
        y: l.location.y,
        w: l.size.width,
        h: l.size.height,
    }
}
