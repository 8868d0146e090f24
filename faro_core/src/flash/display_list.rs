use crate::backend::BlendMode;
use crate::flash::stream::{ColorTransform, Matrix2D, PlaceObject};
use faro_ids::CharacterId;
use std::collections::BTreeMap;

/// One placed object inside a clip
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayObject {
    pub character: CharacterId,
    pub matrix: Matrix2D,
    pub cxform: ColorTransform,
    pub blend: BlendMode,
}

/// Depth-ordered set of currently placed objects. Iteration order is draw
/// order (ascending depth).
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    entries: BTreeMap<u16, DisplayObject>,
}

impl DisplayList {
    /// Apply a place edit: flagged fields overwrite, absent fields keep the
    /// entry's current value. A fresh depth must name a character — an edit
    /// of nothing is authored-content breakage.
    pub fn place(&mut self, po: &PlaceObject) {
        match self.entries.get_mut(&po.depth) {
            Some(entry) => {
                if let Some(character) = po.character {
                    entry.character = character;
                }
                if let Some(matrix) = po.matrix {
                    entry.matrix = matrix;
                }
                if let Some(cxform) = po.cxform {
                    entry.cxform = cxform;
                }
                if let Some(blend) = po.blend {
                    entry.blend = blend;
                }
            }
            None => {
                let Some(character) = po.character else {
                    panic!(
                        "vector animation: place at empty depth {} without a character",
                        po.depth
                    );
                };
                self.entries.insert(
                    po.depth,
                    DisplayObject {
                        character,
                        matrix: po.matrix.unwrap_or_default(),
                        cxform: po.cxform.unwrap_or_default(),
                        blend: po.blend.unwrap_or_default(),
                    },
                );
            }
        }
    }

    pub fn remove(&mut self, depth: u16) {
        self.entries.remove(&depth);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, depth: u16) -> Option<&DisplayObject> {
        self.entries.get(&depth)
    }

    /// Ascending-depth iteration (draw order)
    pub fn iter(&self) -> impl Iterator<Item = (u16, &DisplayObject)> {
        self.entries.iter().map(|(&d, o)| (d, o))
    }
}
