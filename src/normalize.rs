//! Annotation stripping and marker inheritance.

use crate::markers::{Marker, MarkerSet};
use crate::schema::{ConfItem, TypeExpr};

/// A type with its annotation wrappers peeled off.
///
/// Markers union across the wrapper chain and with anything inherited from
/// the enclosing context; configuration metadata is kept outer-to-inner so
/// that the entry closest to the leaf wins when merging.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedType {
    /// The underlying type, free of `Annotated` and `Alias` layers.
    pub ty: TypeExpr,
    /// Effective marker set, inherited markers included.
    pub markers: MarkerSet,
    /// Non-marker metadata, outer-to-inner.
    pub conf: Vec<ConfItem>,
    /// The outermost alias name, kept as a breadcrumb for auto-generated
    /// subcommand names.
    pub alias_breadcrumb: Option<String>,
}

/// Strip wrapper layers from `ty`, accumulating markers on the way down.
pub fn normalize(ty: &TypeExpr, inherited: MarkerSet) -> NormalizedType {
    let mut markers = inherited;
    let mut conf = Vec::new();
    let mut alias_breadcrumb = None;
    let mut current = ty;
    loop {
        match current {
            TypeExpr::Annotated(a) => {
                markers = markers.union(a.markers);
                conf.extend(a.conf.iter().cloned());
                current = &a.inner;
            }
            TypeExpr::Alias(a) => {
                if alias_breadcrumb.is_none() {
                    alias_breadcrumb = Some(a.name.clone());
                }
                current = &a.inner;
            }
            _ => break,
        }
    }
    NormalizedType {
        ty: current.clone(),
        markers,
        conf,
        alias_breadcrumb,
    }
}

impl NormalizedType {
    /// Normalize a child type, letting it inherit this node's markers.
    #[must_use]
    pub fn normalize_child(&self, child: &TypeExpr) -> NormalizedType {
        normalize(child, self.markers)
    }

    /// A clone that will not pass `marker` on to its children; used when a
    /// container consumes a marker that must not apply to its element type.
    #[must_use]
    pub fn without_marker(&self, marker: Marker) -> NormalizedType {
        NormalizedType {
            markers: self.markers.without(marker),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn has(&self, marker: Marker) -> bool {
        self.markers.contains(marker)
    }
}
