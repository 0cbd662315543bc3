//! Contour forest and nested-contour pruning.
//!
//! Edge detection reports each contour together with its position in
//! an enclosure forest: the contour immediately enclosing it (parent),
//! the first contour it encloses (first child), and the next contour at
//! the same depth (next sibling). The forest is stored as a flat arena
//! indexed by contour number, mirroring the hierarchy table that
//! contour extraction produces.
//!
//! Pruning keeps long contours and drops the contours directly nested
//! inside a kept one, which on thin edges are almost always the inner
//! half of a double response rather than separate strokes.

use serde::{Deserialize, Serialize};

use crate::types::{Polyline, SynthesisError};

/// Hierarchy links of one contour. `None` means "no such contour".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Next contour at the same enclosure depth.
    pub next_sibling: Option<usize>,
    /// Previous contour at the same enclosure depth.
    pub prev_sibling: Option<usize>,
    /// First contour directly enclosed by this one.
    pub first_child: Option<usize>,
    /// Contour directly enclosing this one.
    pub parent: Option<usize>,
}

impl HierarchyNode {
    fn links(&self) -> [(&'static str, Option<usize>); 4] {
        [
            ("next sibling", self.next_sibling),
            ("previous sibling", self.prev_sibling),
            ("first child", self.first_child),
            ("parent", self.parent),
        ]
    }
}

/// Parent / first-child / next-sibling relation over a contour set,
/// addressed by contour index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContourForest {
    nodes: Vec<HierarchyNode>,
}

impl ContourForest {
    /// Wrap hierarchy nodes as given. References are checked by
    /// [`validate`](Self::validate), not here.
    #[must_use]
    pub const fn new(nodes: Vec<HierarchyNode>) -> Self {
        Self { nodes }
    }

    /// A forest of `len` unrelated root contours.
    #[must_use]
    pub fn flat(len: usize) -> Self {
        let nodes = (0..len)
            .map(|i| HierarchyNode {
                next_sibling: (i + 1 < len).then_some(i + 1),
                prev_sibling: i.checked_sub(1),
                first_child: None,
                parent: None,
            })
            .collect();
        Self { nodes }
    }

    /// Build a forest from OpenCV-style hierarchy rows
    /// `[next, previous, first_child, parent]`, where `-1` means none.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::MalformedForest`] for any other negative
    /// value, or a reference past the end of `rows`.
    pub fn from_opencv(rows: &[[i32; 4]]) -> Result<Self, SynthesisError> {
        let link = |row: usize, value: i32| -> Result<Option<usize>, SynthesisError> {
            match value {
                -1 => Ok(None),
                v => usize::try_from(v).map(Some).map_err(|_| {
                    SynthesisError::MalformedForest(format!(
                        "contour {row} has hierarchy value {v}"
                    ))
                }),
            }
        };

        let nodes = rows
            .iter()
            .enumerate()
            .map(|(i, &[next, prev, child, parent])| {
                Ok(HierarchyNode {
                    next_sibling: link(i, next)?,
                    prev_sibling: link(i, prev)?,
                    first_child: link(i, child)?,
                    parent: link(i, parent)?,
                })
            })
            .collect::<Result<Vec<_>, SynthesisError>>()?;

        let forest = Self { nodes };
        forest.validate(rows.len())?;
        Ok(forest)
    }

    /// Build a forest from each contour's parent, deriving first-child
    /// and sibling links. Siblings are chained in index order, which is
    /// the order contours were detected in.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::MalformedForest`] if a parent index is
    /// out of range or a contour is its own parent.
    pub fn from_parents(parents: &[Option<usize>]) -> Result<Self, SynthesisError> {
        let len = parents.len();
        let mut nodes = vec![HierarchyNode::default(); len];
        // Last contour seen under each parent; the extra slot is the root level.
        let mut last_under: Vec<Option<usize>> = vec![None; len + 1];

        for (i, &parent) in parents.iter().enumerate() {
            let slot = match parent {
                Some(p) if p >= len => {
                    return Err(SynthesisError::MalformedForest(format!(
                        "contour {i} has parent {p} but only {len} contours exist"
                    )));
                }
                Some(p) if p == i => {
                    return Err(SynthesisError::MalformedForest(format!(
                        "contour {i} is its own parent"
                    )));
                }
                Some(p) => p,
                None => len,
            };

            nodes[i].parent = parent;
            match last_under[slot] {
                Some(prev) => {
                    nodes[prev].next_sibling = Some(i);
                    nodes[i].prev_sibling = Some(prev);
                }
                None => {
                    if let Some(p) = parent {
                        nodes[p].first_child = Some(i);
                    }
                }
            }
            last_under[slot] = Some(i);
        }

        Ok(Self { nodes })
    }

    /// Number of contours in the forest.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the forest has no contours.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Hierarchy links of contour `index`, if it exists.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&HierarchyNode> {
        self.nodes.get(index)
    }

    /// Check that the forest describes exactly `contour_count` contours
    /// and every reference stays inside that range.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::MalformedForest`] on the first bad entry.
    pub fn validate(&self, contour_count: usize) -> Result<(), SynthesisError> {
        if self.nodes.len() != contour_count {
            return Err(SynthesisError::MalformedForest(format!(
                "hierarchy has {} entries for {contour_count} contours",
                self.nodes.len()
            )));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            for (name, link) in node.links() {
                if let Some(target) = link
                    && target >= contour_count
                {
                    return Err(SynthesisError::MalformedForest(format!(
                        "contour {i} has {name} {target} but only {contour_count} contours exist"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Raw edge contours in detection order plus their enclosure forest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeContours {
    /// Pixel-space contours.
    pub contours: Vec<Polyline>,
    /// Enclosure relation over `contours`, by index.
    pub forest: ContourForest,
}

impl EdgeContours {
    /// Pair contours with their forest.
    #[must_use]
    pub const fn new(contours: Vec<Polyline>, forest: ContourForest) -> Self {
        Self { contours, forest }
    }

    /// Contours with no nesting relation at all.
    #[must_use]
    pub fn unnested(contours: Vec<Polyline>) -> Self {
        let forest = ContourForest::flat(contours.len());
        Self { contours, forest }
    }
}

/// Indices of the contours to keep, in detection order.
///
/// Contours are visited in index order. A contour whose closed arc
/// length is below `min_length` is skipped. A contour already marked
/// for deletion is skipped regardless of its length. Every other
/// contour is kept, and its first child together with that child's
/// next-sibling chain is marked for deletion.
///
/// # Errors
///
/// Returns [`SynthesisError::MalformedForest`] before doing any work if
/// the forest does not match the contour set.
pub fn prune_nested(edges: &EdgeContours, min_length: f64) -> Result<Vec<usize>, SynthesisError> {
    let lengths: Vec<f64> = edges.contours.iter().map(Polyline::closed_length).collect();
    prune_by_length(&edges.forest, &lengths, min_length)
}

/// [`prune_nested`] over precomputed per-contour arc lengths.
///
/// # Errors
///
/// Returns [`SynthesisError::MalformedForest`] if `forest` and
/// `lengths` disagree on the contour count or a link is out of range.
pub fn prune_by_length(
    forest: &ContourForest,
    lengths: &[f64],
    min_length: f64,
) -> Result<Vec<usize>, SynthesisError> {
    forest.validate(lengths.len())?;

    let mut deleted = vec![false; lengths.len()];
    let mut kept = Vec::new();

    for (i, &length) in lengths.iter().enumerate() {
        if length < min_length || deleted[i] {
            continue;
        }

        let mut next = forest.nodes[i].first_child;
        while let Some(child) = next {
            if deleted[child] {
                break;
            }
            deleted[child] = true;
            next = forest.nodes[child].next_sibling;
        }

        kept.push(i);
    }

    Ok(kept)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn node(
        next_sibling: Option<usize>,
        first_child: Option<usize>,
        parent: Option<usize>,
    ) -> HierarchyNode {
        HierarchyNode {
            next_sibling,
            prev_sibling: None,
            first_child,
            parent,
        }
    }

    /// A straight two-point contour whose closed length is `length`.
    fn contour_of_length(length: f64) -> Polyline {
        Polyline::new(vec![Point::new(0.0, 0.0), Point::new(length / 2.0, 0.0)])
    }

    #[test]
    fn empty_forest_keeps_nothing() {
        let kept = prune_nested(&EdgeContours::default(), 50.0).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn kept_parent_discards_whole_child_chain() {
        // A (100) encloses B (5), whose sibling is C (200).
        let forest = ContourForest::new(vec![
            node(None, Some(1), None),
            node(Some(2), None, Some(0)),
            node(None, None, Some(0)),
        ]);
        let kept = prune_by_length(&forest, &[100.0, 5.0, 200.0], 50.0).unwrap();
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn unnested_contours_filter_by_length_in_order() {
        let edges = EdgeContours::unnested(vec![
            contour_of_length(10.0),
            contour_of_length(60.0),
            contour_of_length(200.0),
        ]);
        let kept = prune_nested(&edges, 50.0).unwrap();
        assert_eq!(kept, vec![1, 2]);
    }

    #[test]
    fn short_parent_does_not_prune_children() {
        // A (10) encloses B (80): A fails the threshold, B stands alone.
        let forest = ContourForest::new(vec![node(None, Some(1), None), node(None, None, Some(0))]);
        let kept = prune_by_length(&forest, &[10.0, 80.0], 50.0).unwrap();
        assert_eq!(kept, vec![1]);
    }

    #[test]
    fn grandchildren_remain_eligible() {
        // 0 encloses 1, which encloses 2. Only 1 is discarded.
        let forest = ContourForest::from_parents(&[None, Some(0), Some(1)]).unwrap();
        let kept = prune_by_length(&forest, &[100.0, 100.0, 100.0], 50.0).unwrap();
        assert_eq!(kept, vec![0, 2]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let forest = ContourForest::flat(2);
        let kept = prune_by_length(&forest, &[49.999, 50.0], 50.0).unwrap();
        assert_eq!(kept, vec![1]);
    }

    #[test]
    fn child_listed_before_parent_is_kept() {
        // Deletion only affects contours not yet visited.
        let forest = ContourForest::new(vec![node(None, None, Some(1)), node(None, Some(0), None)]);
        let kept = prune_by_length(&forest, &[100.0, 100.0], 50.0).unwrap();
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn sibling_cycle_terminates() {
        let forest = ContourForest::new(vec![
            node(None, Some(1), None),
            node(Some(2), None, Some(0)),
            node(Some(1), None, Some(0)),
        ]);
        let kept = prune_by_length(&forest, &[100.0, 100.0, 100.0], 50.0).unwrap();
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn out_of_range_child_is_malformed() {
        let forest = ContourForest::new(vec![node(None, Some(7), None)]);
        let result = prune_by_length(&forest, &[100.0], 50.0);
        assert!(matches!(result, Err(SynthesisError::MalformedForest(_))));
    }

    #[test]
    fn out_of_range_reference_fails_even_on_short_contours() {
        let forest = ContourForest::new(vec![node(Some(3), None, None)]);
        let result = prune_by_length(&forest, &[1.0], 50.0);
        assert!(matches!(result, Err(SynthesisError::MalformedForest(_))));
    }

    #[test]
    fn count_mismatch_is_malformed() {
        let result = prune_by_length(&ContourForest::flat(2), &[100.0], 50.0);
        assert!(matches!(result, Err(SynthesisError::MalformedForest(_))));
    }

    #[test]
    fn flat_forest_chains_siblings() {
        let forest = ContourForest::flat(3);
        assert_eq!(forest.node(0).unwrap().next_sibling, Some(1));
        assert_eq!(forest.node(1).unwrap().prev_sibling, Some(0));
        assert_eq!(forest.node(2).unwrap().next_sibling, None);
        assert!(forest.validate(3).is_ok());
    }

    #[test]
    fn from_opencv_maps_sentinels() {
        let forest = ContourForest::from_opencv(&[[2, -1, 1, -1], [-1, -1, -1, 0], [-1, 0, -1, -1]])
            .unwrap();
        assert_eq!(
            forest.node(0),
            Some(&HierarchyNode {
                next_sibling: Some(2),
                prev_sibling: None,
                first_child: Some(1),
                parent: None,
            })
        );
        assert_eq!(forest.node(1).unwrap().parent, Some(0));
    }

    #[test]
    fn from_opencv_rejects_bad_values() {
        assert!(matches!(
            ContourForest::from_opencv(&[[-2, -1, -1, -1]]),
            Err(SynthesisError::MalformedForest(_))
        ));
        assert!(matches!(
            ContourForest::from_opencv(&[[-1, -1, 4, -1]]),
            Err(SynthesisError::MalformedForest(_))
        ));
    }

    #[test]
    fn from_parents_derives_children_and_siblings() {
        // 0 and 3 are roots; 1 and 2 sit inside 0.
        let forest = ContourForest::from_parents(&[None, Some(0), Some(0), None]).unwrap();
        let root = forest.node(0).unwrap();
        assert_eq!(root.first_child, Some(1));
        assert_eq!(root.next_sibling, Some(3));
        assert_eq!(forest.node(1).unwrap().next_sibling, Some(2));
        assert_eq!(forest.node(2).unwrap().prev_sibling, Some(1));
        assert_eq!(forest.node(3).unwrap().prev_sibling, Some(0));
        assert!(forest.validate(4).is_ok());
    }

    #[test]
    fn from_parents_rejects_bad_parents() {
        assert!(matches!(
            ContourForest::from_parents(&[None, Some(5)]),
            Err(SynthesisError::MalformedForest(_))
        ));
        assert!(matches!(
            ContourForest::from_parents(&[Some(0)]),
            Err(SynthesisError::MalformedForest(_))
        ));
    }

    #[test]
    fn forest_deserializes_from_node_list() {
        let json = r#"[{"next_sibling":null,"prev_sibling":null,"first_child":1,"parent":null},
                      {"next_sibling":null,"prev_sibling":null,"first_child":null,"parent":0}]"#;
        let forest: ContourForest = serde_json::from_str(json).unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest.node(0).unwrap().first_child, Some(1));
    }
}
