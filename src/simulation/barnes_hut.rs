//! # Barnes–Hut Octree
//!
//! Approximates gravitational acceleration by treating distant groups of
//! bodies as a single pseudo-body at their center of mass.
//!
//! - Space is recursively subdivided into 8 octants.
//! - Leaf nodes normally hold one body; at the depth limit a leaf may hold
//!   several (coincident bodies would otherwise subdivide forever).
//! - Each node stores total mass, center of mass and its bounding box.
//!
//! The root cell is either the tight cube around all bodies or a fixed cube
//! centred on the origin (the configured tree box).

use crate::simulation::states::{NVec3, System};

/// Leaves at this depth stop subdividing
const MAX_DEPTH: usize = 48;

/// A single octree node.
pub struct BarnesHutNode {
    pub mass: f64,
    pub com: NVec3,
    pub bbox_min: NVec3,
    pub bbox_max: NVec3,
    pub children: [Option<usize>; 8], // indices into BarnesHutTree::nodes
    pub bodies: Vec<usize>, // body indices held by this leaf
}

impl BarnesHutNode {
    fn empty(bbox_min: NVec3, bbox_max: NVec3) -> Self {
        Self {
            mass: 0.0,
            com: NVec3::zeros(),
            bbox_min,
            bbox_max,
            children: [None; 8],
            bodies: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.iter().all(|c| c.is_none())
    }

    fn contains(&self, p: &NVec3) -> bool {
        (0..3).all(|axis| p[axis] >= self.bbox_min[axis] && p[axis] <= self.bbox_max[axis])
    }
}

/// A complete octree built over a system.
pub struct BarnesHutTree {
    pub nodes: Vec<BarnesHutNode>,
    pub root: usize,
}

impl BarnesHutTree {
    /// Build the octree from the current state of the system.
    ///
    /// `box_size` fixes the root cube to `[-box/2, box/2]^3`; otherwise the
    /// tight cube around all bodies is used.
    pub fn build(sys: &System, box_size: Option<f64>) -> Self {
        let (bbox_min, bbox_max) = match box_size {
            Some(size) => {
                let half = NVec3::repeat(0.5 * size);
                (-half, half)
            }
            None => compute_global_bbox(sys),
        };

        let mut tree = BarnesHutTree {
            nodes: vec![BarnesHutNode::empty(bbox_min, bbox_max)],
            root: 0,
        };

        for i in 0..sys.bodies.len() {
            tree.insert_body(tree.root, i, sys, 0);
        }

        tree.compute_mass_and_com(sys, tree.root);
        tree
    }

    /// Net acceleration on body `i` from all other bodies, using the
    /// opening criterion `size / distance < theta`.
    pub fn force_on_body(&self, i: usize, sys: &System, g: f64, eps2: f64, theta: f64) -> NVec3 {
        let pos_i = sys.bodies[i].x;
        let mut acc = NVec3::zeros();
        self.traverse_node(self.root, i, pos_i, sys, g, eps2, theta, &mut acc);
        acc
    }

    // helpers ==============================================================================

    /// Insert a body below `node_idx`, subdividing occupied leaves.
    fn insert_body(&mut self, node_idx: usize, body_idx: usize, sys: &System, depth: usize) {
        let bbox_min = self.nodes[node_idx].bbox_min;
        let bbox_max = self.nodes[node_idx].bbox_max;

        if self.nodes[node_idx].is_leaf() {
            // empty leaf, or depth limit reached: store here
            if self.nodes[node_idx].bodies.is_empty() || depth >= MAX_DEPTH {
                self.nodes[node_idx].bodies.push(body_idx);
                return;
            }

            // occupied leaf: push the existing bodies one level down
            let existing = std::mem::take(&mut self.nodes[node_idx].bodies);
            self.subdivide(node_idx, bbox_min, bbox_max);
            for b in existing {
                self.insert_body(node_idx, b, sys, depth);
            }
        }

        let pos = sys.bodies[body_idx].x;
        let child_idx = child_index_for_point(&pos, &bbox_min, &bbox_max);
        let child_node_idx = match self.nodes[node_idx].children[child_idx] {
            Some(idx) => idx,
            None => {
                let (cmin, cmax) = child_bbox(&bbox_min, &bbox_max, child_idx);
                let new_idx = self.nodes.len();
                self.nodes.push(BarnesHutNode::empty(cmin, cmax));
                self.nodes[node_idx].children[child_idx] = Some(new_idx);
                new_idx
            }
        };

        self.insert_body(child_node_idx, body_idx, sys, depth + 1);
    }

    /// Split a node into 8 child octants covering its bounding box.
    fn subdivide(&mut self, node_idx: usize, bbox_min: NVec3, bbox_max: NVec3) {
        for child_idx in 0..8 {
            let (cmin, cmax) = child_bbox(&bbox_min, &bbox_max, child_idx);
            let new_node_idx = self.nodes.len();
            self.nodes.push(BarnesHutNode::empty(cmin, cmax));
            self.nodes[node_idx].children[child_idx] = Some(new_node_idx);
        }
    }

    /// Bottom-up pass filling `mass` and `com` of every node in the subtree.
    fn compute_mass_and_com(&mut self, sys: &System, node_idx: usize) {
        let mut mass = 0.0;
        let mut com = NVec3::zeros();

        let children = self.nodes[node_idx].children;

        for &bidx in &self.nodes[node_idx].bodies {
            let b = &sys.bodies[bidx];
            mass += b.m;
            com += b.x * b.m;
        }

        for child_idx in children.iter().flatten().copied() {
            self.compute_mass_and_com(sys, child_idx);
            let cn = &self.nodes[child_idx];
            if cn.mass > 0.0 {
                mass += cn.mass;
                com += cn.com * cn.mass;
            }
        }

        if mass > 0.0 {
            com /= mass;
        }

        let node = &mut self.nodes[node_idx];
        node.mass = mass;
        node.com = com;
    }

    /// Accumulate the acceleration on `body_idx` from the subtree at `node_idx`.
    /// Leaves interact exactly; internal nodes not containing the body are
    /// approximated when `size / distance < theta`, otherwise their children
    /// are visited.
    #[allow(clippy::too_many_arguments)]
    fn traverse_node(
        &self,
        node_idx: usize,
        body_idx: usize,
        pos_i: NVec3,
        sys: &System,
        g: f64,
        eps2: f64,
        theta: f64,
        acc: &mut NVec3,
    ) {
        let node = &self.nodes[node_idx];

        if node.mass == 0.0 {
            return;
        }

        if node.is_leaf() {
            for &bidx in &node.bodies {
                if bidx == body_idx {
                    continue; // no self-interaction
                }
                let b = &sys.bodies[bidx];
                *acc += point_mass_accel(b.x - pos_i, b.m, g, eps2);
            }
            return;
        }

        let size_vec = node.bbox_max - node.bbox_min;
        let size = size_vec.x.max(size_vec.y).max(size_vec.z);

        let r = node.com - pos_i;
        let dist = r.norm();

        if dist > 0.0 && size / dist < theta && !node.contains(&pos_i) {
            *acc += point_mass_accel(r, node.mass, g, eps2);
        } else {
            for child_idx in node.children.iter().flatten().copied() {
                self.traverse_node(child_idx, body_idx, pos_i, sys, g, eps2, theta, acc);
            }
        }
    }
}

// helpers ===========================================================================

/// Softened acceleration towards a point mass at separation `r`
fn point_mass_accel(r: NVec3, m: f64, g: f64, eps2: f64) -> NVec3 {
    let dist2 = r.dot(&r) + eps2;
    if dist2 == 0.0 {
        return NVec3::zeros();
    }
    let inv_r = dist2.sqrt().recip();
    g * m * inv_r * inv_r * inv_r * r
}

/// Cubic bounding box enclosing all bodies.
fn compute_global_bbox(sys: &System) -> (NVec3, NVec3) {
    if sys.bodies.is_empty() {
        return (NVec3::zeros(), NVec3::zeros());
    }

    let mut min = NVec3::repeat(f64::INFINITY);
    let mut max = NVec3::repeat(f64::NEG_INFINITY);

    for b in &sys.bodies {
        min = min.inf(&b.x);
        max = max.sup(&b.x);
    }

    // Expand to a cube so size is well-defined
    let center = (min + max) * 0.5;
    let half = (max - min) * 0.5;
    let max_half = half.x.max(half.y).max(half.z);
    let half = NVec3::repeat(max_half);

    (center - half, center + half)
}

/// Octant index of `p`: bit 0 for x, bit 1 for y, bit 2 for z
/// (set when the coordinate is at or above the cell center).
fn child_index_for_point(p: &NVec3, bbox_min: &NVec3, bbox_max: &NVec3) -> usize {
    let center = (bbox_min + bbox_max) * 0.5;
    let mut idx = 0;

    if p.x >= center.x { idx |= 1; }
    if p.y >= center.y { idx |= 2; }
    if p.z >= center.z { idx |= 4; }

    idx
}

/// Bounding box of child octant `child_idx`, same bit layout as
/// [`child_index_for_point`].
fn child_bbox(parent_min: &NVec3, parent_max: &NVec3, child_idx: usize) -> (NVec3, NVec3) {
    let center = (parent_min + parent_max) * 0.5;

    let mut min = *parent_min;
    let mut max = *parent_max;

    for axis in 0..3 {
        if (child_idx >> axis) & 1 == 0 {
            max[axis] = center[axis];
        } else {
            min[axis] = center[axis];
        }
    }

    (min, max)
}
