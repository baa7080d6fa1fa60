//! Prefab geometry (`*.ppd`)
//!
//! A prefab is a road/intersection template made of navigation curves (lane
//! segments) and nodes (where the prefab connects to the road network).
//! Curves and nodes refer to each other by position in the prefab's own curve
//! list, so the prefab owns both lists and hands out references by index.

mod decode;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::codec::Vector3;

pub use decode::{DecodeOptions, NodeSlotLayout, PrefabHeader, CURVE_STRIDE, NODE_STRIDE, SUPPORTED_VERSION};

/// Slot value meaning "no curve here"
pub const ABSENT_SLOT: i32 = -1;

/// Drop absent entries from a slot group, keeping the order of the rest
pub fn live_slots(slots: &[i32]) -> Vec<i32> {
    slots.iter().copied().filter(|&slot| slot != ABSENT_SLOT).collect()
}

/// Directed lane segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefabCurve {
    /// Position in the owning prefab's curve list
    pub index: usize,
    pub start: Vector3,
    pub end: Vector3,
    pub start_rotation: Vector3,
    pub end_rotation: Vector3,
    pub start_yaw: f64,
    pub end_yaw: f64,
    pub length: f32,
    pub next_indices: Vec<usize>,
    pub prev_indices: Vec<usize>,
}

/// Connection point of a prefab
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefabNode {
    pub node_id: usize,
    pub coord: Vector3,
    pub rotation: Vector3,
    pub yaw: f64,
    pub input_curves: Vec<usize>,
    pub output_curves: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Prefab {
    pub filename: PathBuf,
    pub header: PrefabHeader,
    curves: Vec<PrefabCurve>,
    nodes: Vec<PrefabNode>,
    numeric_id: u64,
    string_id: String,
    /// Index into the owning mapper's company list
    company: Option<usize>,
}

impl Prefab {
    pub(crate) fn new(
        filename: PathBuf,
        header: PrefabHeader,
        curves: Vec<PrefabCurve>,
        nodes: Vec<PrefabNode>,
    ) -> Self {
        Self {
            filename,
            header,
            curves,
            nodes,
            numeric_id: 0,
            string_id: String::new(),
            company: None,
        }
    }

    pub fn curves(&self) -> &[PrefabCurve] {
        &self.curves
    }

    pub fn nodes(&self) -> &[PrefabNode] {
        &self.nodes
    }

    /// Curves a vehicle may continue onto from `curve`
    pub fn next_curves<'a>(&'a self, curve: &'a PrefabCurve) -> impl Iterator<Item = &'a PrefabCurve> + 'a {
        curve.next_indices.iter().map(move |&i| &self.curves[i])
    }

    pub fn prev_curves<'a>(&'a self, curve: &'a PrefabCurve) -> impl Iterator<Item = &'a PrefabCurve> + 'a {
        curve.prev_indices.iter().map(move |&i| &self.curves[i])
    }

    pub fn input_curves<'a>(&'a self, node: &'a PrefabNode) -> impl Iterator<Item = &'a PrefabCurve> + 'a {
        node.input_curves.iter().map(move |&i| &self.curves[i])
    }

    pub fn output_curves<'a>(&'a self, node: &'a PrefabNode) -> impl Iterator<Item = &'a PrefabCurve> + 'a {
        node.output_curves.iter().map(move |&i| &self.curves[i])
    }

    /// Numeric id from the lookup tables, 0 while unresolved
    pub fn numeric_id(&self) -> u64 {
        self.numeric_id
    }

    /// Definition name from `prefab.sii`, empty while unresolved
    pub fn string_id(&self) -> &str {
        &self.string_id
    }

    pub fn is_resolved(&self) -> bool {
        !self.string_id.is_empty()
    }

    pub fn company(&self) -> Option<usize> {
        self.company
    }

    /// File name without directory and extension
    pub fn stem(&self) -> Option<&OsStr> {
        self.filename.file_stem()
    }

    /// Whether `path` names this prefab's file, ignoring directory and
    /// extension. The comparison is exact (case-sensitive).
    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        self.stem() == path.as_ref().file_stem()
    }

    /// Returns false if ids were already assigned.
    pub(crate) fn assign_ids(&mut self, numeric_id: u64, string_id: &str) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.numeric_id = numeric_id;
        self.string_id = string_id.to_string();
        true
    }

    /// Returns false if a company was already linked.
    pub(crate) fn link_company(&mut self, company: usize) -> bool {
        if self.company.is_some() {
            return false;
        }
        self.company = Some(company);
        true
    }
}

/// Synthetic `.ppd` images for tests
#[cfg(test)]
pub(crate) mod fixture {
    use super::*;

    pub const HEADER_LEN: usize = 60;
    /// Where the curve section starts in generated images
    pub const CURVE_BASE: usize = 64;

    #[derive(Debug, Clone)]
    pub struct CurveSpec {
        pub start: Vector3,
        pub end: Vector3,
        pub start_rotation: Vector3,
        pub end_rotation: Vector3,
        pub length: f32,
        pub next: [i32; 4],
        pub prev: [i32; 4],
    }

    impl CurveSpec {
        pub fn linked(next: [i32; 4], prev: [i32; 4]) -> Self {
            Self {
                start: Vector3::new(0.0, 0.0, 0.0),
                end: Vector3::new(10.0, 0.0, 0.0),
                start_rotation: Vector3::new(1.0, 0.0, 0.0),
                end_rotation: Vector3::new(1.0, 0.0, 0.0),
                length: 10.0,
                next,
                prev,
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct NodeSpec {
        pub coord: Vector3,
        pub rotation: Vector3,
        pub input: [i32; 4],
        /// Written after the input group, only visible with `NodeSlotLayout::Distinct`
        pub output: [i32; 4],
    }

    impl NodeSpec {
        pub fn slots(input: [i32; 4], output: [i32; 4]) -> Self {
            Self {
                coord: Vector3::new(0.0, 0.0, 0.0),
                rotation: Vector3::new(1.0, 0.0, 0.0),
                input,
                output,
            }
        }
    }

    fn put(data: &mut [u8], at: usize, bytes: &[u8]) {
        data[at..at + bytes.len()].copy_from_slice(bytes);
    }

    fn put_vec(data: &mut [u8], at: usize, v: Vector3) {
        put(data, at, &v.x.to_le_bytes());
        put(data, at + 4, &v.y.to_le_bytes());
        put(data, at + 8, &v.z.to_le_bytes());
    }

    fn put_slots(data: &mut [u8], at: usize, slots: [i32; 4]) {
        for (k, slot) in slots.iter().enumerate() {
            put(data, at + k * 4, &slot.to_le_bytes());
        }
    }

    pub fn image(version: i32, curves: &[CurveSpec], nodes: &[NodeSpec]) -> Vec<u8> {
        let node_base = CURVE_BASE + curves.len() * CURVE_STRIDE;
        let mut data = vec![0u8; node_base + nodes.len() * NODE_STRIDE];

        let mut header = [0i32; 15];
        header[0] = version;
        header[1] = nodes.len() as i32;
        header[2] = curves.len() as i32;
        header[11] = node_base as i32;
        header[12] = CURVE_BASE as i32;
        for (k, field) in header.iter().enumerate() {
            put(&mut data, k * 4, &field.to_le_bytes());
        }

        for (i, c) in curves.iter().enumerate() {
            let off = CURVE_BASE + i * CURVE_STRIDE;
            put_vec(&mut data, off + 16, c.start);
            put_vec(&mut data, off + 28, c.end);
            put_vec(&mut data, off + 40, c.start_rotation);
            put_vec(&mut data, off + 52, c.end_rotation);
            put(&mut data, off + 72, &c.length.to_le_bytes());
            put_slots(&mut data, off + 76, c.next);
            put_slots(&mut data, off + 92, c.prev);
        }

        for (j, n) in nodes.iter().enumerate() {
            let off = node_base + j * NODE_STRIDE;
            put_vec(&mut data, off + 16, n.coord);
            put_vec(&mut data, off + 28, n.rotation);
            put_slots(&mut data, off + 40, n.input);
            put_slots(&mut data, off + 56, n.output);
        }

        data
    }

    /// Prefab with one self-contained curve and no nodes
    pub fn minimal() -> Vec<u8> {
        image(SUPPORTED_VERSION, &[CurveSpec::linked([-1; 4], [-1; 4])], &[])
    }
}
