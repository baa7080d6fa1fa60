use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use serde::Serialize;

use crate::codec::BinaryReader;
use crate::error::{Error, Result};
use super::{live_slots, Prefab, PrefabCurve, PrefabNode};

/// The only `.ppd` layout this decoder understands
pub const SUPPORTED_VERSION: i32 = 21;

/// Size of one navigation curve record
pub const CURVE_STRIDE: usize = 128;

/// Size of one node record
pub const NODE_STRIDE: usize = 104;

/// Where a node's output curve slots live.
///
/// Shipped data has only ever been read with both slot groups taken from the
/// same 16 bytes at record offset 40, so `Shared` is the default. `Distinct`
/// reads the output group from the following 16 bytes (offset 56).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeSlotLayout {
    #[default]
    Shared,
    Distinct,
}

impl NodeSlotLayout {
    fn output_offset(self) -> i64 {
        match self {
            Self::Shared => 40,
            Self::Distinct => 56,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub node_slots: NodeSlotLayout,
}

/// Fixed 15 x i32 header at the start of every `.ppd`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrefabHeader {
    pub version: i32,
    pub node_count: i32,
    pub nav_curve_count: i32,
    pub terrain_point_count: i32,
    pub sign_count: i32,
    pub spawn_point_count: i32,
    pub semaphore_count: i32,
    pub map_point_count: i32,
    pub trigger_point_count: i32,
    pub intersection_count: i32,
    pub unknown: i32,
    pub node_offset: i32,
    pub nav_curve_offset: i32,
    pub offset_13: i32,
    pub offset_14: i32,
}

impl PrefabHeader {
    pub const SIZE: usize = 15 * 4;

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        reader.seek(0)?;
        let [
            version,
            node_count,
            nav_curve_count,
            terrain_point_count,
            sign_count,
            spawn_point_count,
            semaphore_count,
            map_point_count,
            trigger_point_count,
            intersection_count,
            unknown,
            node_offset,
            nav_curve_offset,
            offset_13,
            offset_14,
        ] = reader.read_i32_array::<15>()?;

        Ok(Self {
            version,
            node_count,
            nav_curve_count,
            terrain_point_count,
            sign_count,
            spawn_point_count,
            semaphore_count,
            map_point_count,
            trigger_point_count,
            intersection_count,
            unknown,
            node_offset,
            nav_curve_offset,
            offset_13,
            offset_14,
        })
    }
}

fn count(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::InvalidPrefab(format!("negative {what} count {value}")))
}

/// Check every live slot against the curve arena
fn resolve(slots: &[i32], curve_count: usize, owner: &str) -> Result<Vec<usize>> {
    slots
        .iter()
        .map(|&slot| {
            usize::try_from(slot)
                .ok()
                .filter(|&i| i < curve_count)
                .ok_or_else(|| {
                    Error::InvalidPrefab(format!("{owner} references curve {slot} of {curve_count}"))
                })
        })
        .collect()
}

/// Geometry of one curve plus its still-unchecked links
struct RawCurve {
    curve: PrefabCurve,
    next: Vec<i32>,
    prev: Vec<i32>,
}

fn read_curve(reader: &mut BinaryReader, index: usize, base: i64) -> Result<RawCurve> {
    let off = base + (index * CURVE_STRIDE) as i64;

    reader.seek(off + 16)?;
    let start = reader.read_vector3()?;
    let end = reader.read_vector3()?;
    let start_rotation = reader.read_vector3()?;
    let end_rotation = reader.read_vector3()?;

    reader.seek(off + 72)?;
    let length = reader.read_f32_le()?;
    let next = reader.read_i32_array::<4>()?;
    let prev = reader.read_i32_array::<4>()?;

    Ok(RawCurve {
        curve: PrefabCurve {
            index,
            start,
            end,
            start_rotation,
            end_rotation,
            start_yaw: start_rotation.heading(),
            end_yaw: end_rotation.heading(),
            length,
            next_indices: Vec::new(),
            prev_indices: Vec::new(),
        },
        next: live_slots(&next),
        prev: live_slots(&prev),
    })
}

fn read_node(
    reader: &mut BinaryReader,
    node_id: usize,
    base: i64,
    curve_count: usize,
    layout: NodeSlotLayout,
) -> Result<PrefabNode> {
    let off = base + (node_id * NODE_STRIDE) as i64;

    reader.seek(off + 16)?;
    let coord = reader.read_vector3()?;
    let rotation = reader.read_vector3()?;
    let input = reader.read_i32_array::<4>()?;

    reader.seek(off + layout.output_offset())?;
    let output = reader.read_i32_array::<4>()?;

    let owner = format!("node {node_id}");
    Ok(PrefabNode {
        node_id,
        coord,
        rotation,
        yaw: std::f64::consts::PI - rotation.heading(),
        input_curves: resolve(&live_slots(&input), curve_count, &owner)?,
        output_curves: resolve(&live_slots(&output), curve_count, &owner)?,
    })
}

impl Prefab {
    /// Decode a whole `.ppd` image. Nothing is returned unless every record
    /// decodes and every curve link points inside this prefab.
    pub fn decode(filename: impl Into<PathBuf>, data: &[u8], options: DecodeOptions) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let header = PrefabHeader::read(&mut reader)?;

        if header.version != SUPPORTED_VERSION {
            return Err(Error::UnsupportedVersion {
                found: header.version,
                expected: SUPPORTED_VERSION,
            });
        }

        let curve_count = count(header.nav_curve_count, "curve")?;
        let node_count = count(header.node_count, "node")?;

        let raw: Vec<RawCurve> = (0..curve_count)
            .map(|i| read_curve(&mut reader, i, header.nav_curve_offset as i64))
            .collect::<Result<_>>()?;

        let curves = raw
            .into_iter()
            .map(|RawCurve { mut curve, next, prev }| {
                let owner = format!("curve {}", curve.index);
                curve.next_indices = resolve(&next, curve_count, &owner)?;
                curve.prev_indices = resolve(&prev, curve_count, &owner)?;
                Ok(curve)
            })
            .collect::<Result<Vec<_>>>()?;

        let nodes = (0..node_count)
            .map(|j| read_node(&mut reader, j, header.node_offset as i64, curve_count, options.node_slots))
            .collect::<Result<Vec<_>>>()?;

        Ok(Prefab::new(filename.into(), header, curves, nodes))
    }

    /// Map a `.ppd` file read-only and decode it. Errors carry the path.
    pub fn open(path: &Path, options: DecodeOptions) -> Result<Self> {
        let load = || -> Result<Self> {
            let file = File::open(path)?;
            // SAFETY: mapped read-only; game data files are not modified while loading
            let map = unsafe { Mmap::map(&file)? };
            Self::decode(path, &map, options)
        };

        let prefab = load().map_err(|e| e.in_file(path))?;
        tracing::debug!(
            file = %path.display(),
            curves = prefab.curves().len(),
            nodes = prefab.nodes().len(),
            "decoded prefab"
        );
        Ok(prefab)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;
    use crate::codec::Vector3;
    use crate::error::ErrorKind;
    use crate::prefab::fixture::{self, CurveSpec, NodeSpec};

    fn decode(data: &[u8]) -> Result<Prefab> {
        Prefab::decode("test.ppd", data, DecodeOptions::default())
    }

    #[test]
    fn test_decode_linked_curves() {
        let mut c0 = CurveSpec::linked([1, -1, -1, -1], [-1; 4]);
        c0.start = Vector3::new(1.0, 2.0, 3.0);
        c0.length = 12.5;
        let c1 = CurveSpec::linked([-1; 4], [-1, 0, -1, -1]);

        let prefab = decode(&fixture::image(SUPPORTED_VERSION, &[c0, c1], &[])).unwrap();
        assert_eq!(prefab.curves().len(), 2);

        let first = &prefab.curves()[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.start, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(first.end, Vector3::new(10.0, 0.0, 0.0));
        assert_eq!(first.length, 12.5);
        assert_eq!(first.next_indices, vec![1]);
        assert!(first.prev_indices.is_empty());

        let next: Vec<_> = prefab.next_curves(first).map(|c| c.index).collect();
        assert_eq!(next, vec![1]);

        let second = &prefab.curves()[1];
        let prev: Vec<_> = prefab.prev_curves(second).map(|c| c.index).collect();
        assert_eq!(prev, vec![0]);
    }

    #[test]
    fn test_sentinel_slots_dropped_in_order() {
        let curves = vec![
            CurveSpec::linked([2, -1, 0, -1], [-1, 1, -1, 2]),
            CurveSpec::linked([-1; 4], [-1; 4]),
            CurveSpec::linked([-1; 4], [-1; 4]),
        ];
        let prefab = decode(&fixture::image(SUPPORTED_VERSION, &curves, &[])).unwrap();

        assert_eq!(prefab.curves()[0].next_indices, vec![2, 0]);
        assert_eq!(prefab.curves()[0].prev_indices, vec![1, 2]);
    }

    #[test]
    fn test_resolved_references_stay_in_arena() {
        let curves = vec![
            CurveSpec::linked([1, 2, 3, -1], [3, -1, -1, -1]),
            CurveSpec::linked([0, -1, -1, -1], [2, 3, -1, -1]),
            CurveSpec::linked([-1; 4], [0, 1, 2, 3]),
            CurveSpec::linked([3, 3, -1, 0], [-1; 4]),
        ];
        let nodes = vec![NodeSpec::slots([0, 1, -1, 3], [-1; 4])];
        let prefab = decode(&fixture::image(SUPPORTED_VERSION, &curves, &nodes)).unwrap();
        let count = prefab.curves().len();

        for curve in prefab.curves() {
            assert!(prefab.next_curves(curve).all(|c| c.index < count));
            assert!(prefab.prev_curves(curve).all(|c| c.index < count));
        }
        for node in prefab.nodes() {
            assert!(prefab.input_curves(node).all(|c| c.index < count));
            assert!(prefab.output_curves(node).all(|c| c.index < count));
        }
    }

    #[test]
    fn test_yaw_derivation() {
        let mut curve = CurveSpec::linked([-1; 4], [-1; 4]);
        curve.start_rotation = Vector3::new(0.0, 5.0, 1.0);
        curve.end_rotation = Vector3::new(-1.0, 0.0, 0.0);
        let mut node = NodeSpec::slots([0, -1, -1, -1], [-1; 4]);
        node.rotation = Vector3::new(0.0, 0.0, 1.0);
        node.coord = Vector3::new(4.0, 5.0, 6.0);

        let prefab = decode(&fixture::image(SUPPORTED_VERSION, &[curve], &[node])).unwrap();
        let curve = &prefab.curves()[0];
        assert!((curve.start_yaw - FRAC_PI_2).abs() < 1e-9);
        assert!((curve.end_yaw - PI).abs() < 1e-9);

        let node = &prefab.nodes()[0];
        assert_eq!(node.coord, Vector3::new(4.0, 5.0, 6.0));
        assert!((node.yaw - (PI - FRAC_PI_2)).abs() < 1e-9);
    }

    #[test]
    fn test_node_slots_shared_by_default() {
        let curves = vec![CurveSpec::linked([-1; 4], [-1; 4]), CurveSpec::linked([-1; 4], [-1; 4])];
        let nodes = vec![NodeSpec::slots([0, -1, -1, -1], [-1, 1, -1, -1])];
        let data = fixture::image(SUPPORTED_VERSION, &curves, &nodes);

        let shared = decode(&data).unwrap();
        assert_eq!(shared.nodes()[0].input_curves, vec![0]);
        assert_eq!(shared.nodes()[0].output_curves, vec![0]);

        let options = DecodeOptions { node_slots: NodeSlotLayout::Distinct };
        let distinct = Prefab::decode("test.ppd", &data, options).unwrap();
        assert_eq!(distinct.nodes()[0].input_curves, vec![0]);
        assert_eq!(distinct.nodes()[0].output_curves, vec![1]);
        let outputs: Vec<_> = distinct.output_curves(&distinct.nodes()[0]).map(|c| c.index).collect();
        assert_eq!(outputs, vec![1]);
    }

    #[test]
    fn test_wrong_version_rejected() {
        let data = fixture::image(22, &[CurveSpec::linked([-1; 4], [-1; 4])], &[]);
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { found: 22, expected: 21 }));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_truncated_header() {
        let data = fixture::minimal();
        let err = decode(&data[..PrefabHeader::SIZE - 1]).unwrap_err();
        assert!(matches!(err, Error::BufferOverflow { need: 60, have: 59 }));
    }

    #[test]
    fn test_truncated_curve_section() {
        let data = fixture::minimal();
        // Links end at record offset 108; the record padding is never read
        let needed = fixture::CURVE_BASE + 108;
        assert!(decode(&data[..needed]).is_ok());

        let err = decode(&data[..needed - 1]).unwrap_err();
        assert!(matches!(err, Error::BufferOverflow { .. }));
    }

    #[test]
    fn test_dangling_curve_link_rejected() {
        let curves = vec![CurveSpec::linked([1, 5, -1, -1], [-1; 4]), CurveSpec::linked([-1; 4], [-1; 4])];
        let err = decode(&fixture::image(SUPPORTED_VERSION, &curves, &[])).unwrap_err();
        assert!(matches!(err, Error::InvalidPrefab(ref msg) if msg.contains("curve 5 of 2")));

        let curves = vec![CurveSpec::linked([-2, -1, -1, -1], [-1; 4])];
        assert!(decode(&fixture::image(SUPPORTED_VERSION, &curves, &[])).is_err());
    }

    #[test]
    fn test_dangling_node_link_rejected() {
        let curves = vec![CurveSpec::linked([-1; 4], [-1; 4])];
        let nodes = vec![NodeSpec::slots([0, 1, -1, -1], [-1; 4])];
        let err = decode(&fixture::image(SUPPORTED_VERSION, &curves, &nodes)).unwrap_err();
        assert!(matches!(err, Error::InvalidPrefab(ref msg) if msg.starts_with("node 0")));
    }

    #[test]
    fn test_negative_count_rejected() {
        let mut data = fixture::minimal();
        data[8..12].copy_from_slice(&(-3i32).to_le_bytes());
        assert!(matches!(decode(&data), Err(Error::InvalidPrefab(_))));
    }

    #[test]
    fn test_header_fields_retained() {
        let mut data = fixture::minimal();
        data[16..20].copy_from_slice(&9i32.to_le_bytes());
        let prefab = decode(&data).unwrap();

        assert_eq!(prefab.header.version, 21);
        assert_eq!(prefab.header.nav_curve_count, 1);
        assert_eq!(prefab.header.sign_count, 9);
        assert_eq!(prefab.header.nav_curve_offset as usize, fixture::CURVE_BASE);
    }

    #[test]
    fn test_open_reports_filename() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.ppd");
        std::fs::write(&good, fixture::minimal()).unwrap();
        let prefab = Prefab::open(&good, DecodeOptions::default()).unwrap();
        assert_eq!(prefab.filename, good);

        let bad = dir.path().join("bad.ppd");
        std::fs::write(&bad, fixture::image(20, &[], &[])).unwrap();
        let err = Prefab::open(&bad, DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InFile { ref path, .. } if *path == bad));
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
