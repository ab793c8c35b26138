use std::fs;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use tabletop_core::{Colors, Normals, PointCloud};

use crate::error::{IoError, Result};

const FORMAT: &str = "PLY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Ascii,
    BinaryLittleEndian,
}

/// Vertex property type as declared in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropType {
    Char,
    Uchar,
    Short,
    Ushort,
    Int,
    Uint,
    Float,
    Double,
}

impl PropType {
    fn parse(name: &str) -> Result<Self> {
        let ty = match name {
            "char" | "int8" => PropType::Char,
            "uchar" | "uint8" => PropType::Uchar,
            "short" | "int16" => PropType::Short,
            "ushort" | "uint16" => PropType::Ushort,
            "int" | "int32" => PropType::Int,
            "uint" | "uint32" => PropType::Uint,
            "float" | "float32" => PropType::Float,
            "double" | "float64" => PropType::Double,
            other => {
                return Err(IoError::malformed(
                    FORMAT,
                    format!("unsupported property type '{}'", other),
                ))
            }
        };
        Ok(ty)
    }

    fn byte_size(self) -> usize {
        match self {
            PropType::Char | PropType::Uchar => 1,
            PropType::Short | PropType::Ushort => 2,
            PropType::Int | PropType::Uint | PropType::Float => 4,
            PropType::Double => 8,
        }
    }

    fn decode(self, b: &[u8]) -> f64 {
        match self {
            PropType::Char => b[0] as i8 as f64,
            PropType::Uchar => b[0] as f64,
            PropType::Short => i16::from_le_bytes([b[0], b[1]]) as f64,
            PropType::Ushort => u16::from_le_bytes([b[0], b[1]]) as f64,
            PropType::Int => i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            PropType::Uint => u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            PropType::Float => f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            PropType::Double => {
                f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            }
        }
    }
}

struct PlyHeader {
    encoding: Encoding,
    vertex_count: usize,
    names: Vec<String>,
    types: Vec<PropType>,
    body_offset: usize,
}

impl PlyHeader {
    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn positions(&self, names: [&str; 3]) -> Option<[usize; 3]> {
        Some([
            self.position(names[0])?,
            self.position(names[1])?,
            self.position(names[2])?,
        ])
    }

    fn byte_offsets(&self) -> Vec<usize> {
        let mut offset = 0;
        self.types
            .iter()
            .map(|t| {
                let at = offset;
                offset += t.byte_size();
                at
            })
            .collect()
    }

    fn stride(&self) -> usize {
        self.types.iter().map(|t| t.byte_size()).sum()
    }
}

fn parse_header(data: &[u8]) -> Result<PlyHeader> {
    let end_marker = b"end_header";
    let marker_at = data
        .windows(end_marker.len())
        .position(|w| w == end_marker)
        .ok_or_else(|| IoError::malformed(FORMAT, "missing end_header"))?;
    let body_offset = data[marker_at..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| marker_at + p + 1)
        .unwrap_or(data.len());

    let text = std::str::from_utf8(&data[..marker_at])
        .map_err(|_| IoError::malformed(FORMAT, "header is not valid UTF-8"))?;

    let mut lines = text.lines().map(str::trim);
    if lines.next() != Some("ply") {
        return Err(IoError::malformed(FORMAT, "file does not start with 'ply'"));
    }

    let mut encoding = None;
    let mut vertex_count = 0usize;
    let mut names = Vec::new();
    let mut types = Vec::new();
    let mut in_vertex = false;
    let mut seen_other_element = false;

    for line in lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["format", "ascii", ..] => encoding = Some(Encoding::Ascii),
            ["format", "binary_little_endian", ..] => {
                encoding = Some(Encoding::BinaryLittleEndian)
            }
            ["format", other, ..] => {
                return Err(IoError::UnsupportedFormat(format!("PLY {}", other)))
            }
            ["element", "vertex", count] => {
                if seen_other_element {
                    return Err(IoError::UnsupportedFormat(
                        "PLY with elements before vertex".to_string(),
                    ));
                }
                in_vertex = true;
                vertex_count = count.parse().map_err(|e| {
                    IoError::malformed(FORMAT, format!("invalid vertex count: {}", e))
                })?;
            }
            ["element", ..] => {
                in_vertex = false;
                seen_other_element = true;
            }
            ["property", "list", ..] if in_vertex => {
                return Err(IoError::UnsupportedFormat(
                    "PLY list property on vertex element".to_string(),
                ))
            }
            ["property", ty, name] if in_vertex => {
                types.push(PropType::parse(ty)?);
                names.push(name.to_string());
            }
            _ => {}
        }
    }

    let encoding = encoding.ok_or_else(|| IoError::malformed(FORMAT, "missing format line"))?;

    Ok(PlyHeader {
        encoding,
        vertex_count,
        names,
        types,
        body_offset,
    })
}

/// Reads the vertex element of a PLY file (`ascii` or `binary_little_endian`).
///
/// `nx/ny/nz` become normals and `red/green/blue` become colours when all
/// three are present. Elements after the vertices (faces etc.) are ignored.
pub fn read_ply(path: impl AsRef<Path>) -> Result<PointCloud> {
    let data = fs::read(path)?;
    parse_ply(&data)
}

fn parse_ply(data: &[u8]) -> Result<PointCloud> {
    let header = parse_header(data)?;

    let xyz = header
        .positions(["x", "y", "z"])
        .ok_or_else(|| IoError::malformed(FORMAT, "missing x, y, z properties"))?;
    let normal_idx = header.positions(["nx", "ny", "nz"]);
    let color_idx = header.positions(["red", "green", "blue"]);

    let n = header.vertex_count;
    let mut points = Vec::new();
    let mut normals = Vec::new();
    let mut colors = Vec::new();

    let body = &data[header.body_offset..];
    match header.encoding {
        Encoding::Ascii => {
            let text = std::str::from_utf8(body)
                .map_err(|_| IoError::malformed(FORMAT, "body is not valid UTF-8"))?;
            points.reserve(n.min(text.lines().count()));
            let mut rows = text.lines().map(str::trim).filter(|l| !l.is_empty());

            for _ in 0..n {
                let line = rows
                    .next()
                    .ok_or_else(|| IoError::malformed(FORMAT, format!("expected {} vertices", n)))?;
                let values = line
                    .split_whitespace()
                    .map(|t| {
                        t.parse::<f64>().map_err(|e| {
                            IoError::malformed(FORMAT, format!("invalid number '{}': {}", t, e))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()?;
                if values.len() < header.names.len() {
                    return Err(IoError::malformed(
                        FORMAT,
                        format!(
                            "vertex line has {} values, expected {}",
                            values.len(),
                            header.names.len()
                        ),
                    ));
                }
                push_vertex(
                    &values,
                    xyz,
                    normal_idx,
                    color_idx,
                    &mut points,
                    &mut normals,
                    &mut colors,
                );
            }
        }
        Encoding::BinaryLittleEndian => {
            let stride = header.stride();
            let needed = n.checked_mul(stride).ok_or_else(|| {
                IoError::malformed(FORMAT, format!("{} vertices x {} bytes overflows", n, stride))
            })?;
            if body.len() < needed {
                return Err(IoError::malformed(
                    FORMAT,
                    format!("binary body too short: need {} bytes, got {}", needed, body.len()),
                ));
            }

            points.reserve(n);
            let offsets = header.byte_offsets();
            let mut values = vec![0.0f64; header.types.len()];
            for row in body[..needed].chunks_exact(stride.max(1)) {
                for (slot, (ty, &off)) in values.iter_mut().zip(header.types.iter().zip(&offsets)) {
                    *slot = ty.decode(&row[off..off + ty.byte_size()]);
                }
                push_vertex(
                    &values,
                    xyz,
                    normal_idx,
                    color_idx,
                    &mut points,
                    &mut normals,
                    &mut colors,
                );
            }
        }
    }

    let mut cloud = PointCloud::from_points(&points);
    if normal_idx.is_some() {
        cloud.normals = Some(Normals::from_vectors(&normals));
    }
    if color_idx.is_some() {
        cloud.colors = Some(Colors {
            r: colors.iter().map(|c| c[0]).collect(),
            g: colors.iter().map(|c| c[1]).collect(),
            b: colors.iter().map(|c| c[2]).collect(),
        });
    }
    Ok(cloud)
}

fn push_vertex(
    values: &[f64],
    xyz: [usize; 3],
    normal_idx: Option<[usize; 3]>,
    color_idx: Option<[usize; 3]>,
    points: &mut Vec<[f32; 3]>,
    normals: &mut Vec<[f32; 3]>,
    colors: &mut Vec<[u8; 3]>,
) {
    points.push(xyz.map(|i| values[i] as f32));
    if let Some(idx) = normal_idx {
        normals.push(idx.map(|i| values[i] as f32));
    }
    if let Some(idx) = color_idx {
        colors.push(idx.map(|i| values[i].clamp(0.0, 255.0) as u8));
    }
}

fn header_text(cloud: &PointCloud, encoding: &str) -> String {
    let mut out = String::new();
    out.push_str("ply\n");
    out.push_str(&format!("format {} 1.0\n", encoding));
    out.push_str(&format!("element vertex {}\n", cloud.len()));
    for axis in ["x", "y", "z"] {
        out.push_str(&format!("property float {}\n", axis));
    }
    if cloud.normals.is_some() {
        for axis in ["nx", "ny", "nz"] {
            out.push_str(&format!("property float {}\n", axis));
        }
    }
    if cloud.colors.is_some() {
        for channel in ["red", "green", "blue"] {
            out.push_str(&format!("property uchar {}\n", channel));
        }
    }
    out.push_str("end_header\n");
    out
}

/// Writes a PLY file in ASCII format.
pub fn write_ply(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    let mut out = header_text(cloud, "ascii");

    for i in 0..cloud.len() {
        out.push_str(&format!("{} {} {}", cloud.x[i], cloud.y[i], cloud.z[i]));
        if let Some(ref normals) = cloud.normals {
            out.push_str(&format!(
                " {} {} {}",
                normals.nx[i], normals.ny[i], normals.nz[i]
            ));
        }
        if let Some(ref colors) = cloud.colors {
            out.push_str(&format!(" {} {} {}", colors.r[i], colors.g[i], colors.b[i]));
        }
        out.push('\n');
    }

    fs::write(path, out)?;
    Ok(())
}

/// Writes a PLY file in `binary_little_endian` format.
pub fn write_ply_binary(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);

    w.write_all(header_text(cloud, "binary_little_endian").as_bytes())?;

    for i in 0..cloud.len() {
        w.write_all(&cloud.x[i].to_le_bytes())?;
        w.write_all(&cloud.y[i].to_le_bytes())?;
        w.write_all(&cloud.z[i].to_le_bytes())?;

        if let Some(ref normals) = cloud.normals {
            w.write_all(&normals.nx[i].to_le_bytes())?;
            w.write_all(&normals.ny[i].to_le_bytes())?;
            w.write_all(&normals.nz[i].to_le_bytes())?;
        }

        if let Some(ref colors) = cloud.colors {
            w.write_all(&colors.color(i))?;
        }
    }

    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::NamedTempFile;

    fn attributed_cloud() -> PointCloud {
        let mut cloud = PointCloud::from_xyz(vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]);
        cloud.normals = Some(Normals::from_vectors(&[[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]));
        cloud.colors = Some(Colors {
            r: vec![255, 0],
            g: vec![0, 255],
            b: vec![128, 64],
        });
        cloud
    }

    #[test]
    fn ply_roundtrip() {
        let cloud = PointCloud::from_xyz(
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        );
        let tmp = NamedTempFile::new().unwrap();
        write_ply(tmp.path(), &cloud).unwrap();
        let loaded = read_ply(tmp.path()).unwrap();
        assert_eq!(loaded, cloud);
        assert!(loaded.normals.is_none());
        assert!(loaded.colors.is_none());
    }

    #[test]
    fn ply_empty_cloud() {
        let tmp = NamedTempFile::new().unwrap();
        write_ply(tmp.path(), &PointCloud::new()).unwrap();
        assert!(read_ply(tmp.path()).unwrap().is_empty());

        write_ply_binary(tmp.path(), &PointCloud::new()).unwrap();
        assert!(read_ply(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn ply_ascii_roundtrip_with_attributes() {
        let cloud = attributed_cloud();
        let tmp = NamedTempFile::new().unwrap();
        write_ply(tmp.path(), &cloud).unwrap();
        assert_eq!(read_ply(tmp.path()).unwrap(), cloud);
    }

    #[test]
    fn ply_binary_roundtrip_with_attributes() {
        let cloud = attributed_cloud();
        let tmp = NamedTempFile::new().unwrap();
        write_ply_binary(tmp.path(), &cloud).unwrap();
        assert_eq!(read_ply(tmp.path()).unwrap(), cloud);
    }

    #[test]
    fn ply_binary_double_properties_and_faces() {
        let mut raw = b"ply\nformat binary_little_endian 1.0\nelement vertex 1\n\
property double x\nproperty double y\nproperty double z\nproperty uchar flag\n\
element face 0\nproperty list uchar int vertex_indices\nend_header\n"
            .to_vec();
        for v in [0.25f64, -0.5, 2.0] {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        raw.push(1);
        let cloud = parse_ply(&raw).unwrap();
        assert_eq!(cloud.point(0), [0.25, -0.5, 2.0]);
    }

    #[test]
    fn ply_rejects_big_endian() {
        let raw = b"ply\nformat binary_big_endian 1.0\nelement vertex 0\nend_header\n";
        assert!(matches!(parse_ply(raw), Err(IoError::UnsupportedFormat(_))));
    }

    #[test]
    fn ply_rejects_missing_magic() {
        let raw = b"format ascii 1.0\nelement vertex 0\nend_header\n";
        assert!(matches!(parse_ply(raw), Err(IoError::Malformed { .. })));
    }

    #[test]
    fn ply_rejects_short_ascii_body() {
        let raw = b"ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\n\
property float y\nproperty float z\nend_header\n1 2 3\n";
        assert!(matches!(parse_ply(raw), Err(IoError::Malformed { .. })));
    }

    proptest! {
        #[test]
        fn ply_roundtrip_preserves_points(
            pts in prop::collection::vec(
                (-1000.0f32..1000.0f32, -1000.0f32..1000.0f32, -1000.0f32..1000.0f32),
                0..200
            )
        ) {
            let points: Vec<[f32; 3]> = pts.iter().map(|p| [p.0, p.1, p.2]).collect();
            let cloud = PointCloud::from_points(&points);

            let tmp = NamedTempFile::new().unwrap();
            write_ply(tmp.path(), &cloud).unwrap();
            let loaded = read_ply(tmp.path()).unwrap();

            prop_assert_eq!(loaded.len(), cloud.len());
            for i in 0..cloud.len() {
                prop_assert_eq!(loaded.point(i), cloud.point(i));
            }
        }

        #[test]
        fn ply_binary_roundtrip_is_bit_exact(
            pts in prop::collection::vec(
                (-1000.0f32..1000.0f32, -1000.0f32..1000.0f32, -1000.0f32..1000.0f32),
                0..200
            )
        ) {
            let points: Vec<[f32; 3]> = pts.iter().map(|p| [p.0, p.1, p.2]).collect();
            let cloud = PointCloud::from_points(&points);

            let tmp = NamedTempFile::new().unwrap();
            write_ply_binary(tmp.path(), &cloud).unwrap();
            let loaded = read_ply(tmp.path()).unwrap();

            prop_assert_eq!(loaded.len(), cloud.len());
            for i in 0..cloud.len() {
                prop_assert_eq!(loaded.x[i].to_bits(), cloud.x[i].to_bits());
                prop_assert_eq!(loaded.y[i].to_bits(), cloud.y[i].to_bits());
                prop_assert_eq!(loaded.z[i].to_bits(), cloud.z[i].to_bits());
            }
        }
    }
}
