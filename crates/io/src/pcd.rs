use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tabletop_core::{Colors, Normals, PointCloud};

use crate::error::{IoError, Result};

const FORMAT: &str = "PCD";

/// Reads a PCD file (`ascii` or `binary` body).
///
/// Positions are required; `normal_x/normal_y/normal_z` and packed
/// `rgb`/`rgba` fields are loaded when present. Every other field is skipped.
pub fn read_pcd(path: impl AsRef<Path>) -> Result<PointCloud> {
    let raw = fs::read(path)?;
    parse_pcd(&raw)
}

/// Writes a PCD file in ASCII format.
pub fn write_pcd(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    let mut out = header_for(cloud, "ascii");

    for i in 0..cloud.len() {
        let _ = write!(out, "{} {} {}", cloud.x[i], cloud.y[i], cloud.z[i]);
        if let Some(ref normals) = cloud.normals {
            let _ = write!(out, " {} {} {}", normals.nx[i], normals.ny[i], normals.nz[i]);
        }
        if let Some(ref colors) = cloud.colors {
            let _ = write!(out, " {}", pack_rgb(colors.color(i)));
        }
        out.push('\n');
    }

    fs::write(path, out)?;
    Ok(())
}

/// Writes a PCD file in binary format.
pub fn write_pcd_binary(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    let header = header_for(cloud, "binary");

    let mut point_size = 3 * 4;
    if cloud.normals.is_some() {
        point_size += 3 * 4;
    }
    if cloud.colors.is_some() {
        point_size += 4;
    }

    let mut buf = Vec::with_capacity(header.len() + cloud.len() * point_size);
    buf.extend_from_slice(header.as_bytes());

    for i in 0..cloud.len() {
        buf.extend_from_slice(&cloud.x[i].to_le_bytes());
        buf.extend_from_slice(&cloud.y[i].to_le_bytes());
        buf.extend_from_slice(&cloud.z[i].to_le_bytes());
        if let Some(ref normals) = cloud.normals {
            buf.extend_from_slice(&normals.nx[i].to_le_bytes());
            buf.extend_from_slice(&normals.ny[i].to_le_bytes());
            buf.extend_from_slice(&normals.nz[i].to_le_bytes());
        }
        if let Some(ref colors) = cloud.colors {
            buf.extend_from_slice(&pack_rgb(colors.color(i)).to_le_bytes());
        }
    }

    fs::write(path, buf)?;
    Ok(())
}

fn header_for(cloud: &PointCloud, data: &str) -> String {
    let mut fields = vec!["x", "y", "z"];
    let mut sizes = vec!["4"; 3];
    let mut types = vec!["F"; 3];

    if cloud.normals.is_some() {
        fields.extend(["normal_x", "normal_y", "normal_z"]);
        sizes.extend(["4"; 3]);
        types.extend(["F"; 3]);
    }
    if cloud.colors.is_some() {
        fields.push("rgb");
        sizes.push("4");
        types.push("U");
    }

    let counts = vec!["1"; fields.len()];

    let mut header = String::new();
    header.push_str("# .PCD v0.7 - Point Cloud Data file format\n");
    header.push_str("VERSION 0.7\n");
    let _ = writeln!(header, "FIELDS {}", fields.join(" "));
    let _ = writeln!(header, "SIZE {}", sizes.join(" "));
    let _ = writeln!(header, "TYPE {}", types.join(" "));
    let _ = writeln!(header, "COUNT {}", counts.join(" "));
    let _ = writeln!(header, "WIDTH {}", cloud.len());
    header.push_str("HEIGHT 1\n");
    header.push_str("VIEWPOINT 0 0 0 1 0 0 0\n");
    let _ = writeln!(header, "POINTS {}", cloud.len());
    let _ = writeln!(header, "DATA {}", data);
    header
}

fn pack_rgb(color: [u8; 3]) -> u32 {
    ((color[0] as u32) << 16) | ((color[1] as u32) << 8) | color[2] as u32
}

fn unpack_rgb(packed: u32) -> [u8; 3] {
    [
        ((packed >> 16) & 0xff) as u8,
        ((packed >> 8) & 0xff) as u8,
        (packed & 0xff) as u8,
    ]
}

// --- Parsing ---

#[derive(Debug, Clone, Copy, PartialEq)]
enum DataFormat {
    Ascii,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScalarType {
    F32,
    F64,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl ScalarType {
    fn from_header(ty: &str, size: usize) -> Result<Self> {
        let scalar = match (ty, size) {
            ("F", 4) => ScalarType::F32,
            ("F", 8) => ScalarType::F64,
            ("U", 1) => ScalarType::U8,
            ("U", 2) => ScalarType::U16,
            ("U", 4) => ScalarType::U32,
            ("U", 8) => ScalarType::U64,
            ("I", 1) => ScalarType::I8,
            ("I", 2) => ScalarType::I16,
            ("I", 4) => ScalarType::I32,
            ("I", 8) => ScalarType::I64,
            _ => {
                return Err(IoError::malformed(
                    FORMAT,
                    format!("unsupported field type {} of size {}", ty, size),
                ))
            }
        };
        Ok(scalar)
    }

    fn size(self) -> usize {
        match self {
            ScalarType::U8 | ScalarType::I8 => 1,
            ScalarType::U16 | ScalarType::I16 => 2,
            ScalarType::F32 | ScalarType::U32 | ScalarType::I32 => 4,
            ScalarType::F64 | ScalarType::U64 | ScalarType::I64 => 8,
        }
    }

    fn is_float(self) -> bool {
        matches!(self, ScalarType::F32 | ScalarType::F64)
    }

    /// Decodes one little-endian value; `bytes` must hold exactly `size()` bytes.
    fn decode(self, bytes: &[u8]) -> f64 {
        let mut b8 = [0u8; 8];
        b8[..bytes.len()].copy_from_slice(bytes);
        match self {
            ScalarType::F32 => f32::from_le_bytes([b8[0], b8[1], b8[2], b8[3]]) as f64,
            ScalarType::F64 => f64::from_le_bytes(b8),
            ScalarType::U8 => b8[0] as f64,
            ScalarType::U16 => u16::from_le_bytes([b8[0], b8[1]]) as f64,
            ScalarType::U32 => u32::from_le_bytes([b8[0], b8[1], b8[2], b8[3]]) as f64,
            ScalarType::U64 => u64::from_le_bytes(b8) as f64,
            ScalarType::I8 => b8[0] as i8 as f64,
            ScalarType::I16 => i16::from_le_bytes([b8[0], b8[1]]) as f64,
            ScalarType::I32 => i32::from_le_bytes([b8[0], b8[1], b8[2], b8[3]]) as f64,
            ScalarType::I64 => i64::from_le_bytes(b8) as f64,
        }
    }
}

#[derive(Debug)]
struct PcdHeader {
    fields: Vec<String>,
    types: Vec<ScalarType>,
    counts: Vec<usize>,
    points: usize,
    stride: usize,
    tokens_per_point: usize,
    data: DataFormat,
}

impl PcdHeader {
    fn parse(text: &str) -> Result<Self> {
        let mut fields = None;
        let mut sizes = None;
        let mut type_names = None;
        let mut counts = None;
        let mut width = None;
        let mut height = None;
        let mut points = None;
        let mut data = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(key) = parts.next() else {
                continue;
            };
            let values: Vec<&str> = parts.collect();

            match key {
                "FIELDS" => fields = Some(values.iter().map(|s| s.to_string()).collect::<Vec<_>>()),
                "SIZE" => sizes = Some(parse_list(&values, "SIZE")?),
                "TYPE" => {
                    type_names = Some(values.iter().map(|s| s.to_string()).collect::<Vec<_>>())
                }
                "COUNT" => counts = Some(parse_list(&values, "COUNT")?),
                "WIDTH" => width = Some(parse_single(&values, "WIDTH")?),
                "HEIGHT" => height = Some(parse_single(&values, "HEIGHT")?),
                "POINTS" => points = Some(parse_single(&values, "POINTS")?),
                "DATA" => {
                    data = Some(match values.first().copied() {
                        Some("ascii") => DataFormat::Ascii,
                        Some("binary") => DataFormat::Binary,
                        Some(other) => {
                            return Err(IoError::UnsupportedFormat(format!(
                                "PCD DATA {}",
                                other
                            )))
                        }
                        None => return Err(IoError::malformed(FORMAT, "empty DATA line")),
                    })
                }
                _ => {}
            }
        }

        let fields = fields.ok_or_else(|| IoError::malformed(FORMAT, "missing FIELDS line"))?;
        let sizes = sizes.ok_or_else(|| IoError::malformed(FORMAT, "missing SIZE line"))?;
        let type_names = type_names.ok_or_else(|| IoError::malformed(FORMAT, "missing TYPE line"))?;
        let counts = counts.unwrap_or_else(|| vec![1; fields.len()]);
        let data = data.ok_or_else(|| IoError::malformed(FORMAT, "missing DATA line"))?;

        if sizes.len() != fields.len()
            || type_names.len() != fields.len()
            || counts.len() != fields.len()
        {
            return Err(IoError::malformed(
                FORMAT,
                format!(
                    "FIELDS/SIZE/TYPE/COUNT lengths differ ({}/{}/{}/{})",
                    fields.len(),
                    sizes.len(),
                    type_names.len(),
                    counts.len()
                ),
            ));
        }

        let types = type_names
            .iter()
            .zip(&sizes)
            .map(|(ty, &size)| ScalarType::from_header(ty, size))
            .collect::<Result<Vec<_>>>()?;

        let points = match points {
            Some(p) => p,
            None => width
                .ok_or_else(|| IoError::malformed(FORMAT, "missing POINTS/WIDTH header"))?
                .checked_mul(height.unwrap_or(1))
                .ok_or_else(|| IoError::malformed(FORMAT, "WIDTH x HEIGHT overflows"))?,
        };

        // Field offsets are partial sums of these, so checking the totals covers them.
        let stride = types
            .iter()
            .zip(&counts)
            .try_fold(0usize, |acc, (t, &c)| t.size().checked_mul(c)?.checked_add(acc))
            .ok_or_else(|| IoError::malformed(FORMAT, "SIZE x COUNT overflows"))?;
        let tokens_per_point = counts
            .iter()
            .try_fold(0usize, |acc, &c| acc.checked_add(c))
            .ok_or_else(|| IoError::malformed(FORMAT, "COUNT total overflows"))?;

        Ok(Self {
            fields,
            types,
            counts,
            points,
            stride,
            tokens_per_point,
            data,
        })
    }

    fn field(&self, name: &str) -> Option<FieldRef> {
        let index = self.fields.iter().position(|f| f == name)?;
        let byte_offset = (0..index)
            .map(|i| self.types[i].size() * self.counts[i])
            .sum();
        let token_offset = self.counts[..index].iter().sum();
        Some(FieldRef {
            ty: self.types[index],
            byte_offset,
            token_offset,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldRef {
    ty: ScalarType,
    byte_offset: usize,
    token_offset: usize,
}

struct Layout {
    xyz: [FieldRef; 3],
    normals: Option<[FieldRef; 3]>,
    rgb: Option<FieldRef>,
}

impl Layout {
    fn new(header: &PcdHeader) -> Result<Self> {
        let (Some(x), Some(y), Some(z)) = (header.field("x"), header.field("y"), header.field("z"))
        else {
            return Err(IoError::malformed(FORMAT, "missing x, y, z fields"));
        };

        let normals = match (
            header.field("normal_x"),
            header.field("normal_y"),
            header.field("normal_z"),
        ) {
            (Some(nx), Some(ny), Some(nz)) => Some([nx, ny, nz]),
            _ => None,
        };

        let rgb = header.field("rgb").or_else(|| header.field("rgba"));
        if let Some(field) = rgb {
            if field.ty.size() != 4 {
                return Err(IoError::malformed(FORMAT, "packed colour field must be 4 bytes"));
            }
        }

        Ok(Self {
            xyz: [x, y, z],
            normals,
            rgb,
        })
    }
}

/// Per-point attribute collector shared by the ASCII and binary paths.
struct Builder {
    points: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    colors: Vec<[u8; 3]>,
}

impl Builder {
    fn with_capacity(n: usize, layout: &Layout) -> Self {
        Self {
            points: Vec::with_capacity(n),
            normals: Vec::with_capacity(if layout.normals.is_some() { n } else { 0 }),
            colors: Vec::with_capacity(if layout.rgb.is_some() { n } else { 0 }),
        }
    }

    fn finish(self, layout: &Layout) -> PointCloud {
        let mut cloud = PointCloud::from_points(&self.points);
        if layout.normals.is_some() {
            cloud.normals = Some(Normals::from_vectors(&self.normals));
        }
        if layout.rgb.is_some() {
            cloud.colors = Some(Colors {
                r: self.colors.iter().map(|c| c[0]).collect(),
                g: self.colors.iter().map(|c| c[1]).collect(),
                b: self.colors.iter().map(|c| c[2]).collect(),
            });
        }
        cloud
    }
}

fn parse_pcd(raw: &[u8]) -> Result<PointCloud> {
    let header_end =
        find_data_line_end(raw).ok_or_else(|| IoError::malformed(FORMAT, "missing DATA line"))?;
    let header_text = std::str::from_utf8(&raw[..header_end])
        .map_err(|_| IoError::malformed(FORMAT, "header is not valid UTF-8"))?;

    let header = PcdHeader::parse(header_text)?;
    let layout = Layout::new(&header)?;
    let body = &raw[header_end..];

    let builder = match header.data {
        DataFormat::Ascii => read_ascii_body(body, &header, &layout)?,
        DataFormat::Binary => read_binary_body(body, &header, &layout)?,
    };

    Ok(builder.finish(&layout))
}

fn read_ascii_body(body: &[u8], header: &PcdHeader, layout: &Layout) -> Result<Builder> {
    let content = std::str::from_utf8(body)
        .map_err(|e| IoError::malformed(FORMAT, format!("invalid UTF-8 body: {}", e)))?;

    let expected_tokens = header.tokens_per_point;
    let mut builder = Builder::with_capacity(header.points.min(content.lines().count()), layout);

    for line in content.lines() {
        if builder.points.len() >= header.points {
            break;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < expected_tokens {
            return Err(IoError::malformed(
                FORMAT,
                format!(
                    "point line has {} values, expected {}",
                    tokens.len(),
                    expected_tokens
                ),
            ));
        }

        let value = |field: &FieldRef| -> Result<f32> {
            let token = tokens[field.token_offset];
            token.parse::<f32>().map_err(|e| {
                IoError::malformed(FORMAT, format!("invalid number '{}': {}", token, e))
            })
        };

        let [fx, fy, fz] = &layout.xyz;
        builder.points.push([value(fx)?, value(fy)?, value(fz)?]);

        if let Some([nx, ny, nz]) = &layout.normals {
            builder.normals.push([value(nx)?, value(ny)?, value(nz)?]);
        }

        if let Some(field) = &layout.rgb {
            let token = tokens[field.token_offset];
            let packed = if field.ty.is_float() {
                token.parse::<f32>().map(f32::to_bits).ok()
            } else {
                token.parse::<u32>().ok()
            }
            .ok_or_else(|| IoError::malformed(FORMAT, format!("invalid colour '{}'", token)))?;
            builder.colors.push(unpack_rgb(packed));
        }
    }

    if builder.points.len() < header.points {
        return Err(IoError::malformed(
            FORMAT,
            format!(
                "expected {} points, found {}",
                header.points,
                builder.points.len()
            ),
        ));
    }

    Ok(builder)
}

fn read_binary_body(body: &[u8], header: &PcdHeader, layout: &Layout) -> Result<Builder> {
    let stride = header.stride;
    let expected_size = header.points.checked_mul(stride).ok_or_else(|| {
        IoError::malformed(
            FORMAT,
            format!("{} points x {} bytes overflows", header.points, stride),
        )
    })?;

    if body.len() < expected_size {
        return Err(IoError::malformed(
            FORMAT,
            format!(
                "binary data too short: have {} bytes, expected {} ({} points x {} bytes)",
                body.len(),
                expected_size,
                header.points,
                stride
            ),
        ));
    }

    let mut builder = Builder::with_capacity(header.points, layout);

    for row in body[..expected_size].chunks_exact(stride.max(1)) {
        let value = |field: &FieldRef| -> f32 {
            let start = field.byte_offset;
            field.ty.decode(&row[start..start + field.ty.size()]) as f32
        };

        let [fx, fy, fz] = &layout.xyz;
        builder.points.push([value(fx), value(fy), value(fz)]);

        if let Some([nx, ny, nz]) = &layout.normals {
            builder.normals.push([value(nx), value(ny), value(nz)]);
        }

        if let Some(field) = &layout.rgb {
            let start = field.byte_offset;
            let packed = u32::from_le_bytes([
                row[start],
                row[start + 1],
                row[start + 2],
                row[start + 3],
            ]);
            builder.colors.push(unpack_rgb(packed));
        }
    }

    Ok(builder)
}

fn parse_single(values: &[&str], key: &str) -> Result<usize> {
    values
        .first()
        .ok_or_else(|| IoError::malformed(FORMAT, format!("empty {} line", key)))?
        .parse::<usize>()
        .map_err(|e| IoError::malformed(FORMAT, format!("invalid {} value: {}", key, e)))
}

fn parse_list(values: &[&str], key: &str) -> Result<Vec<usize>> {
    values
        .iter()
        .map(|v| {
            v.parse::<usize>()
                .map_err(|e| IoError::malformed(FORMAT, format!("invalid {} value: {}", key, e)))
        })
        .collect()
}

/// Finds the byte offset just past the newline ending the DATA line.
fn find_data_line_end(raw: &[u8]) -> Option<usize> {
    let data_marker = b"DATA";
    for i in 0..raw.len().saturating_sub(data_marker.len() - 1) {
        if (i == 0 || raw[i - 1] == b'\n') && raw[i..].starts_with(data_marker) {
            if let Some(offset) = raw[i..].iter().position(|&b| b == b'\n') {
                return Some(i + offset + 1);
            }
            return Some(raw.len());
        }
    }
    None
}
