use std::fs;
use std::path::Path;

use tabletop_core::PointCloud;

use crate::error::{IoError, Result};

const FORMAT: &str = "OFF";

/// Reads the vertex positions of an Object File Format mesh.
///
/// Faces and edges are skipped. Accepts the `OFF<nv> <nf> <ne>` header
/// variant where the counts share a line with the keyword.
pub fn read_off(path: impl AsRef<Path>) -> Result<PointCloud> {
    let text = fs::read_to_string(path)?;
    parse_off(&text)
}

fn parse_off(text: &str) -> Result<PointCloud> {
    let mut lines = text
        .lines()
        .map(|l| l.split('#').next().unwrap_or("").trim())
        .filter(|l| !l.is_empty());

    let first = lines
        .next()
        .ok_or_else(|| IoError::malformed(FORMAT, "empty file"))?;
    let rest = first
        .strip_prefix("OFF")
        .ok_or_else(|| IoError::malformed(FORMAT, "file does not start with 'OFF'"))?
        .trim();

    let counts_line = if rest.is_empty() {
        lines
            .next()
            .ok_or_else(|| IoError::malformed(FORMAT, "missing vertex/face counts"))?
    } else {
        rest
    };

    let vertex_count: usize = counts_line
        .split_whitespace()
        .next()
        .ok_or_else(|| IoError::malformed(FORMAT, "missing vertex count"))?
        .parse()
        .map_err(|e| IoError::malformed(FORMAT, format!("invalid vertex count: {}", e)))?;

    let lines: Vec<&str> = lines.collect();
    let mut points = Vec::with_capacity(vertex_count.min(lines.len()));
    for line in lines.into_iter().take(vertex_count) {
        let coords = line
            .split_whitespace()
            .take(3)
            .map(|t| {
                t.parse::<f32>().map_err(|e| {
                    IoError::malformed(FORMAT, format!("invalid coordinate '{}': {}", t, e))
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        let [x, y, z] = coords[..] else {
            return Err(IoError::malformed(
                FORMAT,
                format!("vertex line '{}' has fewer than 3 values", line),
            ));
        };
        points.push([x, y, z]);
    }

    if points.len() < vertex_count {
        return Err(IoError::malformed(
            FORMAT,
            format!("expected {} vertices, found {}", vertex_count, points.len()),
        ));
    }

    Ok(PointCloud::from_points(&points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TETRA: &str = "OFF\n# tetrahedron\n4 4 6\n0 0 0\n1 0 0\n0 1 0\n0 0 1\n\
                         3 0 1 2\n3 0 1 3\n3 0 2 3\n3 1 2 3\n";

    #[test]
    fn reads_vertices_and_skips_faces() {
        let cloud = parse_off(TETRA).unwrap();
        assert_eq!(cloud.len(), 4);
        assert_eq!(cloud.point(1), [1.0, 0.0, 0.0]);
        assert_eq!(cloud.point(3), [0.0, 0.0, 1.0]);
        assert!(cloud.normals.is_none());
    }

    #[test]
    fn counts_on_keyword_line() {
        let cloud = parse_off("OFF2 0 0\n0.5 0.5 0.5\n-1 2 3\n").unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.point(1), [-1.0, 2.0, 3.0]);
    }

    #[test]
    fn read_from_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(TETRA.as_bytes()).unwrap();
        assert_eq!(read_off(tmp.path()).unwrap().len(), 4);
    }

    #[test]
    fn rejects_missing_keyword() {
        assert!(matches!(
            parse_off("4 4 6\n0 0 0\n"),
            Err(IoError::Malformed { .. })
        ));
    }

    #[test]
    fn rejects_truncated_vertex_list() {
        assert!(matches!(
            parse_off("OFF\n3 0 0\n0 0 0\n1 1 1\n"),
            Err(IoError::Malformed { .. })
        ));
    }

    #[test]
    fn rejects_short_vertex_line() {
        assert!(matches!(
            parse_off("OFF\n1 0 0\n0 0\n"),
            Err(IoError::Malformed { .. })
        ));
    }
}
