use std::io::{BufRead, Write};
use std::path::Path;

use nalgebra as na;

use crate::error::{SeedError, SeedResult};

const HEADER_PROPERTIES: [&str; 6] = [
    "property float x",
    "property float y",
    "property float z",
    "property uint8 red",
    "property uint8 green",
    "property uint8 blue",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredPoint {
    pub position: na::Vector3<f64>,
    pub color: [u8; 3],
}

impl ColoredPoint {
    pub fn new(position: na::Vector3<f64>, color: [u8; 3]) -> ColoredPoint {
        ColoredPoint { position, color }
    }
}

/// Writes an ASCII PLY with one `x y z red green blue` line per point.
///
/// Coordinates use the shortest representation that parses back to the same `f64`.
pub fn write_ply<W: Write>(mut writer: W, points: &[ColoredPoint]) -> std::io::Result<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "element vertex {}", points.len())?;
    for line in HEADER_PROPERTIES {
        writeln!(writer, "{}", line)?;
    }
    writeln!(writer, "end_header")?;
    for p in points {
        writeln!(
            writer,
            "{:?} {:?} {:?} {} {} {}",
            p.position.x, p.position.y, p.position.z, p.color[0], p.color[1], p.color[2]
        )?;
    }
    writer.flush()
}

pub fn save_ply(path: &Path, points: &[ColoredPoint]) -> SeedResult<()> {
    let file = std::fs::File::create(path).map_err(|e| SeedError::io(path, e))?;
    write_ply(std::io::BufWriter::new(file), points).map_err(|e| SeedError::io(path, e))
}

fn expect_line(line_no: usize, found: Option<&str>, expected: &str) -> SeedResult<()> {
    match found {
        Some(l) if l.trim() == expected => Ok(()),
        Some(l) => Err(SeedError::ply(
            line_no,
            format!("expected '{}', found '{}'", expected, l.trim()),
        )),
        None => Err(SeedError::ply(line_no, format!("expected '{}', found end of file", expected))),
    }
}

/// Parses the exact layout produced by [`write_ply`].
pub fn read_ply<R: BufRead>(reader: R) -> SeedResult<Vec<ColoredPoint>> {
    let lines: Vec<String> = reader
        .lines()
        .collect::<Result<_, _>>()
        .map_err(|e| SeedError::io("<ply stream>", e))?;
    let mut it = lines.iter().map(|l| l.as_str()).enumerate().map(|(i, l)| (i + 1, l));

    let (n, l) = it.next().unwrap_or((1, ""));
    expect_line(n, Some(l), "ply")?;
    let (n, l) = it.next().ok_or_else(|| SeedError::ply(2, "missing format line"))?;
    expect_line(n, Some(l), "format ascii 1.0")?;

    let (n, l) = it.next().ok_or_else(|| SeedError::ply(3, "missing element line"))?;
    let count: usize = match l.split_whitespace().collect::<Vec<_>>().as_slice() {
        ["element", "vertex", count] => count
            .parse()
            .map_err(|_| SeedError::ply(n, format!("bad vertex count '{}'", count)))?,
        _ => return Err(SeedError::ply(n, format!("expected vertex element, found '{}'", l))),
    };
    for expected in HEADER_PROPERTIES {
        let found = it.next();
        let line_no = found.map(|f| f.0).unwrap_or(0);
        expect_line(line_no, found.map(|f| f.1), expected)?;
    }
    let found = it.next();
    expect_line(found.map(|f| f.0).unwrap_or(0), found.map(|f| f.1), "end_header")?;

    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let (n, l) = it.next().ok_or_else(|| {
            SeedError::ply(0, format!("expected {} vertices, found {}", count, points.len()))
        })?;
        let fields: Vec<&str> = l.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(SeedError::ply(n, format!("expected 6 fields, found {}", fields.len())));
        }
        let mut xyz = [0.0f64; 3];
        for (v, s) in xyz.iter_mut().zip(&fields[..3]) {
            *v = s
                .parse()
                .map_err(|_| SeedError::ply(n, format!("bad coordinate '{}'", s)))?;
        }
        let mut rgb = [0u8; 3];
        for (v, s) in rgb.iter_mut().zip(&fields[3..]) {
            *v = s
                .parse()
                .map_err(|_| SeedError::ply(n, format!("bad color '{}'", s)))?;
        }
        points.push(ColoredPoint::new(na::Vector3::from(xyz), rgb));
    }
    Ok(points)
}

pub fn load_ply(path: &Path) -> SeedResult<Vec<ColoredPoint>> {
    let file = std::fs::File::open(path).map_err(|e| SeedError::io(path, e))?;
    read_ply(std::io::BufReader::new(file))
}
