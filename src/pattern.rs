use crate::{IntOffset, SparseCellSet};
use anyhow::{anyhow, Context, Result};
use flate2::{
    read::{GzDecoder, GzEncoder},
    Compression,
};
use rand::{Rng, SeedableRng};
use std::io::Read;
use std::path::Path;

/// Supported formats for pattern serialization and deserialization.
///
/// Notice that only two-state patterns and B3/S23 rules are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternFormat {
    /// [Extended RLE](https://golly.sourceforge.io/Help/formats.html#rle) format:
    /// a text-based format that efficiently encodes patterns using run-length encoding.
    ///
    /// The header and `#` comment lines are supported, but only for
    /// two-state patterns with B3/S23 rules.
    RLE,

    /// Gzip-compressed RLE.
    CompressedRLE,

    /// [Plaintext](https://conwaylife.com/wiki/Plaintext) format: one line per row,
    /// `.` for dead cells and `O` (or `*`) for alive ones, `!` starts a comment line.
    Plaintext,
}

impl PatternFormat {
    /// Guesses the format from the file name: `.rle`, `.rle.gz`, `.cells` or `.txt`.
    pub fn detect(filename: &str) -> Option<Self> {
        if filename.ends_with(".rle") {
            Some(PatternFormat::RLE)
        } else if filename.ends_with(".rle.gz") {
            Some(PatternFormat::CompressedRLE)
        } else if filename.ends_with(".cells") || filename.ends_with(".txt") {
            Some(PatternFormat::Plaintext)
        } else {
            None
        }
    }
}

/// Run-length writer wrapping lines at 70 characters.
struct RleWriter {
    out: Vec<u8>,
    line_length: usize,
}

impl RleWriter {
    const MAX_LINE_LENGTH: usize = 70;

    fn push(&mut self, count: u64, tag: u8) {
        let mut run = Vec::new();
        if count > 1 {
            run.extend_from_slice(count.to_string().as_bytes());
        }
        run.push(tag);
        if self.line_length + run.len() > Self::MAX_LINE_LENGTH {
            self.out.push(b'\n');
            self.line_length = 0;
        }
        self.out.extend_from_slice(&run);
        self.line_length += run.len();
    }
}

impl SparseCellSet {
    /// Parses a pattern in the specified format.
    ///
    /// The top-left corner of the pattern's box is placed at the origin.
    pub fn from_format(format: PatternFormat, data: &[u8]) -> Result<Self> {
        match format {
            PatternFormat::RLE => Self::from_rle(data),
            PatternFormat::CompressedRLE => Self::from_compressed_rle(data),
            PatternFormat::Plaintext => Self::from_plaintext(data),
        }
    }

    /// Converts the pattern to the specified format.
    ///
    /// The output describes the bounding box only, so absolute coordinates are lost.
    pub fn to_format(&self, format: PatternFormat) -> Result<Vec<u8>> {
        match format {
            PatternFormat::RLE => Ok(self.to_rle()),
            PatternFormat::CompressedRLE => self.to_compressed_rle(),
            PatternFormat::Plaintext => Ok(self.to_plaintext()),
        }
    }

    /// Reads a pattern file, picking the format by extension (see [`PatternFormat::detect`]).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = PatternFormat::detect(&path.to_string_lossy())
            .ok_or_else(|| anyhow!("Unknown pattern format: {}", path.display()))?;
        let data =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_format(format, &data)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Writes the pattern to a file, picking the format by extension.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = PatternFormat::detect(&path.to_string_lossy())
            .ok_or_else(|| anyhow!("Unknown pattern format: {}", path.display()))?;
        let data = self.to_format(format)?;
        std::fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Fills a `width` x `height` box at the origin with cells alive with probability 1/2.
    ///
    /// Pass a seed for a reproducible soup.
    pub fn random(width: u64, height: u64, seed: Option<u64>) -> Self {
        let mut rng = if let Some(x) = seed {
            rand_chacha::ChaCha8Rng::seed_from_u64(x)
        } else {
            rand_chacha::ChaCha8Rng::from_os_rng()
        };
        let mut cells = Self::new();
        let mut row = vec![0u8; width.div_ceil(8) as usize];
        for y in 0..height {
            rng.fill(&mut row[..]);
            for x in 0..width {
                if row[(x / 8) as usize] & (1 << (x % 8)) != 0 {
                    cells.insert(IntOffset::new(x as i64, y as i64));
                }
            }
        }
        cells
    }

    /// Creates a pattern from data in the Extended RLE format. See [`PatternFormat::RLE`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Data is invalid
    /// - Cells lie outside the box declared in the header
    /// - Rule is not B3/S23
    fn from_rle(data: &[u8]) -> Result<Self> {
        let mut lines = data
            .split(|&b| b == b'\n')
            .map(|x| x.strip_suffix(b"\r").unwrap_or(x))
            .filter(|x| !x.trim_ascii().is_empty() && x[0] != b'#');
        let width: i64;
        let height: i64;

        // Parse header
        if let Some(line) = lines.next() {
            let mut parts = line.split(|&b| b == b',').map(|x| x.trim_ascii());

            let extract_value = |part: &[u8], expected_key: &[u8]| {
                let mut items = part.split(|&b| b == b'=');
                let key = items.next().unwrap_or(&[]).trim_ascii_end();
                if key != expected_key {
                    return Err(anyhow!(
                        "Invalid header: expected {}, got {}",
                        String::from_utf8_lossy(expected_key),
                        String::from_utf8_lossy(key)
                    ));
                }
                let value = items.next().unwrap_or(&[]).trim_ascii_start();
                if items.next().is_some() {
                    return Err(anyhow!("Invalid header: missing ',' between '='"));
                }
                Ok(value.to_vec())
            };

            let value = extract_value(
                parts
                    .next()
                    .ok_or_else(|| anyhow!("Invalid header: missing \"x\""))?,
                b"x",
            )?;
            width = std::str::from_utf8(&value)?.parse()?;

            let value = extract_value(
                parts
                    .next()
                    .ok_or_else(|| anyhow!("Invalid header: missing \"y\""))?,
                b"y",
            )?;
            height = std::str::from_utf8(&value)?.parse()?;

            // rule is optional
            if let Some(part) = parts.next() {
                let rule = extract_value(part, b"rule")?;
                if !rule.eq_ignore_ascii_case(b"B3/S23") {
                    return Err(anyhow!("Only B3/S23 rule is supported"));
                }
            }
        } else {
            return Err(anyhow!("Missing header"));
        }

        let mut cells = Self::new();
        let mut x = 0i64;
        let mut y = 0i64;
        let mut count = 0i64;

        'outer: for line in lines {
            for &b in line {
                let run = if count == 0 { 1 } else { count };
                match b {
                    b'0'..=b'9' => {
                        count = count
                            .checked_mul(10)
                            .and_then(|c| c.checked_add((b - b'0') as i64))
                            .ok_or_else(|| anyhow!("Run count is too large"))?;
                        continue;
                    }
                    b'b' | b'.' => x += run,
                    b'o' | b'A' => {
                        if x + run > width || y >= height {
                            return Err(anyhow!(
                                "Pattern data out of bounds: x = {}, y = {}",
                                x + run - 1,
                                y
                            ));
                        }
                        cells.extend((x..x + run).map(|i| IntOffset::new(i, y)));
                        x += run;
                    }
                    b'$' => {
                        y += run;
                        x = 0;
                    }
                    b'!' => break 'outer,
                    b' ' | b'\t' => continue,
                    _ => return Err(anyhow!("Invalid RLE character: '{}'", b as char)),
                }
                count = 0;
                if x > width {
                    return Err(anyhow!("Pattern data out of bounds: x = {}, y = {}", x, y));
                }
            }
        }

        Ok(cells)
    }

    /// Converts the pattern to the RLE format. See [`PatternFormat::RLE`].
    fn to_rle(&self) -> Vec<u8> {
        let Some(bbox) = self.bounding_box() else {
            return b"x = 0, y = 0, rule = B3/S23\n!".to_vec();
        };

        let mut writer = RleWriter {
            out: format!(
                "x = {}, y = {}, rule = B3/S23\n",
                bbox.width(),
                bbox.height()
            )
            .into_bytes(),
            line_length: 0,
        };

        let cells = self.sorted();
        let (mut x, mut y) = (bbox.min.x, bbox.min.y);
        let mut i = 0;
        while i < cells.len() {
            let c = cells[i];
            if c.y != y {
                writer.push(c.y.abs_diff(y), b'$');
                (x, y) = (bbox.min.x, c.y);
            }
            if c.x > x {
                writer.push(c.x.abs_diff(x), b'b');
            }
            let mut run = 1;
            while i + run < cells.len() && cells[i + run] == IntOffset::new(c.x.wrapping_add(run as i64), c.y)
            {
                run += 1;
            }
            writer.push(run as u64, b'o');
            x = c.x.wrapping_add(run as i64);
            i += run;
        }
        writer.push(1, b'!');
        writer.out
    }

    fn from_compressed_rle(compressed_data: &[u8]) -> Result<Self> {
        let mut decoder = GzDecoder::new(compressed_data);
        let mut decompressed_data = Vec::new();
        decoder
            .read_to_end(&mut decompressed_data)
            .context("Failed to decompress RLE data")?;
        Self::from_rle(&decompressed_data)
    }

    fn to_compressed_rle(&self) -> Result<Vec<u8>> {
        let rle_data = self.to_rle();
        let mut encoder = GzEncoder::new(&rle_data[..], Compression::default());
        let mut compressed_data = Vec::new();
        encoder
            .read_to_end(&mut compressed_data)
            .context("Failed to compress RLE data")?;
        Ok(compressed_data)
    }

    /// Creates a pattern from plaintext rows. See [`PatternFormat::Plaintext`].
    fn from_plaintext(data: &[u8]) -> Result<Self> {
        let mut cells = Self::new();
        let rows = data
            .split(|&b| b == b'\n')
            .map(|x| x.strip_suffix(b"\r").unwrap_or(x))
            .filter(|x| x.first() != Some(&b'!'));
        for (y, row) in rows.enumerate() {
            for (x, &b) in row.iter().enumerate() {
                match b {
                    b'.' => (),
                    b'O' | b'*' => {
                        cells.insert(IntOffset::new(x as i64, y as i64));
                    }
                    _ => {
                        return Err(anyhow!(
                            "Invalid plaintext character '{}' at row {}, column {}",
                            b as char,
                            y,
                            x
                        ))
                    }
                }
            }
        }
        Ok(cells)
    }

    fn to_plaintext(&self) -> Vec<u8> {
        let mut result = Vec::new();
        let Some(bbox) = self.bounding_box() else {
            return result;
        };
        for y in bbox.min.y..=bbox.max.y {
            for x in bbox.min.x..=bbox.max.x {
                result.push(if self.contains(IntOffset::new(x, y)) {
                    b'O'
                } else {
                    b'.'
                });
            }
            result.push(b'\n');
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const SEED: u64 = 42;

    fn glider() -> SparseCellSet {
        [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)].into_iter().collect()
    }

    #[test]
    fn test_conversions_glider() {
        let rle = SparseCellSet::from_rle(b"x = 3, y = 3, rule = B3/S23\nbo$2bo$3o!").unwrap();
        let plaintext = SparseCellSet::from_plaintext(b"!Name: Glider\n.O.\n..O\nOOO\n").unwrap();

        assert_eq!(rle, glider());
        assert_eq!(plaintext, glider());
        assert_eq!(glider().to_rle(), b"x = 3, y = 3, rule = B3/S23\nbo$2bo$3o!");
        assert_eq!(glider().to_plaintext(), b".O.\n..O\nOOO\n");
    }

    #[test]
    fn test_rle_comments_and_blank_rows() {
        let data = b"#N Two blocks\n#C far apart\nx = 2, y = 6\r\n2o$2o3$2o$2o!";
        let cells = SparseCellSet::from_rle(data).unwrap();
        assert_eq!(cells.population(), 8);
        assert!(cells.contains(IntOffset::new(1, 5)));
        assert_eq!(
            SparseCellSet::from_rle(&cells.to_rle()).unwrap(),
            cells
        );
    }

    #[test]
    fn test_rle_roundtrip_random() {
        for side in [1, 5, 16, 33, 100] {
            let pattern = SparseCellSet::random(side, side, Some(SEED)).normalized();
            let data = pattern.to_rle();
            let deserialized = SparseCellSet::from_rle(&data).unwrap();
            assert_eq!(pattern, deserialized, "RLE roundtrip failed for side {side}");
        }
    }

    #[test]
    fn test_compressed_rle_roundtrip_random() {
        let pattern = SparseCellSet::random(64, 48, Some(SEED)).normalized();
        let data = pattern.to_format(PatternFormat::CompressedRLE).unwrap();
        let deserialized = SparseCellSet::from_format(PatternFormat::CompressedRLE, &data).unwrap();
        assert_eq!(pattern, deserialized);
    }

    #[test]
    fn test_rle_errors() {
        assert!(SparseCellSet::from_rle(b"").is_err());
        assert!(SparseCellSet::from_rle(b"y = 3, x = 3\no!").is_err());
        assert!(SparseCellSet::from_rle(b"x = 3, y = 3, rule = B36/S23\no!").is_err());
        assert!(SparseCellSet::from_rle(b"x = 2, y = 1\n3o!").is_err());
        assert!(SparseCellSet::from_rle(b"x = 2, y = 1\noz!").is_err());
    }

    #[test]
    fn test_empty_rle() {
        let empty = SparseCellSet::new();
        assert_eq!(SparseCellSet::from_rle(&empty.to_rle()).unwrap(), empty);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(PatternFormat::detect("a/b.rle"), Some(PatternFormat::RLE));
        assert_eq!(
            PatternFormat::detect("gun.rle.gz"),
            Some(PatternFormat::CompressedRLE)
        );
        assert_eq!(
            PatternFormat::detect("glider.cells"),
            Some(PatternFormat::Plaintext)
        );
        assert_eq!(PatternFormat::detect("glider.mc"), None);
    }
}
