use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use hashmatch_core::{Error, ImageId, PairSet, Result};

use crate::format::write_atomic;

/// Parse a pair list.
///
/// Each non-empty line `I J K ...` requests the pairs `(I, J)`, `(I, K)`, ...
/// Lines starting with `#` are comments. A pair requested again, in either
/// order, is kept once in its first order.
pub fn parse_pairs<R: BufRead>(reader: R) -> Result<PairSet> {
    let mut pairs = PairSet::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut ids = line.split_whitespace().map(|token| {
            token.parse::<ImageId>().map_err(|_| Error::InvalidPairFile {
                line: number,
                reason: format!("{:?} is not an image id", token),
            })
        });
        let first = ids.next().transpose()?.ok_or_else(|| Error::InvalidPairFile {
            line: number,
            reason: "empty line".to_string(),
        })?;

        let mut seconds = 0;
        for second in ids {
            let second = second?;
            if second == first {
                return Err(Error::InvalidPairFile {
                    line: number,
                    reason: format!("image {} paired with itself", first),
                });
            }
            pairs.insert(first, second);
            seconds += 1;
        }
        if seconds == 0 {
            return Err(Error::InvalidPairFile {
                line: number,
                reason: format!("image {} has no partner", first),
            });
        }
    }
    Ok(pairs)
}

pub fn read_pairs(path: &Path) -> Result<PairSet> {
    parse_pairs(BufReader::new(File::open(path)?))
}

/// Write `pairs` one line per first image, in ascending order.
pub fn write_pairs<W: Write>(mut writer: W, pairs: &PairSet) -> Result<()> {
    let mut grouped: BTreeMap<ImageId, Vec<ImageId>> = BTreeMap::new();
    for pair in pairs.iter() {
        grouped.entry(pair.first()).or_default().push(pair.second());
    }
    for (first, seconds) in grouped {
        write!(writer, "{}", first)?;
        for second in seconds {
            write!(writer, " {}", second)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn save_pairs(path: &Path, pairs: &PairSet) -> Result<()> {
    let mut buffer = Vec::new();
    write_pairs(&mut buffer, pairs)?;
    write_atomic(path, &buffer)
}
