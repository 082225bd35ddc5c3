use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use hashmatch_core::{Error, ImageId, IndMatch, Pair, PutativeMatches, Result};

use crate::format;

/// Putative matches as written to disk.
///
/// `{"pairs": [{"i": 0, "j": 1, "matches": [[4, 7], [5, 2]]}]}`, where each
/// match lists the feature index in image `i` first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchesFile {
    #[serde(default)]
    pub pairs: Vec<PairMatches>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairMatches {
    pub i: ImageId,
    pub j: ImageId,
    pub matches: Vec<[u32; 2]>,
}

impl From<&PutativeMatches> for MatchesFile {
    fn from(matches: &PutativeMatches) -> Self {
        Self {
            pairs: matches
                .iter()
                .map(|(pair, found)| PairMatches {
                    i: pair.first(),
                    j: pair.second(),
                    matches: found.iter().map(|m| [m.i, m.j]).collect(),
                })
                .collect(),
        }
    }
}

impl MatchesFile {
    pub fn into_matches(self) -> Result<PutativeMatches> {
        let mut matches = PutativeMatches::new();
        for entry in self.pairs {
            let pair = Pair(entry.i, entry.j);
            if matches.contains(pair) {
                return Err(Error::Storage(format!(
                    "pair ({}, {}) listed more than once",
                    entry.i, entry.j
                )));
            }
            let found = entry
                .matches
                .into_iter()
                .map(|[i, j]| IndMatch::new(i, j))
                .collect();
            // Pairs without matches are not kept in memory.
            matches.insert(pair, found);
        }
        Ok(matches)
    }
}

/// Write putative matches to a `.json` or `.bin` file, replacing it atomically.
pub fn save_matches(path: &Path, matches: &PutativeMatches) -> Result<()> {
    format::save(path, &MatchesFile::from(matches))?;
    info!(
        "Saved {} matches of {} pairs to {:?}",
        matches.total_matches(),
        matches.len(),
        path
    );
    Ok(())
}

pub fn load_matches(path: &Path) -> Result<PutativeMatches> {
    let file: MatchesFile = format::load(path)?;
    file.into_matches()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> PutativeMatches {
        let mut matches = PutativeMatches::new();
        matches.insert(Pair(0, 1), vec![IndMatch::new(4, 7), IndMatch::new(5, 2)]);
        matches.insert(Pair(3, 2), vec![IndMatch::new(0, 0)]);
        matches
    }

    #[test]
    fn test_json_layout() {
        let file = MatchesFile::from(&sample());
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "pairs": [
                    {"i": 0, "j": 1, "matches": [[4, 7], [5, 2]]},
                    {"i": 3, "j": 2, "matches": [[0, 0]]}
                ]
            })
        );
    }

    #[test]
    fn test_round_trip_both_formats() {
        let dir = tempdir().unwrap();
        for name in ["matches.json", "matches.bin"] {
            let path = dir.path().join(name);
            save_matches(&path, &sample()).unwrap();
            assert_eq!(load_matches(&path).unwrap(), sample());
        }
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let file = MatchesFile {
            pairs: vec![
                PairMatches {
                    i: 0,
                    j: 1,
                    matches: vec![[0, 0]],
                },
                PairMatches {
                    i: 0,
                    j: 1,
                    matches: vec![[1, 1]],
                },
            ],
        };
        assert!(matches!(file.into_matches(), Err(Error::Storage(_))));
    }

    #[test]
    fn test_empty_entries_dropped() {
        let file: MatchesFile =
            serde_json::from_str(r#"{"pairs": [{"i": 2, "j": 5, "matches": []}]}"#).unwrap();
        assert!(file.into_matches().unwrap().is_empty());
    }
}
