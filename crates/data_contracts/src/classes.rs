use crate::scene::ValidationError;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const S3DIS_CLASSES: [&str; 13] = [
    "ceiling", "floor", "wall", "beam", "column", "window", "door", "table", "chair", "sofa",
    "bookcase", "board", "clutter",
];

pub const S3DIS_PALETTE: [[u8; 3]; 13] = [
    [0, 255, 0],
    [0, 0, 255],
    [0, 255, 255],
    [255, 255, 0],
    [255, 0, 255],
    [100, 100, 255],
    [200, 200, 100],
    [170, 120, 200],
    [255, 0, 0],
    [200, 100, 100],
    [10, 200, 100],
    [200, 200, 200],
    [50, 50, 50],
];

const PALETTE_SEED: u64 = 42;

/// Sensor inputs used by a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modality {
    pub use_lidar: bool,
    pub use_camera: bool,
}

impl Default for Modality {
    fn default() -> Self {
        Self {
            use_lidar: true,
            use_camera: false,
        }
    }
}

/// Class names, their display colors, and the label value treated as "unannotated".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSet {
    pub names: Vec<String>,
    pub palette: Vec<[u8; 3]>,
    pub ignore_index: usize,
}

impl Default for ClassSet {
    fn default() -> Self {
        Self {
            names: S3DIS_CLASSES.iter().map(|s| s.to_string()).collect(),
            palette: S3DIS_PALETTE.to_vec(),
            ignore_index: S3DIS_CLASSES.len(),
        }
    }
}

impl ClassSet {
    /// Build a class set, filling in defaults for anything not provided.
    ///
    /// Without a palette, classes that exist in S3DIS keep their S3DIS color and
    /// any others get a seeded random color. `ignore_index` defaults to the class count.
    pub fn resolve(
        names: Option<Vec<String>>,
        palette: Option<Vec<[u8; 3]>>,
        ignore_index: Option<usize>,
    ) -> Result<Self, ValidationError> {
        let names =
            names.unwrap_or_else(|| S3DIS_CLASSES.iter().map(|s| s.to_string()).collect());
        if names.is_empty() {
            return Err(ValidationError::NoClasses);
        }
        let palette = match palette {
            Some(p) => p,
            None => default_palette(&names),
        };
        if palette.len() != names.len() {
            return Err(ValidationError::PaletteLength {
                classes: names.len(),
                palette: palette.len(),
            });
        }
        let ignore_index = ignore_index.unwrap_or(names.len());
        Ok(Self {
            names,
            palette,
            ignore_index,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.names.len()
    }

    /// Color for a label value, or `None` for the ignore index and unknown labels.
    pub fn color(&self, label: i64) -> Option<[u8; 3]> {
        if label < 0 || label as usize == self.ignore_index {
            return None;
        }
        self.palette.get(label as usize).copied()
    }
}

fn default_palette(names: &[String]) -> Vec<[u8; 3]> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(PALETTE_SEED);
    names
        .iter()
        .map(|name| match S3DIS_CLASSES.iter().position(|c| c == name) {
            Some(i) => S3DIS_PALETTE[i],
            None => [rng.gen(), rng.gen(), rng.gen()],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_s3dis() {
        let set = ClassSet::resolve(None, None, None).unwrap();
        assert_eq!(set.num_classes(), 13);
        assert_eq!(set.ignore_index, 13);
        assert_eq!(set.palette[8], [255, 0, 0]);
    }

    #[test]
    fn subset_keeps_s3dis_colors() {
        let set = ClassSet::resolve(Some(vec!["chair".into(), "wall".into()]), None, None).unwrap();
        assert_eq!(set.palette, vec![[255, 0, 0], [0, 255, 255]]);
        assert_eq!(set.ignore_index, 2);
    }

    #[test]
    fn custom_palette_is_seeded() {
        let a = ClassSet::resolve(Some(vec!["pipe".into()]), None, None).unwrap();
        let b = ClassSet::resolve(Some(vec!["pipe".into()]), None, None).unwrap();
        assert_eq!(a.palette, b.palette);
    }

    #[test]
    fn palette_length_checked() {
        let err = ClassSet::resolve(Some(vec!["a".into(), "b".into()]), Some(vec![[0, 0, 0]]), None)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::PaletteLength {
                classes: 2,
                palette: 1
            }
        ));
    }

    #[test]
    fn ignore_index_has_no_color() {
        let set = ClassSet::default();
        assert_eq!(set.color(13), None);
        assert_eq!(set.color(-1), None);
        assert_eq!(set.color(0), Some([0, 255, 0]));
    }
}
