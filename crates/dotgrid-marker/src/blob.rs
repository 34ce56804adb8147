//! Destructive 8-connected component extraction.
//!
//! [`extract_blobs`] walks the mask row-major from the top-left. Every
//! foreground cell it meets seeds a breadth-first fill over an explicit queue;
//! filled cells are cleared as they are enqueued, so each foreground pixel
//! lands in exactly one blob and is visited once per frame.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::mask::BinaryMask;

/// Pixel count and tight bounding box of one connected region.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Blob {
    pub pixel_count: usize,
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Blob {
    fn empty_at(x: usize, y: usize) -> Self {
        Self {
            pixel_count: 0,
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    #[inline]
    fn include(&mut self, x: usize, y: usize) {
        self.pixel_count += 1;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// `max_x - min_x`.
    #[inline]
    pub fn span_x(&self) -> usize {
        self.max_x - self.min_x
    }

    /// `max_y - min_y`.
    #[inline]
    pub fn span_y(&self) -> usize {
        self.max_y - self.min_y
    }
}

const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Lazy blob iterator that consumes the mask it walks.
///
/// Dropping it early leaves the unvisited part of the mask intact.
pub struct Blobs<'m> {
    mask: &'m mut BinaryMask,
    cursor: usize,
    queue: VecDeque<(usize, usize)>,
}

/// Iterate over the 8-connected blobs of `mask`, clearing it as it goes.
pub fn extract_blobs(mask: &mut BinaryMask) -> Blobs<'_> {
    Blobs {
        mask,
        cursor: 0,
        queue: VecDeque::new(),
    }
}

impl Blobs<'_> {
    fn fill_from(&mut self, x: usize, y: usize) -> Blob {
        let width = self.mask.width();
        let height = self.mask.height();
        let mut blob = Blob::empty_at(x, y);

        self.mask.take(x, y);
        self.queue.push_back((x, y));

        while let Some((px, py)) = self.queue.pop_front() {
            blob.include(px, py);
            for (dx, dy) in NEIGHBOURS {
                let (Some(nx), Some(ny)) = (px.checked_add_signed(dx), py.checked_add_signed(dy))
                else {
                    continue;
                };
                if nx >= width || ny >= height {
                    continue;
                }
                if self.mask.take(nx, ny) {
                    self.queue.push_back((nx, ny));
                }
            }
        }

        blob
    }
}

impl Iterator for Blobs<'_> {
    type Item = Blob;

    fn next(&mut self) -> Option<Blob> {
        let width = self.mask.width();
        if width == 0 {
            return None;
        }
        let seed = self.mask.next_set(self.cursor)?;
        self.cursor = seed + 1;
        Some(self.fill_from(seed % width, seed / width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> BinaryMask {
        let mut mask = BinaryMask::new(rows[0].len(), rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                mask.set(x, y, c == '#');
            }
        }
        mask
    }

    #[test]
    fn diagonal_neighbours_join() {
        let mut mask = mask_from(&[
            "#...", //
            ".#..", //
            "..#.", //
            "...#",
        ]);
        let blobs: Vec<Blob> = extract_blobs(&mut mask).collect();
        assert_eq!(
            blobs,
            vec![Blob {
                pixel_count: 4,
                min_x: 0,
                min_y: 0,
                max_x: 3,
                max_y: 3
            }]
        );
        assert!(mask.is_clear());
    }

    #[test]
    fn separate_regions_in_scan_order() {
        let mut mask = mask_from(&[
            "..##.", //
            "..##.", //
            ".....", //
            "#...#", //
            "#...#",
        ]);
        let blobs: Vec<Blob> = extract_blobs(&mut mask).collect();
        assert_eq!(blobs.len(), 3);
        assert_eq!((blobs[0].min_x, blobs[0].min_y), (2, 0));
        assert_eq!(blobs[0].pixel_count, 4);
        assert_eq!((blobs[1].min_x, blobs[1].max_y), (0, 4));
        assert_eq!((blobs[2].min_x, blobs[2].max_y), (4, 4));
    }

    #[test]
    fn u_shape_is_one_blob_with_tight_box() {
        let mut mask = mask_from(&[
            "#...#", //
            "#...#", //
            "#####",
        ]);
        let blobs: Vec<Blob> = extract_blobs(&mut mask).collect();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].pixel_count, 9);
        assert_eq!(blobs[0].span_x(), 4);
        assert_eq!(blobs[0].span_y(), 2);
    }

    #[test]
    fn edge_touching_blobs_are_safe() {
        let mut mask = BinaryMask::new(6, 4);
        for (x, y) in [(0, 0), (5, 0), (0, 3), (5, 3), (5, 2)] {
            mask.set(x, y, true);
        }
        let blobs: Vec<Blob> = extract_blobs(&mut mask).collect();
        let counts: Vec<usize> = blobs.iter().map(|b| b.pixel_count).collect();
        assert_eq!(counts, vec![1, 1, 2, 1]);
    }

    #[test]
    fn full_mask_is_a_single_blob() {
        let mut mask = BinaryMask::new(300, 200);
        for y in 0..200 {
            for x in 0..300 {
                mask.set(x, y, true);
            }
        }
        let blobs: Vec<Blob> = extract_blobs(&mut mask).collect();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].pixel_count, 60_000);
        assert_eq!((blobs[0].max_x, blobs[0].max_y), (299, 199));
    }

    #[test]
    fn early_drop_leaves_rest_of_mask() {
        let mut mask = mask_from(&["#.#.#"]);
        let first = extract_blobs(&mut mask).next();
        assert!(first.is_some());
        assert_eq!(mask.count(), 2);
    }

    struct DisjointSet {
        parent: Vec<usize>,
    }

    impl DisjointSet {
        fn find(&mut self, mut i: usize) -> usize {
            while self.parent[i] != i {
                self.parent[i] = self.parent[self.parent[i]];
                i = self.parent[i];
            }
            i
        }

        fn union(&mut self, a: usize, b: usize) {
            let (ra, rb) = (self.find(a), self.find(b));
            if ra != rb {
                self.parent[ra.max(rb)] = ra.min(rb);
            }
        }
    }

    /// Reference labelling by union-find, independent of the BFS.
    fn reference_blobs(mask: &BinaryMask) -> Vec<Blob> {
        let (w, h) = (mask.width(), mask.height());
        let mut set = DisjointSet {
            parent: (0..w * h).collect(),
        };
        for y in 0..h {
            for x in 0..w {
                if !mask.get(x, y) {
                    continue;
                }
                for (dx, dy) in [(1isize, 0isize), (-1, 1), (0, 1), (1, 1)] {
                    let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy))
                    else {
                        continue;
                    };
                    if mask.get(nx, ny) {
                        set.union(y * w + x, ny * w + nx);
                    }
                }
            }
        }

        let mut by_root: std::collections::BTreeMap<usize, Blob> = Default::default();
        for y in 0..h {
            for x in 0..w {
                if mask.get(x, y) {
                    let root = set.find(y * w + x);
                    by_root
                        .entry(root)
                        .or_insert_with(|| Blob::empty_at(x, y))
                        .include(x, y);
                }
            }
        }
        by_root.into_values().collect()
    }

    #[test]
    fn blobs_partition_the_foreground() {
        // Deterministic pseudo-random mask, ~45% fill.
        let mut state = 0x2545_f491_4f6c_dd1du64;
        let mut mask = BinaryMask::new(64, 48);
        for y in 0..48 {
            for x in 0..64 {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                mask.set(x, y, state % 100 < 45);
            }
        }
        let foreground = mask.count();
        let mut expected = reference_blobs(&mask);

        let mut got: Vec<Blob> = extract_blobs(&mut mask).collect();
        assert!(mask.is_clear());
        assert_eq!(
            got.iter().map(|b| b.pixel_count).sum::<usize>(),
            foreground
        );

        let key = |b: &Blob| (b.min_y, b.min_x, b.max_y, b.max_x, b.pixel_count);
        got.sort_by_key(key);
        expected.sort_by_key(key);
        assert_eq!(got, expected);
    }
}
