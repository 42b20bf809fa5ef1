use std::cmp;
use std::iter::FusedIterator;

use crate::geometry::{ScreenPoint, ScreenSize};

type ChunkPoint = nalgebra::Point2<i32>;
type ChunkVector = nalgebra::Vector2<i32>;

/// Half open rectangle of pixels, `min` inclusive, `max` exclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScreenBlock {
    pub min: ScreenPoint,
    pub max: ScreenPoint,
}

impl ScreenBlock {
    pub fn new(min: ScreenPoint, max: ScreenPoint) -> ScreenBlock {
        ScreenBlock { min, max }
    }

    pub fn from_size(size: ScreenSize) -> ScreenBlock {
        ScreenBlock {
            min: ScreenPoint::origin(),
            max: ScreenPoint::origin() + size,
        }
    }

    pub fn width(&self) -> u32 {
        self.max.x.saturating_sub(self.min.x)
    }

    pub fn height(&self) -> u32 {
        self.max.y.saturating_sub(self.min.y)
    }

    pub fn area(&self) -> u32 {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    pub fn contains(&self, point: &ScreenPoint) -> bool {
        self.min.x <= point.x && point.x < self.max.x && self.min.y <= point.y && point.y < self.max.y
    }

    pub fn contains_block(&self, other: &ScreenBlock) -> bool {
        other.is_empty()
            || (self.min.x <= other.min.x
                && self.min.y <= other.min.y
                && other.max.x <= self.max.x
                && other.max.y <= self.max.y)
    }

    /// Create an iterator over coordinates (x, y) pairs inside the block,
    /// in C order (x changes first, then y)
    pub fn internal_points(&self) -> InternalPoints {
        if self.is_empty() {
            InternalPoints::empty()
        } else {
            InternalPoints {
                min_x: self.min.x,
                max: self.max,

                cursor: self.min,
            }
        }
    }

    /// Create an iterator over sub blocks in (roughly) spiral order, starting in the middle of the block.
    /// Chunks are chunk_size * chunk_size large, except on the bottom and right side of the
    /// block, where they may be clipped if chunk size doesn't evenly divide block size.
    /// Chunk size must be non zero.
    pub fn spiral_chunks(&self, chunk_size: u32) -> SpiralChunks {
        assert!(chunk_size > 0);

        if self.is_empty() {
            return SpiralChunks::empty();
        }

        let size = ChunkVector::new(
            self.width().div_ceil(chunk_size) as i32,
            self.height().div_ceil(chunk_size) as i32,
        );
        let cursor = ChunkPoint::origin() + size / 2;

        let dx = 2 * cursor.y - size.y;
        debug_assert!(dx == 0 || dx == -1);
        let direction = ChunkVector::new(dx, -1 - dx);

        SpiralChunks {
            block: *self,

            chunk_size,
            size,
            cursor,
            direction,

            segment: 2,
            segment_remaining: 1,
            remaining: (size.x * size.y) as u32,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct InternalPoints {
    min_x: u32,
    max: ScreenPoint,

    cursor: ScreenPoint,
}

impl InternalPoints {
    // Construct an iterator over internal points that returns no points
    fn empty() -> Self {
        InternalPoints {
            min_x: 1,
            max: ScreenPoint::origin(),

            cursor: ScreenPoint::origin(),
        }
    }
}

impl Iterator for InternalPoints {
    type Item = ScreenPoint;

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        (len, Some(len))
    }

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.y >= self.max.y {
            return None;
        }

        let ret = self.cursor;

        debug_assert!(self.cursor.x < self.max.x);
        self.cursor.x += 1;
        if self.cursor.x >= self.max.x {
            self.cursor.x = self.min_x;
            self.cursor.y += 1;
        }

        Some(ret)
    }
}

impl ExactSizeIterator for InternalPoints {
    fn len(&self) -> usize {
        if self.cursor.y >= self.max.y {
            0
        } else {
            let whole_rows = (self.max.y - self.cursor.y - 1) * (self.max.x - self.min_x);
            let current_row = self.max.x - self.cursor.x;
            (whole_rows + current_row) as usize
        }
    }
}

impl FusedIterator for InternalPoints {}

/// Iterator over (mostly) square blocks within a rectangular box in spiral order.
#[derive(Copy, Clone, Debug)]
pub struct SpiralChunks {
    block: ScreenBlock,

    chunk_size: u32,
    /// Block size in whole chunks.
    size: ChunkVector,
    cursor: ChunkPoint,
    direction: ChunkVector,

    segment: u32,
    segment_remaining: i32,
    remaining: u32,
}

impl SpiralChunks {
    /// Constructs an iterator that returns no blocks.
    fn empty() -> SpiralChunks {
        SpiralChunks {
            block: ScreenBlock::new(ScreenPoint::origin(), ScreenPoint::origin()),

            chunk_size: 0,
            size: ChunkVector::zeros(),
            cursor: ChunkPoint::origin(),
            direction: ChunkVector::new(1, 0),

            segment: 0,
            segment_remaining: 0,
            remaining: 0,
        }
    }

    /// Moves to next segment of the spiral (turns 90 degrees and calculates new segment length).
    fn next_segment(&mut self) {
        self.direction = ChunkVector::new(self.direction.y, -self.direction.x);
        self.segment += 1;
        self.segment_remaining = (self.segment / 2) as i32;
    }

    fn cursor_in_range(&self, cursor: &ChunkPoint) -> bool {
        (0..self.size.x).contains(&cursor.x) && (0..self.size.y).contains(&cursor.y)
    }

    /// Returns a new screen block that corresponds to the current iterator position.
    fn current_block(&self) -> ScreenBlock {
        let min = ScreenPoint::new(
            self.block.min.x + self.cursor.x as u32 * self.chunk_size,
            self.block.min.y + self.cursor.y as u32 * self.chunk_size,
        );
        let ret = ScreenBlock {
            min,
            max: ScreenPoint::new(
                cmp::min(self.block.max.x, min.x + self.chunk_size),
                cmp::min(self.block.max.y, min.y + self.chunk_size),
            ),
        };
        debug_assert!(self.block.contains_block(&ret));
        debug_assert!(!ret.is_empty());
        ret
    }
}

impl Iterator for SpiralChunks {
    type Item = ScreenBlock;

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let ret = self.current_block();

        if self.segment_remaining == 0 {
            self.next_segment();
        }

        let new_cursor = self.cursor + self.direction;
        self.segment_remaining -= 1;

        if self.cursor_in_range(&new_cursor) {
            // We're inside boundaries and can continue
            self.cursor = new_cursor;
        } else {
            // Got outside of the area.
            // In this case we don't move the cursor and instead turn to a new
            // segment immediately.
            self.next_segment();

            // Then we skip the whole next segment (it would be outside the area anyway)
            self.cursor += self.direction * self.segment_remaining;

            // And finally we turn to the next segment which is inside the area.
            // Note that segment_remaining for this one is wrong (since we skipped
            // its part outside of the screen), but we will terminate through this
            // branch of the iterator again, so it's not a problem and we don't
            // need to fix it.
            self.next_segment();
        }

        self.remaining -= 1;

        Some(ret)
    }
}

impl ExactSizeIterator for SpiralChunks {
    fn len(&self) -> usize {
        self.remaining as usize
    }
}

impl FusedIterator for SpiralChunks {}
