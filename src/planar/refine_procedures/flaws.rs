use crate::elements::subsegment::Osub;
use crate::elements::triangle::Otri;
use crate::elements::vertex::VertexId;

use ordered_float::NotNan;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/**
 * An encroached subsegment awaiting a split. The endpoint snapshot
 * detects stale entries: a drained entry whose subsegment has died or
 * changed endpoints is discarded.
 */
#[derive(Clone, Copy, Debug)]
pub struct BadSubseg {
    pub handle: Osub,
    pub org: VertexId,
    pub dest: VertexId,
}

/**
 * A triangle that failed the quality test, keyed by the square of its
 * shortest edge. The handle is aligned on that edge and the corner
 * snapshot detects staleness.
 */
#[derive(Clone, Copy, Debug)]
pub struct BadTriangle {
    pub handle: Otri,
    pub key: f64,
    pub org: VertexId,
    pub dest: VertexId,
    pub apex: VertexId,
}

struct QueuedTriangle {
    key: NotNan<f64>,
    seq: u64,
    bad: BadTriangle,
}

impl PartialEq for QueuedTriangle {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.seq == other.seq
    }
}

impl Eq for QueuedTriangle {}

impl Ord for QueuedTriangle {
    /* reversed so the max-heap pops the smallest key, then the oldest
     * entry */
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTriangle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/**
 * The two flaw buffers of one refinement run: encroached subsegments
 * first-in-first-out, bad triangles ordered worst (shortest edge)
 * first.
 */
pub struct FlawBuffers {
    subsegs: VecDeque<BadSubseg>,
    triangles: BinaryHeap<QueuedTriangle>,
    seq: u64,
}

impl FlawBuffers {
    pub fn new() -> Self {
        Self {
            subsegs: VecDeque::new(),
            triangles: BinaryHeap::new(),
            seq: 0,
        }
    }

    pub fn enqueue_subseg(&mut self, bad: BadSubseg) {
        self.subsegs.push_back(bad);
    }

    pub fn dequeue_subseg(&mut self) -> Option<BadSubseg> {
        self.subsegs.pop_front()
    }

    pub fn has_subsegs(&self) -> bool {
        !self.subsegs.is_empty()
    }

    pub fn enqueue_triangle(&mut self, bad: BadTriangle) {
        let key = match NotNan::new(bad.key) {
            Ok(key) => key,
            Err(_) => return,
        };
        self.seq += 1;
        self.triangles.push(QueuedTriangle {
            key,
            seq: self.seq,
            bad,
        });
    }

    pub fn dequeue_triangle(&mut self) -> Option<BadTriangle> {
        self.triangles.pop().map(|queued| queued.bad)
    }

    pub fn has_triangles(&self) -> bool {
        !self.triangles.is_empty()
    }
}

#[cfg(test)]
mod subseg_queue {
    use super::*;

    fn bad(seg: usize, org: VertexId) -> BadSubseg {
        BadSubseg {
            handle: Osub::new(seg, 0),
            org,
            dest: org + 1,
        }
    }

    #[test]
    fn test_first_in_first_out() {
        let mut buffers = FlawBuffers::new();
        buffers.enqueue_subseg(bad(1, 10));
        buffers.enqueue_subseg(bad(2, 20));
        buffers.enqueue_subseg(bad(3, 30));

        assert_eq!(buffers.dequeue_subseg().unwrap().org, 10);
        assert_eq!(buffers.dequeue_subseg().unwrap().org, 20);
        assert_eq!(buffers.dequeue_subseg().unwrap().org, 30);
        assert!(buffers.dequeue_subseg().is_none());
    }
}

#[cfg(test)]
mod triangle_queue {
    use super::*;

    fn bad(tri: usize, key: f64) -> BadTriangle {
        BadTriangle {
            handle: Otri::new(tri, 0),
            key,
            org: 1,
            dest: 2,
            apex: 3,
        }
    }

    #[test]
    fn test_smallest_key_first() {
        let mut buffers = FlawBuffers::new();
        buffers.enqueue_triangle(bad(1, 4.0));
        buffers.enqueue_triangle(bad(2, 0.25));
        buffers.enqueue_triangle(bad(3, 1.0));

        assert_eq!(buffers.dequeue_triangle().unwrap().handle.tri, 2);
        assert_eq!(buffers.dequeue_triangle().unwrap().handle.tri, 3);
        assert_eq!(buffers.dequeue_triangle().unwrap().handle.tri, 1);
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let mut buffers = FlawBuffers::new();
        buffers.enqueue_triangle(bad(7, 1.0));
        buffers.enqueue_triangle(bad(8, 1.0));
        buffers.enqueue_triangle(bad(9, 1.0));

        assert_eq!(buffers.dequeue_triangle().unwrap().handle.tri, 7);
        assert_eq!(buffers.dequeue_triangle().unwrap().handle.tri, 8);
        assert_eq!(buffers.dequeue_triangle().unwrap().handle.tri, 9);
    }

    #[test]
    fn test_reenqueue_after_dequeue() {
        let mut buffers = FlawBuffers::new();
        buffers.enqueue_triangle(bad(1, 2.0));
        buffers.enqueue_triangle(bad(2, 1.0));

        let first = buffers.dequeue_triangle().unwrap();
        assert_eq!(first.handle.tri, 2);
        buffers.enqueue_triangle(first);
        assert_eq!(buffers.dequeue_triangle().unwrap().handle.tri, 2);
    }
}
