//! Index compliance test helpers.
//!
//! These functions verify invariants every [`SpatialIndex`] configuration
//! must satisfy, by exhaustively enumerating the cells of a shallow index.
//! Reused across the edge-policy test cases.

use crate::index::SpatialIndex;
use crate::partition::Partition;
use indexmap::IndexSet;

/// Every cell of the index, rows-major.
pub fn all_cells(index: &SpatialIndex) -> Vec<Partition> {
    let len = index.cells_per_axis();
    let mut cells = Vec::with_capacity((len * len) as usize);
    for rows in 0..len {
        for cols in 0..len {
            if let Some(p) = Partition::from_parts(rows, cols, index.depth()) {
                cells.push(p);
            }
        }
    }
    cells
}

/// Assert that every cell survives `encoded` then `from_encoded`.
pub fn assert_encoding_roundtrip(index: &SpatialIndex) {
    for p in all_cells(index) {
        let back = index
            .from_encoded(&p.encoded())
            .expect("encoded cell should parse");
        assert_eq!(back, p, "roundtrip changed {p:?}");
    }
}

/// Assert that each cell's centre encodes back to that cell.
pub fn assert_centre_encodes_to_cell(index: &SpatialIndex) {
    for p in all_cells(index) {
        let (lat, long) = p.bounds(&index.config().bounds).center();
        let q = index
            .from_coordinates(lat, long)
            .expect("cell centre is in range");
        assert_eq!(q, p, "centre ({lat}, {long}) of {p:?} encoded as {q:?}");
    }
}

/// Assert that `b in neighbours(a)` implies `a in neighbours(b)`.
pub fn assert_neighbours_symmetric(index: &SpatialIndex) {
    for a in all_cells(index) {
        for b in index.neighbours(&a) {
            assert!(
                index.neighbours(&b).contains(&a),
                "neighbour symmetry violated: {b:?} in N({a:?}) but {a:?} not in N({b:?})"
            );
        }
    }
}

/// Assert that `nearby(p, 1)` is exactly `p` plus its neighbours.
pub fn assert_nearby_one_is_neighbourhood(index: &SpatialIndex) {
    for p in all_cells(index) {
        let mut expected: IndexSet<Partition> = index.neighbours(&p).into_iter().collect();
        expected.insert(p.clone());
        let got = index.nearby(&p, 1);
        assert_eq!(got.len(), expected.len(), "nearby({p:?}, 1) size");
        assert!(expected.iter().all(|q| got.contains(q)), "nearby({p:?}, 1) members");
    }
}

/// Assert that two `nearby` calls agree as sets.
pub fn assert_nearby_deterministic(index: &SpatialIndex) {
    for p in all_cells(index) {
        let a = index.nearby(&p, 2);
        let b = index.nearby(&p, 2);
        assert_eq!(a, b, "nearby({p:?}, 2) is non-deterministic");
    }
}

/// Run all compliance checks on an index.
pub fn run_full_compliance(index: &SpatialIndex) {
    assert_encoding_roundtrip(index);
    assert_centre_encodes_to_cell(index);
    assert_neighbours_symmetric(index);
    assert_nearby_one_is_neighbourhood(index);
    assert_nearby_deterministic(index);
}
