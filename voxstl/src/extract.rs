//! Surface extraction from layer rasters.
//!
//! Each extractor walks one layer (or the pair of layers around a
//! separating plane for [`add_z`]) and appends a facet pair for every
//! unit voxel face that borders an off region, including the outside of
//! the bounding box. Shared faces between two on voxels are never
//! emitted, so the union of all extractor outputs is exactly the
//! boundary of the voxel union.
//!
//! The pixel at (x, y) of layer z stands for the voxel spanning
//! (x..x+1, y..y+1, z..z+1). All facets lie on integer lattice planes
//! and their vertices are wound so the right-hand rule reproduces the
//! stored normal.

use tracing::warn;

use crate::{
    buffer::TriangleBuffer,
    layer::Layer,
    point::Point,
    triangle::{Normal, Triangle},
    Error, Result,
};

/// Longest horizontal run merged into a single cap rectangle.
const MAX_RUN: usize = 11;

/// Chop a raster row into runs of on pixels, each at most [`MAX_RUN`]
/// wide. Yields half-open column ranges, left to right.
///
/// A run also closes at the end of the row, even when it only started
/// there, so a lone on pixel in the last column still gets its facets.
fn runs(row: &[u8]) -> impl Iterator<Item = (u32, u32)> + '_ {
    let mut x = 0;

    std::iter::from_fn(move || {
        while x < row.len() && row[x] == 0 {
            x += 1;
        }
        if x == row.len() {
            return None;
        }

        let start = x;
        while x < row.len() && row[x] != 0 && x - start < MAX_RUN {
            x += 1;
        }
        Some((start as u32, x as u32))
    })
}

/// Report pixel values that are neither 0 nor 0xff. They still count
/// as on everywhere, the warning only makes the bad input visible.
fn warn_anomalies(layer: &Layer, y: u32, z: u32) {
    for (x, &value) in layer.row(y).iter().enumerate() {
        if value != 0x00 && value != 0xff {
            warn!(x, y, z, value, "anomalous pixel value, treating as on");
        }
    }
}

/// Two front facing triangles covering the unit square at column x on
/// the plane y = yy.
fn front_face(buf: &mut TriangleBuffer, x: u32, yy: u32, z: u32) {
    buf.ensure(buf.len() + 2);
    buf.push(Triangle::new(
        Normal::Front,
        Point::pack(x, yy, z + 1),
        Point::pack(x, yy, z),
        Point::pack(x + 1, yy, z),
    ));
    buf.push(Triangle::new(
        Normal::Front,
        Point::pack(x, yy, z + 1),
        Point::pack(x + 1, yy, z),
        Point::pack(x + 1, yy, z + 1),
    ));
}

fn back_face(buf: &mut TriangleBuffer, x: u32, yy: u32, z: u32) {
    buf.ensure(buf.len() + 2);
    buf.push(Triangle::new(
        Normal::Back,
        Point::pack(x, yy, z),
        Point::pack(x, yy, z + 1),
        Point::pack(x + 1, yy, z),
    ));
    buf.push(Triangle::new(
        Normal::Back,
        Point::pack(x, yy, z + 1),
        Point::pack(x + 1, yy, z + 1),
        Point::pack(x + 1, yy, z),
    ));
}

/// Two left facing triangles covering the unit square at row y on the
/// plane x = xx.
fn left_face(buf: &mut TriangleBuffer, xx: u32, y: u32, z: u32) {
    buf.ensure(buf.len() + 2);
    buf.push(Triangle::new(
        Normal::Left,
        Point::pack(xx, y, z),
        Point::pack(xx, y, z + 1),
        Point::pack(xx, y + 1, z),
    ));
    buf.push(Triangle::new(
        Normal::Left,
        Point::pack(xx, y, z + 1),
        Point::pack(xx, y + 1, z + 1),
        Point::pack(xx, y + 1, z),
    ));
}

fn right_face(buf: &mut TriangleBuffer, xx: u32, y: u32, z: u32) {
    buf.ensure(buf.len() + 2);
    buf.push(Triangle::new(
        Normal::Right,
        Point::pack(xx, y, z),
        Point::pack(xx, y + 1, z),
        Point::pack(xx, y, z + 1),
    ));
    buf.push(Triangle::new(
        Normal::Right,
        Point::pack(xx, y, z + 1),
        Point::pack(xx, y + 1, z),
        Point::pack(xx, y + 1, z + 1),
    ));
}

/// Two down facing triangles covering the unit square at (x, y) on the
/// plane z = zz.
fn down_face(buf: &mut TriangleBuffer, x: u32, y: u32, zz: u32) {
    buf.ensure(buf.len() + 2);
    buf.push(Triangle::new(
        Normal::Down,
        Point::pack(x, y, zz),
        Point::pack(x, y + 1, zz),
        Point::pack(x + 1, y, zz),
    ));
    buf.push(Triangle::new(
        Normal::Down,
        Point::pack(x, y + 1, zz),
        Point::pack(x + 1, y + 1, zz),
        Point::pack(x + 1, y, zz),
    ));
}

fn up_face(buf: &mut TriangleBuffer, x: u32, y: u32, zz: u32) {
    buf.ensure(buf.len() + 2);
    buf.push(Triangle::new(
        Normal::Up,
        Point::pack(x, y + 1, zz),
        Point::pack(x, y, zz),
        Point::pack(x + 1, y, zz),
    ));
    buf.push(Triangle::new(
        Normal::Up,
        Point::pack(x, y + 1, zz),
        Point::pack(x + 1, y, zz),
        Point::pack(x + 1, y + 1, zz),
    ));
}

/// Bottom cap of the first layer: down facing facets on the plane z.
///
/// Runs of on pixels are merged into rectangles (see [`runs`]), so a
/// filled row costs one facet pair per 11 voxels instead of one per
/// voxel. This is also where anomalous pixel values get reported.
pub fn add_bottom(buf: &mut TriangleBuffer, layer: &Layer, z: u32) {
    for y in 0..layer.height() {
        warn_anomalies(layer, y, z);

        for (sx, ex) in runs(layer.row(y)) {
            buf.ensure(buf.len() + 2);
            buf.push(Triangle::new(
                Normal::Down,
                Point::pack(sx, y, z),
                Point::pack(sx, y + 1, z),
                Point::pack(ex, y, z),
            ));
            buf.push(Triangle::new(
                Normal::Down,
                Point::pack(sx, y + 1, z),
                Point::pack(ex, y + 1, z),
                Point::pack(ex, y, z),
            ));
        }
    }
}

/// Top cap of the last layer: up facing facets on the plane z + 1,
/// with the same run merging as [`add_bottom`].
pub fn add_top(buf: &mut TriangleBuffer, layer: &Layer, z: u32) {
    for y in 0..layer.height() {
        for (sx, ex) in runs(layer.row(y)) {
            buf.ensure(buf.len() + 2);
            buf.push(Triangle::new(
                Normal::Up,
                Point::pack(sx, y, z + 1),
                Point::pack(ex, y, z + 1),
                Point::pack(sx, y + 1, z + 1),
            ));
            buf.push(Triangle::new(
                Normal::Up,
                Point::pack(sx, y + 1, z + 1),
                Point::pack(ex, y, z + 1),
                Point::pack(ex, y + 1, z + 1),
            ));
        }
    }
}

/// Outer front wall: every on pixel of row 0 gets a facet pair on the
/// plane y = 0.
pub fn add_front(buf: &mut TriangleBuffer, layer: &Layer, z: u32) {
    if layer.is_empty() {
        return;
    }
    for x in 0..layer.width() {
        if layer.on(x, 0) {
            front_face(buf, x, 0, z);
        }
    }
}

/// Outer back wall: every on pixel of row H - 1 gets a facet pair on
/// the plane y = H.
pub fn add_back(buf: &mut TriangleBuffer, layer: &Layer, z: u32) {
    if layer.is_empty() {
        return;
    }
    let h = layer.height();
    for x in 0..layer.width() {
        if layer.on(x, h - 1) {
            back_face(buf, x, h, z);
        }
    }
}

/// Outer left wall along column 0, on the plane x = 0.
pub fn add_left(buf: &mut TriangleBuffer, layer: &Layer, z: u32) {
    if layer.is_empty() {
        return;
    }
    for y in 0..layer.height() {
        if layer.on(0, y) {
            left_face(buf, 0, y, z);
        }
    }
}

/// Outer right wall along column W - 1, on the plane x = W.
pub fn add_right(buf: &mut TriangleBuffer, layer: &Layer, z: u32) {
    if layer.is_empty() {
        return;
    }
    let w = layer.width();
    for y in 0..layer.height() {
        if layer.on(w - 1, y) {
            right_face(buf, w, y, z);
        }
    }
}

/// Inner walls between adjacent rows: wherever presence flips across
/// the plane y, the filled side gets a facet pair facing the empty one.
pub fn add_x(buf: &mut TriangleBuffer, layer: &Layer, z: u32) {
    for y in 1..layer.height() {
        for x in 0..layer.width() {
            match (layer.on(x, y - 1), layer.on(x, y)) {
                (false, true) => front_face(buf, x, y, z),
                (true, false) => back_face(buf, x, y, z),
                _ => (),
            }
        }
    }
}

/// Inner walls between adjacent columns, the x counterpart of
/// [`add_x`].
pub fn add_y(buf: &mut TriangleBuffer, layer: &Layer, z: u32) {
    for x in 1..layer.width() {
        for y in 0..layer.height() {
            match (layer.on(x - 1, y), layer.on(x, y)) {
                (false, true) => left_face(buf, x, y, z),
                (true, false) => right_face(buf, x, y, z),
                _ => (),
            }
        }
    }
}

/// Facets on the separating plane z between two consecutive layers.
///
/// `below` is the layer covering z - 1..z, `above` the one covering
/// z..z + 1. Where only the upper voxel exists its bottom is emitted
/// facing down, where only the lower one exists its top is emitted
/// facing up. The two rasters must agree on their dimensions.
pub fn add_z(buf: &mut TriangleBuffer, below: &Layer, above: &Layer, z: u32) -> Result<()> {
    if below.dimensions() != above.dimensions() {
        return Err(Error::GeometryMismatch {
            expected: below.dimensions(),
            found: above.dimensions(),
        });
    }

    for y in 0..below.height() {
        for x in 0..below.width() {
            match (below.on(x, y), above.on(x, y)) {
                (false, true) => down_face(buf, x, y, z),
                (true, false) => up_face(buf, x, y, z),
                _ => (),
            }
        }
    }

    Ok(())
}
