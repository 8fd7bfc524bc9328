//! Collision shapes and pairwise narrow-phase tests.
//!
//! Capsules are vertical (a segment along the y axis swept by a radius) and
//! boxes are axis aligned. Circles are handled as capsules with a zero-length
//! segment, which keeps the number of pair routines small.
//!
//! Contact normals always point from the second shape towards the first, i.e.
//! the direction the first shape must move to get out.

use serde::{Deserialize, Serialize};

use crate::math::{Fp, FpVec2, serde_fp, sqrt};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape2D {
    Circle {
        #[serde(with = "serde_fp")]
        radius: Fp,
    },
    Box {
        #[serde(with = "serde_fp::vec")]
        half_extents: FpVec2,
    },
    Capsule {
        #[serde(with = "serde_fp")]
        radius: Fp,
        /// Half length of the inner segment, not counting the caps.
        #[serde(with = "serde_fp")]
        half_height: Fp,
    },
}

impl Default for Shape2D {
    fn default() -> Self {
        Shape2D::Circle { radius: Fp::ONE }
    }
}

/// Penetration of one shape into another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contact {
    pub normal: FpVec2,
    pub penetration: Fp,
}

/// Where a segment first enters a shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RayHit {
    /// Position along the segment in `[0, 1]`.
    pub fraction: Fp,
    pub point: FpVec2,
    pub normal: FpVec2,
}

impl Shape2D {
    pub fn circle(radius: Fp) -> Self {
        Shape2D::Circle { radius }
    }

    pub fn aabb(half_extents: FpVec2) -> Self {
        Shape2D::Box { half_extents }
    }

    /// Vertical capsule of total `height` (caps included).
    pub fn capsule(radius: Fp, height: Fp) -> Self {
        let half_height = (height / 2 - radius).max(Fp::ZERO);
        Shape2D::Capsule {
            radius,
            half_height,
        }
    }

    /// Radius used for distance falloff and swept-step sizing.
    pub fn radius(&self) -> Fp {
        match *self {
            Shape2D::Circle { radius } | Shape2D::Capsule { radius, .. } => radius,
            Shape2D::Box { half_extents } => half_extents.x.max(half_extents.y),
        }
    }

    /// Half size of the axis aligned bounds.
    pub fn extents(&self) -> FpVec2 {
        match *self {
            Shape2D::Circle { radius } => FpVec2::new(radius, radius),
            Shape2D::Box { half_extents } => half_extents,
            Shape2D::Capsule {
                radius,
                half_height,
            } => FpVec2::new(radius, half_height + radius),
        }
    }

    fn as_swept(&self) -> Option<(Fp, Fp)> {
        match *self {
            Shape2D::Circle { radius } => Some((radius, Fp::ZERO)),
            Shape2D::Capsule {
                radius,
                half_height,
            } => Some((radius, half_height)),
            Shape2D::Box { .. } => None,
        }
    }
}

fn bounds_overlap(a: FpVec2, ea: FpVec2, b: FpVec2, eb: FpVec2) -> bool {
    (a.x - b.x).abs() < ea.x + eb.x && (a.y - b.y).abs() < ea.y + eb.y
}

/// How far `a` at `pa` sinks into `b` at `pb`, if at all.
pub fn penetration(a: &Shape2D, pa: FpVec2, b: &Shape2D, pb: FpVec2) -> Option<Contact> {
    if !bounds_overlap(pa, a.extents(), pb, b.extents()) {
        return None;
    }
    match (a.as_swept(), b.as_swept()) {
        (Some((ra, ha)), Some((rb, hb))) => swept_vs_swept(pa, ra, ha, pb, rb, hb),
        (Some((ra, ha)), None) => swept_vs_box(pa, ra, ha, pb, b.extents()),
        (None, Some(_)) => penetration(b, pb, a, pa).map(|c| Contact {
            normal: -c.normal,
            penetration: c.penetration,
        }),
        (None, None) => box_vs_box(pa, a.extents(), pb, b.extents()),
    }
}

fn box_vs_box(pa: FpVec2, ea: FpVec2, pb: FpVec2, eb: FpVec2) -> Option<Contact> {
    let d = pa - pb;
    let ox = ea.x + eb.x - d.x.abs();
    let oy = ea.y + eb.y - d.y.abs();
    if ox <= Fp::ZERO || oy <= Fp::ZERO {
        return None;
    }
    if ox < oy {
        let nx = if d.x < Fp::ZERO { -Fp::ONE } else { Fp::ONE };
        Some(Contact {
            normal: FpVec2::new(nx, Fp::ZERO),
            penetration: ox,
        })
    } else {
        let ny = if d.y < Fp::ZERO { -Fp::ONE } else { Fp::ONE };
        Some(Contact {
            normal: FpVec2::new(Fp::ZERO, ny),
            penetration: oy,
        })
    }
}

fn swept_vs_swept(pa: FpVec2, ra: Fp, ha: Fp, pb: FpVec2, rb: Fp, hb: Fp) -> Option<Contact> {
    let (a0, a1) = (pa.y - ha, pa.y + ha);
    let (b0, b1) = (pb.y - hb, pb.y + hb);
    let dy = if a0 > b1 {
        a0 - b1
    } else if b0 > a1 {
        a1 - b0
    } else {
        Fp::ZERO
    };
    let d = FpVec2::new(pa.x - pb.x, dy);
    let reach = ra + rb;
    let dist = d.magnitude();
    if dist >= reach {
        return None;
    }
    let normal = if dist == Fp::ZERO {
        if pa.y < pb.y { FpVec2::DOWN } else { FpVec2::UP }
    } else {
        d / dist
    };
    Some(Contact {
        normal,
        penetration: reach - dist,
    })
}

fn swept_vs_box(pa: FpVec2, r: Fp, h: Fp, pb: FpVec2, e: FpVec2) -> Option<Contact> {
    let (min, max) = (pb - e, pb + e);
    let (s0, s1) = (pa.y - h, pa.y + h);

    let box_x = pa.x.clamp(min.x, max.x);
    let (seg_y, box_y) = if s0 > max.y {
        (s0, max.y)
    } else if s1 < min.y {
        (s1, min.y)
    } else {
        let y = pa.y.clamp(min.y.max(s0), max.y.min(s1));
        (y, y)
    };

    let d = FpVec2::new(pa.x - box_x, seg_y - box_y);
    if d != FpVec2::ZERO {
        let dist = d.magnitude();
        if dist >= r {
            return None;
        }
        return Some(Contact {
            normal: d / dist,
            penetration: r - dist,
        });
    }

    // Segment core touches the box: leave through the cheapest face.
    let faces = [
        (FpVec2::UP, max.y - (s0 - r)),
        (FpVec2::LEFT, (pa.x + r) - min.x),
        (FpVec2::RIGHT, max.x - (pa.x - r)),
        (FpVec2::DOWN, (s1 + r) - min.y),
    ];
    let mut best = faces[0];
    for face in &faces[1..] {
        if face.1 < best.1 {
            best = *face;
        }
    }
    Some(Contact {
        normal: best.0,
        penetration: best.1,
    })
}

// ==================== SEGMENT CASTS ====================

/// First point where the segment `from -> to` enters `shape` at `position`.
pub fn raycast(shape: &Shape2D, position: FpVec2, from: FpVec2, to: FpVec2) -> Option<RayHit> {
    let ext = shape.extents();
    let seg_center = FpVec2::new((from.x + to.x) / 2, (from.y + to.y) / 2);
    let seg_ext = FpVec2::new((to.x - from.x).abs() / 2, (to.y - from.y).abs() / 2);
    if (seg_center.x - position.x).abs() > ext.x + seg_ext.x
        || (seg_center.y - position.y).abs() > ext.y + seg_ext.y
    {
        return None;
    }

    match *shape {
        Shape2D::Circle { radius } => ray_circle(position, radius, from, to),
        Shape2D::Box { half_extents } => ray_box(position, half_extents, from, to),
        Shape2D::Capsule {
            radius,
            half_height,
        } => {
            let offset = FpVec2::new(Fp::ZERO, half_height);
            let candidates = [
                ray_box(position, FpVec2::new(radius, half_height), from, to),
                ray_circle(position + offset, radius, from, to),
                ray_circle(position - offset, radius, from, to),
            ];
            candidates
                .into_iter()
                .flatten()
                .min_by(|a, b| a.fraction.cmp(&b.fraction))
        }
    }
}

fn ray_circle(center: FpVec2, radius: Fp, from: FpVec2, to: FpVec2) -> Option<RayHit> {
    let d = to - from;
    let f = from - center;
    let c = f.sqr_magnitude() - radius * radius;
    if c <= Fp::ZERO {
        let normal = if f == FpVec2::ZERO {
            (-d).normalized()
        } else {
            f.normalized()
        };
        return Some(RayHit {
            fraction: Fp::ZERO,
            point: from,
            normal,
        });
    }
    let a = d.sqr_magnitude();
    if a == Fp::ZERO {
        return None;
    }
    let b = f.dot(d);
    let disc = b * b - a * c;
    if disc < Fp::ZERO {
        return None;
    }
    let t = (-b - sqrt(disc)) / a;
    if t < Fp::ZERO || t > Fp::ONE {
        return None;
    }
    let point = from + d * t;
    Some(RayHit {
        fraction: t,
        point,
        normal: (point - center).normalized(),
    })
}

fn ray_box(center: FpVec2, half: FpVec2, from: FpVec2, to: FpVec2) -> Option<RayHit> {
    let d = to - from;
    let (min, max) = (center - half, center + half);
    let mut t_enter = Fp::ZERO;
    let mut t_exit = Fp::ONE;
    let mut normal = FpVec2::ZERO;

    let axes = [
        (from.x, d.x, min.x, max.x, FpVec2::RIGHT),
        (from.y, d.y, min.y, max.y, FpVec2::UP),
    ];
    for (origin, dir, lo, hi, axis) in axes {
        if dir == Fp::ZERO {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }
        let mut t0 = (lo - origin).saturating_div(dir);
        let mut t1 = (hi - origin).saturating_div(dir);
        let mut face = -axis;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            face = axis;
        }
        if t0 > t_enter {
            t_enter = t0;
            normal = face;
        }
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    if normal == FpVec2::ZERO {
        // Started inside the box.
        normal = (-d).normalized();
    }
    Some(RayHit {
        fraction: t_enter,
        point: from + d * t_enter,
        normal,
    })
}
