//! Deterministic fixed-point math.
//!
//! All simulation state is expressed in [`Fp`] (`I32F32`) and [`FpVec2`].
//! Nothing here touches the platform float unit once values are inside the
//! simulation: square roots run on the raw integer bits and trigonometry uses
//! CORDIC iterations in degrees, so every peer computes the same bits.
//!
//! Floats only appear at the edges: [`serde_fp`] converts authored decimal
//! numbers when data files are loaded, and [`Fp::to_num`] is used for logs.

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Simulation scalar: 32 integer bits, 32 fractional bits.
pub type Fp = fixed::types::I32F32;

const FRAC_BITS: u32 = 32;

/// Integer to [`Fp`] usable in `const` contexts.
pub const fn fp(v: i32) -> Fp {
    Fp::from_bits((v as i64) << FRAC_BITS)
}

/// `num / den` as [`Fp`], usable in `const` contexts.
pub const fn fp_ratio(num: i32, den: i32) -> Fp {
    Fp::from_bits(((num as i64) << FRAC_BITS) / den as i64)
}

/// Clamp into `[0, 1]`.
pub fn clamp01(v: Fp) -> Fp {
    v.clamp(Fp::ZERO, Fp::ONE)
}

/// Sign as -1, 0 or 1.
pub fn sign(v: Fp) -> Fp {
    if v > Fp::ZERO {
        Fp::ONE
    } else if v < Fp::ZERO {
        -Fp::ONE
    } else {
        Fp::ZERO
    }
}

// ==================== SQUARE ROOT ====================

fn isqrt_u128(n: u128) -> u128 {
    let mut rem = n;
    let mut res: u128 = 0;
    let mut bit: u128 = 1 << 126;
    while bit > n {
        bit >>= 2;
    }
    while bit != 0 {
        if rem >= res + bit {
            rem -= res + bit;
            res = (res >> 1) + bit;
        } else {
            res >>= 1;
        }
        bit >>= 2;
    }
    res
}

/// Square root on the raw bits. Negative input yields zero.
pub fn sqrt(v: Fp) -> Fp {
    let bits = v.to_bits();
    if bits <= 0 {
        return Fp::ZERO;
    }
    let root = isqrt_u128((bits as u128) << FRAC_BITS);
    Fp::from_bits(root as i64)
}

// ==================== TRIGONOMETRY (DEGREES) ====================

/// atan(2^-i) in degrees, raw `I32F32` bits.
const CORDIC_ATAN_DEG: [i64; 32] = [
    193273528320,
    114096026022,
    60285206653,
    30601712202,
    15360239180,
    7687607525,
    3844741810,
    1922488225,
    961258780,
    480631223,
    240315841,
    120157949,
    60078978,
    30039490,
    15019745,
    7509872,
    3754936,
    1877468,
    938734,
    469367,
    234684,
    117342,
    58671,
    29335,
    14668,
    7334,
    3667,
    1833,
    917,
    458,
    229,
    115,
];

/// Product of the CORDIC scale factors (~0.607253), raw bits.
const CORDIC_GAIN: i64 = 2608131496;

const DEG_90: i64 = 90 << FRAC_BITS;
const DEG_180: i64 = 180 << FRAC_BITS;
const DEG_360: i64 = 360 << FRAC_BITS;

/// Wrap an angle in degrees into `(-180, 180]`.
pub fn wrap_degrees(deg: Fp) -> Fp {
    let mut a = deg.to_bits() % DEG_360;
    if a > DEG_180 {
        a -= DEG_360;
    } else if a <= -DEG_180 {
        a += DEG_360;
    }
    Fp::from_bits(a)
}

/// Sine and cosine of an angle in degrees.
pub fn sin_cos_deg(deg: Fp) -> (Fp, Fp) {
    let mut z = wrap_degrees(deg).to_bits();
    // CORDIC converges for |z| <= ~99.8 degrees; fold the rest by a half turn.
    let mut flip = false;
    if z > DEG_90 {
        z -= DEG_180;
        flip = true;
    } else if z < -DEG_90 {
        z += DEG_180;
        flip = true;
    }

    let mut x = CORDIC_GAIN;
    let mut y: i64 = 0;
    for (i, step) in CORDIC_ATAN_DEG.iter().enumerate() {
        let (dx, dy) = (y >> i, x >> i);
        if z >= 0 {
            x -= dx;
            y += dy;
            z -= step;
        } else {
            x += dx;
            y -= dy;
            z += step;
        }
    }

    if flip {
        x = -x;
        y = -y;
    }
    (Fp::from_bits(y), Fp::from_bits(x))
}

/// Angle of `(x, y)` from the positive x axis in degrees, `(-180, 180]`.
pub fn atan2_deg(y: Fp, x: Fp) -> Fp {
    let (mut xb, mut yb) = (x.to_bits(), y.to_bits());
    match (xb.signum(), yb.signum()) {
        (0, 0) | (1, 0) => return Fp::ZERO,
        (-1, 0) => return Fp::from_bits(DEG_180),
        (0, 1) => return Fp::from_bits(DEG_90),
        (0, -1) => return Fp::from_bits(-DEG_90),
        _ => {}
    }

    let mut z: i64 = 0;
    if xb < 0 {
        z = if yb >= 0 { DEG_180 } else { -DEG_180 };
        xb = -xb;
        yb = -yb;
    }

    for (i, step) in CORDIC_ATAN_DEG.iter().enumerate() {
        let (dx, dy) = (yb >> i, xb >> i);
        if yb >= 0 {
            xb += dx;
            yb -= dy;
            z += step;
        } else {
            xb -= dx;
            yb += dy;
            z -= step;
        }
    }
    wrap_degrees(Fp::from_bits(z))
}

// ==================== VECTORS ====================

/// 2D fixed-point vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FpVec2 {
    pub x: Fp,
    pub y: Fp,
}

impl FpVec2 {
    pub const ZERO: FpVec2 = FpVec2 {
        x: Fp::ZERO,
        y: Fp::ZERO,
    };
    pub const UP: FpVec2 = FpVec2 {
        x: Fp::ZERO,
        y: Fp::ONE,
    };
    pub const DOWN: FpVec2 = FpVec2 {
        x: Fp::ZERO,
        y: fp(-1),
    };
    pub const RIGHT: FpVec2 = FpVec2 {
        x: Fp::ONE,
        y: Fp::ZERO,
    };
    pub const LEFT: FpVec2 = FpVec2 {
        x: fp(-1),
        y: Fp::ZERO,
    };

    pub const fn new(x: Fp, y: Fp) -> Self {
        FpVec2 { x, y }
    }

    /// Build from integers.
    pub const fn from_ints(x: i32, y: i32) -> Self {
        FpVec2 { x: fp(x), y: fp(y) }
    }

    pub fn dot(self, other: FpVec2) -> Fp {
        self.x * other.x + self.y * other.y
    }

    /// z component of the 3D cross product.
    pub fn cross(self, other: FpVec2) -> Fp {
        self.x * other.y - self.y * other.x
    }

    pub fn sqr_magnitude(self) -> Fp {
        self.dot(self)
    }

    pub fn magnitude(self) -> Fp {
        sqrt(self.sqr_magnitude())
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalized(self) -> FpVec2 {
        let mag = self.magnitude();
        if mag == Fp::ZERO {
            FpVec2::ZERO
        } else {
            FpVec2::new(self.x / mag, self.y / mag)
        }
    }

    pub fn distance(self, other: FpVec2) -> Fp {
        (self - other).magnitude()
    }

    pub fn distance_squared(self, other: FpVec2) -> Fp {
        (self - other).sqr_magnitude()
    }

    /// Rotate counter-clockwise by `deg` degrees.
    pub fn rotate_deg(self, deg: Fp) -> FpVec2 {
        let (s, c) = sin_cos_deg(deg);
        FpVec2::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    /// Rotate clockwise by a quarter turn.
    pub fn rotate_cw90(self) -> FpVec2 {
        FpVec2::new(self.y, -self.x)
    }

    /// Unsigned angle between two vectors in degrees, `[0, 180]`.
    pub fn angle_deg(self, other: FpVec2) -> Fp {
        atan2_deg(self.cross(other).abs(), self.dot(other))
    }

    /// Signed angle from `self` to `other` in degrees, counter-clockwise positive.
    pub fn signed_angle_deg(self, other: FpVec2) -> Fp {
        atan2_deg(self.cross(other), self.dot(other))
    }

    /// Same vector with its length capped at `max`.
    pub fn clamp_magnitude(self, max: Fp) -> FpVec2 {
        let mag = self.magnitude();
        if mag > max && mag > Fp::ZERO {
            self * (max / mag)
        } else {
            self
        }
    }
}

impl Add for FpVec2 {
    type Output = FpVec2;
    fn add(self, rhs: FpVec2) -> FpVec2 {
        FpVec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for FpVec2 {
    fn add_assign(&mut self, rhs: FpVec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for FpVec2 {
    type Output = FpVec2;
    fn sub(self, rhs: FpVec2) -> FpVec2 {
        FpVec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for FpVec2 {
    fn sub_assign(&mut self, rhs: FpVec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<Fp> for FpVec2 {
    type Output = FpVec2;
    fn mul(self, rhs: Fp) -> FpVec2 {
        FpVec2::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<Fp> for FpVec2 {
    fn mul_assign(&mut self, rhs: Fp) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Div<Fp> for FpVec2 {
    type Output = FpVec2;
    fn div(self, rhs: Fp) -> FpVec2 {
        FpVec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for FpVec2 {
    type Output = FpVec2;
    fn neg(self) -> FpVec2 {
        FpVec2::new(-self.x, -self.y)
    }
}

// ==================== AUTHORED DATA ====================

/// Serde adapters reading and writing [`Fp`] as plain decimal numbers.
///
/// Use with `#[serde(with = "crate::math::serde_fp")]` on data asset fields.
pub mod serde_fp {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{Fp, FpVec2};

    pub fn serialize<S: Serializer>(v: &Fp, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(v.to_num::<f64>())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Fp, D::Error> {
        let raw = f64::deserialize(d)?;
        Fp::checked_from_num(raw)
            .ok_or_else(|| D::Error::custom(format!("{raw} is outside the fixed-point range")))
    }

    /// `[x, y]` arrays for [`FpVec2`].
    pub mod vec {
        use serde::de::Error;
        use serde::ser::SerializeTuple;
        use serde::{Deserialize, Deserializer, Serializer};

        use super::{Fp, FpVec2};

        pub fn serialize<S: Serializer>(v: &FpVec2, s: S) -> Result<S::Ok, S::Error> {
            let mut t = s.serialize_tuple(2)?;
            t.serialize_element(&v.x.to_num::<f64>())?;
            t.serialize_element(&v.y.to_num::<f64>())?;
            t.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<FpVec2, D::Error> {
            let [x, y] = <[f64; 2]>::deserialize(d)?;
            match (Fp::checked_from_num(x), Fp::checked_from_num(y)) {
                (Some(x), Some(y)) => Ok(FpVec2::new(x, y)),
                _ => Err(D::Error::custom(format!(
                    "[{x}, {y}] is outside the fixed-point range"
                ))),
            }
        }
    }
}
