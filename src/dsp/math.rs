//! Scalar helpers shared by every generator.

/*
Cheap Transcendentals
=====================

The oscillators run once per sample, so anything that can be approximated
with a handful of multiplies is.

Parabolic Sine
--------------

A sine over [-π, π] is close to two mirrored parabolas:

    y = B·x + C·x·|x|          B = 4/π, C = -4/π²

That alone is within ~5% of sin(x). One refinement pass brings the error
down to about 0.1%:

    y = P·(y·|y| - y) + y      P = 0.225

The input MUST already be in [-π, π]; callers map phase there first.


Pitch Offsets
-------------

Every exponential pitch input (FM, pitch bend, octave, semitone, cent) is
summed in semitones, then converted once:

    ratio = 2^(semitones / 12)

    +12 semitones -> 2.0 (octave up)
    -12 semitones -> 0.5 (octave down)


Concave Curve
-------------

The exponential LFO shape is a decaying concave curve:

    y = -5/12 · log10(x)

It is 1.0 at x = CONVEX_LIMIT (and below) and reaches 0.0 at x = 1.0.
*/

use std::f64::consts::PI;

const PARABOLIC_B: f64 = 4.0 / PI;
const PARABOLIC_C: f64 = -4.0 / (PI * PI);
const PARABOLIC_P: f64 = 0.225;

/// Input at or below which the concave curve is pinned to 1.0.
pub const CONVEX_LIMIT: f64 = 0.003_981_07;

/// Parabolic approximation of `sin(x)` for `x` in [-π, π].
#[inline]
pub fn parabolic_sine(x: f64) -> f64 {
    let y = PARABOLIC_B * x + PARABOLIC_C * x * x.abs();
    PARABOLIC_P * (y * y.abs() - y) + y
}

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f64) -> f64 {
    (bipolar + 1.0) * 0.5
}

/// Convert unipolar signal (0.0 to 1.0) to bipolar (-1.0 to +1.0).
#[inline]
pub fn unipolar_to_bipolar(unipolar: f64) -> f64 {
    (unipolar * 2.0) - 1.0
}

/// Frequency multiplier for a pitch offset in semitones.
#[inline]
pub fn pitch_shift_multiplier(semitones: f64) -> f64 {
    if semitones == 0.0 {
        return 1.0;
    }
    2.0_f64.powf(semitones / 12.0)
}

/// Decaying concave curve over [0, 1], used by the exponential LFO shape.
#[inline]
pub fn concave_inverted_transform(value: f64) -> f64 {
    if value <= CONVEX_LIMIT {
        return 1.0;
    }
    (-5.0 / 12.0) * value.log10()
}

/// Normalise any value into [0, 1). Non-finite input maps to 0.
#[inline]
pub fn wrap_unit(value: f64) -> f64 {
    let wrapped = value.rem_euclid(1.0);
    // rem_euclid rounds tiny negatives up to exactly 1.0; NaN fails the compare
    if wrapped < 1.0 {
        wrapped
    } else {
        0.0
    }
}
