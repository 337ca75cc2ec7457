//! Input validation utilities.
//!
//! Phototype observations are coded on fixed, non-contiguous scales. Each field is checked
//! against its own set of valid codes in a fixed order, and the first failure is reported.

use crate::records::PhototypeScores;
use crate::{IntakeError, IntakeResult};

/// One of the seven coded phototype observations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhototypeField {
    SkinColor,
    EyeColor,
    HairColor,
    FreckleQuantity,
    SunReaction,
    Tanning,
    SunSensitivity,
}

impl PhototypeField {
    /// Fields in the order they are validated.
    pub const VALIDATION_ORDER: [PhototypeField; 7] = [
        PhototypeField::SkinColor,
        PhototypeField::EyeColor,
        PhototypeField::HairColor,
        PhototypeField::FreckleQuantity,
        PhototypeField::SunReaction,
        PhototypeField::Tanning,
        PhototypeField::SunSensitivity,
    ];

    /// Name of the field on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            PhototypeField::SkinColor => "cor_pele",
            PhototypeField::EyeColor => "cor_olhos",
            PhototypeField::HairColor => "cor_cabelo",
            PhototypeField::FreckleQuantity => "quantidade_sardas",
            PhototypeField::SunReaction => "reacao_sol",
            PhototypeField::Tanning => "bronzeamento",
            PhototypeField::SunSensitivity => "sensibilidade_solar",
        }
    }

    pub fn valid_codes(&self) -> &'static [i64] {
        match self {
            PhototypeField::SkinColor => &[0, 2, 4, 8, 12, 16, 20],
            PhototypeField::EyeColor => &[0, 1, 2, 3, 4],
            PhototypeField::HairColor => &[0, 1, 2, 3, 4],
            PhototypeField::FreckleQuantity => &[0, 1, 2, 3],
            PhototypeField::SunReaction => &[0, 2, 4, 6, 8],
            PhototypeField::Tanning => &[0, 2, 4, 6],
            PhototypeField::SunSensitivity => &[0, 1, 2, 3, 4],
        }
    }

    pub fn accepts(&self, code: i64) -> bool {
        self.valid_codes().contains(&code)
    }

    pub fn read(&self, scores: &PhototypeScores) -> i64 {
        match self {
            PhototypeField::SkinColor => scores.skin_color,
            PhototypeField::EyeColor => scores.eye_color,
            PhototypeField::HairColor => scores.hair_color,
            PhototypeField::FreckleQuantity => scores.freckle_quantity,
            PhototypeField::SunReaction => scores.sun_reaction,
            PhototypeField::Tanning => scores.tanning,
            PhototypeField::SunSensitivity => scores.sun_sensitivity,
        }
    }
}

impl std::fmt::Display for PhototypeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Validates every phototype observation against its code set.
///
/// # Errors
///
/// Returns [`IntakeError::InvalidFieldValue`] naming the first field, in
/// [`PhototypeField::VALIDATION_ORDER`], whose value is outside its code set.
pub fn validate_phototype(scores: &PhototypeScores) -> IntakeResult<()> {
    for field in PhototypeField::VALIDATION_ORDER {
        let value = field.read(scores);
        if !field.accepts(value) {
            return Err(IntakeError::InvalidFieldValue { field, value });
        }
    }
    Ok(())
}
