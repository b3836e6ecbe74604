//! Rejection-sampling map from 32-bit words to die faces.
//!
//! There are 2^32 possible words and 6 faces. [`FAIRNESS_THRESHOLD`] is the largest
//! multiple of 6 not exceeding 2^32; every word at or above it is discarded and
//! redrawn, so each face is hit by exactly [`FACE_SPAN`] accepted words.

use crate::rng::WordSource;

/// Number of faces on a die.
pub const FACES: u32 = 6;

/// Largest multiple of 6 not exceeding 2^32. Words `>=` this value are redrawn.
pub const FAIRNESS_THRESHOLD: u32 = 4_294_967_292;

/// Number of accepted words mapping to each face (`FAIRNESS_THRESHOLD / 6`).
pub const FACE_SPAN: u32 = 715_827_882;

const _: () = assert!(FACE_SPAN * FACES == FAIRNESS_THRESHOLD);
const _: () = assert!(u32::MAX - FAIRNESS_THRESHOLD < FACES);

/// Maps an accepted word to a face in `1..=6`, or `None` if the word must be redrawn.
#[inline]
#[must_use]
pub const fn face_from_word(word: u32) -> Option<u32> {
    if word < FAIRNESS_THRESHOLD {
        Some(word / FACE_SPAN + 1)
    } else {
        None
    }
}

/// Draws words from `source` until one is accepted and returns its face.
pub fn draw_face<W: WordSource + ?Sized>(source: &mut W) -> u32 {
    loop {
        if let Some(face) = face_from_word(source.next_u32()) {
            return face;
        }
    }
}

/// Whether `value` is a legal die face.
#[inline]
#[must_use]
pub const fn is_face(value: u32) -> bool {
    value >= 1 && value <= FACES
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: accepted words land on the face whose span contains them.
        #[test]
        fn prop_face_matches_span(word in 0u32..FAIRNESS_THRESHOLD) {
            let face = face_from_word(word);
            prop_assert!(face.is_some());
            let face = face.unwrap_or_default();
            prop_assert!(is_face(face));
            prop_assert!(word >= (face - 1) * FACE_SPAN);
            prop_assert!(word < face * FACE_SPAN);
        }
    }
}
