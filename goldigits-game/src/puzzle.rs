//! Puzzle instances and upstream payload decoding.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use thiserror::Error;

use crate::QuestionSource;
use crate::constants::{FALLBACK_DIGIT, FALLBACK_IMAGE_HANDLE, MAX_DIGIT};

/// One image-and-digit question instance. Immutable; discarded once answered
/// or the session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: String,
    pub image_handle: String,
    pub correct_digit: u8,
}

impl Puzzle {
    /// The fixed puzzle substituted when the provider fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            id: "fallback".to_string(),
            image_handle: FALLBACK_IMAGE_HANDLE.to_string(),
            correct_digit: FALLBACK_DIGIT,
        }
    }
}

/// Errors raised while decoding a provider payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("empty response from puzzle provider")]
    Empty,
    #[error("invalid payload format: missing image or answer")]
    MissingField,
    #[error("invalid answer value: {0}")]
    BadDigit(String),
}

/// Decode the provider's CSV payload (`<image-base64>,<answer>`) into a
/// puzzle, validating the answer digit.
///
/// # Errors
///
/// Returns a `PayloadError` when the payload is empty, malformed, or carries
/// an answer outside 0..=9.
pub fn decode_csv_payload(payload: &str, id: impl Into<String>) -> Result<Puzzle, PayloadError> {
    if payload.trim().is_empty() {
        return Err(PayloadError::Empty);
    }
    let Some((image, answer)) = payload.split_once(',') else {
        return Err(PayloadError::MissingField);
    };
    if image.is_empty() || answer.trim().is_empty() {
        return Err(PayloadError::MissingField);
    }
    let digit: u8 = answer
        .trim()
        .parse()
        .map_err(|_| PayloadError::BadDigit(answer.trim().to_string()))?;
    if digit > MAX_DIGIT {
        return Err(PayloadError::BadDigit(answer.trim().to_string()));
    }
    Ok(Puzzle {
        id: id.into(),
        image_handle: format!("data:image/png;base64,{image}"),
        correct_digit: digit,
    })
}

/// Source that always serves one fixed puzzle (useful for tests).
#[derive(Debug, Clone)]
pub struct FixedSource {
    puzzle: Puzzle,
}

impl FixedSource {
    #[must_use]
    pub const fn new(puzzle: Puzzle) -> Self {
        Self { puzzle }
    }
}

impl QuestionSource for FixedSource {
    type Error = Infallible;

    fn fetch(&self) -> Result<Puzzle, Self::Error> {
        Ok(self.puzzle.clone())
    }
}

/// Combinator that swallows provider failures by substituting the fixed
/// fallback puzzle, per the provider contract.
#[derive(Debug, Clone)]
pub struct WithFallback<Q> {
    inner: Q,
}

impl<Q> WithFallback<Q> {
    #[must_use]
    pub const fn new(inner: Q) -> Self {
        Self { inner }
    }
}

impl<Q: QuestionSource> QuestionSource for WithFallback<Q> {
    type Error = Infallible;

    fn fetch(&self) -> Result<Puzzle, Self::Error> {
        match self.inner.fetch() {
            Ok(puzzle) => Ok(puzzle),
            Err(err) => {
                log::warn!("puzzle provider failed, serving fallback: {err}");
                Ok(Puzzle::fallback())
            }
        }
    }
}
