//! Image transcoding with a quality ladder
//!
//! Converts an arbitrary input image into a size-bounded, quality-laddered
//! JPEG. The ladder only applies when the input exceeds the configured soft
//! limit; smaller inputs pass through untouched. When a persistence attempt
//! still fails after one eviction pass, the caller retries once at the
//! fixed last-chance rung before giving up. Pure local compute, no network.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

use crate::config::TranscodeConfig;
use crate::errors::{SubmissionError, SubmissionResult};

/// One (max-dimension, quality) pair of the ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityRung {
    pub max_dimension: u32,
    /// JPEG quality, 0-100
    pub quality: u8,
}

/// Fixed aggressive setting tried after one eviction pass has not freed
/// enough space
pub const LAST_CHANCE_RUNG: QualityRung = QualityRung {
    max_dimension: 400,
    quality: 30,
};

const MIB: u64 = 1024 * 1024;

/// A transcoded (or passed-through) image ready for persistence
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct ImageTranscoder {
    config: TranscodeConfig,
}

impl ImageTranscoder {
    pub fn new(config: TranscodeConfig) -> Self {
        Self { config }
    }

    /// Pick the ladder rung for an input of `input_len` bytes. `None` means
    /// the input is small enough to persist as-is.
    pub fn select_rung(&self, input_len: u64) -> Option<QualityRung> {
        if input_len <= self.config.soft_limit_bytes {
            return None;
        }
        Some(if input_len > 3 * MIB {
            QualityRung {
                max_dimension: 600,
                quality: 50,
            }
        } else if input_len > MIB {
            QualityRung {
                max_dimension: 800,
                quality: 60,
            }
        } else {
            QualityRung {
                max_dimension: 800,
                quality: 70,
            }
        })
    }

    /// Transcode `raw` down the ladder. Fails with a decode error if the
    /// bytes are not a readable image.
    pub async fn transcode(&self, raw: &[u8]) -> SubmissionResult<EncodedImage> {
        let img = decode(raw)?;
        match self.select_rung(raw.len() as u64) {
            None => Ok(EncodedImage {
                bytes: raw.to_vec(),
                width: img.width(),
                height: img.height(),
            }),
            Some(rung) => {
                debug!(
                    "Transcoding {} byte input at rung ({}px, q{})",
                    raw.len(),
                    rung.max_dimension,
                    rung.quality
                );
                encode_at(&img, rung)
            }
        }
    }

    /// Re-encode `raw` at a fixed rung, ignoring the soft limit. Used for
    /// the last-chance retry.
    pub async fn transcode_at(&self, raw: &[u8], rung: QualityRung) -> SubmissionResult<EncodedImage> {
        let img = decode(raw)?;
        encode_at(&img, rung)
    }

    /// Produce the bounded thumbnail stored alongside every photo
    pub async fn thumbnail(&self, raw: &[u8]) -> SubmissionResult<EncodedImage> {
        let img = decode(raw)?;
        encode_at(
            &img,
            QualityRung {
                max_dimension: self.config.thumbnail_max_dimension,
                quality: self.config.thumbnail_quality,
            },
        )
    }
}

fn decode(raw: &[u8]) -> SubmissionResult<DynamicImage> {
    image::load_from_memory(raw).map_err(|e| SubmissionError::decode(e.to_string()))
}

/// Scale preserving aspect ratio so neither dimension exceeds the rung's
/// bound, then re-encode as JPEG at the rung's quality.
fn encode_at(img: &DynamicImage, rung: QualityRung) -> SubmissionResult<EncodedImage> {
    let scaled = if img.width() > rung.max_dimension || img.height() > rung.max_dimension {
        img.resize(rung.max_dimension, rung.max_dimension, FilterType::Lanczos3)
    } else {
        img.clone()
    };

    // JPEG has no alpha channel
    let rgb = scaled.to_rgb8();
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, rung.quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| SubmissionError::decode(format!("re-encode failed: {e}")))?;

    Ok(EncodedImage {
        bytes,
        width: rgb.width(),
        height: rgb.height(),
    })
}
