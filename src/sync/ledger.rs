//! Defensive parser for ledger item bodies
//!
//! A ledger item body is semi-structured text with labeled fields:
//!
//! ```text
//! Type: photo
//! Nom: Camille
//! Description: Coucher de soleil sur la grande scene
//! Image: https://example.org/full.jpg
//! Likes: 3
//! LikedBy: a,b,c
//! ```
//!
//! or, for a testimonial, `Témoignage:` instead of `Description:`/`Image:`.
//! The labeled-field convention is preserved for backward parse
//! compatibility. Parsing is a pure function: an item without a recognizable
//! content type (or a photo without an image reference) is an error the
//! synchronizer turns into a skip, and a malformed like count defaults to 0.

use tracing::trace;

use crate::errors::ParseError;
use crate::models::{
    ContributionEntry, ContributionKind, Moderation, ModerationStatus, Origin,
};
use crate::remote::RawLedgerItem;

/// Prefix of ids derived from ledger item numbers
pub const LEDGER_ID_PREFIX: &str = "ledger-";

/// Derive the deterministic local id for a ledger item
pub fn ledger_entry_id(item_number: u64) -> String {
    format!("{LEDGER_ID_PREFIX}{item_number}")
}

/// Recover the ledger item number from a derived id, if it is one
pub fn ledger_item_number(id: &str) -> Option<u64> {
    id.strip_prefix(LEDGER_ID_PREFIX)?.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerContentType {
    Photo,
    Testimonial,
}

/// Fields recovered from one ledger item body
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerFields {
    pub content_type: LedgerContentType,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub testimonial: Option<String>,
    pub image_ref: Option<String>,
    pub like_count: u32,
    pub liked_by: Vec<String>,
    pub status: ModerationStatus,
}

/// Parse a labeled-field body. Pure; unknown labels are ignored.
pub fn parse_ledger_body(body: &str) -> Result<LedgerFields, ParseError> {
    let mut content_type = None;
    let mut display_name = None;
    let mut description = None;
    let mut testimonial = None;
    let mut image_ref = None;
    let mut like_count = 0u32;
    let mut liked_by = Vec::new();
    let mut status = ModerationStatus::Pending;

    for line in body.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match label.trim() {
            "Type" => {
                content_type = match value.to_lowercase().as_str() {
                    "photo" => Some(LedgerContentType::Photo),
                    "témoignage" | "temoignage" | "testimonial" => {
                        Some(LedgerContentType::Testimonial)
                    }
                    other => {
                        trace!("Unrecognized ledger content type '{}'", other);
                        None
                    }
                }
            }
            "Nom" if !value.is_empty() => display_name = Some(value.to_string()),
            "Description" if !value.is_empty() => description = Some(value.to_string()),
            "Témoignage" | "Temoignage" if !value.is_empty() => {
                testimonial = Some(value.to_string())
            }
            "Image" if !value.is_empty() => image_ref = Some(value.to_string()),
            "Likes" => like_count = value.parse().unwrap_or(0),
            "LikedBy" => {
                liked_by = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            "Statut" => {
                status = match value.to_lowercase().as_str() {
                    "approuvé" | "approuve" | "approved" => ModerationStatus::Approved,
                    "rejeté" | "rejete" | "rejected" => ModerationStatus::Rejected,
                    _ => ModerationStatus::Pending,
                }
            }
            _ => {}
        }
    }

    let content_type = content_type.ok_or(ParseError::MissingContentType)?;
    if content_type == LedgerContentType::Photo && image_ref.is_none() {
        return Err(ParseError::MissingImageRef);
    }

    Ok(LedgerFields {
        content_type,
        display_name,
        description,
        testimonial,
        image_ref,
        like_count,
        liked_by,
        status,
    })
}

/// Turn one raw ledger item into a contribution entry
pub fn entry_from_ledger_item(item: &RawLedgerItem) -> Result<ContributionEntry, ParseError> {
    let fields = parse_ledger_body(&item.body)?;

    let kind = match fields.content_type {
        LedgerContentType::Photo => ContributionKind::Photo {
            // checked by the parser
            image_ref: fields.image_ref.unwrap_or_default(),
            thumbnail_ref: None,
            description: fields.description,
        },
        LedgerContentType::Testimonial => ContributionKind::Testimonial {
            content: fields.testimonial.unwrap_or_default(),
        },
    };

    Ok(ContributionEntry {
        id: ledger_entry_id(item.number),
        kind,
        display_name: fields
            .display_name
            .unwrap_or_else(|| crate::config::defaults::DEFAULT_DISPLAY_NAME.to_string()),
        created_at: item.created_at,
        moderation: Moderation {
            status: fields.status,
            moderated_at: None,
        },
        like_count: fields.like_count,
        liked_by_session_ids: fields.liked_by.into_iter().collect(),
        context: None,
        origin: Origin::RemoteLedger,
    })
}
