//! Shared test doubles: remote sources with scriptable availability
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use image::{DynamicImage, RgbImage};

use gallery_sync::errors::RemoteUnavailable;
use gallery_sync::remote::{
    LedgerSource, LikeAck, LikeAction, RawLedgerItem, RawSnapshotEntry, SnapshotSource,
};
use gallery_sync::session::SessionId;

/// Snapshot source returning a fixed list, or unavailable when `None`
pub struct StubSnapshot {
    pub entries: Option<Vec<RawSnapshotEntry>>,
}

impl StubSnapshot {
    pub fn offline() -> Self {
        Self { entries: None }
    }

    pub fn with(entries: Vec<RawSnapshotEntry>) -> Self {
        Self {
            entries: Some(entries),
        }
    }
}

#[async_trait]
impl SnapshotSource for StubSnapshot {
    async fn fetch(&self) -> Result<Vec<RawSnapshotEntry>, RemoteUnavailable> {
        self.entries
            .clone()
            .ok_or_else(|| RemoteUnavailable::new("snapshot", "offline"))
    }
}

/// Ledger source with a fixed item list and scriptable like acknowledgments
pub struct StubLedger {
    pub items: Option<Vec<RawLedgerItem>>,
    pub ack: Option<LikeAck>,
    pub pushes: Mutex<Vec<(u64, String, LikeAction)>>,
}

impl StubLedger {
    pub fn offline() -> Self {
        Self {
            items: None,
            ack: None,
            pushes: Mutex::new(Vec::new()),
        }
    }

    pub fn with(items: Vec<RawLedgerItem>) -> Self {
        Self {
            items: Some(items),
            ack: None,
            pushes: Mutex::new(Vec::new()),
        }
    }

    pub fn acking(mut self, ack: LikeAck) -> Self {
        self.ack = Some(ack);
        self
    }
}

#[async_trait]
impl LedgerSource for StubLedger {
    async fn fetch_items(&self) -> Result<Vec<RawLedgerItem>, RemoteUnavailable> {
        self.items
            .clone()
            .ok_or_else(|| RemoteUnavailable::new("ledger", "offline"))
    }

    async fn push_like(
        &self,
        item_number: u64,
        session: &SessionId,
        action: LikeAction,
    ) -> Result<LikeAck, RemoteUnavailable> {
        self.pushes
            .lock()
            .unwrap()
            .push((item_number, session.as_str().to_string(), action));
        self.ack
            .clone()
            .ok_or_else(|| RemoteUnavailable::new("ledger", "like endpoint offline"))
    }
}

pub fn ledger_item(number: u64, body: &str, created_at: DateTime<Utc>) -> RawLedgerItem {
    RawLedgerItem {
        number,
        body: body.to_string(),
        created_at,
    }
}

/// Deterministic in-memory PNG for submission tests
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * 7 + y * 3) % 256) as u8])
    });
    let mut bytes = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut bytes);
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, image::ImageFormat::Png)
        .unwrap();
    bytes
}
