//! Submission pipeline: quota, eviction, degradation, and rejection

mod common;

use std::sync::Arc;

use common::png_bytes;
use gallery_sync::config::{CacheConfig, Config, TranscodeConfig};
use gallery_sync::errors::SubmissionError;
use gallery_sync::models::{ContributionKind, ModerationStatus};
use gallery_sync::repositories::LocalContributionStore;
use gallery_sync::store::{KeyValueStore, MemoryStore};
use gallery_sync::submit::{NewContribution, NewContributionKind, SubmissionService};

fn photo(bytes: Vec<u8>, description: &str) -> NewContribution {
    NewContribution {
        kind: NewContributionKind::Photo {
            bytes,
            description: Some(description.to_string()),
        },
        display_name: Some("Camille".to_string()),
        context: None,
    }
}

#[tokio::test]
async fn submitted_testimonial_is_immediately_listed_as_pending() {
    let store = Arc::new(MemoryStore::new());
    let service = SubmissionService::new(store.clone(), &Config::default());

    let entry = service
        .submit(NewContribution {
            kind: NewContributionKind::Testimonial {
                content: "Quelle ambiance !".to_string(),
            },
            display_name: None,
            context: None,
        })
        .await
        .unwrap();

    assert_eq!(entry.moderation.status, ModerationStatus::Pending);

    let listed = LocalContributionStore::new(store).list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, entry.id);
}

#[tokio::test]
async fn submitted_photo_persists_image_and_thumbnail() {
    let store = Arc::new(MemoryStore::new());
    let service = SubmissionService::new(store.clone(), &Config::default());

    let entry = service.submit(photo(png_bytes(320, 200), "Sunset")).await.unwrap();

    let ContributionKind::Photo {
        image_ref,
        thumbnail_ref,
        description,
    } = &entry.kind
    else {
        panic!("expected a photo entry");
    };
    assert_eq!(description.as_deref(), Some("Sunset"));
    assert!(store.get(image_ref).await.unwrap().is_some());
    assert!(store
        .get(thumbnail_ref.as_ref().unwrap())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn undecodable_image_is_rejected_with_decode_error() {
    let store = Arc::new(MemoryStore::new());
    let service = SubmissionService::new(store.clone(), &Config::default());

    let err = service
        .submit(photo(b"ceci n'est pas une image".to_vec(), "?"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Decode { .. }));
    assert!(LocalContributionStore::new(store).list().await.is_empty());
}

#[tokio::test]
async fn nearly_full_store_evicts_oldest_images_first() {
    // fill the store to ~99.8% of the ceiling so any submission must evict
    let ceiling: u64 = 100_000;
    let store = Arc::new(MemoryStore::bounded(ceiling));
    let config = Config {
        cache: CacheConfig {
            quota_ceiling_bytes: ceiling,
            ..Default::default()
        },
        ..Default::default()
    };

    // six older cached images, timestamps t1 < ... < t6
    // accounted usage per record: 2 * (17 + 8300) = 16634, x6 = 99804
    let mut old_keys = Vec::new();
    for ts in 1..=6i64 {
        let key = format!("img/{}/ancienne", ts * 1_000);
        store.set(&key, &vec![7u8; 8_300]).await.unwrap();
        old_keys.push(key);
    }

    let service = SubmissionService::new(store.clone(), &config);
    let entry = service
        .submit(photo(png_bytes(640, 480), "Sunset"))
        .await
        .unwrap();

    // the new entry is first in the list and pending
    let listed = LocalContributionStore::new(store.clone()).list().await;
    assert_eq!(listed[0].id, entry.id);
    assert_eq!(listed[0].moderation.status, ModerationStatus::Pending);

    // eviction went oldest-first: whatever was deleted is a prefix of t1..t6
    let survivors: Vec<bool> = {
        let mut survivors = Vec::new();
        for key in &old_keys {
            survivors.push(store.get(key).await.unwrap().is_some());
        }
        survivors
    };
    assert!(survivors.contains(&false), "some eviction must have happened");
    let first_survivor = survivors.iter().position(|s| *s).unwrap_or(survivors.len());
    assert!(
        survivors[first_survivor..].iter().all(|s| *s),
        "evicted keys must be the oldest prefix, got {survivors:?}"
    );

    // and the new photo's records are present
    let ContributionKind::Photo { image_ref, .. } = &entry.kind else {
        panic!("expected a photo entry");
    };
    assert!(store.get(image_ref).await.unwrap().is_some());
}

#[tokio::test]
async fn testimonial_into_full_store_evicts_images_and_succeeds() {
    // fill the ceiling almost entirely with evictable cached images, then
    // submit a testimonial: the entry-document write must evict, not fail
    let ceiling: u64 = 2_000;
    let store = Arc::new(MemoryStore::bounded(ceiling));
    let config = Config {
        cache: CacheConfig {
            quota_ceiling_bytes: ceiling,
            ..Default::default()
        },
        ..Default::default()
    };

    // accounted usage per record: 2 * (17 + 225) = 484, x4 = 1936
    let mut old_keys = Vec::new();
    for ts in 1..=4i64 {
        let key = format!("img/{}/ancienne", ts * 1_000);
        store.set(&key, &vec![0u8; 225]).await.unwrap();
        old_keys.push(key);
    }

    let service = SubmissionService::new(store.clone(), &config);
    let entry = service
        .submit(NewContribution {
            kind: NewContributionKind::Testimonial {
                content: "temoignage ".repeat(10),
            },
            display_name: None,
            context: None,
        })
        .await
        .unwrap();

    let listed = LocalContributionStore::new(store.clone()).list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, entry.id);

    // eviction went oldest-first and left the newest seed in place
    assert_eq!(store.get(&old_keys[0]).await.unwrap(), None);
    assert!(store.get(&old_keys[3]).await.unwrap().is_some());
}

#[tokio::test]
async fn hopeless_quota_is_rejected_with_storage_exhausted_and_no_partial_writes() {
    // ceiling far too small for any encoded image, nothing to evict
    let ceiling: u64 = 600;
    let store = Arc::new(MemoryStore::bounded(ceiling));
    let config = Config {
        cache: CacheConfig {
            quota_ceiling_bytes: ceiling,
            ..Default::default()
        },
        transcode: TranscodeConfig {
            // force the ladder so the last-chance rung is exercised too
            soft_limit_bytes: 1,
            ..Default::default()
        },
    };

    let service = SubmissionService::new(store.clone(), &config);
    let err = service
        .submit(photo(png_bytes(800, 600), "trop gros"))
        .await
        .unwrap_err();

    assert!(matches!(err, SubmissionError::StorageExhausted { .. }));
    // nothing was left behind: no images, no entry
    assert_eq!(store.total_entries().await.unwrap(), 0);
}

#[tokio::test]
async fn quality_ladder_terminates_for_arbitrary_input_sizes() {
    let store = Arc::new(MemoryStore::new());
    let service = SubmissionService::new(store, &Config::default());

    // a large wall-clock input still resolves in one pass
    let entry = service
        .submit(photo(png_bytes(1600, 1200), "grande photo"))
        .await
        .unwrap();
    assert!(matches!(entry.kind, ContributionKind::Photo { .. }));
}
