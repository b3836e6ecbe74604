//! Integration tests for replaying dice from files on disk.

// Allow test-specific patterns that are appropriate for test code
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

#[path = "common/mod.rs"]
mod common;

use std::io::Write;
use std::sync::Arc;

use common::init_tracing;
use dice_engine::telemetry::{CollectingObserver, ViolationKind};
use dice_engine::{
    assert_no_violations, assert_violation, DiceContext, DiceContextBuilder, DiceError, SeedReport,
    Variant,
};
use tempfile::NamedTempFile;

fn dice_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn dice(ctx: &mut DiceContext, pairs: usize) -> Vec<u8> {
    (0..pairs).flat_map(|_| ctx.roll().unwrap().dice()).collect()
}

#[test]
fn test_file_is_replayed_and_rewound() {
    let _guard = init_tracing();
    let file = dice_file("3x9a5\n2");
    let mut ctx = DiceContext::new(Variant::Twister);
    ctx.open_dice_file(file.path()).unwrap();

    assert_eq!(ctx.active_variant(), Variant::FileReplay);
    assert_eq!(dice(&mut ctx, 3), vec![3, 5, 2, 3, 5, 2]);
    assert_eq!(
        ctx.report_counter().unwrap().to_string(),
        "Number of dice read from current file: 6."
    );
    assert_eq!(ctx.report_seed(), SeedReport::File(file.path().to_path_buf()));
}

#[test]
fn test_missing_file_leaves_context_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = DiceContext::new(Variant::Isaac);
    let err = ctx.open_dice_file(dir.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, DiceError::Io { .. }), "{err:?}");
    assert_eq!(ctx.active_variant(), Variant::Isaac);
}

#[test]
fn test_file_without_dice_falls_back() {
    let observer = Arc::new(CollectingObserver::new());
    let file = dice_file("no dice here 0789");
    let mut ctx = DiceContext::new(Variant::Twister).with_violation_observer(observer.clone());
    ctx.open_dice_file(file.path()).unwrap();

    let roll = ctx.roll().unwrap();
    assert!(roll.dice().iter().all(|d| (1..=6).contains(d)));
    assert_eq!(ctx.active_variant(), Variant::Twister);
    assert_violation!(observer, ViolationKind::SourceExhausted);
    assert_violation!(observer, ViolationKind::MalformedRoll);
}

#[test]
fn test_duplicate_resumes_at_same_position() {
    let file = dice_file("1 2 3 4 5 6 6 5 4 3 2 1");
    let mut ctx = DiceContext::new(Variant::Twister);
    ctx.open_dice_file(file.path()).unwrap();
    assert_eq!(dice(&mut ctx, 2), vec![1, 2, 3, 4]);

    let mut copy = ctx.duplicate().unwrap();
    assert_eq!(dice(&mut ctx, 2), vec![5, 6, 6, 5]);
    assert_eq!(dice(&mut copy, 2), vec![5, 6, 6, 5]);
    assert_eq!(copy.calls(), ctx.calls());
}

#[test]
fn test_replay_resumes_after_switching_away() {
    let observer = Arc::new(CollectingObserver::new());
    let file = dice_file("1234");
    let mut ctx = DiceContext::new(Variant::Twister).with_violation_observer(observer.clone());
    ctx.open_dice_file(file.path()).unwrap();
    assert_eq!(ctx.roll().unwrap().dice(), [1, 2]);

    ctx.select_variant(Variant::Isaac);
    ctx.roll().unwrap();
    ctx.select_variant(Variant::FileReplay);
    assert_eq!(ctx.roll().unwrap().dice(), [3, 4]);
    assert_eq!(ctx.active_variant(), Variant::FileReplay);
    assert_no_violations!(observer);
}

#[test]
fn test_dice_file_removed_while_dormant_falls_back() {
    let observer = Arc::new(CollectingObserver::new());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dice.txt");
    std::fs::write(&path, "66").unwrap();
    let mut ctx = DiceContext::new(Variant::Twister).with_violation_observer(observer.clone());
    ctx.open_dice_file(&path).unwrap();

    ctx.select_variant(Variant::Twister);
    std::fs::remove_file(&path).unwrap();
    ctx.select_variant(Variant::FileReplay);
    ctx.roll().unwrap();
    assert_eq!(ctx.active_variant(), Variant::Twister);
    assert_violation!(observer, ViolationKind::SourceExhausted);
    assert_violation!(observer, ViolationKind::MalformedRoll);
}

#[test]
fn test_builder_opens_dice_file() {
    let file = dice_file("4\n4\n");
    let mut ctx = DiceContextBuilder::new()
        .with_variant(Variant::FileReplay)
        .with_dice_file(file.path())
        .build()
        .unwrap();
    assert_eq!(ctx.roll().unwrap().to_string(), "4-4");
    assert!(ctx.seed().is_none());
}

#[test]
fn test_builder_keeps_dice_file_for_later_selection() {
    let file = dice_file("2 5 3");
    let mut ctx = DiceContextBuilder::new()
        .with_variant(Variant::Isaac)
        .with_seed(17u32)
        .with_dice_file(file.path())
        .build()
        .unwrap();
    assert_eq!(ctx.active_variant(), Variant::Isaac);
    ctx.roll().unwrap();

    ctx.select_variant(Variant::FileReplay);
    assert_eq!(ctx.roll().unwrap().dice(), [2, 5]);
    assert_eq!(ctx.roll().unwrap().dice(), [3, 2]);
    assert_eq!(ctx.active_variant(), Variant::FileReplay);
}
