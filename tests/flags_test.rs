//! Integration tests for post flagging and review

mod common;

use agora::notifications::NotificationType;
use agora::orm::post_flags::FlagStatus;
use agora::CoreError;
use common::{database::*, fixtures::*};

#[actix_rt::test]
async fn test_flag_and_approve() {
    let core = setup_test_core().await;
    let owner = create_test_user(&core.db, "owner").await;
    let reporter = create_test_user(&core.db, "reporter").await;
    let admin = create_test_admin(&core.db, "moderator").await;
    let post = create_test_post(&core.db, owner.id).await;

    let flag = core.flags.flag_post(post.id, reporter.id, "spam").await.unwrap();
    assert_eq!(flag.status, FlagStatus::Pending);
    assert_eq!(flag.reason, "spam");
    assert_eq!(flag.flagged_by_user_id, reporter.id);
    assert!(flag.reviewed_at.is_none());
    assert!(flag.reviewed_by_user_id.is_none());

    let notes = core.hub.list_notifications(owner.id).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].type_, NotificationType::FlagCreated);
    assert_eq!(notes[0].post_id, Some(post.id));
    assert_eq!(notes[0].actor_id, None);
    assert_eq!(notes[0].actor_username.as_deref(), Some("Moderation"));

    let reviewed = core
        .flags
        .review_flag(flag.id, FlagStatus::Approved, admin.id)
        .await
        .unwrap();
    assert_eq!(reviewed.status, FlagStatus::Approved);
    assert_eq!(reviewed.reviewed_by_user_id, Some(admin.id));
    assert!(reviewed.reviewed_at.is_some());

    let notes = core.hub.list_notifications(owner.id).await.unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].type_, NotificationType::FlagApproved);
    assert_eq!(notes[0].actor_username.as_deref(), Some("Admin"));

    // The reporter is never told anything
    assert!(core.hub.list_notifications(reporter.id).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_reject_then_review_again_fails() {
    let core = setup_test_core().await;
    let owner = create_test_user(&core.db, "owner").await;
    let reporter = create_test_user(&core.db, "reporter").await;
    let admin = create_test_admin(&core.db, "moderator").await;
    let post = create_test_post(&core.db, owner.id).await;

    let flag = core.flags.flag_post(post.id, reporter.id, "rude").await.unwrap();
    core.flags
        .review_flag(flag.id, FlagStatus::Rejected, admin.id)
        .await
        .unwrap();

    let notes = core.hub.list_notifications(owner.id).await.unwrap();
    assert_eq!(notes[0].type_, NotificationType::FlagRejected);

    for status in [FlagStatus::Approved, FlagStatus::Rejected] {
        let err = core
            .flags
            .review_flag(flag.id, status, admin.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)), "{:?}", err);
    }

    let stored = core.flags.get_flag(flag.id).await.unwrap();
    assert_eq!(stored.status, FlagStatus::Rejected);
    // No extra notifications from the failed reviews
    assert_eq!(core.hub.list_notifications(owner.id).await.unwrap().len(), 2);
}

#[actix_rt::test]
async fn test_review_argument_and_role_checks() {
    let core = setup_test_core().await;
    let owner = create_test_user(&core.db, "owner").await;
    let reporter = create_test_user(&core.db, "reporter").await;
    let admin = create_test_admin(&core.db, "moderator").await;
    let post = create_test_post(&core.db, owner.id).await;
    let flag = core.flags.flag_post(post.id, reporter.id, "spam").await.unwrap();

    let err = core
        .flags
        .review_flag(flag.id, FlagStatus::Pending, admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidArgument(_)));

    let err = core
        .flags
        .review_flag(flag.id, FlagStatus::Approved, reporter.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    let err = core
        .flags
        .review_flag(flag.id, FlagStatus::Approved, 9999)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let err = core
        .flags
        .review_flag(9999, FlagStatus::Approved, admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    assert_eq!(
        core.flags.get_flag(flag.id).await.unwrap().status,
        FlagStatus::Pending
    );
}

#[actix_rt::test]
async fn test_concurrent_reviews_only_one_wins() {
    let (core, _dir) = setup_shared_test_core().await;
    let owner = create_test_user(&core.db, "owner").await;
    let reporter = create_test_user(&core.db, "reporter").await;
    let first = create_test_admin(&core.db, "first_admin").await;
    let second = create_test_admin(&core.db, "second_admin").await;
    let post = create_test_post(&core.db, owner.id).await;
    let flag = core.flags.flag_post(post.id, reporter.id, "spam").await.unwrap();

    let (a, b) = futures::join!(
        core.flags.review_flag(flag.id, FlagStatus::Approved, first.id),
        core.flags.review_flag(flag.id, FlagStatus::Rejected, second.id)
    );

    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(CoreError::InvalidState(_))));
}

#[actix_rt::test]
async fn test_flagging_own_post_is_silent() {
    let core = setup_test_core().await;
    let owner = create_test_user(&core.db, "owner").await;
    let post = create_test_post(&core.db, owner.id).await;

    core.flags.flag_post(post.id, owner.id, "oops").await.unwrap();
    assert!(core.hub.list_notifications(owner.id).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_flag_missing_post_or_user() {
    let core = setup_test_core().await;
    let owner = create_test_user(&core.db, "owner").await;
    let post = create_test_post(&core.db, owner.id).await;

    assert!(matches!(
        core.flags.flag_post(9999, owner.id, "spam").await,
        Err(CoreError::NotFound(_))
    ));
    assert!(matches!(
        core.flags.flag_post(post.id, 9999, "spam").await,
        Err(CoreError::NotFound(_))
    ));
    assert!(core.flags.list_flags(None).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_multiple_flags_listing_and_delete() {
    let core = setup_test_core().await;
    let owner = create_test_user(&core.db, "owner").await;
    let reporter = create_test_user(&core.db, "reporter").await;
    let other = create_test_user(&core.db, "other").await;
    let admin = create_test_admin(&core.db, "moderator").await;
    let post = create_test_post(&core.db, owner.id).await;
    let clean_post = create_test_post(&core.db, owner.id).await;

    let first = core.flags.flag_post(post.id, reporter.id, "spam").await.unwrap();
    let second = core.flags.flag_post(post.id, reporter.id, "also rude").await.unwrap();
    let third = core.flags.flag_post(post.id, other.id, "spam").await.unwrap();

    core.flags
        .review_flag(second.id, FlagStatus::Approved, admin.id)
        .await
        .unwrap();

    let all: Vec<i32> = core
        .flags
        .list_flags(None)
        .await
        .unwrap()
        .iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(all, vec![third.id, second.id, first.id]);

    let pending: Vec<i32> = core
        .flags
        .list_flags(Some(FlagStatus::Pending))
        .await
        .unwrap()
        .iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(pending, vec![third.id, first.id]);

    let approved = core.flags.list_flags(Some(FlagStatus::Approved)).await.unwrap();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].id, second.id);
    assert!(core
        .flags
        .list_flags(Some(FlagStatus::Rejected))
        .await
        .unwrap()
        .is_empty());

    assert_eq!(core.flags.flags_for_post(post.id).await.unwrap().len(), 3);
    assert!(core.flags.is_post_flagged(post.id).await.unwrap());
    assert!(!core.flags.is_post_flagged(clean_post.id).await.unwrap());

    core.flags.delete_flag(first.id).await.unwrap();
    assert!(matches!(
        core.flags.delete_flag(first.id).await,
        Err(CoreError::NotFound(_))
    ));
    assert!(matches!(
        core.flags.get_flag(first.id).await,
        Err(CoreError::NotFound(_))
    ));
    assert_eq!(core.flags.flags_for_post(post.id).await.unwrap().len(), 2);
}
