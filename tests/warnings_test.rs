//! Integration tests for moderation warnings

mod common;

use agora::notifications::NotificationType;
use agora::CoreError;
use common::{database::*, fixtures::*};

#[actix_rt::test]
async fn test_admin_warns_user() {
    let core = setup_test_core().await;
    let admin = create_test_admin(&core.db, "moderator").await;
    let user = create_test_user(&core.db, "troll").await;

    let warning = core
        .warnings
        .send_warning(admin.id, user.id, "  Please stay on topic.  ")
        .await
        .unwrap();
    assert_eq!(warning.user_id, user.id);
    assert_eq!(warning.admin_id, admin.id);
    assert_eq!(warning.message, "Please stay on topic.");

    let notes = core.hub.list_notifications(user.id).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].type_, NotificationType::Warning);
    assert_eq!(notes[0].actor_id, Some(admin.id));
    assert_eq!(notes[0].message.as_deref(), Some("Please stay on topic."));

    assert_eq!(core.warnings.warning_count(user.id).await.unwrap(), 1);
    let stored = core.warnings.get_warning(warning.id).await.unwrap();
    assert_eq!(stored.id, warning.id);
    assert_eq!(stored.message, warning.message);
}

#[actix_rt::test]
async fn test_rejected_warnings_leave_no_trace() {
    let core = setup_test_core().await;
    let admin = create_test_admin(&core.db, "moderator").await;
    let other_admin = create_test_admin(&core.db, "other_moderator").await;
    let user = create_test_user(&core.db, "regular").await;
    let peer = create_test_user(&core.db, "peer").await;

    let err = core
        .warnings
        .send_warning(peer.id, user.id, "stop it")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    let err = core
        .warnings
        .send_warning(9999, user.id, "stop it")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized(_)));

    let err = core
        .warnings
        .send_warning(admin.id, other_admin.id, "stop it")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTarget(_)));

    let err = core
        .warnings
        .send_warning(admin.id, 9999, "stop it")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let err = core
        .warnings
        .send_warning(admin.id, user.id, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidArgument(_)));

    for id in [user.id, other_admin.id] {
        assert_eq!(core.warnings.warning_count(id).await.unwrap(), 0);
        assert!(core.hub.list_notifications(id).await.unwrap().is_empty());
    }
    assert!(core
        .warnings
        .list_warnings_by_admin(admin.id)
        .await
        .unwrap()
        .is_empty());
}

#[actix_rt::test]
async fn test_warning_lists_and_delete() {
    let core = setup_test_core().await;
    let admin = create_test_admin(&core.db, "moderator").await;
    let second_admin = create_test_admin(&core.db, "second_moderator").await;
    let user = create_test_user(&core.db, "regular").await;
    let other = create_test_user(&core.db, "other").await;

    let first = core.warnings.send_warning(admin.id, user.id, "first").await.unwrap();
    let second = core
        .warnings
        .send_warning(second_admin.id, user.id, "second")
        .await
        .unwrap();
    let third = core.warnings.send_warning(admin.id, other.id, "third").await.unwrap();

    let for_user: Vec<i32> = core
        .warnings
        .list_warnings_for_user(user.id)
        .await
        .unwrap()
        .iter()
        .map(|w| w.id)
        .collect();
    assert_eq!(for_user, vec![second.id, first.id]);

    let by_admin: Vec<i32> = core
        .warnings
        .list_warnings_by_admin(admin.id)
        .await
        .unwrap()
        .iter()
        .map(|w| w.id)
        .collect();
    assert_eq!(by_admin, vec![third.id, first.id]);

    assert!(core.warnings.delete_warning(first.id).await.unwrap());
    assert!(!core.warnings.delete_warning(first.id).await.unwrap());
    assert_eq!(core.warnings.warning_count(user.id).await.unwrap(), 1);
    assert!(matches!(
        core.warnings.get_warning(first.id).await,
        Err(CoreError::NotFound(_))
    ));
}
