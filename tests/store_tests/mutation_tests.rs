//! Tests for TableStore mutations
//!
//! These tests verify:
//! - View updates: clamping, persistence, concurrent increments
//! - Engagement appends: foreign-key checks, persistence, field validation
//! - User renames: every table and file, conflicts, no-ops

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::thread;

use flatstore::{Config, Engagement, EngagementKind, StoreError, SyncMode, TableStore};

use common::{fixture, read, sample, write_table};

fn reopen(config: &Config) -> TableStore {
    TableStore::open(config.clone()).unwrap()
}

// =============================================================================
// Walkthrough
// =============================================================================

#[test]
fn test_rename_then_views_then_comments() {
    let (_temp, config) = fixture(
        &["1,alice,NYC"],
        &["10,hi,alice,5"],
        &["100,10,alice,comment,nice,1"],
    );
    let store = reopen(&config);

    assert!(store.rename_user(1, "alicia").unwrap());
    assert_eq!(store.users()[&1].username, "alicia");
    assert_eq!(store.posts()[&10].username, "alicia");
    assert_eq!(store.engagements()[&100].username, "alicia");
    assert_eq!(store.engagements()[&100].comment, "nice");

    assert!(store.update_post_views(10, 3).unwrap());
    assert_eq!(store.posts()[&10].views, 8);

    assert!(store.update_post_views(10, -100).unwrap());
    assert_eq!(store.posts()[&10].views, 0);

    assert_eq!(store.get_all_user_comments(1), vec![(10, "nice".to_string())]);

    assert_eq!(read(&config.users_path), "id,username,location\n1,alicia,NYC\n");
    assert_eq!(read(&config.posts_path), "id,content,username,views\n10,hi,alicia,0\n");
    assert_eq!(
        read(&config.engagements_path),
        "id,postId,username,type,comment,timestamp\n100,10,alicia,comment,nice,1\n"
    );
}

// =============================================================================
// update_post_views
// =============================================================================

#[test]
fn test_update_views_persists() {
    let (_temp, config) = sample();
    let store = reopen(&config);

    assert!(store.update_post_views(12, 10).unwrap());

    assert_eq!(store.posts()[&12].views, 17);
    assert!(read(&config.posts_path).contains("\n12,carol post,carol,17\n"));
    assert_eq!(reopen(&config).posts()[&12].views, 17);
}

#[test]
fn test_update_views_clamps_at_zero() {
    let (_temp, config) = sample();
    let store = reopen(&config);

    assert!(store.update_post_views(10, -6).unwrap());
    assert_eq!(store.posts()[&10].views, 0);

    assert!(store.update_post_views(10, i32::MIN).unwrap());
    assert_eq!(store.posts()[&10].views, 0);

    assert!(store.update_post_views(10, i32::MAX).unwrap());
    assert!(store.update_post_views(10, 1).unwrap());
    assert_eq!(store.posts()[&10].views, i32::MAX);
}

#[test]
fn test_update_views_unknown_post_is_noop() {
    let (_temp, config) = sample();
    let store = reopen(&config);
    let before = read(&config.posts_path);

    assert!(!store.update_post_views(999, 1).unwrap());
    // dropped at load, so unknown to the store even though the row is on disk
    assert!(!store.update_post_views(13, 1).unwrap());

    assert_eq!(read(&config.posts_path), before);
}

#[test]
fn test_update_views_keeps_unrelated_rows_verbatim() {
    let (_temp, config) = fixture(
        &["1,alice,NYC"],
        &[" 10 , spaced ,alice, 5", "11,other,alice,2", "12,orphan,nobody,3", "garbage row"],
        &[],
    );
    let store = reopen(&config);

    store.update_post_views(11, 1).unwrap();

    assert_eq!(
        read(&config.posts_path),
        "id,content,username,views\n 10 , spaced ,alice, 5\n11,other,alice,3\n\
         12,orphan,nobody,3\ngarbage row\n"
    );
}

#[test]
fn test_concurrent_view_updates_are_not_lost() {
    let (_temp, config) = sample();
    let store = Arc::new(reopen(&config));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for j in 0..10 {
                    assert!(store.update_post_views(11, j + 1).unwrap());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.posts()[&11].views, 550);
    assert_eq!(reopen(&config).posts()[&11].views, 550);
}

#[test]
fn test_update_views_with_fsync() {
    let (temp, _) = sample();
    let config = Config::builder().data_dir(temp.path()).build();
    assert_eq!(config.sync_mode, SyncMode::Fsync);
    let store = reopen(&config);

    assert!(store.update_post_views(10, 1).unwrap());

    assert_eq!(reopen(&config).posts()[&10].views, 6);
}

// =============================================================================
// add_engagement
// =============================================================================

#[test]
fn test_add_engagement_appends_and_inserts() {
    let (_temp, config) = sample();
    let store = reopen(&config);

    let record = Engagement::new(200, 11, "alice", "comment", "hey", 9);
    assert!(store.add_engagement(record.clone()).unwrap());

    assert_eq!(store.engagements()[&200], record);
    assert!(read(&config.engagements_path).ends_with("107,12,carol,share,,8\n200,11,alice,comment,hey,9\n"));

    let reloaded = reopen(&config);
    assert_eq!(reloaded.engagements()[&200], record);
    assert!(reloaded
        .get_all_user_comments(1)
        .contains(&(11, "hey".to_string())));
}

#[test]
fn test_add_engagement_rejects_dangling_references() {
    let (_temp, config) = sample();
    let store = reopen(&config);
    let before = read(&config.engagements_path);

    // post 13 is on disk but was dropped at load
    assert!(!store.add_engagement(Engagement::new(200, 13, "alice", "like", "None", 1)).unwrap());
    assert!(!store.add_engagement(Engagement::new(201, 99, "alice", "like", "None", 1)).unwrap());
    assert!(!store.add_engagement(Engagement::new(202, 10, "ghost", "like", "None", 1)).unwrap());

    assert_eq!(read(&config.engagements_path), before);
    assert_eq!(store.engagements().len(), 6);
}

#[test]
fn test_add_engagement_rejects_unwritable_fields() {
    let (_temp, config) = sample();
    let store = reopen(&config);
    let before = read(&config.engagements_path);

    let result = store.add_engagement(Engagement::new(200, 10, "alice", "comment", "a,b", 1));

    assert!(matches!(
        result,
        Err(StoreError::InvalidField { field: "comment", .. })
    ));
    assert_eq!(read(&config.engagements_path), before);
}

#[test]
fn test_add_engagement_other_kind_is_stored() {
    let (_temp, config) = sample();
    let store = reopen(&config);

    assert!(store.add_engagement(Engagement::new(200, 10, "dave", "share", "", 3)).unwrap());

    assert_eq!(
        reopen(&config).engagements()[&200].kind,
        EngagementKind::Other("share".to_string())
    );
}

#[test]
fn test_add_engagement_after_missing_final_newline() {
    let (_temp, config) = sample();
    let store = reopen(&config);
    let content = read(&config.engagements_path);
    std::fs::write(&config.engagements_path, content.trim_end()).unwrap();

    assert!(store.add_engagement(Engagement::new(200, 10, "bob", "like", "None", 1)).unwrap());

    let reloaded = reopen(&config);
    assert!(reloaded.engagements().contains_key(&107));
    assert!(reloaded.engagements().contains_key(&200));
}

#[test]
fn test_add_engagement_to_empty_file_survives_reload() {
    let (_temp, config) = sample();
    std::fs::write(&config.engagements_path, "").unwrap();
    let store = reopen(&config);
    assert!(store.engagements().is_empty());

    let record = Engagement::new(200, 10, "bob", "like", "None", 1);
    assert!(store.add_engagement(record.clone()).unwrap());

    assert!(read(&config.engagements_path).starts_with("id,postId,username,type,comment,timestamp\n"));
    assert_eq!(reopen(&config).engagements().get(&200), Some(&record));
}

#[test]
fn test_add_engagement_normalizes_kind() {
    let (_temp, config) = sample();
    let store = reopen(&config);

    let record = Engagement {
        kind: EngagementKind::Other("like".to_string()),
        ..Engagement::new(200, 11, "bob", "share", "None", 1)
    };
    assert!(store.add_engagement(record).unwrap());

    assert_eq!(store.engagements()[&200].kind, EngagementKind::Like);
    assert_eq!(store.get_all_engagements_by_location("LA"), (2, 0));
    assert_eq!(reopen(&config).snapshot(), store.snapshot());
}

#[test]
fn test_negative_views_on_disk_load_as_zero() {
    let (_temp, config) = fixture(&["1,alice,NYC"], &["10,hi,alice,-5"], &[]);
    let store = reopen(&config);

    assert_eq!(store.posts()[&10].views, 0);

    assert!(store.update_post_views(10, 2).unwrap());
    assert_eq!(read(&config.posts_path), "id,content,username,views\n10,hi,alice,2\n");
}

// =============================================================================
// rename_user
// =============================================================================

#[test]
fn test_rename_updates_every_table() {
    let (_temp, config) = sample();
    let store = reopen(&config);

    assert!(store.rename_user(1, "alicia").unwrap());

    for view in [store.snapshot(), reopen(&config).snapshot()] {
        assert_eq!(view.users[&1].username, "alicia");
        assert!(view.users.values().all(|u| u.username != "alice"));
        assert!(view.posts.values().all(|p| p.username != "alice"));
        assert!(view.engagements.values().all(|e| e.username != "alice"));
        assert_eq!(view.posts.values().filter(|p| p.username == "alicia").count(), 1);
        assert_eq!(
            view.engagements
                .values()
                .filter(|e| e.username == "alicia")
                .count(),
            3
        );
    }
    assert_eq!(
        store.get_all_user_comments(1),
        vec![
            (10, "another".to_string()),
            (10, "nice".to_string()),
            (12, "again".to_string()),
        ]
    );
}

#[test]
fn test_rename_only_touches_username_column() {
    let (_temp, config) = fixture(
        &["1,alice,alice"],
        &["10,alice,alice,5", "11,hi,bob,1"],
        &["100,10,alice,comment,alice,1"],
    );
    let store = reopen(&config);

    assert!(store.rename_user(1, "alicia").unwrap());

    assert_eq!(read(&config.users_path), "id,username,location\n1,alicia,alice\n");
    assert_eq!(
        read(&config.posts_path),
        "id,content,username,views\n10,alice,alicia,5\n11,hi,bob,1\n"
    );
    assert_eq!(
        read(&config.engagements_path),
        "id,postId,username,type,comment,timestamp\n100,10,alicia,comment,alice,1\n"
    );
}

#[test]
fn test_rename_unknown_user_is_noop() {
    let (_temp, config) = sample();
    let store = reopen(&config);
    let before = store.snapshot();

    assert!(!store.rename_user(99, "nobody").unwrap());

    assert_eq!(store.snapshot(), before);
}

#[test]
fn test_rename_to_same_name_succeeds_without_writing() {
    let (_temp, config) = sample();
    let store = reopen(&config);
    // a rewrite would normalize this row's spacing
    write_table(&config.users_path, flatstore::TableKind::Users, &["1, alice ,NYC"]);

    assert!(store.rename_user(1, "alice").unwrap());

    assert_eq!(read(&config.users_path), "id,username,location\n1, alice ,NYC\n");
}

#[test]
fn test_rename_to_taken_name_is_rejected() {
    let (_temp, config) = sample();
    let store = reopen(&config);
    let before = store.snapshot();
    let users_before = read(&config.users_path);

    assert!(!store.rename_user(1, "bob").unwrap());

    assert_eq!(store.snapshot(), before);
    assert_eq!(read(&config.users_path), users_before);
}

#[test]
fn test_rename_rejects_unwritable_name() {
    let (_temp, config) = sample();
    let store = reopen(&config);

    for bad in ["al,ice", "al\nice", " alice2"] {
        assert!(matches!(
            store.rename_user(1, bad),
            Err(StoreError::InvalidField { field: "username", .. })
        ));
    }
    assert_eq!(store.users()[&1].username, "alice");
}

#[test]
fn test_rename_fails_when_a_file_is_missing() {
    let (_temp, config) = sample();
    let store = reopen(&config);
    std::fs::remove_file(&config.engagements_path).unwrap();

    assert!(matches!(
        store.rename_user(1, "alicia"),
        Err(StoreError::Rewrite { .. })
    ));
    // earlier files were installed, memory was not touched
    assert!(read(&config.users_path).contains("1,alicia,NYC"));
    assert_eq!(store.users()[&1].username, "alice");
}

#[test]
fn test_concurrent_renames_and_appends() {
    let (_temp, config) = sample();
    let store = Arc::new(reopen(&config));

    let renamer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..20 {
                let name = if i % 2 == 0 { "bobby" } else { "bob" };
                assert!(store.rename_user(2, name).unwrap());
            }
        })
    };
    let appender = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..20 {
                store
                    .add_engagement(Engagement::new(300 + i, 10, "carol", "like", "None", i))
                    .unwrap();
            }
        })
    };
    renamer.join().unwrap();
    appender.join().unwrap();

    let reloaded = reopen(&config);
    assert_eq!(reloaded.users()[&2].username, "bob");
    assert_eq!(reloaded.snapshot(), store.snapshot());
    assert!(reloaded.verify_integrity().is_clean());
}
