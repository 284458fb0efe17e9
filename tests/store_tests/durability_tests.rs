//! Durability Tests
//!
//! These tests verify:
//! - Leftover temp files from an interrupted rewrite are harmless
//! - Readers of the backing file never observe a torn rewrite
//! - Rows that change width on rewrite do not disturb their neighbours

#[path = "../common/mod.rs"]
mod common;

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use flatstore::storage::{read_rows, temp_path_for};
use flatstore::{Post, TableStore};

use common::{fixture, read, sample};

fn views_on_disk(store: &TableStore, post_id: i32) -> Option<i32> {
    let mut views = None;
    read_rows::<Post, _>(&store.config().posts_path, |post| {
        if post.id == post_id {
            views = Some(post.views);
        }
    })
    .unwrap();
    views
}

#[test]
fn test_stale_partial_temp_file_is_ignored() {
    let (_temp, config) = sample();
    // what a kill during the temp write leaves behind
    fs::write(
        temp_path_for(&config.posts_path),
        "id,content,username,views\n10,hello wor",
    )
    .unwrap();

    let store = TableStore::open(config.clone()).unwrap();
    assert_eq!(store.posts()[&10].views, 5);

    assert!(store.update_post_views(10, 1).unwrap());
    assert!(!temp_path_for(&config.posts_path).exists());
    assert_eq!(TableStore::open(config).unwrap().posts()[&10].views, 6);
}

#[test]
fn test_disk_readers_never_see_torn_rewrites() {
    let (_temp, config) = sample();
    let store = Arc::new(TableStore::open(config).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut last = 5;
            let mut reads = 0;
            while !done.load(Ordering::Acquire) || reads == 0 {
                let views = views_on_disk(&store, 10).expect("post 10 missing from disk");
                assert!(views >= last, "views went backwards: {} < {}", views, last);
                last = views;
                reads += 1;
            }
        })
    };

    for _ in 0..200 {
        assert!(store.update_post_views(10, 1).unwrap());
    }
    done.store(true, Ordering::Release);
    reader.join().unwrap();

    assert_eq!(views_on_disk(&store, 10), Some(205));
}

#[test]
fn test_width_changes_keep_neighbours_intact() {
    let (_temp, config) = fixture(
        &["1,alice,NYC"],
        &["1,first,alice,9", "2,middle,alice,99", "3,last,alice,999"],
        &[],
    );
    let store = TableStore::open(config.clone()).unwrap();

    store.update_post_views(2, 1).unwrap();
    store.update_post_views(1, 991).unwrap();
    store.update_post_views(3, -999).unwrap();

    assert_eq!(
        read(&config.posts_path),
        "id,content,username,views\n1,first,alice,1000\n2,middle,alice,100\n3,last,alice,0\n"
    );
    assert_eq!(
        TableStore::open(config).unwrap().snapshot(),
        store.snapshot()
    );
}

#[test]
fn test_mutations_survive_reopen() {
    let (_temp, config) = sample();
    {
        let store = TableStore::open(config.clone()).unwrap();
        store.update_post_views(11, 4).unwrap();
        store.rename_user(3, "caroline").unwrap();
        store
            .add_engagement(flatstore::Engagement::new(200, 12, "caroline", "like", "None", 9))
            .unwrap();
    }

    let store = TableStore::open(config).unwrap();
    assert_eq!(store.posts()[&11].views, 4);
    assert_eq!(store.posts()[&12].username, "caroline");
    assert_eq!(store.engagements()[&200].username, "caroline");
    assert_eq!(store.get_all_engagements_by_location("NYC"), (1, 4));
}
