use super::*;

fn store(size: usize) -> OrderStore {
    OrderStore::new(Arc::new(Universe::new(size).expect("universe")))
}

fn ids(raw: &[i64]) -> Vec<ItemId> {
    raw.iter().copied().map(ItemId).collect()
}

fn merged(store: &OrderStore, order: &[ItemId], key: &FilterKey) -> Vec<i64> {
    merge(&store.universe, order, key).map(|item| item.id.0).collect()
}

#[tokio::test]
async fn unknown_key_has_empty_order() {
    let store = store(5);
    assert!(store.get_order(&FilterKey::normalize("42")).await.is_empty());
    assert!(store.contexts().await.is_empty());
}

#[tokio::test]
async fn set_order_replaces_wholesale() {
    let store = store(10);
    let key = FilterKey::global();
    store.set_order(&key, ids(&[3, 1])).await;
    store.set_order(&key, ids(&[7])).await;
    assert_eq!(store.get_order(&key).await, ids(&[7]));
}

#[tokio::test]
async fn set_order_collapses_duplicates_and_keeps_unknown_ids() {
    let store = store(10);
    let key = FilterKey::global();
    let stored = store.set_order(&key, ids(&[4, 2, 4, 99, 99, 2, 0])).await;
    assert_eq!(stored, 4);
    assert_eq!(store.get_order(&key).await, ids(&[4, 2, 99, 0]));
}

#[tokio::test]
async fn keys_are_independent() {
    let store = store(40);
    let global = FilterKey::global();
    let threes = FilterKey::normalize("3");
    store.set_order(&global, ids(&[5, 1])).await;
    store.set_order(&threes, ids(&[33, 3])).await;

    assert_eq!(store.get_order(&global).await, ids(&[5, 1]));
    assert_eq!(store.get_order(&threes).await, ids(&[33, 3]));
    assert_eq!(store.contexts().await, vec![global, threes]);
}

#[tokio::test]
async fn move_places_dragged_before_target() {
    let store = store(5);
    let key = FilterKey::global();
    store
        .move_item(&key, ItemId(5), ItemId(2))
        .await
        .expect("move");
    let order = store.get_order(&key).await;
    assert_eq!(merged(&store, &order, &key), vec![1, 5, 2, 3, 4]);
}

#[tokio::test]
async fn move_downwards_lands_before_target() {
    let store = store(6);
    let key = FilterKey::global();
    store
        .move_item(&key, ItemId(1), ItemId(4))
        .await
        .expect("move");
    let order = store.get_order(&key).await;
    assert_eq!(merged(&store, &order, &key), vec![2, 3, 1, 4, 5, 6]);
}

#[tokio::test]
async fn move_only_stores_prefix_and_preserves_later_custom_positions() {
    let store = store(1_000);
    let key = FilterKey::global();
    store.set_order(&key, ids(&[1, 2, 3, 900])).await;
    store
        .move_item(&key, ItemId(3), ItemId(1))
        .await
        .expect("move");

    let order = store.get_order(&key).await;
    assert_eq!(order, ids(&[3, 1, 2, 900]));
    let view = merged(&store, &order, &key);
    assert_eq!(&view[..5], &[3, 1, 2, 900, 4]);
    assert_eq!(view.len(), 1_000);
}

#[tokio::test]
async fn move_applies_within_filter_context() {
    let store = store(40);
    let key = FilterKey::normalize("3");
    store
        .move_item(&key, ItemId(31), ItemId(13))
        .await
        .expect("move");
    let order = store.get_order(&key).await;
    assert_eq!(
        merged(&store, &order, &key),
        vec![3, 31, 13, 23, 30, 32, 33, 34, 35, 36, 37, 38, 39]
    );
    assert!(store.get_order(&FilterKey::global()).await.is_empty());
}

#[tokio::test]
async fn move_with_target_outside_filter_sends_dragged_to_the_end() {
    let store = store(40);
    let key = FilterKey::normalize("3");
    store
        .move_item(&key, ItemId(3), ItemId(5))
        .await
        .expect("move");
    let order = store.get_order(&key).await;
    let view = merged(&store, &order, &key);
    assert_eq!(view.last(), Some(&3));
    assert_eq!(view.len(), 13);
}

#[tokio::test]
async fn move_rejects_unknown_ids_without_touching_state() {
    let store = store(5);
    let key = FilterKey::global();
    store.set_order(&key, ids(&[2])).await;

    let err = store
        .move_item(&key, ItemId(6), ItemId(2))
        .await
        .expect_err("unknown dragged id");
    assert_eq!(err, ViewError::UnknownItem(ItemId(6)));

    let err = store
        .move_item(&key, ItemId(2), ItemId(0))
        .await
        .expect_err("unknown target id");
    assert_eq!(err, ViewError::UnknownItem(ItemId(0)));

    assert_eq!(store.get_order(&key).await, ids(&[2]));
    let untouched = FilterKey::normalize("4");
    assert!(store
        .move_item(&untouched, ItemId(-1), ItemId(4))
        .await
        .is_err());
    assert!(!store.contexts().await.contains(&untouched));
}

#[tokio::test]
async fn move_onto_itself_is_a_no_op() {
    let store = store(5);
    let key = FilterKey::global();
    store
        .move_item(&key, ItemId(3), ItemId(3))
        .await
        .expect("move");
    assert!(store.contexts().await.is_empty());
}

#[tokio::test]
async fn reset_single_key_leaves_others() {
    let store = store(40);
    let global = FilterKey::global();
    let threes = FilterKey::normalize("3");
    store.set_order(&global, ids(&[5, 1])).await;
    store.set_order(&threes, ids(&[33])).await;

    assert_eq!(store.reset(&ResetScope::Key(threes.clone())).await, 1);
    assert_eq!(store.reset(&ResetScope::Key(threes.clone())).await, 0);
    assert!(store.get_order(&threes).await.is_empty());
    assert_eq!(store.get_order(&global).await, ids(&[5, 1]));
}

#[tokio::test]
async fn reset_all_clears_every_context() {
    let store = store(40);
    store.set_order(&FilterKey::global(), ids(&[5])).await;
    store.set_order(&FilterKey::normalize("1"), ids(&[11])).await;
    store.set_order(&FilterKey::normalize("2"), ids(&[22])).await;

    assert_eq!(store.reset(&ResetScope::All).await, 3);
    assert!(store.contexts().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_moves_on_one_key_never_lose_items() {
    let store = Arc::new(store(200));
    let key = FilterKey::global();

    let mut tasks = Vec::new();
    for n in 0..50i64 {
        let store = Arc::clone(&store);
        let key = key.clone();
        tasks.push(tokio::spawn(async move {
            let dragged = ItemId(200 - n);
            let target = ItemId(1 + n % 7);
            store.move_item(&key, dragged, target).await
        }));
    }
    for task in tasks {
        task.await.expect("join").expect("move");
    }

    let order = store.get_order(&key).await;
    let mut view = merged(&store, &order, &key);
    assert_eq!(view.len(), 200);
    view.sort_unstable();
    assert_eq!(view, (1..=200).collect::<Vec<i64>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn other_keys_stay_writable_during_a_long_read() {
    let store = Arc::new(store(100));
    let busy = FilterKey::normalize("1");
    let other = FilterKey::normalize("2");
    store.set_order(&busy, ids(&[11, 1])).await;
    store.set_order(&other, ids(&[22, 2])).await;

    let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let reader = {
        let store = Arc::clone(&store);
        let busy = busy.clone();
        tokio::spawn(async move {
            store
                .with_order(&busy, move |order| {
                    entered_tx.send(()).ok();
                    release_rx.recv().ok();
                    order.to_vec()
                })
                .await
        })
    };
    entered_rx.await.expect("reader entered");

    let deadline = std::time::Duration::from_secs(2);
    let cleared = tokio::time::timeout(deadline, store.reset(&ResetScope::Key(other.clone())))
        .await
        .expect("reset of another key finished while the read was running");
    assert_eq!(cleared, 1);
    let fresh = FilterKey::normalize("3");
    tokio::time::timeout(deadline, store.set_order(&fresh, ids(&[3])))
        .await
        .expect("first write to a new key finished while the read was running");

    release_tx.send(()).expect("release reader");
    assert_eq!(reader.await.expect("join"), ids(&[11, 1]));
    assert!(store.get_order(&other).await.is_empty());
    assert_eq!(store.get_order(&fresh).await, ids(&[3]));
}
