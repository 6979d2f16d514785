//! Behavioral checks run against every backend.

use crate::model::{EntityPatch, NewEntity, PageRequest, Scorecard, ScorecardPatch};
use crate::tier::{classify, Tier};
use crate::{EntityStore, StoreError};
use std::time::Duration;

pub(crate) fn new_entity(name: &str, score: f64) -> NewEntity {
    NewEntity {
        name: name.to_string(),
        category: "youkai".to_string(),
        affiliation: "gensokyo".to_string(),
        notes: format!("notes for {name}"),
        image_ref: format!("img/{name}.png"),
        scorecard: Scorecard::uniform(score),
    }
}

// Timestamps only need to move forward between steps.
async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

pub(crate) async fn duplicate_create_conflicts(store: &dyn EntityStore) {
    let first = store.create(new_entity("reimu", 4.0)).await.unwrap();

    let mut clash = new_entity("reimu", 9.5);
    clash.notes = "impostor".to_string();
    let err = store.create(clash).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");

    let fetched = store.get_by_name("reimu").await.unwrap();
    assert_eq!(fetched, first);
    assert_eq!(store.get_all().await.unwrap().len(), 1);

    // Names are case-sensitive.
    store.create(new_entity("Reimu", 4.0)).await.unwrap();
}

pub(crate) async fn identical_patch_is_a_no_op(store: &dyn EntityStore) {
    let created = store.create(new_entity("marisa", 6.0)).await.unwrap();
    tick().await;

    let patch = EntityPatch {
        name: Some("marisa".to_string()),
        category: Some(created.category.clone()),
        notes: Some(created.notes.clone()),
        scorecard: Some(ScorecardPatch {
            active_aggression: Some(6.0),
            encounter_probability: Some(6.0),
            ..ScorecardPatch::default()
        }),
        ..EntityPatch::default()
    };
    let updated = store.update("marisa", patch).await.unwrap();
    assert_eq!(updated, created);
    assert_eq!(store.get_by_name("marisa").await.unwrap(), created);

    let updated = store.update("marisa", EntityPatch::default()).await.unwrap();
    assert_eq!(updated, created);
}

pub(crate) async fn scorecard_patch_only_bumps_scorecard(store: &dyn EntityStore) {
    let created = store.create(new_entity("sakuya", 5.0)).await.unwrap();
    tick().await;

    let patch = EntityPatch {
        scorecard: Some(ScorecardPatch {
            attack_range: Some(8.0),
            ..ScorecardPatch::default()
        }),
        ..EntityPatch::default()
    };
    let updated = store.update("sakuya", patch).await.unwrap();
    assert_eq!(updated.last_update, created.last_update);
    assert!(updated.scorecard.last_update > created.scorecard.last_update);
    assert_eq!(updated.scorecard.scores.attack_range, 8.0);
    assert_eq!(updated.scorecard.scores.unpredictability, 5.0);

    let fetched = store.get_by_name("sakuya").await.unwrap();
    assert_eq!(fetched, updated);
}

pub(crate) async fn main_patch_only_bumps_entity(store: &dyn EntityStore) {
    let created = store.create(new_entity("youmu", 5.0)).await.unwrap();
    tick().await;

    let patch = EntityPatch {
        name: Some("youmu konpaku".to_string()),
        notes: Some("half phantom".to_string()),
        ..EntityPatch::default()
    };
    let updated = store.update("youmu", patch).await.unwrap();
    assert!(updated.last_update > created.last_update);
    assert_eq!(updated.scorecard.last_update, created.scorecard.last_update);
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.category, created.category);

    assert!(matches!(
        store.get_by_name("youmu").await,
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(store.get_by_name("youmu konpaku").await.unwrap(), updated);
}

pub(crate) async fn rename_onto_existing_name_conflicts(store: &dyn EntityStore) {
    store.create(new_entity("remilia", 8.0)).await.unwrap();
    let flandre = store.create(new_entity("flandre", 9.5)).await.unwrap();

    let patch = EntityPatch {
        name: Some("remilia".to_string()),
        notes: Some("changed".to_string()),
        ..EntityPatch::default()
    };
    let err = store.update("flandre", patch).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");
    assert_eq!(store.get_by_name("flandre").await.unwrap(), flandre);
}

pub(crate) async fn update_missing_is_not_found(store: &dyn EntityStore) {
    let err = store
        .update("nobody", EntityPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

pub(crate) async fn delete_semantics(store: &dyn EntityStore) {
    assert!(!store.delete("cirno").await.unwrap());

    store.create(new_entity("cirno", 1.0)).await.unwrap();
    store.create(new_entity("daiyousei", 1.0)).await.unwrap();
    assert!(store.delete("cirno").await.unwrap());
    assert!(!store.delete("cirno").await.unwrap());

    assert!(matches!(
        store.get_by_name("cirno").await,
        Err(StoreError::NotFound(_))
    ));
    let remaining = store.get_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "daiyousei");

    // Name becomes free again.
    store.create(new_entity("cirno", 9.0)).await.unwrap();
}

pub(crate) async fn pagination(store: &dyn EntityStore) {
    for i in 0..15 {
        store.create(new_entity(&format!("entity-{i:02}"), 3.0)).await.unwrap();
    }

    let first = store.list_page(PageRequest::new(1, 10)).await.unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.items[0].name, "entity-00");

    let second = store.list_page(PageRequest::new(2, 10)).await.unwrap();
    assert_eq!(second.items.len(), 5);
    assert_eq!(second.total, 15);
    assert_eq!(second.total_pages, 2);
    assert_eq!(second.page, 2);
    assert_eq!(second.page_size, 10);
    assert_eq!(second.items[0].name, "entity-10");

    let beyond = store.list_page(PageRequest::new(5, 10)).await.unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 15);
    assert_eq!(beyond.total_pages, 2);

    let mut names: Vec<_> = first.items.into_iter().map(|e| e.name).collect();
    names.extend(second.items.into_iter().map(|e| e.name));
    let all: Vec<_> = store.get_all().await.unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, all);
}

pub(crate) async fn invalid_page_request(store: &dyn EntityStore) {
    for request in [PageRequest::new(0, 10), PageRequest::new(1, 0)] {
        let err = store.list_page(request).await.unwrap_err();
        assert!(matches!(err, StoreError::ValidationGap(_)), "got {err:?}");
    }
}

pub(crate) async fn list_by_tier_matches_filter(store: &dyn EntityStore) {
    for tier in Tier::ALL {
        assert!(store.list_by_tier(tier).await.unwrap().is_empty());
    }

    let seeds = [
        ("yukari", 10.0),
        ("eiki", 9.5),
        ("remilia", 7.5),
        ("sanae", 5.0),
        ("kogasa", 3.0),
        ("rumia", 1.5),
        ("cirno", 0.0),
    ];
    for (name, score) in seeds {
        store.create(new_entity(name, score)).await.unwrap();
    }

    let all = store.get_all().await.unwrap();
    for tier in Tier::ALL {
        let expected: Vec<_> = all
            .iter()
            .filter(|e| classify(&e.scorecard.scores) == tier)
            .cloned()
            .collect();
        assert_eq!(store.list_by_tier(tier).await.unwrap(), expected);
    }

    let s_names: Vec<_> = store
        .list_by_tier(Tier::S)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(s_names, vec!["yukari", "eiki"]);
    assert_eq!(store.list_by_tier(Tier::D).await.unwrap().len(), 2);
}

pub(crate) async fn malformed_input_is_a_validation_gap(store: &dyn EntityStore) {
    let err = store.create(new_entity("", 3.0)).await.unwrap_err();
    assert!(matches!(err, StoreError::ValidationGap(_)));

    let mut bad = new_entity("nan", 3.0);
    bad.scorecard.historical_threat = f64::NAN;
    let err = store.create(bad).await.unwrap_err();
    assert!(matches!(err, StoreError::ValidationGap(_)));
    assert!(store.get_all().await.unwrap().is_empty());

    let created = store.create(new_entity("kasen", 3.0)).await.unwrap();
    let patch = EntityPatch {
        scorecard: Some(ScorecardPatch {
            attack_range: Some(f64::INFINITY),
            ..ScorecardPatch::default()
        }),
        ..EntityPatch::default()
    };
    let err = store.update("kasen", patch).await.unwrap_err();
    assert!(matches!(err, StoreError::ValidationGap(_)));
    assert_eq!(store.get_by_name("kasen").await.unwrap(), created);
}
