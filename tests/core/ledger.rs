use faqledger::core::error::FaqError;
use faqledger::core::ledger::{AnswerStore, Editor};
use faqledger::core::registry::GLOBAL_NAMESPACE;
use faqledger::core::store::Store;
use tempfile::tempdir;

fn open() -> (tempfile::TempDir, Store) {
    let tmp = tempdir().unwrap();
    let store = Store::open_default(tmp.path()).unwrap();
    (tmp, store)
}

fn ed() -> Editor<'static> {
    Editor::new("10001", 1_700_000_000)
}

#[test]
fn test_put_get_history_round_trip() {
    let (_tmp, store) = open();
    let answers = store.answers();

    answers.put("100", "k", "v1", ed(), "").unwrap();
    assert_eq!(answers.get("100", "k").unwrap().as_deref(), Some("v1"));

    answers.put("100", "k", "v2", ed(), "").unwrap();
    assert_eq!(answers.get("100", "k").unwrap().as_deref(), Some("v2"));

    let history = answers.history("100", "k", 20).unwrap();
    let texts: Vec<&str> = history.iter().map(|r| r.answer.as_str()).collect();
    assert_eq!(texts, vec!["v2", "v1"]);
    assert!(history[0].is_latest);
    assert!(!history[1].is_latest);
    assert!(history[0].sequence > history[1].sequence);
    assert_eq!(answers.latest_count("100", "k").unwrap(), 1);
}

#[test]
fn test_soft_delete_leaves_tombstone() {
    let (_tmp, store) = open();
    let answers = store.answers();

    answers.put("100", "k", "v1", ed(), "").unwrap();
    answers.soft_delete("100", "k", ed()).unwrap();

    assert_eq!(answers.get("100", "k").unwrap(), None);
    let history = answers.history("100", "k", 20).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].is_deleted);
    assert!(history[0].is_latest);
    assert_eq!(history[0].answer, "");
    assert!(answers.list_active("100").unwrap().is_empty());
}

#[test]
fn test_rollback_walks_back_then_empties() {
    let (_tmp, store) = open();
    let answers = store.answers();

    answers.put("100", "k", "v1", ed(), "").unwrap();
    answers.put("100", "k", "v2", ed(), "").unwrap();

    assert!(answers.rollback("100", "k").unwrap());
    assert_eq!(answers.get("100", "k").unwrap().as_deref(), Some("v1"));
    assert_eq!(answers.latest_count("100", "k").unwrap(), 1);

    assert!(answers.rollback("100", "k").unwrap());
    assert_eq!(answers.get("100", "k").unwrap(), None);
    assert!(answers.history("100", "k", 20).unwrap().is_empty());

    assert!(!answers.rollback("100", "k").unwrap());
}

#[test]
fn test_rollback_resurrects_deleted_answer() {
    let (_tmp, store) = open();
    let answers = store.answers();

    answers.put("100", "k", "v1", ed(), "").unwrap();
    answers.soft_delete("100", "k", ed()).unwrap();
    assert!(answers.rollback("100", "k").unwrap());
    assert_eq!(answers.get("100", "k").unwrap().as_deref(), Some("v1"));
}

#[test]
fn test_sequences_are_never_reused_after_rollback() {
    let (_tmp, store) = open();
    let answers = store.answers();

    let first = answers.put("100", "k", "v1", ed(), "").unwrap();
    let second = answers.put("100", "k", "v2", ed(), "").unwrap();
    answers.rollback("100", "k").unwrap();
    let third = answers.put("100", "k", "v3", ed(), "").unwrap();

    assert_eq!(first.sequence, 1);
    assert_eq!(second.sequence, 2);
    assert_eq!(third.sequence, 3);
}

#[test]
fn test_namespaces_are_isolated() {
    let (_tmp, store) = open();
    let answers = store.answers();

    answers.put("100", "k", "a", ed(), "").unwrap();
    answers.put("200", "k", "b", ed(), "").unwrap();

    assert_eq!(answers.get("100", "k").unwrap().as_deref(), Some("a"));
    assert_eq!(answers.get("200", "k").unwrap().as_deref(), Some("b"));
    assert_eq!(answers.get(GLOBAL_NAMESPACE, "k").unwrap(), None);

    // Sequences are namespace-scoped.
    assert_eq!(answers.history("200", "k", 1).unwrap()[0].sequence, 1);
}

#[test]
fn test_history_is_capped_newest_first() {
    let (_tmp, store) = open();
    let answers = store.answers();
    for i in 0..25 {
        answers.put("100", "k", &format!("v{i}"), ed(), "").unwrap();
    }
    let history = answers.history("100", "k", 20).unwrap();
    assert_eq!(history.len(), 20);
    assert_eq!(history[0].answer, "v24");
    assert_eq!(history[19].answer, "v5");
}

#[test]
fn test_list_active_reports_tags_in_sequence_order() {
    let (_tmp, store) = open();
    let answers = store.answers();
    answers.put("100", "b", "x", ed(), "net").unwrap();
    answers.put("100", "a", "y", ed(), "").unwrap();
    answers.put("100", "c", "z", ed(), "").unwrap();
    answers.soft_delete("100", "c", ed()).unwrap();

    assert_eq!(
        answers.list_active("100").unwrap(),
        vec![
            ("b".to_string(), "net".to_string()),
            ("a".to_string(), "".to_string())
        ]
    );
}

#[test]
fn test_copy_duplicates_active_answer() {
    let (_tmp, store) = open();
    let answers = store.answers();
    answers.put("100", "a", "ans", ed(), "").unwrap();

    answers.copy("100", "a", "b", ed()).unwrap();
    assert_eq!(answers.get("100", "b").unwrap().as_deref(), Some("ans"));
    assert_eq!(answers.get("100", "a").unwrap().as_deref(), Some("ans"));
    assert_eq!(answers.history("100", "a", 20).unwrap().len(), 1);

    let err = answers.copy("100", "missing", "c", ed()).unwrap_err();
    assert!(matches!(err, FaqError::NotFound(_)));
}

#[test]
fn test_revise_error_leaves_state_unchanged() {
    let (_tmp, store) = open();
    let answers = store.answers();
    answers.put("100", "k", "v1", ed(), "").unwrap();

    let err = answers
        .revise("100", "k", ed(), |_| {
            Err(FaqError::AlreadyExists("k".into()))
        })
        .unwrap_err();
    assert!(matches!(err, FaqError::AlreadyExists(_)));
    assert_eq!(answers.history("100", "k", 20).unwrap().len(), 1);

    // A fresh namespace touched only by a failed revise is not allocated.
    let _ = answers.revise("999", "k", ed(), |_| Err(FaqError::NotFound("k".into())));
    assert!(!store.registry().exists("999").unwrap());
}

#[test]
fn test_rejects_blank_or_multi_token_question() {
    let (_tmp, store) = open();
    let answers = store.answers();
    assert!(matches!(
        answers.put("100", "", "v", ed(), ""),
        Err(FaqError::ValidationError(_))
    ));
    assert!(matches!(
        answers.put("100", "two words", "v", ed(), ""),
        Err(FaqError::ValidationError(_))
    ));
}

#[test]
fn test_concurrent_puts_keep_single_latest() {
    let (_tmp, store) = open();
    let answers = store.answers();
    answers.put("100", "k", "seed", ed(), "").unwrap();

    const WRITERS: usize = 16;
    std::thread::scope(|s| {
        for i in 0..WRITERS {
            let answers: AnswerStore = answers.clone();
            s.spawn(move || {
                answers
                    .put("100", "k", &format!("w{i}"), Editor::now("w"), "")
                    .unwrap();
            });
        }
    });

    assert_eq!(answers.latest_count("100", "k").unwrap(), 1);
    assert_eq!(answers.history("100", "k", 100).unwrap().len(), WRITERS + 1);
}

#[test]
fn test_concurrent_writers_across_store_handles() {
    let tmp = tempdir().unwrap();
    let a = Store::open_default(tmp.path()).unwrap();
    let b = Store::open_default(tmp.path()).unwrap();

    std::thread::scope(|s| {
        for store in [&a, &b] {
            s.spawn(move || {
                let answers = store.answers();
                for i in 0..10 {
                    answers.put("100", "k", &format!("v{i}"), Editor::now("u"), "").unwrap();
                }
            });
        }
    });

    let answers = a.answers();
    assert_eq!(answers.latest_count("100", "k").unwrap(), 1);
    let history = answers.history("100", "k", 100).unwrap();
    assert_eq!(history.len(), 20);
    let mut seqs: Vec<i64> = history.iter().map(|r| r.sequence).collect();
    seqs.sort();
    seqs.dedup();
    assert_eq!(seqs.len(), 20);
}

#[test]
fn test_concurrent_first_writers_allocate_namespace_once() {
    let (_tmp, store) = open();
    std::thread::scope(|s| {
        for i in 0..8 {
            let store = &store;
            s.spawn(move || {
                store
                    .answers()
                    .put("fresh", &format!("k{i}"), "v", Editor::now("u"), "")
                    .unwrap();
            });
        }
    });
    let listed: Vec<String> = store
        .registry()
        .list()
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .filter(|id| id == "fresh")
        .collect();
    assert_eq!(listed.len(), 1);
    assert_eq!(store.answers().list_active("fresh").unwrap().len(), 8);
}

#[test]
fn test_registry_bootstraps_global_and_is_idempotent() {
    let (tmp, store) = open();
    let registry = store.registry();
    assert!(registry.exists(GLOBAL_NAMESPACE).unwrap());
    assert!(registry.ensure("100").unwrap());
    assert!(!registry.ensure("100").unwrap());
    assert!(matches!(registry.ensure("  "), Err(FaqError::ValidationError(_))));

    // Reopening keeps existing ledgers.
    let reopened = Store::open_default(tmp.path()).unwrap();
    assert!(reopened.registry().exists("100").unwrap());
}

#[test]
fn test_tombstone_record_is_never_active() {
    let (_tmp, store) = open();
    let answers = store.answers();
    answers.put("100", "k", "v1", ed(), "").unwrap();
    let tomb = answers.soft_delete("100", "k", ed()).unwrap();
    assert!(!tomb.is_active());
    assert_eq!(answers.get_record("100", "k").unwrap(), None);
}

#[test]
fn test_panicking_revise_does_not_block_later_writes() {
    let (_tmp, store) = open();
    let answers = store.answers();
    let crashed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        answers.revise("100", "k", ed(), |_| panic!("decide blew up"))
    }));
    assert!(crashed.is_err());

    answers.put("100", "k", "v", ed(), "").unwrap();
    assert_eq!(answers.get("100", "k").unwrap().as_deref(), Some("v"));
}
