mod support;

use coursework_rag_server::cleanup::CleanupFlags;
use coursework_rag_server::conversation::ConversationEngineConfig;
use coursework_rag_server::domain::{ChatRequest, EngineMode, TenantKey};
use coursework_rag_server::memory_store::MemoryStore;
use coursework_rag_server::vector_store::VectorStore;

use support::{build_harness, build_harness_with, DEFAULT_COLLECTION};

fn chat_request(
    conversation_id: &str,
    question: &str,
    mode: EngineMode,
    course_id: Option<&str>,
    material_id: Option<&str>,
) -> ChatRequest {
    ChatRequest {
        conversation_id: conversation_id.to_string(),
        question: question.to_string(),
        engine_mode: mode,
        course_id: course_id.map(String::from),
        course_material_id: material_id.map(String::from),
        collection_name: None,
    }
}

/// A document indexed under a tenant is retrievable via a
/// course-filtered chat, attributed back to the right tenant.
#[tokio::test]
async fn index_then_retrieve_round_trips_the_document() {
    let harness = build_harness();
    let tenant = TenantKey::new("course-1", "material-1").unwrap();

    let text = "Rust ownership rules prevent data races at compile time. \
                The borrow checker enforces this statically."
        .repeat(4);

    let index_result = harness
        .indexing
        .build_index(&text, tenant.clone(), "Ownership Notes".to_string(), None)
        .await
        .unwrap();
    assert!(index_result.success);
    assert!(index_result.chunk_count > 0);

    let response = harness
        .orchestrator
        .chat(chat_request(
            "conv-1",
            "What does the borrow checker do?",
            EngineMode::RetrievalAugmented,
            Some("course-1"),
            None,
        ))
        .await
        .unwrap();

    assert!(!response.sources.is_empty());
    assert!(response.sources.iter().all(|s| s.course_id == "course-1"));
    assert!(response.sources.iter().all(|s| s.course_material_id == "material-1"));
    assert!(!response.answer.is_empty());
}

/// Retrieval-augmented chat with neither course_id nor
/// course_material_id must refuse rather than search everything.
#[tokio::test]
async fn refuses_retrieval_without_a_filter() {
    let harness = build_harness();

    let response = harness
        .orchestrator
        .chat(chat_request("conv-2", "anything?", EngineMode::RetrievalAugmented, None, None))
        .await
        .unwrap();

    assert_eq!(response.answer, "检索必须携带过滤条件，不支持无过滤条件检索");
    assert!(response.sources.is_empty());
}

/// A filter naming a tenant with no indexed material returns the
/// empty-hit literal, not an error and not a fabricated answer.
#[tokio::test]
async fn empty_hit_when_filter_matches_nothing() {
    let harness = build_harness();

    let response = harness
        .orchestrator
        .chat(chat_request(
            "conv-3",
            "what's in this course?",
            EngineMode::RetrievalAugmented,
            Some("course-does-not-exist"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.answer, "检索的课程和材料不在数据库中");
    assert!(response.sources.is_empty());
}

/// When both course_id and course_material_id are supplied, course_id
/// wins, and filter_info carries the tie-break marker.
#[tokio::test]
async fn tie_break_prefers_course_id_over_material_id() {
    let harness = build_harness();
    let tenant = TenantKey::new("course-9", "material-9").unwrap();

    harness
        .indexing
        .build_index(
            "Graph traversal: BFS explores level by level using a queue.",
            tenant,
            "Graphs".to_string(),
            None,
        )
        .await
        .unwrap();

    let response = harness
        .orchestrator
        .chat(chat_request(
            "conv-4",
            "how does BFS work?",
            EngineMode::RetrievalAugmented,
            Some("course-9"),
            Some("some-other-material"),
        ))
        .await
        .unwrap();

    assert!(response.filter_info.starts_with("course_id = course-9"));
    assert!(response.filter_info.contains("优先使用"));
}

/// Once the running token estimate crosses the configured limit, the
/// conversation compacts — the message list shrinks back down and a
/// summary appears, without losing the thread.
#[tokio::test]
async fn compacts_conversation_memory_once_token_limit_is_crossed() {
    let harness = build_harness_with(ConversationEngineConfig {
        token_limit: 200,
        hard_cap_messages: 100,
        tail_keep: 2,
        summary_temperature: 0.1,
    });

    let mut last_count = 0usize;
    for i in 0..10 {
        let response = harness
            .orchestrator
            .chat(chat_request(
                "conv-5",
                &format!("this is direct-mode question number {i} with some extra padding words to grow tokens"),
                EngineMode::Direct,
                None,
                None,
            ))
            .await
            .unwrap();
        assert!(!response.answer.is_empty());
        last_count += 1;
    }
    assert_eq!(last_count, 10);

    let memory = harness.memory_store.load("conv-5").await.unwrap().unwrap();
    // Ten exchanges would be 20 messages uncompacted; compaction must
    // have brought it back down to roughly the tail, plus a summary.
    assert!(memory.messages.len() < 20);
    assert!(memory.summary.is_some());
}

/// Deleting a material cascades across the vector store, and a second
/// delete of the same target is a no-op rather than an error.
#[tokio::test]
async fn cascade_delete_is_idempotent() {
    let harness = build_harness();
    let tenant = TenantKey::new("course-7", "material-7").unwrap();

    harness
        .indexing
        .build_index(
            "Linked lists allow O(1) insertion at the head.",
            tenant,
            "Lists".to_string(),
            None,
        )
        .await
        .unwrap();

    assert!(harness.vector_store.count(DEFAULT_COLLECTION).await.unwrap() > 0);

    let flags = CleanupFlags {
        delete_vectors: true,
        ..Default::default()
    };

    let first = harness
        .cleanup
        .cleanup(DEFAULT_COLLECTION, "course-7", Some("material-7"), flags.clone())
        .await;
    assert!(first.success);
    assert!(first.vectors_deleted > 0);
    assert_eq!(harness.vector_store.count(DEFAULT_COLLECTION).await.unwrap(), 0);

    let second = harness
        .cleanup
        .cleanup(DEFAULT_COLLECTION, "course-7", Some("material-7"), flags)
        .await;
    assert!(second.success);
    assert_eq!(second.vectors_deleted, 0);
}

/// A filter naming one tenant must never surface another tenant's
/// chunks, even from the same collection.
#[tokio::test]
async fn filter_isolates_tenants_sharing_a_collection() {
    let harness = build_harness();

    harness
        .indexing
        .build_index(
            "Course A material talks about sorting algorithms.",
            TenantKey::new("course-a", "material-a").unwrap(),
            "Sorting".to_string(),
            None,
        )
        .await
        .unwrap();
    harness
        .indexing
        .build_index(
            "Course B material talks about sorting algorithms too.",
            TenantKey::new("course-b", "material-b").unwrap(),
            "Sorting".to_string(),
            None,
        )
        .await
        .unwrap();

    let response = harness
        .orchestrator
        .chat(chat_request(
            "conv-iso",
            "tell me about sorting",
            EngineMode::RetrievalAugmented,
            Some("course-a"),
            None,
        ))
        .await
        .unwrap();

    assert!(!response.sources.is_empty());
    assert!(response.sources.iter().all(|s| s.course_id == "course-a"));
}

/// Two concurrent chats on the same conversation are serialized by the
/// per-conversation lock — both turns land, none are lost or
/// interleaved into a corrupt record.
#[tokio::test]
async fn concurrent_chats_on_one_conversation_do_not_lose_turns() {
    let harness = build_harness();

    let first = harness.orchestrator.chat(chat_request(
        "conv-concurrent",
        "first question",
        EngineMode::Direct,
        None,
        None,
    ));
    let second = harness.orchestrator.chat(chat_request(
        "conv-concurrent",
        "second question",
        EngineMode::Direct,
        None,
        None,
    ));

    let (first, second) = tokio::join!(first, second);
    assert!(first.is_ok());
    assert!(second.is_ok());

    let memory = harness.memory_store.load("conv-concurrent").await.unwrap().unwrap();
    assert_eq!(memory.messages.len(), 4);
}

/// Appending turns never discards history except through compaction —
/// message count only goes up, one pair at a time, right up to the
/// point compaction kicks in.
#[tokio::test]
async fn memory_grows_monotonically_before_compaction() {
    let harness = build_harness();

    let mut previous_count = 0usize;
    for i in 0..3 {
        harness
            .orchestrator
            .chat(chat_request(
                "conv-monotone",
                &format!("question {i}"),
                EngineMode::Direct,
                None,
                None,
            ))
            .await
            .unwrap();

        let memory = harness.memory_store.load("conv-monotone").await.unwrap().unwrap();
        assert!(memory.messages.len() > previous_count);
        previous_count = memory.messages.len();
    }
    assert_eq!(previous_count, 6);
}
