use grammar_core::model::{
    Answer, Exercise, ExerciseContent, ExerciseResult, ExerciseType, ModuleQuery, Submission,
};
use storage::http::{ApiConfig, BearerToken, HttpRepository};
use storage::repository::{InMemoryRepository, Storage, StorageError};

const EXERCISE_JSON: &str = r#"{
    "id": "0b7f8d2e-3c4a-4e5f-8a9b-1c2d3e4f5a6b",
    "lesson_id": "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d",
    "title": "Find the noun",
    "type": "multiple_choice",
    "prompt": "Which word is a noun?",
    "content": { "options": ["Run", "Cat", "Quick", "Blue"], "correct_answer": 1 },
    "order": 1,
    "created_at": "2024-01-01T00:00:00Z"
}"#;

const RESULT_JSON: &str = r#"{
    "exercise_id": "0b7f8d2e-3c4a-4e5f-8a9b-1c2d3e4f5a6b",
    "answer": { "selected_option": 1 },
    "is_correct": true,
    "score": 1.0,
    "feedback": {
        "message": "Correct!",
        "next_steps": { "action": "continue", "message": "Next exercise" }
    }
}"#;

#[tokio::test]
async fn wire_payloads_flow_through_storage() {
    let exercise: Exercise = serde_json::from_str(EXERCISE_JSON).unwrap();
    assert_eq!(exercise.exercise_type(), ExerciseType::MultipleChoice);
    let result: ExerciseResult = serde_json::from_str(RESULT_JSON).unwrap();

    let repo = InMemoryRepository::new();
    repo.insert_exercise(exercise.clone()).unwrap();
    repo.script_result(result).unwrap();
    let storage = Storage::from_in_memory(repo.clone());

    let fetched = storage.exercises.get_exercise(exercise.id()).await.unwrap();
    assert!(matches!(
        fetched.content(),
        ExerciseContent::MultipleChoice { options } if options.len() == 4
    ));

    let submission = Submission {
        answer: Answer::multiple_choice(1),
        time_spent: Some(9),
    };
    let graded = storage
        .exercises
        .submit(exercise.id(), &submission)
        .await
        .unwrap();
    assert!(graded.is_correct);
    assert_eq!(graded.time_spent, Some(9));
    assert_eq!(
        serde_json::to_value(&submission).unwrap(),
        serde_json::json!({ "answer": { "selected_option": 1 }, "time_spent": 9 })
    );
}

#[tokio::test]
async fn empty_backend_answers_with_defaults() {
    let storage = Storage::in_memory();
    let page = storage.modules.list_modules(&ModuleQuery::default()).await.unwrap();
    assert!(page.modules.is_empty());
    assert_eq!(page.total, 0);

    let summary = storage.progress.progress_summary().await.unwrap();
    assert!(summary.module_progress.is_empty());
}

#[test]
fn mismatched_content_is_rejected_at_the_boundary() {
    let body = EXERCISE_JSON.replace("multiple_choice", "fill_in_blank");
    assert!(serde_json::from_str::<Exercise>(&body).is_err());
}

#[test]
fn http_backend_builds_from_config() {
    let config = ApiConfig::default()
        .with_base_url("https://grammar.example.com")
        .with_token(BearerToken::new("token"));
    let repo = HttpRepository::new(config).unwrap();
    assert_eq!(
        repo.config().endpoint("exercises/abc"),
        "https://grammar.example.com/api/v1/exercises/abc"
    );
    assert!(Storage::http(ApiConfig::default()).is_ok());
}

#[test]
fn transient_errors_are_retryable() {
    assert!(StorageError::Network("reset".into()).is_transient());
    assert!(!StorageError::Unauthorized.is_transient());
}
