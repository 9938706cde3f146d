use std::sync::Arc;

use mathlingo_algo::{learning_rate, MasteryParams};
use mathlingo_backend::db::operations::learning::count_attempts;
use mathlingo_backend::store::LearningStore;

mod common;

use common::{now, TestEnv};

const SUBMISSIONS: usize = 24;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_attempts_lose_no_updates() {
    let env = TestEnv::new().await;
    let subject = env.subject("Matemáticas").await;
    let module = env.module(subject, "Aritmética").await;
    let topic = env.topic(subject, module, "Suma", 2).await;
    let exercise = env.exercise(topic, 0.4, "12").await;
    let user = env.user("ana@example.com").await;

    let mut handles = Vec::with_capacity(SUBMISSIONS);
    for _ in 0..SUBMISSIONS {
        let engine = Arc::clone(&env.engine);
        handles.push(tokio::spawn(async move {
            engine
                .record_attempt_result_at(user, exercise, true, now())
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Serialized correct updates from 0 give 1 - (1 - lr)^n.
    let lr = learning_rate(0.4, 2, &MasteryParams::default());
    let expected = 1.0 - (1.0 - lr).powi(SUBMISSIONS as i32);

    let record = env.proxy.get_mastery(user, topic).await.unwrap().unwrap();
    assert!(
        (record.mastery_score - expected).abs() < 1e-9,
        "score {} expected {}",
        record.mastery_score,
        expected
    );
    assert_eq!(
        count_attempts(&env.proxy, user).await.unwrap(),
        SUBMISSIONS as i64
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_users_are_independent() {
    let env = TestEnv::new().await;
    let subject = env.subject("Matemáticas").await;
    let module = env.module(subject, "Aritmética").await;
    let topic = env.topic(subject, module, "Suma", 1).await;
    let exercise = env.exercise(topic, 1.0, "12").await;

    let mut users = Vec::new();
    for i in 0..4 {
        users.push(env.user(&format!("user{i}@example.com")).await);
    }

    let mut handles = Vec::new();
    for &user in &users {
        for _ in 0..3 {
            let engine = Arc::clone(&env.engine);
            handles.push(tokio::spawn(async move {
                engine
                    .record_attempt_result_at(user, exercise, false, now())
                    .await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for user in users {
        let record = env.proxy.get_mastery(user, topic).await.unwrap().unwrap();
        assert_eq!(record.mastery_score, 0.0);
        assert_eq!(count_attempts(&env.proxy, user).await.unwrap(), 3);
    }
}
