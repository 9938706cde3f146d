//! Benchmark suite for mathlingo-algo
//!
//! Run with: cargo bench

use std::collections::HashMap;

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mathlingo_algo::{
    pick_exercise, rank_topics, update_score, DependencyGraph, Exercise, LearnerSnapshot,
    LearnerView, MasteryParams, MasteryRecord, SelectionConfig, Subject, Topic, TopicDependency,
    TopicStateConfig,
};

fn fixture(
    n: i64,
) -> (
    Vec<Topic>,
    Vec<TopicDependency>,
    Vec<Exercise>,
    LearnerSnapshot,
) {
    let now = Utc::now();
    let topics: Vec<Topic> = (1..=n)
        .map(|id| Topic {
            id,
            subject_id: 1,
            module_id: 1 + id / 10,
            name: format!("topic {}", id),
            description: None,
            difficulty_level: 1.0,
            criticality_level: (id % 3 + 1) as i32,
        })
        .collect();
    let edges: Vec<TopicDependency> = (2..=n)
        .map(|id| TopicDependency {
            topic_id: id,
            depends_on_id: id / 2,
        })
        .collect();
    let exercises: Vec<Exercise> = (1..=n * 5)
        .map(|id| Exercise {
            id,
            topic_id: 1 + (id - 1) / 5,
            question: format!("q{}", id),
            answer: "a".to_string(),
            difficulty: 0.1 + (id % 19) as f64 * 0.1,
        })
        .collect();
    let records = (1..=n)
        .map(|topic_id| MasteryRecord {
            user_id: 1,
            topic_id,
            mastery_score: (topic_id % 10) as f64 / 10.0,
            last_updated: now - Duration::days(topic_id % 120),
        })
        .collect();
    (
        topics,
        edges,
        exercises,
        LearnerSnapshot::from_records(records, HashMap::new()),
    )
}

fn bench_update_score(c: &mut Criterion) {
    let params = MasteryParams::default();
    c.bench_function("update_score", |b| {
        b.iter(|| update_score(black_box(0.42), black_box(true), 1.3, 2, &params))
    });
}

fn bench_rank_and_select(c: &mut Criterion) {
    let (topics, edges, exercises, snapshot) = fixture(200);
    let mut subjects = HashMap::new();
    subjects.insert(1, Subject::with_defaults(1, "Math"));
    let state_config = TopicStateConfig::default();
    let selection = SelectionConfig::default();
    let mut by_topic: HashMap<i64, Vec<Exercise>> = HashMap::new();
    for exercise in &exercises {
        by_topic.entry(exercise.topic_id).or_default().push(exercise.clone());
    }

    c.bench_function("rank_and_select_200_topics", |b| {
        b.iter(|| {
            let graph = DependencyGraph::from_edges(&topics, &edges);
            let view = LearnerView::new(&subjects, &snapshot, Utc::now(), &state_config);
            let rankings = rank_topics(&topics, &graph, &view, &selection);
            rankings.iter().find_map(|r| {
                by_topic
                    .get(&r.topic_id)
                    .and_then(|pool| pick_exercise(pool, r.score, &selection))
                    .map(|e| e.id)
            })
        })
    });
}

criterion_group!(benches, bench_update_score, bench_rank_and_select);
criterion_main!(benches);
