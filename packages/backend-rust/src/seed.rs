use chrono::Utc;
use mathlingo_algo::{TopicDependency, TopicId};

use crate::db::operations::content::{NewExercise, NewSubject, NewTopic};
use crate::services::{ContentService, EngineResult};
use crate::store::LearningStore;

pub const DEMO_SUBJECT: &str = "Matemáticas";
pub const DEMO_USER_EMAIL: &str = "demo@mathlingo.local";

struct SeedTopic {
    module: usize,
    name: &'static str,
    difficulty: f64,
    criticality: i32,
    /// Indices into the topic table
    depends_on: &'static [usize],
    exercises: &'static [(&'static str, &'static str, f64)],
}

const MODULES: [&str; 3] = ["Aritmética", "Álgebra", "Geometría"];

const TOPICS: &[SeedTopic] = &[
    SeedTopic {
        module: 0,
        name: "Suma y resta",
        difficulty: 0.2,
        criticality: 3,
        depends_on: &[],
        exercises: &[
            ("7 + 5", "12", 0.2),
            ("43 - 18", "25", 0.4),
            ("386 + 457", "843", 0.7),
        ],
    },
    SeedTopic {
        module: 0,
        name: "Multiplicación y división",
        difficulty: 0.4,
        criticality: 3,
        depends_on: &[0],
        exercises: &[
            ("6 x 7", "42", 0.3),
            ("144 / 12", "12", 0.6),
            ("23 x 17", "391", 1.0),
        ],
    },
    SeedTopic {
        module: 0,
        name: "Fracciones",
        difficulty: 0.7,
        criticality: 2,
        depends_on: &[1],
        exercises: &[
            ("1/2 + 1/4", "3/4", 0.4),
            ("2/3 x 3/5", "2/5", 0.7),
            ("5/6 - 3/8", "11/24", 1.1),
        ],
    },
    SeedTopic {
        module: 1,
        name: "Ecuaciones lineales",
        difficulty: 0.9,
        criticality: 3,
        depends_on: &[1, 2],
        exercises: &[
            ("x + 3 = 7", "x = 4", 0.3),
            ("2x - 5 = 9", "x = 7", 0.55),
            ("3(x - 2) = 2x + 4", "x = 10", 1.1),
        ],
    },
    SeedTopic {
        module: 1,
        name: "Sistemas de ecuaciones",
        difficulty: 1.3,
        criticality: 2,
        depends_on: &[3],
        exercises: &[
            ("x + y = 5, x - y = 1", "x = 3, y = 2", 0.8),
            ("2x + y = 7, x + 2y = 8", "x = 2, y = 3", 1.3),
        ],
    },
    SeedTopic {
        module: 2,
        name: "Ángulos",
        difficulty: 0.5,
        criticality: 1,
        depends_on: &[0],
        exercises: &[
            ("Complemento de 30 grados", "60", 0.3),
            ("Suplemento de 115 grados", "65", 0.5),
        ],
    },
    SeedTopic {
        module: 2,
        name: "Teorema de Pitágoras",
        difficulty: 1.0,
        criticality: 2,
        depends_on: &[1, 5],
        exercises: &[
            ("Catetos 3 y 4, hipotenusa", "5", 0.5),
            ("Hipotenusa 13, cateto 5, otro cateto", "12", 0.9),
        ],
    },
];

/// Creates the demo subject and user unless the subject already exists.
/// Returns whether anything was written.
pub async fn seed_demo_content(
    content: &ContentService,
    store: &dyn LearningStore,
) -> EngineResult<bool> {
    if store.find_subject_by_name(DEMO_SUBJECT).await?.is_some() {
        tracing::debug!("demo content already present");
        return Ok(false);
    }

    let subject_id = content
        .create_subject(&NewSubject {
            name: DEMO_SUBJECT.to_string(),
            description: Some("Aritmética, álgebra y geometría básicas".to_string()),
            threshold_c1: 0.65,
            threshold_c2: 0.75,
            threshold_c3: 0.85,
            certificate_threshold: 0.80,
        })
        .await?;

    let mut module_ids = Vec::with_capacity(MODULES.len());
    for (position, name) in MODULES.iter().enumerate() {
        module_ids.push(content.create_module(subject_id, name, position as i32).await?);
    }

    let mut topic_ids: Vec<TopicId> = Vec::with_capacity(TOPICS.len());
    for seed in TOPICS {
        let topic_id = content
            .create_topic(&NewTopic {
                subject_id,
                module_id: module_ids[seed.module],
                name: seed.name.to_string(),
                description: None,
                difficulty_level: seed.difficulty,
                criticality_level: seed.criticality,
            })
            .await?;
        for (question, answer, difficulty) in seed.exercises {
            content
                .create_exercise(&NewExercise {
                    topic_id,
                    question: question.to_string(),
                    answer: answer.to_string(),
                    difficulty: *difficulty,
                })
                .await?;
        }
        topic_ids.push(topic_id);
    }

    for (index, seed) in TOPICS.iter().enumerate() {
        for &prerequisite in seed.depends_on {
            content
                .add_dependency(TopicDependency {
                    topic_id: topic_ids[index],
                    depends_on_id: topic_ids[prerequisite],
                })
                .await?;
        }
    }

    if store.find_user_by_email(DEMO_USER_EMAIL).await?.is_none() {
        content.create_user(DEMO_USER_EMAIL, Utc::now()).await?;
    }

    tracing::info!(
        subject_id,
        topics = topic_ids.len(),
        "demo content seeded"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_table_is_consistent() {
        for (index, topic) in TOPICS.iter().enumerate() {
            assert!(topic.module < MODULES.len());
            assert!(!topic.exercises.is_empty());
            // prerequisites are declared before their dependents
            assert!(topic.depends_on.iter().all(|&p| p < index));
            for (_, _, difficulty) in topic.exercises {
                assert!((0.1..=2.0).contains(difficulty));
            }
        }
    }
}
