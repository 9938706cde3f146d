//! Dependency Graph
//!
//! Prerequisite adjacency built from `TopicDependency` edges. A topic is
//! unlocked when every prerequisite is ready for unlock. Prerequisites that do
//! not resolve to a known topic lock their dependents.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::types::{Topic, TopicDependency, TopicId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("topic {0} cannot depend on itself")]
    SelfLoop(TopicId),
    #[error("unknown topic {0}")]
    UnknownTopic(TopicId),
    #[error("topics {topic_id} and {depends_on_id} belong to different subjects")]
    CrossSubject {
        topic_id: TopicId,
        depends_on_id: TopicId,
    },
    #[error("dependency {topic_id} -> {depends_on_id} already exists")]
    Duplicate {
        topic_id: TopicId,
        depends_on_id: TopicId,
    },
    #[error("dependency {topic_id} -> {depends_on_id} would create a cycle")]
    Cycle {
        topic_id: TopicId,
        depends_on_id: TopicId,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    known: HashSet<TopicId>,
    prerequisites: HashMap<TopicId, Vec<TopicId>>,
    dependents: HashMap<TopicId, Vec<TopicId>>,
}

impl DependencyGraph {
    pub fn from_edges(topics: &[Topic], edges: &[TopicDependency]) -> Self {
        let mut graph = Self {
            known: topics.iter().map(|t| t.id).collect(),
            ..Default::default()
        };
        for edge in edges {
            graph.insert(*edge);
        }
        graph
    }

    fn insert(&mut self, edge: TopicDependency) {
        let prereqs = self.prerequisites.entry(edge.topic_id).or_default();
        if !prereqs.contains(&edge.depends_on_id) {
            prereqs.push(edge.depends_on_id);
            self.dependents
                .entry(edge.depends_on_id)
                .or_default()
                .push(edge.topic_id);
        }
    }

    pub fn contains(&self, topic_id: TopicId) -> bool {
        self.known.contains(&topic_id)
    }

    pub fn prerequisites(&self, topic_id: TopicId) -> &[TopicId] {
        self.prerequisites
            .get(&topic_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Topics that list `topic_id` as a prerequisite.
    pub fn dependents_of(&self, topic_id: TopicId) -> &[TopicId] {
        self.dependents
            .get(&topic_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.prerequisites.values().map(Vec::len).sum()
    }

    /// `ready` answers whether a known prerequisite is ready for unlock.
    pub fn is_unlocked<F>(&self, topic_id: TopicId, mut ready: F) -> bool
    where
        F: FnMut(TopicId) -> bool,
    {
        self.prerequisites(topic_id)
            .iter()
            .all(|&prereq| self.known.contains(&prereq) && ready(prereq))
    }

    /// Topics whose prerequisites are all ready, in input order.
    pub fn unlocked_topics<'t, F>(&self, topics: &'t [Topic], mut ready: F) -> Vec<&'t Topic>
    where
        F: FnMut(TopicId) -> bool,
    {
        topics
            .iter()
            .filter(|topic| self.is_unlocked(topic.id, &mut ready))
            .collect()
    }

    /// Whether `to` is reachable from `from` by following prerequisite edges.
    pub fn reaches(&self, from: TopicId, to: TopicId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            stack.extend(self.prerequisites(current).iter().copied());
        }
        false
    }
}

/// Checks a new edge against the existing topics and edges before it is stored.
pub fn validate_edge(
    topics: &[Topic],
    edges: &[TopicDependency],
    edge: TopicDependency,
) -> Result<(), GraphError> {
    let TopicDependency {
        topic_id,
        depends_on_id,
    } = edge;

    if topic_id == depends_on_id {
        return Err(GraphError::SelfLoop(topic_id));
    }

    let find = |id: TopicId| topics.iter().find(|t| t.id == id);
    let topic = find(topic_id).ok_or(GraphError::UnknownTopic(topic_id))?;
    let prereq = find(depends_on_id).ok_or(GraphError::UnknownTopic(depends_on_id))?;

    if topic.subject_id != prereq.subject_id {
        return Err(GraphError::CrossSubject {
            topic_id,
            depends_on_id,
        });
    }

    if edges.contains(&edge) {
        return Err(GraphError::Duplicate {
            topic_id,
            depends_on_id,
        });
    }

    let graph = DependencyGraph::from_edges(topics, edges);
    if graph.reaches(depends_on_id, topic_id) {
        return Err(GraphError::Cycle {
            topic_id,
            depends_on_id,
        });
    }

    Ok(())
}
