//! 主题目录及其带权先修图
//!
//! 图只在加载时校验一次：边必须引用已知主题，权重须在 (0,1] 内，且图无环。
//! 运行期代码可直接视目录为合法。

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSpec {
    pub name: String,
    #[serde(default)]
    pub default_mastery: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteEdge {
    pub topic: String,
    pub prerequisite: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prerequisite {
    pub topic: String,
    pub weight: f64,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("topic catalog is empty")]
    Empty,
    #[error("topic name must not be blank")]
    EmptyTopicName,
    #[error("duplicate topic: {0}")]
    DuplicateTopic(String),
    #[error("default mastery for {topic} must be in [0,1] (got {value})")]
    InvalidDefault { topic: String, value: f64 },
    #[error("prerequisite edge {topic} <- {prerequisite} references unknown topic {unknown}")]
    UnknownTopic {
        topic: String,
        prerequisite: String,
        unknown: String,
    },
    #[error("topic {0} lists itself as a prerequisite")]
    SelfDependency(String),
    #[error("duplicate prerequisite edge {topic} <- {prerequisite}")]
    DuplicateEdge { topic: String, prerequisite: String },
    #[error("weight for {topic} <- {prerequisite} must be in (0,1] (got {weight})")]
    InvalidWeight {
        topic: String,
        prerequisite: String,
        weight: f64,
    },
    #[error("prerequisite cycle among topics: {}", .0.join(", "))]
    Cycle(Vec<String>),
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    topics: Vec<TopicSpec>,
    #[serde(default)]
    prerequisites: Vec<PrerequisiteEdge>,
}

#[derive(Debug, Clone)]
pub struct TopicGraph {
    topics: Vec<TopicSpec>,
    index: HashMap<String, usize>,
    prerequisites: Vec<Vec<Prerequisite>>,
}

impl TopicGraph {
    pub fn new(topics: Vec<TopicSpec>, edges: Vec<PrerequisiteEdge>) -> Result<Self, CatalogError> {
        if topics.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(topics.len());
        for (i, spec) in topics.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(CatalogError::EmptyTopicName);
            }
            if !(0.0..=1.0).contains(&spec.default_mastery) {
                return Err(CatalogError::InvalidDefault {
                    topic: spec.name.clone(),
                    value: spec.default_mastery,
                });
            }
            if index.insert(spec.name.clone(), i).is_some() {
                return Err(CatalogError::DuplicateTopic(spec.name.clone()));
            }
        }

        let mut prerequisites: Vec<Vec<Prerequisite>> = vec![Vec::new(); topics.len()];
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for edge in edges {
            let unknown = |name: &str| CatalogError::UnknownTopic {
                topic: edge.topic.clone(),
                prerequisite: edge.prerequisite.clone(),
                unknown: name.to_string(),
            };
            let to = *index.get(&edge.topic).ok_or_else(|| unknown(&edge.topic))?;
            let from = *index
                .get(&edge.prerequisite)
                .ok_or_else(|| unknown(&edge.prerequisite))?;

            if to == from {
                return Err(CatalogError::SelfDependency(edge.topic));
            }
            if !(edge.weight > 0.0 && edge.weight <= 1.0) {
                return Err(CatalogError::InvalidWeight {
                    topic: edge.topic,
                    prerequisite: edge.prerequisite,
                    weight: edge.weight,
                });
            }
            if !seen.insert((to, from)) {
                return Err(CatalogError::DuplicateEdge {
                    topic: edge.topic,
                    prerequisite: edge.prerequisite,
                });
            }

            prerequisites[to].push(Prerequisite {
                topic: edge.prerequisite,
                weight: edge.weight,
            });
        }

        let graph = Self {
            topics,
            index,
            prerequisites,
        };
        graph.ensure_acyclic()?;

        tracing::debug!(
            topics = graph.topics.len(),
            edges = graph.prerequisites.iter().map(Vec::len).sum::<usize>(),
            "Topic catalog loaded"
        );
        Ok(graph)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        Self::new(file.topics, file.prerequisites)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// 未配置目录文件时使用的内置数据结构与算法目录
    pub fn builtin() -> Result<Self, CatalogError> {
        const TOPICS: &[&str] = &[
            "Arrays",
            "Strings",
            "Linked Lists",
            "Hash Tables",
            "Stacks",
            "Queues",
            "Recursion",
            "Sorting",
            "Binary Search",
            "Trees",
            "Binary Search Trees",
            "Heaps",
            "Graphs",
            "Dynamic Programming",
        ];
        const EDGES: &[(&str, &str, f64)] = &[
            ("Strings", "Arrays", 0.5),
            ("Linked Lists", "Arrays", 0.6),
            ("Hash Tables", "Arrays", 0.5),
            ("Stacks", "Linked Lists", 0.4),
            ("Queues", "Linked Lists", 0.4),
            ("Sorting", "Arrays", 0.7),
            ("Binary Search", "Sorting", 0.5),
            ("Trees", "Recursion", 0.6),
            ("Trees", "Linked Lists", 0.5),
            ("Binary Search Trees", "Trees", 0.8),
            ("Binary Search Trees", "Binary Search", 0.6),
            ("Heaps", "Trees", 0.6),
            ("Graphs", "Trees", 0.7),
            ("Graphs", "Queues", 0.5),
            ("Dynamic Programming", "Recursion", 0.9),
            ("Dynamic Programming", "Arrays", 0.5),
        ];

        let topics = TOPICS
            .iter()
            .map(|name| TopicSpec {
                name: (*name).to_string(),
                default_mastery: 0.0,
            })
            .collect();
        let edges = EDGES
            .iter()
            .map(|(topic, prerequisite, weight)| PrerequisiteEdge {
                topic: (*topic).to_string(),
                prerequisite: (*prerequisite).to_string(),
                weight: *weight,
            })
            .collect();

        Self::new(topics, edges)
    }

    /// 按目录顺序返回主题
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.index.contains_key(topic)
    }

    pub fn default_mastery(&self, topic: &str) -> Option<f64> {
        self.index
            .get(topic)
            .map(|&i| self.topics[i].default_mastery)
    }

    /// 各主题的默认掌握度，用于初始化新会话
    pub fn defaults(&self) -> BTreeMap<String, f64> {
        self.topics
            .iter()
            .map(|t| (t.name.clone(), t.default_mastery))
            .collect()
    }

    /// `topic` 的先修列表；未知主题和根主题返回空
    pub fn prerequisites_of(&self, topic: &str) -> &[Prerequisite] {
        match self.index.get(topic) {
            Some(&i) => &self.prerequisites[i],
            None => &[],
        }
    }

    // Kahn 入度排序，未访问到的主题位于环上或环之后
    fn ensure_acyclic(&self) -> Result<(), CatalogError> {
        let n = self.topics.len();
        let mut in_degree: Vec<usize> = self.prerequisites.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (to, prereqs) in self.prerequisites.iter().enumerate() {
            for p in prereqs {
                if let Some(&from) = self.index.get(&p.topic) {
                    dependents[from].push(to);
                }
            }
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut visited = 0usize;
        while let Some(i) = queue.pop_front() {
            visited += 1;
            for &dependent in &dependents[i] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if visited != n {
            let blocked = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.topics[i].name.clone())
                .collect();
            return Err(CatalogError::Cycle(blocked));
        }
        Ok(())
    }
}
