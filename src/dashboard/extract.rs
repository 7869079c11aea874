//! Query extraction from dashboard trees.
//!
//! # Responsibilities
//! - Walk an arbitrarily nested dashboard depth-first
//! - Track the nearest enclosing `title` per branch
//! - Emit one descriptor per leaf carrying an `expr` key
//!
//! # Design Decisions
//! - The title context is passed down by value, so siblings never see a
//!   title set inside another branch
//! - Rules are not exclusive: a mapping with `panels`, `targets` and `rows`
//!   recurses into all three, in that order
//! - Malformed leaves are skipped with a warning instead of aborting the run
//! - Emission failure (closed sink) stops the walk immediately

use std::time::Duration;

use thiserror::Error;

use crate::dashboard::descriptor::{descriptor_name, QueryDescriptor};
use crate::dashboard::node::ConfigNode;

const KEY_TITLE: &str = "title";
const KEY_PANELS: &str = "panels";
const KEY_TARGETS: &str = "targets";
const KEY_EXPR: &str = "expr";
const KEY_REF_ID: &str = "refId";
const KEY_STEP: &str = "step";
const KEY_ROWS: &str = "rows";

/// The sink stopped accepting descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("descriptor sink closed")]
pub struct SinkClosed;

/// Destination of extracted descriptors.
///
/// Implementations may block (e.g. a bounded queue that is full).
pub trait DescriptorSink {
    fn emit(&mut self, descriptor: QueryDescriptor) -> Result<(), SinkClosed>;
}

impl DescriptorSink for Vec<QueryDescriptor> {
    fn emit(&mut self, descriptor: QueryDescriptor) -> Result<(), SinkClosed> {
        self.push(descriptor);
        Ok(())
    }
}

/// Why a leaf was skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LeafError {
    #[error("expr is not a string")]
    NonStringExpr,

    #[error("refId is missing or not a string")]
    MissingRefId,

    #[error("step is not a number or out of range")]
    InvalidStep,
}

/// Counters for one or more extraction walks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub emitted: usize,
    pub malformed: usize,
}

impl std::ops::AddAssign for ExtractStats {
    fn add_assign(&mut self, other: Self) {
        self.emitted += other.emitted;
        self.malformed += other.malformed;
    }
}

/// Depth-first descriptor extractor.
pub struct Extractor<'s, S: DescriptorSink> {
    sink: &'s mut S,
    default_step: Duration,
    stats: ExtractStats,
}

impl<'s, S: DescriptorSink> Extractor<'s, S> {
    /// Create an extractor. `default_step` is used for leaves without `step`.
    pub fn new(sink: &'s mut S, default_step: Duration) -> Self {
        Self {
            sink,
            default_step,
            stats: ExtractStats::default(),
        }
    }

    /// Walk one document from its root with an empty title.
    pub fn extract(&mut self, root: &ConfigNode) -> Result<(), SinkClosed> {
        self.walk(root, "")
    }

    pub fn stats(&self) -> ExtractStats {
        self.stats
    }

    fn walk<'n>(&mut self, node: &'n ConfigNode, title: &'n str) -> Result<(), SinkClosed> {
        match node {
            ConfigNode::Mapping(map) => {
                let title = map
                    .get(KEY_TITLE)
                    .and_then(ConfigNode::as_str)
                    .unwrap_or(title);

                if let Some(panels) = map.get(KEY_PANELS) {
                    self.walk(panels, title)?;
                }
                if let Some(targets) = map.get(KEY_TARGETS) {
                    self.walk(targets, title)?;
                }
                if let Some(expr) = map.get(KEY_EXPR) {
                    self.leaf(node, expr, title)?;
                }
                if let Some(rows) = map.get(KEY_ROWS) {
                    self.walk(rows, title)?;
                }
                Ok(())
            }
            ConfigNode::Sequence(items) => {
                for item in items {
                    self.walk(item, title)?;
                }
                Ok(())
            }
            ConfigNode::Scalar(_) => Ok(()),
        }
    }

    fn leaf(&mut self, node: &ConfigNode, expr: &ConfigNode, title: &str) -> Result<(), SinkClosed> {
        match self.parse_leaf(node, expr, title) {
            Ok(descriptor) => {
                self.sink.emit(descriptor)?;
                self.stats.emitted += 1;
            }
            Err(reason) => {
                tracing::warn!(
                    title = %title,
                    ref_id = node.get(KEY_REF_ID).and_then(ConfigNode::as_str).unwrap_or("?"),
                    reason = %reason,
                    "Skipping malformed query target"
                );
                self.stats.malformed += 1;
            }
        }
        Ok(())
    }

    fn parse_leaf(
        &self,
        node: &ConfigNode,
        expr: &ConfigNode,
        title: &str,
    ) -> Result<QueryDescriptor, LeafError> {
        let expr = expr.as_str().ok_or(LeafError::NonStringExpr)?;
        let ref_id = node
            .get(KEY_REF_ID)
            .and_then(ConfigNode::as_str)
            .ok_or(LeafError::MissingRefId)?;

        let step = match node.get(KEY_STEP) {
            None => self.default_step,
            Some(value) => match value.as_f64() {
                Some(secs) if secs <= 0.0 => self.default_step,
                Some(secs) => {
                    Duration::try_from_secs_f64(secs).map_err(|_| LeafError::InvalidStep)?
                }
                None => return Err(LeafError::InvalidStep),
            },
        };

        Ok(QueryDescriptor::new(expr, descriptor_name(title, ref_id), step))
    }
}
