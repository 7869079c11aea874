//! Query descriptors.

use std::fmt;
use std::time::Duration;

/// Marker of an unresolved dashboard template variable.
pub const PLACEHOLDER_MARKER: char = '$';

/// One discovered query: expression, output name and sampling step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    /// Opaque query expression.
    pub expr: String,
    /// Output file base name.
    pub name: String,
    /// Sampling interval.
    pub step: Duration,
}

impl QueryDescriptor {
    pub fn new(expr: impl Into<String>, name: impl Into<String>, step: Duration) -> Self {
        Self {
            expr: expr.into(),
            name: name.into(),
            step,
        }
    }

    /// True when the expression references a template variable nobody resolved.
    pub fn has_placeholder(&self) -> bool {
        self.expr.contains(PLACEHOLDER_MARKER)
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}s] {}", self.name, self.step.as_secs(), self.expr)
    }
}

/// Build a descriptor name from the enclosing title and a leaf's reference id.
pub fn descriptor_name(title: &str, ref_id: &str) -> String {
    format!("{}_{}", title.replace(' ', "_"), ref_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_name() {
        assert_eq!(descriptor_name("QPS By Instance", "A"), "QPS_By_Instance_A");
        assert_eq!(descriptor_name("", "B"), "_B");
    }

    #[test]
    fn test_placeholder_detection() {
        let d = QueryDescriptor::new("up{job=\"$job\"}", "up_A", Duration::from_secs(15));
        assert!(d.has_placeholder());

        let d = QueryDescriptor::new("rate(tidb_server_query_total[1m])", "qps_A", Duration::from_secs(15));
        assert!(!d.has_placeholder());
    }
}
