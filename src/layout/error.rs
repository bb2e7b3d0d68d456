use thiserror::Error;

/// Fatal input problems. Every variant is raised before any geometry is
/// produced; the same input always fails the same way.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("duplicate node id: {id}")]
    DuplicateNodeId { id: String },

    #[error("link {link} references unknown node: {id}")]
    UnknownNodeReference { link: usize, id: String },

    #[error("link {link} has invalid value {value}")]
    InvalidLinkValue { link: usize, value: f32 },

    #[error("node {id} has invalid fixed value {value}")]
    InvalidNodeValue { id: String, value: f32 },

    #[error("circular link detected near node: {node}")]
    CyclicGraph { node: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_id() {
        let err = LayoutError::UnknownNodeReference {
            link: 2,
            id: "ghost".to_string(),
        };
        assert_eq!(err.to_string(), "link 2 references unknown node: ghost");
        let err = LayoutError::CyclicGraph {
            node: "a".to_string(),
        };
        assert!(err.to_string().contains("circular"));
    }
}
