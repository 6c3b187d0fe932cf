/// Fast-forward instructions handed to [`crate::execute`] on resume.
///
/// Each composite consumes the head of `path_remainder` and forwards the
/// tail to the child it descends into; when a leaf receives a cursor with an
/// empty remainder, that leaf is the resume target.
#[derive(Debug, Clone)]
pub struct ResumeCursor {
    /// Child indices remaining between the current node and the paused leaf.
    pub path_remainder: Vec<usize>,
    /// The result to feed the paused leaf (a tool result or a peer's
    /// extracted task text).
    pub tool_result: String,
    /// The paused leaf's configured output key, if any.
    pub output_key: Option<String>,
}

impl ResumeCursor {
    /// Build the cursor a composite node passes to the child at
    /// `path_remainder[0]`: the same payload, with that head index consumed.
    ///
    /// # Panics
    ///
    /// Panics if `path_remainder` is empty — callers must check
    /// [`ResumeCursor::is_target`] first.
    #[must_use]
    pub fn descend(&self) -> (usize, ResumeCursor) {
        let (&head, tail) = self
            .path_remainder
            .split_first()
            .expect("descend called on a cursor with no remaining path");
        (
            head,
            ResumeCursor {
                path_remainder: tail.to_vec(),
                tool_result: self.tool_result.clone(),
                output_key: self.output_key.clone(),
            },
        )
    }

    /// Whether the node holding this cursor is the resume target.
    #[must_use]
    pub fn is_target(&self) -> bool {
        self.path_remainder.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descend_consumes_the_head_index() {
        let cursor = ResumeCursor {
            path_remainder: vec![2, 0],
            tool_result: "r".to_string(),
            output_key: Some("k".to_string()),
        };
        let (head, tail) = cursor.descend();
        assert_eq!(head, 2);
        assert_eq!(tail.path_remainder, vec![0]);
        assert!(!tail.is_target());
    }

    #[test]
    fn empty_remainder_is_the_target() {
        let cursor = ResumeCursor {
            path_remainder: vec![],
            tool_result: "r".to_string(),
            output_key: None,
        };
        assert!(cursor.is_target());
    }
}
