use crate::flatten::tree::Element;
use crate::flatten::types::{ColumnSet, FlatTable, FlattenConfig, RowRecord, TopLevelPrefix};
use log::{debug, info};
use std::collections::HashMap;

/// Per-branch mapping from tag name to the last index handed out
type SiblingCounts = HashMap<String, usize>;

/// Turns an element tree into rows: one row per direct child of the root,
/// one column per descendant element
pub struct TreeFlattener {
    config: FlattenConfig,
}

impl TreeFlattener {
    pub fn new(config: FlattenConfig) -> Self {
        TreeFlattener { config }
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Flatten every direct child of `root` into a row record
    pub fn extract_rows(&self, root: &Element) -> FlatTable {
        let mut columns = ColumnSet::new();
        let mut rows = Vec::with_capacity(root.children.len());

        for (idx, row_element) in root.children.iter().enumerate() {
            let prefix = match self.config.top_level_prefix {
                TopLevelPrefix::DocumentRoot => root.tag.as_str(),
                TopLevelPrefix::RowElement => row_element.tag.as_str(),
            };

            let mut row = RowRecord::new();
            self.flatten_children(row_element, prefix, SiblingCounts::new(), 1, &mut row, &mut columns);
            debug!("row {} <{}>: {} fields", idx, row_element.tag, row.len());
            rows.push(row);
        }

        info!("flattened {} rows into {} columns", rows.len(), columns.len());
        FlatTable { columns, rows }
    }

    /// Record every child of `element` and descend into it
    ///
    /// `counts` is owned by this level: each child's subtree gets its own
    /// clone, so indices assigned inside one branch never leak into a sibling
    /// branch, while counts from this level carry into the next.
    fn flatten_children(
        &self,
        element: &Element,
        parent_tag: &str,
        mut counts: SiblingCounts,
        depth: usize,
        row: &mut RowRecord,
        columns: &mut ColumnSet,
    ) {
        if self.config.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        for child in &element.children {
            let index = counts.entry(child.tag.clone()).or_insert(0);
            *index += 1;

            let key = self.column_key(parent_tag, &child.tag, *index);
            columns.insert(key.clone());
            if let Some(previous) = row.insert(key.clone(), child.trimmed_text()) {
                debug!("column {} overwritten (previous value {:?})", key, previous);
            }

            self.flatten_children(child, &child.tag, counts.clone(), depth + 1, row, columns);
        }
    }

    fn column_key(&self, parent_tag: &str, tag: &str, index: usize) -> String {
        let sep = &self.config.separator;
        format!("{parent_tag}{sep}{tag}{sep}{index}")
    }
}

impl Default for TreeFlattener {
    fn default() -> Self {
        TreeFlattener::new(FlattenConfig::default())
    }
}

/// Flatten a tree with the default configuration
pub fn extract_rows(root: &Element) -> FlatTable {
    TreeFlattener::default().extract_rows(root)
}
