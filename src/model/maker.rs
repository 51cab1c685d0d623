//! Graph to tree model.

use super::{FieldValue, Graph, Label, Leaf, List, Node, NodeValue, Record, RefId, Value};
use crate::{Error, Result};
use indexmap::IndexMap;
use tracing::trace;

/// A node under construction. Nodes live in an arena while building so a
/// later revisit can attach a label to one that is already placed.
#[derive(Default)]
struct Draft {
    label: Option<Label>,
    value: Option<NodeValue>,
    children: Option<Vec<usize>>,
}

pub(super) struct Maker<'g> {
    graph: &'g Graph,
    drafts: Vec<Draft>,
    /// Heap slot to the draft built for it.
    seen: IndexMap<RefId, usize>,
    serial: u32,
    depth: usize,
    max_depth: usize,
}

impl<'g> Maker<'g> {
    pub(super) fn new(graph: &'g Graph, max_depth: usize) -> Self {
        Maker {
            graph,
            drafts: Vec::new(),
            seen: IndexMap::new(),
            serial: 1,
            depth: 0,
            max_depth,
        }
    }

    pub(super) fn make(mut self, value: &'g Value) -> Result<List> {
        let roots = self.list(value)?;
        Ok(roots.into_iter().map(|idx| self.assemble(idx)).collect())
    }

    fn list(&mut self, value: &'g Value) -> Result<Vec<usize>> {
        match value {
            Value::Int(_) | Value::Str(_) => Ok(vec![self.node(value)?]),
            Value::Seq(items) => items.iter().map(|item| self.node(item)).collect(),
            Value::Record(record) => self.list_from_record(record),
            Value::Ref(None) => Ok(Vec::new()),
            // the root reference itself is not registered
            Value::Ref(Some(id)) => {
                let target = self.resolve(*id)?;
                self.enter()?;
                let list = self.list(target)?;
                self.leave();
                Ok(list)
            }
        }
    }

    fn list_from_record(&mut self, record: &'g Record) -> Result<Vec<usize>> {
        let mut list = Vec::with_capacity(record.len());
        for (name, field) in record {
            let idx = self.node(field)?;
            let draft = &mut self.drafts[idx];
            if draft.children.is_none() {
                let value = draft.value.take().and_then(|value| match value {
                    NodeValue::Leaf(leaf) => Some(leaf),
                    NodeValue::Field(field) => field.value,
                });
                draft.value = Some(NodeValue::Field(FieldValue {
                    name: name.clone(),
                    value,
                }));
            }
            list.push(idx);
        }
        Ok(list)
    }

    fn node(&mut self, value: &'g Value) -> Result<usize> {
        self.drafts.push(Draft::default());
        let idx = self.drafts.len() - 1;
        self.build(idx, value)?;
        Ok(idx)
    }

    fn build(&mut self, idx: usize, value: &'g Value) -> Result<()> {
        match value {
            Value::Int(i) => self.drafts[idx].value = Some(NodeValue::Leaf(Leaf::Int(*i))),
            Value::Str(s) => self.drafts[idx].value = Some(NodeValue::Leaf(Leaf::Str(s.clone()))),
            Value::Seq(items) => {
                self.enter()?;
                let children = items
                    .iter()
                    .map(|item| self.node(item))
                    .collect::<Result<Vec<_>>>()?;
                self.leave();
                self.drafts[idx].children = Some(children);
            }
            Value::Record(record) => {
                self.enter()?;
                let children = self.list_from_record(record)?;
                self.leave();
                self.drafts[idx].children = Some(children);
            }
            // never followed
            Value::Ref(None) => {}
            Value::Ref(Some(id)) => {
                if let Some(&target_idx) = self.seen.get(id) {
                    let label = self.label(target_idx);
                    self.drafts[idx].value = Some(NodeValue::Leaf(Leaf::Ref(label)));
                } else {
                    let target = self.resolve(*id)?;
                    // registered before descending so a cycle back to `id` ends here
                    self.seen.insert(*id, idx);
                    self.enter()?;
                    self.build(idx, target)?;
                    self.leave();
                }
            }
        }
        Ok(())
    }

    fn label(&mut self, idx: usize) -> Label {
        if let Some(label) = self.drafts[idx].label {
            return label;
        }
        let label = Label::new(self.serial);
        self.serial += 1;
        self.drafts[idx].label = Some(label);
        trace!(%label, node = idx, "assigned label");
        label
    }

    fn resolve(&self, id: RefId) -> Result<&'g Value> {
        self.graph.heap.get(id).ok_or_else(|| {
            Error::unsupported_shape(&format!("dangling reference to slot {}", id.index()))
        })
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::DepthLimit {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn assemble(&mut self, idx: usize) -> Node {
        let draft = std::mem::take(&mut self.drafts[idx]);
        Node {
            label: draft.label,
            value: draft.value,
            children: draft
                .children
                .map(|children| children.into_iter().map(|child| self.assemble(child)).collect()),
        }
    }
}
