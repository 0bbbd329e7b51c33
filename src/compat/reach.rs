use crate::model::{Shape, ShapeKind};
use ahash::{AHashMap, AHashSet};

/// A read-only snapshot of one page: shape positions, types and the
/// `jadeEvent` connection map.
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    positions: AHashMap<String, usize>,
    kinds: Vec<ShapeKind>,
    ids: Vec<String>,
    successors: AHashMap<String, Vec<String>>,
}

impl PageIndex {
    pub fn build(shapes: &[Shape]) -> Self {
        let positions: AHashMap<String, usize> = shapes
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();

        let is_node = |id: &str| {
            positions
                .get(id)
                .is_some_and(|&i| !shapes[i].is_edge())
        };

        let mut successors: AHashMap<String, Vec<String>> = AHashMap::new();
        for edge in shapes.iter().filter(|s| s.is_edge()) {
            let (Some(from), Some(to)) = (edge.from_shape.as_deref(), edge.to_shape.as_deref()) else {
                continue;
            };
            if !is_node(from) || !is_node(to) {
                continue;
            }
            let next = successors.entry(from.to_string()).or_default();
            if !next.iter().any(|n| n == to) {
                next.push(to.to_string());
            }
        }
        // Successors are visited in shape order, not edge order.
        for next in successors.values_mut() {
            next.sort_by_key(|id| positions.get(id).copied().unwrap_or(usize::MAX));
        }

        Self {
            kinds: shapes.iter().map(|s| s.kind.clone()).collect(),
            ids: shapes.iter().map(|s| s.id.clone()).collect(),
            positions,
            successors,
        }
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn kind(&self, id: &str) -> Option<&ShapeKind> {
        self.position(id).and_then(|i| self.kinds.get(i))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Positions of every shape of `kind`, in shape order.
    pub fn positions_of(&self, kind: &ShapeKind) -> Vec<usize> {
        self.kinds
            .iter()
            .enumerate()
            .filter(|(_, k)| *k == kind)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn ids_of(&self, kind: &ShapeKind) -> Vec<&str> {
        self.positions_of(kind)
            .into_iter()
            .map(|i| self.ids[i].as_str())
            .collect()
    }

    pub fn successors(&self, id: &str) -> &[String] {
        self.successors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every shape on some path from `src` to `target`, source first, in
    /// discovery order. Empty when `target` is unreachable.
    ///
    /// Worst-case cost is exponential in the number of paths; callers are
    /// expected to rate-limit.
    pub fn nodes_between(&self, src: &str, target: &str) -> Vec<String> {
        if !self.contains(src) || !self.contains(target) {
            return Vec::new();
        }
        let mut chain = vec![src.to_string()];
        let mut on_stack = AHashSet::new();
        if self.traverse(src, target, &mut on_stack, &mut chain) {
            chain
        } else {
            Vec::new()
        }
    }

    fn traverse<'a>(
        &'a self,
        current: &'a str,
        target: &str,
        on_stack: &mut AHashSet<&'a str>,
        chain: &mut Vec<String>,
    ) -> bool {
        if current == target {
            return true;
        }
        on_stack.insert(current);
        let mut reached = false;
        for next in self.successors(current) {
            if on_stack.contains(next.as_str()) {
                continue;
            }
            let mark = chain.len();
            if !chain.contains(next) {
                chain.push(next.clone());
            }
            if self.traverse(next, target, on_stack, chain) {
                reached = true;
            } else {
                chain.truncate(mark);
            }
        }
        on_stack.remove(current);
        reached
    }
}
