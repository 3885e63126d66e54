///
/// BindingTableGroup
///
/// Logical tables that are physically co-partitioned: the i-th actual table
/// of one member in a data source holds the rows matching the i-th actual
/// table of every other member in that data source.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BindingTableGroup {
    tables: Vec<String>,
}

impl BindingTableGroup {
    #[must_use]
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut group = Self { tables: Vec::new() };
        for table in tables {
            group.push(table.into());
        }

        group
    }

    #[must_use]
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    #[must_use]
    pub fn contains(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t.eq_ignore_ascii_case(table))
    }

    /// Members of this group referenced by `tables`, in `tables` order.
    #[must_use]
    pub fn members_in<'a>(&self, tables: &'a [&'a str]) -> Vec<&'a str> {
        tables
            .iter()
            .copied()
            .filter(|table| self.contains(table))
            .collect()
    }

    pub(crate) fn overlaps(&self, other: &Self) -> bool {
        other.tables.iter().any(|table| self.contains(table))
    }

    /// Fold `other` into this group, keeping first-seen order.
    pub(crate) fn absorb(&mut self, other: Self) {
        for table in other.tables {
            self.push(table);
        }
    }

    fn push(&mut self, table: String) {
        if !self.contains(&table) {
            self.tables.push(table);
        }
    }
}

/// Merge declared groups into their transitive closure.
pub(crate) fn close_groups(declared: Vec<BindingTableGroup>) -> Vec<BindingTableGroup> {
    let mut closed: Vec<BindingTableGroup> = Vec::new();
    for group in declared {
        let (overlapping, mut disjoint): (Vec<_>, Vec<_>) =
            closed.into_iter().partition(|existing| existing.overlaps(&group));

        let mut merged = BindingTableGroup { tables: Vec::new() };
        for existing in overlapping {
            merged.absorb(existing);
        }
        merged.absorb(group);

        disjoint.push(merged);
        closed = disjoint;
    }

    closed
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_members_are_collapsed_case_insensitively() {
        let group = BindingTableGroup::new(["t_order", "T_ORDER", "t_order_item"]);

        assert_eq!(group.tables(), &["t_order".to_string(), "t_order_item".to_string()]);
    }

    #[test]
    fn overlapping_groups_merge_transitively() {
        let closed = close_groups(vec![
            BindingTableGroup::new(["a", "b"]),
            BindingTableGroup::new(["x", "y"]),
            BindingTableGroup::new(["c", "d"]),
            BindingTableGroup::new(["b", "c"]),
        ]);

        assert_eq!(closed.len(), 2);
        let abcd = closed
            .iter()
            .find(|group| group.contains("a"))
            .expect("group containing a");
        for table in ["a", "b", "c", "d"] {
            assert!(abcd.contains(table), "{table} should be bound to a");
        }
        assert!(!abcd.contains("x"));
    }

    #[test]
    fn members_in_preserves_statement_order() {
        let group = BindingTableGroup::new(["t_order", "t_order_item"]);

        assert_eq!(
            group.members_in(&["t_user", "t_order_item", "t_order"]),
            vec!["t_order_item", "t_order"]
        );
    }
}
