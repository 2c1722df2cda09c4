use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

use super::PartitionMapping;

/// `group_id -> [sample_id]`, groups and members both in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupBins {
    groups: Vec<(String, Vec<String>)>,
}

impl GroupBins {
    pub fn build(mapping: &PartitionMapping) -> Self {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for (sample_id, group_id) in mapping.iter() {
            let slot = *index.entry(group_id).or_insert_with(|| {
                groups.push((group_id.to_string(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(sample_id.to_string());
        }

        Self { groups }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.groups.iter().map(|(g, m)| (g.as_str(), m.as_slice()))
    }

    pub fn members(&self, group_id: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|(g, _)| g == group_id)
            .map(|(_, m)| m.as_slice())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// Serialized as a JSON object that keeps group order.
impl Serialize for GroupBins {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (group_id, members) in &self.groups {
            map.serialize_entry(group_id, members)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> PartitionMapping {
        pairs
            .iter()
            .map(|(s, g)| (s.to_string(), g.to_string()))
            .collect()
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let bins = GroupBins::build(&mapping(&[
            ("A", "north"),
            ("B", "south"),
            ("C", "north"),
            ("D", "east"),
        ]));
        let groups: Vec<&str> = bins.iter().map(|(g, _)| g).collect();
        assert_eq!(groups, vec!["north", "south", "east"]);
        assert_eq!(bins.members("north").unwrap(), &["A", "C"]);
        assert_eq!(bins.members("south").unwrap(), &["B"]);
        assert!(bins.members("west").is_none());
    }

    #[test]
    fn empty_mapping_gives_empty_bins() {
        let bins = GroupBins::build(&PartitionMapping::default());
        assert!(bins.is_empty());
        assert_eq!(serde_json::to_string(&bins).unwrap(), "{}");
    }

    #[test]
    fn serializes_in_group_order() {
        let bins = GroupBins::build(&mapping(&[("A", "1"), ("B", "0"), ("C", "1")]));
        assert_eq!(
            serde_json::to_string(&bins).unwrap(),
            r#"{"1":["A","C"],"0":["B"]}"#
        );
    }

    #[test]
    fn every_sample_lands_in_exactly_one_bin() {
        let m = mapping(&[("A", "x"), ("B", "y"), ("C", "x"), ("D", "z"), ("E", "y")]);
        let bins = GroupBins::build(&m);
        let total: usize = bins.iter().map(|(_, members)| members.len()).sum();
        assert_eq!(total, m.len());
        for (sample, group) in m.iter() {
            assert!(bins.members(group).unwrap().iter().any(|s| s == sample));
        }
    }
}
