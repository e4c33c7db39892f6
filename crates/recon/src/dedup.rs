use std::collections::HashMap;

use crate::model::{Record, RecordStatus};

/// Result of the duplicate pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub valid: Vec<Record>,
    pub duplicates: Vec<Record>,
    pub invalid: Vec<Record>,
}

/// Decide final status for extracted records.
///
/// Pending records are grouped by canonical identifier. A group of one is
/// valid; every member of a larger group is a duplicate, none is kept.
/// Groups keep the order of their first occurrence; invalid records pass
/// through in extraction order.
pub fn partition(records: Vec<Record>) -> Partition {
    let mut groups: Vec<Vec<Record>> = Vec::new();
    let mut group_of: HashMap<String, usize> = HashMap::new();
    let mut invalid = Vec::new();

    for record in records {
        let key = match record.canonical.clone() {
            Some(canonical) if record.status != RecordStatus::Invalid => canonical,
            _ => {
                invalid.push(record);
                continue;
            }
        };
        match group_of.get(&key) {
            Some(&i) => groups[i].push(record),
            None => {
                group_of.insert(key, groups.len());
                groups.push(vec![record]);
            }
        }
    }

    let mut valid = Vec::new();
    let mut duplicates = Vec::new();
    for mut group in groups {
        if group.len() == 1 {
            let mut record = group.remove(0);
            record.status = RecordStatus::Valid;
            valid.push(record);
        } else {
            for mut record in group {
                record.status = RecordStatus::Duplicate;
                duplicates.push(record);
            }
        }
    }

    if !duplicates.is_empty() {
        log::warn!("{} record(s) share an identifier and were marked duplicate", duplicates.len());
    }

    Partition {
        valid,
        duplicates,
        invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{validate, ModuleFormat};

    fn rec(apartment: &str, raw: &str, row: usize) -> Record {
        Record::from_outcome(
            apartment.into(),
            String::new(),
            raw.into(),
            row,
            validate(raw, &ModuleFormat::Prefixed13),
        )
    }

    #[test]
    fn singletons_become_valid() {
        let p = partition(vec![rec("1", "04B0000000000001", 2), rec("2", "04B0000000000002", 3)]);
        assert_eq!(p.valid.len(), 2);
        assert!(p.valid.iter().all(|r| r.status == RecordStatus::Valid));
        assert!(p.duplicates.is_empty());
    }

    #[test]
    fn every_member_of_collision_is_duplicate() {
        let p = partition(vec![
            rec("12", "04B6481958134315", 2),
            rec("13", "04B0000000000009", 3),
            rec("14", "04B6481958134315", 4),
        ]);
        assert_eq!(p.valid.len(), 1);
        assert_eq!(p.valid[0].apartment, "13");
        assert_eq!(p.duplicates.len(), 2);
        assert!(p.duplicates.iter().all(|r| r.status == RecordStatus::Duplicate));
        let rows: Vec<usize> = p.duplicates.iter().map(|r| r.source_row).collect();
        assert_eq!(rows, vec![2, 4]);
    }

    #[test]
    fn duplicates_detected_after_normalization() {
        let p = partition(vec![
            rec("1", "04b6481958134315", 2),
            rec("2", " 04\u{0412}6481958134315 ", 3),
        ]);
        assert!(p.valid.is_empty());
        assert_eq!(p.duplicates.len(), 2);
    }

    #[test]
    fn invalid_excluded_from_grouping() {
        let p = partition(vec![rec("1", "junk", 2), rec("2", "junk", 3)]);
        assert!(p.valid.is_empty());
        assert!(p.duplicates.is_empty());
        assert_eq!(p.invalid.len(), 2);
        assert!(p.invalid.iter().all(|r| r.status == RecordStatus::Invalid));
    }

    #[test]
    fn same_search_key_different_identifiers_not_duplicates() {
        let p = partition(vec![
            rec("1", "04B1111118134315", 2),
            rec("2", "04B2222228134315", 3),
        ]);
        assert_eq!(p.valid.len(), 2);
    }

    #[test]
    fn partition_is_deterministic() {
        let input = vec![
            rec("1", "04B0000000000003", 2),
            rec("2", "04B0000000000001", 3),
            rec("3", "04B0000000000003", 4),
            rec("4", "x", 5),
            rec("5", "04B0000000000002", 6),
        ];
        assert_eq!(partition(input.clone()), partition(input));
    }
}
