use std::cmp::Ordering;

pub use focus_model::{normalize_version, versions_match};

/// Compares dotted versions numerically where possible (`1.10` > `1.9`).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = normalize_version(a);
    let b = normalize_version(b);
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// True for versions from 1.3 on, which carry dataset-instance metadata.
pub fn has_dataset_metadata(version: &str) -> bool {
    compare_versions(version, "1.3") != Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_numerically() {
        assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare_versions("v1.2", "1.2"), Ordering::Equal);
        assert!(has_dataset_metadata("v1.3"));
        assert!(!has_dataset_metadata("1.2"));
    }
}
