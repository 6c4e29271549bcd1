//! Particle-to-bin assignment labels.

use crate::error::{Error, Result};

/// Label of a particle that fell outside the footprint.
pub const UNASSIGNED: i32 = -1;

/// Per-particle bin labels, in particle order.
///
/// Each entry is either a bin id in `0..num_bins` or [`UNASSIGNED`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    labels: Vec<i32>,
}

impl Assignment {
    /// Wraps a label vector.
    #[must_use]
    pub fn from_labels(labels: Vec<i32>) -> Self {
        Self { labels }
    }

    /// Number of particles covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if no particles are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Raw labels.
    #[must_use]
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Bin id of particle `index`, or `None` if it is unassigned.
    #[must_use]
    pub fn bin_of(&self, index: usize) -> Option<usize> {
        self.labels
            .get(index)
            .and_then(|&label| usize::try_from(label).ok())
    }

    /// Number of particles that received a bin.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.labels.iter().filter(|&&label| label >= 0).count()
    }

    /// Particle indices grouped by bin id, `num_bins` groups in id order.
    ///
    /// # Errors
    /// Returns [`Error::InputShape`] if a label is neither a valid bin id
    /// nor [`UNASSIGNED`].
    pub fn group_by_bin(&self, num_bins: usize) -> Result<Vec<Vec<usize>>> {
        let mut groups = vec![Vec::new(); num_bins];
        for (index, &label) in self.labels.iter().enumerate() {
            if label == UNASSIGNED {
                continue;
            }
            let group = usize::try_from(label)
                .ok()
                .and_then(|bin| groups.get_mut(bin))
                .ok_or_else(|| {
                    Error::InputShape(format!(
                        "particle {index} has label {label}, outside 0..{num_bins}"
                    ))
                })?;
            group.push(index);
        }
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_queries() {
        let assignment = Assignment::from_labels(vec![0, UNASSIGNED, 2, 0, UNASSIGNED]);
        assert_eq!(assignment.len(), 5);
        assert_eq!(assignment.assigned_count(), 3);
        assert_eq!(assignment.bin_of(2), Some(2));
        assert_eq!(assignment.bin_of(1), None);
        assert_eq!(assignment.bin_of(99), None);
    }

    #[test]
    fn test_group_by_bin() {
        let assignment = Assignment::from_labels(vec![0, UNASSIGNED, 2, 0]);
        let groups = assignment.group_by_bin(3).unwrap();
        assert_eq!(groups, vec![vec![0, 3], vec![], vec![2]]);
    }

    #[test]
    fn test_group_by_bin_rejects_out_of_range() {
        let assignment = Assignment::from_labels(vec![0, 5]);
        assert!(matches!(
            assignment.group_by_bin(3),
            Err(Error::InputShape(_))
        ));
        let assignment = Assignment::from_labels(vec![-7]);
        assert!(assignment.group_by_bin(3).is_err());
    }
}
