//! Paired-observation plans between two societies.

use std::collections::HashMap;

use crate::{ObservationIndex, Society};

/// Two position-paired observation id lists, one per society.
///
/// Position `i` of `observations1` and position `i` of `observations2` are
/// treated as the same subject and timepoint. The plan is not validated here:
/// the association builder rejects plans whose lists differ in length.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchPlan {
    observations1: Vec<String>,
    observations2: Vec<String>,
}

impl MatchPlan {
    #[must_use]
    pub fn new(observations1: Vec<String>, observations2: Vec<String>) -> Self {
        Self {
            observations1,
            observations2,
        }
    }

    /// Pairs the observations society 1 holds at `timepoint1` with the
    /// observations society 2 holds at `timepoint2` for the same subject.
    ///
    /// Only observations present in each society's data matrix take part.
    /// Society 1 column order is preserved; if society 2 has several
    /// observations for one subject at `timepoint2`, the last column wins.
    #[must_use]
    pub fn pair_by_subject(
        society1: &Society,
        timepoint1: &str,
        society2: &Society,
        timepoint2: &str,
    ) -> Self {
        let side2 = subject_observations(society2, timepoint2)
            .collect::<HashMap<_, _>>();
        let (observations1, observations2) = subject_observations(society1, timepoint1)
            .filter_map(|(subject, obs1)| {
                side2
                    .get(subject)
                    .map(|obs2| (obs1.to_owned(), (*obs2).to_owned()))
            })
            .unzip();
        Self {
            observations1,
            observations2,
        }
    }

    #[must_use]
    pub fn observations1(&self) -> &[String] {
        &self.observations1
    }

    #[must_use]
    pub fn observations2(&self) -> &[String] {
        &self.observations2
    }

    /// Number of matched pairs, or `None` when the two lists differ in length.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        (self.observations1.len() == self.observations2.len()).then_some(self.observations1.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations1.is_empty() && self.observations2.is_empty()
    }

    /// Positions whose paired observations are annotated with different
    /// subjects (or are missing from an index).
    ///
    /// Meant for upstream warnings on user-supplied plans; the association
    /// builder trusts the pairing as given.
    #[must_use]
    pub fn subject_mismatches(
        &self,
        index1: &ObservationIndex,
        index2: &ObservationIndex,
    ) -> Vec<usize> {
        self.observations1
            .iter()
            .zip(&self.observations2)
            .enumerate()
            .filter(|(_, (obs1, obs2))| {
                match (index1.subject_of(obs1), index2.subject_of(obs2)) {
                    (Some(s1), Some(s2)) => s1 != s2,
                    _ => true,
                }
            })
            .map(|(i, _)| i)
            .collect()
    }
}

/// `(subject, observation id)` for the matrix columns of `society` at `timepoint`.
fn subject_observations<'a>(
    society: &'a Society,
    timepoint: &'a str,
) -> impl Iterator<Item = (&'a str, &'a str)> {
    let index = society.observations();
    society
        .matrix()
        .observation_ids()
        .iter()
        .filter_map(move |id| {
            let obs = index.get(id)?;
            (obs.timepoint == timepoint).then_some((obs.subject.as_str(), id.as_str()))
        })
}
