use std::collections::HashMap;

use crate::SocietyError;

/// One annotated observation (biosample).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Observation {
    pub id: String,
    pub subject: String,
    pub timepoint: String,
}

impl Observation {
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        timepoint: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            timepoint: timepoint.into(),
        }
    }
}

/// Subject and timepoint annotation for the observations of one society.
///
/// The index may describe more observations than the data matrix holds; lookups
/// for unknown identifiers simply return `None`.
#[derive(Debug, Clone, Default)]
pub struct ObservationIndex {
    observations: Vec<Observation>,
    by_id: HashMap<String, usize>,
}

impl ObservationIndex {
    pub fn new(observations: Vec<Observation>) -> Result<Self, SocietyError> {
        let mut by_id = HashMap::with_capacity(observations.len());
        for (i, obs) in observations.iter().enumerate() {
            if by_id.insert(obs.id.clone(), i).is_some() {
                return Err(SocietyError::DuplicateObservation { id: obs.id.clone() });
            }
        }
        Ok(Self {
            observations,
            by_id,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    #[must_use]
    pub fn get(&self, observation_id: &str) -> Option<&Observation> {
        self.by_id
            .get(observation_id)
            .map(|&i| &self.observations[i])
    }

    #[must_use]
    pub fn subject_of(&self, observation_id: &str) -> Option<&str> {
        self.get(observation_id).map(|obs| obs.subject.as_str())
    }

    #[must_use]
    pub fn timepoint_of(&self, observation_id: &str) -> Option<&str> {
        self.get(observation_id).map(|obs| obs.timepoint.as_str())
    }

    /// The observation collected from `subject` at `timepoint`, if any.
    #[must_use]
    pub fn observation_for(&self, subject: &str, timepoint: &str) -> Option<&str> {
        self.observations
            .iter()
            .rev()
            .find(|obs| obs.subject == subject && obs.timepoint == timepoint)
            .map(|obs| obs.id.as_str())
    }

    /// Distinct timepoint labels in first-seen order.
    #[must_use]
    pub fn timepoints(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for obs in &self.observations {
            if !seen.contains(&obs.timepoint.as_str()) {
                seen.push(obs.timepoint.as_str());
            }
        }
        seen
    }

    pub fn observations_at<'a>(&'a self, timepoint: &'a str) -> impl Iterator<Item = &'a Observation> {
        self.observations
            .iter()
            .filter(move |obs| obs.timepoint == timepoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ObservationIndex {
        ObservationIndex::new(vec![
            Observation::new("o1", "s1", "d0"),
            Observation::new("o2", "s2", "d0"),
            Observation::new("o3", "s1", "d7"),
            Observation::new("o4", "s2", "d7"),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookups() {
        let index = index();
        assert_eq!(index.subject_of("o3"), Some("s1"));
        assert_eq!(index.timepoint_of("o4"), Some("d7"));
        assert_eq!(index.observation_for("s2", "d7"), Some("o4"));
        assert_eq!(index.observation_for("s3", "d0"), None);
        assert_eq!(index.timepoints(), vec!["d0", "d7"]);
        let at_d0 = index.observations_at("d0").map(|o| o.id.as_str()).collect::<Vec<_>>();
        assert_eq!(at_d0, vec!["o1", "o2"]);
    }

    #[test]
    fn test_duplicate_id() {
        let err = ObservationIndex::new(vec![
            Observation::new("o1", "s1", "d0"),
            Observation::new("o1", "s2", "d0"),
        ])
        .unwrap_err();
        assert!(matches!(err, SocietyError::DuplicateObservation { .. }));
    }
}
