use hiconet_community::{CommunityDetector, CommunityMethod, DetectorConfig};
use hiconet_network::{AssociationConfig, AssociationNetworkBuilder};
use hiconet_society::{FeatureMatrix, MatchPlan, Observation, ObservationIndex, Society};
use rand::{SeedableRng as _, distr::Distribution as _};
use rand_distr::Normal;
use rand_pcg::Pcg32;

const N_SUBJECTS: usize = 12;

fn society(
    name: &str,
    prefix: &str,
    timepoint: &str,
    rows: &[Vec<f64>],
    reversed: bool,
) -> Society {
    let mut subjects = (0..N_SUBJECTS).collect::<Vec<_>>();
    if reversed {
        subjects.reverse();
    }
    let observation_ids = subjects
        .iter()
        .map(|s| format!("{prefix}{s}"))
        .collect::<Vec<_>>();
    // column j of `rows` belongs to subject j
    let rows = rows
        .iter()
        .map(|row| subjects.iter().map(|&s| row[s]).collect())
        .collect::<Vec<Vec<f64>>>();
    let matrix = FeatureMatrix::from_rows(
        (0..rows.len()).map(|f| format!("{name}{f}")).collect(),
        observation_ids.clone(),
        &rows,
    )
    .unwrap();
    let index = ObservationIndex::new(
        subjects
            .iter()
            .zip(&observation_ids)
            .map(|(s, id)| Observation::new(id.clone(), format!("subject{s}"), timepoint))
            .collect(),
    )
    .unwrap();
    Society::new(name, "test", matrix, index)
}

#[test]
fn test_detect_then_associate() {
    let mut rng = Pcg32::seed_from_u64(2024);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let small = Normal::new(0.0, 0.1).unwrap();
    let factor = (0..N_SUBJECTS).map(|_| normal.sample(&mut rng)).collect::<Vec<_>>();
    let mut driven = |sign: f64, loading: f64| {
        factor
            .iter()
            .map(|v| sign * loading * v + small.sample(&mut rng))
            .collect::<Vec<_>>()
    };

    let gene_rows = [
        driven(1.0, 1.0),
        driven(1.0, 2.0),
        driven(1.0, 0.5),
        driven(-1.0, 1.0),
        driven(-1.0, 1.5),
        driven(-1.0, 3.0),
    ];
    let titer_rows = [
        driven(1.0, 1.0),
        driven(1.0, 1.2),
        driven(1.0, 0.8),
        driven(1.0, 2.0),
    ];
    let genes = society("gene", "g", "d0", &gene_rows, false);
    let titers = society("titer", "h", "d28", &titer_rows, true);

    let detector = CommunityDetector::new(DetectorConfig {
        method: Some(CommunityMethod::CorrelationHierarchical),
        ..DetectorConfig::default()
    });
    let gene_communities = detector.detect_society(&genes).unwrap();
    let titer_communities = detector.detect_society(&titers).unwrap();
    assert_eq!(gene_communities.len(), 2);
    assert_eq!(titer_communities.len(), 1);

    let plan = MatchPlan::pair_by_subject(&genes, "d0", &titers, "d28");
    assert_eq!(plan.len(), Some(N_SUBJECTS));
    assert!(
        plan.subject_mismatches(genes.observations(), titers.observations())
            .is_empty()
    );

    let builder = AssociationNetworkBuilder::new(AssociationConfig {
        seed: Some(5),
        ..AssociationConfig::default()
    });
    let network = builder
        .build(
            &gene_communities,
            &titer_communities,
            genes.matrix(),
            titers.matrix(),
            &plan,
        )
        .unwrap();
    assert_eq!(network.len(), 2);
    assert!(network.edges[0].score >= network.edges[1].score);
    for edge in network.iter() {
        // both gene communities track the same factor as the titers
        assert!(edge.score > 0.9, "{edge:?}");
        assert!((0.0..=1.0).contains(&edge.p_value));
    }
}
