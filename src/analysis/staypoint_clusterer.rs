//! Density-based (DBSCAN) grouping of stay points into persistent locations.

use {
    crate::{
        config::ClustererConfig,
        domain::{Location, LocationId, StayPoint, haversine_m},
        error::PipelineResult,
    },
    std::collections::VecDeque,
};

#[derive(Debug, Clone)]
pub struct StayPointClusterer {
    epsilon_m: f64,
    min_points: usize,
    weight_by_fix_count: bool,
}

impl StayPointClusterer {
    pub fn new(config: ClustererConfig) -> PipelineResult<Self> {
        config.validate()?;

        log::debug!(
            "Initialized StayPointClusterer: epsilon {}, min points {}, weighted {}",
            config.epsilon,
            config.min_points,
            config.weight_by_fix_count
        );

        Ok(Self {
            epsilon_m: config.epsilon.value(),
            min_points: config.min_points,
            weight_by_fix_count: config.weight_by_fix_count,
        })
    }

    /// Groups stay points into locations. Every input stay point ends up in exactly one
    /// location: dense regions become one location each, the rest become singleton noise
    /// locations. Ids are assigned by ascending first arrival.
    pub fn cluster(&self, stay_points: Vec<StayPoint>) -> Vec<Location> {
        if stay_points.is_empty() {
            log::warn!("No stay points to cluster. Returning no locations.");
            return Vec::new();
        }

        let labels = self.label(&stay_points);
        let cluster_count = labels.iter().flatten().max().map_or(0, |&c| c + 1);

        let mut members: Vec<Vec<StayPoint>> = vec![Vec::new(); cluster_count];
        let mut noise: Vec<StayPoint> = Vec::new();
        for (sp, label) in stay_points.into_iter().zip(&labels) {
            match label {
                Some(c) => members[*c].push(sp),
                None => noise.push(sp),
            }
        }

        let noise_count = noise.len();
        let mut locations: Vec<Location> = members
            .into_iter()
            .map(|visits| (visits, false))
            .chain(noise.into_iter().map(|sp| (vec![sp], true)))
            .filter_map(|(visits, is_noise)| Location::new(LocationId::default(), visits, is_noise))
            .collect();

        locations.sort_by(|a, b| {
            a.stats()
                .first_visit
                .cmp(&b.stats().first_visit)
                .then(a.centroid().lat.total_cmp(&b.centroid().lat))
                .then(a.centroid().lon.total_cmp(&b.centroid().lon))
        });

        let locations: Vec<Location> = locations
            .into_iter()
            .enumerate()
            .map(|(i, loc)| loc.with_id(LocationId(i as u32)))
            .collect();

        log::info!(
            "Clustering complete: {} dense locations, {} noise stay points kept as singletons.",
            cluster_count,
            noise_count
        );

        locations
    }

    fn weight(&self, sp: &StayPoint) -> f64 {
        if self.weight_by_fix_count {
            sp.fix_count as f64
        } else {
            1.0
        }
    }

    /// DBSCAN labels (cluster index or None for noise). Seeds are taken in input order and
    /// border points join the first cluster that reaches them, so the result depends only
    /// on input order and parameters.
    fn label(&self, stay_points: &[StayPoint]) -> Vec<Option<usize>> {
        let n = stay_points.len();

        let neighbours: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&j| {
                        haversine_m(&stay_points[i].centroid, &stay_points[j].centroid)
                            <= self.epsilon_m
                    })
                    .collect()
            })
            .collect();

        let is_core: Vec<bool> = neighbours
            .iter()
            .map(|hood| {
                let density: f64 = hood.iter().map(|&j| self.weight(&stay_points[j])).sum();
                density >= self.min_points as f64
            })
            .collect();

        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut next_cluster = 0;

        for seed in 0..n {
            if labels[seed].is_some() || !is_core[seed] {
                continue;
            }

            let cluster = next_cluster;
            next_cluster += 1;
            labels[seed] = Some(cluster);

            let mut frontier: VecDeque<usize> = neighbours[seed].iter().copied().collect();
            while let Some(j) = frontier.pop_front() {
                if labels[j].is_some() {
                    continue;
                }
                labels[j] = Some(cluster);
                if is_core[j] {
                    frontier.extend(neighbours[j].iter().copied().filter(|&k| labels[k].is_none()));
                }
            }
        }

        labels
    }
}

/// Davies-Bouldin index of the dense (non-noise) locations, using great-circle distances.
/// Lower is better. None when fewer than two dense locations exist.
pub fn davies_bouldin_index(locations: &[Location]) -> Option<f64> {
    let clusters: Vec<&Location> = locations.iter().filter(|l| !l.is_noise()).collect();
    if clusters.len() < 2 {
        log::info!("Fewer than 2 clusters. Unable to calculate Davies-Bouldin index.");
        return None;
    }

    let scatter: Vec<f64> = clusters
        .iter()
        .map(|loc| {
            let centre = loc.centroid();
            let total: f64 = loc
                .visits()
                .iter()
                .map(|sp| haversine_m(&sp.centroid, &centre))
                .sum();
            total / loc.visits().len() as f64
        })
        .collect();

    let worst_ratios: Vec<f64> = (0..clusters.len())
        .map(|i| {
            (0..clusters.len())
                .filter(|&j| j != i)
                .filter_map(|j| {
                    let separation = haversine_m(&clusters[i].centroid(), &clusters[j].centroid());
                    (separation > 0.0).then(|| (scatter[i] + scatter[j]) / separation)
                })
                .fold(0.0, f64::max)
        })
        .collect();

    let score = worst_ratios.iter().sum::<f64>() / worst_ratios.len() as f64;
    log::info!("Clustering resulted in a Davies-Bouldin index of {:.4}", score);
    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Meters, constants},
        domain::GeoPoint,
        error::PipelineError,
    };
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use std::collections::BTreeSet;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2009, 3, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn sp(d: u32, lat: f64, lon: f64, fixes: usize) -> StayPoint {
        StayPoint {
            arrival: day(d),
            departure: day(d) + TimeDelta::hours(1),
            centroid: GeoPoint::new(lat, lon),
            fix_count: fixes,
        }
    }

    fn clusterer() -> StayPointClusterer {
        StayPointClusterer::new(constants::clusterer::DEFAULT).unwrap()
    }

    /// Home-ish group (days 2, 4, 6), office-ish group (days 3, 5), one lone visit (day 1).
    fn sample() -> Vec<StayPoint> {
        vec![
            sp(1, 40.10, 116.50, 5),
            sp(2, 39.9840, 116.3180, 20),
            sp(3, 39.9990, 116.3260, 8),
            sp(4, 39.9842, 116.3181, 12),
            sp(5, 39.9991, 116.3262, 9),
            sp(6, 39.9839, 116.3179, 30),
        ]
    }

    fn membership(locations: &[Location]) -> BTreeSet<Vec<NaiveDateTime>> {
        locations
            .iter()
            .map(|l| l.visits().iter().map(|v| v.arrival).collect())
            .collect()
    }

    #[test]
    fn empty_input_yields_no_locations() {
        assert!(clusterer().cluster(Vec::new()).is_empty());
    }

    #[test]
    fn dense_groups_and_noise_are_all_kept() {
        let input = sample();
        let locations = clusterer().cluster(input.clone());

        assert_eq!(locations.len(), 3);
        let total: usize = locations.iter().map(Location::visit_count).sum();
        assert_eq!(total, input.len());

        let noise: Vec<_> = locations.iter().filter(|l| l.is_noise()).collect();
        assert_eq!(noise.len(), 1);
        assert_eq!(noise[0].visit_count(), 1);
    }

    #[test]
    fn ids_follow_first_arrival() {
        let locations = clusterer().cluster(sample());
        let ids: Vec<u32> = locations.iter().map(|l| l.id().0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(locations[0].stats().first_visit, day(1));
        assert_eq!(locations[1].stats().first_visit, day(2));
        assert_eq!(locations[2].stats().first_visit, day(3));
    }

    #[test]
    fn reordering_inside_a_region_keeps_membership() {
        let forward = clusterer().cluster(sample());

        let mut shuffled = sample();
        shuffled.swap(1, 5);
        shuffled.swap(3, 5);
        let reordered = clusterer().cluster(shuffled);

        assert_eq!(membership(&forward), membership(&reordered));
        let ids_f: Vec<_> = forward.iter().map(|l| (l.id(), l.visit_count())).collect();
        let ids_r: Vec<_> = reordered.iter().map(|l| (l.id(), l.visit_count())).collect();
        assert_eq!(ids_f, ids_r);
    }

    #[test]
    fn clustering_is_reproducible() {
        let a = clusterer().cluster(sample());
        let b = clusterer().cluster(sample());
        assert_eq!(a, b);
    }

    #[test]
    fn fix_count_weighting_densifies_long_stays() {
        let lone = vec![sp(1, 39.98, 116.31, 5), sp(9, 41.0, 117.0, 1)];
        let config = ClustererConfig {
            epsilon: Meters::new(200.0),
            min_points: 3,
            weight_by_fix_count: false,
        };

        let plain = StayPointClusterer::new(config).unwrap().cluster(lone.clone());
        assert!(plain.iter().all(Location::is_noise));

        let weighted = StayPointClusterer::new(ClustererConfig {
            weight_by_fix_count: true,
            ..config
        })
        .unwrap()
        .cluster(lone);
        assert_eq!(weighted.iter().filter(|l| !l.is_noise()).count(), 1);
        assert_eq!(weighted.len(), 2);
    }

    #[test]
    fn location_centroid_is_fix_weighted() {
        let locations = clusterer().cluster(sample());
        let home = &locations[1];
        let expected_lat = (39.9840 * 20.0 + 39.9842 * 12.0 + 39.9839 * 30.0) / 62.0;
        assert!((home.centroid().lat - expected_lat).abs() < 1e-12);
    }

    #[test]
    fn davies_bouldin_needs_two_dense_locations() {
        let locations = clusterer().cluster(sample());
        let score = davies_bouldin_index(&locations).unwrap();
        assert!(score > 0.0 && score < 1.0, "got {score}");

        let single = clusterer().cluster(sample().into_iter().skip(1).step_by(2).collect());
        assert_eq!(davies_bouldin_index(&single), None);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let bad = ClustererConfig {
            epsilon: Meters::new(-1.0),
            ..constants::clusterer::DEFAULT
        };
        assert!(matches!(
            StayPointClusterer::new(bad),
            Err(PipelineError::Configuration(_))
        ));
    }
}
