use std::error::Error;

use psha_lib::calc::compute_hazard;
use psha_lib::config::CalcConfig;
use psha_lib::config::demo_models;
use psha_lib::gmm::{Gmm, GmmSet};
use psha_lib::imt::Imt;
use psha_lib::mfd::Mfd;
use psha_lib::model::{HazardModel, SourceSet};
use psha_lib::readers::{matches_expected, read_expected_curves};
use psha_lib::site::Site;
use psha_lib::source::{ClusterSource, FaultSource, GridSource, Source};
use psha_lib::surface::{PointSurface, RuptureSurface};
use psha_lib::system::SystemSourceSet;
use psha_lib::writers::write_hazard_results;

fn site(name: &str, lon: f64, lat: f64) -> Site {
    Site::builder()
        .name(name)
        .location(lon, lat)
        .vs30(400.0)
        .build()
        .unwrap()
}

fn fault(name: &str, lat0: f64, rate: f64) -> Source {
    Source::Fault(
        FaultSource::builder()
            .name(name)
            .trace((142.5, lat0), (142.6, lat0 + 0.4))
            .dip(60.0)
            .z_top(1.0)
            .width(14.0)
            .rake(90.0)
            .mfd(Mfd::Single { mag: 6.7, rate })
            .build()
            .unwrap(),
    )
}

fn two_gmm_tree() -> GmmSet {
    GmmSet::builder()
        .weights([(Gmm::Mf2013Crustal, 0.6), (Gmm::Mf2013Interplate, 0.4)])
        .far_weights([(Gmm::Mf2013Crustal, 0.5), (Gmm::Mf2013Interplate, 0.5)])
        .cutoff(100.0)
        .blend_band(40.0)
        .build()
        .unwrap()
}

/// Fault + grid + cluster sets in one model, exercising every ordinary
/// pipeline plus the cluster specialization.
fn combined_model() -> HazardModel {
    let faults = SourceSet::builder()
        .name("faults")
        .id(1)
        .weight(0.6)
        .gmms(two_gmm_tree())
        .sources(vec![fault("f1", 50.2, 0.01), fault("f2", 50.6, 0.004)])
        .build()
        .unwrap();

    let grid = GridSource::builder()
        .name("background")
        .node(142.7, 50.3, 10.0, Mfd::GutenbergRichter {
            a: 3.0,
            b: 0.9,
            m_min: 5.0,
            m_max: 7.0,
            d_mag: 0.5,
        })
        .node(143.0, 50.5, 10.0, Mfd::GutenbergRichter {
            a: 3.1,
            b: 0.9,
            m_min: 5.0,
            m_max: 7.0,
            d_mag: 0.5,
        })
        .build()
        .unwrap();
    let grids = SourceSet::builder()
        .name("grids")
        .id(2)
        .weight(1.0)
        .gmms(GmmSet::single(Gmm::Mf2013Crustal))
        .sources(vec![Source::Grid(grid)])
        .build()
        .unwrap();

    let segment = |name: &str, lat0: f64, mag: f64| {
        FaultSource::builder()
            .name(name)
            .trace((142.4, lat0), (142.5, lat0 + 0.3))
            .dip(50.0)
            .z_top(0.5)
            .width(12.0)
            .mfd(Mfd::Single { mag, rate: 1.0 })
            .build()
            .unwrap()
    };
    let cluster = ClusterSource::builder()
        .name("paired")
        .rate(0.002)
        .segment(segment("seg a", 50.1, 6.8))
        .segment(segment("seg b", 50.4, 7.0))
        .build()
        .unwrap();
    let clusters = SourceSet::builder()
        .name("clusters")
        .id(3)
        .weight(0.8)
        .gmms(GmmSet::single(Gmm::Mf2013Crustal))
        .clusters(vec![cluster])
        .build()
        .unwrap();

    HazardModel::builder()
        .name("combined")
        .source_set(faults)
        .source_set(grids)
        .source_set(clusters)
        .build()
        .unwrap()
}

fn assert_rel(a: f64, b: f64, tolerance: f64) {
    let scale = a.abs().max(b.abs());
    assert!(
        a == b || (a - b).abs() <= tolerance * scale,
        "{a} vs {b} beyond relative {tolerance}"
    );
}

#[test]
fn test_sequential_parallel_bitwise_identical() -> Result<(), Box<dyn Error>> {
    let model = combined_model();
    let config = CalcConfig::builder()
        .imts(vec![Imt::Pga, Imt::Sa1P0])
        .build()?;
    let site = site("s1", 142.6, 50.4);

    let sequential = compute_hazard(&model, &config, &site, None)?;
    let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build()?;
    let parallel = compute_hazard(&model, &config, &site, Some(&pool))?;

    for imt in [Imt::Pga, Imt::Sa1P0] {
        let (s, p) = (sequential.total(imt).unwrap(), parallel.total(imt).unwrap());
        for (ys, yp) in s.ys().iter().zip(p.ys().iter()) {
            assert_eq!(ys.to_bits(), yp.to_bits());
        }
        let (s, p) = (
            sequential.probability(imt).unwrap(),
            parallel.probability(imt).unwrap(),
        );
        for (ys, yp) in s.ys().iter().zip(p.ys().iter()) {
            assert_eq!(ys.to_bits(), yp.to_bits());
        }
    }
    Ok(())
}

#[test]
fn test_rate_additivity_over_split_sets() -> Result<(), Box<dyn Error>> {
    let set = |sources: Vec<Source>| {
        SourceSet::builder()
            .name("faults")
            .weight(0.5)
            .gmms(two_gmm_tree())
            .sources(sources)
            .build()
            .unwrap()
    };
    let model = |sources: Vec<Source>| {
        HazardModel::builder()
            .name("split")
            .source_set(set(sources))
            .build()
            .unwrap()
    };
    let config = CalcConfig::builder().build()?;
    let site = site("s1", 142.6, 50.4);

    let both = compute_hazard(
        &model(vec![fault("f1", 50.2, 0.01), fault("f2", 50.6, 0.004)]),
        &config,
        &site,
        None,
    )?;
    let first = compute_hazard(&model(vec![fault("f1", 50.2, 0.01)]), &config, &site, None)?;
    let second = compute_hazard(&model(vec![fault("f2", 50.6, 0.004)]), &config, &site, None)?;

    let total = both.total(Imt::Pga).unwrap();
    let a = first.total(Imt::Pga).unwrap();
    let b = second.total(Imt::Pga).unwrap();
    for i in 0..total.len() {
        assert_rel(total.ys()[i], a.ys()[i] + b.ys()[i], 1e-12);
    }
    Ok(())
}

#[test]
fn test_demo_curves_non_negative_and_monotone() -> Result<(), Box<dyn Error>> {
    let config = CalcConfig::builder().build()?;
    let site = site("s1", 142.6, 50.4);
    for name in ["demo_single_fault", "demo_grid", "demo_cluster"] {
        let model = demo_models().get(name).unwrap();
        let result = compute_hazard(model, &config, &site, None)?;
        for curve in [
            result.total(Imt::Pga).unwrap(),
            result.probability(Imt::Pga).unwrap(),
        ] {
            assert!(curve.ys().iter().all(|y| *y >= 0.0), "{name}");
            assert!(curve.ys().windows(2).all(|w| w[0] >= w[1]), "{name}");
            assert!(curve.ys().iter().all(|y| y.is_finite()), "{name}");
        }
        // Something must actually contribute at the lowest level.
        assert!(result.total(Imt::Pga).unwrap().ys()[0] > 0.0, "{name}");
    }
    Ok(())
}

#[test]
fn test_round_trip_through_results_format() -> Result<(), Box<dyn Error>> {
    let model = combined_model();
    let config = CalcConfig::builder().build()?;
    let sites = vec![site("site a", 142.6, 50.4), site("site b", 142.9, 50.2)];

    let results: Vec<_> = sites
        .iter()
        .map(|s| compute_hazard(&model, &config, s, None))
        .collect::<Result<_, _>>()?;

    let path = std::env::temp_dir().join("psha_roundtrip_pga.csv");
    write_hazard_results(&path, b',', &results, Imt::Pga)?;
    let expected = read_expected_curves(&path)?;
    assert_eq!(expected.len(), results.len());

    // Pair rows by site name; written values parse back bitwise equal.
    for result in &results {
        let row = expected
            .iter()
            .find(|e| e.site_name == result.site().name)
            .unwrap();
        let curve = result.probability(Imt::Pga).unwrap();
        assert_eq!(row.values.len(), curve.len());
        for (read, computed) in row.values.iter().zip(curve.ys().iter()) {
            assert!(matches_expected(*read, *computed, 1e-12));
        }
    }
    std::fs::remove_file(&path)?;
    Ok(())
}

fn system_set(ruptures: &[(f64, f64, Vec<usize>)]) -> SourceSet {
    let mut builder = SystemSourceSet::builder()
        .name("system")
        .section(RuptureSurface::Point(PointSurface {
            location: geo::Point::new(142.0, 50.0),
            depth: 8.0,
        }))
        .section(RuptureSurface::Point(PointSurface {
            location: geo::Point::new(146.0, 50.0),
            depth: 8.0,
        }));
    for (mag, rate, sections) in ruptures {
        builder = builder.rupture(*mag, *rate, 0.0, sections.clone());
    }
    SourceSet::builder()
        .name("system set")
        .weight(1.0)
        .gmms(GmmSet::single(Gmm::Mf2013Crustal))
        .system(builder.build().unwrap())
        .distance_filter(100.0)
        .build()
        .unwrap()
}

#[test]
fn test_system_bitset_excludes_distant_ruptures() -> Result<(), Box<dyn Error>> {
    let config = CalcConfig::builder().build()?;
    let site = site("s1", 142.1, 50.0);

    // The third rupture touches only the far section, 280 km out, beyond
    // the 100 km set filter.
    let full = HazardModel::builder()
        .name("sys")
        .source_set(system_set(&[
            (6.5, 1e-3, vec![0]),
            (7.0, 5e-4, vec![0, 1]),
            (6.0, 2e-3, vec![1]),
        ]))
        .build()
        .unwrap();
    let near_only = HazardModel::builder()
        .name("sys")
        .source_set(system_set(&[(6.5, 1e-3, vec![0]), (7.0, 5e-4, vec![0, 1])]))
        .build()
        .unwrap();

    let a = compute_hazard(&full, &config, &site, None)?;
    let b = compute_hazard(&near_only, &config, &site, None)?;
    let (ta, tb) = (a.total(Imt::Pga).unwrap(), b.total(Imt::Pga).unwrap());
    for (ya, yb) in ta.ys().iter().zip(tb.ys().iter()) {
        assert_eq!(ya.to_bits(), yb.to_bits());
    }
    assert!(ta.ys()[0] > 0.0);
    Ok(())
}

#[test]
fn test_system_matches_equivalent_grid() -> Result<(), Box<dyn Error>> {
    let config = CalcConfig::builder().build()?;
    let site = site("s1", 142.1, 50.0);

    let system = HazardModel::builder()
        .name("sys")
        .source_set(system_set(&[(6.5, 1e-3, vec![0])]))
        .build()
        .unwrap();

    let grid = GridSource::builder()
        .name("equivalent")
        .node(142.0, 50.0, 8.0, Mfd::Single { mag: 6.5, rate: 1e-3 })
        .build()
        .unwrap();
    let grid_model = HazardModel::builder()
        .name("grid")
        .source_set(
            SourceSet::builder()
                .name("grid set")
                .weight(1.0)
                .gmms(GmmSet::single(Gmm::Mf2013Crustal))
                .sources(vec![Source::Grid(grid)])
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let a = compute_hazard(&system, &config, &site, None)?;
    let b = compute_hazard(&grid_model, &config, &site, None)?;
    let (ta, tb) = (a.total(Imt::Pga).unwrap(), b.total(Imt::Pga).unwrap());
    for (ya, yb) in ta.ys().iter().zip(tb.ys().iter()) {
        assert_eq!(ya.to_bits(), yb.to_bits());
    }
    Ok(())
}
