use nalgebra::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use envcontour::calc::*;
use envcontour::distr::*;
use envcontour::contour::*;
use envcontour::graph::sort_points_to_form_continuous_line;
use envcontour::model::ModelSpec;

const EPS : f64 = 10E-8;

// Significant wave height (Weibull) and zero-upcrossing period (Lognormal, conditioned on the
// wave height) for a North Sea site.
fn wave_distribution() -> Arc<MultivariateDistribution> {
    let hs = Weibull::new(1.471, 0.8888, 2.776);
    let tz = Lognormal::new(
        Param::function(Function::Exp3, 0.04, 0.1748, -0.2243),
        Param::function(Function::Power3, 0.1, 1.489, 0.1901)
    );
    Arc::new(MultivariateDistribution::new(
        vec![Arc::new(hs), Arc::new(tz)],
        vec![Dependency::independent(), Dependency::new(Some(0), None, Some(0))]
    ).unwrap())
}

fn standard_normals(n : usize) -> Arc<MultivariateDistribution> {
    let dists : Vec<Arc<dyn Marginal>> = (0..n).map(|_| Arc::new(Normal::new(0.0, 1.0)) as Arc<dyn Marginal> ).collect();
    Arc::new(MultivariateDistribution::new(dists, vec![Dependency::independent(); n]).unwrap())
}

// Settings for which the exceedance probability of a single state is 0.1.
fn ten_percent() -> ContourSettings {
    ContourSettings::new(1., 0.1 * 365.25 * 24.)
}

fn assert_branches_consistent(c : &dyn Contour) {
    let n_dim = c.distribution().n_dim();
    for b in c.coordinates().branches() {
        assert_eq!(b.len(), n_dim);
        assert!(b.iter().all(|v| v.nrows() == b[0].nrows() ));
    }
}

#[test]
fn iform_wave_contour() {
    let c = IFormContour::new(wave_distribution(), ContourSettings::default(), 400).unwrap();
    assert!((c.beta() - 4.348787075738755).abs() < 1E-6);
    match c.coordinates() {
        Coordinates::Unimodal(xs) => {
            assert_eq!(xs.len(), 2);
            assert_eq!(xs[0].len(), 400);
            assert_eq!(xs[1].len(), 400);
            assert!(xs[0].iter().all(|hs| *hs >= 0.8888 ));
            assert!(xs[1].iter().all(|tz| *tz > 0.0 ));
        },
        _ => panic!("IFORM contours are unimodal")
    }
    assert_eq!(c.sphere_points().shape(), (400, 2));
    for p in c.sphere_points().row_iter() {
        assert!((p.norm() - c.beta()).abs() < 1E-9 * c.beta());
    }
    assert_branches_consistent(&c);
}

#[test]
fn isorm_radius_dominates_iform() {
    let settings = ContourSettings::default();
    let iform = IFormContour::new(wave_distribution(), settings, 100).unwrap();
    let isorm = ISormContour::new(wave_distribution(), settings, 100).unwrap();
    assert!(isorm.beta() >= iform.beta());
    assert!((isorm.beta() - 4.8768938060488445).abs() < 1E-6);
    for p in isorm.sphere_points().row_iter() {
        assert!((p.norm() - isorm.beta()).abs() < 1E-9 * isorm.beta());
    }

    // Three dimensions: points spread over the whole sphere.
    let c = ISormContour::new(standard_normals(3), settings, 500).unwrap();
    assert_eq!(c.sphere_points().shape(), (500, 3));
    for p in c.sphere_points().row_iter() {
        assert!((p.norm() - c.beta()).abs() < 1E-9 * c.beta());
    }
    assert_branches_consistent(&c);
}

#[test]
fn direct_sampling_requires_two_dimensions() {
    for n in [1, 3].iter() {
        let opts = DirectSamplingOptions { n : 100, ..Default::default() };
        match DirectSamplingContour::new(standard_normals(*n), ContourSettings::default(), opts) {
            Err(ContourError::NotImplemented { n_dim }) => assert_eq!(n_dim, *n),
            other => panic!("Unexpected result: {:?}", other)
        }
    }
}

#[test]
fn direct_sampling_of_standard_normal_is_circle() {
    let opts = DirectSamplingOptions::default().with_seed(42);
    let c = DirectSamplingContour::new(standard_normals(2), ten_percent(), opts).unwrap();
    assert_eq!(c.sample().shape(), (2, 100_000));
    let r = std_normal_upper_quantile(0.1);
    match c.coordinates() {
        Coordinates::Unimodal(xs) => {
            assert_eq!(xs[0].len(), 72);
            for i in 0..72 {
                let ri = (xs[0][i].powf(2.) + xs[1][i].powf(2.)).sqrt();
                assert!((ri - r).abs() < 0.05);
            }
        },
        _ => panic!("Direct sampling contours are unimodal")
    }

    // A contour computed from the same sample is identical.
    let reuse = DirectSamplingOptions::default().with_sample(c.sample().clone());
    let c2 = DirectSamplingContour::new(standard_normals(2), ten_percent(), reuse).unwrap();
    assert_eq!(c.coordinates(), c2.coordinates());
    assert_branches_consistent(&c2);
}

#[test]
fn hdc_wave_contour() {
    let c = HighestDensityContour::new(
        wave_distribution(),
        ContourSettings::default(),
        Some(vec![(0., 20.), (0., 18.)]),
        Some(Deltas::PerDimension(vec![0.1, 0.1]))
    ).unwrap();
    assert!(!c.mass_shortfall());
    assert!(c.fm() > 0.0);
    assert_eq!(c.sample_coords()[0].len(), 201);
    assert_eq!(c.sample_coords()[1].len(), 181);
    assert_eq!(c.deltas(), &[0.1, 0.1]);
    assert!(c.coordinates().n_branches() >= 1);
    assert!(c.coordinates().n_points() > 0);
    assert_branches_consistent(&c);

    // Boundary points are grid points inside the limits.
    for b in c.coordinates().branches() {
        assert!(b[0].iter().all(|hs| *hs >= 0. && *hs <= 20. + EPS ));
        assert!(b[1].iter().all(|tz| *tz >= 0. && *tz <= 18. + EPS ));
    }

    // Ordered boundary is a permutation of the boundary points.
    if let Coordinates::Unimodal(xs) = c.coordinates() {
        let (x, y) = sort_points_to_form_continuous_line(&xs[0], &xs[1], false);
        let sum = |v : &DVector<f64>| v.iter().sum::<f64>();
        assert_eq!(x.len(), xs[0].len());
        assert!((sum(&x) - sum(&xs[0])).abs() < 1E-6);
        assert!((sum(&y) - sum(&xs[1])).abs() < 1E-6);
    }
}

#[test]
fn hdc_default_grid() {
    let c = HighestDensityContour::new(wave_distribution(), ContourSettings::default(), None, None).unwrap();
    let limits = c.limits();
    assert_eq!(limits.len(), 2);
    assert_eq!(limits[0].0, 0.0);
    assert_eq!(limits[0], limits[1]);

    // The upper limit is the Weibull quantile at 1 - alpha_m / 10, with alpha_m from the ISORM radius.
    let alpha_m = std_normal_cdf(-4.8768938060488445);
    let p = 1. - 0.1 * alpha_m;
    let upper = 0.8888 + 2.776 * (-(1. - p).ln()).powf(1. / 1.471);
    assert!((limits[0].1 - upper).abs() < 1E-6 * upper);
    assert!((c.deltas()[0] - 0.0025 * upper).abs() < 1E-6 * c.deltas()[0]);
    assert!(!c.mass_shortfall());
}

/// Equal mixture of two normals, at -3 and 3, with standard deviation 0.5.
#[derive(Debug)]
struct Bimodal;

impl Bimodal {

    fn mix<F : Fn(f64) -> f64>(x : &DVector<f64>, f : F) -> DVector<f64> {
        x.map(|xi| 0.5 * f((xi + 3.) / 0.5) + 0.5 * f((xi - 3.) / 0.5) )
    }

}

impl Marginal for Bimodal {

    fn name(&self) -> &str {
        "Bimodal"
    }

    fn cdf(&self, x : &DVector<f64>, _cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        Ok(Bimodal::mix(x, std_normal_cdf))
    }

    fn i_cdf(&self, p : &DVector<f64>, _cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        Ok(p.map(|pi| {
            let (mut low, mut high) = (-10., 10.);
            for _ in 0..100 {
                let mid = 0.5 * (low + high);
                if Bimodal::mix(&DVector::from_element(1, mid), std_normal_cdf)[0] < pi {
                    low = mid;
                } else {
                    high = mid;
                }
            }
            0.5 * (low + high)
        }))
    }

    fn pdf(&self, x : &DVector<f64>, _cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        let phi = |z : f64| (-0.5 * z * z).exp() / (2. * std::f64::consts::PI).sqrt();
        Ok(Bimodal::mix(x, phi).map(|f| f / 0.5 ))
    }

}

#[test]
fn hdc_separates_modes() {
    let dist = Arc::new(MultivariateDistribution::new(
        vec![Arc::new(Bimodal), Arc::new(Normal::new(0.0, 1.0))],
        vec![Dependency::independent(); 2]
    ).unwrap());
    let c = HighestDensityContour::new(
        dist,
        ten_percent(),
        Some(vec![(-6., 6.), (-4., 4.)]),
        Some(Deltas::Uniform(0.05))
    ).unwrap();
    assert!(!c.mass_shortfall());
    match c.coordinates() {
        Coordinates::Multimodal(bs) => {
            assert_eq!(bs.len(), 2);

            // Components are found in raster order, so the left mode comes first.
            assert!(bs[0][0].iter().all(|x| *x < 0.0 ));
            assert!(bs[1][0].iter().all(|x| *x > 0.0 ));
        },
        _ => panic!("Expected one contour per mode")
    }
    assert_branches_consistent(&c);
}

/// Standard normal that takes one second to answer.
#[derive(Debug)]
struct Slow;

impl Marginal for Slow {

    fn name(&self) -> &str {
        "Slow"
    }

    fn cdf(&self, x : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        thread::sleep(Duration::from_secs(1));
        Normal::new(0.0, 1.0).cdf(x, cond)
    }

    fn i_cdf(&self, p : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        thread::sleep(Duration::from_secs(1));
        Normal::new(0.0, 1.0).i_cdf(p, cond)
    }

    fn pdf(&self, x : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        thread::sleep(Duration::from_secs(1));
        Normal::new(0.0, 1.0).pdf(x, cond)
    }

}

#[test]
fn slow_calculations_time_out() {
    let dist = Arc::new(MultivariateDistribution::new(
        vec![Arc::new(Slow), Arc::new(Slow)],
        vec![Dependency::independent(); 2]
    ).unwrap());
    let settings = ContourSettings::default().with_timeout(0.001);
    let methods = vec![
        ContourMethod::Iform { n_points : 10 },
        ContourMethod::Isorm { n_points : 10 },
        ContourMethod::Direct(DirectSamplingOptions { n : 100, ..Default::default() }),
        ContourMethod::Hdc { limits : Some(vec![(-3., 3.), (-3., 3.)]), deltas : Some(Deltas::Uniform(0.5)) }
    ];
    for method in methods.iter() {
        let start = Instant::now();
        match method.compute(dist.clone(), settings) {
            Err(ContourError::Timeout { seconds }) => assert!((seconds - 0.001).abs() < EPS),
            Err(e) => panic!("Unexpected error: {}", e),
            Ok(c) => panic!("{} contour should have timed out", c.name())
        }
        assert!(start.elapsed() < Duration::from_millis(150));
    }
    let msg = format!("{}", ContourError::Timeout { seconds : 0.001 });
    assert!(msg.contains("'0.001 seconds'"));
}

/// Standard normal that counts the calls to its cdf and inverse cdf, taking a few
/// milliseconds to answer each.
#[derive(Debug)]
struct Counting {
    calls : Arc<AtomicUsize>,
    delay : Duration
}

impl Counting {

    fn new(delay_ms : u64) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { calls : calls.clone(), delay : Duration::from_millis(delay_ms) }, calls)
    }

}

impl Marginal for Counting {

    fn name(&self) -> &str {
        "Counting"
    }

    fn cdf(&self, x : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        Normal::new(0.0, 1.0).cdf(x, cond)
    }

    fn i_cdf(&self, p : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        Normal::new(0.0, 1.0).i_cdf(p, cond)
    }

    fn pdf(&self, x : &DVector<f64>, cond : &Conditioning<'_>) -> Result<DVector<f64>, DistributionError> {
        Normal::new(0.0, 1.0).pdf(x, cond)
    }

}

// Runs the method under a short timeout, and returns the number of marginal calls made
// when the timeout was reported and a while after it.
fn calls_after_timeout(method : ContourMethod, delay_ms : u64) -> (usize, usize) {
    let (counting, calls) = Counting::new(delay_ms);
    let dist = Arc::new(MultivariateDistribution::new(
        vec![Arc::new(Normal::new(0.0, 1.0)), Arc::new(counting)],
        vec![Dependency::independent(); 2]
    ).unwrap());
    match method.compute(dist, ContourSettings::default().with_timeout(0.05)) {
        Err(ContourError::Timeout { .. }) => { },
        Err(e) => panic!("Unexpected error: {}", e),
        Ok(c) => panic!("{} contour should have timed out", c.name())
    }
    let at_timeout = calls.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(300));
    (at_timeout, calls.load(Ordering::SeqCst))
}

#[test]
fn timed_out_workers_stop_calling_marginals() {
    // 801 x 801 grid: one row of two cdf calls per point of the first dimension.
    let hdc = ContourMethod::Hdc { limits : Some(vec![(-4., 4.), (-4., 4.)]), deltas : Some(Deltas::Uniform(0.01)) };
    let (at_timeout, later) = calls_after_timeout(hdc, 1);
    assert!(at_timeout > 0);

    // At most the row being evaluated when the timeout expired is finished.
    assert!(later <= at_timeout + 2, "{} cdf calls at the timeout, {} later", at_timeout, later);

    // 6400 points: one inverse cdf call per chunk of sphere points.
    let (at_timeout, later) = calls_after_timeout(ContourMethod::Iform { n_points : 6400 }, 10);
    assert!(at_timeout > 0);
    assert!(later <= at_timeout + 1, "{} inverse cdf calls at the timeout, {} later", at_timeout, later);
}

#[test]
fn contour_from_json_model() {
    let model : ModelSpec = r#"{ "marginals" : [
        { "distribution" : "weibull", "shape" : 1.471, "loc" : 0.8888, "scale" : 2.776 },
        { "distribution" : "lognormal",
          "sigma" : { "func" : "exp3", "a" : 0.04, "b" : 0.1748, "c" : -0.2243 },
          "mu" : { "func" : "power3", "a" : 0.1, "b" : 1.489, "c" : 0.1901 },
          "dependency" : { "shape" : 0, "scale" : 0 } }
    ] }"#.parse().unwrap();
    let dist = Arc::new(model.build().unwrap());
    let method : ContourMethod = serde_json::from_str(r#"{ "method" : "iform", "n_points" : 400 }"#).unwrap();
    let from_json = method.compute(dist, ContourSettings::default()).unwrap();
    let direct = IFormContour::new(wave_distribution(), ContourSettings::default(), 400).unwrap();
    assert_eq!(from_json.name(), "IFORM");
    assert_eq!(from_json.coordinates(), direct.coordinates());
}
