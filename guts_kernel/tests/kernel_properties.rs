//! Property tests for the day kernels and the threshold transform.

use guts_kernel::domain::{GutsModel, GutsParams};
use guts_kernel::it::simulate_it;
use guts_kernel::random::{stream_rng, FixedDraws};
use guts_kernel::sd::{simulate_sd_cohort, simulate_sd_continue, simulate_sd_stop};
use guts_kernel::threshold::sample_threshold;
use guts_kernel::ExposureState;
use proptest::prelude::*;

fn arb_params() -> impl Strategy<Value = GutsParams> {
    (
        1_u32..48,
        0.0_f64..3.0,
        0.0_f64..3.0,
        0.0_f64..5.0,
        0.0_f64..5.0,
        0.0_f64..0.5,
        0.0_f64..50.0,
    )
        .prop_map(|(t, k_sr, k_ca, kd_sd, kd_it, mw_sd, bw_sd)| GutsParams {
            model: GutsModel::Sd,
            steps_per_day: t,
            k_sr,
            k_ca,
            kd_sd,
            kd_it,
            mw_sd,
            bw_sd,
            mw_it: 0.0024,
            f_s: 3.0,
        })
}

fn arb_state() -> impl Strategy<Value = ExposureState> {
    (0.0_f64..10.0, 0.0_f64..10.0, 0.0_f64..5.0)
        .prop_map(|(o, c, d)| ExposureState::new(o, c, d))
}

#[test]
fn zero_exposure_is_idempotent_for_every_kernel() {
    let p = GutsParams {
        bw_sd: 0.0,
        ..GutsParams::default()
    };
    let zero = ExposureState::unexposed();

    let mut rng = FixedDraws::constant(0.999);
    let stop = simulate_sd_stop(zero, &p, &mut rng).unwrap();
    let cont = simulate_sd_continue(zero, &p, &mut rng).unwrap();
    let it = simulate_it(0.5, zero, &p).unwrap();
    for out in [stop, cont, it] {
        assert!(!out.lethal);
        assert_eq!(out.state, zero);
    }

    // A very large median keeps the hazard at zero as well.
    let p = GutsParams {
        mw_sd: 1e9,
        ..GutsParams::default()
    };
    let out = simulate_sd_stop(zero, &p, &mut rng).unwrap();
    assert!(!out.lethal);
    assert_eq!(out.state, zero);
}

#[test]
fn no_decay_when_elimination_rate_is_zero() {
    let p = GutsParams {
        k_sr: 0.0,
        bw_sd: 0.0,
        ..GutsParams::default()
    };
    let mut rng = FixedDraws::constant(0.5);
    let out = simulate_sd_continue(ExposureState::new(0.7, 0.0, 0.0), &p, &mut rng).unwrap();
    assert_eq!(out.state.oral_dose, 0.7);
    let it = simulate_it(1e6, ExposureState::new(0.7, 0.0, 0.0), &p).unwrap();
    assert_eq!(it.state.oral_dose, 0.7);
}

proptest! {
    #[test]
    fn damage_is_never_negative(p in arb_params(), s in arb_state(), seed in any::<u64>(), threshold in 1e-6_f64..10.0) {
        let mut rng = stream_rng(seed, 0);
        let a = simulate_sd_stop(s, &p, &mut rng).unwrap();
        let b = simulate_sd_continue(s, &p, &mut rng).unwrap();
        let c = simulate_it(threshold, s, &p).unwrap();
        prop_assert!(a.state.damage >= 0.0);
        prop_assert!(b.state.damage >= 0.0);
        prop_assert!(c.state.damage >= 0.0);
    }

    #[test]
    fn oral_dose_decays_strictly(p in arb_params(), dose in 0.01_f64..10.0, seed in any::<u64>()) {
        prop_assume!(p.k_sr > 1e-6);
        let s = ExposureState::new(dose, 0.0, 0.0);
        let mut rng = stream_rng(seed, 1);
        let out = simulate_sd_stop(s, &p, &mut rng).unwrap();
        prop_assert!(out.state.oral_dose < dose);
        prop_assert_eq!(out.state.contact_dose, 0.0);
        let it = simulate_it(1e6, s, &p).unwrap();
        prop_assert!(it.state.oral_dose < dose);
    }

    #[test]
    fn stop_and_continue_agree_on_lethality(p in arb_params(), s in arb_state(), seed in any::<u64>()) {
        let mut a = stream_rng(seed, 2);
        let mut b = stream_rng(seed, 2);
        let stop = simulate_sd_stop(s, &p, &mut a).unwrap();
        let cont = simulate_sd_continue(s, &p, &mut b).unwrap();
        prop_assert_eq!(stop.lethal, cont.lethal);
        if !stop.lethal {
            prop_assert_eq!(stop.state, cont.state);
        }
    }

    #[test]
    fn it_lethality_is_monotone_in_threshold(
        p in arb_params(),
        s in arb_state(),
        t1 in 1e-4_f64..5.0,
        t2 in 1e-4_f64..5.0,
    ) {
        let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        let at_lo = simulate_it(lo, s, &p).unwrap();
        let at_hi = simulate_it(hi, s, &p).unwrap();
        // Raising the threshold never creates a death.
        prop_assert!(!at_hi.lethal || at_lo.lethal);
    }

    #[test]
    fn threshold_median_property(f_s in 1.01_f64..20.0, mw in 1e-4_f64..0.9) {
        prop_assert_eq!(sample_threshold(mw, f_s, mw).unwrap(), 0.5);
    }

    #[test]
    fn threshold_is_positive_and_monotone(f_s in 1.1_f64..10.0, z1 in 0.01_f64..0.99, z2 in 0.01_f64..0.99) {
        let a = sample_threshold(z1, f_s, 0.0024).unwrap();
        let b = sample_threshold(z2, f_s, 0.0024).unwrap();
        prop_assert!(a > 0.0 && b > 0.0);
        if z1 < z2 {
            prop_assert!(a <= b);
        }
    }

    #[test]
    fn cohort_never_grows(count in 0_u64..500, dose in 0.0_f64..2.0, seed in any::<u64>()) {
        let p = GutsParams::default();
        let mut rng = stream_rng(seed, 3);
        let out = simulate_sd_cohort(count, dose, 0.0, &p, &mut rng).unwrap();
        prop_assert!(out.survivors <= count);
        prop_assert!(out.damage >= 0.0);
    }
}
