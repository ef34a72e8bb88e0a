use super::*;
use crate::io::{HmmInput, TransInput};
use crate::mocks::{mock_two_state, random_input};
use crate::trans::TransKind;
use approx::{assert_abs_diff_eq, assert_relative_eq};
use itertools::Itertools;
use ndarray::{array, Array2, Array3, Axis};
use test_case::test_case;

///
/// `P(x)` by summing over every hidden path; only for tiny models
///
fn brute_force_likelihood(input: &HmmInput) -> f64 {
    let (n_obs, n_states) = input.allprobs.dim();
    let trans = input.transitions();
    let mut total = 0.0;
    for path in itertools::repeat_n(0..n_states, n_obs).multi_cartesian_product() {
        let mut p = input.delta[path[0]] * input.allprobs[[0, path[0]]];
        for i in 1..n_obs {
            p *= trans.matrix(i)[[path[i - 1], path[i]]] * input.allprobs[[i, path[i]]];
        }
        total += p;
    }
    total
}

fn stack_of(gamma: &Array2<f64>, k: usize) -> Array3<f64> {
    let (n, m) = gamma.dim();
    gamma.broadcast((k, n, m)).unwrap().to_owned()
}

#[test]
fn two_state_example() {
    let input = mock_two_state();
    let gamma = match &input.gamma {
        TransInput::Homogeneous(gamma) => gamma.clone(),
        _ => unreachable!(),
    };
    let l = forward_homogeneous(input.allprobs.view(), input.delta.view(), gamma.view()).unwrap();
    // c_0 = 0.5, c_1 = 0.5, c_2 = 0.1902 + 0.2562
    assert_abs_diff_eq!(l, (0.5f64 * 0.5 * 0.4464).ln(), epsilon = 1e-9);
    assert_abs_diff_eq!(l, -2.192834217, epsilon = 1e-6);

    let trace = input.trace().unwrap();
    assert_eq!(trace.scales().len(), 3);
    assert_abs_diff_eq!(trace.scales()[0].to_value(), 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(trace.scales()[1].to_value(), 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(trace.scales()[2].to_value(), 0.4464, epsilon = 1e-12);
    assert_abs_diff_eq!(trace.phi()[0], 0.1902 / 0.4464, epsilon = 1e-12);
    assert_abs_diff_eq!(trace.phi()[1], 0.2562 / 0.4464, epsilon = 1e-12);
}

#[test]
fn single_observation_ignores_transitions() {
    let allprobs = array![[0.2, 0.7, 0.1]];
    let delta = array![0.3, 0.3, 0.4];
    let expected = (0.3f64 * 0.2 + 0.3 * 0.7 + 0.4 * 0.1).ln();

    // matrices full of NaN are never read
    let garbage = Array2::from_elem((3, 3), f64::NAN);
    let l = forward_homogeneous(allprobs.view(), delta.view(), garbage.view()).unwrap();
    assert_abs_diff_eq!(l, expected, epsilon = 1e-15);

    let empty = Array3::<f64>::zeros((0, 3, 3));
    let l = forward_time_varying(allprobs.view(), delta.view(), empty.view()).unwrap();
    assert_abs_diff_eq!(l, expected, epsilon = 1e-15);

    let pool = stack_of(&garbage, 2);
    let l = forward_periodic(allprobs.view(), delta.view(), pool.view(), &[99]).unwrap();
    assert_abs_diff_eq!(l, expected, epsilon = 1e-15);
}

#[test_case(2, 10 ; "two states")]
#[test_case(3, 100 ; "three states")]
#[test_case(5, 1000 ; "five states long")]
fn time_varying_with_repeated_matrix_is_homogeneous(n_states: usize, n_obs: usize) {
    let input = random_input(n_states, n_obs, TransKind::Homogeneous, 1, 7).unwrap();
    let gamma = match &input.gamma {
        TransInput::Homogeneous(gamma) => gamma.clone(),
        _ => unreachable!(),
    };
    let stack = stack_of(&gamma, n_obs - 1);
    let lh = forward_homogeneous(input.allprobs.view(), input.delta.view(), gamma.view()).unwrap();
    let lg = forward_time_varying(input.allprobs.view(), input.delta.view(), stack.view()).unwrap();
    assert!(lh.is_finite());
    assert_eq!(lh, lg);
}

#[test_case(2, 10 ; "two states")]
#[test_case(4, 500 ; "four states")]
fn periodic_with_one_period_is_homogeneous(n_states: usize, n_obs: usize) {
    let input = random_input(n_states, n_obs, TransKind::Homogeneous, 1, 3).unwrap();
    let gamma = match &input.gamma {
        TransInput::Homogeneous(gamma) => gamma.clone(),
        _ => unreachable!(),
    };
    let pool = gamma.clone().insert_axis(Axis(0));
    let tod = vec![0; n_obs];
    let lh = forward_homogeneous(input.allprobs.view(), input.delta.view(), gamma.view()).unwrap();
    let lp = forward_periodic(input.allprobs.view(), input.delta.view(), pool.view(), &tod).unwrap();
    assert_eq!(lh, lp);
}

#[test_case(2, 5 ; "short")]
#[test_case(3, 200 ; "long")]
fn periodic_with_identity_labels_is_time_varying(n_states: usize, n_obs: usize) {
    let input = random_input(n_states, n_obs, TransKind::TimeVarying, 1, 5).unwrap();
    let stack = match &input.gamma {
        TransInput::TimeVarying(stack) => stack.clone(),
        _ => unreachable!(),
    };
    // tod[i] = i - 1 for i >= 1, tod[0] is unused
    let tod: Vec<usize> = (0..n_obs).map(|i| i.saturating_sub(1)).collect();
    let lg = forward_time_varying(input.allprobs.view(), input.delta.view(), stack.view()).unwrap();
    let lp = forward_periodic(input.allprobs.view(), input.delta.view(), stack.view(), &tod).unwrap();
    assert_eq!(lg, lp);
}

#[test_case(TransKind::Homogeneous ; "homogeneous")]
#[test_case(TransKind::TimeVarying ; "time varying")]
#[test_case(TransKind::Periodic ; "periodic")]
fn agrees_with_path_enumeration(kind: TransKind) {
    let input = random_input(3, 6, kind, 2, 21).unwrap();
    let expected = brute_force_likelihood(&input).ln();
    let l = input.log_likelihood().unwrap();
    assert_relative_eq!(l, expected, max_relative = 1e-10);
}

#[test_case(0 ; "first row")]
#[test_case(1 ; "second row")]
#[test_case(4 ; "middle row")]
#[test_case(9 ; "last row")]
fn zero_row_gives_negative_infinity(row: usize) {
    for kind in [
        TransKind::Homogeneous,
        TransKind::TimeVarying,
        TransKind::Periodic,
    ] {
        let mut input = random_input(3, 10, kind, 4, 1).unwrap();
        input.allprobs.row_mut(row).fill(0.0);
        let l = input.log_likelihood().unwrap();
        assert_eq!(l, f64::NEG_INFINITY);

        let trace = input.trace().unwrap();
        assert_eq!(trace.log_likelihood(), f64::NEG_INFINITY);
        assert_eq!(trace.first_degenerate_step(), Some(row));
        assert_eq!(trace.scales().len(), row + 1);
    }
}

#[test]
fn unreachable_observation_gives_negative_infinity() {
    // state 1 can never be entered but is the only one emitting obs 1
    let allprobs = array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]];
    let delta = array![1.0, 0.0];
    let gamma = array![[1.0, 0.0], [0.5, 0.5]];
    let l = forward_homogeneous(allprobs.view(), delta.view(), gamma.view()).unwrap();
    assert_eq!(l, f64::NEG_INFINITY);
}

#[test]
fn zero_initial_distribution_gives_negative_infinity() {
    let allprobs = array![[0.5, 0.5], [0.5, 0.5]];
    let delta = array![0.0, 0.0];
    let gamma = array![[0.9, 0.1], [0.2, 0.8]];
    let l = forward_homogeneous(allprobs.view(), delta.view(), gamma.view()).unwrap();
    assert_eq!(l, f64::NEG_INFINITY);
}

#[test]
fn nan_input_propagates() {
    let allprobs = array![[0.5, 0.5], [f64::NAN, 0.5], [0.5, 0.5]];
    let delta = array![0.5, 0.5];
    let gamma = array![[0.9, 0.1], [0.2, 0.8]];
    let l = forward_homogeneous(allprobs.view(), delta.view(), gamma.view()).unwrap();
    assert!(l.is_nan());
}

#[test]
fn long_sequence_does_not_underflow() {
    let input = random_input(3, 20_000, TransKind::Periodic, 24, 0).unwrap();
    let l = input.log_likelihood().unwrap();
    assert!(l.is_finite());
    // each observation has probability well below one
    assert!(l < -1000.0);

    let trace = input.trace().unwrap();
    assert_eq!(trace.log_likelihood(), l);
    assert_eq!(trace.first_degenerate_step(), None);
    assert_abs_diff_eq!(trace.phi().sum(), 1.0, epsilon = 1e-9);
}

#[test]
fn unnormalized_delta_is_accepted() {
    // delta is not checked; doubling it adds log 2
    let input = mock_two_state();
    let l = input.log_likelihood().unwrap();
    let doubled = HmmInput {
        delta: &input.delta * 2.0,
        ..input.clone()
    };
    assert_abs_diff_eq!(doubled.log_likelihood().unwrap(), l + 2f64.ln(), epsilon = 1e-12);
}

#[test]
fn shape_mismatch_is_rejected() {
    let allprobs = array![[0.6, 0.4], [0.5, 0.5], [0.3, 0.7]];
    let delta = array![0.5, 0.5];
    let gamma = array![[0.9, 0.1], [0.2, 0.8]];

    // delta length
    let bad_delta = array![0.5, 0.25, 0.25];
    let r = forward_homogeneous(allprobs.view(), bad_delta.view(), gamma.view());
    assert!(matches!(r, Err(ForwardError::Shape(_))));

    // gamma size
    let bad_gamma = array![[1.0]];
    let r = forward_homogeneous(allprobs.view(), delta.view(), bad_gamma.view());
    assert!(matches!(r, Err(ForwardError::Shape(_))));

    // empty sequence and empty state space
    let no_obs = Array2::<f64>::zeros((0, 2));
    let r = forward_homogeneous(no_obs.view(), delta.view(), gamma.view());
    assert!(matches!(r, Err(ForwardError::Shape(_))));
    let no_states = Array2::<f64>::zeros((3, 0));
    let empty = ndarray::Array1::<f64>::zeros(0);
    let empty_gamma = Array2::<f64>::zeros((0, 0));
    let r = forward_homogeneous(no_states.view(), empty.view(), empty_gamma.view());
    assert!(matches!(r, Err(ForwardError::Shape(_))));

    // time-varying stack of wrong length
    for k in [0, 1, 3, 4] {
        let stack = stack_of(&gamma, k);
        let r = forward_time_varying(allprobs.view(), delta.view(), stack.view());
        assert!(matches!(r, Err(ForwardError::Shape(_))), "k={}", k);
    }

    // periodic tod of wrong length
    let pool = stack_of(&gamma, 2);
    let r = forward_periodic(allprobs.view(), delta.view(), pool.view(), &[0, 1]);
    assert!(matches!(r, Err(ForwardError::Shape(_))));
}

#[test]
fn out_of_range_period_is_rejected() {
    let allprobs = array![[0.6, 0.4], [0.5, 0.5], [0.3, 0.7]];
    let delta = array![0.5, 0.5];
    let pool = stack_of(&array![[0.9, 0.1], [0.2, 0.8]], 2);
    let r = forward_periodic(allprobs.view(), delta.view(), pool.view(), &[0, 1, 2]);
    match r {
        Err(ForwardError::PeriodOutOfRange {
            step,
            label,
            n_periods,
        }) => {
            assert_eq!((step, label, n_periods), (2, 2, 2));
        }
        r => panic!("unexpected {:?}", r),
    }
}

#[test]
fn forward_returns_prob() {
    let input = mock_two_state();
    let p = forward(input.allprobs.view(), input.delta.view(), &input.transitions()).unwrap();
    assert_abs_diff_eq!(p.to_value(), 0.25 * 0.4464, epsilon = 1e-12);
    assert_eq!(p.to_log_value(), input.log_likelihood().unwrap());
}
