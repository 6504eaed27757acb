//! Property tests for rate-limit handling

use proptest::prelude::*;
use pxr_agent::{Clock, SchedulerState, SessionConfig};
use pxr_test_utils::{raster_from_indices, Fixture, ScriptedRandom, StaticSurface};
use std::time::Duration;

fn started(draws: Vec<usize>) -> Fixture {
    let template = raster_from_indices(2, 2, &[0, 1, 2, 254]);
    Fixture::with_config(
        StaticSurface::blank(10, 10),
        SessionConfig::default(),
        ScriptedRandom::new(draws),
    )
    .started(&template, 1, 1)
}

proptest! {
    #[test]
    fn cooldown_respects_floor_and_jitter(wait in 0.0f64..1000.0, draw in 0usize..64) {
        let mut fx = started(vec![draw]);
        let now = fx.clock.now();

        fx.session.handle_frame(&format!(r#"{{"type":"rate_limit","wait":{wait}}}"#));

        let SchedulerState::CooldownWait { deadline } = fx.session.state() else {
            panic!("expected cooldown");
        };
        let cooldown = (deadline - now).as_secs_f64();
        let floor = wait.max(15.0);
        prop_assert!(cooldown >= floor - 1e-6);
        prop_assert!(cooldown < floor + 10.0);
    }

    #[test]
    fn confirmation_follows_the_threshold(wait in 0.0f64..400.0) {
        let mut fx = started(vec![]);
        fx.session.tick();
        prop_assert!(fx.session.pending().is_some());

        fx.session.handle_frame(&format!(r#"{{"type":"rate_limit","wait":{wait}}}"#));

        prop_assert!(fx.session.pending().is_none());
        let expected = u64::from(wait > 120.0);
        prop_assert_eq!(fx.session.progress().confirmed(), expected);
    }

    #[test]
    fn nothing_is_sent_before_the_deadline(wait in 15u64..600, steps in 1u64..50) {
        let mut fx = started(vec![]);
        fx.session.handle_frame(&format!(r#"{{"type":"rate_limit","wait":{wait}}}"#));

        let step = Duration::from_secs(wait) / u32::try_from(steps).unwrap();
        let deadline = fx.clock.now() + Duration::from_secs(wait);
        while fx.clock.now() + step <= deadline {
            fx.clock.advance(step);
            fx.session.tick();
        }
        prop_assert!(fx.transport.is_empty());
    }
}
