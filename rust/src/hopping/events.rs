//! Hop-in / hop-out event extraction with cooldown debounce.
//!
//! Only transitions through `UNBOUND` are events. A direct change from one
//! bound site to another is not reported here, so these lists can undercount
//! hopping compared to `HoppingSummary::hop_count`.

use serde::{Deserialize, Serialize};

use super::assignment::UNBOUND;
use crate::frames::AtomId;

/// Debounced event frames.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopEvents {
    /// Frames where the atom goes from unbound to bound.
    pub hop_in: Vec<usize>,
    /// Frames where the atom goes from bound to unbound.
    pub hop_out: Vec<usize>,
}

/// Extract hop-in and hop-out frames from a site sequence.
///
/// When an event follows the opposite event by fewer than `cool` frames, the
/// earlier event is withdrawn and the pair is treated as noise. With
/// `cool = 0` nothing is ever withdrawn.
pub fn extract_hop_events(sites: &[AtomId], cool: usize) -> HopEvents {
    let mut events = HopEvents::default();
    let mut last = match sites.first() {
        Some(&s) => s,
        None => return events,
    };
    let mut in_cool = cool;
    let mut out_cool = cool;

    for (frame, &site) in sites.iter().enumerate() {
        if site != last {
            if last == UNBOUND {
                events.hop_in.push(frame);
                in_cool = 0;
                if out_cool < cool {
                    events.hop_out.pop();
                }
            } else if site == UNBOUND {
                events.hop_out.push(frame);
                out_cool = 0;
                if in_cool < cool {
                    events.hop_in.pop();
                }
            }
        }
        last = site;
        in_cool = in_cool.saturating_add(1);
        out_cool = out_cool.saturating_add(1);
    }

    log::debug!(
        "{} hop-in / {} hop-out events after cooldown {}",
        events.hop_in.len(),
        events.hop_out.len(),
        cool
    );

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const A: AtomId = 4;
    const B: AtomId = 9;

    #[test]
    fn test_empty_and_constant() {
        assert_eq!(extract_hop_events(&[], 3), HopEvents::default());
        assert_eq!(extract_hop_events(&[A, A, A], 3), HopEvents::default());
        assert_eq!(extract_hop_events(&[0, 0], 3), HopEvents::default());
    }

    #[test]
    fn test_cooldown_cancels_quick_rebind() {
        let events = extract_hop_events(&[A, 0, A, 0, 0, 0, B], 3);
        // out@1 withdrawn by in@2, in@2 withdrawn by out@3; in@6 is 3 frames after out@3
        assert_eq!(events.hop_in, vec![6]);
        assert_eq!(events.hop_out, vec![3]);
    }

    #[test]
    fn test_long_excursion_is_clean_pair() {
        let events = extract_hop_events(&[A, A, 0, 0, 0, 0, 0, B, B], 3);
        assert_eq!(events.hop_out, vec![2]);
        assert_eq!(events.hop_in, vec![7]);
    }

    #[test]
    fn test_direct_site_change_is_not_an_event() {
        let events = extract_hop_events(&[A, A, B, B, A], 0);
        assert_eq!(events, HopEvents::default());
    }

    #[test]
    fn test_initial_unbound_then_bind() {
        let events = extract_hop_events(&[0, 0, A, A], 20);
        assert_eq!(events.hop_in, vec![2]);
        assert!(events.hop_out.is_empty());
    }

    #[test]
    fn test_max_cool_withdraws_without_overflow() {
        // out@1 is withdrawn by in@2; nothing follows to withdraw in@2
        let events = extract_hop_events(&[A, 0, A], usize::MAX);
        assert_eq!(events.hop_in, vec![2]);
        assert!(events.hop_out.is_empty());

        let events = extract_hop_events(&[A, A, 0, 0, 0, B], usize::MAX);
        assert!(events.hop_out.is_empty());
        assert_eq!(events.hop_in, vec![5]);
    }

    #[test]
    fn test_zero_cool_records_every_transition() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let sites: Vec<AtomId> = (0..40).map(|_| rng.gen_range(0..3)).collect();
            let events = extract_hop_events(&sites, 0);

            let mut expected_in = Vec::new();
            let mut expected_out = Vec::new();
            for t in 1..sites.len() {
                if sites[t - 1] == UNBOUND && sites[t] != UNBOUND {
                    expected_in.push(t);
                } else if sites[t - 1] != UNBOUND && sites[t] == UNBOUND {
                    expected_out.push(t);
                }
            }
            assert_eq!(events.hop_in, expected_in);
            assert_eq!(events.hop_out, expected_out);
        }
    }

    #[test]
    fn test_events_stay_sorted() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let sites: Vec<AtomId> = (0..60).map(|_| rng.gen_range(0..3)).collect();
            let events = extract_hop_events(&sites, 4);
            assert!(events.hop_in.windows(2).all(|w| w[0] < w[1]));
            assert!(events.hop_out.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
