use proptest::prelude::*;
use thermo_core::SampleStore;

proptest! {
    // After any sequence of pushes, the store holds exactly the most
    // recent min(len, capacity) values in arrival order.
    #[test]
    fn ring_keeps_last_n_in_order(values in prop::collection::vec(-100.0f32..150.0, 0..400), capacity in 1usize..64) {
        let store = SampleStore::new(capacity);
        for (i, v) in values.iter().enumerate() {
            store.push_temperature(*v, i as f64);
        }
        let snap = store.snapshot();

        let keep = values.len().min(capacity);
        let expected: Vec<f32> = values[values.len() - keep..].to_vec();
        prop_assert_eq!(snap.temperature, expected);
        prop_assert_eq!(snap.time_s.len(), keep);
        if let Some(last) = values.last() {
            prop_assert_eq!(snap.last_temperature, *last);
        }
    }

    // The current buffer never exceeds capacity or the temperature length,
    // regardless of the interleaving of pushes.
    #[test]
    fn current_buffer_stays_bounded(ops in prop::collection::vec(any::<bool>(), 0..600), capacity in 1usize..32) {
        let store = SampleStore::new(capacity);
        let mut t = 0.0f64;
        for is_temp in ops {
            if is_temp {
                t += 0.1;
                store.push_temperature(21.0, t);
            } else {
                store.push_current(0.4);
            }
            let snap = store.snapshot();
            prop_assert!(snap.temperature.len() <= capacity);
            prop_assert!(snap.current.len() <= snap.temperature.len());
            prop_assert_eq!(snap.temperature.len(), snap.time_s.len());
        }
    }
}
