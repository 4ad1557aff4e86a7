use docbridge::{ParamValue, bind_placeholders};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_consumption_is_bounded(text in "[a-z:, #{}]{0,40}", n in 0usize..5, offset in 0usize..8) {
        let params: Vec<ParamValue> = (0..n).map(|i| ParamValue::from(i as i64)).collect();
        let markers = text.chars().filter(|c| *c == '#').count();
        let (_, next) = bind_placeholders(&text, &params, offset);
        let available = params.len().saturating_sub(offset);
        prop_assert_eq!(next - offset, markers.min(available));
    }

    #[test]
    fn prop_enough_params_leave_no_markers(text in "[a-z:, #{}]{0,40}", pad in 0usize..3) {
        let markers = text.chars().filter(|c| *c == '#').count();
        let params: Vec<ParamValue> =
            (0..markers + pad).map(|i| ParamValue::from(format!("v{i}"))).collect();
        let (out, _) = bind_placeholders(&text, &params, 0);
        prop_assert!(!out.contains('#'));
    }
}
