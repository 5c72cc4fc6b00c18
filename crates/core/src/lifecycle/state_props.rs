//! Property-based tests for lifecycle transitions.

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use ecoop_shared::types::UserId;

use super::state::{BatchState, Lifecycle};

/// Strategy for reaching any state through legal transitions.
fn arb_lifecycle() -> impl Strategy<Value = Lifecycle> {
    (0u8..3, any::<u128>()).prop_map(|(steps, raw)| {
        let user = UserId::from_uuid(Uuid::from_u128(raw));
        let mut lifecycle = Lifecycle::draft();
        if steps >= 1 {
            lifecycle = lifecycle.print(user, Utc::now()).unwrap();
        }
        if steps >= 2 {
            lifecycle = lifecycle.post(user, Utc::now()).unwrap();
        }
        lifecycle
    })
}

/// Strategy for a sequence of transition requests.
#[derive(Debug, Clone, Copy)]
enum Op {
    Print,
    UndoPrint,
    Post,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![Just(Op::Print), Just(Op::UndoPrint), Just(Op::Post)],
        0..20,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Transitions only succeed from their required state
    // =========================================================================

    /// Print succeeds exactly from Draft.
    #[test]
    fn prop_print_only_from_draft(lifecycle in arb_lifecycle()) {
        let result = lifecycle.print(UserId::new(), Utc::now());
        prop_assert_eq!(result.is_ok(), lifecycle.state() == BatchState::Draft);
    }

    /// Post succeeds exactly from Printed.
    #[test]
    fn prop_post_only_from_printed(lifecycle in arb_lifecycle()) {
        let result = lifecycle.post(UserId::new(), Utc::now());
        prop_assert_eq!(result.is_ok(), lifecycle.state() == BatchState::Printed);
        if let Err(conflict) = result {
            prop_assert_eq!(conflict.actual, lifecycle.state());
        }
    }

    // =========================================================================
    // posted ⇒ printed holds along any sequence, and Posted is absorbing
    // =========================================================================

    #[test]
    fn prop_sequences_preserve_invariant(ops in arb_ops()) {
        let user = UserId::new();
        let mut lifecycle = Lifecycle::draft();
        let mut was_posted = false;

        for op in ops {
            let next = match op {
                Op::Print => lifecycle.print(user, Utc::now()),
                Op::UndoPrint => lifecycle.undo_print(),
                Op::Post => lifecycle.post(user, Utc::now()),
            };
            if let Ok(next) = next {
                lifecycle = next;
            }

            if lifecycle.posted_date().is_some() {
                prop_assert!(lifecycle.printed_date().is_some());
                was_posted = true;
            }
            if was_posted {
                prop_assert_eq!(lifecycle.state(), BatchState::Posted);
            }
            prop_assert!(Lifecycle::from_stamps(
                lifecycle.printed_by(),
                lifecycle.printed_date(),
                lifecycle.posted_by(),
                lifecycle.posted_date(),
            ).is_ok());
        }
    }
}
