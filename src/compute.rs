//! Sequence evaluation.

/// Fibonacci value at `index`, offset so that `fib(0) == fib(1) == 1`.
///
/// Any index below 2 (negatives included) yields 1. Results past `u64::MAX`
/// saturate rather than wrap.
pub fn fib(index: i64) -> u64 {
    if index < 2 {
        return 1;
    }

    let (mut a, mut b) = (1u64, 1u64);
    for _ in 2..=index {
        (a, b) = (b, a.saturating_add(b));
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_cases() {
        assert_eq!(fib(0), 1);
        assert_eq!(fib(1), 1);
    }

    #[test]
    fn known_values() {
        let table = [
            (2, 2),
            (3, 3),
            (4, 5),
            (5, 8),
            (6, 13),
            (7, 21),
            (10, 89),
            (15, 987),
            (20, 10946),
            (40, 165_580_141),
        ];
        for (n, expected) in table {
            assert_eq!(fib(n), expected, "fib({n})");
        }
    }

    #[test]
    fn follows_recurrence_across_domain() {
        for n in 2..=40 {
            assert_eq!(fib(n), fib(n - 1) + fib(n - 2), "fib({n})");
        }
    }

    #[test]
    fn negative_index_returns_one() {
        assert_eq!(fib(-1), 1);
        assert_eq!(fib(i64::MIN), 1);
    }

    #[test]
    fn repeated_calls_agree() {
        let first = fib(33);
        for _ in 0..5 {
            assert_eq!(fib(33), first);
        }
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        assert_eq!(fib(200), u64::MAX);
    }
}
