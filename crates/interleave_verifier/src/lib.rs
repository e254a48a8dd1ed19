//! Interleave Verifier memoizes verdicts on execution results.
//!
//! A harness usually runs the same scenario many times, and many of those runs produce equal
//! results. [`CachedVerifier`] wraps any [`Verifier`] so that each distinct result is checked only
//! once per verification session.
//!
//! # Example
//!
//! ```rust
//! use interleave_verifier::*;
//!
//! #[derive(Clone, Debug, Eq, Hash, PartialEq)]
//! struct Results(Vec<u64>);
//!
//! let sorted = |results: &Results| results.0.windows(2).all(|w| w[0] <= w[1]);
//! let verifier: CachedVerifier<_, Results> = CachedVerifier::new(sorted);
//! assert!(verifier.verify_results(&Results(vec![1, 2])));
//! assert!(!verifier.verify_results(&Results(vec![2, 1])));
//! assert!(verifier.verify_results(&Results(vec![1, 2])));
//! assert_eq!(verifier.cached_len(), 2);
//! ```

#![deny(unused_must_use)]
#![warn(rust_2018_idioms, unreachable_pub)]

use {
    parking_lot::Mutex,
    std::{collections::HashMap, fmt::Debug, hash::Hash},
    tracing::debug,
};

/// Decides whether the results of one execution are correct.
pub trait Verifier<R> {
    fn verify_results(&self, results: &R) -> bool;
}

impl<F, R> Verifier<R> for F
where
    F: Fn(&R) -> bool,
{
    fn verify_results(&self, results: &R) -> bool {
        self(results)
    }
}

/// Remembers the verdict for every result it has seen. Results are compared by value, so two
/// equal results produced by different executions share one check. There is no eviction.
pub struct CachedVerifier<V, R> {
    inner: V,
    verdicts: Mutex<HashMap<R, bool>>,
}

impl<V, R> CachedVerifier<V, R>
where
    V: Verifier<R>,
    R: Clone + Debug + Eq + Hash,
{
    pub fn new(inner: V) -> Self {
        CachedVerifier {
            inner,
            verdicts: Mutex::new(HashMap::new()),
        }
    }

    /// The number of distinct results checked so far.
    pub fn cached_len(&self) -> usize {
        self.verdicts.lock().len()
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }

    pub fn into_inner(self) -> V {
        self.inner
    }
}

impl<V, R> Verifier<R> for CachedVerifier<V, R>
where
    V: Verifier<R>,
    R: Clone + Debug + Eq + Hash,
{
    fn verify_results(&self, results: &R) -> bool {
        if let Some(verdict) = self.verdicts.lock().get(results) {
            return *verdict;
        }
        // The check runs unlocked. A racing caller may check the same result too, but the first
        // verdict stored wins.
        let verdict = self.inner.verify_results(results);
        debug!(?results, verdict, "Verified results.");
        *self
            .verdicts
            .lock()
            .entry(results.clone())
            .or_insert(verdict)
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        std::sync::atomic::{AtomicUsize, Ordering},
    };

    #[derive(Clone, Debug, Eq, Hash, PartialEq)]
    struct ExecutionResult {
        init: Vec<i32>,
        parallel: Vec<Vec<i32>>,
        post: Vec<i32>,
    }

    fn result(parallel: Vec<Vec<i32>>) -> ExecutionResult {
        ExecutionResult {
            init: vec![0],
            parallel,
            post: vec![],
        }
    }

    struct Counting {
        calls: AtomicUsize,
    }

    impl Verifier<ExecutionResult> for Counting {
        fn verify_results(&self, results: &ExecutionResult) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            results.parallel.iter().all(|thread| !thread.is_empty())
        }
    }

    #[test]
    fn checks_equal_results_once() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        let verifier: CachedVerifier<_, ExecutionResult> = CachedVerifier::new(Counting {
            calls: AtomicUsize::new(0),
        });

        // Distinct instances with equal contents.
        assert!(verifier.verify_results(&result(vec![vec![1], vec![2]])));
        assert!(verifier.verify_results(&result(vec![vec![1], vec![2]])));
        assert_eq!(verifier.inner().calls.load(Ordering::SeqCst), 1);

        assert!(!verifier.verify_results(&result(vec![vec![1], vec![]])));
        assert!(!verifier.verify_results(&result(vec![vec![1], vec![]])));
        assert_eq!(verifier.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(verifier.cached_len(), 2);
    }

    #[test]
    fn distinguishes_results_by_every_field() {
        let verifier: CachedVerifier<_, ExecutionResult> = CachedVerifier::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let mut other = result(vec![vec![1]]);
        other.post = vec![7];
        verifier.verify_results(&result(vec![vec![1]]));
        verifier.verify_results(&other);
        assert_eq!(verifier.into_inner().calls.into_inner(), 2);
    }

    #[test]
    fn wraps_closures() {
        let verifier: CachedVerifier<_, Vec<i32>> =
            CachedVerifier::new(|results: &Vec<i32>| results.iter().sum::<i32>() == 3);
        assert!(verifier.verify_results(&vec![1, 2]));
        assert!(!verifier.verify_results(&vec![1, 1]));
    }
}
