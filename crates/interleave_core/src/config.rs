/// Parameters shared by every testing strategy.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TestConfiguration {
    pub iterations: usize,
    pub threads: usize,
    pub actors_per_thread: usize,
    pub actors_before: usize,
    pub actors_after: usize,
    pub require_state_equivalence_check: bool,
    pub minimize_failed_scenario: bool,
}

impl Default for TestConfiguration {
    fn default() -> Self {
        TestConfiguration {
            iterations: 100,
            threads: 2,
            actors_per_thread: 5,
            actors_before: 5,
            actors_after: 5,
            require_state_equivalence_check: false,
            minimize_failed_scenario: true,
        }
    }
}

impl TestConfiguration {
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn actors_per_thread(mut self, actors_per_thread: usize) -> Self {
        self.actors_per_thread = actors_per_thread;
        self
    }

    pub fn actors_before(mut self, actors_before: usize) -> Self {
        self.actors_before = actors_before;
        self
    }

    pub fn actors_after(mut self, actors_after: usize) -> Self {
        self.actors_after = actors_after;
        self
    }

    pub fn require_state_equivalence_check(mut self, require: bool) -> Self {
        self.require_state_equivalence_check = require;
        self
    }

    pub fn minimize_failed_scenario(mut self, minimize: bool) -> Self {
        self.minimize_failed_scenario = minimize;
        self
    }
}

/// Configuration for the model checking strategy.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModelCheckingConfiguration {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub base: TestConfiguration,
    pub check_obstruction_freedom: bool,
    pub hanging_detection_threshold: usize,
    pub max_invocations_per_iteration: usize,
}

impl Default for ModelCheckingConfiguration {
    fn default() -> Self {
        ModelCheckingConfiguration {
            base: TestConfiguration::default(),
            check_obstruction_freedom: false,
            hanging_detection_threshold: 101,
            max_invocations_per_iteration: 10_000,
        }
    }
}

impl ModelCheckingConfiguration {
    pub fn new(base: TestConfiguration) -> Self {
        ModelCheckingConfiguration {
            base,
            ..ModelCheckingConfiguration::default()
        }
    }

    pub fn check_obstruction_freedom(mut self, check: bool) -> Self {
        self.check_obstruction_freedom = check;
        self
    }

    pub fn hanging_detection_threshold(mut self, threshold: usize) -> Self {
        self.hanging_detection_threshold = threshold;
        self
    }

    pub fn max_invocations_per_iteration(mut self, invocations: usize) -> Self {
        self.max_invocations_per_iteration = invocations;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builds_on_defaults() {
        let base = TestConfiguration::default().threads(3).iterations(10);
        assert_eq!(base.threads, 3);
        assert_eq!(base.iterations, 10);
        assert_eq!(base.actors_per_thread, 5);
        assert!(base.minimize_failed_scenario);

        let config = ModelCheckingConfiguration::new(base.clone()).check_obstruction_freedom(true);
        assert_eq!(config.base, base);
        assert!(config.check_obstruction_freedom);
        assert_eq!(config.hanging_detection_threshold, 101);
        assert_eq!(config.max_invocations_per_iteration, 10_000);
    }
}
