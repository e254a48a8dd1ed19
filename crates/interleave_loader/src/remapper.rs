use {
    crate::{EligibilityPolicy, Verdict},
    interleave_core::QualifiedName,
    std::sync::Arc,
};

/// Translates internal (slash-separated) original names into shadow names.
pub trait Remapper: Send + Sync {
    fn map(&self, internal_name: &str) -> String;
}

impl<F> Remapper for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn map(&self, internal_name: &str) -> String {
        self(internal_name)
    }
}

/// Moves every name the policy would rewrite into the shadow namespace. Platform and harness
/// names stay where they are.
#[derive(Clone, Debug)]
pub struct ShadowRemapper {
    policy: Arc<EligibilityPolicy>,
}

impl ShadowRemapper {
    pub fn new(policy: Arc<EligibilityPolicy>) -> Self {
        ShadowRemapper { policy }
    }
}

impl Remapper for ShadowRemapper {
    fn map(&self, internal_name: &str) -> String {
        match self.policy.classify(&QualifiedName::from(internal_name)) {
            Verdict::NeverRewrite => internal_name.to_string(),
            Verdict::AlwaysRewrite | Verdict::Default => {
                self.policy.shadow().shadow_internal(internal_name)
            }
        }
    }
}
