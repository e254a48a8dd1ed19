use interleave_core::{QualifiedName, ShadowNamespace};

/// The outcome of [`EligibilityPolicy::classify`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Verdict {
    /// An explicit request for the rewritten variant.
    AlwaysRewrite,
    /// Loaded unmodified through the parent loader.
    NeverRewrite,
    /// Rewritten through the pipeline.
    Default,
}

/// Matches qualified names in dotted form.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Pattern {
    /// Plain prefix match, so `kotlin.ranges` also matches `kotlin.rangesFoo`.
    Namespace(String),
    Exact(String),
    /// Starts with `prefix` and contains `infix` anywhere after it.
    PrefixContaining { prefix: String, infix: String },
}

impl Pattern {
    pub fn namespace(prefix: impl Into<String>) -> Self {
        Pattern::Namespace(prefix.into())
    }

    pub fn exact(name: impl Into<String>) -> Self {
        Pattern::Exact(name.into())
    }

    pub fn prefix_containing(prefix: impl Into<String>, infix: impl Into<String>) -> Self {
        Pattern::PrefixContaining {
            prefix: prefix.into(),
            infix: infix.into(),
        }
    }

    pub fn matches(&self, name: &QualifiedName) -> bool {
        match self {
            Pattern::Namespace(prefix) => name.starts_with(prefix),
            Pattern::Exact(exact) => name.as_str() == exact,
            Pattern::PrefixContaining { prefix, infix } => name
                .as_str()
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.contains(infix.as_str())),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Rule {
    pub pattern: Pattern,
    pub verdict: Verdict,
}

impl Rule {
    pub fn new(pattern: Pattern, verdict: Verdict) -> Self {
        Rule { pattern, verdict }
    }
}

/// The data an [`EligibilityPolicy`] is built from.
///
/// The carve-out lists are literal: each entry names exactly the platform or harness
/// sub-namespace that must stay rewritable.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub shadow: ShadowNamespace,
    /// Low-level concurrency primitives whose rewriting would break platform invariants.
    pub impossible_primitives: Vec<Pattern>,
    pub platform_namespaces: Vec<String>,
    pub platform_carve_outs: Vec<Pattern>,
    pub harness_namespace: String,
    pub harness_carve_outs: Vec<Pattern>,
    /// Coroutine and continuation dispatch types that must run unmodified.
    pub dispatch_types: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            shadow: ShadowNamespace::default(),
            impossible_primitives: vec![
                Pattern::prefix_containing("kotlinx.atomicfu.", "Atomic"),
                Pattern::namespace("java.util.concurrent.atomic."),
                Pattern::exact("java.lang.invoke.VarHandle"),
                Pattern::exact("sun.misc.Unsafe"),
            ],
            platform_namespaces: vec![
                "sun.".to_string(),
                "java.".to_string(),
                "jdk.internal.".to_string(),
                "kotlin.".to_string(),
            ],
            platform_carve_outs: vec![
                Pattern::namespace("kotlin.collections."),
                Pattern::prefix_containing("kotlin.jvm.internal.Array", "Iterator"),
                Pattern::namespace("kotlin.ranges"),
            ],
            harness_namespace: "interleave.".to_string(),
            harness_carve_outs: vec![
                Pattern::namespace("interleave.test."),
                Pattern::exact("interleave.strategy.managed.ManagedStateHolder"),
            ],
            dispatch_types: vec![
                "kotlinx.coroutines.CancellableContinuation".to_string(),
                "kotlinx.coroutines.CoroutineDispatcher".to_string(),
            ],
        }
    }
}

impl PolicyConfig {
    pub fn shadow(mut self, shadow: ShadowNamespace) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn harness_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.harness_namespace = namespace.into();
        self
    }

    pub fn harness_carve_out(mut self, pattern: Pattern) -> Self {
        self.harness_carve_outs.push(pattern);
        self
    }

    pub fn platform_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.platform_namespaces.push(namespace.into());
        self
    }

    pub fn platform_carve_out(mut self, pattern: Pattern) -> Self {
        self.platform_carve_outs.push(pattern);
        self
    }

    pub fn impossible_primitive(mut self, pattern: Pattern) -> Self {
        self.impossible_primitives.push(pattern);
        self
    }

    pub fn dispatch_type(mut self, name: impl Into<String>) -> Self {
        self.dispatch_types.push(name.into());
        self
    }
}

/// Decides whether a program unit is rewritten, loaded unmodified, or always rewritten.
///
/// The policy is an ordered rule table evaluated top to bottom; the first matching rule wins and
/// names matching no rule are [`Verdict::Default`]. Built from a [`PolicyConfig`], the table reads:
///
/// 1. the shadow namespace → [`Verdict::AlwaysRewrite`]
/// 2. impossible primitives → [`Verdict::NeverRewrite`]
/// 3. platform carve-outs → [`Verdict::Default`], then platform namespaces →
///    [`Verdict::NeverRewrite`]
/// 4. harness carve-outs → [`Verdict::Default`], then the harness namespace →
///    [`Verdict::NeverRewrite`]
/// 5. dispatch types → [`Verdict::NeverRewrite`]
///
/// Carve-outs sit directly above the namespace they carve out of, which is what lets them
/// override it.
#[derive(Clone, Debug)]
pub struct EligibilityPolicy {
    rules: Vec<Rule>,
    shadow: ShadowNamespace,
}

impl EligibilityPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        use Verdict::*;
        let mut rules = vec![Rule::new(
            Pattern::namespace(config.shadow.prefix()),
            AlwaysRewrite,
        )];
        rules.extend(
            config
                .impossible_primitives
                .into_iter()
                .map(|p| Rule::new(p, NeverRewrite)),
        );
        rules.extend(
            config
                .platform_carve_outs
                .into_iter()
                .map(|p| Rule::new(p, Default)),
        );
        rules.extend(
            config
                .platform_namespaces
                .into_iter()
                .map(|ns| Rule::new(Pattern::Namespace(ns), NeverRewrite)),
        );
        rules.extend(
            config
                .harness_carve_outs
                .into_iter()
                .map(|p| Rule::new(p, Default)),
        );
        if !config.harness_namespace.is_empty() {
            rules.push(Rule::new(
                Pattern::Namespace(config.harness_namespace),
                NeverRewrite,
            ));
        }
        rules.extend(
            config
                .dispatch_types
                .into_iter()
                .map(|name| Rule::new(Pattern::Exact(name), NeverRewrite)),
        );
        EligibilityPolicy {
            rules,
            shadow: config.shadow,
        }
    }

    /// Builds a policy from an explicit table. The shadow namespace rule is always prepended so
    /// that requests for rewritten variants are never skipped.
    pub fn from_rules(shadow: ShadowNamespace, rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut table = vec![Rule::new(
            Pattern::namespace(shadow.prefix()),
            Verdict::AlwaysRewrite,
        )];
        table.extend(rules);
        EligibilityPolicy {
            rules: table,
            shadow,
        }
    }

    pub fn classify(&self, name: &QualifiedName) -> Verdict {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(name))
            .map(|rule| rule.verdict)
            .unwrap_or(Verdict::Default)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn shadow(&self) -> &ShadowNamespace {
        &self.shadow
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        EligibilityPolicy::new(PolicyConfig::default())
    }
}
