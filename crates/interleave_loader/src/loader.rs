use {
    crate::{
        codec, ArtifactCache, EligibilityPolicy, HierarchyResolver, InstrumentError, LoadError,
        ParentLoader, Pipeline, Remapper, RewritePass, Runner, Strategy, UnitSource, UnitWriter,
        Verdict,
    },
    interleave_core::{Artifact, Origin, QualifiedName},
    std::sync::Arc,
    tracing::{error, info, warn},
};

/// Rewrites program units as they are loaded so that a test harness can observe them.
///
/// # Loading
///
/// Each [`InstrumentationLoader::load`] runs inside the critical section of the requested name:
///
/// 1. A cached artifact is returned as is.
/// 2. Names the [`EligibilityPolicy`] classifies as [`Verdict::NeverRewrite`] are delegated to
///    the [`ParentLoader`], and the delegate's answer is cached under the requested name.
/// 3. Everything else is read from the [`UnitSource`] under its original name (the shadow prefix
///    stripped), run through the [`Pipeline`], written by a [`UnitWriter`], and cached under the
///    requested name.
///
/// Any failure on the rewrite path is fatal for that unit and reported as
/// [`LoadError::Instrumentation`]. There is no fallback to the unrewritten unit.
///
/// # Sessions
///
/// The cache and the hierarchy memo belong to the loader instance, so independent loaders in
/// one process never share artifacts.
pub struct InstrumentationLoader {
    cache: ArtifactCache,
    hierarchy: HierarchyResolver,
    parent: Arc<dyn ParentLoader>,
    pipeline: Pipeline,
    policy: Arc<EligibilityPolicy>,
    source: Arc<dyn UnitSource>,
}

pub struct LoaderBuilder {
    parent: Arc<dyn ParentLoader>,
    passes: Vec<Arc<dyn RewritePass>>,
    policy: Arc<EligibilityPolicy>,
    remapper: Option<Arc<dyn Remapper>>,
    root: Option<String>,
    source: Arc<dyn UnitSource>,
}

impl LoaderBuilder {
    pub fn policy(mut self, policy: impl Into<Arc<EligibilityPolicy>>) -> Self {
        self.policy = policy.into();
        self
    }

    /// Appends a pass. Passes run in registration order.
    pub fn pass(mut self, pass: impl RewritePass + 'static) -> Self {
        self.passes.push(Arc::new(pass));
        self
    }

    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.passes.extend(pipeline.passes().iter().cloned());
        self
    }

    pub fn remapper(mut self, remapper: Arc<dyn Remapper>) -> Self {
        self.remapper = Some(remapper);
        self
    }

    /// The implicit ancestor of every type. Defaults to [`HierarchyResolver::DEFAULT_ROOT`].
    pub fn root_type(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn build(self) -> InstrumentationLoader {
        let mut hierarchy = HierarchyResolver::new(
            Arc::clone(&self.source),
            self.policy.shadow().clone(),
            self.remapper,
        );
        if let Some(root) = self.root {
            hierarchy = hierarchy.root(root);
        }
        InstrumentationLoader {
            cache: ArtifactCache::new(),
            hierarchy,
            parent: self.parent,
            pipeline: Pipeline::new(self.passes),
            policy: self.policy,
            source: self.source,
        }
    }
}

impl InstrumentationLoader {
    pub fn builder(
        source: impl UnitSource + 'static,
        parent: impl ParentLoader + 'static,
    ) -> LoaderBuilder {
        LoaderBuilder {
            parent: Arc::new(parent),
            passes: Vec::new(),
            policy: Arc::new(EligibilityPolicy::default()),
            remapper: None,
            root: None,
            source: Arc::new(source),
        }
    }

    /// Builds the pipeline from the strategy and runner, and takes the strategy's remapper.
    pub fn for_collaborators(
        source: impl UnitSource + 'static,
        parent: impl ParentLoader + 'static,
        policy: impl Into<Arc<EligibilityPolicy>>,
        strategy: &dyn Strategy,
        runner: &dyn Runner,
    ) -> Self {
        let mut builder = InstrumentationLoader::builder(source, parent)
            .policy(policy)
            .pipeline(Pipeline::for_collaborators(strategy, runner));
        if let Some(remapper) = strategy.create_remapper() {
            builder = builder.remapper(remapper);
        }
        builder.build()
    }

    pub fn load(&self, name: impl Into<QualifiedName>) -> Result<Arc<Artifact>, LoadError> {
        let name = name.into();
        self.cache.get_or_try_insert_with(&name, || {
            match self.policy.classify(&name) {
                Verdict::NeverRewrite => {
                    info!(unit = %name, "Delegating unit to parent.");
                    self.parent.delegate(&name)
                }
                verdict @ (Verdict::AlwaysRewrite | Verdict::Default) => {
                    self.instrument(&name).map_err(|source| {
                        error!(unit = %name, ?verdict, error = %source, "Cannot instrument unit.");
                        LoadError::Instrumentation {
                            name: name.clone(),
                            source,
                        }
                    })
                }
            }
        })
    }

    fn instrument(&self, name: &QualifiedName) -> Result<Arc<Artifact>, InstrumentError> {
        let original = self.policy.shadow().original(name);
        let bytes = self
            .source
            .read(&original)
            .map_err(|source| InstrumentError::UnreadableUnit {
                name: original.clone(),
                source,
            })?;
        let unit = codec::decode(&bytes).map_err(|source| InstrumentError::Malformed {
            name: original.clone(),
            source,
        })?;
        let version = unit.version;
        let unit = self.pipeline.run(name, unit)?;
        if QualifiedName::from(unit.name.as_str()) != *name {
            warn!(
                unit = %name,
                declared = %unit.name,
                "Rewritten unit declares a different name than requested."
            );
        }
        let bytes = UnitWriter::new(&self.hierarchy).write(unit)?;
        info!(unit = %name, %version, passes = self.pipeline.len(), "Instrumented unit.");
        Ok(Arc::new(Artifact::new(
            name.clone(),
            bytes,
            Origin::Instrumented,
        )))
    }

    /// Resource lookups other than units go to the parent unchanged.
    pub fn resource(&self, path: &str) -> Option<Vec<u8>> {
        self.parent.resource(path)
    }

    /// The number of artifacts published so far.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub fn hierarchy(&self) -> &HierarchyResolver {
        &self.hierarchy
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }
}

/// Lets one loader serve as another's parent.
impl ParentLoader for InstrumentationLoader {
    fn delegate(&self, name: &QualifiedName) -> Result<Arc<Artifact>, LoadError> {
        self.load(name.clone())
    }

    fn resource(&self, path: &str) -> Option<Vec<u8>> {
        InstrumentationLoader::resource(self, path)
    }
}
