use {
    interleave_core::{FormatVersion, Insn, MethodNode, QualifiedName, ShadowNamespace, UnitNode},
    interleave_loader::*,
    std::sync::Arc,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `pkg.Foo` picks an `A` or a `B` and calls a method declared on their common ancestor `C`.
fn source() -> Arc<MemorySource> {
    let source = MemorySource::new();
    let units = [
        UnitNode::new(FormatVersion::V1_8, "pkg/C"),
        UnitNode::new(FormatVersion::V1_8, "pkg/A").extends("pkg/C"),
        UnitNode::new(FormatVersion::V1_8, "pkg/B").extends("pkg/C"),
        UnitNode::new(FormatVersion::V1_8, "pkg/Foo").method(MethodNode::new(
            "choose",
            vec![
                Insn::Load("Z".into()),
                Insn::JumpIf(1),
                Insn::Load("pkg/A".into()),
                Insn::Jump(2),
                Insn::Label(1),
                Insn::Load("pkg/B".into()),
                Insn::Label(2),
                Insn::Invoke {
                    owner: "pkg/C".into(),
                    name: "run".into(),
                    args: 1,
                    returns: None,
                },
                Insn::Return,
            ],
        )),
    ];
    for unit in &units {
        source.insert_unit(unit).unwrap();
    }
    Arc::new(source)
}

/// Moves every rewritable type into the shadow namespace and expresses merged types there too.
struct ShadowingStrategy {
    remapper: Arc<ShadowRemapper>,
}

impl Strategy for ShadowingStrategy {
    fn needs_transformation(&self) -> bool {
        true
    }

    fn create_transformer(&self) -> Arc<dyn RewritePass> {
        let remapper = Arc::clone(&self.remapper);
        Arc::new(move |mut unit: UnitNode| -> Result<UnitNode, PassError> {
            unit.map_types(|ty| remapper.map(ty));
            Ok(unit)
        })
    }

    fn create_remapper(&self) -> Option<Arc<dyn Remapper>> {
        Some(Arc::clone(&self.remapper) as Arc<dyn Remapper>)
    }
}

/// Marks every method entry.
struct InterceptingRunner;

impl Runner for InterceptingRunner {
    fn needs_transformation(&self) -> bool {
        true
    }

    fn create_transformer(&self) -> Arc<dyn RewritePass> {
        Arc::new(|mut unit: UnitNode| -> Result<UnitNode, PassError> {
            for method in &mut unit.methods {
                method.instructions.insert(
                    0,
                    Insn::Intercept {
                        hook: "enter".into(),
                    },
                );
            }
            Ok(unit)
        })
    }
}

#[test]
fn shadow_unit_merges_to_shadow_ancestor() {
    init_tracing();
    let policy = Arc::new(EligibilityPolicy::new(
        PolicyConfig::default().shadow(ShadowNamespace::new("shadow")),
    ));
    let strategy = ShadowingStrategy {
        remapper: Arc::new(ShadowRemapper::new(Arc::clone(&policy))),
    };
    let source = source();
    let loader = InstrumentationLoader::for_collaborators(
        Arc::clone(&source),
        PassthroughLoader::new(source),
        Arc::clone(&policy),
        &strategy,
        &InterceptingRunner,
    );

    let artifact = loader.load("shadow.pkg.Foo").unwrap();
    assert_eq!(artifact.name().as_str(), "shadow.pkg.Foo");
    assert_eq!(artifact.origin(), interleave_core::Origin::Instrumented);

    let unit = decode(artifact.bytes()).unwrap();
    assert_eq!(unit.name, "shadow/pkg/Foo");
    let method = &unit.methods[0];
    assert_eq!(
        method.instructions[0],
        Insn::Intercept {
            hook: "enter".into()
        }
    );
    let merged = &method.frames.last().unwrap().stack[0];
    assert_eq!(QualifiedName::from(merged.as_str()).as_str(), "shadow.pkg.C");
}

#[test]
fn shadow_unit_merges_to_original_ancestor_without_remapper() {
    init_tracing();
    let policy = EligibilityPolicy::new(PolicyConfig::default().shadow(ShadowNamespace::new("shadow")));
    let shadow = policy.shadow().clone();
    let source = source();
    let loader = InstrumentationLoader::builder(Arc::clone(&source), PassthroughLoader::new(source))
        .policy(policy)
        .pass(move |mut unit: UnitNode| -> Result<UnitNode, PassError> {
            unit.map_types(|ty| shadow.shadow_internal(ty));
            Ok(unit)
        })
        .build();

    let unit = decode(loader.load("shadow.pkg.Foo").unwrap().bytes()).unwrap();
    assert_eq!(unit.methods[0].frames.last().unwrap().stack, vec!["pkg/C"]);
}

#[test]
fn harness_namespace_is_served_by_delegate() {
    init_tracing();
    let source = source();
    let parent = Arc::new(PassthroughLoader::new(Arc::clone(&source)));
    let loader = InstrumentationLoader::builder(Arc::clone(&source), Arc::clone(&parent))
        .policy(EligibilityPolicy::new(
            PolicyConfig::default().harness_namespace("pkg."),
        ))
        .pass(|_: UnitNode| -> Result<UnitNode, PassError> {
            Err("harness units must not be rewritten".into())
        })
        .build();

    let loaded = loader.load("pkg.Foo").unwrap();
    assert_eq!(*loaded, *parent.delegate(&"pkg.Foo".into()).unwrap());
    assert_eq!(loaded.origin(), interleave_core::Origin::Delegated);
}

#[test]
fn loads_units_from_a_directory() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("pkg")).unwrap();
    let unit = UnitNode::new(FormatVersion::V1_6, "pkg/Counter").method(MethodNode::new(
        "get",
        vec![
            Insn::Load("I".into()),
            Insn::Load("I".into()),
            Insn::Pop,
            Insn::Pop,
            Insn::Return,
        ],
    ));
    std::fs::write(dir.path().join("pkg/Counter.unit"), encode(&unit).unwrap()).unwrap();
    std::fs::write(dir.path().join("config.properties"), b"threads=2").unwrap();

    let source = DirectorySource::new(dir.path());
    let loader =
        InstrumentationLoader::builder(source.clone(), PassthroughLoader::new(source)).build();

    let written = decode(loader.load("pkg.Counter").unwrap().bytes()).unwrap();
    assert_eq!(written.methods[0].max_stack, 2);
    assert!(written.methods[0].frames.is_empty());
    assert_eq!(loader.resource("config.properties"), Some(b"threads=2".to_vec()));

    assert!(matches!(
        loader.load("pkg.Missing"),
        Err(LoadError::Instrumentation {
            source: InstrumentError::UnreadableUnit { .. },
            ..
        })
    ));
}

#[test]
fn failed_ancestor_resolution_is_fatal() {
    init_tracing();
    let source = MemorySource::new();
    source
        .insert_unit(&UnitNode::new(FormatVersion::V1_8, "pkg/Foo").method(MethodNode::new(
            "choose",
            vec![
                Insn::Load("Z".into()),
                Insn::JumpIf(1),
                Insn::Load("pkg/Gone1".into()),
                Insn::Jump(2),
                Insn::Label(1),
                Insn::Load("pkg/Gone2".into()),
                Insn::Label(2),
                Insn::Return,
            ],
        )))
        .unwrap();
    let source = Arc::new(source);
    let loader =
        InstrumentationLoader::builder(Arc::clone(&source), PassthroughLoader::new(source)).build();

    match loader.load("pkg.Foo") {
        Err(LoadError::Instrumentation {
            name,
            source: InstrumentError::Write(WriteError::Resolve { source, .. }),
        }) => {
            assert_eq!(name.as_str(), "pkg.Foo");
            assert!(matches!(source, ResolveError::TypeNotFound(_)));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(loader.cached_len(), 0);
}

#[test]
fn loaders_do_not_share_artifacts() {
    let source = source();
    let first =
        InstrumentationLoader::builder(Arc::clone(&source), PassthroughLoader::new(Arc::clone(&source)))
            .build();
    let second =
        InstrumentationLoader::builder(Arc::clone(&source), PassthroughLoader::new(source)).build();

    let a = first.load("pkg.Foo").unwrap();
    let b = second.load("pkg.Foo").unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a, b);
}
